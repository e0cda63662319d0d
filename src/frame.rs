//! Mono to packed stereo conversion.
//!
//! The output hardware takes one 32-bit word per stereo frame, two 16-bit
//! channels side by side. The source is mono, so both halves carry the same
//! sample.

use core::fmt;

pub use fixed::types::I1F15;

use crate::cursor::PlaybackCursor;
use crate::error::SourceError;
use crate::source::SourceAudio;

/// One interleaved stereo PCM16 frame as stored in an output slot.
///
/// Bits [15:0] are the first channel in memory on little-endian hardware (left),
/// bits [31:16] the second (right).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct StereoWord(u32);

impl StereoWord {
    pub const SILENCE: StereoWord = StereoWord(0);

    /// Duplicate a mono sample into both channels: `(sample << 16) | (sample & 0xFFFF)`.
    #[inline]
    pub const fn from_mono(sample: i16) -> Self {
        let bits = sample as u16 as u32;
        StereoWord((bits << 16) | bits)
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        StereoWord(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn left(self) -> i16 {
        self.0 as u16 as i16
    }

    #[inline]
    pub const fn right(self) -> i16 {
        (self.0 >> 16) as u16 as i16
    }

    /// Both channels as Q1.15, in `[left, right]` order.
    pub fn to_fixed(self) -> [I1F15; 2] {
        [
            I1F15::from_bits(self.left()),
            I1F15::from_bits(self.right()),
        ]
    }
}

impl fmt::Debug for StereoWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StereoWord({:#010x})", self.0)
    }
}

impl From<i16> for StereoWord {
    fn from(sample: i16) -> Self {
        StereoWord::from_mono(sample)
    }
}

/// Fill `frames` with consecutive source samples starting at the cursor, wrapping at the end of the source.
pub fn fill_from_source(
    frames: &mut [StereoWord],
    source: &SourceAudio,
    cursor: &mut PlaybackCursor,
) -> Result<(), SourceError> {
    for frame in frames.iter_mut() {
        let sample = source.sample(cursor.next_index())?;
        *frame = StereoWord::from_mono(sample);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_matches_shift_and_mask() {
        for sample in [0i16, 1, -1, 0x1234, i16::MAX, i16::MIN, -300] {
            let expected = ((sample as i32) << 16) as u32 | (sample as u32 & 0xFFFF);
            assert_eq!(StereoWord::from_mono(sample).to_bits(), expected);
        }
    }

    #[test]
    fn channels_are_duplicated() {
        for sample in [0i16, 42, -42, i16::MAX, i16::MIN] {
            let word = StereoWord::from(sample);
            assert_eq!(word.left(), sample);
            assert_eq!(word.right(), sample);
        }
    }

    #[test]
    fn known_words() {
        assert_eq!(StereoWord::from_mono(1).to_bits(), 0x0001_0001);
        assert_eq!(StereoWord::from_mono(32767).to_bits(), 0x7FFF_7FFF);
        assert_eq!(StereoWord::from_mono(-1).to_bits(), 0xFFFF_FFFF);
        assert_eq!(StereoWord::from_mono(i16::MIN).to_bits(), 0x8000_8000);
    }

    #[test]
    fn fixed_view() {
        let [l, r] = StereoWord::from_mono(i16::MIN).to_fixed();
        assert_eq!(l, I1F15::from_num(-1));
        assert_eq!(r, I1F15::from_num(-1));
        let [l, r] = StereoWord::from_bits(0x4000_0000).to_fixed();
        assert_eq!(l, I1F15::ZERO);
        assert_eq!(r, I1F15::from_num(0.5));
    }

    #[test]
    fn fill_wraps_within_one_buffer() {
        let source = SourceAudio::from_bytes(&[0x01, 0x00, 0x02, 0x00, 0x03, 0x00]).unwrap();
        let mut cursor = PlaybackCursor::new(source.num_samples()).unwrap();
        let mut frames = [StereoWord::SILENCE; 8];
        fill_from_source(&mut frames, &source, &mut cursor).unwrap();
        let lefts: Vec<i16> = frames.iter().map(|f| f.left()).collect();
        assert_eq!(lefts, [1, 2, 3, 1, 2, 3, 1, 2]);
        assert_eq!(cursor.position(), 2);
    }
}
