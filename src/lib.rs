//! pcmloop streams a looping raw PCM file into polled, double-buffered audio hardware.
//!
//! The source is headerless mono 16-bit little-endian PCM held in memory.
//! Two output slots alternate: while the hardware plays one, the player waits
//! for the other to report [`BufferStatus::Done`], refills it from the
//! playback cursor and hands it back. The cursor wraps at the end of the
//! source, so playback never ends.
//!
//! The audio hardware, the tick that paces the loop and the exit input are
//! supplied by the platform through [`AudioBackend`], [`TickSource`] and
//! [`ExitSignal`].
//!
//! # Examples
//!
//! Stream a source into the simulated hardware, one refill per tick.
//! ```
//! use pcmloop::simulated::SimulatedBackend;
//! use pcmloop::{PlayerConfig, SourceAudio, Step, StreamingPlayer};
//!
//! # fn main() -> Result<(), pcmloop::PlayerError> {
//! let source = SourceAudio::from_bytes(&[0x01, 0x00, 0xFF, 0x7F])?;
//! let config = PlayerConfig::default().with_frames_per_buffer(2);
//! let mut player = StreamingPlayer::new(SimulatedBackend::new(), source, config)?;
//!
//! // Play the silent slot the player primed the queue with.
//! player.backend().advance(2);
//! let step = player.step(false)?;
//! assert!(matches!(step, Step::Refilled(_)));
//!
//! let words: Vec<u32> = player
//!     .slot_frames(pcmloop::SlotId::FIRST)
//!     .iter()
//!     .map(|w| w.to_bits())
//!     .collect();
//! assert_eq!(words, [0x0001_0001, 0x7FFF_7FFF]);
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

use arbitrary_int::u1;
use core::fmt;

pub mod backend;
pub mod config;
pub mod cursor;
mod error;
pub mod frame;
pub mod player;
pub mod simulated;
pub mod source;

pub use backend::{AudioBackend, BufferStatus, StatusCell};
pub use config::PlayerConfig;
pub use cursor::PlaybackCursor;
#[cfg(feature = "std")]
pub use error::LoadError;
pub use error::{BackendError, PlayerError, SourceError};
pub use frame::{StereoWord, I1F15};
pub use player::{ExitSignal, PlaybackStats, Step, StreamingPlayer, TickSource};
pub use source::SourceAudio;

/// Number of output slots the player alternates between.
pub const SLOT_COUNT: usize = 2;

/// Which of the two output slots, as a single bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotId(u1);

impl SlotId {
    pub const FIRST: SlotId = SlotId(u1::new(0));
    pub const SECOND: SlotId = SlotId(u1::new(1));

    /// Both slots in queue order.
    pub fn all() -> impl Iterator<Item = SlotId> {
        [SlotId::FIRST, SlotId::SECOND].into_iter()
    }

    /// Index into a `[_; SLOT_COUNT]` array.
    #[inline]
    pub fn index(self) -> usize {
        self.0.value() as usize
    }

    /// The slot this one alternates with.
    #[inline]
    pub fn other(self) -> SlotId {
        SlotId(u1::new(self.0.value() ^ 1))
    }
}

impl Default for SlotId {
    fn default() -> Self {
        SlotId::FIRST
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}
