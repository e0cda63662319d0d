//! Audio output backend interface.
//!
//! The backend drains submitted slots on its own execution context (DMA, an
//! audio DSP, or a host audio thread). The only thing shared with the player
//! is the per-slot [`BufferStatus`], published through a [`StatusCell`].

use core::sync::atomic::{fence, AtomicU8, Ordering};

use crate::error::BackendError;
use crate::frame::StereoWord;
use crate::SlotId;

/// Playback state of one output slot.
///
/// `Free → Queued → Playing → Done → (refill) → Queued → …`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BufferStatus {
    /// Never submitted.
    #[default]
    Free = 0,
    Queued = 1,
    Playing = 2,
    /// Fully consumed. The slot belongs to the player again.
    Done = 3,
}

impl From<u8> for BufferStatus {
    fn from(v: u8) -> Self {
        match v {
            1 => BufferStatus::Queued,
            2 => BufferStatus::Playing,
            3 => BufferStatus::Done,
            _ => BufferStatus::Free,
        }
    }
}

/// Cross-context status flag of one slot.
///
/// The backend publishes with release ordering once it has stopped reading a
/// slot, and the player observes with acquire ordering, so a `Done` observed by
/// the player happens after the backend's last read of that slot.
#[derive(Debug, Default)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    pub const fn new(status: BufferStatus) -> Self {
        StatusCell(AtomicU8::new(status as u8))
    }

    #[inline]
    pub fn observe(&self) -> BufferStatus {
        self.0.load(Ordering::Acquire).into()
    }

    #[inline]
    pub fn publish(&self, status: BufferStatus) {
        self.0.store(status as u8, Ordering::Release);
    }
}

/// Speaker output mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Mono,
    #[default]
    Stereo,
}

/// Sample layout of a channel's buffers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    MonoPcm16,
    /// One [`StereoWord`] per frame.
    #[default]
    StereoPcm16,
}

impl SampleFormat {
    pub fn num_channels(&self) -> u16 {
        match self {
            SampleFormat::MonoPcm16 => 1,
            SampleFormat::StereoPcm16 => 2,
        }
    }
}

/// Resampling interpolation used by the backend.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    None,
    #[default]
    Linear,
    Polyphase,
}

/// Settings for the output channel the player streams into.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    pub format: SampleFormat,
    pub interpolation: Interpolation,
}

/// Audio output with a queue of double-buffered slots.
pub trait AudioBackend {
    fn initialize(&mut self, mode: OutputMode) -> Result<(), BackendError>;

    fn configure_channel(&mut self, config: ChannelConfig) -> Result<(), BackendError>;

    /// Queue `frames` for playback as slot `slot`.
    ///
    /// Ownership of the slot passes to the backend until it reports [`BufferStatus::Done`].
    fn submit(&mut self, slot: SlotId, frames: &[StereoWord]) -> Result<(), BackendError>;

    /// Observe the current status of `slot`. Must not block.
    ///
    /// Implementations read the status with acquire ordering (see [`StatusCell`]).
    fn status(&self, slot: SlotId) -> BufferStatus;

    /// Make freshly written `frames` visible to the backend's consumer before submission.
    ///
    /// The default is a release fence. Platforms whose audio DMA does not
    /// snoop the CPU cache flush the data cache range here instead.
    fn flush(&mut self, frames: &[StereoWord]) {
        let _ = frames;
        fence(Ordering::Release);
    }

    fn shutdown(&mut self);
}

impl<B: AudioBackend + ?Sized> AudioBackend for &mut B {
    fn initialize(&mut self, mode: OutputMode) -> Result<(), BackendError> {
        (**self).initialize(mode)
    }

    fn configure_channel(&mut self, config: ChannelConfig) -> Result<(), BackendError> {
        (**self).configure_channel(config)
    }

    fn submit(&mut self, slot: SlotId, frames: &[StereoWord]) -> Result<(), BackendError> {
        (**self).submit(slot, frames)
    }

    fn status(&self, slot: SlotId) -> BufferStatus {
        (**self).status(slot)
    }

    fn flush(&mut self, frames: &[StereoWord]) {
        (**self).flush(frames)
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }
}
