//! In-memory audio hardware.
//!
//! [`SimulatedBackend`] records everything submitted to it and plays it back
//! only when its [`SimulatedClock`] ticks, draining a fixed number of frames
//! per tick the way an audio DSP drains its queue between two display frames.
//!
//! ```
//! use pcmloop::simulated::SimulatedBackend;
//! use pcmloop::{PlayerConfig, SourceAudio, StreamingPlayer};
//!
//! # fn main() -> Result<(), pcmloop::PlayerError> {
//! let source = SourceAudio::from_bytes(&[0x01, 0x00, 0xFF, 0x7F])?;
//! let backend = SimulatedBackend::new();
//! let mut clock = backend.clock(2);
//! let config = PlayerConfig::default().with_frames_per_buffer(2);
//! let mut player = StreamingPlayer::new(backend, source, config)?;
//!
//! let mut ticks = 0;
//! let stats = player.run(&mut clock, &mut || {
//!     ticks += 1;
//!     ticks > 4
//! })?;
//! assert_eq!(stats.refills, 4);
//! # Ok(())
//! # }
//! ```

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::sync::atomic::{fence, Ordering};
use heapless::Deque;

use crate::backend::{AudioBackend, BufferStatus, ChannelConfig, OutputMode, StatusCell};
use crate::error::BackendError;
use crate::frame::StereoWord;
use crate::player::TickSource;
use crate::{SlotId, SLOT_COUNT};

/// A handoff call made by the player, in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareEvent {
    Flush { frames: usize },
    Submit { slot: SlotId, frames: usize },
}

#[derive(Debug, Default)]
struct Hardware {
    mode: Option<OutputMode>,
    channel: Option<ChannelConfig>,
    buffers: [Vec<StereoWord>; SLOT_COUNT],
    status: [StatusCell; SLOT_COUNT],
    queue: Deque<SlotId, SLOT_COUNT>,
    /// Frames of the slot at the front of the queue already played.
    read_offset: usize,
    played: Vec<StereoWord>,
    submissions: Vec<SlotId>,
    events: Vec<HardwareEvent>,
    underruns: u64,
}

impl Hardware {
    fn advance(&mut self, frames: usize) {
        let mut remaining = frames;
        while remaining > 0 {
            let Some(&slot) = self.queue.front() else {
                self.underruns += 1;
                tracing::warn!(missing_frames = remaining, "simulated hardware ran dry");
                return;
            };

            let buffer = &self.buffers[slot.index()];
            let take = remaining.min(buffer.len() - self.read_offset);
            self.played
                .extend_from_slice(&buffer[self.read_offset..self.read_offset + take]);
            self.read_offset += take;
            remaining -= take;

            if self.read_offset == buffer.len() {
                self.queue.pop_front();
                self.read_offset = 0;
                self.status[slot.index()].publish(BufferStatus::Done);
            } else {
                self.status[slot.index()].publish(BufferStatus::Playing);
            }
        }
    }
}

/// [`AudioBackend`] backed by memory instead of audio hardware.
#[derive(Debug, Default)]
pub struct SimulatedBackend {
    hw: Rc<RefCell<Hardware>>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Default::default()
    }

    /// A tick source that plays `frames_per_tick` frames on every tick.
    pub fn clock(&self, frames_per_tick: usize) -> SimulatedClock {
        SimulatedClock {
            hw: Rc::clone(&self.hw),
            frames_per_tick,
        }
    }

    /// Play `frames` frames from the queue right now.
    pub fn advance(&self, frames: usize) {
        self.hw.borrow_mut().advance(frames);
    }

    /// Every frame played so far, in order.
    pub fn played(&self) -> Vec<StereoWord> {
        self.hw.borrow().played.clone()
    }

    /// Every slot submitted so far, in order.
    pub fn submissions(&self) -> Vec<SlotId> {
        self.hw.borrow().submissions.clone()
    }

    /// Every flush and accepted submission, in call order.
    pub fn events(&self) -> Vec<HardwareEvent> {
        self.hw.borrow().events.clone()
    }

    /// Number of times playback needed frames while the queue was empty.
    pub fn underruns(&self) -> u64 {
        self.hw.borrow().underruns
    }

    pub fn output_mode(&self) -> Option<OutputMode> {
        self.hw.borrow().mode
    }

    pub fn channel_config(&self) -> Option<ChannelConfig> {
        self.hw.borrow().channel
    }

    pub fn queued(&self) -> usize {
        self.hw.borrow().queue.len()
    }
}

impl AudioBackend for SimulatedBackend {
    fn initialize(&mut self, mode: OutputMode) -> Result<(), BackendError> {
        let mut hw = self.hw.borrow_mut();
        hw.mode = Some(mode);
        tracing::debug!(?mode, "simulated hardware initialized");
        Ok(())
    }

    fn configure_channel(&mut self, config: ChannelConfig) -> Result<(), BackendError> {
        let mut hw = self.hw.borrow_mut();
        if hw.mode.is_none() {
            return Err(BackendError::NotInitialized);
        }
        hw.channel = Some(config);
        Ok(())
    }

    fn submit(&mut self, slot: SlotId, frames: &[StereoWord]) -> Result<(), BackendError> {
        let mut hw = self.hw.borrow_mut();
        if hw.channel.is_none() {
            return Err(BackendError::NotInitialized);
        }
        if hw.queue.iter().any(|&queued| queued == slot) {
            return Err(BackendError::SlotInFlight(slot));
        }
        hw.queue
            .push_back(slot)
            .map_err(|_| BackendError::QueueFull)?;

        let buffer = &mut hw.buffers[slot.index()];
        buffer.clear();
        buffer.extend_from_slice(frames);
        hw.status[slot.index()].publish(BufferStatus::Queued);
        hw.submissions.push(slot);
        hw.events.push(HardwareEvent::Submit {
            slot,
            frames: frames.len(),
        });
        Ok(())
    }

    fn flush(&mut self, frames: &[StereoWord]) {
        fence(Ordering::Release);
        self.hw.borrow_mut().events.push(HardwareEvent::Flush {
            frames: frames.len(),
        });
    }

    fn status(&self, slot: SlotId) -> BufferStatus {
        self.hw.borrow().status[slot.index()].observe()
    }

    fn shutdown(&mut self) {
        let mut hw = self.hw.borrow_mut();
        hw.queue.clear();
        hw.read_offset = 0;
        for status in &hw.status {
            status.publish(BufferStatus::Free);
        }
        hw.mode = None;
        hw.channel = None;
    }
}

/// Vertical-blank stand-in for [`SimulatedBackend`].
#[derive(Debug)]
pub struct SimulatedClock {
    hw: Rc<RefCell<Hardware>>,
    frames_per_tick: usize,
}

impl TickSource for SimulatedClock {
    fn wait_for_tick(&mut self) {
        self.hw.borrow_mut().advance(self.frames_per_tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Interpolation, SampleFormat};

    fn ready_backend() -> SimulatedBackend {
        let mut backend = SimulatedBackend::new();
        backend.initialize(OutputMode::Stereo).unwrap();
        backend
            .configure_channel(ChannelConfig {
                sample_rate: 48000,
                format: SampleFormat::StereoPcm16,
                interpolation: Interpolation::Linear,
            })
            .unwrap();
        backend
    }

    fn words(samples: &[i16]) -> Vec<StereoWord> {
        samples.iter().copied().map(StereoWord::from_mono).collect()
    }

    #[test]
    fn submit_before_configure_fails() {
        let mut backend = SimulatedBackend::new();
        assert!(matches!(
            backend.submit(SlotId::FIRST, &[]),
            Err(BackendError::NotInitialized)
        ));
    }

    #[test]
    fn drains_in_submission_order() {
        let mut backend = ready_backend();
        backend.submit(SlotId::FIRST, &words(&[1, 2, 3])).unwrap();
        backend.submit(SlotId::SECOND, &words(&[4, 5, 6])).unwrap();
        assert_eq!(backend.status(SlotId::FIRST), BufferStatus::Queued);

        backend.advance(2);
        assert_eq!(backend.status(SlotId::FIRST), BufferStatus::Playing);
        assert_eq!(backend.status(SlotId::SECOND), BufferStatus::Queued);

        backend.advance(2);
        assert_eq!(backend.status(SlotId::FIRST), BufferStatus::Done);
        assert_eq!(backend.status(SlotId::SECOND), BufferStatus::Playing);

        backend.advance(2);
        assert_eq!(backend.status(SlotId::SECOND), BufferStatus::Done);
        assert_eq!(backend.played(), words(&[1, 2, 3, 4, 5, 6]));
        assert_eq!(backend.underruns(), 0);

        backend.advance(1);
        assert_eq!(backend.underruns(), 1);
    }

    #[test]
    fn rejects_slot_already_in_flight() {
        let mut backend = ready_backend();
        backend.submit(SlotId::FIRST, &words(&[1])).unwrap();
        assert!(matches!(
            backend.submit(SlotId::FIRST, &words(&[1])),
            Err(BackendError::SlotInFlight(_))
        ));
    }

    #[test]
    fn clock_drains_per_tick() {
        let mut backend = ready_backend();
        let mut clock = backend.clock(4);
        backend.submit(SlotId::FIRST, &words(&[7; 4])).unwrap();
        clock.wait_for_tick();
        assert_eq!(backend.status(SlotId::FIRST), BufferStatus::Done);
        assert_eq!(backend.queued(), 0);
    }

    #[test]
    fn records_flush_and_submit_order() {
        let mut backend = ready_backend();
        let frames = words(&[1, 2]);
        backend.flush(&frames);
        backend.submit(SlotId::FIRST, &frames).unwrap();
        assert_eq!(
            backend.events(),
            [
                HardwareEvent::Flush { frames: 2 },
                HardwareEvent::Submit {
                    slot: SlotId::FIRST,
                    frames: 2
                },
            ]
        );
    }

    #[test]
    fn shutdown_clears_queue() {
        let mut backend = ready_backend();
        backend.submit(SlotId::FIRST, &words(&[1, 2])).unwrap();
        backend.shutdown();
        assert_eq!(backend.queued(), 0);
        assert_eq!(backend.status(SlotId::FIRST), BufferStatus::Free);
        assert_eq!(backend.output_mode(), None);
    }
}
