//! Double-buffered streaming loop.

use alloc::vec::Vec;

use crate::backend::{AudioBackend, BufferStatus, ChannelConfig, OutputMode, SampleFormat};
use crate::config::PlayerConfig;
use crate::cursor::PlaybackCursor;
use crate::error::PlayerError;
use crate::frame::{fill_from_source, StereoWord};
use crate::source::SourceAudio;
use crate::{SlotId, SLOT_COUNT};

/// Fixed-cadence tick driving the loop, usually the display's vertical blank.
pub trait TickSource {
    /// Block until the next tick.
    fn wait_for_tick(&mut self);
}

impl<F: FnMut()> TickSource for F {
    fn wait_for_tick(&mut self) {
        self()
    }
}

/// Per-tick exit request, usually a button press.
pub trait ExitSignal {
    fn exit_requested(&mut self) -> bool;
}

impl<F: FnMut() -> bool> ExitSignal for F {
    fn exit_requested(&mut self) -> bool {
        self()
    }
}

/// Result of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Exit was requested; the loop should stop.
    Exit,
    /// The slot was refilled and resubmitted.
    Refilled(SlotId),
    /// The active slot is still owned by the backend.
    Waiting,
}

/// Counters kept by the player.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStats {
    pub ticks: u64,
    pub refills: u64,
    pub frames_written: u64,
}

/// One output buffer and the player's view of its status.
#[derive(Debug)]
struct Slot {
    status: BufferStatus,
    frames: Vec<StereoWord>,
}

impl Slot {
    fn silent(len: usize) -> Result<Self, PlayerError> {
        let mut frames = Vec::new();
        frames.try_reserve_exact(len)?;
        frames.resize(len, StereoWord::SILENCE);
        Ok(Slot {
            status: BufferStatus::Free,
            frames,
        })
    }
}

/// Streams a looping mono source into an [`AudioBackend`] through two alternating slots.
///
/// Every refill decodes `frames_per_buffer` samples at the playback cursor and
/// duplicates each into both channels of a [`StereoWord`].
// TODO: decode interleaved stereo sources once the asset pipeline emits them; the
// source is treated as mono and duplicated into both channels.
#[derive(Debug)]
pub struct StreamingPlayer<B: AudioBackend> {
    backend: B,
    source: SourceAudio,
    cursor: PlaybackCursor,
    slots: [Slot; SLOT_COUNT],
    active: SlotId,
    config: PlayerConfig,
    stats: PlaybackStats,
}

impl<B: AudioBackend> StreamingPlayer<B> {
    /// Allocate both slots, configure the backend and prime its queue with silence.
    ///
    /// # Errors
    ///
    /// * `PlayerError::InvalidConfig` - zero sample rate or zero frames per buffer.
    /// * `PlayerError::EmptySource` - the source holds no whole sample.
    /// * `PlayerError::Allocation` - the slots could not be allocated.
    /// * `PlayerError::Backend` - the backend refused initialization or a submission.
    pub fn new(
        mut backend: B,
        source: SourceAudio,
        config: PlayerConfig,
    ) -> Result<Self, PlayerError> {
        config.validate()?;
        let cursor = PlaybackCursor::new(source.num_samples())?;
        let mut slots = [
            Slot::silent(config.frames_per_buffer)?,
            Slot::silent(config.frames_per_buffer)?,
        ];

        backend.initialize(OutputMode::Stereo)?;
        backend.configure_channel(ChannelConfig {
            sample_rate: config.sample_rate,
            format: SampleFormat::StereoPcm16,
            interpolation: config.interpolation,
        })?;

        for (id, slot) in SlotId::all().zip(slots.iter_mut()) {
            backend.flush(&slot.frames);
            backend.submit(id, &slot.frames)?;
            slot.status = BufferStatus::Queued;
        }

        tracing::info!(
            sample_rate = config.sample_rate,
            frames_per_buffer = config.frames_per_buffer,
            source_samples = source.num_samples(),
            "streaming player primed"
        );

        Ok(StreamingPlayer {
            backend,
            source,
            cursor,
            slots,
            active: SlotId::FIRST,
            config,
            stats: PlaybackStats::default(),
        })
    }

    /// Run one iteration: refill and resubmit the active slot if the backend is done with it.
    pub fn step(&mut self, exit_requested: bool) -> Result<Step, PlayerError> {
        if exit_requested {
            return Ok(Step::Exit);
        }

        let id = self.active;
        let status = self.backend.status(id);
        let slot = &mut self.slots[id.index()];
        slot.status = status;
        if status != BufferStatus::Done {
            return Ok(Step::Waiting);
        }

        // Commit the cursor only once the backend has accepted the slot.
        let mut cursor = self.cursor;
        fill_from_source(&mut slot.frames, &self.source, &mut cursor)?;
        self.backend.flush(&slot.frames);
        self.backend.submit(id, &slot.frames)?;
        self.cursor = cursor;
        slot.status = BufferStatus::Queued;

        self.stats.refills += 1;
        self.stats.frames_written += slot.frames.len() as u64;
        self.active = id.other();

        tracing::debug!(slot = %id, cursor = self.cursor.position(), "refilled slot");
        Ok(Step::Refilled(id))
    }

    /// Loop until `exit` asks to stop: wait for a tick, poll for exit, step.
    pub fn run(
        &mut self,
        ticks: &mut impl TickSource,
        exit: &mut impl ExitSignal,
    ) -> Result<PlaybackStats, PlayerError> {
        loop {
            ticks.wait_for_tick();
            self.stats.ticks += 1;
            if self.step(exit.exit_requested())? == Step::Exit {
                break;
            }
        }
        tracing::info!(
            ticks = self.stats.ticks,
            refills = self.stats.refills,
            "streaming loop exited"
        );
        Ok(self.stats)
    }

    /// Stop the backend and release the slots and the source.
    pub fn shutdown(mut self) -> (B, PlaybackStats) {
        self.backend.shutdown();
        tracing::info!(
            frames_written = self.stats.frames_written,
            "streaming player shut down"
        );
        (self.backend, self.stats)
    }

    /// Slot that will be refilled next.
    pub fn active_slot(&self) -> SlotId {
        self.active
    }

    /// The player's last observed status of `slot`.
    pub fn slot_status(&self, slot: SlotId) -> BufferStatus {
        self.slots[slot.index()].status
    }

    /// Contents of `slot` as last written by the player.
    pub fn slot_frames(&self, slot: SlotId) -> &[StereoWord] {
        &self.slots[slot.index()].frames
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn stats(&self) -> PlaybackStats {
        self.stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::simulated::SimulatedBackend;

    fn source_of(samples: &[i16]) -> SourceAudio {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        SourceAudio::from_vec(bytes)
    }

    fn config(frames: usize) -> PlayerConfig {
        PlayerConfig::default().with_frames_per_buffer(frames)
    }

    #[test]
    fn primes_both_slots_with_silence() {
        let player = StreamingPlayer::new(SimulatedBackend::new(), source_of(&[5; 8]), config(4))
            .unwrap();
        let backend = player.backend();
        assert_eq!(backend.submissions(), [SlotId::FIRST, SlotId::SECOND]);
        assert_eq!(backend.output_mode(), Some(OutputMode::Stereo));
        assert_eq!(
            backend.channel_config().unwrap().format,
            SampleFormat::StereoPcm16
        );
        for id in SlotId::all() {
            assert_eq!(player.slot_status(id), BufferStatus::Queued);
            assert!(player.slot_frames(id).iter().all(|w| *w == StereoWord::SILENCE));
        }
    }

    #[test]
    fn empty_source_is_fatal() {
        let err = StreamingPlayer::new(SimulatedBackend::new(), source_of(&[]), config(4))
            .unwrap_err();
        assert!(matches!(err, PlayerError::EmptySource));

        // A single dangling byte is not a sample either.
        let err = StreamingPlayer::new(
            SimulatedBackend::new(),
            SourceAudio::from_vec(vec![0x7F]),
            config(4),
        )
        .unwrap_err();
        assert!(matches!(err, PlayerError::EmptySource));
    }

    #[test]
    fn waits_until_done() {
        let mut player =
            StreamingPlayer::new(SimulatedBackend::new(), source_of(&[1, 2]), config(4)).unwrap();
        assert_eq!(player.step(false).unwrap(), Step::Waiting);

        player.backend().advance(2);
        assert_eq!(player.step(false).unwrap(), Step::Waiting);
        assert_eq!(player.slot_status(SlotId::FIRST), BufferStatus::Playing);

        player.backend().advance(2);
        assert_eq!(player.step(false).unwrap(), Step::Refilled(SlotId::FIRST));
        assert_eq!(player.active_slot(), SlotId::SECOND);
        assert_eq!(player.step(false).unwrap(), Step::Waiting);
    }

    #[test]
    fn exit_wins_over_refill() {
        let mut player =
            StreamingPlayer::new(SimulatedBackend::new(), source_of(&[1]), config(1)).unwrap();
        player.backend().advance(1);
        assert_eq!(player.step(true).unwrap(), Step::Exit);
        assert_eq!(player.stats().refills, 0);
        assert_eq!(player.active_slot(), SlotId::FIRST);
    }

    /// Delegates to the simulated hardware but rejects one submission.
    struct RejectOnce {
        inner: SimulatedBackend,
        submits: usize,
        reject_at: usize,
    }

    impl AudioBackend for RejectOnce {
        fn initialize(&mut self, mode: OutputMode) -> Result<(), BackendError> {
            self.inner.initialize(mode)
        }

        fn configure_channel(&mut self, config: ChannelConfig) -> Result<(), BackendError> {
            self.inner.configure_channel(config)
        }

        fn submit(&mut self, slot: SlotId, frames: &[StereoWord]) -> Result<(), BackendError> {
            self.submits += 1;
            if self.submits == self.reject_at {
                return Err(BackendError::QueueFull);
            }
            self.inner.submit(slot, frames)
        }

        fn status(&self, slot: SlotId) -> BufferStatus {
            self.inner.status(slot)
        }

        fn shutdown(&mut self) {
            self.inner.shutdown()
        }
    }

    #[test]
    fn rejected_refill_keeps_cursor() {
        let samples: Vec<i16> = (0..8).collect();
        let backend = RejectOnce {
            inner: SimulatedBackend::new(),
            submits: 0,
            reject_at: 3,
        };
        let mut player = StreamingPlayer::new(backend, source_of(&samples), config(4)).unwrap();

        player.backend().inner.advance(4);
        assert!(matches!(
            player.step(false),
            Err(PlayerError::Backend(BackendError::QueueFull))
        ));
        assert_eq!(player.cursor().position(), 0);
        assert_eq!(player.active_slot(), SlotId::FIRST);
        assert_eq!(player.stats().refills, 0);

        assert_eq!(player.step(false).unwrap(), Step::Refilled(SlotId::FIRST));
        assert_eq!(player.cursor().position(), 4);

        player.backend().inner.advance(8);
        let lefts: Vec<i16> = player.backend().inner.played()[8..]
            .iter()
            .map(|w| w.left())
            .collect();
        assert_eq!(lefts, [0, 1, 2, 3]);
    }

    #[test]
    fn shutdown_returns_backend() {
        let player =
            StreamingPlayer::new(SimulatedBackend::new(), source_of(&[1, 2]), config(2)).unwrap();
        let (backend, stats) = player.shutdown();
        assert_eq!(stats, PlaybackStats::default());
        assert_eq!(backend.queued(), 0);
    }
}
