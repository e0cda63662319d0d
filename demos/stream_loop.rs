//! Loop a raw mono 16-bit PCM file through the default output device.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example stream_loop -- audio.bin
//! ```
//!
//! Without a path a 440 Hz tone is played. The player is paced by a 60 Hz
//! sleep standing in for the display's vertical blank.
use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use pcmloop::backend::{ChannelConfig, OutputMode};
use pcmloop::{
    AudioBackend, BackendError, BufferStatus, PlayerConfig, SlotId, SourceAudio, StatusCell,
    StereoWord, StreamingPlayer, SLOT_COUNT,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const PLAY_TIME: Duration = Duration::from_secs(5);
const VBLANK: Duration = Duration::from_micros(16_667);

/// State shared with the cpal callback, which plays the role of the audio DSP.
#[derive(Default)]
struct Shared {
    queue: Mutex<VecDeque<(SlotId, Vec<StereoWord>)>>,
    status: [StatusCell; SLOT_COUNT],
}

struct CpalBackend {
    device: cpal::Device,
    shared: Arc<Shared>,
    mode: Option<OutputMode>,
    stream: Option<cpal::Stream>,
}

impl CpalBackend {
    fn new() -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no output device available")?;
        tracing::info!(device = ?device.name(), "default output device");
        Ok(CpalBackend {
            device,
            shared: Arc::default(),
            mode: None,
            stream: None,
        })
    }
}

impl AudioBackend for CpalBackend {
    fn initialize(&mut self, mode: OutputMode) -> Result<(), BackendError> {
        self.mode = Some(mode);
        Ok(())
    }

    fn configure_channel(&mut self, config: ChannelConfig) -> Result<(), BackendError> {
        let channels = match self.mode.ok_or(BackendError::NotInitialized)? {
            OutputMode::Mono => 1,
            OutputMode::Stereo => 2,
        };
        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        tracing::info!(?stream_config, "opening output stream");

        let shared = Arc::clone(&self.shared);
        let mut read_offset = 0usize;
        let err_fn = |err| tracing::error!("an error occurred on stream: {err}");

        let stream = self
            .device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let Ok(mut queue) = shared.queue.lock() else {
                        data.fill(0.0);
                        return;
                    };
                    for frame in data.chunks_mut(channels as usize) {
                        let Some((slot, words)) = queue.front() else {
                            // Underrun: the player did not refill in time.
                            frame.fill(0.0);
                            continue;
                        };
                        let (slot, word, len) = (*slot, words[read_offset], words.len());

                        let [left, right] = word.to_fixed();
                        for (ch, sample) in frame.iter_mut().enumerate() {
                            *sample = if ch % 2 == 0 {
                                left.to_num::<f32>()
                            } else {
                                right.to_num::<f32>()
                            };
                        }

                        read_offset += 1;
                        if read_offset == len {
                            queue.pop_front();
                            read_offset = 0;
                            shared.status[slot.index()].publish(BufferStatus::Done);
                        } else {
                            shared.status[slot.index()].publish(BufferStatus::Playing);
                        }
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| BackendError::Device(e.to_string()))?;

        stream
            .play()
            .map_err(|e| BackendError::Device(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    fn submit(&mut self, slot: SlotId, frames: &[StereoWord]) -> Result<(), BackendError> {
        if self.stream.is_none() {
            return Err(BackendError::NotInitialized);
        }
        let mut queue = self
            .shared
            .queue
            .lock()
            .map_err(|_| BackendError::Device("audio callback panicked".into()))?;
        if queue.len() >= SLOT_COUNT {
            return Err(BackendError::QueueFull);
        }
        queue.push_back((slot, frames.to_vec()));
        self.shared.status[slot.index()].publish(BufferStatus::Queued);
        Ok(())
    }

    fn status(&self, slot: SlotId) -> BufferStatus {
        self.shared.status[slot.index()].observe()
    }

    fn shutdown(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                tracing::warn!("could not pause the output stream: {e}");
            }
        }
        if let Ok(mut queue) = self.shared.queue.lock() {
            queue.clear();
        }
    }
}

/// One second of a 440 Hz sine as raw mono s16le.
fn tone(sample_rate: u32) -> SourceAudio {
    let bytes: Vec<u8> = (0..sample_rate)
        .map(|i| {
            let phase = i as f32 * 440f32 * std::f32::consts::TAU / sample_rate as f32;
            (phase.sin() * 0.25 * i16::MAX as f32) as i16
        })
        .flat_map(i16::to_le_bytes)
        .collect();
    SourceAudio::from_vec(bytes)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = PlayerConfig::default();
    let source = match std::env::args().nth(1) {
        Some(path) => SourceAudio::open(&path).with_context(|| format!("loading {path}"))?,
        None => tone(config.sample_rate),
    };

    let backend = CpalBackend::new()?;
    let mut player = StreamingPlayer::new(backend, source, config)?;

    println!("Streaming for {} seconds.", PLAY_TIME.as_secs());
    let started = Instant::now();
    let stats = player.run(&mut || std::thread::sleep(VBLANK), &mut || {
        started.elapsed() >= PLAY_TIME
    })?;
    println!("{stats:?}");

    player.shutdown();
    println!("done");
    Ok(())
}
