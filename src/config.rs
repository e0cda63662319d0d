use crate::backend::Interpolation;
use crate::error::PlayerError;

/// Default output sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Default slot capacity in stereo frames.
pub const DEFAULT_FRAMES_PER_BUFFER: usize = 4096;

/// Streaming player settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Sample rate of the source and of the output channel, in Hz.
    pub sample_rate: u32,
    /// Frames per output slot (C).
    pub frames_per_buffer: usize,
    pub interpolation: Interpolation,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frames_per_buffer: DEFAULT_FRAMES_PER_BUFFER,
            interpolation: Interpolation::Linear,
        }
    }
}

impl PlayerConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_frames_per_buffer(mut self, frames_per_buffer: usize) -> Self {
        self.frames_per_buffer = frames_per_buffer;
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), PlayerError> {
        if self.sample_rate == 0 {
            return Err(PlayerError::InvalidConfig("sample rate must be non-zero"));
        }
        if self.frames_per_buffer == 0 {
            return Err(PlayerError::InvalidConfig(
                "frames per buffer must be non-zero",
            ));
        }
        Ok(())
    }
}
