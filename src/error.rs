use alloc::collections::TryReserveError;
use alloc::string::String;

use crate::SlotId;

/// Error type for loading and reading source audio.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("the source audio buffer could not be allocated: {0}")]
    Allocation(#[from] TryReserveError),
    #[error("the source audio is too large to address ({bytes} bytes)")]
    TooLarge { bytes: u64 },
    #[error("sample {index} is out of range (source holds {num_samples} samples)")]
    SampleOutOfRange { index: usize, num_samples: usize },
}

impl SourceError {
    /// True when the source could not be held in memory.
    pub fn is_resource_unavailable(&self) -> bool {
        match self {
            SourceError::Allocation(_) | SourceError::TooLarge { .. } => true,
            SourceError::SampleOutOfRange { .. } => false,
        }
    }
}

/// Error type for loading source audio from the filesystem.
#[cfg(feature = "std")]
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("the source file {} could not be read: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
}

#[cfg(feature = "std")]
impl LoadError {
    /// Every load failure leaves the player without source data.
    pub fn is_resource_unavailable(&self) -> bool {
        match self {
            LoadError::Io { .. } => true,
            LoadError::Source(e) => e.is_resource_unavailable(),
        }
    }
}

/// Error type reported by [`AudioBackend`](crate::backend::AudioBackend) implementations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("the audio backend has not been initialized")]
    NotInitialized,
    #[error("the audio backend queue is full")]
    QueueFull,
    #[error("slot {0} is still owned by the audio backend")]
    SlotInFlight(SlotId),
    #[error("audio device error: {0}")]
    Device(String),
}

/// Error type for the streaming player.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// The source holds no whole 16-bit sample, so the cursor has nothing to wrap over.
    #[error("the source audio is empty")]
    EmptySource,
    #[error("invalid player configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("the output slots could not be allocated: {0}")]
    Allocation(#[from] TryReserveError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
