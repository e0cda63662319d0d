use core::num::NonZeroUsize;

use crate::error::PlayerError;

/// Playback head into the source, in samples. Wraps back to 0 at the end of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackCursor {
    position: usize,
    num_samples: NonZeroUsize,
}

impl PlaybackCursor {
    /// Returns `PlayerError::EmptySource` when `num_samples` is 0, since there is nothing to wrap over.
    pub fn new(num_samples: usize) -> Result<Self, PlayerError> {
        let num_samples = NonZeroUsize::new(num_samples).ok_or(PlayerError::EmptySource)?;
        Ok(PlaybackCursor {
            position: 0,
            num_samples,
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples.get()
    }

    /// Return the current position, then advance by one sample.
    #[inline]
    pub fn next_index(&mut self) -> usize {
        let index = self.position;
        self.position = (self.position + 1) % self.num_samples;
        index
    }

    /// Advance by `samples` without reading them.
    pub fn advance_by(&mut self, samples: usize) {
        let step = samples % self.num_samples;
        self.position = (self.position + step) % self.num_samples;
    }

    /// Move back to the first sample.
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}
