//! Raw mono PCM source data.

use alloc::vec::Vec;
use winnow::binary::le_i16;
use winnow::error::ModalResult;
use winnow::Parser;

use crate::error::SourceError;

/// Number of bytes in one mono 16-bit sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Headerless mono 16-bit signed little-endian PCM, held fully in memory.
///
/// A trailing odd byte is kept but never read.
#[derive(Debug, Default, Clone)]
pub struct SourceAudio {
    data: Vec<u8>,
}

impl SourceAudio {
    /// Take ownership of an already loaded byte buffer.
    pub fn from_vec(data: Vec<u8>) -> Self {
        SourceAudio { data }
    }

    /// Copy a byte slice (e.g. from `include_bytes!`) into a new source.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SourceError> {
        let mut data = Vec::new();
        data.try_reserve_exact(bytes.len())?;
        data.extend_from_slice(bytes);
        Ok(SourceAudio { data })
    }

    /// Read a whole file into memory.
    #[cfg(feature = "std")]
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, crate::error::LoadError> {
        use crate::error::LoadError;
        use std::io::Read;

        let path = path.as_ref();
        let io_err = |source: std::io::Error| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = std::fs::File::open(path).map_err(io_err)?;
        let file_size = file.metadata().map_err(io_err)?.len();

        let mut data = buffer_for(file_size)?;
        file.read_to_end(&mut data).map_err(io_err)?;

        tracing::info!(path = %path.display(), bytes = data.len(), "loaded source audio");
        Ok(SourceAudio { data })
    }

    /// Raw bytes, including a trailing odd byte if there is one.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of whole samples.
    pub fn num_samples(&self) -> usize {
        self.data.len() / BYTES_PER_SAMPLE
    }

    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }

    /// Decode the sample at `index`.
    pub fn sample(&self, index: usize) -> Result<i16, SourceError> {
        let out_of_range = || SourceError::SampleOutOfRange {
            index,
            num_samples: self.num_samples(),
        };
        let start = index.checked_mul(BYTES_PER_SAMPLE).ok_or_else(out_of_range)?;
        let end = start.checked_add(BYTES_PER_SAMPLE).ok_or_else(out_of_range)?;
        let mut input = self.data.get(start..end).ok_or_else(out_of_range)?;
        parse_sample(&mut input).map_err(|_| out_of_range())
    }

    /// Iterate over every whole sample in file order.
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.data
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
    }
}

impl From<Vec<u8>> for SourceAudio {
    fn from(data: Vec<u8>) -> Self {
        SourceAudio::from_vec(data)
    }
}

/// Reserve room for a whole file of `bytes` bytes up front.
#[cfg(any(test, feature = "std"))]
fn buffer_for(bytes: u64) -> Result<Vec<u8>, SourceError> {
    let len = usize::try_from(bytes).map_err(|_| SourceError::TooLarge { bytes })?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    Ok(data)
}

/// Parse one little-endian signed 16-bit sample.
fn parse_sample(input: &mut &[u8]) -> ModalResult<i16> {
    le_i16.parse_next(input)
}
