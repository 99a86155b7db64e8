//! Construction-time settings for the unpacker and the packer.

use msgpack_stream_buffers::DEFAULT_CHUNK_SIZE;

use crate::error::{Error, Result};

/// Limits and buffering for an [`Unpacker`](crate::Unpacker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackerOptions {
    /// Deepest collection nesting accepted, counting the outermost
    /// collection as one.
    pub max_depth: usize,
    /// Longest raw or extension payload that `read` will buffer.
    pub max_payload_len: u64,
    /// Bytes requested from the reader per refill.
    pub read_chunk_size: usize,
}

impl Default for UnpackerOptions {
    fn default() -> Self {
        Self {
            max_depth: 512,
            max_payload_len: 64 * 1024 * 1024,
            read_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl UnpackerOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::Argument("max_depth must be at least 1".into()));
        }
        if self.read_chunk_size == 0 {
            return Err(Error::Argument("read_chunk_size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Which revision of the format the packer writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackerCompatibility {
    /// Current format: str8 and the bin family are available.
    #[default]
    Modern,
    /// Pre-2013 format: no str8, binary is written with the str family.
    Classic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackerOptions {
    pub compatibility: PackerCompatibility,
}
