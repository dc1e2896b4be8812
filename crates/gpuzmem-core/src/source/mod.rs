//! Byte sources the region decoder reads from.
//!
//! A `RegionOpener` attaches to a region of a known size and yields a
//! `RegionSource`; the source hands out consecutive byte runs until it is
//! exhausted and is released exactly once by whoever opened it. Attaching to
//! a live OS mapping is left to callers; this module ships an in-memory
//! source for fixtures and a file-backed source for region dumps.

mod file;
mod memory;

pub use file::{FileRegion, FileSource};
pub use memory::{MemoryRegion, SliceSource};

use std::path::PathBuf;

use thiserror::Error;

/// Name under which GPU-Z publishes its shared-memory region.
pub const DEFAULT_REGION_NAME: &str = "GPUZShMem";

/// Sequential reader over one attached region.
pub trait RegionSource {
    /// Total size of the region in bytes.
    fn len(&self) -> usize;

    /// Bytes not yet consumed.
    fn remaining(&self) -> usize;

    /// Consume the next `n` bytes.
    ///
    /// # Errors
    /// Returns `SourceError::Exhausted` when fewer than `n` bytes remain; the
    /// source position is left unchanged in that case.
    fn read(&mut self, n: usize) -> Result<&[u8], SourceError>;

    /// Release the underlying region. Calling it more than once is a no-op.
    fn release(&mut self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capability to attach to a region of an expected size.
///
/// Openers are consumed by `open`, so one opener value backs exactly one
/// attach attempt.
pub trait RegionOpener {
    type Source: RegionSource;

    fn open(self, size: usize) -> Result<Self::Source, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("region not found: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("region size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("region exhausted: need {needed} bytes, {remaining} remaining")]
    Exhausted { needed: usize, remaining: usize },
}
