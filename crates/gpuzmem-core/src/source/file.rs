use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use super::{DEFAULT_REGION_NAME, RegionOpener, RegionSource, SourceError};

/// Region dump stored on disk, e.g. a snapshot of the live mapping or a
/// POSIX shared memory file under `/dev/shm`.
///
/// Opening checks the file size against the expected region size before any
/// byte is handed to the decoder.
#[derive(Debug, Clone)]
pub struct FileRegion {
    path: PathBuf,
}

impl FileRegion {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The region GPU-Z publishes under its default name inside `dir`,
    /// e.g. `/dev/shm/GPUZShMem`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_REGION_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegionOpener for &FileRegion {
    type Source = FileSource;

    fn open(self, size: usize) -> Result<Self::Source, SourceError> {
        FileSource::open(&self.path, size)
    }
}

impl RegionOpener for FileRegion {
    type Source = FileSource;

    fn open(self, size: usize) -> Result<Self::Source, SourceError> {
        FileSource::open(&self.path, size)
    }
}

/// Region contents loaded from a file, read sequentially.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    bytes: Vec<u8>,
    position: usize,
    released: bool,
}

impl FileSource {
    /// Load a region file of exactly `size` bytes.
    ///
    /// # Errors
    /// Returns `SourceError::NotFound` when the file does not exist,
    /// `SourceError::SizeMismatch` when its length differs from `size`, and
    /// `SourceError::Io` for any other I/O failure.
    pub fn open(path: &Path, size: usize) -> Result<Self, SourceError> {
        let meta = fs::metadata(path).map_err(|err| not_found_or_io(err, path))?;
        let actual = usize::try_from(meta.len()).unwrap_or(usize::MAX);
        if actual != size {
            return Err(SourceError::SizeMismatch {
                expected: size,
                actual,
            });
        }

        let bytes = fs::read(path).map_err(|err| not_found_or_io(err, path))?;
        if bytes.len() != size {
            return Err(SourceError::SizeMismatch {
                expected: size,
                actual: bytes.len(),
            });
        }
        debug!("opened region {} ({} bytes)", path.display(), bytes.len());

        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            position: 0,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegionSource for FileSource {
    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    fn read(&mut self, n: usize) -> Result<&[u8], SourceError> {
        if self.released {
            return Err(SourceError::Exhausted {
                needed: n,
                remaining: 0,
            });
        }
        let remaining = self.remaining();
        if n > remaining {
            return Err(SourceError::Exhausted {
                needed: n,
                remaining,
            });
        }
        let start = self.position;
        self.position += n;
        Ok(&self.bytes[start..self.position])
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.bytes = Vec::new();
        debug!(
            "released region {} after {} bytes",
            self.path.display(),
            self.position
        );
    }
}

fn not_found_or_io(err: std::io::Error, path: &Path) -> SourceError {
    if err.kind() == ErrorKind::NotFound {
        SourceError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        SourceError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{FileRegion, FileSource};
    use crate::source::{RegionOpener, RegionSource, SourceError};

    #[test]
    fn open_reads_exact_size() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("region.bin");
        fs::write(&path, [7u8; 16]).unwrap();

        let mut source = FileRegion::new(&path).open(16).unwrap();
        assert_eq!(source.len(), 16);
        assert_eq!(source.read(4).unwrap(), &[7, 7, 7, 7]);
        assert_eq!(source.remaining(), 12);
    }

    #[test]
    fn open_rejects_size_mismatch() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("region.bin");
        fs::write(&path, [0u8; 10]).unwrap();

        let err = FileSource::open(&path, 16).unwrap_err();
        assert!(matches!(
            err,
            SourceError::SizeMismatch {
                expected: 16,
                actual: 10
            }
        ));
    }

    #[test]
    fn open_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.bin");
        let err = FileSource::open(&path, 16).unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
        assert!(err.to_string().contains("missing.bin"));
    }

    #[test]
    fn in_dir_uses_default_region_name() {
        let region = FileRegion::in_dir("/dev/shm");
        assert_eq!(region.path(), std::path::Path::new("/dev/shm/GPUZShMem"));
    }

    #[test]
    fn release_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("region.bin");
        fs::write(&path, [0u8; 8]).unwrap();

        let mut source = FileSource::open(&path, 8).unwrap();
        source.release();
        source.release();
        assert!(source.read(1).is_err());
    }
}
