use super::{RegionOpener, RegionSource, SourceError};

/// Region backed by an owned buffer.
///
/// The buffer is handed out as-is regardless of the requested size, so an
/// undersized buffer surfaces as a short read during decoding rather than as
/// an open failure.
///
/// # Examples
/// ```
/// use gpuzmem_core::{MemoryRegion, RegionOpener, RegionSource};
///
/// let region = MemoryRegion::new(vec![1, 2, 3]);
/// let mut source = region.open(3)?;
/// assert_eq!(source.read(2)?, &[1, 2]);
/// assert_eq!(source.remaining(), 1);
/// # Ok::<(), gpuzmem_core::SourceError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRegion {
    bytes: Vec<u8>,
}

impl MemoryRegion {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl<'a> RegionOpener for &'a MemoryRegion {
    type Source = SliceSource<'a>;

    fn open(self, _size: usize) -> Result<Self::Source, SourceError> {
        Ok(SliceSource::new(self.bytes.as_slice()))
    }
}

/// Sequential source over a borrowed byte slice.
#[derive(Debug)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    position: usize,
    released: bool,
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            position: 0,
            released: false,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl RegionSource for SliceSource<'_> {
    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn read(&mut self, n: usize) -> Result<&[u8], SourceError> {
        let remaining = self.remaining();
        if self.released || n > remaining {
            return Err(SourceError::Exhausted {
                needed: n,
                remaining: if self.released { 0 } else { remaining },
            });
        }
        let start = self.position;
        self.position += n;
        Ok(&self.bytes[start..self.position])
    }

    fn release(&mut self) {
        self.released = true;
    }
}
