//! Guest-visible GPU memory as seen by descriptor reads.
//!
//! Sharps, fetch shaders and constant buffers are fetched from guest memory at draw time. The
//! emulator's memory manager provides the real implementation; [`VecGuestMemory`] backs tests.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("guest memory access out of bounds: gpa=0x{gpa:x}, len=0x{len:x}")]
pub struct GuestMemoryError {
    pub gpa: u64,
    pub len: usize,
}

/// Read-only view of guest GPU memory.
pub trait GuestMemory {
    fn read(&self, gpa: u64, dst: &mut [u8]) -> Result<(), GuestMemoryError>;

    /// Reads little-endian dwords starting at `gpa`.
    fn read_dwords(&self, gpa: u64, dst: &mut [u32]) -> Result<(), GuestMemoryError> {
        let mut bytes = vec![0u8; dst.len() * 4];
        self.read(gpa, &mut bytes)?;
        for (dword, chunk) in dst.iter_mut().zip(bytes.chunks_exact(4)) {
            *dword = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(())
    }
}

/// A single contiguous guest memory region mapped at `base`.
///
/// Addresses below `base` are unmapped, so a null pointer always faults.
#[derive(Clone, Debug)]
pub struct VecGuestMemory {
    base: u64,
    bytes: Vec<u8>,
}

impl VecGuestMemory {
    pub fn new(base: u64, size_bytes: usize) -> Self {
        Self {
            base,
            bytes: vec![0u8; size_bytes],
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn write(&mut self, gpa: u64, data: &[u8]) -> Result<(), GuestMemoryError> {
        let range = self.range(gpa, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    pub fn write_dwords(&mut self, gpa: u64, data: &[u32]) -> Result<(), GuestMemoryError> {
        let bytes: Vec<u8> = data.iter().flat_map(|d| d.to_le_bytes()).collect();
        self.write(gpa, &bytes)
    }

    fn range(&self, gpa: u64, len: usize) -> Result<std::ops::Range<usize>, GuestMemoryError> {
        let err = GuestMemoryError { gpa, len };
        let offset = gpa.checked_sub(self.base).ok_or(err.clone())?;
        let start = usize::try_from(offset).map_err(|_| err.clone())?;
        let end = start.checked_add(len).ok_or(err.clone())?;
        if end > self.bytes.len() {
            return Err(err);
        }
        Ok(start..end)
    }
}

impl GuestMemory for VecGuestMemory {
    fn read(&self, gpa: u64, dst: &mut [u8]) -> Result<(), GuestMemoryError> {
        let range = self.range(gpa, dst.len())?;
        dst.copy_from_slice(&self.bytes[range]);
        Ok(())
    }
}
