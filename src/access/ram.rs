use log::trace;

use super::{AccessError, AccessResult, MemoryAccess};

/// A flat byte buffer mapped at `base`. Stands in for a live target in tests and tools.
#[derive(Clone, Debug)]
pub struct RamMemory {
    name: String,
    base: u64,
    bytes: Vec<u8>,
    writable: bool,
}

impl RamMemory {
    pub fn new(name: impl Into<String>, base: u64, len: usize) -> Self {
        Self::from_bytes(name, base, vec![0u8; len])
    }

    pub fn from_bytes(name: impl Into<String>, base: u64, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            base,
            bytes,
            writable: true,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// One past the last mapped address, saturating at the top of the address space.
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.bytes.len() as u64)
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address < self.end()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn window(&self, address: u64, len: usize) -> AccessResult<std::ops::Range<usize>> {
        if !self.contains(address) {
            return Err(AccessError::NotMapped { address });
        }
        let start = (address - self.base) as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(AccessError::OutOfRange {
                address,
                len,
                end: self.end(),
            }),
        }
    }
}

impl MemoryAccess for RamMemory {
    fn read_into(&mut self, address: u64, out: &mut [u8]) -> AccessResult<()> {
        if out.is_empty() {
            return Ok(());
        }
        let window = self.window(address, out.len())?;
        trace!("{}: read {} bytes at 0x{address:X}", self.name, out.len());
        out.copy_from_slice(&self.bytes[window]);
        Ok(())
    }

    fn write_bytes(&mut self, address: u64, data: &[u8]) -> AccessResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        if !self.writable {
            return Err(AccessError::ReadOnly {
                region: self.name.clone(),
            });
        }
        let window = self.window(address, data.len())?;
        trace!("{}: write {} bytes at 0x{address:X}", self.name, data.len());
        self.bytes[window].copy_from_slice(data);
        Ok(())
    }
}
