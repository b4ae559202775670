//! The memory accessor boundary. Backends implement [`MemoryAccess`]; [`DataView`] layers typed
//! reads and writes on top of any backend by sizing requests from the type arena and running
//! the bytes through the marshaller.
pub mod error;
pub mod map;
pub mod ram;
pub mod view;

pub use error::{AccessError, AccessResult};
pub use map::MemoryMap;
pub use ram::RamMemory;
pub use view::DataView;

/// Raw byte access to a target address space. Reads take `&mut self` because backends may have
/// side effects on read (caches, clear-on-read registers).
pub trait MemoryAccess {
    /// Fills `out` with the bytes starting at `address`.
    fn read_into(&mut self, address: u64, out: &mut [u8]) -> AccessResult<()>;

    fn write_bytes(&mut self, address: u64, data: &[u8]) -> AccessResult<()>;

    fn read_bytes(&mut self, address: u64, len: usize) -> AccessResult<Vec<u8>> {
        let mut out = vec![0u8; len];
        self.read_into(address, &mut out)?;
        Ok(out)
    }
}

impl<M: MemoryAccess + ?Sized> MemoryAccess for &mut M {
    fn read_into(&mut self, address: u64, out: &mut [u8]) -> AccessResult<()> {
        (**self).read_into(address, out)
    }

    fn write_bytes(&mut self, address: u64, data: &[u8]) -> AccessResult<()> {
        (**self).write_bytes(address, data)
    }
}

impl<M: MemoryAccess + ?Sized> MemoryAccess for Box<M> {
    fn read_into(&mut self, address: u64, out: &mut [u8]) -> AccessResult<()> {
        (**self).read_into(address, out)
    }

    fn write_bytes(&mut self, address: u64, data: &[u8]) -> AccessResult<()> {
        (**self).write_bytes(address, data)
    }
}
