//! Typed access layered on a [`MemoryAccess`] backend: every request is sized from the type
//! arena, raw bytes go through the backend, and the marshaller converts them to values.
use log::trace;

use crate::error::{MarshalError, MarshalResult};
use crate::marshal;
use crate::types::{TypeArena, TypeId};
use crate::value::{PointerValue, StructValue, Value};

use super::{AccessError, AccessResult, MemoryAccess};

/// Upper bound for NUL-terminated string reads unless configured otherwise.
pub const DEFAULT_STRING_LIMIT: usize = 4096;

const STRING_CHUNK: usize = 32;

pub struct DataView<'arena, M> {
    arena: &'arena TypeArena,
    memory: M,
    string_limit: usize,
}

impl<'arena, M: MemoryAccess> DataView<'arena, M> {
    pub fn new(arena: &'arena TypeArena, memory: M) -> Self {
        Self {
            arena,
            memory,
            string_limit: DEFAULT_STRING_LIMIT,
        }
    }

    pub fn with_string_limit(mut self, limit: usize) -> Self {
        self.string_limit = limit;
        self
    }

    pub fn arena(&self) -> &'arena TypeArena {
        self.arena
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn into_inner(self) -> M {
        self.memory
    }

    /// `unpack(ty, read_bytes(address, byte_width(ty)))`
    pub fn read(&mut self, address: u64, ty: TypeId) -> MarshalResult<Value> {
        let width = self.width_of(ty)?;
        trace!(
            "read {} ({width} bytes) at 0x{address:X}",
            self.arena.type_name(ty)
        );
        let bytes = self.memory.read_bytes(address, width)?;
        marshal::unpack(self.arena, ty, &bytes)
    }

    pub fn read_struct(&mut self, address: u64, ty: TypeId) -> MarshalResult<StructValue> {
        match self.read(address, ty)? {
            Value::Struct(value) => Ok(value),
            other => Err(MarshalError::mismatch(
                self.arena.type_name(ty),
                other.kind_name(),
            )),
        }
    }

    /// `write_bytes(address, pack(ty, value))`. Nothing is written if packing fails.
    pub fn write(&mut self, address: u64, ty: TypeId, value: &Value) -> MarshalResult<()> {
        let bytes = marshal::pack(self.arena, ty, value)?;
        trace!(
            "write {} ({} bytes) at 0x{address:X}",
            self.arena.type_name(ty),
            bytes.len()
        );
        self.memory.write_bytes(address, &bytes)?;
        Ok(())
    }

    pub fn write_struct(&mut self, address: u64, value: &StructValue) -> MarshalResult<()> {
        let bytes = value.to_bytes(self.arena)?;
        trace!(
            "write {} ({} bytes) at 0x{address:X}",
            self.arena.type_name(value.ty()),
            bytes.len()
        );
        self.memory.write_bytes(address, &bytes)?;
        Ok(())
    }

    /// Dereferences `pointer`: a fresh read of its pointee at its address.
    pub fn read_ptr(&mut self, pointer: &PointerValue) -> MarshalResult<Value> {
        self.read(pointer.address(), pointer.target())
    }

    pub fn read_raw(&mut self, address: u64, len: usize) -> AccessResult<Vec<u8>> {
        self.memory.read_bytes(address, len)
    }

    pub fn write_raw(&mut self, address: u64, data: &[u8]) -> AccessResult<()> {
        self.memory.write_bytes(address, data)
    }

    /// Reads a NUL-terminated narrow string, at most `string_limit` bytes long. Bytes that are
    /// not valid UTF-8 are replaced. A string that runs into unmapped memory before its NUL
    /// fails with the backend's error. Only a chunk that overruns the end of a mapping is
    /// narrowed to a single byte; every other backend error is returned as is.
    pub fn read_char_string(&mut self, address: u64) -> MarshalResult<String> {
        let mut text = Vec::new();
        let mut cursor = address;
        while text.len() < self.string_limit {
            let want = STRING_CHUNK.min(self.string_limit - text.len());
            let chunk = match self.memory.read_bytes(cursor, want) {
                Ok(chunk) => chunk,
                // the terminator may sit just before the end of the mapping
                Err(AccessError::OutOfRange { .. }) if want > 1 => {
                    self.memory.read_bytes(cursor, 1)?
                }
                Err(err) => return Err(err.into()),
            };
            if let Some(end) = chunk.iter().position(|byte| *byte == 0) {
                text.extend_from_slice(&chunk[..end]);
                break;
            }
            text.extend_from_slice(&chunk);
            let step = chunk.len() as u64;
            cursor = cursor
                .checked_add(step)
                .ok_or(MarshalError::AddressRange {
                    address: cursor,
                    delta: i128::from(step),
                    width: 8,
                })?;
        }
        trace!("read string of {} bytes at 0x{address:X}", text.len());
        Ok(String::from_utf8_lossy(&text).into_owned())
    }

    fn width_of(&self, ty: TypeId) -> MarshalResult<usize> {
        self.arena.byte_width(ty)
    }
}
