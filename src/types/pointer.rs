//! Typed pointers of explicit width. The pointee is carried for typing and dereferencing only;
//! the marshalled form is just the unsigned address.
use log::debug;

use crate::error::{MarshalError, MarshalResult};

use super::arena::{TypeArena, TypeId};
use super::record::TypeRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    W32,
    W64,
}

impl AddressWidth {
    pub const fn bytes(self) -> usize {
        match self {
            AddressWidth::W32 => 4,
            AddressWidth::W64 => 8,
        }
    }

    pub const fn max_address(self) -> u64 {
        match self {
            AddressWidth::W32 => u32::MAX as u64,
            AddressWidth::W64 => u64::MAX,
        }
    }
}

impl TryFrom<usize> for AddressWidth {
    type Error = MarshalError;

    fn try_from(bytes: usize) -> MarshalResult<Self> {
        match bytes {
            4 => Ok(AddressWidth::W32),
            8 => Ok(AddressWidth::W64),
            other => Err(MarshalError::layout(
                "pointer",
                format!("address width must be 4 or 8 bytes, got {other}"),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerType {
    pub target: TypeId,
    pub width: AddressWidth,
}

impl PointerType {
    pub fn new(target: TypeId, width: AddressWidth) -> Self {
        Self { target, width }
    }

    pub fn byte_size(&self) -> usize {
        self.width.bytes()
    }
}

impl TypeArena {
    /// Returns the cached pointer type for `(target, width)`, forging it on first use. The
    /// target may still be incomplete but must belong to this arena.
    pub fn pointer_of(&mut self, target: TypeId, width: AddressWidth) -> MarshalResult<TypeId> {
        if let Some(id) = self.pointers.get(&(target, width)) {
            return Ok(*id);
        }
        self.get(target)?;
        let id = self.push_record(TypeRecord::Pointer(PointerType::new(target, width)));
        self.pointers.insert((target, width), id);
        debug!("forged pointer type {}", self.type_name(id));
        Ok(id)
    }

    pub fn pointer32_of(&mut self, target: TypeId) -> MarshalResult<TypeId> {
        self.pointer_of(target, AddressWidth::W32)
    }

    pub fn pointer64_of(&mut self, target: TypeId) -> MarshalResult<TypeId> {
        self.pointer_of(target, AddressWidth::W64)
    }

    /// Pointer using the configured target's address width.
    pub fn native_pointer_of(&mut self, target: TypeId) -> MarshalResult<TypeId> {
        let width = self.target().pointer_width;
        self.pointer_of(target, width)
    }
}
