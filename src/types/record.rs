//! Defines the canonical record structures stored inside the type arena.
use super::arena::{StringId, TypeId};
use super::array::ArrayType;
use super::pointer::PointerType;
use super::scalar::ScalarType;
use super::structure::StructureType;

/// Describes a contiguous slice of fields stored inside the arena side table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaSpan {
    start: u32,
    len: u32,
}

impl ArenaSpan {
    pub fn empty() -> Self {
        Self { start: 0, len: 0 }
    }

    pub fn new(start: usize, len: usize) -> Self {
        Self {
            start: start as u32,
            len: len as u32,
        }
    }

    pub fn start(&self) -> usize {
        self.start as usize
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A named view at a fixed byte offset from the start of its structure. Used both for the
/// sequential fields and for offset overlays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldRecord {
    pub name_id: StringId,
    pub ty: TypeId,
    pub offset: usize,
    /// Names starting with `_` are padding/private; kept in layout, skipped in display.
    pub private: bool,
}

impl FieldRecord {
    pub fn new(name_id: StringId, ty: TypeId, offset: usize, private: bool) -> Self {
        Self {
            name_id,
            ty,
            offset,
            private,
        }
    }
}

/// Placeholder for a structure that has been named but not yet laid out. Only pointers may
/// refer to it until it is completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncompleteType {
    pub name_id: StringId,
}

/// All supported type shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeRecord {
    Scalar(ScalarType),
    Array(ArrayType),
    Structure(StructureType),
    Pointer(PointerType),
    Incomplete(IncompleteType),
}

impl TypeRecord {
    pub fn byte_size(&self) -> usize {
        match self {
            TypeRecord::Scalar(scalar) => scalar.byte_size,
            TypeRecord::Array(array) => array.byte_size,
            TypeRecord::Structure(structure) => structure.byte_size,
            TypeRecord::Pointer(pointer) => pointer.byte_size(),
            TypeRecord::Incomplete(_) => 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        !matches!(self, TypeRecord::Incomplete(_))
    }

    pub fn as_scalar(&self) -> Option<&ScalarType> {
        match self {
            TypeRecord::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match self {
            TypeRecord::Array(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&StructureType> {
        match self {
            TypeRecord::Structure(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&PointerType> {
        match self {
            TypeRecord::Pointer(value) => Some(value),
            _ => None,
        }
    }
}
