//! Runtime description of C-ABI data shapes and bit-exact conversion between those shapes and
//! raw byte buffers read from, or written to, a foreign memory surface.
//!
//! Types are declared once into a [`TypeArena`](types::TypeArena): scalars come from a fixed
//! table, arrays and pointers are forged (and cached) by factories, structures are laid out
//! sequentially with optional offset overlays. The [`marshal`] module packs and unpacks
//! [`Value`](value::Value) trees against those descriptors, and [`access::DataView`] glues the
//! marshaller to any [`MemoryAccess`](access::MemoryAccess) backend.

pub mod access;
pub mod error;
pub mod marshal;
pub mod types;
pub mod value;

pub use access::{AccessError, AccessResult, DataView, MemoryAccess, MemoryMap, RamMemory};
pub use error::{MarshalError, MarshalResult};
pub use marshal::{canonicalize, pack, unpack};
pub use types::{
    AddressWidth, ScalarKind, TargetConfig, TypeArena, TypeBuilder, TypeId, TypeRecord,
    TypeRegistry,
};
pub use value::{ArrayValue, PointerValue, StructValue, Value};
