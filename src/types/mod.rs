//! Entry point for the type descriptor subsystem: the scalar table, the array and pointer
//! factories, structure layout, and the arena that owns them all.

pub mod arena;
pub mod array;
pub mod builder;
pub mod pointer;
pub mod record;
pub mod scalar;
pub mod structure;
pub mod target;

pub use arena::{StringId, TypeArena, TypeId, TypeRegistry};
pub use array::{ArrayType, MAX_ZERO_WIDTH_LENGTH};
pub use builder::TypeBuilder;
pub use pointer::{AddressWidth, PointerType};
pub use record::{ArenaSpan, FieldRecord, IncompleteType, TypeRecord};
pub use scalar::{ScalarKind, ScalarType};
pub use structure::{FieldSlot, StructureBuilder, StructureType};
pub use target::{TargetConfig, WideCharWidth};
