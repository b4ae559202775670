//! The type arena owns every descriptor, interns names, and hosts the caches that give array
//! and pointer types their identity. `TypeRegistry` shares one arena across threads.
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ahash::AHashMap;

use crate::error::{MarshalError, MarshalResult};

use super::builder::TypeBuilder;
use super::pointer::AddressWidth;
use super::record::{ArenaSpan, FieldRecord, IncompleteType, TypeRecord};
use super::scalar::{ScalarKind, ScalarType};
use super::target::TargetConfig;

/// Stable handle of a descriptor inside one arena. Equal ids mean the identical descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StringId(u32);

#[derive(Clone, Debug)]
pub struct TypeArena {
    target: TargetConfig,
    records: Vec<TypeRecord>,
    fields: Vec<FieldRecord>,
    strings: Vec<String>,
    string_lookup: AHashMap<String, StringId>,
    pub(super) arrays: AHashMap<(TypeId, usize), TypeId>,
    pub(super) pointers: AHashMap<(TypeId, AddressWidth), TypeId>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::with_target(TargetConfig::default())
    }

    /// Creates an arena whose scalar table is already populated, one record per kind.
    pub fn with_target(target: TargetConfig) -> Self {
        let records = ScalarKind::ALL
            .iter()
            .map(|kind| TypeRecord::Scalar(ScalarType::new(*kind, &target)))
            .collect();
        Self {
            target,
            records,
            fields: Vec::new(),
            strings: Vec::new(),
            string_lookup: AHashMap::new(),
            arrays: AHashMap::new(),
            pointers: AHashMap::new(),
        }
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    pub fn builder(&mut self) -> TypeBuilder<'_> {
        TypeBuilder::new(self)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a descriptor. Ids minted by another arena (or forged through `from_index`) are
    /// a `Layout` error rather than a panic.
    pub fn get(&self, id: TypeId) -> MarshalResult<&TypeRecord> {
        self.try_get(id)
            .ok_or_else(|| MarshalError::layout(format!("#{}", id.index()), "unknown type id"))
    }

    pub fn try_get(&self, id: TypeId) -> Option<&TypeRecord> {
        self.records.get(id.index())
    }

    pub fn push_record(&mut self, record: TypeRecord) -> TypeId {
        let id = TypeId::from_index(self.records.len());
        self.records.push(record);
        id
    }

    pub(super) fn replace_record(&mut self, id: TypeId, record: TypeRecord) {
        self.records[id.index()] = record;
    }

    pub fn intern_string<S: AsRef<str>>(&mut self, value: S) -> StringId {
        let value = value.as_ref();
        if let Some(id) = self.string_lookup.get(value) {
            return *id;
        }
        let id = StringId(self.strings.len() as u32);
        self.strings.push(value.to_string());
        self.string_lookup.insert(value.to_string(), id);
        id
    }

    pub fn resolve_string(&self, id: StringId) -> &str {
        self.strings.get(id.0 as usize).map_or("?", String::as_str)
    }

    pub fn lookup_string(&self, value: &str) -> Option<StringId> {
        self.string_lookup.get(value).copied()
    }

    pub fn alloc_fields<I>(&mut self, fields: I) -> ArenaSpan
    where
        I: IntoIterator<Item = FieldRecord>,
    {
        let start = self.fields.len();
        self.fields.extend(fields);
        let len = self.fields.len() - start;
        if len == 0 {
            ArenaSpan::empty()
        } else {
            ArenaSpan::new(start, len)
        }
    }

    pub fn fields(&self, span: ArenaSpan) -> &[FieldRecord] {
        self.fields
            .get(span.start()..span.start() + span.len())
            .unwrap_or_default()
    }

    pub fn scalar(&self, kind: ScalarKind) -> TypeId {
        TypeId::from_index(kind.index())
    }

    pub fn scalar_by_name(&self, name: &str) -> Option<TypeId> {
        ScalarKind::from_name(name).map(|kind| self.scalar(kind))
    }

    /// Byte width of any descriptor; cached on the record, never recomputed.
    pub fn byte_width(&self, id: TypeId) -> MarshalResult<usize> {
        Ok(self.get(id)?.byte_size())
    }

    /// Display name of a descriptor. Unknown ids render as `#<index>` so the name stays usable
    /// inside error messages.
    pub fn type_name(&self, id: TypeId) -> String {
        let Some(record) = self.try_get(id) else {
            return format!("#{}", id.index());
        };
        match record {
            TypeRecord::Scalar(scalar) => scalar.name().to_string(),
            TypeRecord::Array(array) => {
                format!("{}[{}]", self.type_name(array.element), array.length)
            }
            TypeRecord::Structure(structure) => {
                self.resolve_string(structure.name_id).to_string()
            }
            TypeRecord::Pointer(pointer) => format!(
                "ptr{}<{}>",
                pointer.width.bytes() * 8,
                self.type_name(pointer.target)
            ),
            TypeRecord::Incomplete(incomplete) => {
                self.resolve_string(incomplete.name_id).to_string()
            }
        }
    }

    /// Reserves an id for a structure that will be laid out later, so that pointers to it can
    /// be declared first (self-referential shapes).
    pub fn forward_declare(&mut self, name: impl AsRef<str>) -> TypeId {
        let name_id = self.intern_string(name);
        self.push_record(TypeRecord::Incomplete(IncompleteType { name_id }))
    }

    /// Declares a structure from an ordered field list and an overlay list in one call.
    pub fn define_structure(
        &mut self,
        name: &str,
        fields: &[(&str, TypeId)],
        overlays: &[(usize, &str, TypeId)],
    ) -> MarshalResult<TypeId> {
        let mut builder = TypeBuilder::new(self);
        let mut structure = builder.structure(name);
        for (field_name, ty) in fields {
            structure = structure.field(field_name, *ty);
        }
        for (offset, overlay_name, ty) in overlays {
            structure = structure.overlay(*offset, overlay_name, *ty);
        }
        structure.finish()
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

/// A process-wide arena behind a lock. Factory calls take the write lock for the whole
/// lookup-then-insert, so concurrent first requests for one key still yield one descriptor.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    arena: Arc<RwLock<TypeArena>>,
}

impl TypeRegistry {
    pub fn new(arena: TypeArena) -> Self {
        Self {
            arena: Arc::new(RwLock::new(arena)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, TypeArena> {
        self.arena.read().unwrap_or_else(|err| err.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, TypeArena> {
        self.arena.write().unwrap_or_else(|err| err.into_inner())
    }

    pub fn array_of(&self, element: TypeId, length: usize) -> MarshalResult<TypeId> {
        if let Some(id) = self.read().arrays.get(&(element, length)) {
            return Ok(*id);
        }
        self.write().array_of(element, length)
    }

    pub fn pointer_of(&self, target: TypeId, width: AddressWidth) -> MarshalResult<TypeId> {
        if let Some(id) = self.read().pointers.get(&(target, width)) {
            return Ok(*id);
        }
        self.write().pointer_of(target, width)
    }

    /// Runs a batch of declarations under a single write lock.
    ///
    /// The lock is held while `declare` runs: calling back into this registry (or a clone of
    /// it) from inside the closure deadlocks. Use the builder's own factories instead.
    pub fn declare<R>(&self, declare: impl FnOnce(&mut TypeBuilder<'_>) -> R) -> R {
        let mut arena = self.write();
        let mut builder = TypeBuilder::new(&mut arena);
        declare(&mut builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::target::WideCharWidth;

    #[test]
    fn scalar_table_is_preloaded() {
        // every kind should be addressable without declaring it first
        let arena = TypeArena::new();
        assert_eq!(arena.len(), ScalarKind::ALL.len());
        for kind in ScalarKind::ALL {
            let id = arena.scalar(kind);
            assert_eq!(
                arena
                    .get(id)
                    .ok()
                    .and_then(|record| record.as_scalar())
                    .map(|scalar| scalar.kind),
                Some(kind),
                "scalar ids should index the table in declaration order"
            );
        }
        assert_eq!(arena.scalar_by_name("c_uint32"), Some(arena.scalar(ScalarKind::U32)));
    }

    #[test]
    fn target_controls_wide_char_width() {
        let arena = TypeArena::with_target(
            TargetConfig::x86_64().with_wide_char(WideCharWidth::Utf32),
        );
        assert_eq!(arena.byte_width(arena.scalar(ScalarKind::WideChar)).expect("width"), 4);
    }

    #[test]
    fn interning_reuses_ids() {
        let mut arena = TypeArena::new();
        let first = arena.intern_string("POINT");
        let second = arena.intern_string("POINT");
        assert_eq!(first, second, "equal strings should share one id");
        assert_eq!(arena.resolve_string(first), "POINT");
        assert_eq!(arena.lookup_string("missing"), None);
    }

    #[test]
    fn type_names_compose() {
        let mut arena = TypeArena::new();
        let word = arena.scalar(ScalarKind::U32);
        let pair = arena.array_of(word, 2).expect("array");
        let ptr = arena.pointer64_of(pair).expect("pointer");
        assert_eq!(arena.type_name(pair), "u32[2]");
        assert_eq!(arena.type_name(ptr), "ptr64<u32[2]>");
    }

    #[test]
    fn registry_factories_share_cache_with_arena() {
        let registry = TypeRegistry::default();
        let word = registry.read().scalar(ScalarKind::U32);
        let first = registry.array_of(word, 3).expect("array");
        let second = registry.write().array_of(word, 3).expect("array");
        assert_eq!(first, second, "registry and arena should hit the same cache");
        let ptr = registry.pointer_of(first, AddressWidth::W64).expect("pointer");
        assert_eq!(registry.pointer_of(first, AddressWidth::W64).expect("pointer"), ptr);
    }

    #[test]
    fn registry_declare_batches_under_one_lock() {
        let registry = TypeRegistry::default();
        let point = registry
            .declare(|builder| {
                let x = builder.scalar(ScalarKind::U32);
                let y = builder.scalar(ScalarKind::F32);
                builder.structure("POINT").field("x", x).field("y", y).finish()
            })
            .expect("structure");
        assert_eq!(registry.read().byte_width(point).expect("width"), 8);
    }

    #[test]
    fn foreign_ids_are_layout_errors() {
        // an id this arena never minted must fail cleanly at every public entry point
        let mut arena = TypeArena::new();
        let stray = TypeId::from_index(999);
        assert!(matches!(arena.get(stray), Err(MarshalError::Layout { .. })));
        assert!(matches!(arena.byte_width(stray), Err(MarshalError::Layout { .. })));
        assert!(matches!(arena.array_of(stray, 2), Err(MarshalError::Layout { .. })));
        assert!(matches!(arena.pointer64_of(stray), Err(MarshalError::Layout { .. })));
        assert!(matches!(arena.structure(stray), Err(MarshalError::Layout { .. })));
        assert_eq!(arena.field_offset(stray, "x"), None);
        assert_eq!(arena.type_name(stray), "#999");
        assert_eq!(arena.len(), ScalarKind::ALL.len(), "failed factories must not add records");
    }
}
