//! Structure layout. Sequential fields are packed back to back with no implicit padding (callers
//! declare filler fields instead); offset overlays are extra named views at absolute offsets that
//! alias the sequential bytes. All validation happens when the structure is defined.
use ahash::AHashSet;
use log::debug;
use smallvec::SmallVec;

use crate::error::{MarshalError, MarshalResult};

use super::arena::{StringId, TypeArena, TypeId};
use super::builder::TypeBuilder;
use super::record::{ArenaSpan, FieldRecord, TypeRecord};
use super::scalar::ScalarKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructureType {
    pub name_id: StringId,
    /// Sequential fields in layout order; stored in the arena's field pool.
    pub fields: ArenaSpan,
    pub overlays: ArenaSpan,
    /// Sum of the sequential field widths. Overlays never extend it.
    pub byte_size: usize,
}

/// Where a named field lives inside its structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldSlot {
    Sequential(usize),
    Overlay(usize),
}

impl StructureType {
    pub fn name<'a>(&self, arena: &'a TypeArena) -> &'a str {
        arena.resolve_string(self.name_id)
    }

    pub fn fields<'a>(&self, arena: &'a TypeArena) -> &'a [FieldRecord] {
        arena.fields(self.fields)
    }

    pub fn overlays<'a>(&self, arena: &'a TypeArena) -> &'a [FieldRecord] {
        arena.fields(self.overlays)
    }

    pub fn find<'a>(&self, arena: &'a TypeArena, name: &str) -> Option<(FieldSlot, &'a FieldRecord)> {
        let name_id = arena.lookup_string(name)?;
        if let Some((index, field)) = self
            .fields(arena)
            .iter()
            .enumerate()
            .find(|(_, field)| field.name_id == name_id)
        {
            return Some((FieldSlot::Sequential(index), field));
        }
        self.overlays(arena)
            .iter()
            .enumerate()
            .find(|(_, field)| field.name_id == name_id)
            .map(|(index, field)| (FieldSlot::Overlay(index), field))
    }
}

impl TypeArena {
    pub fn structure(&self, id: TypeId) -> MarshalResult<&StructureType> {
        self.get(id)?
            .as_structure()
            .ok_or_else(|| MarshalError::mismatch("structure", self.type_name(id)))
    }

    pub fn field_offset(&self, id: TypeId, name: &str) -> Option<usize> {
        let structure = self.try_get(id)?.as_structure()?;
        structure.find(self, name).map(|(_, field)| field.offset)
    }
}

struct PendingField {
    /// `None` for generated padding, named after its offset at finish.
    name: Option<String>,
    kind: PendingKind,
}

enum PendingKind {
    Typed(TypeId),
    Padding(usize),
}

struct PendingOverlay {
    offset: usize,
    name: String,
    ty: TypeId,
}

pub struct StructureBuilder<'builder, 'arena> {
    builder: &'builder mut TypeBuilder<'arena>,
    name: String,
    fields: SmallVec<[PendingField; 8]>,
    overlays: SmallVec<[PendingOverlay; 2]>,
    completes: Option<TypeId>,
}

impl<'builder, 'arena> StructureBuilder<'builder, 'arena> {
    pub(super) fn new(builder: &'builder mut TypeBuilder<'arena>, name: impl Into<String>) -> Self {
        Self {
            builder,
            name: name.into(),
            fields: SmallVec::new(),
            overlays: SmallVec::new(),
            completes: None,
        }
    }

    pub fn field(mut self, name: impl AsRef<str>, ty: TypeId) -> Self {
        self.fields.push(PendingField {
            name: Some(name.as_ref().to_string()),
            kind: PendingKind::Typed(ty),
        });
        self
    }

    /// Appends `len` filler bytes as a private `u8` array named `_pad_0x<offset>`.
    pub fn padding(mut self, len: usize) -> Self {
        self.fields.push(PendingField {
            name: None,
            kind: PendingKind::Padding(len),
        });
        self
    }

    pub fn overlay(mut self, offset: usize, name: impl AsRef<str>, ty: TypeId) -> Self {
        self.overlays.push(PendingOverlay {
            offset,
            name: name.as_ref().to_string(),
            ty,
        });
        self
    }

    /// Lays the structure out into a previously forward-declared id instead of a new one.
    pub fn completes(mut self, forward: TypeId) -> Self {
        self.completes = Some(forward);
        self
    }

    pub fn finish(self) -> MarshalResult<TypeId> {
        let name = self.name;
        let arena: &mut TypeArena = &mut *self.builder.arena;

        if let Some(forward) = self.completes {
            let Some(TypeRecord::Incomplete(pending)) = arena.try_get(forward) else {
                return Err(MarshalError::layout(
                    &name,
                    "completed id is not a pending forward declaration",
                ));
            };
            let declared = arena.resolve_string(pending.name_id);
            if declared != name {
                return Err(MarshalError::layout(
                    &name,
                    format!("completes the forward declaration of `{declared}`"),
                ));
            }
        }

        let mut seen: AHashSet<String> = AHashSet::new();
        let mut fields: SmallVec<[FieldRecord; 8]> = SmallVec::new();
        let mut offset = 0usize;
        for pending in self.fields {
            let ty = match pending.kind {
                PendingKind::Typed(ty) => ty,
                PendingKind::Padding(len) => {
                    let byte = arena.scalar(ScalarKind::U8);
                    arena.array_of(byte, len)?
                }
            };
            let field_name = pending
                .name
                .unwrap_or_else(|| format!("_pad_0x{offset:X}"));
            if !seen.insert(field_name.clone()) {
                return Err(MarshalError::layout(
                    &name,
                    format!("duplicate field `{field_name}`"),
                ));
            }
            let width = complete_width(arena, &name, &field_name, ty)?;
            let name_id = arena.intern_string(&field_name);
            let private = field_name.starts_with('_');
            fields.push(FieldRecord::new(name_id, ty, offset, private));
            offset = offset.checked_add(width).ok_or_else(|| {
                MarshalError::layout(&name, "structure byte width overflows usize")
            })?;
        }
        let byte_size = offset;

        let mut overlays: SmallVec<[FieldRecord; 2]> = SmallVec::new();
        for pending in self.overlays {
            if !seen.insert(pending.name.clone()) {
                return Err(MarshalError::layout(
                    &name,
                    format!("overlay `{}` collides with an existing field name", pending.name),
                ));
            }
            let width = complete_width(arena, &name, &pending.name, pending.ty)?;
            let end = pending.offset.checked_add(width);
            if end.is_none_or(|end| end > byte_size) {
                return Err(MarshalError::layout(
                    &name,
                    format!(
                        "overlay `{}` at 0x{:X} ({width} bytes) exceeds the structure width 0x{byte_size:X}",
                        pending.name, pending.offset
                    ),
                ));
            }
            let name_id = arena.intern_string(&pending.name);
            let private = pending.name.starts_with('_');
            overlays.push(FieldRecord::new(name_id, pending.ty, pending.offset, private));
        }

        let field_count = fields.len();
        let overlay_count = overlays.len();
        let structure = StructureType {
            name_id: arena.intern_string(&name),
            fields: arena.alloc_fields(fields),
            overlays: arena.alloc_fields(overlays),
            byte_size,
        };
        let id = match self.completes {
            Some(forward) => {
                arena.replace_record(forward, TypeRecord::Structure(structure));
                forward
            }
            None => arena.push_record(TypeRecord::Structure(structure)),
        };
        debug!(
            "defined structure {name} ({byte_size} bytes, {field_count} fields, {overlay_count} overlays)"
        );
        Ok(id)
    }
}

fn complete_width(
    arena: &TypeArena,
    structure: &str,
    field: &str,
    ty: TypeId,
) -> MarshalResult<usize> {
    let record = arena.try_get(ty).ok_or_else(|| {
        MarshalError::layout(structure, format!("field `{field}` refers to an unknown type"))
    })?;
    if !record.is_complete() {
        return Err(MarshalError::layout(
            structure,
            format!(
                "field `{field}` embeds incomplete type `{}`; use a pointer",
                arena.type_name(ty)
            ),
        ));
    }
    Ok(record.byte_size())
}

impl<'arena> TypeBuilder<'arena> {
    pub fn structure(&mut self, name: impl Into<String>) -> StructureBuilder<'_, 'arena> {
        StructureBuilder::new(self, name)
    }
}
