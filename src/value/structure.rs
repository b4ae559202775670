//! Structure instances. Only the sequential fields are stored; overlay fields are views that
//! are decoded from, and encoded into, the packed bytes of the instance on every access, so an
//! overlay always observes the latest value of the fields it aliases.
use crate::error::{MarshalError, MarshalResult};
use crate::marshal;
use crate::types::{FieldSlot, TypeArena, TypeId};

use super::Value;

#[derive(Clone, Debug)]
pub struct StructValue {
    ty: TypeId,
    fields: Vec<Value>,
}

impl StructValue {
    pub(crate) fn from_parts(ty: TypeId, fields: Vec<Value>) -> Self {
        Self { ty, fields }
    }

    /// An instance with every field zeroed.
    pub fn new(arena: &TypeArena, ty: TypeId) -> MarshalResult<Self> {
        match Value::zeroed(arena, ty)? {
            Value::Struct(value) => Ok(value),
            other => Err(MarshalError::mismatch("structure", other.kind_name())),
        }
    }

    /// Positional construction in declaration order. Each value is stored as its field decodes
    /// it. Fields not supplied stay zeroed; supplying more values than there are sequential
    /// fields is a mismatch.
    pub fn from_values<I>(arena: &TypeArena, ty: TypeId, values: I) -> MarshalResult<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut instance = Self::new(arena, ty)?;
        let structure = arena.structure(ty)?;
        let fields = structure.fields(arena);
        for (index, value) in values.into_iter().enumerate() {
            let field = fields.get(index).ok_or_else(|| {
                MarshalError::mismatch(
                    format!("at most {} values for `{}`", fields.len(), structure.name(arena)),
                    format!("{} values", index + 1),
                )
            })?;
            instance.fields[index] = marshal::canonicalize(arena, field.ty, &value)?;
        }
        Ok(instance)
    }

    /// Keyword-style override of a single field (sequential or overlay).
    pub fn with(mut self, arena: &TypeArena, name: &str, value: impl Into<Value>) -> MarshalResult<Self> {
        self.set(arena, name, value.into())?;
        Ok(self)
    }

    pub fn ty(&self) -> TypeId {
        self.ty
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    /// Direct access to a sequential field; the replacement is validated when packed.
    pub fn field_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.fields.get_mut(index)
    }

    pub fn into_fields(self) -> Vec<Value> {
        self.fields
    }

    /// Reads a field by name. Overlays are decoded from the current packed bytes.
    pub fn get(&self, arena: &TypeArena, name: &str) -> MarshalResult<Value> {
        let structure = arena.structure(self.ty)?;
        match structure.find(arena, name) {
            Some((FieldSlot::Sequential(index), _)) => Ok(self.fields[index].clone()),
            Some((FieldSlot::Overlay(_), overlay)) => {
                let bytes = self.to_bytes(arena)?;
                marshal::unpack(arena, overlay.ty, &bytes[overlay.offset..])
            }
            None => Err(MarshalError::UnknownField {
                ty: structure.name(arena).to_string(),
                field: name.to_string(),
            }),
        }
    }

    /// Writes a field by name, storing the value as the field's type decodes it. Writing an
    /// overlay splices its encoding into the packed bytes and re-decodes every sequential field
    /// it covers.
    pub fn set(&mut self, arena: &TypeArena, name: &str, value: Value) -> MarshalResult<()> {
        let structure = arena.structure(self.ty)?;
        match structure.find(arena, name) {
            Some((FieldSlot::Sequential(index), field)) => {
                self.fields[index] = marshal::canonicalize(arena, field.ty, &value)?;
                Ok(())
            }
            Some((FieldSlot::Overlay(_), overlay)) => {
                let encoded = marshal::pack(arena, overlay.ty, &value)?;
                let mut bytes = self.to_bytes(arena)?;
                bytes[overlay.offset..overlay.offset + encoded.len()].copy_from_slice(&encoded);
                *self = marshal::unpack_struct(arena, self.ty, &bytes)?;
                Ok(())
            }
            None => Err(MarshalError::UnknownField {
                ty: structure.name(arena).to_string(),
                field: name.to_string(),
            }),
        }
    }

    /// Current values of every overlay, in declaration order, decoded from one packing pass.
    pub fn overlay_values(&self, arena: &TypeArena) -> MarshalResult<Vec<Value>> {
        let structure = arena.structure(self.ty)?;
        let overlays = structure.overlays(arena);
        if overlays.is_empty() {
            return Ok(Vec::new());
        }
        let bytes = self.to_bytes(arena)?;
        overlays
            .iter()
            .map(|overlay| marshal::unpack(arena, overlay.ty, &bytes[overlay.offset..]))
            .collect()
    }

    pub fn to_bytes(&self, arena: &TypeArena) -> MarshalResult<Vec<u8>> {
        marshal::pack_struct(arena, self)
    }

    /// Field-by-field equality. Instances of different structure types are never comparable,
    /// even when their layouts coincide.
    pub fn try_eq(&self, other: &StructValue) -> MarshalResult<bool> {
        if self.ty != other.ty {
            return Err(MarshalError::mismatch(
                format!("structure type #{}", self.ty.index()),
                format!("structure type #{}", other.ty.index()),
            ));
        }
        for (lhs, rhs) in self.fields.iter().zip(&other.fields) {
            if !lhs.try_eq(rhs)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
