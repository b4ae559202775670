//! The pack/unpack engine. Each record shape implements [`Marshal`]; [`pack`] and [`unpack`]
//! dispatch on the descriptor found in the arena and recurse through nested shapes.
//!
//! Layout is flat: sequential structure fields and array elements are concatenated with no
//! padding, multi-byte scalars and addresses are little-endian. Overlay fields are not part of
//! the sequential pass; they are decoded from the packed bytes on access.
use crate::error::{MarshalError, MarshalResult};
use crate::types::{
    ArrayType, PointerType, ScalarType, StructureType, TypeArena, TypeId, TypeRecord,
};
use crate::value::{ArrayValue, PointerValue, StructValue, Value};

/// Descriptor being marshalled plus the arena that resolves its children.
pub struct MarshalContext<'arena> {
    pub arena: &'arena TypeArena,
    pub ty: TypeId,
}

impl<'arena> MarshalContext<'arena> {
    pub fn new(arena: &'arena TypeArena, ty: TypeId) -> Self {
        Self { arena, ty }
    }

    fn type_name(&self) -> String {
        self.arena.type_name(self.ty)
    }
}

pub trait Marshal {
    /// Appends exactly the record's byte width to `out`.
    fn pack_into(
        &self,
        ctx: &MarshalContext<'_>,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> MarshalResult<()>;

    /// Decodes from the front of `bytes`, which holds at least the record's byte width.
    fn unpack_from(&self, ctx: &MarshalContext<'_>, bytes: &[u8]) -> MarshalResult<Value>;
}

impl Marshal for ScalarType {
    fn pack_into(
        &self,
        _ctx: &MarshalContext<'_>,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> MarshalResult<()> {
        self.encode(value, out)
    }

    fn unpack_from(&self, _ctx: &MarshalContext<'_>, bytes: &[u8]) -> MarshalResult<Value> {
        self.decode(bytes)
    }
}

impl Marshal for ArrayType {
    fn pack_into(
        &self,
        ctx: &MarshalContext<'_>,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> MarshalResult<()> {
        let Value::Array(items) = value else {
            return Err(MarshalError::mismatch(ctx.type_name(), value.kind_name()));
        };
        if items.len() != self.length {
            return Err(MarshalError::mismatch(
                ctx.type_name(),
                format!("array of {} elements", items.len()),
            ));
        }
        for item in items {
            pack_into(ctx.arena, self.element, item, out)?;
        }
        Ok(())
    }

    fn unpack_from(&self, ctx: &MarshalContext<'_>, bytes: &[u8]) -> MarshalResult<Value> {
        let items = (0..self.length)
            .map(|index| unpack(ctx.arena, self.element, &bytes[self.element_offset(index)..]))
            .collect::<MarshalResult<Vec<_>>>()?;
        Ok(Value::Array(ArrayValue::new(items)))
    }
}

impl StructureType {
    fn pack_fields(
        &self,
        ctx: &MarshalContext<'_>,
        value: &StructValue,
        out: &mut Vec<u8>,
    ) -> MarshalResult<()> {
        if value.ty() != ctx.ty {
            return Err(MarshalError::mismatch(
                ctx.type_name(),
                ctx.arena.type_name(value.ty()),
            ));
        }
        let fields = self.fields(ctx.arena);
        if fields.len() != value.fields().len() {
            return Err(MarshalError::mismatch(
                format!("{} fields of `{}`", fields.len(), ctx.type_name()),
                format!("{} values", value.fields().len()),
            ));
        }
        for (field, item) in fields.iter().zip(value.fields()) {
            pack_into(ctx.arena, field.ty, item, out)?;
        }
        Ok(())
    }

    fn unpack_fields(&self, ctx: &MarshalContext<'_>, bytes: &[u8]) -> MarshalResult<StructValue> {
        let fields = self
            .fields(ctx.arena)
            .iter()
            .map(|field| unpack(ctx.arena, field.ty, &bytes[field.offset..]))
            .collect::<MarshalResult<Vec<_>>>()?;
        Ok(StructValue::from_parts(ctx.ty, fields))
    }
}

impl Marshal for StructureType {
    fn pack_into(
        &self,
        ctx: &MarshalContext<'_>,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> MarshalResult<()> {
        match value {
            Value::Struct(value) => self.pack_fields(ctx, value, out),
            other => Err(MarshalError::mismatch(ctx.type_name(), other.kind_name())),
        }
    }

    fn unpack_from(&self, ctx: &MarshalContext<'_>, bytes: &[u8]) -> MarshalResult<Value> {
        self.unpack_fields(ctx, bytes).map(Value::Struct)
    }
}

impl Marshal for PointerType {
    /// Accepts pointer values of any pointee as well as plain non-negative integers.
    fn pack_into(
        &self,
        ctx: &MarshalContext<'_>,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> MarshalResult<()> {
        let address = match value {
            Value::Pointer(pointer) => pointer.address(),
            Value::Unsigned(address) => *address,
            Value::Signed(address) => u64::try_from(*address)
                .map_err(|_| MarshalError::range(ctx.type_name(), address))?,
            other => return Err(MarshalError::mismatch(ctx.type_name(), other.kind_name())),
        };
        if address > self.width.max_address() {
            return Err(MarshalError::range(ctx.type_name(), format!("0x{address:X}")));
        }
        out.extend_from_slice(&address.to_le_bytes()[..self.byte_size()]);
        Ok(())
    }

    fn unpack_from(&self, _ctx: &MarshalContext<'_>, bytes: &[u8]) -> MarshalResult<Value> {
        let mut word = [0u8; 8];
        let width = self.byte_size();
        word[..width].copy_from_slice(&bytes[..width]);
        Ok(Value::Pointer(PointerValue::new(
            self.target,
            u64::from_le_bytes(word),
        )))
    }
}

fn incomplete(arena: &TypeArena, ty: TypeId) -> MarshalError {
    MarshalError::layout(
        arena.type_name(ty),
        "cannot marshal a forward-declared type before it is defined",
    )
}

pub fn pack(arena: &TypeArena, ty: TypeId, value: &Value) -> MarshalResult<Vec<u8>> {
    let mut out = Vec::with_capacity(arena.get(ty)?.byte_size());
    pack_into(arena, ty, value, &mut out)?;
    Ok(out)
}

/// Appends the encoding of `value` as `ty` to `out`. On error `out` may hold a partial encoding.
pub fn pack_into(
    arena: &TypeArena,
    ty: TypeId,
    value: &Value,
    out: &mut Vec<u8>,
) -> MarshalResult<()> {
    let ctx = MarshalContext::new(arena, ty);
    match arena.get(ty)? {
        TypeRecord::Scalar(scalar) => scalar.pack_into(&ctx, value, out),
        TypeRecord::Array(array) => array.pack_into(&ctx, value, out),
        TypeRecord::Structure(structure) => structure.pack_into(&ctx, value, out),
        TypeRecord::Pointer(pointer) => pointer.pack_into(&ctx, value, out),
        TypeRecord::Incomplete(_) => Err(incomplete(arena, ty)),
    }
}

/// Decodes `ty` from the front of `bytes`. Trailing bytes are ignored.
pub fn unpack(arena: &TypeArena, ty: TypeId, bytes: &[u8]) -> MarshalResult<Value> {
    let record = arena.get(ty)?;
    let needed = record.byte_size();
    if bytes.len() < needed {
        return Err(MarshalError::ShortBuffer {
            ty: arena.type_name(ty),
            needed,
            available: bytes.len(),
        });
    }
    let ctx = MarshalContext::new(arena, ty);
    match record {
        TypeRecord::Scalar(scalar) => scalar.unpack_from(&ctx, bytes),
        TypeRecord::Array(array) => array.unpack_from(&ctx, bytes),
        TypeRecord::Structure(structure) => structure.unpack_from(&ctx, bytes),
        TypeRecord::Pointer(pointer) => pointer.unpack_from(&ctx, bytes),
        TypeRecord::Incomplete(_) => Err(incomplete(arena, ty)),
    }
}

/// The value `ty` actually stores for `value`: floats narrowed to the field width, integers
/// turned into the bool, char or pointer they encode. Rejects whatever `pack` rejects.
pub fn canonicalize(arena: &TypeArena, ty: TypeId, value: &Value) -> MarshalResult<Value> {
    unpack(arena, ty, &pack(arena, ty, value)?)
}

pub(crate) fn pack_struct(arena: &TypeArena, value: &StructValue) -> MarshalResult<Vec<u8>> {
    let structure = arena.structure(value.ty())?;
    let ctx = MarshalContext::new(arena, value.ty());
    let mut out = Vec::with_capacity(structure.byte_size);
    structure.pack_fields(&ctx, value, &mut out)?;
    Ok(out)
}

pub(crate) fn unpack_struct(
    arena: &TypeArena,
    ty: TypeId,
    bytes: &[u8],
) -> MarshalResult<StructValue> {
    match unpack(arena, ty, bytes)? {
        Value::Struct(value) => Ok(value),
        other => Err(MarshalError::mismatch(arena.type_name(ty), other.kind_name())),
    }
}

#[cfg(test)]
mod tests {
    //! Byte-level layout checks for every record shape.
    use super::*;
    use crate::types::ScalarKind;

    struct Shapes {
        arena: TypeArena,
        point: TypeId,
        test: TypeId,
    }

    fn shapes() -> Shapes {
        let mut arena = TypeArena::new();
        let x = arena.scalar(ScalarKind::U32);
        let y = arena.scalar(ScalarKind::F32);
        let point = arena
            .define_structure("POINT", &[("x", x), ("y", y)], &[])
            .expect("POINT");
        let pair = arena.array_of(x, 2).expect("array");
        let two = arena.scalar(ScalarKind::I64);
        let ptr = arena.pointer64_of(point).expect("pointer");
        let test = arena
            .define_structure("TEST", &[("one", pair), ("two", two), ("ptr", ptr)], &[])
            .expect("TEST");
        Shapes { arena, point, test }
    }

    fn test_value(shapes: &Shapes, address: u64) -> Value {
        StructValue::from_values(
            &shapes.arena,
            shapes.test,
            [
                Value::from(vec![Value::from(1u32), Value::from(2u32)]),
                Value::from(-2i64),
                Value::from(PointerValue::new(shapes.point, address)),
            ],
        )
        .map(Value::from)
        .expect("TEST value")
    }

    #[test]
    fn structure_packs_fields_back_to_back() {
        let shapes = shapes();
        let bytes = pack(&shapes.arena, shapes.test, &test_value(&shapes, 0x1777)).expect("pack");
        let mut expected = Vec::new();
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&(-2i64).to_le_bytes());
        expected.extend_from_slice(&0x1777u64.to_le_bytes());
        assert_eq!(bytes, expected, "flat little-endian layout without padding");
    }

    #[test]
    fn unpack_restores_the_packed_tree() {
        let shapes = shapes();
        let original = test_value(&shapes, 0x40);
        let bytes = pack(&shapes.arena, shapes.test, &original).expect("pack");
        let decoded = unpack(&shapes.arena, shapes.test, &bytes).expect("unpack");
        assert!(original.try_eq(&decoded).expect("same type"), "round trip should be lossless");
        let ptr = decoded
            .as_struct()
            .and_then(|value| value.field(2))
            .and_then(Value::as_pointer)
            .copied()
            .expect("pointer field");
        assert_eq!(ptr.target(), shapes.point, "unpacked pointer keeps its pointee");
    }

    #[test]
    fn short_buffers_are_rejected_and_trailing_bytes_ignored() {
        let shapes = shapes();
        let err = unpack(&shapes.arena, shapes.test, &[0u8; 23]).unwrap_err();
        assert!(matches!(
            err,
            MarshalError::ShortBuffer {
                needed: 24,
                available: 23,
                ..
            }
        ));
        let value = unpack(&shapes.arena, shapes.point, &[0u8; 64]).expect("oversized buffer");
        assert!(value.as_struct().is_some());
    }

    #[test]
    fn arrays_of_structures_are_strided_by_element_width() {
        let mut shapes = shapes();
        let points = shapes.arena.array_of(shapes.point, 2).expect("array");
        let mut bytes = Vec::new();
        for (x, y) in [(1u32, 0.5f32), (2, 1.5)] {
            bytes.extend_from_slice(&x.to_le_bytes());
            bytes.extend_from_slice(&y.to_le_bytes());
        }
        let value = unpack(&shapes.arena, points, &bytes).expect("unpack");
        let second = value
            .as_array()
            .and_then(|items| items.get(1))
            .and_then(Value::as_struct)
            .expect("second point");
        assert_eq!(second.field(0).and_then(Value::as_u64), Some(2));
        assert_eq!(second.field(1).and_then(Value::as_f64), Some(1.5));
        assert_eq!(pack(&shapes.arena, points, &value).expect("repack"), bytes);
    }

    #[test]
    fn shape_mismatches_are_reported() {
        let mut shapes = shapes();
        let word = shapes.arena.scalar(ScalarKind::U32);
        let pair = shapes.arena.array_of(word, 2).expect("cached array");
        let err = pack(&shapes.arena, pair, &Value::from(vec![Value::from(1u32)])).unwrap_err();
        assert!(matches!(err, MarshalError::TypeMismatch { .. }), "length mismatch");
        let point = StructValue::new(&shapes.arena, shapes.point).expect("point");
        let err = pack(&shapes.arena, shapes.test, &Value::from(point)).unwrap_err();
        assert!(matches!(err, MarshalError::TypeMismatch { .. }), "wrong structure type");
        let err = pack(&shapes.arena, word, &Value::from(Vec::<Value>::new())).unwrap_err();
        assert!(matches!(err, MarshalError::TypeMismatch { .. }), "array for a scalar");
    }

    #[test]
    fn pointer_width_limits_addresses() {
        let mut shapes = shapes();
        let narrow = shapes.arena.pointer32_of(shapes.point).expect("pointer");
        let bytes = pack(&shapes.arena, narrow, &Value::from(0xDEAD_BEEFu64)).expect("fits");
        assert_eq!(bytes, vec![0xEF, 0xBE, 0xAD, 0xDE]);
        let err = pack(&shapes.arena, narrow, &Value::from(0x1_0000_0000u64)).unwrap_err();
        assert!(err.is_range(), "address beyond 32 bits");
        let err = pack(&shapes.arena, narrow, &Value::from(-1i64)).unwrap_err();
        assert!(err.is_range(), "negative address");
        let decoded = unpack(&shapes.arena, narrow, &bytes).expect("unpack");
        assert!(decoded.try_eq(&Value::from(0xDEAD_BEEFu64)).expect("pointer vs integer"));
    }

    #[test]
    fn incomplete_types_cannot_be_marshalled() {
        let mut arena = TypeArena::new();
        let node = arena.forward_declare("NODE");
        let err = unpack(&arena, node, &[]).unwrap_err();
        assert!(matches!(err, MarshalError::Layout { .. }));
        let err = pack(&arena, node, &Value::from(0u8)).unwrap_err();
        assert!(matches!(err, MarshalError::Layout { .. }));
        let err = pack(&arena, TypeId::from_index(999), &Value::from(0u8)).unwrap_err();
        assert!(matches!(err, MarshalError::Layout { .. }), "foreign ids are rejected");
    }
}
