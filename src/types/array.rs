//! Fixed-count arrays. Descriptors are forged on demand and cached per `(element, length)` so
//! repeated requests for one shape return the identical `TypeId`.
use log::debug;

use crate::error::{MarshalError, MarshalResult};

use super::arena::{TypeArena, TypeId};
use super::record::TypeRecord;

/// Longest array of zero-width elements (empty structures, zero-length arrays). Such arrays
/// occupy no bytes, so the byte-width overflow check never bounds their element count.
pub const MAX_ZERO_WIDTH_LENGTH: usize = 0x1_0000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayType {
    pub element: TypeId,
    pub length: usize,
    /// Element width; elements are packed back to back with no padding.
    pub stride: usize,
    pub byte_size: usize,
}

impl ArrayType {
    pub fn new(element: TypeId, stride: usize, length: usize) -> Option<Self> {
        let byte_size = stride.checked_mul(length)?;
        Some(Self {
            element,
            length,
            stride,
            byte_size,
        })
    }

    pub fn element_offset(&self, index: usize) -> usize {
        index * self.stride
    }
}

impl TypeArena {
    pub fn array_of(&mut self, element: TypeId, length: usize) -> MarshalResult<TypeId> {
        if let Some(id) = self.arrays.get(&(element, length)) {
            return Ok(*id);
        }
        let record = self.get(element)?;
        if !record.is_complete() {
            return Err(MarshalError::layout(
                format!("{}[{length}]", self.type_name(element)),
                "array element type is incomplete",
            ));
        }
        if record.byte_size() == 0 && length > MAX_ZERO_WIDTH_LENGTH {
            return Err(MarshalError::layout(
                format!("{}[{length}]", self.type_name(element)),
                format!("zero-width elements are limited to {MAX_ZERO_WIDTH_LENGTH} per array"),
            ));
        }
        let array = ArrayType::new(element, record.byte_size(), length).ok_or_else(|| {
            MarshalError::layout(
                format!("{}[{length}]", self.type_name(element)),
                "array byte width overflows usize",
            )
        })?;
        let byte_size = array.byte_size;
        let id = self.push_record(TypeRecord::Array(array));
        self.arrays.insert((element, length), id);
        debug!(
            "forged array type {} ({byte_size} bytes)",
            self.type_name(id)
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    //! Array factory caching and layout guarantees.
    use super::*;
    use crate::types::scalar::ScalarKind;

    #[test]
    fn equal_keys_share_identity() {
        // two independent requests for u32[3] must return the same descriptor
        let mut arena = TypeArena::new();
        let word = arena.scalar(ScalarKind::U32);
        let first = arena.array_of(word, 3).expect("array");
        let records = arena.len();
        let second = arena.array_of(word, 3).expect("array");
        assert_eq!(first, second, "cache should return the identical id");
        assert_eq!(arena.len(), records, "cache hit must not allocate a record");
    }

    #[test]
    fn different_keys_forge_distinct_types() {
        let mut arena = TypeArena::new();
        let word = arena.scalar(ScalarKind::U32);
        let byte = arena.scalar(ScalarKind::U8);
        let a = arena.array_of(word, 3).expect("array");
        let b = arena.array_of(word, 4).expect("array");
        let c = arena.array_of(byte, 3).expect("array");
        assert_ne!(a, b, "length is part of the key");
        assert_ne!(a, c, "element type is part of the key");
    }

    #[test]
    fn width_is_element_width_times_length() {
        let mut arena = TypeArena::new();
        let word = arena.scalar(ScalarKind::I64);
        let id = arena.array_of(word, 5).expect("array");
        let Ok(TypeRecord::Array(array)) = arena.get(id) else {
            panic!("expected array type");
        };
        assert_eq!(array.byte_size, 40);
        assert_eq!(array.element_offset(3), 24, "no inter-element padding");
    }

    #[test]
    fn zero_length_is_zero_width() {
        let mut arena = TypeArena::new();
        let word = arena.scalar(ScalarKind::U16);
        let id = arena.array_of(word, 0).expect("zero length arrays are valid");
        assert_eq!(arena.byte_width(id).expect("width"), 0);
    }

    #[test]
    fn nested_arrays_compose() {
        let mut arena = TypeArena::new();
        let byte = arena.scalar(ScalarKind::U8);
        let row = arena.array_of(byte, 4).expect("row");
        let grid = arena.array_of(row, 3).expect("grid");
        assert_eq!(arena.byte_width(grid).expect("width"), 12);
        assert_eq!(arena.type_name(grid), "u8[4][3]");
    }

    #[test]
    fn incomplete_elements_are_rejected() {
        let mut arena = TypeArena::new();
        let node = arena.forward_declare("NODE");
        let err = arena.array_of(node, 2).unwrap_err();
        assert!(matches!(err, MarshalError::Layout { .. }));
    }

    #[test]
    fn overflowing_width_is_a_layout_error() {
        let mut arena = TypeArena::new();
        let word = arena.scalar(ScalarKind::U64);
        let err = arena.array_of(word, usize::MAX).unwrap_err();
        assert!(matches!(err, MarshalError::Layout { .. }));
    }

    #[test]
    fn zero_width_elements_have_a_length_cap() {
        // a zero-width element never overflows the byte width, so the count itself is bounded
        let mut arena = TypeArena::new();
        let byte = arena.scalar(ScalarKind::U8);
        let empty = arena.array_of(byte, 0).expect("empty");
        let err = arena.array_of(empty, usize::MAX).unwrap_err();
        assert!(matches!(err, MarshalError::Layout { .. }));
        let widest = arena
            .array_of(empty, MAX_ZERO_WIDTH_LENGTH)
            .expect("the cap itself is allowed");
        assert_eq!(arena.byte_width(widest).expect("width"), 0);
    }
}
