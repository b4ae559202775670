//! Pointer values: an unsigned byte address tagged with its pointee type. Arithmetic is in
//! bytes and never wraps; results outside `0..=u64::MAX` are errors.
use std::fmt;

use crate::error::{MarshalError, MarshalResult};
use crate::types::{TypeArena, TypeId};

#[derive(Clone, Copy, Debug)]
pub struct PointerValue {
    target: TypeId,
    address: u64,
}

impl PointerValue {
    pub fn new(target: TypeId, address: u64) -> Self {
        Self { target, address }
    }

    pub fn null(target: TypeId) -> Self {
        Self::new(target, 0)
    }

    /// Builds a pointer from a signed address, rejecting negative values.
    pub fn from_signed(target: TypeId, address: i64) -> MarshalResult<Self> {
        u64::try_from(address)
            .map(|address| Self::new(target, address))
            .map_err(|_| MarshalError::AddressRange {
                address: 0,
                delta: i128::from(address),
                width: 8,
            })
    }

    pub fn target(&self) -> TypeId {
        self.target
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn is_valid(&self) -> bool {
        self.address != 0
    }

    pub fn is_null(&self) -> bool {
        self.address == 0
    }

    /// Same address, different pointee.
    pub fn cast(self, target: TypeId) -> Self {
        Self { target, ..self }
    }

    pub fn offset(self, delta: i64) -> MarshalResult<Self> {
        let moved = i128::from(self.address) + i128::from(delta);
        u64::try_from(moved)
            .map(|address| Self { address, ..self })
            .map_err(|_| MarshalError::AddressRange {
                address: self.address,
                delta: i128::from(delta),
                width: 8,
            })
    }

    pub fn advance(self, bytes: u64) -> MarshalResult<Self> {
        match self.address.checked_add(bytes) {
            Some(address) => Ok(Self { address, ..self }),
            None => Err(MarshalError::AddressRange {
                address: self.address,
                delta: i128::from(bytes),
                width: 8,
            }),
        }
    }

    pub fn retreat(self, bytes: u64) -> MarshalResult<Self> {
        match self.address.checked_sub(bytes) {
            Some(address) => Ok(Self { address, ..self }),
            None => Err(MarshalError::AddressRange {
                address: self.address,
                delta: -i128::from(bytes),
                width: 8,
            }),
        }
    }

    /// `POINT @ 0x777`
    pub fn display<'a>(&'a self, arena: &'a TypeArena) -> PointerDisplay<'a> {
        PointerDisplay {
            arena,
            pointer: self,
            repr: false,
        }
    }

    /// `POINT(0x777)`
    pub fn repr<'a>(&'a self, arena: &'a TypeArena) -> PointerDisplay<'a> {
        PointerDisplay {
            arena,
            pointer: self,
            repr: true,
        }
    }
}

impl PartialEq for PointerValue {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for PointerValue {}

impl PartialEq<u64> for PointerValue {
    fn eq(&self, other: &u64) -> bool {
        self.address == *other
    }
}

pub struct PointerDisplay<'a> {
    arena: &'a TypeArena,
    pointer: &'a PointerValue,
    repr: bool,
}

impl fmt::Display for PointerDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.arena.try_get(self.pointer.target) {
            Some(_) => self.arena.type_name(self.pointer.target),
            None => "?".to_string(),
        };
        if self.repr {
            write!(f, "{name}(0x{:x})", self.pointer.address)
        } else {
            write!(f, "{name} @ 0x{:x}", self.pointer.address)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Address arithmetic must never wrap.
    use super::*;
    use crate::types::ScalarKind;

    fn byte_ptr(address: u64) -> PointerValue {
        PointerValue::new(TypeArena::new().scalar(ScalarKind::U8), address)
    }

    #[test]
    fn arithmetic_stays_in_address_space() {
        // 0x3 + 5 == 0x8 and 0x3 - 2 == 0x1, but 0x3 - 5 must fail
        let base = byte_ptr(0x3);
        assert_eq!(base.offset(5).expect("add"), 0x8u64);
        assert_eq!(base.advance(5).expect("advance"), base.offset(5).expect("add"));
        assert_eq!(base.offset(-2).expect("sub"), 0x1u64);
        assert_eq!(base.retreat(2).expect("retreat"), 0x1u64);
        let err = base.offset(-5).unwrap_err();
        assert!(err.is_range(), "underflow is a range error, not a wrap");
        assert!(base.retreat(5).unwrap_err().is_range());
        assert!(byte_ptr(u64::MAX).advance(1).unwrap_err().is_range(), "overflow is rejected");
    }

    #[test]
    fn negative_construction_is_rejected() {
        let target = TypeArena::new().scalar(ScalarKind::U8);
        let err = PointerValue::from_signed(target, -5).unwrap_err();
        assert!(matches!(err, MarshalError::AddressRange { delta: -5, .. }));
        assert_eq!(PointerValue::from_signed(target, 16).expect("positive"), 16u64);
    }

    #[test]
    fn validity_follows_null_address() {
        assert!(!byte_ptr(0).is_valid());
        assert!(byte_ptr(0).is_null());
        assert!(byte_ptr(1).is_valid());
    }

    #[test]
    fn equality_ignores_pointee() {
        let mut arena = TypeArena::new();
        let word = arena.scalar(ScalarKind::U32);
        let pair = arena.array_of(word, 2).expect("array");
        let lhs = PointerValue::new(word, 0x1000);
        assert_eq!(lhs, lhs.cast(pair), "cast keeps the address");
        assert_ne!(lhs, PointerValue::new(word, 0x1004));
    }

    #[test]
    fn display_forms_name_the_pointee() {
        let mut arena = TypeArena::new();
        let x = arena.scalar(ScalarKind::U32);
        let point = arena
            .define_structure("POINT", &[("x", x)], &[])
            .expect("structure");
        let ptr = PointerValue::new(point, 0x777);
        assert_eq!(ptr.display(&arena).to_string(), "POINT @ 0x777");
        assert_eq!(ptr.repr(&arena).to_string(), "POINT(0x777)");
    }
}
