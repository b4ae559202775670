//! Decoded value trees. Values own their contents; two instances never share field storage.
//! Scalars carry no type tag, composite values are checked against their descriptor when packed.

pub mod display;
pub mod pointer;
pub mod structure;

pub use display::ValueDisplay;
pub use pointer::PointerValue;
pub use structure::StructValue;

use crate::error::{MarshalError, MarshalResult};
use crate::marshal;
use crate::types::{TypeArena, TypeId};

#[derive(Clone, Debug)]
pub enum Value {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
    Char(char),
    Array(ArrayValue),
    Struct(StructValue),
    Pointer(PointerValue),
}

impl Value {
    /// The all-zero value of `ty`: what unpacking `byte_width(ty)` zero bytes yields.
    pub fn zeroed(arena: &TypeArena, ty: TypeId) -> MarshalResult<Value> {
        let width = arena.byte_width(ty)?;
        marshal::unpack(arena, ty, &vec![0u8; width])
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Signed(_) => "signed integer",
            Value::Unsigned(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Array(_) => "array",
            Value::Struct(_) => "structure",
            Value::Pointer(_) => "pointer",
        }
    }

    fn integer(&self) -> Option<i128> {
        match self {
            Value::Signed(v) => Some(i128::from(*v)),
            Value::Unsigned(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.integer().and_then(|v| i64::try_from(v).ok())
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.integer().and_then(|v| u64::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            other => other.integer().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(ch) => Some(*ch),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructValue> {
        match self {
            Value::Struct(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&PointerValue> {
        match self {
            Value::Pointer(pointer) => Some(pointer),
            _ => None,
        }
    }

    /// Equality that refuses to compare unrelated shapes.
    ///
    /// Integers compare numerically regardless of signedness, integers and floats compare as
    /// `f64`, pointers compare by address (also against plain integers). Structures of two
    /// different types, or values of incompatible kinds, yield `TypeMismatch`.
    pub fn try_eq(&self, other: &Value) -> MarshalResult<bool> {
        match (self, other) {
            (Value::Struct(lhs), Value::Struct(rhs)) => lhs.try_eq(rhs),
            (Value::Array(lhs), Value::Array(rhs)) => lhs.try_eq(rhs),
            (Value::Pointer(lhs), Value::Pointer(rhs)) => Ok(lhs == rhs),
            (Value::Pointer(pointer), scalar) | (scalar, Value::Pointer(pointer))
                if scalar.integer().is_some() =>
            {
                Ok(scalar.integer() == Some(i128::from(pointer.address())))
            }
            (Value::Bool(lhs), Value::Bool(rhs)) => Ok(lhs == rhs),
            (Value::Char(lhs), Value::Char(rhs)) => Ok(lhs == rhs),
            (Value::Float(_), _) | (_, Value::Float(_)) => match (self.as_f64(), other.as_f64()) {
                (Some(lhs), Some(rhs)) => Ok(lhs == rhs),
                _ => Err(MarshalError::mismatch(self.kind_name(), other.kind_name())),
            },
            _ => match (self.integer(), other.integer()) {
                (Some(lhs), Some(rhs)) => Ok(lhs == rhs),
                _ => Err(MarshalError::mismatch(self.kind_name(), other.kind_name())),
            },
        }
    }

    pub fn display<'a>(&'a self, arena: &'a TypeArena) -> ValueDisplay<'a> {
        ValueDisplay::new(arena, self, false)
    }

    pub fn repr<'a>(&'a self, arena: &'a TypeArena) -> ValueDisplay<'a> {
        ValueDisplay::new(arena, self, true)
    }
}

macro_rules! value_from {
    ($variant:ident, $wide:ty: $($t:ty),+) => {
        $(impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::$variant(<$wide>::from(value))
            }
        })+
    };
}

value_from!(Signed, i64: i8, i16, i32, i64);
value_from!(Unsigned, u64: u8, u16, u32, u64);
value_from!(Float, f64: f32, f64);
value_from!(Bool, bool: bool);
value_from!(Char, char: char);

impl From<ArrayValue> for Value {
    fn from(value: ArrayValue) -> Self {
        Value::Array(value)
    }
}

impl From<StructValue> for Value {
    fn from(value: StructValue) -> Self {
        Value::Struct(value)
    }
}

impl From<PointerValue> for Value {
    fn from(value: PointerValue) -> Self {
        Value::Pointer(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(ArrayValue::new(items))
    }
}

/// Elements of a fixed-count array, in index order.
#[derive(Clone, Debug, Default)]
pub struct ArrayValue {
    items: Vec<Value>,
}

impl ArrayValue {
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    /// One narrow `char` element per byte, for filling `char[n]` arrays from byte strings.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        bytes.iter().map(|byte| Value::Char(char::from(*byte))).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    /// Collects a character array up to its first NUL. `None` if any element is not a char.
    pub fn to_text(&self) -> Option<String> {
        self.items
            .iter()
            .map(Value::as_char)
            .take_while(|ch| *ch != Some('\0'))
            .collect()
    }

    /// Arrays of different lengths are unequal; elements must be comparable.
    pub fn try_eq(&self, other: &ArrayValue) -> MarshalResult<bool> {
        if self.items.len() != other.items.len() {
            return Ok(false);
        }
        for (lhs, rhs) in self.items.iter().zip(&other.items) {
            if !lhs.try_eq(rhs)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl From<Vec<Value>> for ArrayValue {
    fn from(items: Vec<Value>) -> Self {
        Self::new(items)
    }
}

impl FromIterator<Value> for ArrayValue {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ArrayValue {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
