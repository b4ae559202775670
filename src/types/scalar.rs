//! The scalar type table: every primitive the marshaller understands, its fixed byte width and
//! its little-endian encoding. Out-of-range values are rejected, never truncated.
use crate::error::{MarshalError, MarshalResult};
use crate::value::Value;

use super::target::TargetConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Bool,
    /// Single narrow code unit (C `char`).
    Char,
    /// Single wide code unit, width taken from the target (C `wchar_t`).
    WideChar,
    /// Unsigned integer wide enough to hold any target address.
    Address,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 14] = [
        ScalarKind::I8,
        ScalarKind::U8,
        ScalarKind::I16,
        ScalarKind::U16,
        ScalarKind::I32,
        ScalarKind::U32,
        ScalarKind::I64,
        ScalarKind::U64,
        ScalarKind::F32,
        ScalarKind::F64,
        ScalarKind::Bool,
        ScalarKind::Char,
        ScalarKind::WideChar,
        ScalarKind::Address,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ScalarKind::I8 => "i8",
            ScalarKind::U8 => "u8",
            ScalarKind::I16 => "i16",
            ScalarKind::U16 => "u16",
            ScalarKind::I32 => "i32",
            ScalarKind::U32 => "u32",
            ScalarKind::I64 => "i64",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Bool => "bool",
            ScalarKind::Char => "char",
            ScalarKind::WideChar => "wchar",
            ScalarKind::Address => "umem",
        }
    }

    /// Resolves either a table name (`u32`) or a ctypes-style alias (`c_uint32`, `c_int`).
    /// `c_long`/`c_ulong` are 32-bit, matching LLP64 targets.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "i8" | "c_byte" | "c_int8" => ScalarKind::I8,
            "u8" | "c_ubyte" | "c_uint8" => ScalarKind::U8,
            "i16" | "c_short" | "c_int16" => ScalarKind::I16,
            "u16" | "c_ushort" | "c_uint16" => ScalarKind::U16,
            "i32" | "c_int" | "c_long" | "c_int32" => ScalarKind::I32,
            "u32" | "c_uint" | "c_ulong" | "c_uint32" => ScalarKind::U32,
            "i64" | "c_longlong" | "c_int64" => ScalarKind::I64,
            "u64" | "c_ulonglong" | "c_uint64" => ScalarKind::U64,
            "f32" | "c_float" => ScalarKind::F32,
            "f64" | "c_double" => ScalarKind::F64,
            "bool" | "c_bool" => ScalarKind::Bool,
            "char" | "c_char" => ScalarKind::Char,
            "wchar" | "c_wchar" => ScalarKind::WideChar,
            "umem" => ScalarKind::Address,
            _ => return None,
        };
        Some(kind)
    }

    pub fn byte_size(self, target: &TargetConfig) -> usize {
        match self {
            ScalarKind::I8 | ScalarKind::U8 | ScalarKind::Bool | ScalarKind::Char => 1,
            ScalarKind::I16 | ScalarKind::U16 => 2,
            ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 => 4,
            ScalarKind::I64 | ScalarKind::U64 | ScalarKind::F64 | ScalarKind::Address => 8,
            ScalarKind::WideChar => target.wide_char.bytes(),
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalarType {
    pub kind: ScalarKind,
    pub byte_size: usize,
}

macro_rules! encode_int {
    ($scalar:ident, $value:ident, $out:ident, $t:ty) => {{
        let wide = $scalar.integer_of($value)?;
        let narrow =
            <$t>::try_from(wide).map_err(|_| MarshalError::range($scalar.kind.name(), wide))?;
        $out.extend_from_slice(&narrow.to_le_bytes());
    }};
}

macro_rules! decode_le {
    ($bytes:ident, $t:ty) => {{
        let mut word = [0u8; std::mem::size_of::<$t>()];
        word.copy_from_slice(&$bytes[..std::mem::size_of::<$t>()]);
        <$t>::from_le_bytes(word)
    }};
}

impl ScalarType {
    pub fn new(kind: ScalarKind, target: &TargetConfig) -> Self {
        Self {
            kind,
            byte_size: kind.byte_size(target),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Appends exactly `byte_size` bytes to `out`.
    pub fn encode(&self, value: &Value, out: &mut Vec<u8>) -> MarshalResult<()> {
        match self.kind {
            ScalarKind::I8 => encode_int!(self, value, out, i8),
            ScalarKind::U8 => encode_int!(self, value, out, u8),
            ScalarKind::I16 => encode_int!(self, value, out, i16),
            ScalarKind::U16 => encode_int!(self, value, out, u16),
            ScalarKind::I32 => encode_int!(self, value, out, i32),
            ScalarKind::U32 => encode_int!(self, value, out, u32),
            ScalarKind::I64 => encode_int!(self, value, out, i64),
            ScalarKind::U64 | ScalarKind::Address => encode_int!(self, value, out, u64),
            ScalarKind::F32 => {
                let wide = self.float_of(value)?;
                if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
                    return Err(MarshalError::range(self.name(), wide));
                }
                out.extend_from_slice(&(wide as f32).to_le_bytes());
            }
            ScalarKind::F64 => {
                let wide = self.float_of(value)?;
                out.extend_from_slice(&wide.to_le_bytes());
            }
            ScalarKind::Bool => {
                let flag = match value {
                    Value::Bool(flag) => *flag,
                    other => match self.integer_of(other)? {
                        0 => false,
                        1 => true,
                        wide => return Err(MarshalError::range(self.name(), wide)),
                    },
                };
                out.push(u8::from(flag));
            }
            ScalarKind::Char | ScalarKind::WideChar => {
                let code = self.integer_of(value)?;
                let limit: i128 = match self.byte_size {
                    1 => 0xFF,
                    2 => 0xFFFF,
                    _ => i128::from(u32::MAX),
                };
                if !(0..=limit).contains(&code) {
                    return Err(MarshalError::range(self.name(), code));
                }
                let unit = code as u32;
                match self.byte_size {
                    1 => out.push(unit as u8),
                    2 => out.extend_from_slice(&(unit as u16).to_le_bytes()),
                    _ => out.extend_from_slice(&unit.to_le_bytes()),
                }
            }
        }
        Ok(())
    }

    /// Decodes the leading `byte_size` bytes; trailing bytes are ignored.
    pub fn decode(&self, bytes: &[u8]) -> MarshalResult<Value> {
        if bytes.len() < self.byte_size {
            return Err(MarshalError::ShortBuffer {
                ty: self.name().to_string(),
                needed: self.byte_size,
                available: bytes.len(),
            });
        }
        let value = match self.kind {
            ScalarKind::I8 => Value::Signed(i64::from(decode_le!(bytes, i8))),
            ScalarKind::U8 => Value::Unsigned(u64::from(bytes[0])),
            ScalarKind::I16 => Value::Signed(i64::from(decode_le!(bytes, i16))),
            ScalarKind::U16 => Value::Unsigned(u64::from(decode_le!(bytes, u16))),
            ScalarKind::I32 => Value::Signed(i64::from(decode_le!(bytes, i32))),
            ScalarKind::U32 => Value::Unsigned(u64::from(decode_le!(bytes, u32))),
            ScalarKind::I64 => Value::Signed(decode_le!(bytes, i64)),
            ScalarKind::U64 | ScalarKind::Address => Value::Unsigned(decode_le!(bytes, u64)),
            ScalarKind::F32 => Value::Float(f64::from(decode_le!(bytes, f32))),
            ScalarKind::F64 => Value::Float(decode_le!(bytes, f64)),
            ScalarKind::Bool => Value::Bool(bytes[0] != 0),
            ScalarKind::Char | ScalarKind::WideChar => {
                let unit = match self.byte_size {
                    1 => u32::from(bytes[0]),
                    2 => u32::from(decode_le!(bytes, u16)),
                    _ => decode_le!(bytes, u32),
                };
                let ch = char::from_u32(unit)
                    .ok_or_else(|| MarshalError::range(self.name(), format!("0x{unit:X}")))?;
                Value::Char(ch)
            }
        };
        Ok(value)
    }

    fn integer_of(&self, value: &Value) -> MarshalResult<i128> {
        match value {
            Value::Signed(v) => Ok(i128::from(*v)),
            Value::Unsigned(v) => Ok(i128::from(*v)),
            Value::Bool(v) => Ok(i128::from(*v)),
            Value::Char(c) => Ok(i128::from(u32::from(*c))),
            Value::Pointer(ptr) => Ok(i128::from(ptr.address())),
            other => Err(MarshalError::mismatch(self.name(), other.kind_name())),
        }
    }

    fn float_of(&self, value: &Value) -> MarshalResult<f64> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Signed(v) => Ok(*v as f64),
            Value::Unsigned(v) => Ok(*v as f64),
            other => Err(MarshalError::mismatch(self.name(), other.kind_name())),
        }
    }
}
