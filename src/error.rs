//! Error taxonomy shared by the type factories, the marshaller and the typed accessors.
use thiserror::Error;

use crate::access::AccessError;

pub type MarshalResult<T> = Result<T, MarshalError>;

#[derive(Debug, Error)]
pub enum MarshalError {
    /// A scalar value that the target type cannot represent.
    #[error("value {value} is out of range for `{ty}`")]
    Range { ty: String, value: String },

    /// Pointer construction or arithmetic that would leave the unsigned address space.
    #[error("address 0x{address:X} offset by {delta} leaves the {width}-byte address space")]
    AddressRange { address: u64, delta: i128, width: usize },

    #[error("invalid layout for `{ty}`: {reason}")]
    Layout { ty: String, reason: String },

    #[error("unpacking `{ty}` needs {needed} bytes but only {available} were supplied")]
    ShortBuffer {
        ty: String,
        needed: usize,
        available: usize,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("`{ty}` has no field named `{field}`")]
    UnknownField { ty: String, field: String },

    #[error(transparent)]
    Access(#[from] AccessError),
}

impl MarshalError {
    pub(crate) fn layout(ty: impl Into<String>, reason: impl Into<String>) -> Self {
        MarshalError::Layout {
            ty: ty.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        MarshalError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn range(ty: impl Into<String>, value: impl ToString) -> Self {
        MarshalError::Range {
            ty: ty.into(),
            value: value.to_string(),
        }
    }

    /// True for both scalar range failures and address-space violations.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            MarshalError::Range { .. } | MarshalError::AddressRange { .. }
        )
    }
}
