use std::error::Error as StdError;

use thiserror::Error;

pub type AccessResult<T> = Result<T, AccessError>;

/// Failures reported by a memory backend. The marshalling layer surfaces them unchanged.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("address 0x{address:016X} is not mapped")]
    NotMapped { address: u64 },

    #[error("access of {len} bytes at 0x{address:016X} exceeds mapping end 0x{end:016X}")]
    OutOfRange { address: u64, len: usize, end: u64 },

    #[error("region '{region}' is read-only")]
    ReadOnly { region: String },

    #[error("address 0x{address:016X} overlaps existing mapping ({details})")]
    Overlap { address: u64, details: String },

    #[error("backend '{device}' reported a fault")]
    Fault {
        device: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}
