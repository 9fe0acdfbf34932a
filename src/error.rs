//! Error types.
//!
//! Decoding and layout resolution fail with [`Error`]. Validation produces a
//! separate [`ValidationError`] so that callers can keep inspecting a record
//! that decoded cleanly but failed a consistency check.

use thiserror::Error;

use crate::layout::Field;

/// Errors raised while resolving a layout or decoding a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The version string could not be parsed as `major.minor`.
    #[error("invalid toolchain version {0:?}")]
    InvalidVersion(String),

    /// The version parsed but no layout is registered for it.
    #[error("no moduledata layout known for version {version} ({bits}-bit)")]
    UnknownVersion {
        /// The version string as supplied.
        version: String,
        /// Pointer width in bits of the requested layout.
        bits: u32,
    },

    /// A field extends past the end of the buffer.
    #[error("field at offset {offset:#x} + size {size} exceeds data length {len}")]
    OutOfBounds {
        offset: u64,
        size: u64,
        len: usize,
    },

    /// A field or pointer width is neither 4 nor 8 bytes.
    #[error("unsupported field size: {0}")]
    UnsupportedSize(u64),

    /// Decoding a named field failed.
    #[error("failed to read {field} field: {source}")]
    Field {
        field: Field,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn in_field(self, field: Field) -> Self {
        Error::Field {
            field,
            source: Box::new(self),
        }
    }

    /// The field that failed to decode, if the error is field-scoped.
    pub fn field(&self) -> Option<Field> {
        match self {
            Error::Field { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Consistency check failures reported by [`crate::validate::validate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The decoded text start differs from the first function entry.
    #[error("text address {found:#x} does not match first function entry {expected:#x}")]
    TextMismatch { found: u64, expected: u64 },

    /// A slice header claims more elements than it has room for.
    #[error("invalid {field} slice: len {length} > capacity {capacity}")]
    SliceOverflow {
        field: Field,
        length: u64,
        capacity: u64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
