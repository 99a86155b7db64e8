use std::io;

use thiserror::Error;

use crate::format::DecodeError;
use crate::unpacker::Operation;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the unpacker, the packer and the serialization layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A constructor or packer call got an argument it cannot use.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The input is not MessagePack, or declares something the reader will
    /// not accept. The cursor that saw it is unusable afterwards.
    #[error("malformed MessagePack at offset {offset}: {reason}")]
    MalformedFormat { offset: u64, reason: Malformed },

    /// The input ended in the middle of a value.
    #[error("insufficient data at offset {offset}")]
    InsufficientData { offset: u64 },

    /// The call is not legal in the cursor's current mode.
    #[error("invalid operation: {0}")]
    InvalidOperation(#[from] InvalidOperation),

    /// A reader expected another value but its scope or stream had ended.
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    /// A typed reader found a value of another kind.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn from_decode(err: DecodeError, offset: u64) -> Self {
        match err {
            DecodeError::Malformed { tag } => Error::MalformedFormat {
                offset,
                reason: Malformed::UnknownTag(tag),
            },
            DecodeError::Insufficient { .. } => Error::InsufficientData { offset },
        }
    }

    pub(crate) fn mismatch(expected: &'static str, found: impl ToString) -> Self {
        Error::TypeMismatch {
            expected,
            found: found.to_string(),
        }
    }

    /// Whether the error leaves the cursor unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::MalformedFormat { .. } | Error::Io(_))
    }
}

/// Detail of a [`Error::MalformedFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Malformed {
    #[error("unrecognized tag byte 0x{0:02x}")]
    UnknownTag(u8),
    #[error("declared payload of {len} bytes exceeds the limit of {limit}")]
    PayloadTooLong { len: u64, limit: u64 },
    #[error("collections nest deeper than the limit of {limit}")]
    TooDeep { limit: usize },
}

/// The rule a caller broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidOperation {
    #[error("a subtree cursor is open on this cursor")]
    SubtreeOpen,
    #[error("an enumeration is driving this cursor")]
    Enumerating,
    #[error("a suspended {pending} must be retried before {attempted}")]
    Suspended {
        pending: Operation,
        attempted: Operation,
    },
    #[error("the current value is not an array or map header")]
    NotAtHeader,
    #[error("nothing has been read yet")]
    NoCurrentValue,
    #[error("the cursor failed earlier and cannot be used")]
    Faulted,
}
