use std::fmt;

use crate::error::InvalidOperation;

/// The kinds of cursor operation the mode state machine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Skip,
    ReadSubtree,
    Enumerate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Read => "read",
            Operation::Skip => "skip",
            Operation::ReadSubtree => "read_subtree",
            Operation::Enumerate => "enumeration",
        })
    }
}

/// What a cursor currently permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Any operation may be issued.
    #[default]
    Ready,
    /// The last read or skip ran out of input mid-value. Only a retry of
    /// the same operation is accepted.
    Suspended(Operation),
    /// A child cursor is open and has not been disposed.
    SubtreeOpen,
    /// An [`Items`](super::Items) iterator is driving the cursor.
    Enumerating,
    /// A fatal error happened; nothing is accepted any more.
    Faulted,
}

impl Mode {
    /// Checks that `attempted` may run now.
    pub fn check(self, attempted: Operation) -> Result<(), InvalidOperation> {
        match self {
            Mode::Ready => Ok(()),
            Mode::Suspended(pending) if pending == attempted => Ok(()),
            Mode::Suspended(pending) => Err(InvalidOperation::Suspended { pending, attempted }),
            Mode::SubtreeOpen => Err(InvalidOperation::SubtreeOpen),
            Mode::Enumerating => Err(InvalidOperation::Enumerating),
            Mode::Faulted => Err(InvalidOperation::Faulted),
        }
    }
}
