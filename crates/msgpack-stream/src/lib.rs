//! Streaming MessagePack with subtree cursors.
//!
//! The [`Unpacker`] reads one token at a time from any [`std::io::Read`].
//! Collections can be walked token by token, handed to a scoped
//! [`Subtree`] cursor that always leaves the stream positioned after the
//! collection, or skipped without materialising anything. The [`Packer`]
//! writes the same format, and [`serialization`] maps Rust types onto both.

mod error;
mod options;
mod packer;
mod value;

pub mod cli;
pub mod format;
pub mod json;
pub mod serialization;
pub mod unpacker;

pub use error::{Error, InvalidOperation, Malformed, Result};
pub use options::{PackerCompatibility, PackerOptions, UnpackerOptions};
pub use packer::Packer;
pub use serialization::{Pack, ScopedCursor, SerializerRegistry, Unpack};
pub use unpacker::{Cursor, Items, Mode, Operation, SkipSummary, Subtree, Unpacker};
pub use value::{DecodedValue, Float, Integer, Value};
