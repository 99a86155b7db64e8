//! Byte-level building blocks shared by the MessagePack reader and writer.
//!
//! - [`Writer`] appends big-endian primitives to a growable buffer.
//! - [`ByteSource`] keeps a look-ahead window over a blocking reader so that
//!   a decoder can inspect a whole value before committing to consume it.

mod source;
mod writer;

pub use source::{ByteSource, DEFAULT_CHUNK_SIZE};
pub use writer::Writer;
