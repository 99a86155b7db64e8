//! Typed packing and unpacking on top of [`Packer`] and [`Cursor`].
//!
//! A type is written as a fixed sequence of packer calls and read back
//! with the mirror-image sequence of reads. Records go through
//! [`impl_record!`](crate::impl_record), which writes a struct as an array
//! of its fields in declaration order.
//!
//! ```
//! use msgpack_stream::impl_record;
//! use msgpack_stream::serialization::{pack_to_vec, unpack_from_slice};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//!     label: String,
//! }
//!
//! impl_record!(Point { x, y, label });
//!
//! let point = Point { x: 1, y: -2, label: "a".into() };
//! let bytes = pack_to_vec(&point).unwrap();
//! assert_eq!(bytes, [0x93, 0x01, 0xfe, 0xa1, b'a']);
//! assert_eq!(unpack_from_slice::<Point>(&bytes).unwrap(), point);
//! ```

mod impls;
mod registry;

pub use crate::unpacker::ScopedCursor;
pub use registry::{Serializer, SerializerRegistry};

use crate::error::{Error, InvalidOperation, Result};
use crate::packer::Packer;
use crate::unpacker::{Cursor, Mode, Unpacker};
use crate::value::DecodedValue;

pub trait Pack {
    fn pack_to(&self, packer: &mut Packer) -> Result<()>;
}

pub trait Unpack: Sized {
    /// Builds a value starting at the token the cursor has just read.
    ///
    /// Collections are read through a subtree, so the cursor ends up
    /// after the whole encoded value.
    fn unpack_from<C: Cursor>(cursor: &mut C) -> Result<Self>;
}

/// Reads the next item, treating "no item" as an error: a typed reader
/// that still expects a value can never take a missing one as absent.
pub fn read_item<C: Cursor>(cursor: &mut C) -> Result<()> {
    if cursor.read()? {
        return Ok(());
    }
    match cursor.mode() {
        Mode::Suspended(_) => Err(Error::InsufficientData {
            offset: cursor.position(),
        }),
        _ => Err(Error::UnexpectedEndOfStream),
    }
}

/// Reads the next item and converts it.
pub fn unpack_next<T: Unpack, C: Cursor>(cursor: &mut C) -> Result<T> {
    read_item(cursor)?;
    T::unpack_from(cursor)
}

/// The token the cursor is on.
pub fn current<C: Cursor>(cursor: &C) -> Result<&DecodedValue> {
    cursor
        .data()
        .ok_or(Error::InvalidOperation(InvalidOperation::NoCurrentValue))
}

/// The element count of the array header the cursor is on.
pub fn expect_array<C: Cursor>(cursor: &C) -> Result<u32> {
    match current(cursor)? {
        DecodedValue::ArrayHeader(n) => Ok(*n),
        other => Err(Error::mismatch("array", other.kind_name())),
    }
}

/// The pair count of the map header the cursor is on.
pub fn expect_map<C: Cursor>(cursor: &C) -> Result<u32> {
    match current(cursor)? {
        DecodedValue::MapHeader(n) => Ok(*n),
        other => Err(Error::mismatch("map", other.kind_name())),
    }
}

pub fn pack_to_vec<T: Pack + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut packer = Packer::new();
    value.pack_to(&mut packer)?;
    Ok(packer.into_bytes())
}

/// Decodes the first value in `bytes` as a `T`.
pub fn unpack_from_slice<T: Unpack>(bytes: &[u8]) -> Result<T> {
    let mut unpacker = Unpacker::from_slice(bytes);
    unpack_next(&mut unpacker)
}

/// Implements [`Pack`] and [`Unpack`] for a struct with named fields,
/// encoded as an array of the listed fields in order.
///
/// Reading a shorter array fails with
/// [`Error::UnexpectedEndOfStream`](crate::Error::UnexpectedEndOfStream);
/// trailing items of a longer one are skipped.
#[macro_export]
macro_rules! impl_record {
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        impl $crate::serialization::Pack for $ty {
            fn pack_to(&self, packer: &mut $crate::Packer) -> $crate::Result<()> {
                packer.pack_array_header($crate::impl_record!(@count $($field)+))?;
                $( $crate::serialization::Pack::pack_to(&self.$field, packer)?; )+
                Ok(())
            }
        }

        impl $crate::serialization::Unpack for $ty {
            fn unpack_from<C: $crate::Cursor>(cursor: &mut C) -> $crate::Result<Self> {
                $crate::serialization::expect_array(cursor)?;
                let mut fields = $crate::Cursor::read_subtree(cursor)?;
                let value = $ty {
                    $( $field: $crate::serialization::unpack_next(&mut fields)?, )+
                };
                $crate::serialization::ScopedCursor::close(fields)?;
                Ok(value)
            }
        }
    };
    (@count $($field:ident)+) => { 0usize $(+ $crate::impl_record!(@one $field))+ };
    (@one $field:ident) => { 1usize };
}
