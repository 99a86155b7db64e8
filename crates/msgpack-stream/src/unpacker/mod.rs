//! Streaming MessagePack reader.
//!
//! An [`Unpacker`] hands out one [`DecodedValue`] per [`read`](Unpacker::read).
//! Array and map headers arrive as tokens; their contents are either read
//! one by one, delegated to a [`Subtree`] cursor, or skipped whole.
//!
//! ```
//! use msgpack_stream::{DecodedValue, Unpacker};
//!
//! // [1, [2, 3]], 4
//! let bytes = [0x92, 0x01, 0x92, 0x02, 0x03, 0x04];
//! let mut unpacker = Unpacker::from_slice(&bytes);
//!
//! assert!(unpacker.read().unwrap());
//! assert!(unpacker.is_array_header());
//! {
//!     let mut outer = unpacker.read_subtree().unwrap();
//!     assert!(outer.read().unwrap());
//!     assert_eq!(outer.data(), Some(&DecodedValue::from(1u64)));
//!     // The nested array is left unread; closing skips it.
//! }
//! assert!(unpacker.read().unwrap());
//! assert_eq!(unpacker.data(), Some(&DecodedValue::from(4u64)));
//! assert!(!unpacker.read().unwrap());
//! ```

mod fetch;
mod frame;
mod items;
mod mode;
mod skip;
mod state;
mod subtree;

use std::io::Read;

use msgpack_stream_buffers::ByteSource;

use crate::error::Result;
use crate::options::UnpackerOptions;
use crate::value::DecodedValue;

pub use items::Items;
pub use mode::{Mode, Operation};
pub use skip::SkipSummary;
pub use subtree::Subtree;

use state::CursorState;

/// The operations shared by root and subtree cursors.
///
/// Typed readers are written against this trait so the same code runs at
/// the top level and inside a collection.
pub trait Cursor {
    type Subtree<'s>: ScopedCursor
    where
        Self: 's;

    /// Decodes the next value of the current scope.
    ///
    /// `Ok(false)` when the scope or stream has ended (or the input is cut
    /// short, which suspends the cursor); [`data`](Self::data) then keeps
    /// its previous value.
    fn read(&mut self) -> Result<bool>;

    /// The last value successfully read by this cursor.
    fn data(&self) -> Option<&DecodedValue>;

    fn is_array_header(&self) -> bool {
        self.data().is_some_and(DecodedValue::is_array_header)
    }

    fn is_map_header(&self) -> bool {
        self.data().is_some_and(DecodedValue::is_map_header)
    }

    /// Opens a cursor over the collection whose header was just read.
    fn read_subtree(&mut self) -> Result<Self::Subtree<'_>>;

    /// Consumes the next value of the current scope, with all of its
    /// contents, without exposing it.
    ///
    /// `Ok(None)` when there was nothing to skip or the input ran out, in
    /// which case the cursor is suspended and the skip can be retried.
    fn skip(&mut self) -> Result<Option<SkipSummary>>;

    fn mode(&self) -> Mode;

    /// Bytes consumed from the shared source so far.
    fn position(&self) -> u64;
}

/// A cursor scoped to one collection, as handed out by
/// [`Cursor::read_subtree`].
pub trait ScopedCursor: Cursor {
    /// Skips what is left of the collection and returns control to the
    /// parent, reporting a remainder that cannot be skipped.
    fn close(self) -> Result<()>;

    /// The header the cursor was opened on.
    fn header(&self) -> &DecodedValue;

    /// Values of the collection not yet read or skipped at its own level.
    fn remaining(&self) -> u64;
}

/// The root cursor over a byte stream.
#[derive(Debug)]
pub struct Unpacker<R> {
    source: ByteSource<R>,
    state: CursorState,
}

impl<'b> Unpacker<&'b [u8]> {
    /// Reads from an in-memory buffer.
    pub fn from_slice(bytes: &'b [u8]) -> Self {
        Self::create(bytes, true)
    }
}

impl<R: Read> Unpacker<R> {
    /// Creates an unpacker that owns (and closes) `source`.
    pub fn new(source: R) -> Self {
        Self::create(source, true)
    }

    /// Creates an unpacker with default options. With `owns_source` false,
    /// [`close`](Self::close) hands the reader back instead of dropping it.
    pub fn create(source: R, owns_source: bool) -> Self {
        let options = UnpackerOptions::default();
        Self {
            source: ByteSource::with_chunk_size(source, owns_source, options.read_chunk_size),
            state: CursorState::root(options),
        }
    }

    pub fn with_options(source: R, owns_source: bool, options: UnpackerOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            source: ByteSource::with_chunk_size(source, owns_source, options.read_chunk_size),
            state: CursorState::root(options),
        })
    }

    pub fn options(&self) -> &UnpackerOptions {
        self.state.options()
    }

    pub fn owns_source(&self) -> bool {
        self.source.owns_source()
    }

    pub fn read(&mut self) -> Result<bool> {
        self.state.read(&mut self.source)
    }

    pub fn data(&self) -> Option<&DecodedValue> {
        self.state.data.as_ref()
    }

    pub fn is_array_header(&self) -> bool {
        self.data().is_some_and(DecodedValue::is_array_header)
    }

    pub fn is_map_header(&self) -> bool {
        self.data().is_some_and(DecodedValue::is_map_header)
    }

    pub fn read_subtree(&mut self) -> Result<Subtree<'_, R>> {
        Subtree::open(&mut self.source, &mut self.state)
    }

    pub fn skip(&mut self) -> Result<Option<SkipSummary>> {
        self.state.skip(&mut self.source)
    }

    /// Iterates over the remaining top-level tokens.
    pub fn items(&mut self) -> Result<Items<'_, R>> {
        Items::new(&mut self.source, &mut self.state)
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn position(&self) -> u64 {
        self.source.position()
    }

    /// Ends the session. Returns the reader if the unpacker did not own it.
    pub fn close(self) -> Option<R> {
        self.source.release()
    }
}

impl<R: Read> Cursor for Unpacker<R> {
    type Subtree<'s>
        = Subtree<'s, R>
    where
        Self: 's;

    fn read(&mut self) -> Result<bool> {
        Unpacker::read(self)
    }

    fn data(&self) -> Option<&DecodedValue> {
        Unpacker::data(self)
    }

    fn read_subtree(&mut self) -> Result<Self::Subtree<'_>> {
        Unpacker::read_subtree(self)
    }

    fn skip(&mut self) -> Result<Option<SkipSummary>> {
        Unpacker::skip(self)
    }

    fn mode(&self) -> Mode {
        Unpacker::mode(self)
    }

    fn position(&self) -> u64 {
        Unpacker::position(self)
    }
}
