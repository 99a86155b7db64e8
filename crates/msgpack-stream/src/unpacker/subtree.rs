use std::io::Read;

use log::{debug, warn};
use msgpack_stream_buffers::ByteSource;

use super::state::CursorState;
use super::{Cursor, Items, Mode, ScopedCursor, SkipSummary};
use crate::error::Result;
use crate::value::DecodedValue;

/// A cursor confined to one array or map.
///
/// Reads return `false` once the collection's declared items are used up.
/// Whatever is left unread is skipped when the subtree is closed or
/// dropped, so the parent always resumes right after the collection.
#[derive(Debug)]
pub struct Subtree<'a, R: Read> {
    source: &'a mut ByteSource<R>,
    parent: &'a mut CursorState,
    state: CursorState,
    header: DecodedValue,
    closed: bool,
}

impl<'a, R: Read> Subtree<'a, R> {
    pub(crate) fn open(source: &'a mut ByteSource<R>, parent: &'a mut CursorState) -> Result<Self> {
        let (state, header) = parent.open_subtree()?;
        Ok(Self {
            source,
            parent,
            state,
            header,
            closed: false,
        })
    }

    pub fn read(&mut self) -> Result<bool> {
        self.state.read(self.source)
    }

    /// The last value this subtree read. `None` until its first read.
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
        Subtree::open(self.source, &mut self.state)
    }

    pub fn skip(&mut self) -> Result<Option<SkipSummary>> {
        self.state.skip(self.source)
    }

    pub fn items(&mut self) -> Result<Items<'_, R>> {
        Items::new(self.source, &mut self.state)
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn position(&self) -> u64 {
        self.source.position()
    }

    /// The header this subtree was opened on.
    pub fn header(&self) -> &DecodedValue {
        &self.header
    }

    /// Values of this collection not yet read or skipped at this level.
    pub fn remaining(&self) -> u64 {
        self.state.remaining()
    }

    /// Skips the unread rest of the collection and gives control back to
    /// the parent.
    ///
    /// Unlike dropping, this reports a remainder that is malformed or cut
    /// short. The parent is unusable after such a failure.
    pub fn close(mut self) -> Result<()> {
        self.dispose()
    }

    fn dispose(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.state.finish(self.source) {
            Ok(drained) => {
                debug!(
                    "close subtree on {:?}, drained {} values",
                    self.header, drained.items
                );
                self.parent.mode = Mode::Ready;
                Ok(())
            }
            Err(err) => {
                self.parent.mode = Mode::Faulted;
                Err(err)
            }
        }
    }
}

impl<R: Read> Drop for Subtree<'_, R> {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            warn!("failed to drain subtree on {:?}: {err}", self.header);
        }
    }
}

impl<'a, R: Read> Cursor for Subtree<'a, R> {
    type Subtree<'s>
        = Subtree<'s, R>
    where
        Self: 's;

    fn read(&mut self) -> Result<bool> {
        Subtree::read(self)
    }

    fn data(&self) -> Option<&DecodedValue> {
        Subtree::data(self)
    }

    fn read_subtree(&mut self) -> Result<Self::Subtree<'_>> {
        Subtree::read_subtree(self)
    }

    fn skip(&mut self) -> Result<Option<SkipSummary>> {
        Subtree::skip(self)
    }

    fn mode(&self) -> Mode {
        Subtree::mode(self)
    }

    fn position(&self) -> u64 {
        Subtree::position(self)
    }
}

impl<R: Read> ScopedCursor for Subtree<'_, R> {
    fn close(self) -> Result<()> {
        Subtree::close(self)
    }

    fn header(&self) -> &DecodedValue {
        Subtree::header(self)
    }

    fn remaining(&self) -> u64 {
        Subtree::remaining(self)
    }
}
