use std::io::Read;
use std::iter::FusedIterator;

use msgpack_stream_buffers::ByteSource;

use super::state::{Advance, CursorState};
use super::{Mode, Operation};
use crate::error::{Error, Result};
use crate::value::DecodedValue;

/// Iterator over the values left in a cursor's scope.
///
/// While it is alive the cursor is `Enumerating`. Each item is the token a
/// `read` would have produced, headers included, so nested values follow
/// their header in wire order. Input that ends inside a value yields one
/// [`Error::InsufficientData`] and leaves the cursor suspended on a read.
#[derive(Debug)]
pub struct Items<'c, R: Read> {
    source: &'c mut ByteSource<R>,
    state: &'c mut CursorState,
    finished: bool,
}

impl<'c, R: Read> Items<'c, R> {
    pub(crate) fn new(source: &'c mut ByteSource<R>, state: &'c mut CursorState) -> Result<Self> {
        state.begin_enumeration()?;
        Ok(Self {
            source,
            state,
            finished: false,
        })
    }
}

impl<R: Read> Iterator for Items<'_, R> {
    type Item = Result<DecodedValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.state.advance(self.source) {
            Ok(Advance::Item) => self.state.data.clone().map(Ok),
            Ok(Advance::End) => {
                self.finished = true;
                None
            }
            Ok(Advance::Starved) => {
                self.finished = true;
                self.state.mode = Mode::Suspended(Operation::Read);
                Some(Err(Error::InsufficientData {
                    offset: self.source.position(),
                }))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: Read> FusedIterator for Items<'_, R> {}

impl<R: Read> Drop for Items<'_, R> {
    fn drop(&mut self) {
        if self.state.mode == Mode::Enumerating {
            self.state.mode = Mode::Ready;
        }
    }
}
