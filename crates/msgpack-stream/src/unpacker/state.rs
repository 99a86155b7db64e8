//! Per-cursor state and the operations shared by root and subtree cursors.

use std::io::Read;

use log::{debug, trace};
use msgpack_stream_buffers::ByteSource;

use super::fetch::{fetch_value, Fetch};
use super::frame::{CollectionFrame, FrameStack};
use super::skip::{SkipProgress, SkipStep, SkipSummary};
use super::{Mode, Operation};
use crate::error::{Error, InvalidOperation, Malformed, Result};
use crate::options::UnpackerOptions;
use crate::value::DecodedValue;

/// Outcome of pulling one value for a cursor.
pub(crate) enum Advance {
    Item,
    /// The scope or the stream ended cleanly.
    End,
    /// Input ran out inside a value or inside an open collection.
    Starved,
}

#[derive(Debug)]
pub(crate) struct CursorState {
    pub(crate) data: Option<DecodedValue>,
    pub(crate) mode: Mode,
    frames: FrameStack,
    /// Set by the read that produced a header, cleared by anything else.
    at_header: bool,
    /// A skip parked by lack of input.
    skip: Option<SkipProgress>,
    options: UnpackerOptions,
    /// Frames held by ancestor cursors.
    outer_depth: usize,
}

impl CursorState {
    pub fn root(options: UnpackerOptions) -> Self {
        Self::with_frames(FrameStack::root(), options, 0)
    }

    fn with_frames(frames: FrameStack, options: UnpackerOptions, outer_depth: usize) -> Self {
        Self {
            data: None,
            mode: Mode::Ready,
            frames,
            at_header: false,
            skip: None,
            options,
            outer_depth,
        }
    }

    pub fn options(&self) -> &UnpackerOptions {
        &self.options
    }

    fn depth(&self) -> usize {
        self.outer_depth + self.frames.depth()
    }

    /// Values left in the cursor's own collection; zero for the root.
    pub fn remaining(&self) -> u64 {
        self.frames.base_frame().map_or(0, |f| f.remaining)
    }

    fn guard(&self, attempted: Operation) -> Result<()> {
        Ok(self.mode.check(attempted)?)
    }

    fn fault<T>(&mut self, err: Error) -> Result<T> {
        self.mode = Mode::Faulted;
        Err(err)
    }

    pub fn read<R: Read>(&mut self, source: &mut ByteSource<R>) -> Result<bool> {
        self.guard(Operation::Read)?;
        match self.advance(source)? {
            Advance::Item => {
                self.mode = Mode::Ready;
                Ok(true)
            }
            Advance::End => {
                self.mode = Mode::Ready;
                Ok(false)
            }
            Advance::Starved => {
                debug!("read suspended at offset {}", source.position());
                self.mode = Mode::Suspended(Operation::Read);
                Ok(false)
            }
        }
    }

    /// Pulls the next value into `data`. Leaves the mode alone unless the
    /// input is malformed.
    pub fn advance<R: Read>(&mut self, source: &mut ByteSource<R>) -> Result<Advance> {
        self.at_header = false;
        self.frames.collapse();
        if self.frames.exhausted() {
            return Ok(Advance::End);
        }
        match fetch_value(source, &self.options) {
            Ok(Fetch::Value(value)) => self.accept(value, source.position()),
            Ok(Fetch::End) if !self.frames.is_open() => Ok(Advance::End),
            Ok(Fetch::End | Fetch::Starved) => Ok(Advance::Starved),
            Err(err) => self.fault(err),
        }
    }

    fn accept(&mut self, value: DecodedValue, offset: u64) -> Result<Advance> {
        self.frames.consume_one();
        if let Some(frame) = CollectionFrame::for_header(&value) {
            if self.depth() >= self.options.max_depth {
                return self.fault(Error::MalformedFormat {
                    offset,
                    reason: Malformed::TooDeep {
                        limit: self.options.max_depth,
                    },
                });
            }
            self.frames.push(frame);
            self.at_header = true;
        }
        trace!("read {:?} at depth {}", value, self.depth());
        self.data = Some(value);
        Ok(Advance::Item)
    }

    pub fn skip<R: Read>(&mut self, source: &mut ByteSource<R>) -> Result<Option<SkipSummary>> {
        self.guard(Operation::Skip)?;
        self.at_header = false;
        let mut progress = match self.skip.take() {
            Some(progress) => progress,
            None => {
                self.frames.collapse();
                if self.frames.exhausted() {
                    return Ok(None);
                }
                if !self.frames.is_open() {
                    match source.is_exhausted() {
                        Ok(true) => return Ok(None),
                        Ok(false) => {}
                        Err(err) => return self.fault(err.into()),
                    }
                }
                SkipProgress::one()
            }
        };
        let limit = self.options.max_depth.saturating_sub(self.depth());
        match progress.run(source, limit) {
            Ok(SkipStep::Done(summary)) => {
                self.frames.consume_one();
                self.mode = Mode::Ready;
                trace!("skipped {} values ({} bytes)", summary.items, summary.bytes);
                Ok(Some(summary))
            }
            Ok(SkipStep::Starved) => {
                debug!("skip suspended at offset {}", source.position());
                self.skip = Some(progress);
                self.mode = Mode::Suspended(Operation::Skip);
                Ok(None)
            }
            Err(err) => self.fault(err),
        }
    }

    pub fn begin_enumeration(&mut self) -> Result<()> {
        self.guard(Operation::Enumerate)?;
        self.mode = Mode::Enumerating;
        Ok(())
    }

    /// Hands the collection just read over to a child cursor. Returns the
    /// child's state and the header it was opened on.
    pub fn open_subtree(&mut self) -> Result<(CursorState, DecodedValue)> {
        self.guard(Operation::ReadSubtree)?;
        let header = match (&self.data, self.at_header) {
            (Some(header), true) => header.clone(),
            (None, _) => return Err(InvalidOperation::NoCurrentValue.into()),
            (Some(_), false) => return Err(InvalidOperation::NotAtHeader.into()),
        };
        let frame = self
            .frames
            .pop_top()
            .ok_or(InvalidOperation::NotAtHeader)?;
        self.at_header = false;
        self.mode = Mode::SubtreeOpen;
        debug!(
            "open {:?} subtree of {} values at depth {}",
            frame.kind,
            frame.remaining,
            self.depth() + 1
        );
        let child = Self::with_frames(FrameStack::scoped(frame), self.options, self.depth());
        Ok((child, header))
    }

    /// Consumes everything the cursor's scope still holds, including a
    /// parked skip.
    pub fn finish<R: Read>(&mut self, source: &mut ByteSource<R>) -> Result<SkipSummary> {
        let result = self.drain(source);
        self.mode = if result.is_ok() {
            Mode::Ready
        } else {
            Mode::Faulted
        };
        result
    }

    fn drain<R: Read>(&mut self, source: &mut ByteSource<R>) -> Result<SkipSummary> {
        match self.mode {
            Mode::Ready | Mode::Suspended(_) => {}
            blocked => blocked.check(Operation::Skip)?,
        }
        let mut total = SkipSummary::default();
        if let Some(mut progress) = self.skip.take() {
            let limit = self.options.max_depth.saturating_sub(self.depth());
            match progress.run(source, limit)? {
                SkipStep::Done(summary) => {
                    self.frames.consume_one();
                    total = summary;
                }
                SkipStep::Starved => {
                    return Err(Error::InsufficientData {
                        offset: source.position(),
                    })
                }
            }
        }
        let limit = self.options.max_depth.saturating_sub(self.outer_depth);
        let mut progress = SkipProgress::drain(self.frames.take_remaining());
        match progress.run(source, limit)? {
            SkipStep::Done(summary) => {
                total.bytes += summary.bytes;
                total.items += summary.items;
                Ok(total)
            }
            SkipStep::Starved => Err(Error::InsufficientData {
                offset: source.position(),
            }),
        }
    }
}
