//! The skip engine: consume whole values without materialising them.
//!
//! Nesting is tracked with an explicit stack of remaining counts instead of
//! recursion, so arbitrarily deep input cannot exhaust the call stack, and
//! the progress can be parked when the input runs dry and resumed later.

use std::io::Read;

use log::trace;
use msgpack_stream_buffers::ByteSource;

use super::fetch::peek_marker;
use crate::error::{Error, Malformed, Result};

/// What a completed skip discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkipSummary {
    /// Bytes consumed from the source.
    pub bytes: u64,
    /// Values consumed, counting every nested value and header.
    pub items: u64,
}

#[derive(Debug)]
pub(crate) enum SkipStep {
    Done(SkipSummary),
    Starved,
}

#[derive(Debug, Default)]
pub(crate) struct SkipProgress {
    /// Values still owed per open level, innermost last.
    pending: Vec<u64>,
    /// Payload bytes of the current scalar not yet dropped.
    discard: u64,
    started: bool,
    summary: SkipSummary,
}

impl SkipProgress {
    /// Skips exactly one value.
    pub fn one() -> Self {
        Self::default()
    }

    /// Skips everything the given levels still owe.
    pub fn drain(remaining: Vec<u64>) -> Self {
        Self {
            pending: remaining,
            started: true,
            ..Self::default()
        }
    }

    /// Runs until done or out of input. `depth_limit` caps how many levels
    /// may be open at once.
    pub fn run<R: Read>(
        &mut self,
        source: &mut ByteSource<R>,
        depth_limit: usize,
    ) -> Result<SkipStep> {
        loop {
            if self.discard > 0 {
                let dropped = source.discard(self.discard)?;
                self.discard -= dropped;
                self.summary.bytes += dropped;
                if self.discard > 0 {
                    return Ok(SkipStep::Starved);
                }
            }
            while self.pending.last() == Some(&0) {
                self.pending.pop();
            }
            if self.started && self.pending.is_empty() {
                return Ok(SkipStep::Done(self.summary));
            }
            let Some(marker) = peek_marker(source)? else {
                return Ok(SkipStep::Starved);
            };
            if marker.is_collection() && self.pending.len() >= depth_limit {
                return Err(Error::MalformedFormat {
                    offset: source.position(),
                    reason: Malformed::TooDeep { limit: depth_limit },
                });
            }
            source.consume(marker.head_len);
            self.started = true;
            self.summary.bytes += marker.head_len as u64;
            self.summary.items += 1;
            if let Some(top) = self.pending.last_mut() {
                *top -= 1;
            }
            trace!(
                "skip tag 0x{:02x} at depth {}",
                marker.tag,
                self.pending.len()
            );
            if marker.is_collection() {
                self.pending.push(marker.child_count());
            } else {
                self.discard = marker.payload_len();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skip_all(bytes: &[u8]) -> (SkipSummary, u64) {
        let mut source = ByteSource::new(bytes, true);
        match SkipProgress::one().run(&mut source, 64).unwrap() {
            SkipStep::Done(summary) => (summary, source.position()),
            SkipStep::Starved => panic!("starved"),
        }
    }

    #[test]
    fn skips_scalar_with_payload() {
        let (summary, pos) = skip_all(&[0xa3, b'a', b'b', b'c', 0x01]);
        assert_eq!(summary, SkipSummary { bytes: 4, items: 1 });
        assert_eq!(pos, 4);
    }

    #[test]
    fn skips_nested_collections() {
        // [[1, [1]], 2] followed by 0x07
        let (summary, pos) = skip_all(&[0x92, 0x92, 0x01, 0x91, 0x01, 0x02, 0x07]);
        assert_eq!(summary.items, 6);
        assert_eq!(pos, 6);
    }

    #[test]
    fn skips_map_keys_and_values() {
        let (summary, pos) = skip_all(&[0x82, 0x01, 0xc0, 0xa1, b'x', 0x90, 0xff]);
        assert_eq!(summary.items, 5);
        assert_eq!(pos, 6);
    }

    #[test]
    fn drain_finishes_the_open_levels() {
        // Outer level owes one value, inner level owes two.
        let mut source = ByteSource::new(&[0x01, 0x02, 0x03, 0x04][..], true);
        let mut progress = SkipProgress::drain(vec![1, 2]);
        assert!(matches!(
            progress.run(&mut source, 64).unwrap(),
            SkipStep::Done(SkipSummary { items: 3, .. })
        ));
        assert_eq!(source.position(), 3);
    }

    #[test]
    fn starves_and_resumes_mid_payload() {
        let mut source = ByteSource::new(&[0xc4, 0x04, 0x00, 0x00][..], true);
        let mut progress = SkipProgress::one();
        assert!(matches!(
            progress.run(&mut source, 64).unwrap(),
            SkipStep::Starved
        ));
        assert_eq!(progress.discard, 2);
    }

    #[test]
    fn rejects_excessive_nesting() {
        let mut source = ByteSource::new(&[0x91, 0x91, 0x91, 0x01][..], true);
        let err = SkipProgress::one().run(&mut source, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedFormat {
                reason: Malformed::TooDeep { limit: 2 },
                ..
            }
        ));
    }
}
