//! Bookkeeping for open collection scopes.

use crate::value::DecodedValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Array,
    Map,
}

/// One open collection and how many values it still holds.
///
/// Map frames count keys and values separately, so a map of `n` pairs
/// starts at `2n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionFrame {
    pub kind: FrameKind,
    pub remaining: u64,
}

impl CollectionFrame {
    /// The frame a header opens, or `None` for scalars.
    pub fn for_header(value: &DecodedValue) -> Option<Self> {
        match value {
            DecodedValue::ArrayHeader(n) => Some(Self {
                kind: FrameKind::Array,
                remaining: *n as u64,
            }),
            DecodedValue::MapHeader(n) => Some(Self {
                kind: FrameKind::Map,
                remaining: 2 * *n as u64,
            }),
            _ => None,
        }
    }
}

/// Per-cursor stack of open frames.
///
/// The frames below `base` belong to the cursor itself (a subtree's own
/// collection) and are never popped by reads.
#[derive(Debug, Clone, Default)]
pub(crate) struct FrameStack {
    frames: Vec<CollectionFrame>,
    base: usize,
}

impl FrameStack {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn scoped(frame: CollectionFrame) -> Self {
        Self {
            frames: vec![frame],
            base: 1,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Pops finished frames above the base.
    pub fn collapse(&mut self) {
        while self.frames.len() > self.base {
            match self.frames.last() {
                Some(top) if top.remaining == 0 => {
                    self.frames.pop();
                }
                _ => break,
            }
        }
    }

    /// Whether the innermost frame has nothing left. Only meaningful after
    /// [`collapse`](Self::collapse).
    pub fn exhausted(&self) -> bool {
        self.frames.last().is_some_and(|f| f.remaining == 0)
    }

    /// Whether some frame still expects values.
    pub fn is_open(&self) -> bool {
        self.frames.iter().any(|f| f.remaining > 0)
    }

    pub fn consume_one(&mut self) {
        if let Some(top) = self.frames.last_mut() {
            top.remaining = top.remaining.saturating_sub(1);
        }
    }

    pub fn push(&mut self, frame: CollectionFrame) {
        self.frames.push(frame);
    }

    /// Hands the innermost frame over to a child cursor.
    pub fn pop_top(&mut self) -> Option<CollectionFrame> {
        if self.frames.len() > self.base {
            self.frames.pop()
        } else {
            None
        }
    }

    /// The cursor's own frame.
    pub fn base_frame(&self) -> Option<&CollectionFrame> {
        self.base.checked_sub(1).and_then(|i| self.frames.get(i))
    }

    /// Remaining counts from outermost to innermost, leaving the stack
    /// empty.
    pub fn take_remaining(&mut self) -> Vec<u64> {
        self.frames.drain(..).map(|f| f.remaining).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_frames_count_keys_and_values() {
        let frame = CollectionFrame::for_header(&DecodedValue::MapHeader(3)).unwrap();
        assert_eq!(frame.kind, FrameKind::Map);
        assert_eq!(frame.remaining, 6);
        let big = CollectionFrame::for_header(&DecodedValue::MapHeader(u32::MAX)).unwrap();
        assert_eq!(big.remaining, 2 * u32::MAX as u64);
        assert!(CollectionFrame::for_header(&DecodedValue::Nil).is_none());
    }

    #[test]
    fn collapse_keeps_the_base_frame() {
        let mut stack = FrameStack::scoped(CollectionFrame {
            kind: FrameKind::Array,
            remaining: 1,
        });
        stack.consume_one();
        stack.push(CollectionFrame {
            kind: FrameKind::Array,
            remaining: 0,
        });
        stack.collapse();
        assert_eq!(stack.depth(), 1);
        assert!(stack.exhausted());
        assert!(stack.pop_top().is_none());
    }

    #[test]
    fn root_stack_is_closed_when_empty() {
        let mut stack = FrameStack::root();
        assert!(!stack.is_open());
        assert!(!stack.exhausted());
        stack.push(CollectionFrame {
            kind: FrameKind::Array,
            remaining: 2,
        });
        assert!(stack.is_open());
        assert_eq!(stack.take_remaining(), vec![2]);
        assert_eq!(stack.depth(), 0);
    }
}
