//! Refillable look-ahead window over a blocking byte stream.

use std::io::{self, Read};

use log::debug;

/// Default number of bytes requested from the reader per refill.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// A byte source that buffers just enough of an underlying reader to let a
/// decoder look at a complete value before consuming it.
///
/// Bytes enter the window through [`fill`](Self::fill) and leave it through
/// [`consume`](Self::consume) or [`discard`](Self::discard). Nothing is ever
/// handed out twice, so the stream position only moves forward.
///
/// End of input is not sticky: when the reader returns `0`, `fill` reports
/// `false`, but the next `fill` asks the reader again. A reader over a
/// growing stream can therefore deliver the rest of a value later.
///
/// The source also records whether it owns the reader. An owning source
/// closes (drops) the reader on [`release`](Self::release); a borrowing one
/// hands it back.
///
/// # Example
///
/// ```
/// use msgpack_stream_buffers::ByteSource;
///
/// let mut source = ByteSource::new(&[0x93u8, 0x01, 0x02, 0x03][..], true);
/// assert!(source.fill(2).unwrap());
/// assert_eq!(&source.window()[..2], &[0x93, 0x01]);
/// source.consume(1);
/// assert_eq!(source.position(), 1);
/// assert_eq!(source.discard(10).unwrap(), 3);
/// assert!(!source.fill(1).unwrap());
/// ```
#[derive(Debug)]
pub struct ByteSource<R> {
    reader: R,
    owns_source: bool,
    buf: Vec<u8>,
    /// Offset of the first unconsumed byte in `buf`.
    x: usize,
    chunk_size: usize,
    /// Total bytes consumed or discarded since creation.
    position: u64,
}

impl<R: Read> ByteSource<R> {
    /// Creates a source with the default refill size.
    pub fn new(reader: R, owns_source: bool) -> Self {
        Self::with_chunk_size(reader, owns_source, DEFAULT_CHUNK_SIZE)
    }

    /// Creates a source that asks the reader for `chunk_size` bytes per
    /// refill. A zero chunk size is bumped to one byte.
    pub fn with_chunk_size(reader: R, owns_source: bool, chunk_size: usize) -> Self {
        Self {
            reader,
            owns_source,
            buf: Vec::new(),
            x: 0,
            chunk_size: chunk_size.max(1),
            position: 0,
        }
    }

    /// Whether releasing this source closes the underlying reader.
    pub fn owns_source(&self) -> bool {
        self.owns_source
    }

    /// Number of buffered, unconsumed bytes.
    pub fn available(&self) -> usize {
        self.buf.len() - self.x
    }

    /// The buffered, unconsumed bytes.
    pub fn window(&self) -> &[u8] {
        &self.buf[self.x..]
    }

    /// Stream offset of the first byte of [`window`](Self::window).
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Makes sure at least `n` bytes are buffered.
    ///
    /// Returns `false` if the reader reached end of input first; whatever
    /// was read stays buffered.
    pub fn fill(&mut self, n: usize) -> io::Result<bool> {
        if self.available() >= n {
            return Ok(true);
        }
        self.compact();
        // Grow once, then let the reader fill the tail in as many calls as it
        // needs.
        let mut filled = self.buf.len();
        self.buf.resize(n.max(filled + self.chunk_size), 0);
        let result = loop {
            if filled >= n {
                break Ok(true);
            }
            match read_retrying(&mut self.reader, &mut self.buf[filled..]) {
                Ok(0) => break Ok(false),
                Ok(got) => filled += got,
                Err(e) => break Err(e),
            }
        };
        self.buf.truncate(filled);
        result
    }

    /// Whether the reader currently has nothing more to give.
    pub fn is_exhausted(&mut self) -> io::Result<bool> {
        Ok(!self.fill(1)?)
    }

    /// Drops `n` buffered bytes.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are buffered.
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.available(), "consume past the buffered window");
        self.x += n;
        self.position += n as u64;
    }

    /// Drops up to `n` bytes, reading through the source as needed without
    /// retaining anything. Returns how many bytes were dropped, which is less
    /// than `n` only when the reader ran out.
    pub fn discard(&mut self, n: u64) -> io::Result<u64> {
        let buffered = (self.available() as u64).min(n);
        self.consume(buffered as usize);
        let mut dropped = buffered;
        if dropped == n {
            return Ok(dropped);
        }
        // The window is empty here, so its storage doubles as scratch space.
        self.compact();
        self.buf.resize(self.chunk_size, 0);
        let result = loop {
            if dropped >= n {
                break Ok(dropped);
            }
            let want = (n - dropped).min(self.chunk_size as u64) as usize;
            match read_retrying(&mut self.reader, &mut self.buf[..want]) {
                Ok(0) => break Ok(dropped),
                Ok(got) => {
                    dropped += got as u64;
                    self.position += got as u64;
                }
                Err(e) => break Err(e),
            }
        };
        self.buf.clear();
        result
    }

    /// Gives the reader back if the source does not own it; otherwise closes
    /// it by dropping it.
    pub fn release(self) -> Option<R> {
        if self.owns_source {
            debug!("closing owned byte source at offset {}", self.position);
            drop(self.reader);
            None
        } else {
            debug!("returning borrowed byte source at offset {}", self.position);
            Some(self.reader)
        }
    }

    fn compact(&mut self) {
        if self.x == 0 {
            return;
        }
        if self.x == self.buf.len() {
            self.buf.clear();
        } else {
            self.buf.drain(..self.x);
        }
        self.x = 0;
    }
}

fn read_retrying<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::rc::Rc;

    /// Hands out one byte per `read` call.
    struct Trickle(VecDeque<u8>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match (self.0.pop_front(), buf.first_mut()) {
                (Some(b), Some(slot)) => {
                    *slot = b;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    /// A stream that another party keeps appending to.
    #[derive(Clone, Default)]
    struct Growing(Rc<RefCell<VecDeque<u8>>>);

    impl Read for Growing {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut queue = self.0.borrow_mut();
            let n = buf.len().min(queue.len());
            for slot in buf.iter_mut().take(n) {
                *slot = queue.pop_front().unwrap_or_default();
            }
            Ok(n)
        }
    }

    /// Hands out at most 4 KiB per call and remembers where each call's
    /// destination ends.
    struct Chunky {
        data: Cursor<Vec<u8>>,
        ends: Vec<usize>,
    }

    impl Read for Chunky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.ends.push(buf.as_ptr() as usize + buf.len());
            let n = buf.len().min(4096);
            self.data.read(&mut buf[..n])
        }
    }

    struct InterruptOnce {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptOnce {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_fill_across_small_reads() {
        let mut source = ByteSource::new(Trickle(VecDeque::from(vec![1, 2, 3, 4])), true);
        assert!(source.fill(3).unwrap());
        assert_eq!(source.window(), &[1, 2, 3]);
        assert!(!source.fill(5).unwrap());
        assert_eq!(source.window(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_large_fill_grows_buffer_once() {
        let len = 1 << 20;
        let reader = Chunky {
            data: Cursor::new(vec![0xab; len]),
            ends: Vec::new(),
        };
        let mut source = ByteSource::new(reader, true);
        assert!(source.fill(len).unwrap());
        assert_eq!(source.available(), len);
        assert!(source.window().iter().all(|&b| b == 0xab));

        // Every read lands in the same allocation, so the buffer was sized
        // once instead of once per read.
        let ends = &source.reader.ends;
        assert_eq!(ends.len(), len / 4096);
        assert!(ends.iter().all(|&end| end == ends[0]));
    }

    #[test]
    fn test_discard_reuses_scratch_space() {
        let reader = Chunky {
            data: Cursor::new(vec![1; 100_000]),
            ends: Vec::new(),
        };
        let mut source = ByteSource::with_chunk_size(reader, true, 8192);
        assert_eq!(source.discard(100_000).unwrap(), 100_000);
        assert_eq!(source.position(), 100_000);
        assert_eq!(source.available(), 0);
        assert_eq!(source.reader.ends.len(), 100_000 / 4096 + 1);
    }

    #[test]
    fn test_consume_advances_position() {
        let mut source = ByteSource::new(&[9u8, 8, 7][..], true);
        assert!(source.fill(3).unwrap());
        source.consume(2);
        assert_eq!(source.position(), 2);
        assert_eq!(source.window(), &[7]);
    }

    #[test]
    fn test_discard_streams_past_window() {
        let data: Vec<u8> = (0..=255).collect();
        let mut source = ByteSource::with_chunk_size(Cursor::new(data), true, 16);
        assert!(source.fill(4).unwrap());
        assert_eq!(source.discard(200).unwrap(), 200);
        assert!(source.fill(1).unwrap());
        assert_eq!(source.window()[0], 200);
        assert_eq!(source.position(), 200);
    }

    #[test]
    fn test_discard_reports_shortfall() {
        let mut source = ByteSource::new(&[1u8, 2, 3][..], true);
        assert_eq!(source.discard(10).unwrap(), 3);
        assert_eq!(source.position(), 3);
        assert!(source.is_exhausted().unwrap());
    }

    #[test]
    fn test_end_of_input_is_not_sticky() {
        let stream = Growing::default();
        let mut source = ByteSource::new(stream.clone(), true);
        stream.0.borrow_mut().push_back(0xd1);
        assert!(!source.fill(3).unwrap());
        stream.0.borrow_mut().extend([0x00, 0x01]);
        assert!(source.fill(3).unwrap());
        assert_eq!(source.window(), &[0xd1, 0x00, 0x01]);
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        let reader = InterruptOnce {
            interrupted: false,
            inner: Cursor::new(vec![5, 6]),
        };
        let mut source = ByteSource::new(reader, true);
        assert!(source.fill(2).unwrap());
        assert_eq!(source.window(), &[5, 6]);
    }

    #[test]
    fn test_release_honours_ownership() {
        let owned = ByteSource::new(Cursor::new(vec![1u8]), true);
        assert!(owned.release().is_none());

        let mut reader = Cursor::new(vec![1u8, 2]);
        let borrowed = ByteSource::new(&mut reader, false);
        assert!(borrowed.release().is_some());
        // The reader is still usable after the source is gone.
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![1, 2]);
    }
}
