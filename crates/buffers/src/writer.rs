//! Binary buffer writer with auto-growing capacity.

/// A binary buffer writer that grows automatically as needed.
///
/// Everything multi-byte is written big-endian, which is the byte order
/// MessagePack uses on the wire.
///
/// # Example
///
/// ```
/// use msgpack_stream_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.u16(0x0203);
/// let data = writer.flush();
/// assert_eq!(data, [0x01, 0x02, 0x03]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Writer {
    /// Bytes written since the last flush.
    bytes: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a writer that pre-allocates `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written since the last flush.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes written since the last flush, without flushing them.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Ensures at least `additional` more bytes can be written without
    /// reallocating.
    pub fn ensure_capacity(&mut self, additional: usize) {
        self.bytes.reserve(additional);
    }

    /// Returns the bytes written since the last flush and empties the
    /// buffer, keeping its allocation for the next batch.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.bytes.to_vec();
        self.bytes.clear();
        result
    }

    /// Consumes the writer, returning every unflushed byte.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.bytes.push(val);
    }

    /// Writes a signed 8-bit integer.
    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.bytes.push(val as u8);
    }

    /// Writes an unsigned 16-bit integer (big-endian).
    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a signed 16-bit integer (big-endian).
    #[inline]
    pub fn i16(&mut self, val: i16) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes an unsigned 32-bit integer (big-endian).
    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a signed 32-bit integer (big-endian).
    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes an unsigned 64-bit integer (big-endian).
    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a signed 64-bit integer (big-endian).
    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a 32-bit floating point number (big-endian).
    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a 64-bit floating point number (big-endian).
    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a tag byte followed by a u8.
    pub fn u8u8(&mut self, tag: u8, val: u8) {
        self.bytes.extend_from_slice(&[tag, val]);
    }

    /// Writes a tag byte followed by a u16 (big-endian).
    pub fn u8u16(&mut self, tag: u8, val: u16) {
        self.ensure_capacity(3);
        self.u8(tag);
        self.u16(val);
    }

    /// Writes a tag byte followed by a u32 (big-endian).
    pub fn u8u32(&mut self, tag: u8, val: u32) {
        self.ensure_capacity(5);
        self.u8(tag);
        self.u32(val);
    }

    /// Writes a tag byte followed by a u64 (big-endian).
    pub fn u8u64(&mut self, tag: u8, val: u64) {
        self.ensure_capacity(9);
        self.u8(tag);
        self.u64(val);
    }

    /// Writes a tag byte followed by an f32 (big-endian).
    pub fn u8f32(&mut self, tag: u8, val: f32) {
        self.ensure_capacity(5);
        self.u8(tag);
        self.f32(val);
    }

    /// Writes a tag byte followed by an f64 (big-endian).
    pub fn u8f64(&mut self, tag: u8, val: f64) {
        self.ensure_capacity(9);
        self.u8(tag);
        self.f64(val);
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, buf: &[u8]) {
        self.bytes.extend_from_slice(buf);
    }
}
