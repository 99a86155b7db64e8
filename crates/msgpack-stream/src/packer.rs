//! `Packer`: the MessagePack encoder.
//!
//! Every call writes exactly one tag plus its length fields and payload.
//! Callers that write a collection header are responsible for writing as
//! many values as the header declares.

use std::io::{self, Write};

use msgpack_stream_buffers::Writer;

use crate::error::{Error, Result};
use crate::format::constants::*;
use crate::options::{PackerCompatibility, PackerOptions};
use crate::value::{DecodedValue, Float, Integer, Value};

#[derive(Debug, Clone, Default)]
pub struct Packer {
    writer: Writer,
    options: PackerOptions,
}

fn checked_len(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| Error::Argument(format!("{what} of length {len} exceeds u32::MAX")))
}

impl Packer {
    pub fn new() -> Self {
        Self::with_options(PackerOptions::default())
    }

    pub fn with_options(options: PackerOptions) -> Self {
        Self {
            writer: Writer::new(),
            options,
        }
    }

    pub fn options(&self) -> &PackerOptions {
        &self.options
    }

    /// Bytes written and not yet flushed.
    pub fn as_bytes(&self) -> &[u8] {
        self.writer.as_slice()
    }

    /// Takes the bytes written since the last flush.
    pub fn flush(&mut self) -> Vec<u8> {
        self.writer.flush()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_bytes()
    }

    /// Moves the unflushed bytes into `out`.
    pub fn write_to<W: Write>(&mut self, mut out: W) -> io::Result<()> {
        out.write_all(&self.writer.flush())
    }

    pub fn pack_nil(&mut self) {
        self.writer.u8(NIL);
    }

    pub fn pack_bool(&mut self, b: bool) {
        self.writer.u8(if b { TRUE } else { FALSE });
    }

    /// Writes `num` in the shortest unsigned form.
    pub fn pack_u64(&mut self, num: u64) {
        let writer = &mut self.writer;
        if num <= POSFIXINT_MAX as u64 {
            writer.u8(num as u8);
        } else if num <= 0xff {
            writer.u8u8(UINT8, num as u8);
        } else if num <= 0xffff {
            writer.u8u16(UINT16, num as u16);
        } else if num <= 0xffff_ffff {
            writer.u8u32(UINT32, num as u32);
        } else {
            writer.u8u64(UINT64, num);
        }
    }

    /// Writes `num` in the shortest form. Non-negative numbers use the
    /// unsigned family.
    pub fn pack_i64(&mut self, num: i64) {
        if num >= 0 {
            return self.pack_u64(num as u64);
        }
        let writer = &mut self.writer;
        if num >= -0x20 {
            writer.i8(num as i8);
        } else if num >= i8::MIN as i64 {
            writer.u8(INT8);
            writer.i8(num as i8);
        } else if num >= i16::MIN as i64 {
            writer.u8(INT16);
            writer.i16(num as i16);
        } else if num >= i32::MIN as i64 {
            writer.u8(INT32);
            writer.i32(num as i32);
        } else {
            writer.u8(INT64);
            writer.i64(num);
        }
    }

    pub fn pack_integer(&mut self, int: Integer) {
        match int {
            Integer::Unsigned(u) => self.pack_u64(u),
            Integer::Signed(i) => self.pack_i64(i),
        }
    }

    pub fn pack_f32(&mut self, float: f32) {
        self.writer.u8f32(FLOAT32, float);
    }

    pub fn pack_f64(&mut self, float: f64) {
        self.writer.u8f64(FLOAT64, float);
    }

    pub fn pack_float(&mut self, float: Float) {
        match float {
            Float::F32(f) => self.pack_f32(f),
            Float::F64(f) => self.pack_f64(f),
        }
    }

    fn str_hdr(&mut self, len: u32) {
        let classic = self.options.compatibility == PackerCompatibility::Classic;
        if len <= FIXSTR_LEN_MAX as u32 {
            self.writer.u8(FIXSTR_MIN | len as u8);
        } else if len <= 0xff && !classic {
            self.writer.u8u8(STR8, len as u8);
        } else if len <= 0xffff {
            self.writer.u8u16(STR16, len as u16);
        } else {
            self.writer.u8u32(STR32, len);
        }
    }

    fn bin_hdr(&mut self, len: u32) {
        if len <= 0xff {
            self.writer.u8u8(BIN8, len as u8);
        } else if len <= 0xffff {
            self.writer.u8u16(BIN16, len as u16);
        } else {
            self.writer.u8u32(BIN32, len);
        }
    }

    pub fn pack_str(&mut self, s: &str) -> Result<()> {
        self.pack_raw(s.as_bytes())
    }

    /// Writes `bytes` with the str family of tags.
    pub fn pack_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let len = checked_len(bytes.len(), "raw")?;
        self.writer.ensure_capacity(5 + bytes.len());
        self.str_hdr(len);
        self.writer.buf(bytes);
        Ok(())
    }

    /// Writes `bytes` with the bin family, or the str family in classic
    /// mode.
    pub fn pack_bin(&mut self, bytes: &[u8]) -> Result<()> {
        let len = checked_len(bytes.len(), "binary")?;
        self.writer.ensure_capacity(5 + bytes.len());
        match self.options.compatibility {
            PackerCompatibility::Modern => self.bin_hdr(len),
            PackerCompatibility::Classic => self.str_hdr(len),
        }
        self.writer.buf(bytes);
        Ok(())
    }

    pub fn pack_ext(&mut self, type_tag: i8, payload: &[u8]) -> Result<()> {
        let len = checked_len(payload.len(), "extension payload")?;
        self.writer.ensure_capacity(6 + payload.len());
        match len {
            1 => self.writer.u8(FIXEXT1),
            2 => self.writer.u8(FIXEXT2),
            4 => self.writer.u8(FIXEXT4),
            8 => self.writer.u8(FIXEXT8),
            16 => self.writer.u8(FIXEXT16),
            _ if len <= 0xff => self.writer.u8u8(EXT8, len as u8),
            _ if len <= 0xffff => self.writer.u8u16(EXT16, len as u16),
            _ => self.writer.u8u32(EXT32, len),
        }
        self.writer.i8(type_tag);
        self.writer.buf(payload);
        Ok(())
    }

    /// Writes an array header; exactly `len` values must follow.
    pub fn pack_array_header(&mut self, len: usize) -> Result<()> {
        let len = checked_len(len, "array")?;
        if len <= FIX_COLLECTION_MAX {
            self.writer.u8(FIXARRAY_MIN | len as u8);
        } else if len <= 0xffff {
            self.writer.u8u16(ARRAY16, len as u16);
        } else {
            self.writer.u8u32(ARRAY32, len);
        }
        Ok(())
    }

    /// Writes a map header; exactly `len` key/value pairs must follow.
    pub fn pack_map_header(&mut self, len: usize) -> Result<()> {
        let len = checked_len(len, "map")?;
        if len <= FIX_COLLECTION_MAX {
            self.writer.u8(FIXMAP_MIN | len as u8);
        } else if len <= 0xffff {
            self.writer.u8u16(MAP16, len as u16);
        } else {
            self.writer.u8u32(MAP32, len);
        }
        Ok(())
    }

    /// Writes one token as `Unpacker::read` would return it. Headers are
    /// written alone.
    pub fn pack_value(&mut self, value: &DecodedValue) -> Result<()> {
        match value {
            DecodedValue::Nil => self.pack_nil(),
            DecodedValue::Bool(b) => self.pack_bool(*b),
            DecodedValue::Integer(i) => self.pack_integer(*i),
            DecodedValue::Float(f) => self.pack_float(*f),
            DecodedValue::Raw(bytes) => self.pack_raw(bytes)?,
            DecodedValue::ArrayHeader(n) => self.pack_array_header(*n as usize)?,
            DecodedValue::MapHeader(n) => self.pack_map_header(*n as usize)?,
            DecodedValue::Extension { type_tag, payload } => self.pack_ext(*type_tag, payload)?,
        }
        Ok(())
    }

    /// Writes a whole value tree.
    pub fn pack_tree(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Nil => self.pack_nil(),
            Value::Bool(b) => self.pack_bool(*b),
            Value::Integer(i) => self.pack_integer(*i),
            Value::Float(f) => self.pack_float(*f),
            Value::Raw(bytes) => self.pack_raw(bytes)?,
            Value::Array(items) => {
                self.pack_array_header(items.len())?;
                for item in items {
                    self.pack_tree(item)?;
                }
            }
            Value::Map(pairs) => {
                self.pack_map_header(pairs.len())?;
                for (key, val) in pairs {
                    self.pack_tree(key)?;
                    self.pack_tree(val)?;
                }
            }
            Value::Extension { type_tag, payload } => self.pack_ext(*type_tag, payload)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(f: impl FnOnce(&mut Packer)) -> Vec<u8> {
        let mut packer = Packer::new();
        f(&mut packer);
        packer.into_bytes()
    }

    #[test]
    fn integers_use_the_shortest_form() {
        assert_eq!(packed(|p| p.pack_u64(0x7f)), [0x7f]);
        assert_eq!(packed(|p| p.pack_u64(0x80)), [0xcc, 0x80]);
        assert_eq!(packed(|p| p.pack_u64(0x100)), [0xcd, 0x01, 0x00]);
        assert_eq!(packed(|p| p.pack_i64(-1)), [0xff]);
        assert_eq!(packed(|p| p.pack_i64(-32)), [0xe0]);
        assert_eq!(packed(|p| p.pack_i64(-33)), [0xd0, 0xdf]);
        assert_eq!(packed(|p| p.pack_i64(-129)), [0xd1, 0xff, 0x7f]);
        assert_eq!(packed(|p| p.pack_i64(5)), [0x05]);
    }

    #[test]
    fn classic_mode_avoids_str8_and_bin() {
        let mut packer = Packer::with_options(PackerOptions {
            compatibility: PackerCompatibility::Classic,
        });
        packer.pack_bin(&[1, 2]).unwrap();
        packer.pack_raw(&[b'x'; 40]).unwrap();
        let bytes = packer.into_bytes();
        assert_eq!(&bytes[..3], &[0xa2, 1, 2]);
        assert_eq!(&bytes[3..6], &[0xda, 0x00, 40]);
    }

    #[test]
    fn ext_prefers_fixext() {
        assert_eq!(packed(|p| p.pack_ext(5, &[9]).unwrap()), [0xd4, 0x05, 0x09]);
        assert_eq!(
            packed(|p| p.pack_ext(-1, &[1, 2, 3]).unwrap()),
            [0xc7, 0x03, 0xff, 1, 2, 3]
        );
    }

    #[test]
    fn write_to_drains_the_buffer() {
        let mut packer = Packer::new();
        packer.pack_array_header(2).unwrap();
        packer.pack_nil();
        packer.pack_bool(true);
        let mut out = Vec::new();
        packer.write_to(&mut out).unwrap();
        assert_eq!(out, [0x92, 0xc0, 0xc3]);
        assert!(packer.as_bytes().is_empty());
    }

    #[test]
    fn streaming_small_values_does_not_accumulate() {
        let mut packer = Packer::new();
        let mut out = Vec::new();
        for i in 0..10_000i64 {
            packer.pack_nil();
            packer.pack_i64(-(i % 100));
            packer.write_to(&mut out).unwrap();
            assert!(packer.as_bytes().is_empty());
        }
        assert_eq!(&out[..4], &[0xc0, 0x00, 0xc0, 0xff]);
        assert!(packer.into_bytes().is_empty());
    }
}
