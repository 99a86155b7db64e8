//! Pure MessagePack decoding over a byte window.
//!
//! Nothing here touches a stream: every function looks at the bytes it is
//! given, and either produces a result together with how many bytes it
//! accounts for, or says how many bytes it would need.

use thiserror::Error;

use super::constants::*;
use crate::value::{DecodedValue, Float, Integer};

/// Why a window could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The leading byte is not a tag of the format.
    #[error("unrecognized tag byte 0x{tag:02x}")]
    Malformed { tag: u8 },
    /// The window ends before the value does. `needed` counts from the
    /// first byte of the value.
    #[error("need {needed} bytes to decode the value")]
    Insufficient { needed: usize },
}

/// What follows the tag and length fields of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body {
    /// Nothing: nil, booleans, fixints.
    Empty,
    /// This many opaque bytes (number bits, raw or extension payload).
    Payload(u64),
    /// This many array elements, each a complete value.
    Array(u32),
    /// This many key/value pairs, each key and value a complete value.
    Map(u32),
}

/// The classification of a value from its head alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub tag: u8,
    /// Bytes taken by the tag, length fields and extension type byte.
    pub head_len: usize,
    pub body: Body,
}

impl Marker {
    pub fn payload_len(&self) -> u64 {
        match self.body {
            Body::Payload(n) => n,
            _ => 0,
        }
    }

    /// Number of contained values a collection header opens; `2 × pairs` for
    /// maps.
    pub fn child_count(&self) -> u64 {
        match self.body {
            Body::Array(n) => n as u64,
            Body::Map(n) => 2 * n as u64,
            _ => 0,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.body, Body::Array(_) | Body::Map(_))
    }

    /// Whether the payload is caller data (raw or extension bytes) rather
    /// than the bits of a fixed-width number.
    pub fn carries_bytes(&self) -> bool {
        matches!(
            self.tag,
            FIXSTR_MIN..=FIXSTR_MAX
                | STR8
                | STR16
                | STR32
                | BIN8
                | BIN16
                | BIN32
                | EXT8
                | EXT16
                | EXT32
                | FIXEXT1..=FIXEXT16
        )
    }
}

fn head_len(tag: u8) -> Result<usize, DecodeError> {
    Ok(match tag {
        NEVER_USED => return Err(DecodeError::Malformed { tag }),
        BIN8 | STR8 => 2,
        BIN16 | STR16 | ARRAY16 | MAP16 => 3,
        BIN32 | STR32 | ARRAY32 | MAP32 => 5,
        EXT8 => 3,
        EXT16 => 4,
        EXT32 => 6,
        FIXEXT1..=FIXEXT16 => 2,
        _ => 1,
    })
}

#[inline]
fn be_u16(b: &[u8]) -> u16 {
    u16::from_be_bytes([b[0], b[1]])
}

#[inline]
fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

#[inline]
fn be_u64(b: &[u8]) -> u64 {
    u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
}

/// Decodes the tag and length fields of the value at the start of `bytes`.
///
/// Only the head has to be present; the payload and any contained values
/// are not looked at.
pub fn classify(bytes: &[u8]) -> Result<Marker, DecodeError> {
    let tag = *bytes.first().ok_or(DecodeError::Insufficient { needed: 1 })?;
    let head_len = head_len(tag)?;
    if bytes.len() < head_len {
        return Err(DecodeError::Insufficient { needed: head_len });
    }
    let h = &bytes[1..head_len];
    let body = match tag {
        0x00..=POSFIXINT_MAX | NEGFIXINT_MIN..=0xff | NIL | FALSE | TRUE => Body::Empty,
        FIXMAP_MIN..=FIXMAP_MAX => Body::Map((tag & 0x0f) as u32),
        FIXARRAY_MIN..=FIXARRAY_MAX => Body::Array((tag & 0x0f) as u32),
        FIXSTR_MIN..=FIXSTR_MAX => Body::Payload((tag & 0x1f) as u64),
        BIN8 | STR8 | EXT8 => Body::Payload(h[0] as u64),
        BIN16 | STR16 | EXT16 => Body::Payload(be_u16(h) as u64),
        BIN32 | STR32 | EXT32 => Body::Payload(be_u32(h) as u64),
        UINT8 | INT8 => Body::Payload(1),
        UINT16 | INT16 => Body::Payload(2),
        UINT32 | INT32 | FLOAT32 => Body::Payload(4),
        UINT64 | INT64 | FLOAT64 => Body::Payload(8),
        FIXEXT1 => Body::Payload(1),
        FIXEXT2 => Body::Payload(2),
        FIXEXT4 => Body::Payload(4),
        FIXEXT8 => Body::Payload(8),
        FIXEXT16 => Body::Payload(16),
        ARRAY16 => Body::Array(be_u16(h) as u32),
        ARRAY32 => Body::Array(be_u32(h)),
        MAP16 => Body::Map(be_u16(h) as u32),
        MAP32 => Body::Map(be_u32(h)),
        NEVER_USED => return Err(DecodeError::Malformed { tag }),
    };
    Ok(Marker {
        tag,
        head_len,
        body,
    })
}

/// Decodes one value from the start of `bytes`.
///
/// Returns the value and the number of bytes it occupies. Collection
/// headers decode to [`DecodedValue::ArrayHeader`] /
/// [`DecodedValue::MapHeader`] and account only for the header bytes.
///
/// ```
/// use msgpack_stream::format::decode_value;
/// use msgpack_stream::DecodedValue;
///
/// let (value, used) = decode_value(&[0xcd, 0x01, 0x00, 0xff]).unwrap();
/// assert_eq!(value, DecodedValue::from(256u64));
/// assert_eq!(used, 3);
/// ```
pub fn decode_value(bytes: &[u8]) -> Result<(DecodedValue, usize), DecodeError> {
    let marker = classify(bytes)?;
    let payload_len = usize::try_from(marker.payload_len())
        .map_err(|_| DecodeError::Malformed { tag: marker.tag })?;
    let total = marker
        .head_len
        .checked_add(payload_len)
        .ok_or(DecodeError::Malformed { tag: marker.tag })?;
    if bytes.len() < total {
        return Err(DecodeError::Insufficient { needed: total });
    }
    let p = &bytes[marker.head_len..total];
    let tag = marker.tag;
    let value = match marker.body {
        Body::Array(n) => DecodedValue::ArrayHeader(n),
        Body::Map(n) => DecodedValue::MapHeader(n),
        Body::Empty => match tag {
            NIL => DecodedValue::Nil,
            FALSE => DecodedValue::Bool(false),
            TRUE => DecodedValue::Bool(true),
            0x00..=POSFIXINT_MAX => DecodedValue::Integer(Integer::Unsigned(tag as u64)),
            _ => DecodedValue::Integer(Integer::Signed(tag as i8 as i64)),
        },
        Body::Payload(_) => match tag {
            UINT8 => DecodedValue::Integer(Integer::Unsigned(p[0] as u64)),
            UINT16 => DecodedValue::Integer(Integer::Unsigned(be_u16(p) as u64)),
            UINT32 => DecodedValue::Integer(Integer::Unsigned(be_u32(p) as u64)),
            UINT64 => DecodedValue::Integer(Integer::Unsigned(be_u64(p))),
            INT8 => DecodedValue::Integer(Integer::Signed(p[0] as i8 as i64)),
            INT16 => DecodedValue::Integer(Integer::Signed(be_u16(p) as i16 as i64)),
            INT32 => DecodedValue::Integer(Integer::Signed(be_u32(p) as i32 as i64)),
            INT64 => DecodedValue::Integer(Integer::Signed(be_u64(p) as i64)),
            FLOAT32 => DecodedValue::Float(Float::F32(f32::from_bits(be_u32(p)))),
            FLOAT64 => DecodedValue::Float(Float::F64(f64::from_bits(be_u64(p)))),
            FIXEXT1..=FIXEXT16 | EXT8 | EXT16 | EXT32 => DecodedValue::Extension {
                type_tag: bytes[marker.head_len - 1] as i8,
                payload: p.to_vec(),
            },
            _ => DecodedValue::Raw(p.to_vec()),
        },
    };
    Ok((value, total))
}
