//! Decoded values: the per-`read` token and the materialised tree.

use std::fmt;

/// An integer exactly as it appeared on the wire.
///
/// Positive fixint and the `uint*` family decode as [`Integer::Unsigned`];
/// negative fixint and the `int*` family decode as [`Integer::Signed`].
/// Equality is numeric, so `Signed(1) == Unsigned(1)`.
#[derive(Debug, Clone, Copy)]
pub enum Integer {
    Unsigned(u64),
    Signed(i64),
}

impl Integer {
    pub fn as_i128(self) -> i128 {
        match self {
            Integer::Unsigned(u) => u as i128,
            Integer::Signed(i) => i as i128,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        i64::try_from(self.as_i128()).ok()
    }

    pub fn as_u64(self) -> Option<u64> {
        u64::try_from(self.as_i128()).ok()
    }

    pub fn is_negative(self) -> bool {
        matches!(self, Integer::Signed(i) if i < 0)
    }
}

impl PartialEq for Integer {
    fn eq(&self, other: &Self) -> bool {
        self.as_i128() == other.as_i128()
    }
}

impl Eq for Integer {}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integer::Unsigned(u) => write!(f, "{u}"),
            Integer::Signed(i) => write!(f, "{i}"),
        }
    }
}

impl From<u64> for Integer {
    fn from(v: u64) -> Self {
        Integer::Unsigned(v)
    }
}

impl From<i64> for Integer {
    fn from(v: i64) -> Self {
        Integer::Signed(v)
    }
}

/// A float with its wire width preserved.
///
/// Equality compares bit patterns, so NaN payloads and signed zeros survive a
/// round trip and compare equal to themselves.
#[derive(Debug, Clone, Copy)]
pub enum Float {
    F32(f32),
    F64(f64),
}

impl Float {
    pub fn as_f64(self) -> f64 {
        match self {
            Float::F32(f) => f as f64,
            Float::F64(f) => f,
        }
    }
}

impl PartialEq for Float {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Float::F32(a), Float::F32(b)) => a.to_bits() == b.to_bits(),
            (Float::F64(a), Float::F64(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

/// One decoded MessagePack token.
///
/// Array and map headers are structural markers: they carry the declared
/// count, and the contained values come from later reads (or are skipped).
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Nil,
    Bool(bool),
    Integer(Integer),
    Float(Float),
    /// Payload of any `str*` or `bin*` tag.
    Raw(Vec<u8>),
    ArrayHeader(u32),
    /// Header of a map with this many key/value pairs.
    MapHeader(u32),
    Extension {
        type_tag: i8,
        payload: Vec<u8>,
    },
}

impl DecodedValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, DecodedValue::Nil)
    }

    pub fn is_array_header(&self) -> bool {
        matches!(self, DecodedValue::ArrayHeader(_))
    }

    pub fn is_map_header(&self) -> bool {
        matches!(self, DecodedValue::MapHeader(_))
    }

    pub fn is_header(&self) -> bool {
        self.is_array_header() || self.is_map_header()
    }

    /// Declared element count (arrays) or pair count (maps).
    pub fn header_len(&self) -> Option<u32> {
        match self {
            DecodedValue::ArrayHeader(n) | DecodedValue::MapHeader(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<Integer> {
        match self {
            DecodedValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(Integer::as_i64)
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_integer().and_then(Integer::as_u64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::Float(f) => Some(f.as_f64()),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            DecodedValue::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The raw payload as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_raw().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Short name of the variant, used in type mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DecodedValue::Nil => "nil",
            DecodedValue::Bool(_) => "bool",
            DecodedValue::Integer(_) => "integer",
            DecodedValue::Float(_) => "float",
            DecodedValue::Raw(_) => "raw",
            DecodedValue::ArrayHeader(_) => "array header",
            DecodedValue::MapHeader(_) => "map header",
            DecodedValue::Extension { .. } => "extension",
        }
    }
}

impl From<bool> for DecodedValue {
    fn from(v: bool) -> Self {
        DecodedValue::Bool(v)
    }
}

impl From<i64> for DecodedValue {
    fn from(v: i64) -> Self {
        DecodedValue::Integer(Integer::Signed(v))
    }
}

impl From<i32> for DecodedValue {
    fn from(v: i32) -> Self {
        DecodedValue::Integer(Integer::Signed(v as i64))
    }
}

impl From<u64> for DecodedValue {
    fn from(v: u64) -> Self {
        DecodedValue::Integer(Integer::Unsigned(v))
    }
}

impl From<u32> for DecodedValue {
    fn from(v: u32) -> Self {
        DecodedValue::Integer(Integer::Unsigned(v as u64))
    }
}

impl From<f64> for DecodedValue {
    fn from(v: f64) -> Self {
        DecodedValue::Float(Float::F64(v))
    }
}

impl From<f32> for DecodedValue {
    fn from(v: f32) -> Self {
        DecodedValue::Float(Float::F32(v))
    }
}

impl From<&str> for DecodedValue {
    fn from(v: &str) -> Self {
        DecodedValue::Raw(v.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for DecodedValue {
    fn from(v: Vec<u8>) -> Self {
        DecodedValue::Raw(v)
    }
}

/// A fully materialised MessagePack value.
///
/// Maps keep their pairs in wire order and may use any value as a key.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(Integer),
    Float(Float),
    Raw(Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Extension { type_tag: i8, payload: Vec<u8> },
}

impl Value {
    /// Decodes the first value in `bytes`.
    ///
    /// A truncated encoding is [`Error::InsufficientData`]; empty input is
    /// [`Error::UnexpectedEndOfStream`].
    ///
    /// [`Error::InsufficientData`]: crate::Error::InsufficientData
    /// [`Error::UnexpectedEndOfStream`]: crate::Error::UnexpectedEndOfStream
    pub fn decode(bytes: &[u8]) -> crate::Result<Value> {
        let mut unpacker = crate::Unpacker::from_slice(bytes);
        crate::serialization::unpack_next(&mut unpacker)
    }

    /// Encodes the value with the default packer settings.
    pub fn encode(&self) -> crate::Result<Vec<u8>> {
        let mut packer = crate::Packer::new();
        packer.pack_tree(self)?;
        Ok(packer.into_bytes())
    }

    /// The scalar token this value starts with, or the header for
    /// collections.
    pub fn head(&self) -> DecodedValue {
        match self {
            Value::Nil => DecodedValue::Nil,
            Value::Bool(b) => DecodedValue::Bool(*b),
            Value::Integer(i) => DecodedValue::Integer(*i),
            Value::Float(f) => DecodedValue::Float(*f),
            Value::Raw(bytes) => DecodedValue::Raw(bytes.clone()),
            Value::Array(items) => DecodedValue::ArrayHeader(items.len() as u32),
            Value::Map(pairs) => DecodedValue::MapHeader(pairs.len() as u32),
            Value::Extension { type_tag, payload } => DecodedValue::Extension {
                type_tag: *type_tag,
                payload: payload.clone(),
            },
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Raw(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Raw(v.as_bytes().to_vec())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(Integer::Signed(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Integer(Integer::Unsigned(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
