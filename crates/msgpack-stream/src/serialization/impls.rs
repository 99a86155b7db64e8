use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use super::{current, expect_array, expect_map, unpack_next, Pack, ScopedCursor, Unpack};
use crate::error::{Error, Result};
use crate::packer::Packer;
use crate::unpacker::Cursor;
use crate::value::{DecodedValue, Float, Value};

/// Upper bound on up-front allocation for a declared collection length.
fn prealloc(declared: u32) -> usize {
    declared.min(1024) as usize
}

impl<T: Pack + ?Sized> Pack for &T {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        (**self).pack_to(packer)
    }
}

impl Pack for bool {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        packer.pack_bool(*self);
        Ok(())
    }
}

impl Unpack for bool {
    fn unpack_from<C: Cursor>(cursor: &mut C) -> Result<Self> {
        let data = current(cursor)?;
        data.as_bool()
            .ok_or_else(|| Error::mismatch("bool", data.kind_name()))
    }
}

macro_rules! impl_integer {
    ($pack:ident as $wide:ty => $($t:ty),+) => {
        $(
            impl Pack for $t {
                fn pack_to(&self, packer: &mut Packer) -> Result<()> {
                    packer.$pack(*self as $wide);
                    Ok(())
                }
            }

            impl Unpack for $t {
                fn unpack_from<C: Cursor>(cursor: &mut C) -> Result<Self> {
                    let data = current(cursor)?;
                    let int = data
                        .as_integer()
                        .ok_or_else(|| Error::mismatch(stringify!($t), data.kind_name()))?;
                    <$t>::try_from(int.as_i128())
                        .map_err(|_| Error::mismatch(stringify!($t), int))
                }
            }
        )+
    };
}

impl_integer!(pack_u64 as u64 => u8, u16, u32, u64, usize);
impl_integer!(pack_i64 as i64 => i8, i16, i32, i64, isize);

impl Pack for f32 {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        packer.pack_f32(*self);
        Ok(())
    }
}

impl Unpack for f32 {
    fn unpack_from<C: Cursor>(cursor: &mut C) -> Result<Self> {
        match current(cursor)? {
            DecodedValue::Float(Float::F32(f)) => Ok(*f),
            DecodedValue::Float(Float::F64(f)) => Ok(*f as f32),
            other => Err(Error::mismatch("f32", other.kind_name())),
        }
    }
}

impl Pack for f64 {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        packer.pack_f64(*self);
        Ok(())
    }
}

impl Unpack for f64 {
    fn unpack_from<C: Cursor>(cursor: &mut C) -> Result<Self> {
        let data = current(cursor)?;
        data.as_f64()
            .ok_or_else(|| Error::mismatch("f64", data.kind_name()))
    }
}

impl Pack for str {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        packer.pack_str(self)
    }
}

impl Pack for String {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        packer.pack_str(self)
    }
}

impl Unpack for String {
    fn unpack_from<C: Cursor>(cursor: &mut C) -> Result<Self> {
        match current(cursor)? {
            DecodedValue::Raw(bytes) => String::from_utf8(bytes.clone())
                .map_err(|_| Error::mismatch("string", "raw bytes that are not UTF-8")),
            other => Err(Error::mismatch("string", other.kind_name())),
        }
    }
}

impl<T: Pack> Pack for [T] {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        packer.pack_array_header(self.len())?;
        for item in self {
            item.pack_to(packer)?;
        }
        Ok(())
    }
}

impl<T: Pack> Pack for Vec<T> {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        self.as_slice().pack_to(packer)
    }
}

impl<T: Unpack> Unpack for Vec<T> {
    fn unpack_from<C: Cursor>(cursor: &mut C) -> Result<Self> {
        let len = expect_array(cursor)?;
        let mut items = cursor.read_subtree()?;
        let mut out = Vec::with_capacity(prealloc(len));
        for _ in 0..len {
            out.push(unpack_next(&mut items)?);
        }
        items.close()?;
        Ok(out)
    }
}

impl<T: Pack> Pack for Option<T> {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        match self {
            Some(value) => value.pack_to(packer),
            None => {
                packer.pack_nil();
                Ok(())
            }
        }
    }
}

impl<T: Unpack> Unpack for Option<T> {
    fn unpack_from<C: Cursor>(cursor: &mut C) -> Result<Self> {
        if current(cursor)?.is_nil() {
            return Ok(None);
        }
        T::unpack_from(cursor).map(Some)
    }
}

/// A key/value pair travels as a two-element array.
impl<K: Pack, V: Pack> Pack for (K, V) {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        packer.pack_array_header(2)?;
        self.0.pack_to(packer)?;
        self.1.pack_to(packer)
    }
}

impl<K: Unpack, V: Unpack> Unpack for (K, V) {
    fn unpack_from<C: Cursor>(cursor: &mut C) -> Result<Self> {
        expect_array(cursor)?;
        let mut pair = cursor.read_subtree()?;
        let key = unpack_next(&mut pair)?;
        let value = unpack_next(&mut pair)?;
        pair.close()?;
        Ok((key, value))
    }
}

fn pack_pairs<'a, K, V, I>(packer: &mut Packer, len: usize, pairs: I) -> Result<()>
where
    K: Pack + 'a,
    V: Pack + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    packer.pack_map_header(len)?;
    for (key, value) in pairs {
        key.pack_to(packer)?;
        value.pack_to(packer)?;
    }
    Ok(())
}

fn unpack_pairs<K, V, C, F>(cursor: &mut C, mut insert: F) -> Result<()>
where
    K: Unpack,
    V: Unpack,
    C: Cursor,
    F: FnMut(K, V),
{
    let len = expect_map(cursor)?;
    let mut entries = cursor.read_subtree()?;
    for _ in 0..len {
        let key = unpack_next(&mut entries)?;
        let value = unpack_next(&mut entries)?;
        insert(key, value);
    }
    entries.close()
}

impl<K: Pack, V: Pack> Pack for BTreeMap<K, V> {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        pack_pairs(packer, self.len(), self)
    }
}

impl<K: Unpack + Ord, V: Unpack> Unpack for BTreeMap<K, V> {
    fn unpack_from<C: Cursor>(cursor: &mut C) -> Result<Self> {
        let mut map = BTreeMap::new();
        unpack_pairs(cursor, |k, v| {
            map.insert(k, v);
        })?;
        Ok(map)
    }
}

impl<K: Pack, V: Pack, S> Pack for HashMap<K, V, S> {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        pack_pairs(packer, self.len(), self)
    }
}

impl<K, V, S> Unpack for HashMap<K, V, S>
where
    K: Unpack + Eq + Hash,
    V: Unpack,
    S: BuildHasher + Default,
{
    fn unpack_from<C: Cursor>(cursor: &mut C) -> Result<Self> {
        let mut map = HashMap::with_hasher(S::default());
        unpack_pairs(cursor, |k, v| {
            map.insert(k, v);
        })?;
        Ok(map)
    }
}

impl Pack for DecodedValue {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        packer.pack_value(self)
    }
}

impl Pack for Value {
    fn pack_to(&self, packer: &mut Packer) -> Result<()> {
        packer.pack_tree(self)
    }
}

impl Unpack for Value {
    fn unpack_from<C: Cursor>(cursor: &mut C) -> Result<Self> {
        Ok(match current(cursor)?.clone() {
            DecodedValue::Nil => Value::Nil,
            DecodedValue::Bool(b) => Value::Bool(b),
            DecodedValue::Integer(i) => Value::Integer(i),
            DecodedValue::Float(f) => Value::Float(f),
            DecodedValue::Raw(bytes) => Value::Raw(bytes),
            DecodedValue::Extension { type_tag, payload } => Value::Extension { type_tag, payload },
            DecodedValue::ArrayHeader(len) => {
                let mut items = cursor.read_subtree()?;
                let mut out = Vec::with_capacity(prealloc(len));
                for _ in 0..len {
                    out.push(unpack_next(&mut items)?);
                }
                items.close()?;
                Value::Array(out)
            }
            DecodedValue::MapHeader(len) => {
                let mut out: Vec<(Value, Value)> = Vec::with_capacity(prealloc(len));
                unpack_pairs(cursor, |k, v| out.push((k, v)))?;
                Value::Map(out)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{pack_to_vec, unpack_from_slice};

    #[test]
    fn integers_are_range_checked() {
        assert_eq!(unpack_from_slice::<u8>(&[0xcc, 0xff]).unwrap(), 255);
        assert!(matches!(
            unpack_from_slice::<u8>(&[0xcd, 0x01, 0x00]),
            Err(Error::TypeMismatch { expected: "u8", .. })
        ));
        assert!(matches!(
            unpack_from_slice::<u32>(&[0xff]),
            Err(Error::TypeMismatch { .. })
        ));
        assert_eq!(unpack_from_slice::<i64>(&[0xcc, 0x80]).unwrap(), 128);
    }

    #[test]
    fn strings_require_utf8() {
        assert_eq!(unpack_from_slice::<String>(&[0xa2, b'h', b'i']).unwrap(), "hi");
        assert!(unpack_from_slice::<String>(&[0xa1, 0xff]).is_err());
        assert!(unpack_from_slice::<String>(&[0x01]).is_err());
    }

    #[test]
    fn option_maps_nil() {
        assert_eq!(unpack_from_slice::<Option<u8>>(&[0xc0]).unwrap(), None);
        assert_eq!(unpack_from_slice::<Option<u8>>(&[0x07]).unwrap(), Some(7));
        assert_eq!(pack_to_vec(&None::<u8>).unwrap(), [0xc0]);
    }

    #[test]
    fn pair_is_a_two_element_array() {
        let bytes = pack_to_vec(&(1u8, "one")).unwrap();
        assert_eq!(bytes, [0x92, 0x01, 0xa3, b'o', b'n', b'e']);
        let (k, v): (u8, String) = unpack_from_slice(&bytes).unwrap();
        assert_eq!((k, v.as_str()), (1, "one"));
    }

    #[test]
    fn short_collection_is_end_of_stream() {
        // A one-element array cannot hold a pair.
        assert!(matches!(
            unpack_from_slice::<(u8, u8)>(&[0x91, 0x01]),
            Err(Error::UnexpectedEndOfStream)
        ));
    }

    #[test]
    fn value_tree_materialises_maps_in_order() {
        let bytes = [0x82, 0xa1, b'b', 0x01, 0xa1, b'a', 0x92, 0xc3, 0xc0];
        let value: Value = unpack_from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            Value::Map(vec![
                (Value::from("b"), Value::from(1u64)),
                (
                    Value::from("a"),
                    Value::Array(vec![Value::Bool(true), Value::Nil])
                ),
            ])
        );
    }
}
