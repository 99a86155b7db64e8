//! Per-type serializers, looked up by type identity.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;

use log::debug;

use super::{unpack_next, Pack, Unpack};
use crate::error::Result;
use crate::packer::Packer;
use crate::unpacker::Unpacker;

pub type PackFn<T> = fn(&T, &mut Packer) -> Result<()>;
pub type UnpackFn<T> = fn(&mut Unpacker<&mut dyn Read>) -> Result<T>;

/// A pair of functions that write and read one `T`.
///
/// The unpack function is called on a fresh cursor and must consume
/// exactly one top-level value.
pub struct Serializer<T> {
    pack: PackFn<T>,
    unpack: UnpackFn<T>,
}

impl<T> Clone for Serializer<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Serializer<T> {}

impl<T> fmt::Debug for Serializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Serializer<{}>", type_name::<T>())
    }
}

fn pack_with_trait<T: Pack>(value: &T, packer: &mut Packer) -> Result<()> {
    value.pack_to(packer)
}

fn unpack_with_trait<T: Unpack>(unpacker: &mut Unpacker<&mut dyn Read>) -> Result<T> {
    unpack_next(unpacker)
}

impl<T: Pack + Unpack> Default for Serializer<T> {
    fn default() -> Self {
        Self::new(pack_with_trait::<T>, unpack_with_trait::<T>)
    }
}

impl<T> Serializer<T> {
    pub fn new(pack: PackFn<T>, unpack: UnpackFn<T>) -> Self {
        Self { pack, unpack }
    }

    pub fn pack(&self, value: &T, packer: &mut Packer) -> Result<()> {
        (self.pack)(value, packer)
    }

    pub fn pack_to_vec(&self, value: &T) -> Result<Vec<u8>> {
        let mut packer = Packer::new();
        self.pack(value, &mut packer)?;
        Ok(packer.into_bytes())
    }

    pub fn unpack(&self, unpacker: &mut Unpacker<&mut dyn Read>) -> Result<T> {
        (self.unpack)(unpacker)
    }

    /// Reads one value from `reader`.
    ///
    /// The unpacker reads ahead, so bytes after the value may be consumed
    /// from `reader` as well.
    pub fn unpack_from_reader<R: Read>(&self, mut reader: R) -> Result<T> {
        let source: &mut dyn Read = &mut reader;
        let mut unpacker = Unpacker::create(source, false);
        self.unpack(&mut unpacker)
    }

    pub fn unpack_from_slice(&self, bytes: &[u8]) -> Result<T> {
        self.unpack_from_reader(bytes)
    }
}

/// Serializers keyed by type, filled on first use.
///
/// The registry is an ordinary value: create one where it is needed and
/// pass it along. Nothing is shared between registries.
#[derive(Default)]
pub struct SerializerRegistry {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The serializer for `T`, creating the trait-based one if none is
    /// registered yet.
    pub fn get<T: Pack + Unpack + 'static>(&mut self) -> Serializer<T> {
        let entry = self.entries.entry(TypeId::of::<T>()).or_insert_with(|| {
            debug!("creating serializer for {}", type_name::<T>());
            Box::new(Serializer::<T>::default())
        });
        entry
            .downcast_ref::<Serializer<T>>()
            .copied()
            .unwrap_or_default()
    }

    /// The registered serializer for `T`, without creating one.
    pub fn lookup<T: 'static>(&self) -> Option<Serializer<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<Serializer<T>>())
            .copied()
    }

    /// Installs `serializer` for `T`, returning the one it replaces.
    pub fn register<T: 'static>(&mut self, serializer: Serializer<T>) -> Option<Serializer<T>> {
        let previous = self.lookup::<T>();
        self.entries.insert(TypeId::of::<T>(), Box::new(serializer));
        previous
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::read_item;

    #[test]
    fn get_populates_lazily() {
        let mut registry = SerializerRegistry::new();
        assert!(registry.is_empty());
        let serializer = registry.get::<Vec<u32>>();
        assert!(registry.contains::<Vec<u32>>());
        assert_eq!(registry.len(), 1);
        let bytes = serializer.pack_to_vec(&vec![1, 2]).unwrap();
        assert_eq!(serializer.unpack_from_slice(&bytes).unwrap(), vec![1, 2]);
        registry.get::<Vec<u32>>();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registered_serializer_wins() {
        fn pack_as_string(value: &u32, packer: &mut Packer) -> Result<()> {
            packer.pack_str(&value.to_string())
        }
        fn unpack_from_string(unpacker: &mut Unpacker<&mut dyn Read>) -> Result<u32> {
            read_item(unpacker)?;
            let text: String = Unpack::unpack_from(unpacker)?;
            text.parse()
                .map_err(|_| crate::Error::mismatch("decimal string", text))
        }

        let mut registry = SerializerRegistry::new();
        assert!(registry
            .register(Serializer::new(pack_as_string, unpack_from_string))
            .is_none());
        let serializer = registry.get::<u32>();
        let bytes = serializer.pack_to_vec(&42).unwrap();
        assert_eq!(bytes, [0xa2, b'4', b'2']);
        assert_eq!(serializer.unpack_from_slice(&bytes).unwrap(), 42);
    }
}
