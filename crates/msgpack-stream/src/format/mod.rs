//! The MessagePack wire format: tag table and the pure value decoder.

pub mod constants;
pub mod decoder;

pub use decoder::{classify, decode_value, Body, DecodeError, Marker};
