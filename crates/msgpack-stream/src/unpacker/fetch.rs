//! Pulling complete values out of a [`ByteSource`].

use std::io::Read;

use msgpack_stream_buffers::ByteSource;

use crate::error::{Error, Malformed, Result};
use crate::format::{classify, decode_value, DecodeError, Marker};
use crate::options::UnpackerOptions;
use crate::value::DecodedValue;

pub(crate) enum Fetch {
    Value(DecodedValue),
    /// End of input exactly at a value boundary.
    End,
    /// End of input inside a value. Nothing was consumed.
    Starved,
}

/// Classifies the next value without consuming anything. `None` means the
/// head could not be buffered.
pub(crate) fn peek_marker<R: Read>(source: &mut ByteSource<R>) -> Result<Option<Marker>> {
    let mut want = 1;
    loop {
        if !source.fill(want)? {
            return Ok(None);
        }
        match classify(source.window()) {
            Ok(marker) => return Ok(Some(marker)),
            Err(DecodeError::Insufficient { needed }) => want = needed,
            Err(err) => return Err(Error::from_decode(err, source.position())),
        }
    }
}

/// Decodes the next value once it is fully buffered.
pub(crate) fn fetch_value<R: Read>(
    source: &mut ByteSource<R>,
    options: &UnpackerOptions,
) -> Result<Fetch> {
    let Some(marker) = peek_marker(source)? else {
        return Ok(if source.available() == 0 {
            Fetch::End
        } else {
            Fetch::Starved
        });
    };
    let len = marker.payload_len();
    let offset = source.position();
    let too_long = || Error::MalformedFormat {
        offset,
        reason: Malformed::PayloadTooLong {
            len,
            limit: options.max_payload_len,
        },
    };
    if marker.carries_bytes() && len > options.max_payload_len {
        return Err(too_long());
    }
    let total = usize::try_from(len)
        .ok()
        .and_then(|len| len.checked_add(marker.head_len))
        .ok_or_else(too_long)?;
    if !source.fill(total)? {
        return Ok(Fetch::Starved);
    }
    let (value, used) =
        decode_value(source.window()).map_err(|err| Error::from_decode(err, source.position()))?;
    source.consume(used);
    Ok(Fetch::Value(value))
}
