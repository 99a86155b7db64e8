//! Logic behind the `msgpack-dump` binary.
//!
//! Reads a stream of MessagePack values and prints it either as one JSON
//! document per top-level value or as the raw token stream, indented by
//! nesting depth.

use std::io::{self, Read, Write};

use log::info;
use thiserror::Error;

use crate::json::{to_json, token_to_json};
use crate::serialization::{ScopedCursor, Unpack};
use crate::unpacker::{Cursor, Mode, Unpacker};
use crate::value::Value;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Decode(#[from] crate::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DumpOptions {
    /// Print tokens instead of whole values.
    pub events: bool,
    /// Top-level values to skip before printing.
    pub skip: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpStats {
    pub skipped: u64,
    /// Values printed, or tokens in event mode.
    pub printed: u64,
    pub bytes: u64,
}

/// A `false` read is the end of input only if the cursor did not suspend.
fn ensure_complete<C: Cursor>(cursor: &C) -> crate::Result<()> {
    match cursor.mode() {
        Mode::Suspended(_) => Err(crate::Error::InsufficientData {
            offset: cursor.position(),
        }),
        _ => Ok(()),
    }
}

pub fn dump<R: Read, W: Write>(
    input: R,
    mut out: W,
    options: &DumpOptions,
) -> Result<DumpStats, CliError> {
    let mut unpacker = Unpacker::new(input);
    let mut stats = DumpStats::default();
    while stats.skipped < options.skip {
        if unpacker.skip()?.is_none() {
            ensure_complete(&unpacker)?;
            break;
        }
        stats.skipped += 1;
    }
    stats.printed = if options.events {
        write_events(&mut unpacker, &mut out, 0)?
    } else {
        write_values(&mut unpacker, &mut out)?
    };
    stats.bytes = unpacker.position();
    out.flush()?;
    info!(
        "skipped {} and printed {} in {} bytes",
        stats.skipped, stats.printed, stats.bytes
    );
    Ok(stats)
}

fn write_values<R: Read, W: Write>(
    unpacker: &mut Unpacker<R>,
    out: &mut W,
) -> Result<u64, CliError> {
    let mut count = 0;
    while unpacker.read()? {
        let value = Value::unpack_from(unpacker)?;
        serde_json::to_writer(&mut *out, &to_json(&value))?;
        writeln!(out)?;
        count += 1;
    }
    ensure_complete(&*unpacker)?;
    Ok(count)
}

fn write_events<C: Cursor, W: Write>(
    cursor: &mut C,
    out: &mut W,
    depth: usize,
) -> Result<u64, CliError> {
    let mut count = 0;
    while cursor.read()? {
        count += 1;
        let Some(token) = cursor.data() else {
            continue;
        };
        writeln!(out, "{:indent$}{}", "", token_to_json(token), indent = depth * 2)?;
        if token.is_header() {
            let mut inner = cursor.read_subtree()?;
            count += write_events(&mut inner, out, depth + 1)?;
            inner.close()?;
        }
    }
    ensure_complete(&*cursor)?;
    Ok(count)
}

/// Convenience for tests and callers holding the whole input.
pub fn dump_to_string(input: &[u8], options: &DumpOptions) -> Result<String, CliError> {
    let mut out = Vec::new();
    dump(input, &mut out, options)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_print_as_json_lines() {
        let bytes = [0x92, 0x01, 0xa1, b'x', 0xc3];
        let text = dump_to_string(&bytes, &DumpOptions::default()).unwrap();
        assert_eq!(text, "[1,\"x\"]\ntrue\n");
    }

    #[test]
    fn events_indent_by_depth() {
        let bytes = [0x91, 0x81, 0x01, 0x02];
        let options = DumpOptions {
            events: true,
            skip: 0,
        };
        let text = dump_to_string(&bytes, &options).unwrap();
        assert_eq!(text, "{\"array\":1}\n  {\"map\":1}\n    1\n    2\n");
    }

    #[test]
    fn skip_drops_leading_values() {
        let bytes = [0x92, 0x01, 0x02, 0x03, 0x04];
        let options = DumpOptions {
            events: false,
            skip: 2,
        };
        let mut out = Vec::new();
        let stats = dump(&bytes[..], &mut out, &options).unwrap();
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.printed, 1);
        assert_eq!(out, b"4\n");
    }

    #[test]
    fn truncated_input_is_reported() {
        let err = dump_to_string(&[0x92, 0x01], &DumpOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            CliError::Decode(crate::Error::InsufficientData { .. })
        ));
    }
}
