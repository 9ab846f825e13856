//! Byte-level encoding for every value that appears in a packet field.
//!
//! Each submodule implements one primitive from the wire format: VarInt and
//! VarLong, length-prefixed strings and byte arrays, big-endian fixed-width
//! numerics, UUIDs, and the packed block-position codec. The tag-driven
//! packet codec (`crate::codec`) dispatches to these functions by tag name.

mod bytearray;
mod position;
mod primitive;
mod string;
mod varint;

pub use bytearray::{read_bytearray, write_bytearray};
pub use position::{read_position, write_position};
pub use primitive::*;
pub use string::{read_string, write_string};
pub use varint::{
    read_varint, read_varlong, varint_len, varlong_len, write_varint, write_varlong,
};

use crate::error::{Result, ServerError};
use std::io::Read;

/// Reads every remaining byte of `src`. Only legal as the last field of a
/// schema (spec.md §4.1, `Rest`).
pub fn read_rest(src: &mut impl Read) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    src.read_to_end(&mut buf)
        .map_err(|e| ServerError::Malformed(format!("reading rest: {e}")))?;
    Ok(buf)
}
