//! VarInt-length-prefixed raw byte arrays.

use super::varint::{read_varint, write_varint};
use crate::error::Result;
use std::io::{Read, Write};

pub fn write_bytearray(value: &[u8], dst: &mut impl Write) -> Result<()> {
    write_varint(value.len() as i32, dst)?;
    dst.write_all(value)?;
    Ok(())
}

pub fn read_bytearray(src: &mut impl Read) -> Result<Vec<u8>> {
    let len = read_varint(src)?;
    let mut buf = vec![0u8; len.max(0) as usize];
    src.read_exact(&mut buf)?;
    Ok(buf)
}
