//! VarInt-length-prefixed UTF-8 strings.

use super::varint::{read_varint, varint_len, write_varint};
use crate::error::{Result, ServerError};
use std::io::{Read, Write};

const MAX_STRING_LEN: i32 = 32767 * 4;

pub fn write_string(value: &str, dst: &mut impl Write) -> Result<()> {
    write_varint(value.len() as i32, dst)?;
    dst.write_all(value.as_bytes())?;
    Ok(())
}

pub fn string_len(value: &str) -> usize {
    varint_len(value.len() as i32) + value.len()
}

pub fn read_string(src: &mut impl Read) -> Result<String> {
    let len = read_varint(src)?;
    if len < 0 || len > MAX_STRING_LEN {
        return Err(ServerError::Malformed(format!(
            "string length {len} out of range"
        )));
    }
    let mut buf = vec![0u8; len as usize];
    src.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| ServerError::Malformed(format!("invalid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips() {
        let mut w = Vec::new();
        write_string("hello, world!", &mut w).unwrap();
        let mut r = Cursor::new(w);
        assert_eq!(read_string(&mut r).unwrap(), "hello, world!");
    }

    #[test]
    fn rejects_oversized_length() {
        let mut w = Vec::new();
        write_varint(MAX_STRING_LEN + 1, &mut w).unwrap();
        let mut r = Cursor::new(w);
        assert!(read_string(&mut r).is_err());
    }
}
