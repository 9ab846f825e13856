//! LEB128-like VarInt (i32) and VarLong (i64), 7 data bits per byte.

use crate::error::{Result, ServerError};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

pub fn varint_len(value: i32) -> usize {
    let value = value as u32;
    for i in 1..5 {
        if (value & (0xffff_ffff_u32 << (7 * i))) == 0 {
            return i;
        }
    }
    5
}

pub fn write_varint(value: i32, dst: &mut impl Write) -> Result<()> {
    let mut temp = value as u32;
    loop {
        if (temp & !0x7f_u32) == 0 {
            dst.write_u8(temp as u8)?;
            return Ok(());
        }
        dst.write_u8(((temp & 0x7F) | 0x80) as u8)?;
        temp >>= 7;
    }
}

pub fn read_varint(src: &mut impl Read) -> Result<i32> {
    let mut x: i32 = 0;
    for shift in [0_u32, 7, 14, 21, 28] {
        let b = i32::from(src.read_u8()?);
        x |= (b & 0x7F) << shift;
        if (b & 0x80) == 0 {
            return Ok(x);
        }
    }
    Err(ServerError::Malformed("VarInt spans more than 5 bytes".into()))
}

pub fn varlong_len(value: i64) -> usize {
    let value = value as u64;
    for i in 1..10 {
        if (value & (0xffff_ffff_ffff_ffff_u64 << (7 * i))) == 0 {
            return i;
        }
    }
    10
}

pub fn write_varlong(value: i64, dst: &mut impl Write) -> Result<()> {
    let mut temp = value as u64;
    loop {
        if (temp & !0x7f_u64) == 0 {
            dst.write_u8(temp as u8)?;
            return Ok(());
        }
        dst.write_u8(((temp & 0x7F) | 0x80) as u8)?;
        temp >>= 7;
    }
}

pub fn read_varlong(src: &mut impl Read) -> Result<i64> {
    let mut x: i64 = 0;
    for shift in [0_u32, 7, 14, 21, 28, 35, 42, 49, 56, 63] {
        let b = i64::from(src.read_u8()?);
        x |= (b & 0x7F) << shift;
        if (b & 0x80) == 0 {
            return Ok(x);
        }
    }
    Err(ServerError::Malformed("VarLong spans more than 10 bytes".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Case<T> {
        value: T,
        bytes: Vec<u8>,
    }

    fn varint_cases() -> Vec<Case<i32>> {
        vec![
            Case { value: -1, bytes: vec![0xff, 0xff, 0xff, 0xff, 0xf] },
            Case { value: 0, bytes: vec![0x00] },
            Case { value: 1, bytes: vec![0x01] },
            Case { value: 127, bytes: vec![0x7f] },
            Case { value: 300, bytes: vec![0xac, 0x02] },
            Case { value: 2147483647, bytes: vec![0xff, 0xff, 0xff, 0xff, 0x07] },
        ]
    }

    #[test]
    fn varint_round_trips_and_sizes_match() {
        for case in varint_cases() {
            let mut w = Vec::new();
            write_varint(case.value, &mut w).unwrap();
            assert_eq!(w, case.bytes);
            assert_eq!(varint_len(case.value), case.bytes.len());
            let mut r = Cursor::new(case.bytes);
            assert_eq!(read_varint(&mut r).unwrap(), case.value);
        }
    }

    #[test]
    fn varint_rejects_runaway_continuation() {
        let bytes = vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        let mut r = Cursor::new(bytes);
        assert!(read_varint(&mut r).is_err());
    }

    #[test]
    fn varlong_round_trips() {
        let cases: Vec<Case<i64>> = vec![
            Case { value: -1, bytes: vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01] },
            Case { value: 0, bytes: vec![0x00] },
            Case { value: 2_961_488_830_i64, bytes: vec![0xbe, 0xf7, 0x92, 0x84, 0x0b] },
        ];
        for case in cases {
            let mut w = Vec::new();
            write_varlong(case.value, &mut w).unwrap();
            assert_eq!(w, case.bytes);
            assert_eq!(varlong_len(case.value), case.bytes.len());
            let mut r = Cursor::new(case.bytes);
            assert_eq!(read_varlong(&mut r).unwrap(), case.value);
        }
    }
}
