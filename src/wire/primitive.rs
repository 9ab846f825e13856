//! Fixed-width numerics, bool, and UUID — all big-endian.

use crate::error::{Result, ServerError};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use uuid::Uuid;

macro_rules! fixed_width {
    ($read:ident, $write:ident, $ty:ty, $read_m:ident, $write_m:ident) => {
        pub fn $read(src: &mut impl Read) -> Result<$ty> {
            Ok(src.$read_m::<BigEndian>()?)
        }
        pub fn $write(value: $ty, dst: &mut impl Write) -> Result<()> {
            dst.$write_m::<BigEndian>(value)?;
            Ok(())
        }
    };
}

fixed_width!(read_i16, write_i16, i16, read_i16, write_i16);
fixed_width!(read_u16, write_u16, u16, read_u16, write_u16);
fixed_width!(read_i32, write_i32, i32, read_i32, write_i32);
fixed_width!(read_i64, write_i64, i64, read_i64, write_i64);
fixed_width!(read_f32, write_f32, f32, read_f32, write_f32);
fixed_width!(read_f64, write_f64, f64, read_f64, write_f64);

pub fn read_i8(src: &mut impl Read) -> Result<i8> {
    Ok(src.read_i8()?)
}
pub fn write_i8(value: i8, dst: &mut impl Write) -> Result<()> {
    dst.write_i8(value)?;
    Ok(())
}

pub fn read_u8(src: &mut impl Read) -> Result<u8> {
    Ok(src.read_u8()?)
}
pub fn write_u8(value: u8, dst: &mut impl Write) -> Result<()> {
    dst.write_u8(value)?;
    Ok(())
}

pub fn read_bool(src: &mut impl Read) -> Result<bool> {
    match src.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ServerError::Malformed(format!(
            "invalid bool value {other}, expected 0 or 1"
        ))),
    }
}
pub fn write_bool(value: bool, dst: &mut impl Write) -> Result<()> {
    dst.write_u8(if value { 1 } else { 0 })?;
    Ok(())
}

pub fn read_uuid(src: &mut impl Read) -> Result<Uuid> {
    let mut bytes = [0u8; 16];
    src.read_exact(&mut bytes)?;
    Ok(Uuid::from_bytes(bytes))
}
pub fn write_uuid(value: Uuid, dst: &mut impl Write) -> Result<()> {
    dst.write_all(value.as_bytes())?;
    Ok(())
}
