//! Packed block position (spec.md §4.1):
//!
//! `((x & 0x3FFFFFF) << 38) | ((y & 0xFFF) << 26) | (z & 0x3FFFFFF)`
//!
//! Values outside the documented ranges silently wrap on encode; decode
//! sign-extends x and z at bit 26 and y at bit 12.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use crate::error::Result;
use std::io::{Read, Write};

pub fn write_position(x: i32, y: i32, z: i32, dst: &mut impl Write) -> Result<()> {
    let packed = ((x as i64 & 0x3FF_FFFF) << 38)
        | ((y as i64 & 0xFFF) << 26)
        | (z as i64 & 0x3FF_FFFF);
    dst.write_i64::<BigEndian>(packed)?;
    Ok(())
}

pub fn read_position(src: &mut impl Read) -> Result<(i32, i32, i32)> {
    let packed = src.read_i64::<BigEndian>()?;
    let mut x = (packed >> 38) as i32;
    let mut y = ((packed >> 26) & 0xFFF) as i32;
    let mut z = (packed & 0x3FF_FFFF) as i32;
    if x >= 1 << 25 {
        x -= 1 << 26;
    }
    if y >= 1 << 11 {
        y -= 1 << 12;
    }
    if z >= 1 << 25 {
        z -= 1 << 26;
    }
    Ok((x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn round_trip(x: i32, y: i32, z: i32) {
        let mut w = Vec::new();
        write_position(x, y, z, &mut w).unwrap();
        let mut r = Cursor::new(w);
        assert_eq!(read_position(&mut r).unwrap(), (x, y, z));
    }

    #[test]
    fn round_trips_corners_and_origin() {
        round_trip(0, 0, 0);
        round_trip(-1, -1, -1);
        round_trip((1 << 25) - 1, (1 << 11) - 1, (1 << 25) - 1);
        round_trip(-(1 << 25), -(1 << 11), -(1 << 25));
        round_trip(10, 64, 10);
    }
}
