//! Entity metadata trailer encoding (spec.md §6.2).
//!
//! A sequence of `(header_byte, value)` entries terminated by `0x7F`
//! (pre-1.9). The header byte packs the metadata index into the low 5 bits
//! and the value's type into the high 3: `(index & 0x1F) | (type << 5)`.

use crate::error::Result;
use crate::player::{EntityFlags, SkinParts};
use crate::wire;

const TERMINATOR: u8 = 0x7F;

const TYPE_I8: u8 = 0;
const TYPE_I16: u8 = 1;
const TYPE_I32: u8 = 2;
const TYPE_F32: u8 = 3;
const TYPE_SLOT: u8 = 5;

fn header(index: u8, ty: u8) -> u8 {
    (index & 0x1F) | (ty << 5)
}

pub struct MetadataWriter {
    buf: Vec<u8>,
}

impl MetadataWriter {
    #[must_use]
    pub fn new() -> Self {
        MetadataWriter { buf: Vec::new() }
    }

    pub fn write_i8(&mut self, index: u8, value: i8) -> Result<()> {
        self.buf.push(header(index, TYPE_I8));
        wire::write_i8(value, &mut self.buf)
    }

    pub fn write_i16(&mut self, index: u8, value: i16) -> Result<()> {
        self.buf.push(header(index, TYPE_I16));
        wire::write_i16(value, &mut self.buf)
    }

    pub fn write_i32(&mut self, index: u8, value: i32) -> Result<()> {
        self.buf.push(header(index, TYPE_I32));
        wire::write_i32(value, &mut self.buf)
    }

    pub fn write_f32(&mut self, index: u8, value: f32) -> Result<()> {
        self.buf.push(header(index, TYPE_F32));
        wire::write_f32(value, &mut self.buf)
    }

    /// Writes a slot payload (for dropped-item metadata, index 10).
    pub fn write_slot(&mut self, index: u8, slot: crate::player::Slot) -> Result<()> {
        self.buf.push(header(index, TYPE_SLOT));
        if slot.is_empty() {
            wire::write_i16(-1, &mut self.buf)?;
        } else {
            wire::write_i16(slot.block_id, &mut self.buf)?;
            wire::write_i8(slot.count, &mut self.buf)?;
            wire::write_i16(slot.damage, &mut self.buf)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.push(TERMINATOR);
        self.buf
    }
}

impl Default for MetadataWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Index 0 (entity flags) + index 10 (skin parts) trailer for a player
/// entity (spec.md §6.2).
pub fn player_metadata(flags: EntityFlags, skin_parts: SkinParts) -> Result<Vec<u8>> {
    let mut writer = MetadataWriter::new();
    writer.write_i8(0, flags.bits() as i8)?;
    writer.write_i8(10, skin_parts.bits() as i8)?;
    Ok(writer.finish())
}

/// Index 10 (the item stack) trailer for a dropped-item entity.
pub fn item_metadata(slot: crate::player::Slot) -> Result<Vec<u8>> {
    let mut writer = MetadataWriter::new();
    writer.write_slot(10, slot)?;
    Ok(writer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_metadata_ends_with_terminator() {
        let bytes = player_metadata(EntityFlags::SNEAKING, SkinParts::all()).unwrap();
        assert_eq!(*bytes.last().unwrap(), TERMINATOR);
        assert_eq!(bytes[0], header(0, TYPE_I8));
    }

    #[test]
    fn item_metadata_encodes_slot_fields() {
        let slot = crate::player::Slot {
            block_id: 5,
            count: 1,
            damage: 0,
        };
        let bytes = item_metadata(slot).unwrap();
        assert_eq!(bytes[0], header(10, TYPE_SLOT));
        assert_eq!(*bytes.last().unwrap(), TERMINATOR);
    }
}
