//! Chunk serialization and the view-distance send order (spec.md §4.10
//! "Join sequence" step 3, §4.6).

use byteorder::{LittleEndian, WriteBytesExt};

use crate::player::Player;
use crate::protocol::packets::play::clientbound::ChunkData;
use crate::world::chunk::Chunk;
use crate::world::WorldStore;

/// Full light (every nibble `0xF`) since the server does not simulate
/// lighting (out of scope); clients accept this without complaint.
fn full_light(section_count: usize) -> Vec<u8> {
    vec![0xFF; section_count * 2048]
}

/// Encodes one column as a ground-up-continuous `ChunkData` payload: block
/// array, block light, sky light, then the biome array (protocol 47).
#[must_use]
pub fn encode_chunk_data(chunk: &Chunk, world: &WorldStore) -> ChunkData {
    let mask = chunk.section_mask();
    let section_count = mask.count_ones() as usize;

    let mut data = Vec::with_capacity(section_count * (4096 * 2 + 2048 + 2048) + 256);
    for (i, section) in chunk.sections.iter().enumerate() {
        if section.is_none() {
            continue;
        }
        for y in 0..16 {
            for z in 0..16 {
                for x in 0..16 {
                    let world_y = (i as i32) * 16 + y;
                    let state = world.get_block(chunk.chunk_x * 16 + x, world_y, chunk.chunk_z * 16 + z);
                    data.write_u16::<LittleEndian>(state)
                        .expect("writing into a Vec<u8> cannot fail");
                }
            }
        }
    }
    data.extend_from_slice(&full_light(section_count));
    data.extend_from_slice(&full_light(section_count));
    data.extend_from_slice(&chunk.biomes);

    ChunkData {
        chunk_x: chunk.chunk_x,
        chunk_z: chunk.chunk_z,
        ground_up_continuous: true,
        primary_bitmask: mask,
        data,
    }
}

/// Chunk coordinates within `view_distance` of `center`, sorted by ascending
/// squared Chebyshev distance so the player's own chunk streams first
/// (spec.md §4.10 "Join sequence" step 3).
#[must_use]
pub fn chunks_in_view(center: (i32, i32), view_distance: i32) -> Vec<(i32, i32)> {
    let mut coords = Vec::new();
    for dx in -view_distance..=view_distance {
        for dz in -view_distance..=view_distance {
            coords.push((center.0 + dx, center.1 + dz));
        }
    }
    coords.sort_by_key(|&(cx, cz)| {
        let dx = (cx - center.0).abs();
        let dz = (cz - center.1).abs();
        dx.max(dz).pow(2)
    });
    coords
}

pub fn send_chunks(player: &Player, world: &WorldStore, view_distance: i32) {
    let center = player.position().chunk();
    for (cx, cz) in chunks_in_view(center, view_distance) {
        let chunk = world.get_or_generate_chunk(cx, cz);
        let packet = encode_chunk_data(&chunk, world);
        let mut buf = Vec::new();
        if packet.encode(&mut buf).is_ok() {
            player.send(ChunkData::ID, &buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_center_chunk_first() {
        let coords = chunks_in_view((5, 5), 1);
        assert_eq!(coords[0], (5, 5));
    }

    #[test]
    fn covers_the_full_square() {
        let coords = chunks_in_view((0, 0), 2);
        assert_eq!(coords.len(), 25);
    }
}
