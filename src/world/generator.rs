//! The world generator delegate (spec.md §4.6, §9).
//!
//! Chunk generation internals and terrain algorithms are explicitly out of
//! scope (spec.md §1 non-goals) — a caller-supplied generator satisfies the
//! contract. This module ships two minimal, deterministic implementations so
//! the server is runnable out of the box: `FlatGenerator` and
//! `DefaultGenerator`, selected by `-generator flat|default`.

use crate::world::chunk::Chunk;

/// Block + biome data for one freshly generated column, plus the contract
/// every generator must satisfy: deterministic given `(seed, cx, cz)`.
pub trait Generator: Send + Sync {
    fn generate(&self, cx: i32, cz: i32) -> Chunk;
    fn height_at(&self, x: i32, z: i32) -> i32;
    fn base_state_at(&self, x: i32, y: i32, z: i32) -> u16 {
        let (cx, cz) = crate::world::chunk::chunk_coords(x, z);
        self.generate(cx, cz).get_block(x, y, z)
    }
}

const STONE: u16 = 1 << 4;
const DIRT: u16 = 3 << 4;
const GRASS: u16 = 2 << 4;
const BEDROCK: u16 = 7 << 4;

/// A single flat slab: bedrock at y=0, stone to y=61, dirt to y=63, grass at
/// y=64. Deterministic trivially — it ignores the seed entirely.
pub struct FlatGenerator {
    pub surface_height: i32,
}

impl FlatGenerator {
    #[must_use]
    pub fn new() -> Self {
        FlatGenerator { surface_height: 64 }
    }
}

impl Default for FlatGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for FlatGenerator {
    fn generate(&self, cx: i32, cz: i32) -> Chunk {
        let mut chunk = Chunk::new(cx, cz);
        for lx in 0..16 {
            for lz in 0..16 {
                let x = cx * 16 + lx;
                let z = cz * 16 + lz;
                chunk.set_block(x, 0, z, BEDROCK);
                for y in 1..(self.surface_height - 1) {
                    chunk.set_block(x, y, z, STONE);
                }
                chunk.set_block(x, self.surface_height - 1, z, DIRT);
                chunk.set_block(x, self.surface_height, z, GRASS);
            }
        }
        chunk
    }

    fn height_at(&self, _x: i32, _z: i32) -> i32 {
        self.surface_height
    }
}

/// A deterministic value-noise heightmap keyed off `(seed, x, z)`. Not a
/// faithful terrain algorithm — just enough variation to exercise the
/// generator contract (lazy generation, caching, override interaction).
pub struct DefaultGenerator {
    seed: i64,
}

impl DefaultGenerator {
    #[must_use]
    pub fn new(seed: i64) -> Self {
        DefaultGenerator { seed }
    }

    fn noise(&self, x: i32, z: i32) -> u32 {
        let mut h = self.seed as u64;
        h = h
            .wrapping_mul(6364136223846793005)
            .wrapping_add(x as i64 as u64);
        h ^= h >> 33;
        h = h
            .wrapping_mul(0xff51afd7ed558ccd)
            .wrapping_add(z as i64 as u64);
        h ^= h >> 33;
        h = h.wrapping_mul(0xc4ceb9fe1a85ec53);
        h ^= h >> 33;
        (h & 0xffff_ffff) as u32
    }
}

impl Generator for DefaultGenerator {
    fn generate(&self, cx: i32, cz: i32) -> Chunk {
        let mut chunk = Chunk::new(cx, cz);
        for lx in 0..16 {
            for lz in 0..16 {
                let x = cx * 16 + lx;
                let z = cz * 16 + lz;
                let height = self.height_at(x, z);
                chunk.set_block(x, 0, z, BEDROCK);
                for y in 1..height.max(1) {
                    chunk.set_block(x, y, z, STONE);
                }
                if height >= 1 {
                    chunk.set_block(x, height, z, GRASS);
                }
            }
        }
        chunk
    }

    fn height_at(&self, x: i32, z: i32) -> i32 {
        40 + (self.noise(x, z) % 40) as i32
    }
}
