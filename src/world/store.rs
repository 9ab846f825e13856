//! The shared world store (spec.md §4.6): a lazily-populated chunk cache
//! backed by a pluggable `Generator`, a sparse block-override map layered on
//! top of it, and the server's age/time-of-day clock.
//!
//! Locking uses `parking_lot::RwLock`, which never poisons — a panic inside
//! a generator's `generate()` call must not wedge the cache for every other
//! connection sharing it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::world::chunk::{chunk_coords, Chunk};
use crate::world::generator::Generator;

/// Ticks per Minecraft day; `time_of_day` wraps at this bound when
/// non-negative (spec.md §4.6).
pub const TICKS_PER_DAY: i64 = 24000;

struct Clock {
    age: i64,
    time_of_day: i64,
}

pub struct WorldStore {
    generator: Arc<dyn Generator>,
    chunks: RwLock<HashMap<(i32, i32), Arc<Chunk>>>,
    overrides: RwLock<HashMap<(i32, i32, i32), u16>>,
    clock: RwLock<Clock>,
}

impl WorldStore {
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        WorldStore {
            generator,
            chunks: RwLock::new(HashMap::new()),
            overrides: RwLock::new(HashMap::new()),
            clock: RwLock::new(Clock { age: 0, time_of_day: 0 }),
        }
    }

    /// Returns the cached chunk at `(cx, cz)`, generating and inserting it
    /// on first access. The generator call happens without holding the
    /// cache lock, so a slow or panicking generator only blocks the caller
    /// that triggered generation — concurrent readers of other chunks are
    /// unaffected, and the cache can't deadlock against itself if the
    /// generator re-enters the store.
    #[must_use]
    pub fn get_or_generate_chunk(&self, cx: i32, cz: i32) -> Arc<Chunk> {
        if let Some(chunk) = self.chunks.read().get(&(cx, cz)) {
            return Arc::clone(chunk);
        }

        let generated = Arc::new(self.generator.generate(cx, cz));

        let mut chunks = self.chunks.write();
        Arc::clone(chunks.entry((cx, cz)).or_insert(generated))
    }

    /// Checks the override map first; on miss, reads the generated chunk's
    /// section array. Returns air for `y` outside `[0, 256)` (spec.md §4.6).
    #[must_use]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> u16 {
        if !(0..256).contains(&y) {
            return 0;
        }
        if let Some(&state) = self.overrides.read().get(&(x, y, z)) {
            return state;
        }
        let (cx, cz) = chunk_coords(x, z);
        self.get_or_generate_chunk(cx, cz).get_block(x, y, z)
    }

    /// Ensures the owning chunk exists (so the generator's base state is
    /// known), then either records an override or, if `state` matches the
    /// generator's base state at that coordinate, clears any existing one
    /// (spec.md §4.6 `set_block`).
    pub fn set_block(&self, x: i32, y: i32, z: i32, state: u16) {
        if !(0..256).contains(&y) {
            return;
        }
        let (cx, cz) = chunk_coords(x, z);
        let _ = self.get_or_generate_chunk(cx, cz);

        let base = self.generator.base_state_at(x, y, z);
        let mut overrides = self.overrides.write();
        if state == base {
            overrides.remove(&(x, y, z));
        } else {
            overrides.insert((x, y, z), state);
        }
    }

    /// The override map entries belonging to chunk `(cx, cz)`, for save and
    /// for replaying edits to a joining player (spec.md §4.6).
    #[must_use]
    pub fn overrides_for_chunk(&self, cx: i32, cz: i32) -> Vec<(i32, i32, i32, u16)> {
        self.overrides
            .read()
            .iter()
            .filter(|&(&(x, _, z), _)| chunk_coords(x, z) == (cx, cz))
            .map(|(&(x, y, z), &state)| (x, y, z, state))
            .collect()
    }

    #[must_use]
    pub fn all_overrides(&self) -> Vec<(i32, i32, i32, u16)> {
        self.overrides
            .read()
            .iter()
            .map(|(&(x, y, z), &state)| (x, y, z, state))
            .collect()
    }

    pub fn load_overrides(&self, entries: impl IntoIterator<Item = (i32, i32, i32, u16)>) {
        let mut overrides = self.overrides.write();
        for (x, y, z, state) in entries {
            overrides.insert((x, y, z), state);
        }
    }

    /// Advances age unconditionally and `time_of_day` by one, wrapping mod
    /// `TICKS_PER_DAY` only while non-negative (a negative value freezes the
    /// clock). Returns the new `(age, time_of_day)` (spec.md §4.6).
    pub fn tick(&self) -> (i64, i64) {
        let mut clock = self.clock.write();
        clock.age += 1;
        if clock.time_of_day >= 0 {
            clock.time_of_day = (clock.time_of_day + 1) % TICKS_PER_DAY;
        }
        (clock.age, clock.time_of_day)
    }

    #[must_use]
    pub fn time_of_day(&self) -> i64 {
        self.clock.read().time_of_day
    }

    #[must_use]
    pub fn age(&self) -> i64 {
        self.clock.read().age
    }

    /// Sets the clock's time-of-day component; negative values freeze it
    /// (spec.md §4.6).
    pub fn set_time_of_day(&self, ticks: i64) {
        self.clock.write().time_of_day = ticks;
    }

    /// Restores both clock components verbatim, used only during load
    /// (spec.md §4.6 `set_time`).
    pub fn set_time(&self, age: i64, time_of_day: i64) {
        let mut clock = self.clock.write();
        clock.age = age;
        clock.time_of_day = time_of_day;
    }

    /// Chunk coordinates currently resident in the cache, for persistence.
    #[must_use]
    pub fn resident_chunks(&self) -> Vec<(i32, i32)> {
        self.chunks.read().keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::generator::FlatGenerator;

    fn store() -> WorldStore {
        WorldStore::new(Arc::new(FlatGenerator::new()))
    }

    #[test]
    fn generates_on_first_access_then_caches() {
        let store = store();
        assert_eq!(store.resident_chunks().len(), 0);
        assert_ne!(store.get_block(0, 64, 0), 0);
        assert_eq!(store.resident_chunks().len(), 1);
    }

    #[test]
    fn set_block_persists_across_reads() {
        let store = store();
        store.set_block(5, 70, 5, 99);
        assert_eq!(store.get_block(5, 70, 5), 99);
        assert_eq!(store.overrides_for_chunk(0, 0), vec![(5, 70, 5, 99)]);
    }

    #[test]
    fn set_block_matching_base_state_clears_override() {
        let store = store();
        let base = store.get_block(5, 64, 5);
        store.set_block(5, 64, 5, 999);
        assert_eq!(store.get_block(5, 64, 5), 999);
        store.set_block(5, 64, 5, base);
        assert_eq!(store.get_block(5, 64, 5), base);
        assert!(store.overrides_for_chunk(0, 0).is_empty());
    }

    #[test]
    fn out_of_range_y_reads_as_air() {
        let store = store();
        assert_eq!(store.get_block(0, -1, 0), 0);
        assert_eq!(store.get_block(0, 300, 0), 0);
    }

    #[test]
    fn tick_advances_age_and_wraps_time() {
        let store = store();
        store.set_time(0, TICKS_PER_DAY - 1);
        let (age, time) = store.tick();
        assert_eq!(age, 1);
        assert_eq!(time, 0);
    }

    #[test]
    fn negative_time_of_day_freezes() {
        let store = store();
        store.set_time_of_day(-1);
        let (_, time) = store.tick();
        assert_eq!(time, -1);
    }
}
