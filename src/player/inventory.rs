//! Inventory slots and the player inventory protocol-index mapping
//! (spec.md §3 "Inventory slot", §4.7).

use serde::{Deserialize, Serialize};

/// `(block_id, count, damage)`. Empty iff `block_id == -1` (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub block_id: i16,
    pub count: i8,
    pub damage: i16,
}

pub const STACK_CAP: i8 = 64;

impl Slot {
    pub const EMPTY: Slot = Slot {
        block_id: -1,
        count: 0,
        damage: 0,
    };

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.block_id == -1
    }

    #[must_use]
    pub fn stacks_with(&self, other: &Slot) -> bool {
        !self.is_empty() && self.block_id == other.block_id && self.damage == other.damage
    }
}

impl Default for Slot {
    fn default() -> Self {
        Slot::EMPTY
    }
}

/// 36 main slots (0..=8 hotbar, 9..=35 storage), 4 armor slots ordered
/// boots/leggings/chestplate/helmet, the 2x2 crafting grid, and the
/// currently held hotbar index (spec.md §3 "Player").
#[derive(Debug, Clone)]
pub struct Inventory {
    pub main: [Slot; 36],
    pub armor: [Slot; 4],
    pub crafting: [Slot; 4],
    pub held_slot: i8,
}

impl Inventory {
    #[must_use]
    pub fn new() -> Self {
        Inventory {
            main: [Slot::EMPTY; 36],
            armor: [Slot::EMPTY; 4],
            crafting: [Slot::EMPTY; 4],
            held_slot: 0,
        }
    }

    #[must_use]
    pub fn held_item(&self) -> Slot {
        self.main[self.held_slot as usize]
    }

    /// Maps a window-0 protocol slot index to the internal storage slot
    /// (spec.md §4.7's mapping table). Proto 0, the crafting output, has no
    /// internal counterpart — it's computed from the grid on demand.
    #[must_use]
    pub fn protocol_to_internal(proto: i16) -> Option<InternalSlot> {
        match proto {
            1..=4 => Some(InternalSlot::Crafting((proto - 1) as usize)),
            5 => Some(InternalSlot::Armor(3)),
            6 => Some(InternalSlot::Armor(2)),
            7 => Some(InternalSlot::Armor(1)),
            8 => Some(InternalSlot::Armor(0)),
            9..=35 => Some(InternalSlot::Main(proto as usize)),
            36..=44 => Some(InternalSlot::Main((proto - 36) as usize)),
            _ => None,
        }
    }

    #[must_use]
    pub fn internal_to_protocol(slot: InternalSlot) -> i16 {
        match slot {
            InternalSlot::Crafting(i @ 0..=3) => i as i16 + 1,
            InternalSlot::Crafting(other) => panic!("invalid crafting index {other}"),
            InternalSlot::Armor(3) => 5,
            InternalSlot::Armor(2) => 6,
            InternalSlot::Armor(1) => 7,
            InternalSlot::Armor(0) => 8,
            InternalSlot::Armor(other) => panic!("invalid armor index {other}"),
            InternalSlot::Main(i @ 9..=35) => i as i16,
            InternalSlot::Main(i @ 0..=8) => i as i16 + 36,
            InternalSlot::Main(other) => panic!("invalid main index {other}"),
        }
    }

    #[must_use]
    pub fn get(&self, slot: InternalSlot) -> Slot {
        match slot {
            InternalSlot::Main(i) => self.main[i],
            InternalSlot::Armor(i) => self.armor[i],
            InternalSlot::Crafting(i) => self.crafting[i],
        }
    }

    pub fn set(&mut self, slot: InternalSlot, value: Slot) {
        match slot {
            InternalSlot::Main(i) => self.main[i] = value,
            InternalSlot::Armor(i) => self.armor[i] = value,
            InternalSlot::Crafting(i) => self.crafting[i] = value,
        }
    }

    /// Merges `incoming` into matching non-full hotbar slots (0..9), then
    /// matching main slots (9..35), then empty slots in that same order.
    /// Returns any leftover that didn't fit (spec.md §4.7).
    pub fn add_item(&mut self, mut incoming: Slot) -> Slot {
        if incoming.is_empty() || incoming.count == 0 {
            return Slot::EMPTY;
        }

        let merge_order: [usize; 36] = {
            let mut order = [0usize; 36];
            for (i, slot) in order.iter_mut().enumerate() {
                *slot = i;
            }
            order
        };

        for &i in &merge_order {
            if incoming.count == 0 {
                break;
            }
            let existing = self.main[i];
            if existing.stacks_with(&incoming) && existing.count < STACK_CAP {
                let room = STACK_CAP - existing.count;
                let moved = room.min(incoming.count);
                self.main[i].count += moved;
                incoming.count -= moved;
            }
        }

        for &i in &merge_order {
            if incoming.count == 0 {
                break;
            }
            if self.main[i].is_empty() {
                let moved = incoming.count.min(STACK_CAP);
                self.main[i] = Slot {
                    block_id: incoming.block_id,
                    count: moved,
                    damage: incoming.damage,
                };
                incoming.count -= moved;
            }
        }

        if incoming.count == 0 {
            Slot::EMPTY
        } else {
            incoming
        }
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalSlot {
    Main(usize),
    Armor(usize),
    Crafting(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(id: i16, count: i8) -> Slot {
        Slot {
            block_id: id,
            count,
            damage: 0,
        }
    }

    #[test]
    fn protocol_index_round_trips() {
        for proto in [5, 6, 7, 8, 9, 20, 35, 36, 44] {
            let internal = Inventory::protocol_to_internal(proto).unwrap();
            assert_eq!(Inventory::internal_to_protocol(internal), proto);
        }
    }

    #[test]
    fn add_item_merges_then_fills_empty() {
        let mut inv = Inventory::new();
        inv.main[0] = stack(5, 10);
        let leftover = inv.add_item(stack(5, 60));
        assert_eq!(inv.main[0].count, 64);
        assert_eq!(leftover, stack(5, 6));
    }

    #[test]
    fn add_item_returns_leftover_when_inventory_full() {
        let mut inv = Inventory::new();
        for slot in inv.main.iter_mut() {
            *slot = stack(1, 64);
        }
        let leftover = inv.add_item(stack(5, 1));
        assert_eq!(leftover, stack(5, 1));
    }
}
