//! The static game-data registry (spec.md §1 "external collaborators";
//! `[NEW]` in SPEC_FULL.md §4.10): block hardness/diggability, per-material
//! tool speed, block drop table, and the shaped/shapeless recipe table.
//!
//! spec.md treats this registry as built from upstream JSON and explicitly
//! out of scope to generate; this module is the hand-written stand-in that
//! covers the block/item/recipe IDs the spec's worked examples reference.

use crate::player::Slot;

#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    pub hardness: Option<f32>,
    pub diggable: bool,
    pub material: &'static str,
    /// Empty means any tool harvests it at full speed.
    pub harvest_tools: &'static [i16],
    pub drop: Option<(i16, i8)>,
}

pub const STONE: i16 = 1;
pub const GRASS: i16 = 2;
pub const DIRT: i16 = 3;
pub const PLANKS: i16 = 5;
pub const BEDROCK: i16 = 7;
pub const LOG: i16 = 17;
pub const CRAFTING_TABLE: i16 = 58;
pub const LOG2: i16 = 162;
pub const COBBLESTONE: i16 = 4;

const WOOD_PICKAXE: i16 = 270;
const STONE_PICKAXE: i16 = 274;
const IRON_PICKAXE: i16 = 257;
const DIAMOND_PICKAXE: i16 = 278;
const GOLD_PICKAXE: i16 = 285;
const PICKAXES: [i16; 5] = [
    WOOD_PICKAXE,
    STONE_PICKAXE,
    IRON_PICKAXE,
    DIAMOND_PICKAXE,
    GOLD_PICKAXE,
];

const WOOD_AXE: i16 = 271;
const STONE_AXE: i16 = 275;
const IRON_AXE: i16 = 258;
const DIAMOND_AXE: i16 = 279;
const GOLD_AXE: i16 = 286;
const AXES: [i16; 5] = [WOOD_AXE, STONE_AXE, IRON_AXE, DIAMOND_AXE, GOLD_AXE];

/// Looks up the static properties of a block by its numeric ID
/// (spec.md §4.10 "Block dig").
#[must_use]
pub fn block_info(block_id: i16) -> Option<BlockInfo> {
    Some(match block_id {
        STONE => BlockInfo {
            hardness: Some(1.5),
            diggable: true,
            material: "rock",
            harvest_tools: &PICKAXES,
            drop: Some((COBBLESTONE, 1)),
        },
        COBBLESTONE => BlockInfo {
            hardness: Some(2.0),
            diggable: true,
            material: "rock",
            harvest_tools: &PICKAXES,
            drop: Some((COBBLESTONE, 1)),
        },
        GRASS => BlockInfo {
            hardness: Some(0.6),
            diggable: true,
            material: "dirt",
            harvest_tools: &[],
            drop: Some((DIRT, 1)),
        },
        DIRT => BlockInfo {
            hardness: Some(0.5),
            diggable: true,
            material: "dirt",
            harvest_tools: &[],
            drop: Some((DIRT, 1)),
        },
        PLANKS => BlockInfo {
            hardness: Some(2.0),
            diggable: true,
            material: "wood",
            harvest_tools: &AXES,
            drop: Some((PLANKS, 1)),
        },
        LOG | LOG2 => BlockInfo {
            hardness: Some(2.0),
            diggable: true,
            material: "wood",
            harvest_tools: &AXES,
            drop: Some((LOG, 1)),
        },
        CRAFTING_TABLE => BlockInfo {
            hardness: Some(2.5),
            diggable: true,
            material: "wood",
            harvest_tools: &AXES,
            drop: Some((CRAFTING_TABLE, 1)),
        },
        BEDROCK => BlockInfo {
            hardness: None,
            diggable: false,
            material: "rock",
            harvest_tools: &[],
            drop: None,
        },
        _ => return None,
    })
}

/// Tool-speed multiplier for a material, indexed by held item ID. Bare
/// hands (or a non-matching tool) use speed 1.0 (spec.md §4.10 dig-time
/// formula).
#[must_use]
pub fn tool_speed(material: &str, held_item_id: i16) -> f32 {
    match material {
        "rock" => match held_item_id {
            WOOD_PICKAXE => 2.0,
            STONE_PICKAXE => 4.0,
            IRON_PICKAXE => 6.0,
            DIAMOND_PICKAXE => 8.0,
            GOLD_PICKAXE => 12.0,
            _ => 1.0,
        },
        "wood" => match held_item_id {
            WOOD_AXE => 2.0,
            STONE_AXE => 4.0,
            IRON_AXE => 6.0,
            DIAMOND_AXE => 8.0,
            GOLD_AXE => 12.0,
            _ => 1.0,
        },
        _ => 1.0,
    }
}

/// True iff the block's harvest-tool set is empty or contains `held_item_id`
/// (spec.md §4.10 "canHarvest").
#[must_use]
pub fn can_harvest(info: &BlockInfo, held_item_id: i16) -> bool {
    info.harvest_tools.is_empty() || info.harvest_tools.contains(&held_item_id)
}

/// Ticks to break a block in survival, per spec.md §4.10's formula. `None`
/// means unbreakable.
#[must_use]
pub fn break_time_ticks(info: &BlockInfo, held_item_id: i16) -> Option<u32> {
    let hardness = info.hardness?;
    if !info.diggable {
        return None;
    }
    if hardness == 0.0 {
        return Some(0);
    }
    let speed = tool_speed(info.material, held_item_id);
    let denom = if can_harvest(info, held_item_id) { 30.0 } else { 100.0 };
    let damage_per_tick = speed / hardness / denom;
    if damage_per_tick >= 1.0 {
        Some(0)
    } else {
        Some((1.0 / damage_per_tick).floor() as u32)
    }
}

/// An ingredient cell: `id <= 0` means "must be empty"; `metadata < 0` means
/// "any metadata" (spec.md §4.10 "Shaped 2x2 recipe match").
#[derive(Debug, Clone, Copy)]
pub struct Ingredient {
    pub id: i16,
    pub metadata: i16,
}

pub struct ShapedRecipe {
    pub rows: usize,
    pub cols: usize,
    pub shape: &'static [Ingredient],
    pub output: Slot,
}

pub struct ShapelessRecipe {
    pub ingredients: &'static [Ingredient],
    pub output: Slot,
}

pub enum Recipe {
    Shaped(ShapedRecipe),
    Shapeless(ShapelessRecipe),
}

const CRAFTING_TABLE_SHAPE: [Ingredient; 4] = [
    Ingredient {
        id: PLANKS,
        metadata: -1,
    },
    Ingredient {
        id: PLANKS,
        metadata: -1,
    },
    Ingredient {
        id: PLANKS,
        metadata: -1,
    },
    Ingredient {
        id: PLANKS,
        metadata: -1,
    },
];

/// Every recipe known to the registry (spec.md §8 scenario 5).
#[must_use]
pub fn recipes() -> Vec<Recipe> {
    vec![Recipe::Shaped(ShapedRecipe {
        rows: 2,
        cols: 2,
        shape: &CRAFTING_TABLE_SHAPE,
        output: Slot {
            block_id: CRAFTING_TABLE,
            count: 1,
            damage: 0,
        },
    })]
}

/// The source removes the orientation bits (upper 2) from log-ingredient
/// metadata when it is >= 4, mapping bark-variant metadata back to simple
/// type metadata before matching ingredients (spec.md §9, preserved as-is).
#[must_use]
pub fn normalize_log_metadata(block_id: i16, metadata: i16) -> i16 {
    if (block_id == LOG || block_id == LOG2) && metadata >= 4 {
        metadata & 0x3
    } else {
        metadata
    }
}
