//! The static game-data registry: block properties, tool speeds, drops,
//! and the recipe table.

pub mod registry;

pub use registry::{block_info, can_harvest, recipes, tool_speed, BlockInfo, Ingredient, Recipe};
