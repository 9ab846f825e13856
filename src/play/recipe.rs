//! Shaped 2x2 and shapeless recipe matching against the crafting grid
//! (spec.md §4.10 "Shaped 2×2 recipe match", "Shapeless match").

use crate::data::registry::{normalize_log_metadata, Ingredient, Recipe, ShapedRecipe, ShapelessRecipe};
use crate::player::Slot;

const GRID_SIZE: usize = 2;

/// Tries every recipe in the registry against the 2x2 grid (row-major,
/// index `row * 2 + col`), returning the first match's output.
#[must_use]
pub fn match_crafting_grid(grid: &[Slot; 4]) -> Option<Slot> {
    for recipe in crate::data::registry::recipes() {
        match recipe {
            Recipe::Shaped(shaped) => {
                if matches_shaped(&shaped, grid) {
                    return Some(shaped.output);
                }
            }
            Recipe::Shapeless(shapeless) => {
                if matches_shapeless(&shapeless, grid) {
                    return Some(shapeless.output);
                }
            }
        }
    }
    None
}

fn ingredient_matches(ingredient: &Ingredient, cell: Slot) -> bool {
    if ingredient.id <= 0 {
        return cell.is_empty();
    }
    if cell.is_empty() || cell.block_id != ingredient.id {
        return false;
    }
    ingredient.metadata < 0 || normalize_log_metadata(cell.block_id, cell.damage) == ingredient.metadata
}

fn shape_cell(shape: &[Ingredient], cols: usize, row: usize, col: usize, mirror: bool) -> Ingredient {
    let col = if mirror { cols - 1 - col } else { col };
    shape[row * cols + col]
}

fn matches_shape_at(
    shaped: &ShapedRecipe,
    grid: &[Slot; 4],
    row_off: usize,
    col_off: usize,
    mirror: bool,
) -> bool {
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            let cell = grid[row * GRID_SIZE + col];
            let in_shape = row >= row_off
                && row < row_off + shaped.rows
                && col >= col_off
                && col < col_off + shaped.cols;
            if in_shape {
                let ingredient = shape_cell(shaped.shape, shaped.cols, row - row_off, col - col_off, mirror);
                if !ingredient_matches(&ingredient, cell) {
                    return false;
                }
            } else if !cell.is_empty() {
                return false;
            }
        }
    }
    true
}

/// Tries every valid offset of the shape within the 2x2 frame, and its
/// horizontal mirror (spec.md §4.10).
#[must_use]
fn matches_shaped(shaped: &ShapedRecipe, grid: &[Slot; 4]) -> bool {
    if shaped.rows > GRID_SIZE || shaped.cols > GRID_SIZE {
        return false;
    }
    for row_off in 0..=(GRID_SIZE - shaped.rows) {
        for col_off in 0..=(GRID_SIZE - shaped.cols) {
            if matches_shape_at(shaped, grid, row_off, col_off, false)
                || matches_shape_at(shaped, grid, row_off, col_off, true)
            {
                return true;
            }
        }
    }
    false
}

/// Removes one matching ingredient per non-empty grid cell; succeeds iff
/// every cell finds a distinct ingredient and none are left over (spec.md
/// §4.10 "Shapeless match").
#[must_use]
fn matches_shapeless(recipe: &ShapelessRecipe, grid: &[Slot; 4]) -> bool {
    let mut remaining: Vec<Ingredient> = recipe.ingredients.to_vec();
    let cells: Vec<Slot> = grid.iter().copied().filter(|s| !s.is_empty()).collect();
    if cells.len() != remaining.len() {
        return false;
    }
    for cell in cells {
        let Some(pos) = remaining.iter().position(|ingredient| ingredient_matches(ingredient, cell)) else {
            return false;
        };
        remaining.remove(pos);
    }
    remaining.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::registry::{CRAFTING_TABLE, PLANKS};

    fn plank() -> Slot {
        Slot {
            block_id: PLANKS,
            count: 1,
            damage: 0,
        }
    }

    #[test]
    fn four_planks_craft_a_crafting_table() {
        let grid = [plank(), plank(), plank(), plank()];
        let output = match_crafting_grid(&grid).expect("should match");
        assert_eq!(output.block_id, CRAFTING_TABLE);
        assert_eq!(output.count, 1);
    }

    #[test]
    fn three_planks_do_not_match() {
        let grid = [plank(), plank(), plank(), Slot::EMPTY];
        assert!(match_crafting_grid(&grid).is_none());
    }
}
