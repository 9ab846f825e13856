//! Inventory click, packet 0x0E (spec.md §4.10 "Inventory click").

use std::sync::Arc;

use crate::net::connection::Shared;
use crate::play::join::{encode_slot_bytes, send_window_items};
use crate::play::recipe::match_crafting_grid;
use crate::player::inventory::{Inventory, InternalSlot, STACK_CAP};
use crate::player::{DragSession, GameMode, Player, Slot};
use crate::protocol::packets::play::clientbound as cb;

const CRAFTING_OUTPUT: i16 = 0;
const OUTSIDE_WINDOW: i16 = -999;

fn main_storage() -> Vec<InternalSlot> {
    (9..36).map(InternalSlot::Main).collect()
}

fn hotbar() -> Vec<InternalSlot> {
    (0..9).map(InternalSlot::Main).collect()
}

/// Merges `incoming` into `destinations` (matching stacks first, then empty
/// slots), in priority order, returning whatever didn't fit.
fn merge_into(inventory: &mut Inventory, destinations: &[InternalSlot], mut incoming: Slot) -> Slot {
    if incoming.is_empty() {
        return Slot::EMPTY;
    }
    for &dest in destinations {
        if incoming.count == 0 {
            break;
        }
        let existing = inventory.get(dest);
        if existing.stacks_with(&incoming) && existing.count < STACK_CAP {
            let room = STACK_CAP - existing.count;
            let moved = room.min(incoming.count);
            let mut updated = existing;
            updated.count += moved;
            inventory.set(dest, updated);
            incoming.count -= moved;
        }
    }
    for &dest in destinations {
        if incoming.count == 0 {
            break;
        }
        if inventory.get(dest).is_empty() {
            inventory.set(dest, incoming);
            incoming = Slot::EMPTY;
        }
    }
    incoming
}

fn consume_crafting_ingredients(inventory: &mut Inventory) {
    for i in 0..4 {
        let slot = InternalSlot::Crafting(i);
        let mut current = inventory.get(slot);
        if !current.is_empty() {
            current.count -= 1;
            inventory.set(slot, if current.count <= 0 { Slot::EMPTY } else { current });
        }
    }
}

fn throw_forward(shared: &Shared, player: &Player, slot: Slot) {
    if slot.is_empty() {
        return;
    }
    let pos = player.position();
    let world = Arc::clone(&shared.world);
    let start_y = (pos.y + 1.62).floor() as i32;
    let ground_at = move |px: f64, pz: f64| {
        let ix = px.floor() as i32;
        let iz = pz.floor() as i32;
        for dy in 0..64 {
            let y = start_y - dy;
            if y < 0 {
                break;
            }
            if world.get_block(ix, y, iz) != 0 {
                return (y + 1) as f64;
            }
        }
        (start_y - 64).max(0) as f64
    };
    shared
        .players
        .spawn_item_entity(slot, pos.x, pos.y + 1.62, pos.z, pos.yaw, ground_at);
}

/// Handles one `ClickWindow` packet. `clicked_slot` is the slot payload the
/// wire schema can't decode structurally; it is parsed for no field this
/// handler needs, per spec.md §4.10's explicit "parsed and discarded".
pub fn handle(
    shared: &Shared,
    player: &Arc<Player>,
    window_id: u8,
    slot: i16,
    button: i8,
    action_number: i16,
    mode: i8,
) {
    match mode {
        0 => normal_click(player, slot, button),
        1 => shift_click(player, slot),
        2 => number_key(player, slot, button),
        3 => middle_click(player, slot),
        4 => drop_click(shared, player, slot, button),
        5 => drag_click(player, slot, button),
        6 => double_click(player, slot),
        _ => {}
    }

    let mut inventory = player.inventory.write();
    let output = match_crafting_grid(&inventory.crafting).unwrap_or(Slot::EMPTY);
    drop(inventory);

    player.send(
        cb::SetSlot::ID,
        &encode_set_slot(0, CRAFTING_OUTPUT, &output),
    );
    send_window_items(player);
    let cursor = *player.cursor.read();
    player.send(cb::SetSlot::ID, &encode_set_slot(-1, -1, &cursor));
    player.send(
        cb::ConfirmTransaction::ID,
        &encode_confirm(window_id as i8, action_number, true),
    );
}

fn normal_click(player: &Player, proto: i16, button: i8) {
    if proto == OUTSIDE_WINDOW {
        let mut cursor = player.cursor.write();
        if cursor.is_empty() {
            return;
        }
        let taken = if button == 0 { cursor.count } else { 1 };
        cursor.count -= taken;
        if cursor.count <= 0 {
            *cursor = Slot::EMPTY;
        }
        return;
    }

    if proto == CRAFTING_OUTPUT {
        let mut inventory = player.inventory.write();
        let output = match_crafting_grid(&inventory.crafting).unwrap_or(Slot::EMPTY);
        if output.is_empty() {
            return;
        }
        let mut cursor = player.cursor.write();
        let fits = cursor.is_empty() || (cursor.stacks_with(&output) && cursor.count + output.count <= STACK_CAP);
        if !fits {
            return;
        }
        if cursor.is_empty() {
            *cursor = output;
        } else {
            cursor.count += output.count;
        }
        consume_crafting_ingredients(&mut inventory);
        return;
    }

    let Some(internal) = Inventory::protocol_to_internal(proto) else { return };
    let mut inventory = player.inventory.write();
    let mut cursor = player.cursor.write();
    let existing = inventory.get(internal);

    if button == 0 {
        if cursor.is_empty() {
            inventory.set(internal, Slot::EMPTY);
            *cursor = existing;
        } else if existing.is_empty() || existing.stacks_with(&cursor) {
            let room = STACK_CAP - existing.count;
            let moved = room.min(cursor.count).max(0);
            let mut updated = existing;
            if updated.is_empty() {
                updated = Slot {
                    block_id: cursor.block_id,
                    count: 0,
                    damage: cursor.damage,
                };
            }
            updated.count += moved;
            inventory.set(internal, updated);
            cursor.count -= moved;
            if cursor.count <= 0 {
                *cursor = Slot::EMPTY;
            }
        } else {
            inventory.set(internal, *cursor);
            *cursor = existing;
        }
    } else {
        if cursor.is_empty() {
            if !existing.is_empty() {
                let half = (existing.count + 1) / 2;
                *cursor = Slot {
                    block_id: existing.block_id,
                    count: half,
                    damage: existing.damage,
                };
                let remaining = existing.count - half;
                inventory.set(
                    internal,
                    if remaining <= 0 { Slot::EMPTY } else { Slot { count: remaining, ..existing } },
                );
            }
        } else if existing.is_empty() || existing.stacks_with(&cursor) {
            let mut updated = existing;
            if updated.is_empty() {
                updated = Slot {
                    block_id: cursor.block_id,
                    count: 0,
                    damage: cursor.damage,
                };
            }
            if updated.count < STACK_CAP {
                updated.count += 1;
                inventory.set(internal, updated);
                cursor.count -= 1;
                if cursor.count <= 0 {
                    *cursor = Slot::EMPTY;
                }
            }
        } else {
            inventory.set(internal, *cursor);
            *cursor = existing;
        }
    }
}

fn shift_click(player: &Player, proto: i16) {
    if proto == CRAFTING_OUTPUT || proto == OUTSIDE_WINDOW {
        return;
    }
    let Some(internal) = Inventory::protocol_to_internal(proto) else { return };

    let mut inventory = player.inventory.write();
    let stack = inventory.get(internal);
    if stack.is_empty() {
        return;
    }

    let destinations = match internal {
        InternalSlot::Armor(_) | InternalSlot::Crafting(_) => {
            let mut d = main_storage();
            d.extend(hotbar());
            d
        }
        InternalSlot::Main(i) if i < 9 => main_storage(),
        InternalSlot::Main(_) => hotbar(),
    };

    let leftover = merge_into(&mut inventory, &destinations, stack);
    inventory.set(internal, leftover);
}

fn number_key(player: &Player, proto: i16, button: i8) {
    if !(0..=8).contains(&button) {
        return;
    }
    let Some(internal) = Inventory::protocol_to_internal(proto) else { return };
    let hotbar_slot = InternalSlot::Main(button as usize);

    let mut inventory = player.inventory.write();
    let a = inventory.get(internal);
    let b = inventory.get(hotbar_slot);
    inventory.set(internal, b);
    inventory.set(hotbar_slot, a);
}

fn middle_click(player: &Player, proto: i16) {
    if player.game_mode() != GameMode::Creative {
        return;
    }
    let Some(internal) = Inventory::protocol_to_internal(proto) else { return };
    let inventory = player.inventory.read();
    let existing = inventory.get(internal);
    drop(inventory);
    if existing.is_empty() {
        return;
    }
    *player.cursor.write() = Slot {
        block_id: existing.block_id,
        count: STACK_CAP,
        damage: existing.damage,
    };
}

fn drop_click(shared: &Shared, player: &Player, proto: i16, button: i8) {
    let Some(internal) = Inventory::protocol_to_internal(proto) else { return };
    let mut inventory = player.inventory.write();
    let existing = inventory.get(internal);
    if existing.is_empty() {
        return;
    }
    let taken = if button == 1 { existing.count } else { 1 };
    let remaining = existing.count - taken;
    inventory.set(
        internal,
        if remaining <= 0 { Slot::EMPTY } else { Slot { count: remaining, ..existing } },
    );
    drop(inventory);

    throw_forward(
        shared,
        player,
        Slot {
            block_id: existing.block_id,
            count: taken,
            damage: existing.damage,
        },
    );
}

fn drag_click(player: &Player, proto: i16, button: i8) {
    let mut drag = player.drag.write();
    match button {
        0 | 4 if proto == OUTSIDE_WINDOW => {
            *drag = Some(DragSession {
                right_click: button == 4,
                slots: Vec::new(),
            });
        }
        1 | 5 => {
            if let Some(session) = drag.as_mut() {
                if !session.slots.contains(&proto) {
                    session.slots.push(proto);
                }
            }
        }
        2 | 6 => {
            let Some(session) = drag.take() else { return };
            drop(drag);
            finish_drag(player, &session);
        }
        _ => {}
    }
}

fn finish_drag(player: &Player, session: &DragSession) {
    if session.slots.is_empty() {
        return;
    }
    let mut cursor = player.cursor.write();
    if cursor.is_empty() {
        return;
    }
    let mut inventory = player.inventory.write();

    if session.right_click {
        for &proto in &session.slots {
            if cursor.count == 0 {
                break;
            }
            let Some(internal) = Inventory::protocol_to_internal(proto) else { continue };
            let existing = inventory.get(internal);
            if existing.is_empty() {
                inventory.set(
                    internal,
                    Slot { block_id: cursor.block_id, count: 1, damage: cursor.damage },
                );
                cursor.count -= 1;
            } else if existing.stacks_with(&cursor) && existing.count < STACK_CAP {
                inventory.set(internal, Slot { count: existing.count + 1, ..existing });
                cursor.count -= 1;
            }
        }
    } else {
        let share = cursor.count / session.slots.len() as i8;
        if share == 0 {
            return;
        }
        for &proto in &session.slots {
            let Some(internal) = Inventory::protocol_to_internal(proto) else { continue };
            let existing = inventory.get(internal);
            if existing.is_empty() {
                let moved = share.min(STACK_CAP);
                inventory.set(internal, Slot { block_id: cursor.block_id, count: moved, damage: cursor.damage });
                cursor.count -= moved;
            } else if existing.stacks_with(&cursor) {
                let moved = share.min(STACK_CAP - existing.count);
                inventory.set(internal, Slot { count: existing.count + moved, ..existing });
                cursor.count -= moved;
            }
        }
    }
    if cursor.count <= 0 {
        *cursor = Slot::EMPTY;
    }
}

fn double_click(player: &Player, proto: i16) {
    {
        let mut cursor = player.cursor.write();
        if cursor.is_empty() {
            if let Some(internal) = Inventory::protocol_to_internal(proto) {
                let mut inventory = player.inventory.write();
                let existing = inventory.get(internal);
                if existing.is_empty() {
                    return;
                }
                *cursor = existing;
                inventory.set(internal, Slot::EMPTY);
            } else {
                return;
            }
        }
    }

    let mut cursor = player.cursor.write();
    let mut inventory = player.inventory.write();
    let all_protos: Vec<i16> = (1..45).collect();
    for other_proto in all_protos {
        if cursor.count >= STACK_CAP {
            break;
        }
        let Some(internal) = Inventory::protocol_to_internal(other_proto) else { continue };
        let existing = inventory.get(internal);
        if existing.stacks_with(&cursor) {
            let room = STACK_CAP - cursor.count;
            let moved = room.min(existing.count);
            cursor.count += moved;
            let remaining = existing.count - moved;
            inventory.set(
                internal,
                if remaining <= 0 { Slot::EMPTY } else { Slot { count: remaining, ..existing } },
            );
        }
    }
}

fn encode_set_slot(window_id: i8, proto_slot: i16, slot: &Slot) -> Vec<u8> {
    let packet = cb::SetSlot {
        window_id,
        slot: proto_slot,
        slot_data: encode_slot_bytes(slot),
    };
    let mut buf = Vec::new();
    packet.encode(&mut buf).expect("encoding to a Vec<u8> cannot fail");
    buf
}

fn encode_confirm(window_id: i8, action_number: i16, accepted: bool) -> Vec<u8> {
    let packet = cb::ConfirmTransaction {
        window_id,
        action_number,
        accepted,
    };
    let mut buf = Vec::new();
    packet.encode(&mut buf).expect("encoding to a Vec<u8> cannot fail");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::play::commands::CommandTable;
    use crate::play::effects::NetEffects;
    use crate::player::PlayerManager;
    use crate::world::{FlatGenerator, WorldStore};
    use uuid::Uuid;

    struct NullSink;
    impl crate::player::state::PacketSink for NullSink {
        fn send_packet(&self, _id: i32, _payload: &[u8]) -> crate::error::Result<()> {
            Ok(())
        }
    }

    fn test_player() -> Arc<Player> {
        Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), Arc::new(NullSink)))
    }

    fn test_shared() -> Shared {
        let generator = Arc::new(FlatGenerator::new());
        let world = Arc::new(WorldStore::new(generator));
        let effects = Arc::new(NetEffects::new());
        let players = Arc::new(PlayerManager::new(effects.clone(), 8));
        effects.bind(Arc::downgrade(&players));
        Shared {
            config: Config::default(),
            world,
            players,
            key_pair: None,
            http: reqwest::blocking::Client::new(),
            commands: Arc::new(CommandTable::new()),
        }
    }

    fn stack(id: i16, count: i8) -> Slot {
        Slot { block_id: id, count, damage: 0 }
    }

    #[test]
    fn normal_click_picks_up_into_empty_cursor() {
        let player = test_player();
        player.inventory.write().main[9] = stack(5, 10);
        let shared = test_shared();

        handle(&shared, &player, 0, 9, 0, 1, 0);

        assert_eq!(*player.cursor.read(), stack(5, 10));
        assert_eq!(player.inventory.read().main[9], Slot::EMPTY);
    }

    #[test]
    fn normal_click_swaps_cursor_with_non_matching_slot() {
        let player = test_player();
        player.inventory.write().main[9] = stack(5, 10);
        *player.cursor.write() = stack(6, 3);
        let shared = test_shared();

        handle(&shared, &player, 0, 9, 0, 1, 0);

        assert_eq!(*player.cursor.read(), stack(5, 10));
        assert_eq!(player.inventory.read().main[9], stack(6, 3));
    }

    #[test]
    fn right_click_outside_window_drops_one_from_cursor() {
        let player = test_player();
        *player.cursor.write() = stack(5, 10);
        let shared = test_shared();

        handle(&shared, &player, 0, OUTSIDE_WINDOW, 1, 1, 0);

        assert_eq!(*player.cursor.read(), stack(5, 9));
    }

    #[test]
    fn shift_click_from_hotbar_moves_to_main_storage() {
        let player = test_player();
        player.inventory.write().main[0] = stack(5, 10);
        let shared = test_shared();

        // Protocol slot 36 is hotbar index 0 (spec.md §4.7's mapping table;
        // protocol slot 0 is reserved for the crafting output).
        handle(&shared, &player, 0, 36, 0, 1, 1);

        assert_eq!(player.inventory.read().main[0], Slot::EMPTY);
        assert!(player.inventory.read().main[9..36].contains(&stack(5, 10)));
    }

    #[test]
    fn number_key_swaps_clicked_slot_with_hotbar_index() {
        let player = test_player();
        player.inventory.write().main[9] = stack(5, 10);
        player.inventory.write().main[3] = stack(6, 1);
        let shared = test_shared();

        handle(&shared, &player, 0, 9, 3, 1, 2);

        assert_eq!(player.inventory.read().main[9], stack(6, 1));
        assert_eq!(player.inventory.read().main[3], stack(5, 10));
    }

    #[test]
    fn middle_click_is_noop_outside_creative() {
        let player = test_player();
        player.set_game_mode(GameMode::Survival);
        player.inventory.write().main[9] = stack(5, 10);
        let shared = test_shared();

        handle(&shared, &player, 0, 9, 2, 1, 3);

        assert!(player.cursor.read().is_empty());
    }

    #[test]
    fn middle_click_in_creative_fills_cursor_to_stack_cap() {
        let player = test_player();
        player.set_game_mode(GameMode::Creative);
        player.inventory.write().main[9] = stack(5, 10);
        let shared = test_shared();

        handle(&shared, &player, 0, 9, 2, 1, 3);

        assert_eq!(*player.cursor.read(), stack(5, STACK_CAP));
    }

    #[test]
    fn drag_click_start_add_end_distributes_cursor_evenly() {
        let player = test_player();
        *player.cursor.write() = stack(5, 4);
        let shared = test_shared();

        handle(&shared, &player, 0, OUTSIDE_WINDOW, 0, 1, 5);
        handle(&shared, &player, 0, 9, 1, 1, 5);
        handle(&shared, &player, 0, 10, 1, 1, 5);
        handle(&shared, &player, 0, OUTSIDE_WINDOW, 2, 1, 5);

        assert_eq!(player.inventory.read().main[9], stack(5, 2));
        assert_eq!(player.inventory.read().main[10], stack(5, 2));
        assert!(player.cursor.read().is_empty());
    }

    #[test]
    fn double_click_collects_matching_stacks_into_cursor() {
        let player = test_player();
        player.inventory.write().main[9] = stack(5, 3);
        player.inventory.write().main[10] = stack(5, 20);
        let shared = test_shared();

        handle(&shared, &player, 0, 9, 0, 1, 6);

        assert_eq!(*player.cursor.read(), stack(5, 23));
        assert!(player.inventory.read().main[10].is_empty());
    }

    #[test]
    fn crafting_output_pickup_consumes_one_of_each_ingredient() {
        use crate::data::registry::PLANKS;
        let plank = stack(PLANKS, 1);
        let player = test_player();
        {
            let mut inventory = player.inventory.write();
            inventory.crafting = [plank, plank, plank, plank];
        }
        let shared = test_shared();

        handle(&shared, &player, 0, CRAFTING_OUTPUT, 0, 1, 0);

        assert_eq!(*player.cursor.read(), stack(crate::data::registry::CRAFTING_TABLE, 1));
        let inventory = player.inventory.read();
        assert!(inventory.crafting.iter().all(Slot::is_empty));
    }
}
