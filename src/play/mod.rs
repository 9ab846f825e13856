//! The play phase: packet dispatch and every serverbound handler
//! (spec.md §4.10).

pub mod chat;
pub mod chunks;
pub mod commands;
pub mod dig;
pub mod effects;
pub mod inventory_click;
pub mod join;
pub mod movement;
pub mod place;
pub mod recipe;
pub mod tabcomplete;

use std::sync::Arc;

use crate::error::Result;
use crate::net::connection::Shared;
use crate::player::Player;
use crate::protocol::packets::play::serverbound as sb;
use crate::transport::Frame;

/// Routes one play-phase frame to its handler. Keep-alive is intercepted
/// before this is called (spec.md §4.9's `read_loop`); any packet ID not
/// matched here is silently ignored, per spec.md §7 ("an unrecognized
/// packet ID in a known phase is dropped, not an error").
pub fn dispatch(shared: &Shared, player: &Arc<Player>, frame: Frame) -> Result<()> {
    let mut cursor = std::io::Cursor::new(frame.payload);

    match frame.id {
        sb::ChatMessage::ID => {
            let packet = sb::ChatMessage::decode(&mut cursor)?;
            chat::handle(shared, player, &packet.message);
        }
        sb::PlayerPosition::ID => {
            let packet = sb::PlayerPosition::decode(&mut cursor)?;
            movement::handle(
                shared,
                player,
                Some((packet.x, packet.y, packet.z)),
                None,
                packet.on_ground,
            );
        }
        sb::PlayerLook::ID => {
            let packet = sb::PlayerLook::decode(&mut cursor)?;
            movement::handle(shared, player, None, Some((packet.yaw, packet.pitch)), packet.on_ground);
        }
        sb::PlayerPositionAndLook::ID => {
            let packet = sb::PlayerPositionAndLook::decode(&mut cursor)?;
            movement::handle(
                shared,
                player,
                Some((packet.x, packet.y, packet.z)),
                Some((packet.yaw, packet.pitch)),
                packet.on_ground,
            );
        }
        sb::PlayerDigging::ID => {
            let packet = sb::PlayerDigging::decode(&mut cursor)?;
            let (x, y, z) = packet.location;
            dig::handle(shared, player, packet.status, x, y, z);
        }
        sb::PlayerBlockPlacement::ID => {
            let packet = sb::PlayerBlockPlacement::decode(&mut cursor)?;
            place::handle(shared, player, packet.location, packet.face, &packet.tail);
        }
        sb::CloseWindow::ID => {
            let _ = sb::CloseWindow::decode(&mut cursor)?;
            *player.cursor.write() = crate::player::Slot::EMPTY;
            *player.drag.write() = None;
        }
        sb::ClickWindow::ID => {
            let packet = sb::ClickWindow::decode(&mut cursor)?;
            inventory_click::handle(
                shared,
                player,
                packet.window_id,
                packet.slot,
                packet.button,
                packet.action_number,
                packet.mode,
            );
        }
        sb::TabComplete::ID => {
            let packet = sb::TabComplete::decode(&mut cursor)?;
            tabcomplete::handle(shared, player, &packet.text);
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::player::inventory::Slot;
    use crate::world::{FlatGenerator, WorldStore};
    use uuid::Uuid;

    struct NullSink;
    impl crate::player::state::PacketSink for NullSink {
        fn send_packet(&self, _id: i32, _payload: &[u8]) -> crate::error::Result<()> {
            Ok(())
        }
    }

    fn test_shared() -> Shared {
        let world = Arc::new(WorldStore::new(Arc::new(FlatGenerator::new())));
        let effects = Arc::new(effects::NetEffects::new());
        let players = Arc::new(crate::player::PlayerManager::new(effects.clone(), 8));
        effects.bind(Arc::downgrade(&players));
        Shared {
            config: Config::default(),
            world,
            players,
            key_pair: None,
            http: reqwest::blocking::Client::new(),
            commands: Arc::new(commands::CommandTable::new()),
        }
    }

    #[test]
    fn unrecognized_packet_id_is_silently_ignored() {
        let shared = test_shared();
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), Arc::new(NullSink)));
        let frame = Frame { id: 0x7F, payload: vec![1, 2, 3] };

        assert!(dispatch(&shared, &player, frame).is_ok());
    }

    #[test]
    fn close_window_clears_cursor_and_drag_state() {
        let shared = test_shared();
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), Arc::new(NullSink)));
        *player.cursor.write() = Slot { block_id: 5, count: 1, damage: 0 };
        *player.drag.write() = Some(crate::player::DragSession { right_click: false, slots: vec![1] });

        let mut payload = Vec::new();
        let _ = crate::wire::write_u8(0, &mut payload);
        let frame = Frame { id: sb::CloseWindow::ID, payload };

        dispatch(&shared, &player, frame).unwrap();

        assert!(player.cursor.read().is_empty());
        assert!(player.drag.read().is_none());
    }
}
