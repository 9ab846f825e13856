//! Chat message, packet 0x01 (spec.md §4.10 "Chat").

use std::sync::Arc;

use crate::net::connection::{encode, Shared};
use crate::protocol::packets::play::clientbound as cb;
use crate::player::Player;

/// Handles a `ChatMessage` packet: `/`-prefixed lines dispatch to the
/// command table with a system reply to the sender, everything else
/// broadcasts as a translated chat line.
pub fn handle(shared: &Shared, player: &Arc<Player>, message: &str) {
    if let Some(line) = message.strip_prefix('/') {
        let reply = shared.commands.execute(
            line,
            player.entity_id,
            &shared.players,
            &shared.world,
            shared.config.seed,
            &shared.config.data_dir,
        );
        let json = serde_json::json!({ "text": reply, "color": "yellow" }).to_string();
        player.send(cb::ChatMessage::ID, &encode(&cb::ChatMessage { json, position: 1 }));
        return;
    }

    let json = serde_json::json!({
        "translate": "chat.type.text",
        "with": [
            { "text": player.username },
            { "text": message },
        ],
    })
    .to_string();
    shared
        .players
        .broadcast(cb::ChatMessage::ID, &encode(&cb::ChatMessage { json, position: 0 }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::play::commands::CommandTable;
    use crate::play::effects::NetEffects;
    use crate::player::PlayerManager;
    use crate::world::{FlatGenerator, WorldStore};
    use parking_lot::Mutex;
    use uuid::Uuid;

    struct RecordingSink {
        sent: Mutex<Vec<(i32, Vec<u8>)>>,
    }
    impl crate::player::state::PacketSink for RecordingSink {
        fn send_packet(&self, packet_id: i32, payload: &[u8]) -> crate::error::Result<()> {
            self.sent.lock().push((packet_id, payload.to_vec()));
            Ok(())
        }
    }

    fn test_shared() -> Shared {
        let world = Arc::new(WorldStore::new(Arc::new(FlatGenerator::new())));
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

    #[test]
    fn slash_prefixed_message_replies_to_sender_only() {
        let shared = test_shared();
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink.clone()));
        shared.players.add(player.clone());

        handle(&shared, &player, "/help");

        let sent = sink.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, cb::ChatMessage::ID);
    }

    #[test]
    fn plain_message_broadcasts_to_every_player() {
        let shared = test_shared();
        let alice_sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let bob_sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let alice = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), alice_sink.clone()));
        let bob = Arc::new(Player::new(2, Uuid::new_v4(), "Bob".to_string(), bob_sink.clone()));
        shared.players.add(alice.clone());
        shared.players.add(bob.clone());
        alice_sink.sent.lock().clear();
        bob_sink.sent.lock().clear();

        handle(&shared, &alice, "hello everyone");

        assert!(alice_sink.sent.lock().iter().any(|(id, _)| *id == cb::ChatMessage::ID));
        assert!(bob_sink.sent.lock().iter().any(|(id, _)| *id == cb::ChatMessage::ID));
    }
}
