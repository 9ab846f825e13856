//! Tab-complete, packet 0x14 (spec.md §4.10 "Tab-complete").

use std::sync::Arc;

use crate::net::connection::{encode, Shared};
use crate::player::Player;
use crate::protocol::packets::play::clientbound as cb;
use crate::wire;

/// Handles a `TabComplete` packet: command-name prefix match, per-argument
/// candidate sets, or bare player-name matching for chat mentions.
pub fn handle(shared: &Shared, player: &Arc<Player>, text: &str) {
    let matches = if let Some(rest) = text.strip_prefix('/') {
        if !rest.contains(' ') {
            shared
                .commands
                .names()
                .iter()
                .filter(|name| name.starts_with(rest))
                .map(|name| format!("/{name}"))
                .collect()
        } else {
            let mut parts = rest.split(' ');
            let command = parts.next().unwrap_or("");
            // `parts` now holds every argument token including the partial
            // one being completed; its 0-based index is one less than how
            // many of those tokens remain.
            let arg_index = parts.count().saturating_sub(1);
            shared
                .commands
                .argument_candidates(command, arg_index, &shared.players)
                .unwrap_or_default()
        }
    } else {
        shared
            .players
            .all()
            .into_iter()
            .map(|p| p.username.clone())
            .filter(|name| name.starts_with(text))
            .collect::<Vec<_>>()
    };

    player.send(cb::TabComplete::ID, &encode(&cb::TabComplete { matches: encode_matches(&matches) }));
}

fn encode_matches(matches: &[String]) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = wire::write_varint(matches.len() as i32, &mut buf);
    for m in matches {
        let _ = wire::write_string(m, &mut buf);
    }
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

    fn decode_matches(payload: &[u8]) -> Vec<String> {
        let decoded = cb::TabComplete::decode(&mut std::io::Cursor::new(payload.to_vec()))
            .expect("TabComplete decodes");
        let mut cursor = std::io::Cursor::new(decoded.matches);
        let count = wire::read_varint(&mut cursor).unwrap();
        (0..count).map(|_| wire::read_string(&mut cursor).unwrap()).collect()
    }

    #[test]
    fn command_prefix_matches_command_names() {
        let shared = test_shared();
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink.clone()));

        handle(&shared, &player, "/gam");

        let (_, payload) = sink.sent.lock().pop().unwrap();
        assert_eq!(decode_matches(&payload), vec!["/gamemode".to_string()]);
    }

    #[test]
    fn command_argument_matches_gamemode_candidates() {
        let shared = test_shared();
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink.clone()));

        handle(&shared, &player, "/gamemode ");

        let (_, payload) = sink.sent.lock().pop().unwrap();
        let matches = decode_matches(&payload);
        assert_eq!(matches.len(), 4);
        assert!(matches.contains(&"creative".to_string()));
    }

    #[test]
    fn bare_text_matches_online_player_names() {
        let shared = test_shared();
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink.clone()));
        let bob_sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let bob = Arc::new(Player::new(2, Uuid::new_v4(), "Bob".to_string(), bob_sink));
        shared.players.add(player.clone());
        shared.players.add(bob);
        sink.sent.lock().clear();

        handle(&shared, &player, "Bo");

        let (_, payload) = sink.sent.lock().pop().unwrap();
        assert_eq!(decode_matches(&payload), vec!["Bob".to_string()]);
    }
}
