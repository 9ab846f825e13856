//! The `/`-command table (spec.md §4.10 "Chat").

use crate::player::{GameMode, PlayerManager};
use crate::world::WorldStore;

/// Static dispatch over the fixed command set; holds no state of its own.
pub struct CommandTable;

impl Default for CommandTable {
    fn default() -> Self {
        CommandTable
    }
}

impl CommandTable {
    #[must_use]
    pub fn new() -> Self {
        CommandTable
    }

    /// Executes `line` (without the leading `/`) on behalf of `invoker`,
    /// returning the textual reply to echo back as a system chat line.
    pub fn execute(
        &self,
        line: &str,
        invoker_entity_id: i32,
        players: &PlayerManager,
        world: &WorldStore,
        seed: i64,
        data_dir: &std::path::Path,
    ) -> String {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return "Unknown command".to_string();
        };
        let args: Vec<&str> = parts.collect();

        match name {
            "help" => {
                "Commands: help, list, tp, gamemode, time, say, me, kill, seed, save".to_string()
            }
            "list" => {
                let names: Vec<String> = players
                    .all()
                    .into_iter()
                    .map(|p| p.username.clone())
                    .collect();
                format!("{} players online: {}", names.len(), names.join(", "))
            }
            "tp" => match args.first() {
                Some(target_name) => match find_by_name(players, target_name) {
                    Some(target) => match players.get(invoker_entity_id) {
                        Some(invoker) => {
                            invoker.set_position(target.position());
                            format!("Teleported to {target_name}")
                        }
                        None => "You are not connected".to_string(),
                    },
                    None => format!("No such player: {target_name}"),
                },
                None => "Usage: /tp <player>".to_string(),
            },
            "gamemode" => match args.first().and_then(|a| parse_gamemode(a)) {
                Some(mode) => match players.get(invoker_entity_id) {
                    Some(invoker) => {
                        invoker.set_game_mode(mode);
                        format!("Game mode set to {mode:?}")
                    }
                    None => "You are not connected".to_string(),
                },
                None => "Usage: /gamemode <survival|creative|adventure|spectator>".to_string(),
            },
            "time" => match args.first() {
                Some(&"set") => match args.get(1).and_then(|a| parse_time(a)) {
                    Some(ticks) => {
                        world.set_time_of_day(ticks);
                        format!("Set the time to {ticks}")
                    }
                    None => "Usage: /time set <day|night|noon|midnight|<ticks>>".to_string(),
                },
                _ => format!("The time is {}", world.time_of_day()),
            },
            "say" => format!("[Server] {}", args.join(" ")),
            "me" => {
                let verb = args.join(" ");
                match players.get(invoker_entity_id) {
                    Some(invoker) => format!("* {} {}", invoker.username, verb),
                    None => format!("* {verb}"),
                }
            }
            "kill" => match players.get(invoker_entity_id) {
                Some(invoker) => {
                    invoker.set_position(crate::player::Position::default());
                    "You have been killed".to_string()
                }
                None => "You are not connected".to_string(),
            },
            "seed" => format!("Seed: {seed}"),
            "save" => {
                let overrides = world.all_overrides();
                let save = crate::persist::WorldSave {
                    age: world.age(),
                    time_of_day: world.time_of_day(),
                    overrides: overrides
                        .into_iter()
                        .map(|(x, y, z, state_id)| crate::persist::world_save::OverrideEntry {
                            x,
                            y,
                            z,
                            state_id,
                        })
                        .collect(),
                };
                match crate::persist::world_save::save(data_dir, &save) {
                    Ok(()) => "World saved".to_string(),
                    Err(e) => format!("Save failed: {e}"),
                }
            }
            other => format!("Unknown command: {other}"),
        }
    }

    /// The argument candidate set used by tab-complete for `name`'s
    /// `arg_index`'th argument, or `None` if there is nothing to suggest
    /// there (spec.md §4.10 "Tab-complete").
    #[must_use]
    pub fn argument_candidates(
        &self,
        name: &str,
        arg_index: usize,
        players: &PlayerManager,
    ) -> Option<Vec<String>> {
        match (name, arg_index) {
            ("tp", 0) => Some(players.all().into_iter().map(|p| p.username.clone()).collect()),
            ("gamemode", 0) => Some(
                ["survival", "creative", "adventure", "spectator"]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            ),
            ("time", 0) => Some(vec!["set".to_string()]),
            ("time", 1) => Some(
                ["day", "night", "noon", "midnight"]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        }
    }

    #[must_use]
    pub fn names(&self) -> &'static [&'static str] {
        &["help", "list", "tp", "gamemode", "time", "say", "me", "kill", "seed", "save"]
    }
}

fn find_by_name(players: &PlayerManager, name: &str) -> Option<std::sync::Arc<crate::player::Player>> {
    players.all().into_iter().find(|p| p.username == name)
}

fn parse_gamemode(s: &str) -> Option<GameMode> {
    Some(match s {
        "survival" => GameMode::Survival,
        "creative" => GameMode::Creative,
        "adventure" => GameMode::Adventure,
        "spectator" => GameMode::Spectator,
        _ => return None,
    })
}

fn parse_time(s: &str) -> Option<i64> {
    Some(match s {
        "day" => 1000,
        "noon" => 6000,
        "night" => 13000,
        "midnight" => 18000,
        other => other.parse().ok()?,
    })
}
