//! CLI entry point: load configuration, restore persisted world state, bind
//! the listener, and run the tick/auto-save background tasks
//! (spec.md §6.5, §4.11, "Scheduling model").

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ferrite_server::config::{Cli, Config};
use ferrite_server::crypto::KeyPair;
use ferrite_server::net::{self, Shared};
use ferrite_server::persist::{player_save, world_save};
use ferrite_server::play::commands::CommandTable;
use ferrite_server::play::effects::NetEffects;
use ferrite_server::player::PlayerManager;
use ferrite_server::world::{DefaultGenerator, FlatGenerator, Generator, WorldStore};

const TICK_INTERVAL: Duration = Duration::from_millis(50);

fn build_generator(config: &Config) -> Arc<dyn Generator> {
    match config.generator.as_str() {
        "flat" => Arc::new(FlatGenerator::new()),
        _ => Arc::new(DefaultGenerator::new(config.seed)),
    }
}

fn restore_world(world: &WorldStore, config: &Config) {
    if let Some(saved) = world_save::load(&config.data_dir) {
        world.set_time(saved.age, saved.time_of_day);
        world.load_overrides(
            saved
                .overrides
                .into_iter()
                .map(|entry| (entry.x, entry.y, entry.z, entry.state_id)),
        );
    }
}

fn spawn_tick_thread(world: Arc<WorldStore>, players: Arc<PlayerManager>) {
    std::thread::spawn(move || loop {
        std::thread::sleep(TICK_INTERVAL);
        world.tick();
        players.tick();
    });
}

/// Periodically writes the world clock/overrides and every online player's
/// state to disk (spec.md §4.11 "periodic save"). A `0` interval disables
/// the task entirely; the final save still happens per-connection on
/// disconnect (`net::connection::save_player`).
fn spawn_autosave_thread(world: Arc<WorldStore>, players: Arc<PlayerManager>, config: Config) {
    if config.auto_save_minutes == 0 {
        return;
    }
    let interval = Duration::from_secs(u64::from(config.auto_save_minutes) * 60);
    std::thread::spawn(move || loop {
        std::thread::sleep(interval);
        save_everything(&world, &players, &config);
    });
}

fn save_everything(world: &WorldStore, players: &PlayerManager, config: &Config) {
    let save = world_save::WorldSave {
        age: world.age(),
        time_of_day: world.time_of_day(),
        overrides: world
            .all_overrides()
            .into_iter()
            .map(|(x, y, z, state_id)| world_save::OverrideEntry { x, y, z, state_id })
            .collect(),
    };
    if let Err(err) = world_save::save(&config.data_dir, &save) {
        log::warn!("auto-save of world state failed: {err}");
    }

    for player in players.all() {
        let result = player_save::save(
            &config.data_dir,
            &player.uuid,
            &player.username,
            &player.position(),
            player.game_mode(),
            &player.inventory.read(),
        );
        if let Err(err) = result {
            log::warn!("auto-save of player {} failed: {err}", player.username);
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::load_and_merge(Cli::parse())?;

    let key_pair = if config.online_mode {
        Some(Arc::new(KeyPair::generate()?))
    } else {
        None
    };

    let generator = build_generator(&config);
    let world = Arc::new(WorldStore::new(generator));
    restore_world(&world, &config);

    let net_effects = Arc::new(NetEffects::new());
    let players = Arc::new(PlayerManager::new(net_effects.clone(), config.view_distance));
    net_effects.bind(Arc::downgrade(&players));

    let shared = Arc::new(Shared {
        config: config.clone(),
        world: Arc::clone(&world),
        players: Arc::clone(&players),
        key_pair,
        http: reqwest::blocking::Client::new(),
        commands: Arc::new(CommandTable::new()),
    });

    spawn_tick_thread(Arc::clone(&world), Arc::clone(&players));
    spawn_autosave_thread(world, players, config);

    net::listener::run(shared)?;
    Ok(())
}
