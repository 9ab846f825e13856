//! CLI parsing and file configuration (spec.md §6.5).
//!
//! CLI precedence: explicitly set flags override file config; file config
//! overrides defaults. After merge, the effective config is written back to
//! `<data_dir>/config.json`.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::persist::atomic::write_json_atomic;

#[derive(Parser, Debug, Default)]
#[command(name = "ferrite_server", about = "A server for protocol 47 (1.8.x)")]
pub struct Cli {
    #[arg(long = "port")]
    pub port: Option<u16>,
    #[arg(long = "online-mode")]
    pub online_mode: Option<bool>,
    #[arg(long = "motd")]
    pub motd: Option<String>,
    #[arg(long = "max-players")]
    pub max_players: Option<u32>,
    #[arg(long = "view-distance")]
    pub view_distance: Option<i32>,
    #[arg(long = "seed")]
    pub seed: Option<i64>,
    #[arg(long = "generator")]
    pub generator: Option<String>,
    #[arg(long = "world-radius")]
    pub world_radius: Option<i32>,
    #[arg(long = "data-dir")]
    pub data_dir: Option<PathBuf>,
    #[arg(long = "auto-save")]
    pub auto_save: Option<u32>,
}

/// The effective, merged configuration (spec.md §6.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub online_mode: bool,
    pub motd: String,
    pub max_players: u32,
    pub view_distance: i32,
    pub seed: i64,
    pub generator: String,
    pub world_radius: i32,
    pub data_dir: PathBuf,
    pub auto_save_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 25565,
            online_mode: false,
            motd: "A Ferrite Server".to_string(),
            max_players: 20,
            view_distance: 8,
            seed: 0,
            generator: "default".to_string(),
            world_radius: 0,
            data_dir: PathBuf::from("."),
            auto_save_minutes: 0,
        }
    }
}

impl Config {
    fn config_path(data_dir: &Path) -> PathBuf {
        data_dir.join("config.json")
    }

    fn load_file(data_dir: &Path) -> Option<Config> {
        let bytes = std::fs::read(Self::config_path(data_dir)).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Merges CLI flags over file config over defaults, then writes the
    /// effective config back (spec.md §6.5 "After merge, the effective
    /// config is written back").
    pub fn load_and_merge(cli: Cli) -> Result<Config> {
        let data_dir = cli.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let mut config = Self::load_file(&data_dir).unwrap_or_default();
        config.data_dir = data_dir;

        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(online_mode) = cli.online_mode {
            config.online_mode = online_mode;
        }
        if let Some(motd) = cli.motd {
            config.motd = motd;
        }
        if let Some(max_players) = cli.max_players {
            config.max_players = max_players;
        }
        if let Some(view_distance) = cli.view_distance {
            config.view_distance = view_distance;
        }
        if let Some(seed) = cli.seed {
            config.seed = seed;
        }
        if let Some(generator) = cli.generator {
            config.generator = generator;
        }
        if let Some(world_radius) = cli.world_radius {
            config.world_radius = world_radius;
        }
        if let Some(auto_save) = cli.auto_save {
            config.auto_save_minutes = auto_save;
        }

        std::fs::create_dir_all(&config.data_dir)
            .map_err(|e| ServerError::StorageError(e.to_string()))?;
        write_json_atomic(&Self::config_path(&config.data_dir), &config)
            .map_err(|e| ServerError::StorageError(e.to_string()))?;

        Ok(config)
    }
}
