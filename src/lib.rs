//! A server for legacy wire protocol 47 (game version 1.8.x).

pub mod codec;
pub mod config;
pub mod crypto;
pub mod data;
pub mod error;
pub mod identity;
pub mod net;
pub mod persist;
pub mod play;
pub mod player;
pub mod protocol;
pub mod transport;
pub mod wire;
pub mod world;
