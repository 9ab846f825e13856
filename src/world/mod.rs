//! World state: chunk storage, generation, and the shared clock.

pub mod chunk;
pub mod generator;
pub mod store;

pub use chunk::{Chunk, Section};
pub use generator::{DefaultGenerator, FlatGenerator, Generator};
pub use store::WorldStore;
