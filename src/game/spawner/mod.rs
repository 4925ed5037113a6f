//! Enemy population control: when to spawn, what, where, and pooled reuse of
//! dead enemies.

mod director;
mod types;
#[cfg(test)]
mod tests;

pub use director::{pick_spawn_point, SpawnDirector, SpawnEnv};
pub use types::{EnemyProfile, EnemyType, SpawnConfig, SpawnOverrides};
