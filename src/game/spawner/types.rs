use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::pathfinding::StrategyKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnemyType {
    WeakZombie,
    StrongZombie,
    WeakSkeleton,
    StrongSkeleton,
    Ghoul,
}

impl EnemyType {
    pub const ALL: [EnemyType; 5] = [
        EnemyType::WeakZombie,
        EnemyType::StrongZombie,
        EnemyType::WeakSkeleton,
        EnemyType::StrongSkeleton,
        EnemyType::Ghoul,
    ];

    /// Types eligible at a given fraction of the ramp.
    pub fn eligible_at(progress: f32) -> &'static [EnemyType] {
        if progress < 0.2 {
            &[EnemyType::WeakZombie]
        } else if progress < 0.4 {
            &[EnemyType::WeakZombie, EnemyType::WeakSkeleton]
        } else if progress < 0.6 {
            &[EnemyType::StrongZombie, EnemyType::WeakSkeleton]
        } else if progress < 0.8 {
            &[EnemyType::StrongZombie, EnemyType::StrongSkeleton]
        } else {
            &Self::ALL
        }
    }
}

/// Everything needed to build one kind of enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    pub skin: String,
    pub speed: f32,
    pub health: i32,
    /// One of these is picked at random per spawn.
    pub strategies: Vec<StrategyKind>,
}

impl EnemyProfile {
    fn new(skin: &str, strategies: &[StrategyKind]) -> Self {
        Self {
            skin: skin.to_string(),
            speed: 90.0,
            health: 100,
            strategies: strategies.to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Seconds until the spawn rate and enemy mix stop ramping up.
    pub ramp_seconds: f32,
    pub interval_start: f32,
    pub interval_floor: f32,
    pub max_active: usize,
    /// Name of the level marker list holding enemy spawn points.
    pub marker: String,
    pub profiles: BTreeMap<EnemyType, EnemyProfile>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        use StrategyKind::*;
        let profiles = BTreeMap::from([
            (EnemyType::WeakZombie, EnemyProfile::new("Enemy 0", &[Uninformed, Informed])),
            (EnemyType::StrongZombie, EnemyProfile::new("Enemy 1", &[Local])),
            (EnemyType::WeakSkeleton, EnemyProfile::new("Enemy 2", &[Backtracking])),
            (EnemyType::StrongSkeleton, EnemyProfile::new("Enemy 3", &[AndOr])),
            (EnemyType::Ghoul, EnemyProfile::new("Enemy 4", &[Learned])),
        ]);
        Self {
            ramp_seconds: 300.0,
            interval_start: 1.0,
            interval_floor: 0.45,
            max_active: 100,
            marker: "Enemy".into(),
            profiles,
        }
    }
}

/// Debug slot replacing the random choices of the director.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnOverrides {
    pub enemy_type: Option<EnemyType>,
    pub strategy: Option<StrategyKind>,
}
