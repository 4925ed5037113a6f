use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{BufReader, BufWriter};
use std::path::Path as FsPath;

use bevy::log::{info, warn};
use bevy::math::{IVec2, Vec2};
use chrono::Timelike;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Path, PathStrategy, PlanEnv, PlanOutcome, PlanRequest, StrategyKind};

pub const POLICY_VERSION: u32 = 1;
pub const DEFAULT_MAX_STEPS: usize = 18;

/// Discrete move of the trained policy. Codes match the trainer's output.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    N = 0,
    S = 1,
    W = 3,
    E = 4,
    NW = 5,
    NE = 6,
    SW = 7,
    SE = 8,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::N,
        Action::S,
        Action::W,
        Action::E,
        Action::NW,
        Action::NE,
        Action::SW,
        Action::SE,
    ];

    /// Tile step, y pointing down.
    pub fn step(self) -> IVec2 {
        match self {
            Action::N => IVec2::new(0, -1),
            Action::S => IVec2::new(0, 1),
            Action::W => IVec2::new(-1, 0),
            Action::E => IVec2::new(1, 0),
            Action::NW => IVec2::new(-1, -1),
            Action::NE => IVec2::new(1, -1),
            Action::SW => IVec2::new(-1, 1),
            Action::SE => IVec2::new(1, 1),
        }
    }

    pub fn from_code(code: u8) -> Option<Action> {
        Action::ALL.into_iter().find(|a| *a as u8 == code)
    }
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy file i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("policy file decode: {0}")]
    Decode(#[from] bincode::Error),
    #[error("policy file version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct PolicyEntry {
    tile: (i32, i32),
    goal: (i32, i32),
    action: Action,
}

#[derive(Serialize, Deserialize)]
struct PolicyFile {
    version: u32,
    entries: Vec<PolicyEntry>,
}

/// Trained `(tile, goal tile) -> action` lookup, produced offline.
#[derive(Clone, Debug, Default)]
pub struct PolicyTable {
    entries: FxHashMap<(IVec2, IVec2), Action>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tile: IVec2, goal: IVec2, action: Action) {
        self.entries.insert((tile, goal), action);
    }

    pub fn action(&self, tile: IVec2, goal: IVec2) -> Option<Action> {
        self.entries.get(&(tile, goal)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a table, or fall back to an empty one with a single warning.
    pub fn load_or_empty(path: impl AsRef<FsPath>) -> Self {
        let path = path.as_ref();
        match load_policy(path) {
            Ok(table) => {
                info!("[POLICY] Loaded {} entries from {}", table.len(), path.display());
                table
            }
            Err(e) => {
                warn!(
                    "[POLICY] No usable policy table at {} ({}); learned pathing falls back to random moves",
                    path.display(),
                    e
                );
                PolicyTable::default()
            }
        }
    }
}

pub fn save_policy(path: impl AsRef<FsPath>, table: &PolicyTable) -> Result<(), PolicyError> {
    let mut entries: Vec<PolicyEntry> = table
        .entries
        .iter()
        .map(|((tile, goal), action)| PolicyEntry {
            tile: (tile.x, tile.y),
            goal: (goal.x, goal.y),
            action: *action,
        })
        .collect();
    entries.sort_by_key(|e| (e.tile, e.goal));

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    bincode::serialize_into(
        &mut encoder,
        &PolicyFile {
            version: POLICY_VERSION,
            entries,
        },
    )?;
    encoder.finish()?;
    Ok(())
}

pub fn load_policy(path: impl AsRef<FsPath>) -> Result<PolicyTable, PolicyError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut decoder = ZlibDecoder::new(reader);
    let data: PolicyFile = bincode::deserialize_from(&mut decoder)?;
    if data.version != POLICY_VERSION {
        return Err(PolicyError::Version {
            found: data.version,
            expected: POLICY_VERSION,
        });
    }

    let mut table = PolicyTable::default();
    for entry in data.entries {
        table.insert(
            IVec2::new(entry.tile.0, entry.tile.1),
            IVec2::new(entry.goal.0, entry.goal.1),
            entry.action,
        );
    }
    Ok(table)
}

// ============================================================================
// Policy walk
// ============================================================================

pub fn to_tile(point: Vec2, tile_size: Vec2) -> IVec2 {
    IVec2::new(
        (point.x / tile_size.x).floor() as i32,
        (point.y / tile_size.y).floor() as i32,
    )
}

pub fn tile_center(tile: IVec2, tile_size: Vec2) -> Vec2 {
    Vec2::new(
        ((tile.x as f32 + 0.5) * tile_size.x).trunc(),
        ((tile.y as f32 + 0.5) * tile_size.y).trunc(),
    )
}

/// Random move for tiles the table does not cover.
///
/// Seeded from the tile and the current wall-clock second, so the choice is
/// stable for about a second and then changes. It only keeps actors moving.
fn fallback_action(tile: IVec2) -> Action {
    let mut hasher = FxHasher::default();
    (tile.x, tile.y, chrono::Local::now().second()).hash(&mut hasher);
    let mut rng = StdRng::seed_from_u64(hasher.finish());
    Action::ALL.choose(&mut rng).copied().unwrap_or(Action::N)
}

/// Follow the policy from `start` for at most `max_steps` tiles.
///
/// Stops when a tile repeats or the goal tile is entered. Returns tile centers
/// in path convention (nearest step last).
pub fn policy_walk(table: &PolicyTable, start: Vec2, end: Vec2, tile_size: Vec2, max_steps: usize) -> Path {
    let goal = to_tile(end, tile_size);
    let mut tile = to_tile(start, tile_size);
    let lookup = |tile: IVec2| table.action(tile, goal).unwrap_or_else(|| fallback_action(tile));

    let mut visited: FxHashSet<IVec2> = FxHashSet::default();
    visited.insert(goal);

    let mut path = Vec::new();
    let mut action = lookup(tile);
    let mut steps = 0;
    while !visited.contains(&tile) && steps < max_steps {
        steps += 1;
        visited.insert(tile);
        tile += action.step();
        action = lookup(tile);
        path.push(tile_center(tile, tile_size));
    }
    path.reverse();
    path
}

/// Pathing from the pretrained policy table.
#[derive(Clone, Debug)]
pub struct Learned {
    replan_angle: f32,
    tile_size: Vec2,
    max_steps: usize,
}

impl Learned {
    pub fn new(replan_angle: f32, tile_size: Vec2, max_steps: usize) -> Self {
        Self {
            replan_angle,
            tile_size,
            max_steps,
        }
    }
}

impl PathStrategy for Learned {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Learned
    }

    fn replan_angle(&self) -> f32 {
        self.replan_angle
    }

    fn plan(&mut self, request: &PlanRequest, env: &mut PlanEnv<'_>) -> PlanOutcome {
        let path = policy_walk(env.policy, request.start, request.end, self.tile_size, self.max_steps);
        if path.is_empty() {
            PlanOutcome::NotFound
        } else {
            PlanOutcome::Found(path)
        }
    }
}
