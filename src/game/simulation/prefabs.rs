use std::collections::BTreeMap;

use bevy::math::{Rect, Vec2};

use super::{
    Animator, AnimationSet, BulletTrigger, CameraRig, DepthSort, Health, Lifetime, PhysicsBody, PlayerController,
    PlayerTrigger, Shooter, Visual,
};
use crate::game::actor::{tags, Actor, ActorArena, ActorId};
use crate::game::config::{ActorConfig, BulletConfig, InitialConfig, PathfindingConfig};
use crate::game::error::SimError;
use crate::game::pathfinding::{
    AndOr, Backtracking, Informed, Learned, Local, Pathfinder, StrategyKind, Uninformed,
};
use crate::game::spawner::EnemyProfile;

/// Actor factories for one stage.
#[derive(Clone, Debug)]
pub struct Prefabs {
    player: ActorConfig,
    contact_damage: i32,
    hit_cooldown: f32,
    enemy_size: Vec2,
    enemy_bound: Vec2,
    bullet: BulletConfig,
    viewport: Vec2,
    level_bounds: Rect,
    separation_force: f32,
    pathfinding: PathfindingConfig,
    tile_size: Vec2,
    skins: BTreeMap<String, AnimationSet>,
}

impl Prefabs {
    pub fn new(config: &InitialConfig, level_bounds: Rect, tile_size: Vec2) -> Self {
        Self {
            player: config.player.clone(),
            contact_damage: config.player_contact_damage,
            hit_cooldown: config.player_hit_cooldown,
            enemy_size: config.enemy_size,
            enemy_bound: config.enemy_bound,
            bullet: config.bullet.clone(),
            viewport: config.viewport,
            level_bounds,
            separation_force: config.separation_force,
            pathfinding: config.pathfinding.clone(),
            tile_size,
            skins: config.skins.clone(),
        }
    }

    pub fn enemy_bound(&self) -> Vec2 {
        self.enemy_bound
    }

    fn animator(&self, skin: &str) -> Result<Animator, SimError> {
        let set = self
            .skins
            .get(skin)
            .ok_or_else(|| SimError::UnknownSkin(skin.to_string()))?;
        Animator::new(skin, set.clone())
    }

    pub fn player(&self, arena: &mut ActorArena, center: Vec2) -> Result<ActorId, SimError> {
        let animator = self.animator(&self.player.skin)?;
        arena.spawn(|actor| {
            actor.add_tag(tags::PLAYER);
            actor
                .add(Visual::centered(center, self.player.size))?
                .add(Health::new(self.player.health))?
                .add(PhysicsBody::non_rigid(self.player.bound, self.player.speed))?
                .add(PlayerController::default())?
                .add(Shooter::new(self.bullet.fire_cooldown))?
                .add(PlayerTrigger::new(self.contact_damage, self.hit_cooldown))?
                .add(animator)?
                .add(DepthSort)?
                .add(CameraRig::new(self.viewport, self.level_bounds))?;
            Ok(())
        })
    }

    pub fn enemy(
        &self,
        arena: &mut ActorArena,
        profile: &EnemyProfile,
        strategy: StrategyKind,
        center: Vec2,
        target: ActorId,
    ) -> Result<ActorId, SimError> {
        let animator = self.animator(&profile.skin)?;
        arena.spawn(|actor| {
            actor.add_tag(tags::ENEMY);
            actor
                .add(Visual::centered(center, self.enemy_size))?
                .add(Health::new(profile.health))?
                .add(
                    PhysicsBody::rigid(self.enemy_bound, profile.speed)
                        .with_separation_force(self.separation_force),
                )?;
            self.attach_pathfinder(actor, strategy, target)?;
            actor.add(animator)?.add(DepthSort)?;
            Ok(())
        })
    }

    pub fn bullet(&self, arena: &mut ActorArena, origin: Vec2, direction: Vec2) -> Result<ActorId, SimError> {
        arena.spawn(|actor| {
            actor.add_tag(tags::BULLET);
            let mut body = PhysicsBody::projectile(self.bullet.bound, self.bullet.speed);
            body.direction = direction;
            actor
                .add(Visual::centered(origin, self.bullet.size))?
                .add(body)?
                .add(BulletTrigger::new(self.bullet.damage))?
                .add(Lifetime::new(self.bullet.lifetime))?
                .add(DepthSort)?;
            Ok(())
        })
    }

    /// Attach the pathfinder for `kind`, configured from the stage settings.
    pub fn attach_pathfinder(&self, actor: &mut Actor, kind: StrategyKind, target: ActorId) -> Result<(), SimError> {
        let cfg = &self.pathfinding;
        let angles = &cfg.replan;
        match kind {
            StrategyKind::Uninformed => actor.add(Pathfinder::new(Uninformed::new(angles.uninformed), target))?,
            StrategyKind::Informed => actor.add(Pathfinder::new(Informed::new(angles.informed), target))?,
            StrategyKind::Local => actor.add(Pathfinder::new(
                Local::new(angles.local, cfg.beam_width, cfg.beam_depth),
                target,
            ))?,
            StrategyKind::AndOr => actor.add(Pathfinder::new(AndOr::new(angles.and_or), target))?,
            StrategyKind::Backtracking => actor.add(Pathfinder::new(
                Backtracking::new(angles.backtracking, cfg.backtrack_budget),
                target,
            ))?,
            StrategyKind::Learned => actor.add(Pathfinder::new(
                Learned::new(angles.learned, self.tile_size, cfg.policy_max_steps),
                target,
            ))?,
        };
        Ok(())
    }
}
