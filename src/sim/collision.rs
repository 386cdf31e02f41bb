//! Collision detection and effect resolution
//!
//! Runs once per frame after every entity has moved. The check order is
//! fixed: pickups, projectiles, rat lane conflicts, then player contact.
//! Later stages rely on earlier ones having already settled.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::lanes::LaneGeometry;
use super::obstacle::{Obstacle, ObstacleKind};
use super::player::Player;
use super::state::{GameEvent, GameState};
use crate::config::RunnerConfig;
use crate::consts::CENTER_LANE;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub min: Vec2,
    pub max: Vec2,
}

impl Hitbox {
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Strict overlap; touching edges don't count
    pub fn overlaps(&self, other: &Hitbox) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Vertical overlap only
    pub fn overlaps_y(&self, other: &Hitbox) -> bool {
        self.min.y < other.max.y && self.max.y > other.min.y
    }
}

/// Apply damage unless invincible; opens a fresh invincibility window.
/// Returns whether HP changed hands.
pub fn apply_damage(player: &mut Player, amount: u32, config: &RunnerConfig) -> bool {
    if player.invincibility_ms > 0.0 {
        return false;
    }
    player.hp = player.hp.saturating_sub(amount);
    player.apply_invincibility(config.player.iframe_ms);
    true
}

/// Resolve every overlap for this frame, in order
pub fn resolve_collisions(state: &mut GameState) {
    resolve_pickups(state);
    resolve_projectiles(state);
    resolve_rat_conflicts(state);
    resolve_player_obstacles(state);
}

/// Pickup vs player: same lane and overlapping
pub fn resolve_pickups(state: &mut GameState) {
    let player_box = state.player.hitbox(&state.config);
    for pickup in state.pickups.iter_mut() {
        if pickup.dead || pickup.lane != state.player.lane {
            continue;
        }
        if !player_box.overlaps(&pickup.hitbox(&state.lanes)) {
            continue;
        }
        if state.weapons.try_pickup(pickup.weapon, &state.config) {
            pickup.dead = true;
            state.events.push(GameEvent::PickedUp {
                weapon: pickup.weapon,
            });
        }
    }
}

/// Projectile vs obstacle: first killable hit in the same lane wins
pub fn resolve_projectiles(state: &mut GameState) {
    if state.projectiles.is_empty() || state.obstacles.is_empty() {
        return;
    }

    for projectile in state.projectiles.iter_mut() {
        if projectile.dead {
            continue;
        }
        let shot = projectile.hitbox(&state.lanes);

        let target = state.obstacles.iter_mut().find(|o| {
            o.is_collidable()
                && o.killable
                && o.lane == projectile.lane
                && shot.overlaps(&o.hitbox(&state.lanes))
        });
        if let Some(obstacle) = target {
            if obstacle.neutralize() {
                state.events.push(GameEvent::Neutralized {
                    id: obstacle.id,
                    kind: obstacle.kind,
                });
            }
            projectile.dead = true;
        }
    }
}

/// Cancel any rat crossing whose destination lane is blocked at its row.
/// Checked every frame while a crossing is in progress.
pub fn resolve_rat_conflicts(state: &mut GameState) {
    let lanes = &state.lanes;
    for i in 0..state.obstacles.len() {
        let Some(crossing) = state.obstacles[i].active_crossing() else {
            continue;
        };
        if state.obstacles[i].dead || crossing.to == crossing.from {
            continue;
        }

        // The rat still sits in its source lane, so it never blocks itself
        let rat_box = state.obstacles[i].hitbox(lanes);
        let blocked = lane_blocked_at(&state.obstacles, crossing.to, &rat_box, lanes);

        if blocked && state.obstacles[i].cancel_crossing(lanes) {
            let id = state.obstacles[i].id;
            log::trace!("Rat #{} crossing into lane {} cancelled", id, crossing.to);
            state.events.push(GameEvent::RatCrossingCancelled { id });
        }
    }
}

/// Player vs obstacle contact effects
pub fn resolve_player_obstacles(state: &mut GameState) {
    let GameState {
        config,
        lanes,
        player,
        obstacles,
        events,
        ..
    } = state;

    // Contacts are judged against where the player stood at the start of
    // resolution; a push to center doesn't touch the new lane this frame
    let lane = player.lane;
    let player_box = player.hitbox(config);

    for obstacle in obstacles.iter() {
        if !obstacle.is_collidable() || !obstacle.harms_player() {
            continue;
        }
        if obstacle.lane != lane {
            continue;
        }
        if !player_box.overlaps(&obstacle.hitbox(lanes)) {
            continue;
        }

        let spec = config.obstacles.get(obstacle.kind);
        match obstacle.kind {
            ObstacleKind::Hand => {
                kill(player, obstacle.kind, events);
                return;
            }
            ObstacleKind::Wet => {
                damage(player, obstacle.kind, spec.damage, config, events);
                let slide = if spec.slide_ms > 0.0 {
                    spec.slide_ms
                } else {
                    config.player.slide_ms
                };
                player.apply_slide(slide);
                events.push(GameEvent::Slid);
            }
            ObstacleKind::Door => {
                damage(player, obstacle.kind, spec.damage, config, events);
                if spec.push_to_center {
                    player.snap_to_lane(CENTER_LANE, lanes);
                    events.push(GameEvent::PushedToCenter);
                }
                if spec.stun_ms > 0.0 {
                    player.apply_stun(spec.stun_ms);
                    events.push(GameEvent::Stunned);
                }
            }
            _ if spec.is_instant_kill() => {
                kill(player, obstacle.kind, events);
                return;
            }
            _ => {
                // Static hazards stay put; only weapons remove them
                damage(player, obstacle.kind, spec.damage, config, events);
            }
        }
    }
}

fn damage(
    player: &mut Player,
    kind: ObstacleKind,
    amount: u32,
    config: &RunnerConfig,
    events: &mut Vec<GameEvent>,
) {
    if apply_damage(player, amount, config) {
        events.push(GameEvent::Damaged {
            kind,
            amount,
            hp: player.hp,
        });
    }
}

fn kill(player: &mut Player, kind: ObstacleKind, events: &mut Vec<GameEvent>) {
    let amount = player.hp;
    player.hp = 0;
    events.push(GameEvent::Damaged { kind, amount, hp: 0 });
}

/// Any live obstacle in `lane` whose hitbox overlaps `hitbox` vertically
pub fn lane_blocked_at(
    obstacles: &[Obstacle],
    lane: usize,
    hitbox: &Hitbox,
    lanes: &LaneGeometry,
) -> bool {
    obstacles.iter().any(|o| {
        !o.dead && !o.neutralized && o.lane == lane && hitbox.overlaps_y(&o.hitbox(lanes))
    })
}
