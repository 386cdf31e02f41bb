//! Per-frame simulation step
//!
//! Advances one run by a clamped time delta in a fixed order: inputs,
//! speed and distance, spawner lookahead, entity updates, collisions, reap.

use serde::{Deserialize, Serialize};

use super::collision::resolve_collisions;
use super::obstacle::{HandState, Obstacle, UpdateEnv};
use super::spawner::SpawnRequest;
use super::state::{GameEvent, GamePhase, GameState};
use crate::config::Attack;
use crate::consts::LANE_COUNT;

/// How far ahead the autopilot looks for hazards (px)
const AUTOPILOT_LOOK_AHEAD: f32 = 170.0;
/// Hazards this close behind the player still count as in the way
const AUTOPILOT_BEHIND_MARGIN: f32 = 30.0;

/// Discrete inputs for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub lane_left: bool,
    pub lane_right: bool,
    pub use_weapon: bool,
    /// Demo mode: the simulation plays itself
    pub autopilot: bool,
}

/// Advance the run by one frame
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase != GamePhase::Running {
        return;
    }

    // Large gaps (tab suspended, debugger) become one capped step
    let dt = dt.clamp(0.0, state.config.run.max_frame_dt);
    state.events.clear();

    let input = if input.autopilot {
        autopilot_input(state)
    } else {
        *input
    };

    if input.lane_left != input.lane_right {
        state.request_lane_change(if input.lane_left { -1 } else { 1 });
    }
    if input.use_weapon {
        state.use_weapon();
    }

    // Speed and distance
    let run = &state.config.run;
    state.speed = (state.speed + run.speed_accel_per_sec * dt).min(run.speed_max);
    state.distance_m += state.speed * dt / run.px_per_meter.max(f32::EPSILON);

    state.player.update(dt, &state.lanes, &state.config);
    state.weapons.update(dt);

    // Keep the corridor generated ahead of the player
    state.spawner.advance(dt, state.speed);
    let request = SpawnRequest {
        difficulty: state.difficulty(),
        weapon_empty: !state.weapons.has_weapon(),
        view_h: state.view_h,
        lanes: &state.lanes,
        config: &state.config,
    };
    state.spawner.ensure_ahead(
        &request,
        &mut state.rng,
        &mut state.obstacles,
        &mut state.pickups,
    );

    // Entities
    let env = UpdateEnv {
        dt,
        speed: state.speed,
        player_y: state.player.pos.y,
        view_h: state.view_h,
        lanes: &state.lanes,
        config: &state.config,
    };
    for obstacle in state.obstacles.iter_mut() {
        obstacle.update(&env);
    }
    for pickup in state.pickups.iter_mut() {
        pickup.update(dt, state.speed, state.view_h, &state.lanes, &state.config);
    }
    for projectile in state.projectiles.iter_mut() {
        projectile.update(dt, &state.config);
    }

    resolve_collisions(state);
    state.reap();

    if !state.player.is_alive() {
        state.phase = GamePhase::Dead;
        state.events.push(GameEvent::Died {
            distance_m: state.distance_m,
        });
        log::info!(
            "Run over after {:.0} m (seed {}, {} ticks)",
            state.distance_m,
            state.seed,
            state.time_ticks
        );
    }

    state.time_ticks += 1;
}

/// Whether an obstacle is worth avoiding
fn is_threat(o: &Obstacle) -> bool {
    !o.dead && !o.neutralized && o.hand_state() != Some(HandState::Inactive)
}

/// Lanes an obstacle occupies or is about to
fn occupies(o: &Obstacle, lane: usize) -> bool {
    o.lane == lane || o.active_crossing().is_some_and(|c| c.to == lane)
}

/// Distance to the nearest threat ahead in `lane`, or infinity if clear
fn nearest_threat(state: &GameState, lane: usize) -> f32 {
    let player_y = state.player.pos.y;
    state
        .obstacles
        .iter()
        .filter(|o| is_threat(o) && occupies(o, lane))
        .map(|o| player_y - o.pos.y)
        .filter(|&d| d >= -AUTOPILOT_BEHIND_MARGIN)
        .fold(f32::INFINITY, f32::min)
}

/// Simple demo driver: swing at whatever is in reach, otherwise dodge
/// toward the adjacent lane with the most room.
pub fn autopilot_input(state: &GameState) -> TickInput {
    let mut input = TickInput::default();
    let player = &state.player;
    let lane = player.lane;

    let armed = state.weapons.held().filter(|_| state.weapons.cooldown_ms() <= 0.0);
    if let Some(held) = armed {
        let reach = match state.config.weapons.get(held.id).attack {
            Attack::Melee { hit_range, .. } => hit_range,
            Attack::Projectile { .. } => AUTOPILOT_LOOK_AHEAD,
        };
        input.use_weapon = state.obstacles.iter().any(|o| {
            is_threat(o)
                && o.killable
                && o.lane == lane
                && o.pos.y < player.pos.y
                && player.pos.y - o.pos.y <= reach
        });
        if input.use_weapon {
            return input;
        }
    }

    let here = nearest_threat(state, lane);
    if here > AUTOPILOT_LOOK_AHEAD || !player.can_change_lane() {
        return input;
    }

    let best = [lane.checked_sub(1), (lane + 1 < LANE_COUNT).then_some(lane + 1)]
        .into_iter()
        .flatten()
        .map(|l| (l, nearest_threat(state, l)))
        .filter(|&(_, d)| d > here)
        .max_by(|a, b| a.1.total_cmp(&b.1));

    if let Some((target, _)) = best {
        input.lane_left = target < lane;
        input.lane_right = target > lane;
    }
    input
}
