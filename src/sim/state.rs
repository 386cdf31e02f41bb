//! Game state and core simulation types
//!
//! Everything one run owns lives in `GameState`. Entity collections are
//! plain vectors with a liveness flag; dead entries are compacted once at
//! the end of each frame.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Hitbox;
use super::lanes::LaneGeometry;
use super::obstacle::{Obstacle, ObstacleKind};
use super::player::Player;
use super::spawner::{SpawnRequest, Spawner};
use super::weapon::{ActionOutcome, WeaponSystem};
use crate::config::RunnerConfig;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for a run to start
    Menu,
    /// Active gameplay
    Running,
    /// HP reached zero
    Dead,
}

/// Weapon identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponId {
    Bottle,
    Slipper,
    Pan,
}

impl WeaponId {
    pub fn as_str(self) -> &'static str {
        match self {
            WeaponId::Bottle => "BOTTLE",
            WeaponId::Slipper => "SLIPPER",
            WeaponId::Pan => "PAN",
        }
    }
}

/// Something the presentation layer may want to react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PickedUp { weapon: WeaponId },
    Thrown,
    Swung { weapon: WeaponId, hit: bool },
    WeaponBroken { weapon: WeaponId },
    Neutralized { id: u32, kind: ObstacleKind },
    Damaged { kind: ObstacleKind, amount: u32, hp: u32 },
    Slid,
    Stunned,
    PushedToCenter,
    RatCrossingCancelled { id: u32 },
    Died { distance_m: f32 },
}

/// Hitbox width of a pickup as a fraction of lane width
pub const PICKUP_HITBOX_WIDTH_RATIO: f32 = 0.52;
pub const PICKUP_HITBOX_HEIGHT: f32 = 30.0;
/// Hitbox width of a projectile as a fraction of lane width
pub const PROJECTILE_HITBOX_WIDTH_RATIO: f32 = 0.22;
pub const PROJECTILE_HITBOX_HEIGHT: f32 = 18.0;

/// A weapon lying in a lane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub weapon: WeaponId,
    pub lane: usize,
    pub pos: Vec2,
    pub dead: bool,
}

impl Pickup {
    pub fn new(id: u32, weapon: WeaponId, lane: usize, y: f32, lanes: &LaneGeometry) -> Self {
        Self {
            id,
            weapon,
            lane,
            pos: Vec2::new(lanes.lane_center_x(lane), y),
            dead: false,
        }
    }

    pub fn update(&mut self, dt: f32, speed: f32, view_h: f32, lanes: &LaneGeometry, config: &RunnerConfig) {
        if self.dead {
            return;
        }
        self.pos.y += speed * dt;
        self.pos.x = lanes.lane_center_x(self.lane);
        if self.pos.y > view_h + config.view.despawn_margin {
            self.dead = true;
        }
    }

    pub fn hitbox(&self, lanes: &LaneGeometry) -> Hitbox {
        Hitbox::centered(
            self.pos,
            Vec2::new(lanes.lane_width() * PICKUP_HITBOX_WIDTH_RATIO, PICKUP_HITBOX_HEIGHT),
        )
    }
}

/// A thrown bottle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub lane: usize,
    pub pos: Vec2,
    /// Negative y: travels against the world scroll
    pub vel: Vec2,
    pub remaining_travel: f32,
    pub dead: bool,
}

impl Projectile {
    pub fn update(&mut self, dt: f32, config: &RunnerConfig) {
        if self.dead {
            return;
        }
        let step = self.vel * dt;
        self.pos += step;
        self.remaining_travel -= step.length();

        if self.remaining_travel <= 0.0 || self.pos.y < -config.view.despawn_margin {
            self.dead = true;
        }
    }

    pub fn hitbox(&self, lanes: &LaneGeometry) -> Hitbox {
        Hitbox::centered(
            self.pos,
            Vec2::new(
                lanes.lane_width() * PROJECTILE_HITBOX_WIDTH_RATIO,
                PROJECTILE_HITBOX_HEIGHT,
            ),
        )
    }
}

/// Complete run state (deterministic given seed and inputs)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Injected tuning table
    pub config: RunnerConfig,
    /// Single randomness source for the whole run
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// World scroll speed (px/sec)
    pub speed: f32,
    /// HUD distance
    pub distance_m: f32,
    pub view_w: f32,
    pub view_h: f32,
    pub lanes: LaneGeometry,
    pub player: Player,
    pub weapons: WeaponSystem,
    pub spawner: Spawner,
    pub obstacles: Vec<Obstacle>,
    pub pickups: Vec<Pickup>,
    pub projectiles: Vec<Projectile>,
    /// Events raised during the most recent tick
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game state with the default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, RunnerConfig::default())
    }

    pub fn with_config(seed: u64, config: RunnerConfig) -> Self {
        let lanes = LaneGeometry::new(config.view.width, config.lanes.side_padding);
        let player = Player::new(&lanes, &config);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            time_ticks: 0,
            speed: config.run.speed_start,
            distance_m: 0.0,
            view_w: config.view.width,
            view_h: config.view.height,
            lanes,
            player,
            weapons: WeaponSystem::default(),
            spawner: Spawner::default(),
            obstacles: Vec::new(),
            pickups: Vec::new(),
            projectiles: Vec::new(),
            events: Vec::new(),
            config,
        }
    }

    /// Reset everything and begin a run with the lookahead already filled
    pub fn start_run(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.time_ticks = 0;
        self.speed = self.config.run.speed_start;
        self.distance_m = 0.0;
        self.player = Player::new(&self.lanes, &self.config);
        self.player.pos.y = self.player_y();
        self.weapons.clear();
        self.obstacles.clear();
        self.pickups.clear();
        self.projectiles.clear();
        self.events.clear();
        self.spawner.reset();

        let request = SpawnRequest {
            difficulty: 0.0,
            weapon_empty: true,
            view_h: self.view_h,
            lanes: &self.lanes,
            config: &self.config,
        };
        self.spawner.ensure_ahead(
            &request,
            &mut self.rng,
            &mut self.obstacles,
            &mut self.pickups,
        );

        self.phase = GamePhase::Running;
        log::info!(
            "Run started (seed {}, {} obstacles pre-spawned)",
            self.seed,
            self.obstacles.len()
        );
    }

    /// Player's vertical position for the current view
    pub fn player_y(&self) -> f32 {
        (self.view_h * self.config.view.player_y_ratio).floor()
    }

    /// Spawn difficulty in [0, 1]
    pub fn difficulty(&self) -> f32 {
        self.config.difficulty_for_speed(self.speed)
    }

    pub fn set_view_size(&mut self, width: f32, height: f32) {
        self.view_w = width;
        self.view_h = height;
        self.lanes.set_view_width(width);
        self.player.pos.y = self.player_y();
        self.player.pos.x = self.lanes.lane_center_x(self.player.lane);
    }

    /// Input: shift one lane left (-1) or right (+1)
    pub fn request_lane_change(&mut self, dir: i32) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        self.player.request_lane_change(dir, &self.config)
    }

    /// Input: use the held weapon
    pub fn use_weapon(&mut self) -> ActionOutcome {
        if self.phase != GamePhase::Running {
            return ActionOutcome::Ignored;
        }
        let outcome = self.weapons.action(
            &self.player,
            &mut self.obstacles,
            &mut self.projectiles,
            &self.config,
            self.view_h,
        );
        self.events.extend(outcome.events());
        outcome
    }

    /// Drop every entity flagged dead
    pub fn reap(&mut self) {
        self.obstacles.retain(|o| !o.dead);
        self.pickups.retain(|p| !p.dead);
        self.projectiles.retain(|p| !p.dead);
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::Dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_in_menu() {
        let state = GameState::new(1);
        assert_eq!(state.phase, GamePhase::Menu);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_start_run_fills_lookahead() {
        let mut state = GameState::new(7);
        state.start_run();
        assert_eq!(state.phase, GamePhase::Running);
        assert!(!state.obstacles.is_empty());
        let target = -state.view_h * state.config.view.spawn_ahead_screens;
        assert!(state.spawner.cursor_y() <= target);
    }

    #[test]
    fn test_inputs_ignored_outside_run() {
        let mut state = GameState::new(7);
        assert!(!state.request_lane_change(1));
        assert_eq!(state.use_weapon(), ActionOutcome::Ignored);
    }

    #[test]
    fn test_restart_is_reproducible() {
        let mut state = GameState::new(42);
        state.start_run();
        let first: Vec<_> = state.obstacles.iter().map(|o| (o.kind, o.lane, o.pos.y)).collect();
        state.obstacles.clear();
        state.start_run();
        let second: Vec<_> = state.obstacles.iter().map(|o| (o.kind, o.lane, o.pos.y)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_projectile_spends_travel_budget() {
        let config = RunnerConfig::default();
        let mut p = Projectile {
            lane: 1,
            pos: Vec2::new(180.0, 440.0),
            vel: Vec2::new(0.0, -420.0),
            remaining_travel: 100.0,
            dead: false,
        };
        p.update(0.2, &config);
        assert!(!p.dead);
        assert!((p.remaining_travel - 16.0).abs() < 1e-3);
        p.update(0.05, &config);
        assert!(p.dead);
    }

    #[test]
    fn test_pickup_dies_past_player() {
        let mut state = GameState::new(3);
        let mut pickup = Pickup::new(1, WeaponId::Pan, 0, state.view_h + 100.0, &state.lanes);
        pickup.update(0.1, 300.0, state.view_h, &state.lanes, &state.config);
        assert!(pickup.dead);
        state.pickups.push(pickup);
        state.reap();
        assert!(state.pickups.is_empty());
    }

    #[test]
    fn test_resize_moves_player() {
        let mut state = GameState::new(3);
        state.set_view_size(480.0, 800.0);
        assert_eq!(state.player.pos.y, (800.0_f32 * 0.72).floor());
        assert!((state.player.pos.x - 240.0).abs() < 1e-3);
    }
}
