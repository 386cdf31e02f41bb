//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Clamped timestep only
//! - Seeded RNG only
//! - Fixed per-frame subsystem order
//! - No rendering or platform dependencies

pub mod anim;
pub mod collision;
pub mod lanes;
pub mod obstacle;
pub mod player;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod weapon;

pub use anim::Animator;
pub use collision::{Hitbox, resolve_collisions};
pub use lanes::LaneGeometry;
pub use obstacle::{Behavior, DoorState, HandState, Obstacle, ObstacleKind, RatCrossing, UpdateEnv};
pub use player::{LaneTransition, Player};
pub use spawner::{
    PATTERN_LIBRARY, PatternPlan, PatternSlot, PatternTemplate, Placement, SpawnRequest, Spawner,
    generate_placements,
};
pub use state::{GameEvent, GamePhase, GameState, Pickup, Projectile, WeaponId};
pub use tick::{TickInput, autopilot_input, tick};
pub use weapon::{ActionOutcome, HeldWeapon, WeaponSystem};
