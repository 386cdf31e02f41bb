//! Obstacle entities and their per-kind behavior state machines
//!
//! Static kinds (flies, cockroaches, trash, wet floor) just scroll. Dynamic
//! kinds (rat, door, hand) activate once when the player gets within their
//! trigger distance and then run a small state machine.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::anim::Animator;
use super::collision::Hitbox;
use super::lanes::LaneGeometry;
use crate::config::RunnerConfig;
use crate::ease_out_cubic;

/// Hitbox width as a fraction of lane width
pub const OBSTACLE_HITBOX_WIDTH_RATIO: f32 = 0.82;
/// Hitbox height in pixels
pub const OBSTACLE_HITBOX_HEIGHT: f32 = 44.0;

/// Closed set of hazard kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Flies,
    Cockroaches,
    Trash,
    Wet,
    Rat,
    Door,
    Hand,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 7] = [
        ObstacleKind::Flies,
        ObstacleKind::Cockroaches,
        ObstacleKind::Trash,
        ObstacleKind::Wet,
        ObstacleKind::Rat,
        ObstacleKind::Door,
        ObstacleKind::Hand,
    ];

    /// Trigger-activated hazards
    pub fn is_dynamic(self) -> bool {
        matches!(self, ObstacleKind::Rat | ObstacleKind::Door | ObstacleKind::Hand)
    }

    /// Kinds subject to the row-gap fairness rule
    pub fn is_hard(self) -> bool {
        matches!(self, ObstacleKind::Wet | ObstacleKind::Door | ObstacleKind::Hand)
    }

    /// Kinds that may never be placed in the center lane
    pub fn side_lanes_only(self) -> bool {
        matches!(self, ObstacleKind::Door | ObstacleKind::Hand)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObstacleKind::Flies => "FLIES",
            ObstacleKind::Cockroaches => "COCKROACHES",
            ObstacleKind::Trash => "TRASH",
            ObstacleKind::Wet => "WET",
            ObstacleKind::Rat => "RAT",
            ObstacleKind::Door => "DOOR",
            ObstacleKind::Hand => "HAND",
        }
    }
}

/// An in-flight rat crossing between two lanes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatCrossing {
    pub from: usize,
    pub to: usize,
    /// Linear progress in [0, 1]; eased when mapped to x
    pub progress: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorState {
    Closed,
    Opening,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HandState {
    /// Invisible and not collidable
    Hidden,
    /// Dangerous for the rest of the window
    Active { remaining_ms: f32 },
    /// Spent; never reactivates
    Inactive,
}

/// Kind-specific state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Static,
    Rat {
        /// -1 = left, +1 = right; fixed at spawn
        facing: i32,
        /// `None` while stationary
        crossing: Option<RatCrossing>,
    },
    Door {
        state: DoorState,
    },
    Hand {
        state: HandState,
    },
}

/// Per-frame inputs every obstacle update needs
#[derive(Debug, Clone, Copy)]
pub struct UpdateEnv<'a> {
    pub dt: f32,
    /// World scroll speed (px/sec)
    pub speed: f32,
    pub player_y: f32,
    pub view_h: f32,
    pub lanes: &'a LaneGeometry,
    pub config: &'a RunnerConfig,
}

/// A hazard in the corridor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    /// Logical lane (a crossing rat keeps its source lane until it arrives)
    pub lane: usize,
    /// Center position; `y` is scroll space, growing toward the player
    pub pos: Vec2,
    pub killable: bool,
    pub triggered: bool,
    pub neutralized: bool,
    pub dead: bool,
    pub behavior: Behavior,
    anim: Animator,
}

impl Obstacle {
    pub fn new(
        id: u32,
        kind: ObstacleKind,
        lane: usize,
        y: f32,
        facing: i32,
        lanes: &LaneGeometry,
        config: &RunnerConfig,
    ) -> Self {
        let lane = lane.min(crate::consts::LANE_COUNT - 1);
        let behavior = match kind {
            ObstacleKind::Rat => Behavior::Rat {
                facing: if facing < 0 { -1 } else { 1 },
                crossing: None,
            },
            ObstacleKind::Door => Behavior::Door {
                state: DoorState::Closed,
            },
            ObstacleKind::Hand => Behavior::Hand {
                state: HandState::Hidden,
            },
            _ => Behavior::Static,
        };
        let anim_spec = match kind {
            ObstacleKind::Flies => config.anim.flies,
            ObstacleKind::Cockroaches => config.anim.cockroaches,
            ObstacleKind::Rat => config.anim.rat,
            _ => config.anim.idle,
        };

        Self {
            id,
            kind,
            lane,
            pos: Vec2::new(lanes.lane_center_x(lane), y),
            killable: config.obstacles.get(kind).killable,
            triggered: false,
            neutralized: false,
            dead: false,
            behavior,
            anim: Animator::new(anim_spec),
        }
    }

    /// Vertical distance still to cover before reaching the player
    pub fn distance_to_player(&self, player_y: f32) -> f32 {
        player_y - self.pos.y
    }

    /// Activate a dynamic hazard once the player is close enough
    pub fn try_trigger(&mut self, env: &UpdateEnv) {
        if self.triggered {
            return;
        }
        let Some(ratio) = env.config.obstacles.get(self.kind).trigger_ratio else {
            return;
        };
        if self.distance_to_player(env.player_y) > env.view_h * ratio {
            return;
        }

        self.triggered = true;
        match &mut self.behavior {
            Behavior::Rat { facing, crossing } => {
                let to = LaneGeometry::shifted(self.lane, *facing);
                *crossing = Some(RatCrossing {
                    from: self.lane,
                    to,
                    progress: 0.0,
                });
            }
            Behavior::Door { state } => {
                *state = DoorState::Opening;
                self.anim.play(env.config.anim.door_opening);
            }
            Behavior::Hand { state } => {
                *state = HandState::Active {
                    remaining_ms: env.config.obstacles.hand.active_ms,
                };
                self.anim.play(env.config.anim.hand_active);
            }
            Behavior::Static => {}
        }
    }

    /// Advance position, trigger, and internal state by one frame
    pub fn update(&mut self, env: &UpdateEnv) {
        if self.dead {
            return;
        }

        self.pos.y += env.speed * env.dt;
        self.try_trigger(env);
        self.anim.update(env.dt);

        let dt_ms = env.dt * 1000.0;
        let mut x = env.lanes.lane_center_x(self.lane);

        match &mut self.behavior {
            Behavior::Rat { crossing, .. } => {
                if let Some(c) = crossing {
                    let duration = env.config.obstacles.rat.move_duration_ms;
                    c.progress = if duration > 0.0 {
                        (c.progress + dt_ms / duration).min(1.0)
                    } else {
                        1.0
                    };
                    let x0 = env.lanes.lane_center_x(c.from);
                    let x1 = env.lanes.lane_center_x(c.to);
                    x = x0 + (x1 - x0) * ease_out_cubic(c.progress);

                    if c.progress >= 1.0 {
                        self.lane = c.to;
                        x = env.lanes.lane_center_x(self.lane);
                        *crossing = None;
                    }
                }
            }
            Behavior::Hand { state } => {
                if let HandState::Active { remaining_ms } = state {
                    *remaining_ms -= dt_ms;
                    if *remaining_ms <= 0.0 {
                        *state = HandState::Inactive;
                        self.anim.play(env.config.anim.idle);
                    }
                }
            }
            Behavior::Door { state } => {
                if *state == DoorState::Opening && self.anim.finished() {
                    *state = DoorState::Open;
                    self.anim.play(env.config.anim.idle);
                }
            }
            Behavior::Static => {}
        }
        self.pos.x = x;

        // Past the player beyond the dead zone, regardless of state
        if self.pos.y > env.view_h + env.config.view.despawn_margin {
            self.dead = true;
        }
    }

    /// Permanently disable a killable hazard. Returns whether anything changed.
    pub fn neutralize(&mut self) -> bool {
        if !self.killable || self.neutralized {
            return false;
        }
        self.neutralized = true;
        self.dead = true;
        true
    }

    /// Still in play and not hidden
    pub fn is_collidable(&self) -> bool {
        if self.dead || self.neutralized {
            return false;
        }
        !matches!(
            self.behavior,
            Behavior::Hand {
                state: HandState::Hidden
            }
        )
    }

    /// Whether touching this hazard right now has any effect on the player
    pub fn harms_player(&self) -> bool {
        match self.behavior {
            Behavior::Hand { state } => matches!(state, HandState::Active { .. }),
            _ => true,
        }
    }

    /// Source and destination of a crossing still in progress
    pub fn active_crossing(&self) -> Option<RatCrossing> {
        match self.behavior {
            Behavior::Rat {
                crossing: Some(c), ..
            } if c.progress < 1.0 => Some(c),
            _ => None,
        }
    }

    /// Abort a rat crossing: snap back to the source lane, crossing complete
    pub fn cancel_crossing(&mut self, lanes: &LaneGeometry) -> bool {
        let Behavior::Rat { crossing, .. } = &mut self.behavior else {
            return false;
        };
        let Some(c) = crossing.take() else {
            return false;
        };
        self.lane = c.from;
        self.pos.x = lanes.lane_center_x(c.from);
        true
    }

    pub fn hitbox(&self, lanes: &LaneGeometry) -> Hitbox {
        Hitbox::centered(
            self.pos,
            Vec2::new(
                lanes.lane_width() * OBSTACLE_HITBOX_WIDTH_RATIO,
                OBSTACLE_HITBOX_HEIGHT,
            ),
        )
    }

    /// Current animation step for the render layer
    pub fn anim_step(&self) -> u32 {
        self.anim.step()
    }

    pub fn door_state(&self) -> Option<DoorState> {
        match self.behavior {
            Behavior::Door { state } => Some(state),
            _ => None,
        }
    }

    pub fn hand_state(&self) -> Option<HandState> {
        match self.behavior {
            Behavior::Hand { state } => Some(state),
            _ => None,
        }
    }
}
