//! Player controller: lane-change tweening and status timers

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Hitbox;
use super::lanes::LaneGeometry;
use crate::config::RunnerConfig;
use crate::consts::CENTER_LANE;
use crate::ease_out_cubic;

/// Horizontal tween between two lane centers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneTransition {
    pub from: usize,
    pub to: usize,
    /// Linear progress in [0, 1]; 1 means settled
    pub progress: f32,
}

impl LaneTransition {
    pub fn settled(lane: usize) -> Self {
        Self {
            from: lane,
            to: lane,
            progress: 1.0,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.progress < 1.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Logical lane; already the destination while a tween is in flight
    pub lane: usize,
    pub transition: LaneTransition,
    pub pos: Vec2,
    pub hp: u32,
    pub invincibility_ms: f32,
    pub stun_ms: f32,
    pub slide_ms: f32,
    pub switch_cooldown_ms: f32,
}

impl Player {
    pub fn new(lanes: &LaneGeometry, config: &RunnerConfig) -> Self {
        Self {
            lane: CENTER_LANE,
            transition: LaneTransition::settled(CENTER_LANE),
            pos: Vec2::new(lanes.lane_center_x(CENTER_LANE), config.player_y()),
            hp: config.player.hp_max,
            invincibility_ms: 0.0,
            stun_ms: 0.0,
            slide_ms: 0.0,
            switch_cooldown_ms: 0.0,
        }
    }

    pub fn can_change_lane(&self) -> bool {
        self.stun_ms <= 0.0 && self.slide_ms <= 0.0 && self.switch_cooldown_ms <= 0.0
    }

    /// Start a lane change of `dir` steps. Rejected with no state change while
    /// stunned, sliding, on cooldown, or already against the wall.
    pub fn request_lane_change(&mut self, dir: i32, config: &RunnerConfig) -> bool {
        if !self.can_change_lane() {
            return false;
        }
        let next = LaneGeometry::shifted(self.lane, dir);
        if next == self.lane {
            return false;
        }

        self.transition = LaneTransition {
            from: self.lane,
            to: next,
            progress: 0.0,
        };
        self.lane = next;
        self.switch_cooldown_ms = config.lanes.switch_cooldown_ms;
        true
    }

    /// Teleport into a lane, cancelling any tween
    pub fn snap_to_lane(&mut self, lane: usize, lanes: &LaneGeometry) {
        let lane = lane.min(crate::consts::LANE_COUNT - 1);
        self.lane = lane;
        self.transition = LaneTransition::settled(lane);
        self.pos.x = lanes.lane_center_x(lane);
    }

    // Status timers only ever get raised, never shortened
    pub fn apply_stun(&mut self, ms: f32) {
        self.stun_ms = self.stun_ms.max(ms);
    }

    pub fn apply_slide(&mut self, ms: f32) {
        self.slide_ms = self.slide_ms.max(ms);
    }

    pub fn apply_invincibility(&mut self, ms: f32) {
        self.invincibility_ms = self.invincibility_ms.max(ms);
    }

    pub fn update(&mut self, dt: f32, lanes: &LaneGeometry, config: &RunnerConfig) {
        let dt_ms = dt * 1000.0;

        self.switch_cooldown_ms = (self.switch_cooldown_ms - dt_ms).max(0.0);
        self.stun_ms = (self.stun_ms - dt_ms).max(0.0);
        self.slide_ms = (self.slide_ms - dt_ms).max(0.0);
        self.invincibility_ms = (self.invincibility_ms - dt_ms).max(0.0);

        if self.transition.in_flight() {
            let duration = config.lanes.switch_duration_ms;
            self.transition.progress = if duration > 0.0 {
                (self.transition.progress + dt_ms / duration).min(1.0)
            } else {
                1.0
            };
            let x0 = lanes.lane_center_x(self.transition.from);
            let x1 = lanes.lane_center_x(self.transition.to);
            self.pos.x = if self.transition.in_flight() {
                x0 + (x1 - x0) * ease_out_cubic(self.transition.progress)
            } else {
                x1
            };
        } else {
            self.pos.x = lanes.lane_center_x(self.lane);
        }
    }

    /// Tweened horizontal position for drawing
    pub fn x(&self) -> f32 {
        self.pos.x
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_ms > 0.0
    }

    pub fn is_sliding(&self) -> bool {
        self.slide_ms > 0.0
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn hitbox(&self, config: &RunnerConfig) -> Hitbox {
        Hitbox::centered(self.pos, Vec2::splat(config.player.hitbox_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (LaneGeometry, RunnerConfig, Player) {
        let config = RunnerConfig::default();
        let lanes = LaneGeometry::new(config.view.width, config.lanes.side_padding);
        let player = Player::new(&lanes, &config);
        (lanes, config, player)
    }

    #[test]
    fn test_starts_centered() {
        let (lanes, config, player) = setup();
        assert_eq!(player.lane, CENTER_LANE);
        assert_eq!(player.hp, 100);
        assert_eq!(player.pos.y, config.player_y());
        assert_eq!(player.pos.x, lanes.lane_center_x(CENTER_LANE));
    }

    #[test]
    fn test_lane_change_tweens_and_settles() {
        let (lanes, config, mut player) = setup();
        assert!(player.request_lane_change(-1, &config));
        assert_eq!(player.lane, 0);
        assert!(player.transition.in_flight());

        player.update(0.07, &lanes, &config);
        let mid = player.x();
        assert!(mid < lanes.lane_center_x(1) && mid > lanes.lane_center_x(0));

        player.update(0.1, &lanes, &config);
        assert!(!player.transition.in_flight());
        assert_eq!(player.lane, player.transition.to);
        assert_eq!(player.pos.x, lanes.lane_center_x(0));
    }

    #[test]
    fn test_cooldown_blocks_spam() {
        let (lanes, config, mut player) = setup();
        assert!(player.request_lane_change(1, &config));
        assert!(!player.request_lane_change(-1, &config));
        assert_eq!(player.lane, 2);

        player.update(0.1, &lanes, &config);
        assert!(player.request_lane_change(-1, &config));
        assert_eq!(player.transition.from, 2);
        assert_eq!(player.transition.to, 1);
        assert_eq!(player.transition.progress, 0.0);
    }

    #[test]
    fn test_wall_rejects_without_cooldown() {
        let (_lanes, config, mut player) = setup();
        assert!(player.request_lane_change(1, &config));
        player.switch_cooldown_ms = 0.0;
        assert!(!player.request_lane_change(1, &config));
        assert_eq!(player.switch_cooldown_ms, 0.0);
    }

    #[test]
    fn test_slide_and_stun_block_lane_change() {
        let (lanes, config, mut player) = setup();
        player.apply_slide(100.0);
        assert!(!player.request_lane_change(1, &config));
        assert_eq!(player.lane, 1);

        player.update(0.11, &lanes, &config);
        player.apply_stun(50.0);
        assert!(!player.request_lane_change(1, &config));

        player.update(0.06, &lanes, &config);
        assert!(player.request_lane_change(1, &config));
    }

    #[test]
    fn test_status_raise_to_at_least() {
        let (lanes, config, mut player) = setup();
        player.apply_stun(400.0);
        player.apply_stun(100.0);
        assert_eq!(player.stun_ms, 400.0);

        player.update(0.5, &lanes, &config);
        assert_eq!(player.stun_ms, 0.0);
    }

    #[test]
    fn test_snap_cancels_tween() {
        let (lanes, config, mut player) = setup();
        player.request_lane_change(-1, &config);
        player.snap_to_lane(CENTER_LANE, &lanes);
        assert_eq!(player.lane, CENTER_LANE);
        assert!(!player.transition.in_flight());
        assert_eq!(player.pos.x, lanes.lane_center_x(CENTER_LANE));
    }
}
