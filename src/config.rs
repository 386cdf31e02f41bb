//! Runner tuning table
//!
//! Static per-kind and per-weapon constants injected into the simulation.
//! Read-only at run time; loadable from JSON with every field defaulted.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consts::INSTANT_DEATH_DAMAGE;
use crate::sim::{ObstacleKind, WeaponId};

/// View dimensions and world windowing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Logical width (portrait phone)
    pub width: f32,
    /// Logical height
    pub height: f32,
    /// Player's vertical position as a fraction of view height
    pub player_y_ratio: f32,
    /// How much world to keep generated ahead of the camera (in screens)
    pub spawn_ahead_screens: f32,
    /// Entities this far below the view bottom are reaped
    pub despawn_margin: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 360.0,
            height: 640.0,
            player_y_ratio: 0.72,
            spawn_ahead_screens: 2.2,
            despawn_margin: 120.0,
        }
    }
}

/// Lane layout and switching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    /// Padding from each view edge
    pub side_padding: f32,
    /// Lane-change tween duration
    pub switch_duration_ms: f32,
    /// Anti-spam cooldown started by every successful switch
    pub switch_cooldown_ms: f32,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            side_padding: 40.0,
            switch_duration_ms: 140.0,
            switch_cooldown_ms: 90.0,
        }
    }
}

/// World speed progression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// World scroll speed at run start (px/sec)
    pub speed_start: f32,
    /// Speed cap (px/sec)
    pub speed_max: f32,
    /// Speed gain per second (px/sec^2)
    pub speed_accel_per_sec: f32,
    /// Pixels per HUD meter
    pub px_per_meter: f32,
    /// Largest frame delta accepted in one step (seconds)
    pub max_frame_dt: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            speed_start: 180.0,
            speed_max: 520.0,
            speed_accel_per_sec: 3.5,
            px_per_meter: 42.0,
            max_frame_dt: 0.034,
        }
    }
}

/// Player vitals and status effect defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub hp_max: u32,
    /// Post-damage invincibility window
    pub iframe_ms: f32,
    /// Stun applied by hazards that don't specify their own
    pub stun_ms: f32,
    /// Slide applied by hazards that don't specify their own
    pub slide_ms: f32,
    /// Square hitbox edge
    pub hitbox_size: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            hp_max: 100,
            iframe_ms: 380.0,
            stun_ms: 450.0,
            slide_ms: 520.0,
            hitbox_size: 26.0,
        }
    }
}

/// Constants for one obstacle kind. Fields a kind doesn't use stay zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleSpec {
    pub killable: bool,
    pub damage: u32,
    /// Fraction of view height at which a dynamic hazard activates
    pub trigger_ratio: Option<f32>,
    /// RAT crossing duration
    pub move_duration_ms: f32,
    /// DOOR knocks the player into the center lane
    pub push_to_center: bool,
    pub stun_ms: f32,
    pub slide_ms: f32,
    /// HAND danger window
    pub active_ms: f32,
}

impl ObstacleSpec {
    pub fn is_instant_kill(&self) -> bool {
        self.damage >= INSTANT_DEATH_DAMAGE
    }
}

/// Per-kind obstacle table
///
/// A JSON entry for one kind is layered over that kind's tuned values, so
/// `{"hand": {"active_ms": 900.0}}` only moves the hand's window.
#[derive(Debug, Clone, Serialize)]
pub struct ObstacleTable {
    pub flies: ObstacleSpec,
    pub cockroaches: ObstacleSpec,
    pub trash: ObstacleSpec,
    pub wet: ObstacleSpec,
    pub rat: ObstacleSpec,
    pub door: ObstacleSpec,
    pub hand: ObstacleSpec,
}

impl ObstacleTable {
    pub fn get(&self, kind: ObstacleKind) -> &ObstacleSpec {
        match kind {
            ObstacleKind::Flies => &self.flies,
            ObstacleKind::Cockroaches => &self.cockroaches,
            ObstacleKind::Trash => &self.trash,
            ObstacleKind::Wet => &self.wet,
            ObstacleKind::Rat => &self.rat,
            ObstacleKind::Door => &self.door,
            ObstacleKind::Hand => &self.hand,
        }
    }
}

impl Default for ObstacleTable {
    fn default() -> Self {
        Self {
            flies: ObstacleSpec {
                killable: true,
                damage: 8,
                ..Default::default()
            },
            cockroaches: ObstacleSpec {
                killable: true,
                damage: 10,
                ..Default::default()
            },
            trash: ObstacleSpec {
                killable: false,
                damage: 12,
                ..Default::default()
            },
            wet: ObstacleSpec {
                killable: false,
                damage: 9,
                slide_ms: 520.0,
                ..Default::default()
            },
            rat: ObstacleSpec {
                killable: true,
                damage: 12,
                trigger_ratio: Some(0.33),
                move_duration_ms: 160.0,
                ..Default::default()
            },
            door: ObstacleSpec {
                killable: false,
                damage: 18,
                trigger_ratio: Some(0.50),
                push_to_center: true,
                stun_ms: 260.0,
                ..Default::default()
            },
            hand: ObstacleSpec {
                killable: true,
                damage: 99999,
                trigger_ratio: Some(0.40),
                active_ms: 650.0,
                ..Default::default()
            },
        }
    }
}

impl<'de> Deserialize<'de> for ObstacleTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Default, Deserialize)]
        #[serde(default)]
        struct Overrides {
            flies: Option<Value>,
            cockroaches: Option<Value>,
            trash: Option<Value>,
            wet: Option<Value>,
            rat: Option<Value>,
            door: Option<Value>,
            hand: Option<Value>,
        }

        let o = Overrides::deserialize(deserializer)?;
        let base = ObstacleTable::default();
        let merge = |spec: &ObstacleSpec, patch: Option<Value>| -> Result<ObstacleSpec, D::Error> {
            merge_spec(spec, patch).map_err(de::Error::custom)
        };
        Ok(Self {
            flies: merge(&base.flies, o.flies)?,
            cockroaches: merge(&base.cockroaches, o.cockroaches)?,
            trash: merge(&base.trash, o.trash)?,
            wet: merge(&base.wet, o.wet)?,
            rat: merge(&base.rat, o.rat)?,
            door: merge(&base.door, o.door)?,
            hand: merge(&base.hand, o.hand)?,
        })
    }
}

/// Overlay the fields present in `patch` onto `base`
fn merge_spec(base: &ObstacleSpec, patch: Option<Value>) -> serde_json::Result<ObstacleSpec> {
    let Some(patch) = patch else {
        return Ok(base.clone());
    };
    match (serde_json::to_value(base)?, patch) {
        (Value::Object(mut fields), Value::Object(patch)) => {
            fields.extend(patch);
            serde_json::from_value(Value::Object(fields))
        }
        // Not an object: let the spec's own deserializer report it
        (_, patch) => serde_json::from_value(patch),
    }
}

/// How a weapon attacks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Attack {
    /// Thrown forward; `travel_ratio` is a fraction of view height
    Projectile { travel_ratio: f32, speed: f32 },
    /// Hits the nearest killable hazard within `hit_range` ahead
    Melee { hit_range: f32, cooldown_ms: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub durability: u32,
    pub attack: Attack,
}

/// Weapon policy plus per-weapon table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTable {
    /// Pickups are only offered (and accepted) while the hand is empty
    pub spawn_only_if_empty_hand: bool,
    pub bottle: WeaponSpec,
    pub slipper: WeaponSpec,
    pub pan: WeaponSpec,
}

impl WeaponTable {
    pub fn get(&self, id: WeaponId) -> &WeaponSpec {
        match id {
            WeaponId::Bottle => &self.bottle,
            WeaponId::Slipper => &self.slipper,
            WeaponId::Pan => &self.pan,
        }
    }
}

impl Default for WeaponTable {
    fn default() -> Self {
        Self {
            spawn_only_if_empty_hand: true,
            bottle: WeaponSpec {
                durability: 1,
                attack: Attack::Projectile {
                    travel_ratio: 0.33,
                    speed: 420.0,
                },
            },
            slipper: WeaponSpec {
                durability: 3,
                attack: Attack::Melee {
                    hit_range: 110.0,
                    cooldown_ms: 220.0,
                },
            },
            pan: WeaponSpec {
                durability: 6,
                attack: Attack::Melee {
                    hit_range: 110.0,
                    cooldown_ms: 220.0,
                },
            },
        }
    }
}

/// Weapon pickup spawning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    /// Chance per pattern of offering a weapon
    pub spawn_chance_per_pattern: f32,
    /// Relative weights for which weapon is offered
    pub weights: Vec<(WeaponId, u32)>,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            spawn_chance_per_pattern: 0.28,
            weights: vec![
                (WeaponId::Bottle, 25),
                (WeaponId::Slipper, 40),
                (WeaponId::Pan, 35),
            ],
        }
    }
}

/// Pattern generation and fairness limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Height of one pattern row
    pub tile_h: f32,
    pub pattern_min_tiles: u32,
    pub pattern_max_tiles: u32,
    /// Obstacle count at difficulty 0
    pub obstacles_per_pattern_start: f32,
    /// Obstacle count at difficulty 1
    pub obstacles_per_pattern_max: f32,
    pub dynamic_chance_start: f32,
    pub dynamic_chance_max: f32,
    /// Minimum row distance between any two hard placements
    pub min_gap_tiles_between_hard: u32,
    /// Chance that a rolled HAND is demoted to a static kind
    pub hand_reroll_chance: f32,
    /// Chance a slot landing in the safe lane is moved elsewhere
    pub safe_lane_avoid_chance: f32,
    /// Chance to leave a row at one occupant instead of two
    pub row_pair_skip_chance: f32,
    /// Passes over the template slots before settling for a sparser pattern
    pub placement_passes: u32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            tile_h: 96.0,
            pattern_min_tiles: 4,
            pattern_max_tiles: 8,
            obstacles_per_pattern_start: 2.0,
            obstacles_per_pattern_max: 4.0,
            dynamic_chance_start: 0.18,
            dynamic_chance_max: 0.42,
            min_gap_tiles_between_hard: 2,
            hand_reroll_chance: 0.55,
            safe_lane_avoid_chance: 0.75,
            row_pair_skip_chance: 0.12,
            placement_passes: 3,
        }
    }
}

/// One animation sequence (frame count and timing)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimSpec {
    pub frames: u32,
    pub frame_ms: f32,
    pub looping: bool,
}

impl AnimSpec {
    pub const fn new(frames: u32, frame_ms: f32, looping: bool) -> Self {
        Self {
            frames,
            frame_ms,
            looping,
        }
    }
}

/// Animation timings consumed by the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimConfig {
    /// Fallback loop for kinds without a dedicated sequence
    pub idle: AnimSpec,
    pub flies: AnimSpec,
    pub cockroaches: AnimSpec,
    pub rat: AnimSpec,
    pub door_opening: AnimSpec,
    pub hand_active: AnimSpec,
}

impl Default for AnimConfig {
    fn default() -> Self {
        Self {
            idle: AnimSpec::new(1, 999.0, true),
            flies: AnimSpec::new(5, 100.0, true),
            cockroaches: AnimSpec::new(5, 110.0, true),
            rat: AnimSpec::new(2, 240.0, true),
            door_opening: AnimSpec::new(3, 90.0, false),
            hand_active: AnimSpec::new(3, 90.0, true),
        }
    }
}

/// Complete tuning table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub view: ViewConfig,
    pub lanes: LaneConfig,
    pub run: RunConfig,
    pub player: PlayerConfig,
    pub obstacles: ObstacleTable,
    pub weapons: WeaponTable,
    pub pickups: PickupConfig,
    pub spawner: SpawnerConfig,
    pub anim: AnimConfig,
}

impl RunnerConfig {
    /// Parse a (possibly partial) JSON tuning table
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let config = serde_json::from_str(json)?;
        log::info!("Loaded runner config from JSON");
        Ok(config)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Difficulty in [0, 1] from how far `speed` has climbed toward the cap
    pub fn difficulty_for_speed(&self, speed: f32) -> f32 {
        crate::inverse_lerp(self.run.speed_start, self.run.speed_max, speed)
    }

    /// Player's fixed vertical position in scroll space
    pub fn player_y(&self) -> f32 {
        (self.view.height * self.view.player_y_ratio).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_matches_kind_rules() {
        let table = ObstacleTable::default();
        for kind in ObstacleKind::ALL {
            let spec = table.get(kind);
            assert_eq!(spec.trigger_ratio.is_some(), kind.is_dynamic(), "{kind:?}");
        }
        assert!(table.get(ObstacleKind::Hand).is_instant_kill());
        assert!(!table.get(ObstacleKind::Door).is_instant_kill());
        assert!(!table.get(ObstacleKind::Trash).killable);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "player": { "hp_max": 50 }, "spawner": { "min_gap_tiles_between_hard": 3 } }"#;
        let config = RunnerConfig::from_json(json).unwrap();
        assert_eq!(config.player.hp_max, 50);
        assert_eq!(config.player.iframe_ms, 380.0);
        assert_eq!(config.spawner.min_gap_tiles_between_hard, 3);
        assert_eq!(config.spawner.tile_h, 96.0);
        assert_eq!(config.weapons.get(WeaponId::Pan).durability, 6);
    }

    #[test]
    fn test_partial_kind_override_keeps_tuned_fields() {
        let json = r#"{ "obstacles": { "hand": { "active_ms": 900.0 }, "door": { "stun_ms": 0.0 } } }"#;
        let config = RunnerConfig::from_json(json).unwrap();

        let hand = config.obstacles.get(ObstacleKind::Hand);
        assert_eq!(hand.active_ms, 900.0);
        assert!(hand.killable);
        assert_eq!(hand.trigger_ratio, Some(0.40));
        assert!(hand.damage >= INSTANT_DEATH_DAMAGE);

        let door = config.obstacles.get(ObstacleKind::Door);
        assert_eq!(door.stun_ms, 0.0);
        assert!(door.push_to_center);
        assert_eq!(door.damage, 18);

        // Untouched kinds keep everything
        assert_eq!(config.obstacles.get(ObstacleKind::Rat).move_duration_ms, 160.0);
    }

    #[test]
    fn test_kind_override_can_clear_trigger() {
        let json = r#"{ "obstacles": { "rat": { "trigger_ratio": null } } }"#;
        let config = RunnerConfig::from_json(json).unwrap();
        let rat = config.obstacles.get(ObstacleKind::Rat);
        assert_eq!(rat.trigger_ratio, None);
        assert_eq!(rat.damage, 12);
    }

    #[test]
    fn test_malformed_kind_override_is_an_error() {
        assert!(RunnerConfig::from_json(r#"{ "obstacles": { "hand": 3 } }"#).is_err());
        assert!(RunnerConfig::from_json(r#"{ "obstacles": { "hand": { "damage": -1 } } }"#).is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_weapon_attack() {
        let config = RunnerConfig::default();
        let json = config.to_json().unwrap();
        let back = RunnerConfig::from_json(&json).unwrap();
        assert_eq!(
            back.weapons.get(WeaponId::Bottle).attack,
            config.weapons.get(WeaponId::Bottle).attack
        );
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(RunnerConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_difficulty_for_speed() {
        let config = RunnerConfig::default();
        assert_eq!(config.difficulty_for_speed(180.0), 0.0);
        assert!((config.difficulty_for_speed(350.0) - 0.5).abs() < 1e-5);
        assert_eq!(config.difficulty_for_speed(9000.0), 1.0);
    }
}
