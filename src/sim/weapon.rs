//! Weapon system: held weapon, durability, cooldown, melee and thrown attacks

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::obstacle::{Obstacle, ObstacleKind};
use super::player::Player;
use super::state::{GameEvent, Projectile, WeaponId};
use crate::config::{Attack, RunnerConfig};

/// Bottles leave from slightly in front of the player
const THROW_OFFSET_Y: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldWeapon {
    pub id: WeaponId,
    pub durability: u32,
}

/// Result of one "use weapon" input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// Unarmed or still cooling down
    Ignored,
    /// A bottle left the hand
    Thrown,
    Swung {
        weapon: WeaponId,
        /// Id and kind of the obstacle neutralized by the swing, if any
        hit: Option<(u32, ObstacleKind)>,
        /// Durability ran out with this swing
        broke: bool,
    },
}

impl ActionOutcome {
    pub fn events(&self) -> Vec<GameEvent> {
        match *self {
            ActionOutcome::Ignored => Vec::new(),
            ActionOutcome::Thrown => vec![GameEvent::Thrown],
            ActionOutcome::Swung { weapon, hit, broke } => {
                let mut events = Vec::with_capacity(3);
                if let Some((id, kind)) = hit {
                    events.push(GameEvent::Neutralized { id, kind });
                }
                events.push(GameEvent::Swung {
                    weapon,
                    hit: hit.is_some(),
                });
                if broke {
                    events.push(GameEvent::WeaponBroken { weapon });
                }
                events
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponSystem {
    held: Option<HeldWeapon>,
    cooldown_ms: f32,
}

impl WeaponSystem {
    pub fn held(&self) -> Option<HeldWeapon> {
        self.held
    }

    pub fn has_weapon(&self) -> bool {
        self.held.is_some()
    }

    pub fn cooldown_ms(&self) -> f32 {
        self.cooldown_ms
    }

    pub fn clear(&mut self) {
        self.held = None;
        self.cooldown_ms = 0.0;
    }

    /// Take a weapon off the floor. Refused while armed if the
    /// empty-hand policy is on; otherwise the new weapon replaces the old.
    pub fn try_pickup(&mut self, id: WeaponId, config: &RunnerConfig) -> bool {
        if config.weapons.spawn_only_if_empty_hand && self.held.is_some() {
            return false;
        }
        self.held = Some(HeldWeapon {
            id,
            durability: config.weapons.get(id).durability.max(1),
        });
        log::debug!("Picked up {}", id.as_str());
        true
    }

    pub fn update(&mut self, dt: f32) {
        self.cooldown_ms = (self.cooldown_ms - dt * 1000.0).max(0.0);
    }

    /// Use the held weapon against the obstacle set
    pub fn action(
        &mut self,
        player: &Player,
        obstacles: &mut [Obstacle],
        projectiles: &mut Vec<Projectile>,
        config: &RunnerConfig,
        view_h: f32,
    ) -> ActionOutcome {
        let Some(mut weapon) = self.held else {
            return ActionOutcome::Ignored;
        };
        if self.cooldown_ms > 0.0 {
            return ActionOutcome::Ignored;
        }

        match config.weapons.get(weapon.id).attack {
            Attack::Projectile {
                travel_ratio,
                speed,
            } => {
                projectiles.push(Projectile {
                    lane: player.lane,
                    pos: Vec2::new(player.pos.x, player.pos.y - THROW_OFFSET_Y),
                    vel: Vec2::new(0.0, -speed),
                    remaining_travel: view_h * travel_ratio,
                    dead: false,
                });
                // Single use, hit or miss
                self.clear();
                log::debug!("Threw {} in lane {}", weapon.id.as_str(), player.lane);
                ActionOutcome::Thrown
            }
            Attack::Melee {
                hit_range,
                cooldown_ms,
            } => {
                self.cooldown_ms = cooldown_ms;

                let target = obstacles
                    .iter_mut()
                    .filter(|o| {
                        !o.dead
                            && !o.neutralized
                            && o.killable
                            && o.lane == player.lane
                            && o.pos.y < player.pos.y
                            && player.pos.y - o.pos.y <= hit_range
                    })
                    .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

                let Some(target) = target else {
                    log::debug!("{} swing missed", weapon.id.as_str());
                    return ActionOutcome::Swung {
                        weapon: weapon.id,
                        hit: None,
                        broke: false,
                    };
                };

                target.neutralize();
                let hit = Some((target.id, target.kind));
                log::debug!(
                    "{} neutralized {} #{}",
                    weapon.id.as_str(),
                    target.kind.as_str(),
                    target.id
                );

                weapon.durability = weapon.durability.saturating_sub(1);
                let broke = weapon.durability == 0;
                if broke {
                    self.clear();
                } else {
                    self.held = Some(weapon);
                }
                ActionOutcome::Swung {
                    weapon: weapon.id,
                    hit,
                    broke,
                }
            }
        }
    }
}
