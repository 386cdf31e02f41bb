//! Pattern spawner
//!
//! The corridor is generated ahead of the player in patterns: vertical
//! slices of a few tiles filled from a small template library. Every
//! placement is validated so that a pattern always leaves a way through:
//! - no row blocks every lane
//! - hard hazards (wet floor, door, hand) keep a minimum row gap
//! - the hand never lands in the pattern's safe lane
//! - doors and hands only appear in side lanes
//!
//! The cursor moves with the world; `ensure_ahead` keeps generating until
//! the configured lookahead is covered.

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::SliceRandom;
use serde::Serialize;

use super::lanes::LaneGeometry;
use super::obstacle::{Obstacle, ObstacleKind};
use super::state::{Pickup, WeaponId};
use crate::config::{RunnerConfig, SpawnerConfig};
use crate::consts::{CENTER_LANE, LANE_COUNT};
use crate::lerp;

use ObstacleKind::*;

/// One candidate position in a template
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternSlot {
    /// Row within the pattern (clamped to its tile count)
    pub row: u32,
    /// Fixed lane, or `None` to roll one
    pub lane: Option<usize>,
    pub kind_pool: &'static [ObstacleKind],
}

impl PatternSlot {
    pub const fn new(row: u32, kind_pool: &'static [ObstacleKind]) -> Self {
        Self {
            row,
            lane: None,
            kind_pool,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternTemplate {
    pub name: &'static str,
    pub slots: &'static [PatternSlot],
}

/// Built-in templates
pub const PATTERN_LIBRARY: [PatternTemplate; 3] = [
    PatternTemplate {
        name: "simple_mix",
        slots: &[
            PatternSlot::new(1, &[Trash, Flies, Cockroaches]),
            PatternSlot::new(2, &[Wet, Trash]),
            PatternSlot::new(3, &[Flies, Cockroaches]),
            PatternSlot::new(5, &[Trash, Wet]),
            PatternSlot::new(6, &[Flies, Cockroaches]),
        ],
    },
    PatternTemplate {
        name: "dynamic_window",
        slots: &[
            PatternSlot::new(1, &[Trash, Wet]),
            PatternSlot::new(3, &[Rat, Door, Flies]),
            PatternSlot::new(4, &[Trash, Cockroaches]),
            PatternSlot::new(6, &[Rat, Flies, Cockroaches]),
        ],
    },
    PatternTemplate {
        name: "tension_hand_rare",
        slots: &[
            PatternSlot::new(1, &[Trash, Wet]),
            PatternSlot::new(3, &[Door, Rat]),
            PatternSlot::new(5, &[Hand, Rat]),
            PatternSlot::new(6, &[Flies, Cockroaches]),
        ],
    },
];

/// A validated obstacle position, before it becomes an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub lane: usize,
    pub row: u32,
    pub kind: ObstacleKind,
}

/// Everything decided about one pattern before materialization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternPlan {
    pub template: &'static str,
    pub tiles: u32,
    pub safe_lane: usize,
    pub placements: Vec<Placement>,
    /// Row and weapon of the pickup offered in the safe lane, if any
    pub pickup: Option<(u32, WeaponId)>,
}

impl PatternPlan {
    /// Total height in scroll space
    pub fn height(&self, tile_h: f32) -> f32 {
        self.tiles as f32 * tile_h
    }
}

/// Inputs the spawner reads from the rest of the run
#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest<'a> {
    pub difficulty: f32,
    /// Player currently holds no weapon
    pub weapon_empty: bool,
    pub view_h: f32,
    pub lanes: &'a LaneGeometry,
    pub config: &'a RunnerConfig,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Spawner {
    /// Top edge of the generated corridor; moves down with the world
    cursor_y: f32,
    next_id: u32,
    patterns_spawned: u64,
}

impl Spawner {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn cursor_y(&self) -> f32 {
        self.cursor_y
    }

    pub fn patterns_spawned(&self) -> u64 {
        self.patterns_spawned
    }

    /// Scroll the cursor with the world
    pub fn advance(&mut self, dt: f32, speed: f32) {
        self.cursor_y += speed * dt;
    }

    /// Generate patterns until the lookahead window is covered
    pub fn ensure_ahead<R: Rng + ?Sized>(
        &mut self,
        req: &SpawnRequest,
        rng: &mut R,
        obstacles: &mut Vec<Obstacle>,
        pickups: &mut Vec<Pickup>,
    ) {
        let target = -req.view_h * req.config.view.spawn_ahead_screens;
        while self.cursor_y > target {
            let plan = self.plan_pattern(req, rng);
            self.materialize(&plan, req, rng, obstacles, pickups);
        }
    }

    /// Roll one pattern without touching the world
    pub fn plan_pattern<R: Rng + ?Sized>(&self, req: &SpawnRequest, rng: &mut R) -> PatternPlan {
        let cfg = &req.config.spawner;
        let min_tiles = cfg.pattern_min_tiles.max(1);
        let max_tiles = cfg.pattern_max_tiles.max(min_tiles);
        let tiles = rng.random_range(min_tiles..=max_tiles);
        let template = &PATTERN_LIBRARY[rng.random_range(0..PATTERN_LIBRARY.len())];

        let target = lerp(
            cfg.obstacles_per_pattern_start,
            cfg.obstacles_per_pattern_max,
            req.difficulty,
        )
        .round()
        .max(0.0) as usize;
        let safe_lane = rng.random_range(0..LANE_COUNT);

        let placements =
            generate_placements(template, tiles, target, safe_lane, req.difficulty, cfg, rng);

        let offer = pickup_allowed(req) && chance(rng, req.config.pickups.spawn_chance_per_pattern);
        let pickup = if offer {
            let row = rng.random_range(1..=tiles.saturating_sub(2).max(1));
            choose_weapon(&req.config.pickups.weights, rng).map(|weapon| (row, weapon))
        } else {
            None
        };

        PatternPlan {
            template: template.name,
            tiles,
            safe_lane,
            placements,
            pickup,
        }
    }

    /// Turn a plan into entities above the cursor and move the cursor up
    fn materialize<R: Rng + ?Sized>(
        &mut self,
        plan: &PatternPlan,
        req: &SpawnRequest,
        rng: &mut R,
        obstacles: &mut Vec<Obstacle>,
        pickups: &mut Vec<Pickup>,
    ) {
        // A zero-height pattern would never satisfy the lookahead
        let tile_h = req.config.spawner.tile_h.max(1.0);
        let top = self.cursor_y - plan.height(tile_h);

        for p in &plan.placements {
            let facing = if p.kind == Rat && chance(rng, 0.5) { -1 } else { 1 };
            let y = top + p.row as f32 * tile_h;
            obstacles.push(Obstacle::new(
                self.alloc_id(),
                p.kind,
                p.lane,
                y,
                facing,
                req.lanes,
                req.config,
            ));
        }

        if let Some((row, weapon)) = plan.pickup {
            let y = top + row as f32 * tile_h;
            pickups.push(Pickup::new(self.alloc_id(), weapon, plan.safe_lane, y, req.lanes));
        }

        self.cursor_y = top;
        self.patterns_spawned += 1;
        log::debug!(
            "Pattern #{} '{}': {} tiles, safe lane {}, {} obstacles{}",
            self.patterns_spawned,
            plan.template,
            plan.tiles,
            plan.safe_lane,
            plan.placements.len(),
            if plan.pickup.is_some() { " + pickup" } else { "" }
        );
    }

    fn alloc_id(&mut self) -> u32 {
        self.next_id = self.next_id.wrapping_add(1);
        self.next_id
    }
}

fn pickup_allowed(req: &SpawnRequest) -> bool {
    req.weapon_empty || !req.config.weapons.spawn_only_if_empty_hand
}

/// Bernoulli trial; never panics on `p` outside [0, 1]
pub(crate) fn chance<R: Rng + ?Sized>(rng: &mut R, p: f32) -> bool {
    rng.random::<f32>() < p
}

/// Weighted weapon choice; `None` if the table has no positive weight
pub fn choose_weapon<R: Rng + ?Sized>(weights: &[(WeaponId, u32)], rng: &mut R) -> Option<WeaponId> {
    let dist = WeightedIndex::new(weights.iter().map(|(_, w)| *w)).ok()?;
    Some(weights[dist.sample(rng)].0)
}

/// Resolve a slot's pool to one concrete kind
pub fn pick_kind<R: Rng + ?Sized>(
    pool: &[ObstacleKind],
    dynamic_chance: f32,
    hand_reroll_chance: f32,
    rng: &mut R,
) -> ObstacleKind {
    let (dynamic, fixed): (Vec<ObstacleKind>, Vec<ObstacleKind>) =
        pool.iter().partition(|k| k.is_dynamic());

    if !dynamic.is_empty() && chance(rng, dynamic_chance) {
        let kind = dynamic[rng.random_range(0..dynamic.len())];
        // Instant-death hazards stay rare
        if kind == Hand && chance(rng, hand_reroll_chance) {
            return if fixed.is_empty() {
                Trash
            } else {
                fixed[rng.random_range(0..fixed.len())]
            };
        }
        return kind;
    }

    if !fixed.is_empty() {
        return fixed[rng.random_range(0..fixed.len())];
    }
    if pool.is_empty() {
        return Trash;
    }
    pool[rng.random_range(0..pool.len())]
}

fn random_lane_except<R: Rng + ?Sized>(except: usize, rng: &mut R) -> usize {
    let pick = rng.random_range(0..LANE_COUNT - 1);
    if pick >= except { pick + 1 } else { pick }
}

/// Per-pattern bookkeeping for the fairness rules
struct Occupancy {
    /// Bit per lane, indexed by row
    rows: Vec<u8>,
    hard_rows: Vec<u32>,
    min_gap: u32,
    safe_lane: usize,
}

impl Occupancy {
    fn new(tiles: u32, safe_lane: usize, min_gap: u32) -> Self {
        Self {
            rows: vec![0; tiles as usize],
            hard_rows: Vec::new(),
            min_gap,
            safe_lane,
        }
    }

    fn count(&self, row: u32) -> u32 {
        self.rows[row as usize].count_ones()
    }

    fn occupied(&self, lane: usize, row: u32) -> bool {
        self.rows[row as usize] & (1 << lane) != 0
    }

    fn check(&self, p: &Placement) -> Result<(), &'static str> {
        if self.occupied(p.lane, p.row) {
            return Err("cell taken");
        }
        if p.kind.side_lanes_only() && p.lane == CENTER_LANE {
            return Err("center lane");
        }
        if self.count(p.row) as usize >= LANE_COUNT - 1 {
            return Err("row would be full");
        }
        if p.kind == Hand && p.lane == self.safe_lane {
            return Err("hand in safe lane");
        }
        if p.kind.is_hard() && self.hard_rows.iter().any(|&r| r.abs_diff(p.row) < self.min_gap) {
            return Err("hard too close");
        }
        Ok(())
    }

    fn commit(&mut self, p: &Placement) {
        self.rows[p.row as usize] |= 1 << p.lane;
        if p.kind.is_hard() {
            self.hard_rows.push(p.row);
        }
    }
}

/// Fill a pattern with up to `target` placements that satisfy every
/// fairness rule. Falling short just yields a sparser pattern.
pub fn generate_placements<R: Rng + ?Sized>(
    template: &PatternTemplate,
    tiles: u32,
    target: usize,
    safe_lane: usize,
    difficulty: f32,
    config: &SpawnerConfig,
    rng: &mut R,
) -> Vec<Placement> {
    let tiles = tiles.max(1);
    let safe_lane = safe_lane.min(LANE_COUNT - 1);
    let dynamic_chance = lerp(config.dynamic_chance_start, config.dynamic_chance_max, difficulty);

    let mut slots = template.slots.to_vec();
    slots.shuffle(rng);

    let mut occupancy = Occupancy::new(tiles, safe_lane, config.min_gap_tiles_between_hard);
    let mut placements: Vec<Placement> = Vec::with_capacity(target);

    for _pass in 0..config.placement_passes {
        if placements.len() >= target {
            break;
        }
        for slot in &slots {
            if placements.len() >= target {
                break;
            }

            let row = slot.row.min(tiles - 1);
            let mut lane = match slot.lane {
                Some(lane) => lane.min(LANE_COUNT - 1),
                None => rng.random_range(0..LANE_COUNT),
            };
            if lane == safe_lane && chance(rng, config.safe_lane_avoid_chance) {
                lane = random_lane_except(safe_lane, rng);
            }

            let kind = pick_kind(slot.kind_pool, dynamic_chance, config.hand_reroll_chance, rng);
            if kind.side_lanes_only() && lane == CENTER_LANE {
                lane = if chance(rng, 0.5) { 0 } else { LANE_COUNT - 1 };
            }

            let candidate = Placement { lane, row, kind };
            if let Err(reason) = occupancy.check(&candidate) {
                log::trace!("Rejected {} at lane {} row {}: {}", kind.as_str(), lane, row, reason);
                continue;
            }
            // Sometimes leave a row with a single occupant
            if occupancy.count(row) == 1 && chance(rng, config.row_pair_skip_chance) {
                continue;
            }

            occupancy.commit(&candidate);
            placements.push(candidate);
        }
    }

    sweep_full_rows(&mut placements, tiles);
    placements
}

/// Drop the latest placement of any row that ended up blocking every lane
fn sweep_full_rows(placements: &mut Vec<Placement>, tiles: u32) {
    for row in 0..tiles {
        let count = placements.iter().filter(|p| p.row == row).count();
        if count < LANE_COUNT {
            continue;
        }
        if let Some(last) = placements.iter().rposition(|p| p.row == row) {
            log::trace!("Sweep removed placement from full row {}", row);
            placements.remove(last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn assert_fair(placements: &[Placement], safe_lane: usize, min_gap: u32) {
        for (i, a) in placements.iter().enumerate() {
            assert!(a.lane < LANE_COUNT);
            if a.kind.side_lanes_only() {
                assert_ne!(a.lane, CENTER_LANE, "{:?} in center", a.kind);
            }
            if a.kind == Hand {
                assert_ne!(a.lane, safe_lane);
            }
            for b in &placements[i + 1..] {
                assert!(!(a.lane == b.lane && a.row == b.row), "shared cell");
                if a.kind.is_hard() && b.kind.is_hard() {
                    assert!(a.row.abs_diff(b.row) >= min_gap);
                }
            }
        }
        let max_row = placements.iter().map(|p| p.row).max().unwrap_or(0);
        for row in 0..=max_row {
            assert!(placements.iter().filter(|p| p.row == row).count() < LANE_COUNT);
        }
    }

    #[test]
    fn test_library_respects_layout_rules() {
        for template in &PATTERN_LIBRARY {
            assert!(!template.slots.is_empty());
            for slot in template.slots {
                assert!(!slot.kind_pool.is_empty(), "{}", template.name);
            }
        }
    }

    #[test]
    fn test_short_corridor_limits_hard_placements() {
        const SLOTS: &[PatternSlot] = &[
            PatternSlot::new(0, &[Door, Wet]),
            PatternSlot::new(1, &[Door, Wet]),
            PatternSlot::new(2, &[Door, Wet]),
            PatternSlot::new(3, &[Door, Wet]),
        ];
        let template = PatternTemplate {
            name: "all_hard",
            slots: SLOTS,
        };
        let config = SpawnerConfig::default();
        for seed in 0..200 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let placements = generate_placements(&template, 5, 4, 0, 1.0, &config, &mut rng);
            let hard = placements.iter().filter(|p| p.kind.is_hard()).count();
            assert!(hard < 4, "seed {seed}: {placements:?}");
            assert_fair(&placements, 0, config.min_gap_tiles_between_hard);
        }
    }

    #[test]
    fn test_target_zero_places_nothing() {
        let mut rng = Pcg32::seed_from_u64(5);
        let config = SpawnerConfig::default();
        let placements = generate_placements(&PATTERN_LIBRARY[0], 8, 0, 1, 0.5, &config, &mut rng);
        assert!(placements.is_empty());
    }

    #[test]
    fn test_sweep_breaks_full_rows() {
        let mut placements = vec![
            Placement { lane: 0, row: 2, kind: Trash },
            Placement { lane: 1, row: 2, kind: Flies },
            Placement { lane: 0, row: 3, kind: Flies },
            Placement { lane: 2, row: 2, kind: Cockroaches },
        ];
        sweep_full_rows(&mut placements, 5);
        assert_eq!(placements.len(), 3);
        assert!(!placements.contains(&Placement { lane: 2, row: 2, kind: Cockroaches }));
    }

    #[test]
    fn test_pick_kind_static_only_pool() {
        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..100 {
            let kind = pick_kind(&[Flies, Cockroaches], 1.0, 0.0, &mut rng);
            assert!(matches!(kind, Flies | Cockroaches));
        }
    }

    #[test]
    fn test_pick_kind_hand_always_rerolled() {
        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..100 {
            assert_eq!(pick_kind(&[Hand, Wet], 1.0, 1.0, &mut rng), Wet);
            assert_eq!(pick_kind(&[Hand], 1.0, 1.0, &mut rng), Trash);
        }
    }

    #[test]
    fn test_pick_kind_dynamic_when_certain() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(pick_kind(&[Rat, Flies], 1.0, 0.0, &mut rng), Rat);
            assert_eq!(pick_kind(&[Rat, Flies], 0.0, 0.0, &mut rng), Flies);
        }
    }

    #[test]
    fn test_choose_weapon() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(choose_weapon(&[], &mut rng), None);
        assert_eq!(choose_weapon(&[(WeaponId::Pan, 0)], &mut rng), None);
        assert_eq!(
            choose_weapon(&[(WeaponId::Bottle, 0), (WeaponId::Pan, 3)], &mut rng),
            Some(WeaponId::Pan)
        );
    }

    #[test]
    fn test_random_lane_except() {
        let mut rng = Pcg32::seed_from_u64(11);
        for except in 0..LANE_COUNT {
            for _ in 0..50 {
                let lane = random_lane_except(except, &mut rng);
                assert!(lane < LANE_COUNT && lane != except);
            }
        }
    }

    #[test]
    fn test_ensure_ahead_covers_lookahead() {
        let config = RunnerConfig::default();
        let lanes = LaneGeometry::new(config.view.width, config.lanes.side_padding);
        let req = SpawnRequest {
            difficulty: 0.0,
            weapon_empty: true,
            view_h: config.view.height,
            lanes: &lanes,
            config: &config,
        };
        let mut rng = Pcg32::seed_from_u64(77);
        let mut spawner = Spawner::default();
        let mut obstacles = Vec::new();
        let mut pickups = Vec::new();

        spawner.ensure_ahead(&req, &mut rng, &mut obstacles, &mut pickups);
        let target = -config.view.height * config.view.spawn_ahead_screens;
        assert!(spawner.cursor_y() <= target);
        // One pattern is at most 8 tiles: covering ~1400px needs several
        assert!(spawner.patterns_spawned() >= 2);
        assert!(obstacles.iter().all(|o| o.pos.y < 0.0 && o.pos.y >= spawner.cursor_y()));

        // Unique ids across obstacles and pickups
        let mut ids: Vec<u32> = obstacles.iter().map(|o| o.id).chain(pickups.iter().map(|p| p.id)).collect();
        let n = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), n);

        // Already covered: nothing more to do
        let before = spawner.patterns_spawned();
        spawner.ensure_ahead(&req, &mut rng, &mut obstacles, &mut pickups);
        assert_eq!(spawner.patterns_spawned(), before);

        // The world scrolls: the cursor follows and refills
        spawner.advance(1.0, 500.0);
        spawner.ensure_ahead(&req, &mut rng, &mut obstacles, &mut pickups);
        assert!(spawner.patterns_spawned() > before);
        assert!(spawner.cursor_y() <= target);
    }

    #[test]
    fn test_armed_player_gets_no_pickups() {
        let config = RunnerConfig::default();
        let lanes = LaneGeometry::new(config.view.width, config.lanes.side_padding);
        let req = SpawnRequest {
            difficulty: 0.5,
            weapon_empty: false,
            view_h: config.view.height,
            lanes: &lanes,
            config: &config,
        };
        let spawner = Spawner::default();
        let mut rng = Pcg32::seed_from_u64(4);
        for _ in 0..200 {
            assert_eq!(spawner.plan_pattern(&req, &mut rng).pickup, None);
        }
    }

    #[test]
    fn test_reset_rewinds_cursor() {
        let mut spawner = Spawner::default();
        spawner.advance(1.0, 100.0);
        spawner.reset();
        assert_eq!(spawner.cursor_y(), 0.0);
        assert_eq!(spawner.patterns_spawned(), 0);
    }

    proptest! {
        #[test]
        fn prop_planned_patterns_are_fair(seed in any::<u64>(), difficulty in 0.0f32..=1.0, armed in any::<bool>()) {
            let config = RunnerConfig::default();
            let lanes = LaneGeometry::new(config.view.width, config.lanes.side_padding);
            let req = SpawnRequest {
                difficulty,
                weapon_empty: !armed,
                view_h: config.view.height,
                lanes: &lanes,
                config: &config,
            };
            let spawner = Spawner::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            for _ in 0..8 {
                let plan = spawner.plan_pattern(&req, &mut rng);
                prop_assert!(plan.tiles >= config.spawner.pattern_min_tiles);
                prop_assert!(plan.tiles <= config.spawner.pattern_max_tiles);
                prop_assert!(plan.placements.iter().all(|p| p.row < plan.tiles));
                prop_assert!(plan.placements.len() <= 4);
                if let Some((row, _)) = plan.pickup {
                    prop_assert!(row >= 1 && row < plan.tiles);
                }
                assert_fair(&plan.placements, plan.safe_lane, config.spawner.min_gap_tiles_between_hard);
            }
        }

        #[test]
        fn prop_generated_placements_are_fair(
            seed in any::<u64>(),
            template in 0usize..3,
            tiles in 1u32..10,
            target in 0usize..8,
            safe_lane in 0usize..3,
            difficulty in 0.0f32..=1.0,
        ) {
            let config = SpawnerConfig::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let placements = generate_placements(
                &PATTERN_LIBRARY[template],
                tiles,
                target,
                safe_lane,
                difficulty,
                &config,
                &mut rng,
            );
            prop_assert!(placements.len() <= target);
            assert_fair(&placements, safe_lane, config.min_gap_tiles_between_hard);
        }
    }
}
