//! Dorm Runner headless driver
//!
//! Plays one seeded run on autopilot at a fixed 60 Hz and logs the result.
//!
//! Usage: `dorm-runner [SEED] [CONFIG.json]`

use std::time::{SystemTime, UNIX_EPOCH};

use dorm_runner::RunnerConfig;
use dorm_runner::consts::SIM_DT;
use dorm_runner::sim::{GameEvent, GameState, TickInput, tick};

/// Give up after ten simulated minutes
const MAX_TICKS: u64 = 60 * 60 * 10;

fn load_config(path: Option<&str>) -> RunnerConfig {
    let Some(path) = path else {
        return RunnerConfig::default();
    };
    match std::fs::read_to_string(path) {
        Ok(json) => match RunnerConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid config {}: {}; using defaults", path, e);
                RunnerConfig::default()
            }
        },
        Err(e) => {
            log::warn!("Could not read config {}: {}; using defaults", path, e);
            RunnerConfig::default()
        }
    }
}

fn main() {
    env_logger::init();
    log::info!("Dorm Runner (headless) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let seed = args
        .first()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });
    let config = load_config(args.get(1).map(String::as_str));

    let mut state = GameState::with_config(seed, config);
    state.start_run();

    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    let mut kills = 0u32;
    let mut hits = 0u32;
    let mut pickups = 0u32;

    while !state.is_over() && state.time_ticks < MAX_TICKS {
        tick(&mut state, &input, SIM_DT);
        for event in &state.events {
            match event {
                GameEvent::Neutralized { .. } => kills += 1,
                GameEvent::Damaged { .. } => hits += 1,
                GameEvent::PickedUp { .. } => pickups += 1,
                _ => {}
            }
        }
    }

    if !state.is_over() {
        log::info!("Stopped at the {} tick cap", MAX_TICKS);
    }
    println!(
        "seed {}: {:.0} m in {:.1} s, hp {}, {} hits taken, {} weapons, {} hazards neutralized",
        seed,
        state.distance_m,
        state.time_ticks as f32 * SIM_DT,
        state.player.hp,
        hits,
        pickups,
        kills
    );
}
