//! Dorm Runner - A three-lane endless runner simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, hazards, weapons, collisions)
//! - `config`: Data-driven tuning table injected into the simulation

pub mod config;
pub mod sim;

pub use config::RunnerConfig;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the native driver (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Number of lanes in the corridor
    pub const LANE_COUNT: usize = 3;
    /// Index of the middle lane
    pub const CENTER_LANE: usize = 1;

    /// Damage at or above this is treated as instant death
    pub const INSTANT_DEATH_DAMAGE: u32 = 9999;
}

/// Ease-out cubic on t in [0, 1]
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// Linear interpolation with t clamped to [0, 1]
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Where `v` sits between `a` and `b`, clamped to [0, 1]
#[inline]
pub fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        return 0.0;
    }
    ((v - a) / (b - a)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        // Ease-out front-loads motion
        assert!(ease_out_cubic(0.5) > 0.5);
        // Out of range input is clamped
        assert_eq!(ease_out_cubic(2.0), 1.0);
    }

    #[test]
    fn test_lerp_clamps() {
        assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
        assert_eq!(lerp(2.0, 4.0, -1.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 3.0), 4.0);
    }

    #[test]
    fn test_inverse_lerp() {
        assert_eq!(inverse_lerp(180.0, 520.0, 180.0), 0.0);
        assert_eq!(inverse_lerp(180.0, 520.0, 520.0), 1.0);
        assert_eq!(inverse_lerp(180.0, 520.0, 1000.0), 1.0);
        assert_eq!(inverse_lerp(5.0, 5.0, 7.0), 0.0);
    }
}
