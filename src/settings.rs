//! Simulation configuration
//!
//! Read once at startup from JSON and validated before the engine is built.
//! Every field has a default, so a partial file only overrides what it names.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{
    ACCEL_PROBABILITY, DEFAULT_INITIAL_FUEL, DEFAULT_TICK_RATE, SPAWN_CAP_MARGIN, SPAWN_WALL_MARGIN,
};
use crate::error::ConfigError;

/// Stadium-shaped track: two straights joined by semicircular caps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackGeometry {
    /// Half length of the straight section; cap centers sit at `(+-half, 0)`
    pub left_rect_half: f64,
    /// Inner wall distance from the centerline
    pub inner_radius: f64,
    /// Outer wall distance from the centerline
    pub outer_radius: f64,
}

impl Default for TrackGeometry {
    fn default() -> Self {
        Self {
            left_rect_half: 300.0,
            inner_radius: 100.0,
            outer_radius: 160.0,
        }
    }
}

/// Knobs the heuristic policy reads on every decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyParams {
    pub time_horizon_lower: f64,
    pub time_horizon_upper: f64,
    pub search_radius: f64,
    pub max_speed: f64,
    /// Contact distance between two agent centers
    pub combined_radius: f64,
    pub accel_probability: f64,
}

/// Startup parameters for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed; identical seeds replay identical runs
    pub seed: u64,

    // === Population ===
    pub num_agents: usize,
    pub num_obstacles: usize,

    // === Agents ===
    pub initial_fuel: f64,
    /// Fuel burned per unit of distance
    pub fuel_usage: f64,
    pub min_start_speed: f64,
    pub max_speed: f64,
    /// Laps to finish; 0 races forever
    pub lap_limit: u32,
    pub agent_radius: f64,

    // === Policy ===
    pub default_search_radius: f64,
    pub time_horizon_lower: f64,
    pub time_horizon_upper: f64,

    // === Engine ===
    /// Fixed ticks per second
    pub sim_tick_rate: f64,
    pub grid_cell_size: f64,
    /// Stop agents at the wall instead of letting them pass through
    pub crash_on_boundary: bool,

    pub track: TrackGeometry,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,

            num_agents: 10,
            num_obstacles: 5,

            initial_fuel: DEFAULT_INITIAL_FUEL,
            fuel_usage: 1.0,
            min_start_speed: 50.0,
            max_speed: 80.0,
            lap_limit: 5,
            agent_radius: 2.0,

            default_search_radius: 40.0,
            time_horizon_lower: 1.0,
            time_horizon_upper: 2.5,

            sim_tick_rate: DEFAULT_TICK_RATE,
            grid_cell_size: 5.0,
            crash_on_boundary: true,

            track: TrackGeometry::default(),
        }
    }
}

impl SimConfig {
    /// Read and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("initial_fuel", self.initial_fuel),
            ("fuel_usage", self.fuel_usage),
            ("min_start_speed", self.min_start_speed),
            ("max_speed", self.max_speed),
            ("agent_radius", self.agent_radius),
            ("default_search_radius", self.default_search_radius),
            ("time_horizon_lower", self.time_horizon_lower),
            ("time_horizon_upper", self.time_horizon_upper),
            ("sim_tick_rate", self.sim_tick_rate),
            ("grid_cell_size", self.grid_cell_size),
            ("track.left_rect_half", self.track.left_rect_half),
            ("track.inner_radius", self.track.inner_radius),
            ("track.outer_radius", self.track.outer_radius),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("{name} must be finite, got {value}")));
        }

        let positive = [
            ("sim_tick_rate", self.sim_tick_rate),
            ("grid_cell_size", self.grid_cell_size),
            ("agent_radius", self.agent_radius),
            ("initial_fuel", self.initial_fuel),
            ("max_speed", self.max_speed),
            ("track.left_rect_half", self.track.left_rect_half),
            ("track.inner_radius", self.track.inner_radius),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| *v <= 0.0) {
            return Err(invalid(format!("{name} must be positive, got {value}")));
        }

        let non_negative = [
            ("fuel_usage", self.fuel_usage),
            ("min_start_speed", self.min_start_speed),
            ("default_search_radius", self.default_search_radius),
            ("time_horizon_lower", self.time_horizon_lower),
        ];
        if let Some((name, value)) = non_negative.iter().find(|(_, v)| *v < 0.0) {
            return Err(invalid(format!("{name} must not be negative, got {value}")));
        }

        if self.track.inner_radius >= self.track.outer_radius {
            return Err(invalid(format!(
                "track.inner_radius ({}) must be below track.outer_radius ({})",
                self.track.inner_radius, self.track.outer_radius
            )));
        }
        // Spawn zones must not be empty
        if self.track.outer_radius - self.track.inner_radius <= 2.0 * SPAWN_WALL_MARGIN
            || self.track.left_rect_half <= SPAWN_CAP_MARGIN
        {
            return Err(invalid(format!(
                "track too small to spawn in: lane width {} needs more than {}",
                self.track.outer_radius - self.track.inner_radius,
                2.0 * SPAWN_WALL_MARGIN
            )));
        }
        if self.time_horizon_lower > self.time_horizon_upper {
            return Err(invalid(format!(
                "time horizon window [{}, {}] is inverted",
                self.time_horizon_lower, self.time_horizon_upper
            )));
        }
        if self.min_start_speed > self.max_speed {
            return Err(invalid(format!(
                "min_start_speed ({}) exceeds max_speed ({})",
                self.min_start_speed, self.max_speed
            )));
        }
        Ok(())
    }

    /// Duration of one fixed tick in seconds
    #[inline]
    pub fn tick_dt(&self) -> f64 {
        1.0 / self.sim_tick_rate
    }

    pub fn policy_params(&self) -> PolicyParams {
        PolicyParams {
            time_horizon_lower: self.time_horizon_lower,
            time_horizon_upper: self.time_horizon_upper,
            search_radius: self.default_search_radius,
            max_speed: self.max_speed,
            combined_radius: 2.0 * self.agent_radius,
            accel_probability: ACCEL_PROBABILITY,
        }
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.tick_dt() - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SimConfig::from_json(r#"{ "num_agents": 3, "track": { "inner_radius": 90.0 } }"#).unwrap();
        assert_eq!(config.num_agents, 3);
        assert_eq!(config.track.inner_radius, 90.0);
        assert_eq!(config.track.outer_radius, 160.0);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let mut config = SimConfig::default();
        config.track.inner_radius = 200.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_lane_too_narrow_to_spawn() {
        let mut config = SimConfig::default();
        config.track.outer_radius = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_tick_rate_and_cell_size() {
        let mut config = SimConfig::default();
        config.sim_tick_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.grid_cell_size = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_windows() {
        let mut config = SimConfig::default();
        config.time_horizon_lower = 3.0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.min_start_speed = 100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(SimConfig::from_json("{ nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = SimConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_policy_params_derived() {
        let params = SimConfig::default().policy_params();
        assert_eq!(params.combined_radius, 4.0);
        assert_eq!(params.search_radius, 40.0);
        assert_eq!(params.accel_probability, 0.4);
    }
}
