//! Kinesis - a racing simulation driven by time-to-collision
//!
//! Core modules:
//! - `sim`: Deterministic simulation (track geometry, TTC solvers, policy, engine)
//! - `leaderboard`: Live standings recomputed every tick
//! - `settings`: Startup configuration and validation
//! - `error`: Error types shared by the engine and configuration

pub mod error;
pub mod leaderboard;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, SimError, SimResult};
pub use leaderboard::{LeaderboardEntry, rank};
pub use settings::{PolicyParams, SimConfig, TrackGeometry};

/// Simulation constants
pub mod consts {
    /// Tolerance for degenerate geometry (zero velocity, zero-length segments)
    pub const EPSILON: f64 = f64::EPSILON;
    /// Speeds at or below this are treated as stopped
    pub const SPEED_EPSILON: f64 = 1e-6;

    /// Default simulation rate (ticks per second)
    pub const DEFAULT_TICK_RATE: f64 = 60.0;

    /// Fuel every agent starts with
    pub const DEFAULT_INITIAL_FUEL: f64 = 12_000.0;

    /// Spawn zones keep this far from the walls (track units)
    pub const SPAWN_WALL_MARGIN: f64 = 15.0;
    /// Spawn zones keep this far from the end caps (track units)
    pub const SPAWN_CAP_MARGIN: f64 = 10.0;

    /// Probability of a soft acceleration when no threat is in range
    pub const ACCEL_PROBABILITY: f64 = 0.4;
}
