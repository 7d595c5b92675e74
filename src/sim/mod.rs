//! Deterministic simulation module
//!
//! Everything that advances the race lives here:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by object id)
//! - No transport or rendering dependencies

pub mod action;
pub mod engine;
pub mod grid;
pub mod policy;
pub mod state;
pub mod tick;
pub mod track;
pub mod ttc;
pub mod vector;

pub use action::{Action, ActionKind, CATALOG};
pub use engine::{RunSummary, SimulationEngine, World};
pub use grid::{GridError, SpatialGrid};
pub use policy::{DecisionPolicy, DecisionScope, FixedPolicy, HeuristicPolicy, ThresholdSampler, WorldView};
pub use state::{Agent, AgentSnapshot, AgentState, ObjectId, ObjectKind, Obstacle, Positioned, SimObject};
pub use tick::{
    AutonomousDriver, DriverMode, FixedStepper, RunControl, Steppable, SteppedDriver, TickAuthority,
    TickDriver,
};
pub use track::{BoundaryPiece, CapSide, FinishLine, Primitive, SpawnZone, TrackBoundary};
pub use ttc::{TtcCache, time_to_agent, time_to_segment};
pub use vector::Vector2D;
