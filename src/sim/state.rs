//! Simulation entities
//!
//! Agents and obstacles share an id space and a position. The registry
//! stores them as one closed `SimObject` variant so kind dispatch is an
//! exhaustive match.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::policy::DecisionPolicy;
use super::vector::Vector2D;
use crate::consts::SPEED_EPSILON;

/// Unique object identifier, allocated by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source. Ids are never reused.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next += 1;
        id
    }
}

/// Discriminant of `SimObject`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Agent,
    Obstacle,
}

/// Anything with an identity and a location
pub trait Positioned {
    fn id(&self) -> ObjectId;
    fn position(&self) -> Vector2D;
}

/// Agent lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    #[default]
    Idle,
    Moving,
    Stopped,
    /// Hit the track boundary. Terminal.
    Crashed,
    /// Ran dry. Terminal.
    OutOfFuel,
    /// Completed the lap limit. Terminal.
    Finished,
}

impl AgentState {
    /// Terminal states absorb: kinematics no-op once entered
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentState::Crashed | AgentState::OutOfFuel | AgentState::Finished
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Idle => "idle",
            AgentState::Moving => "moving",
            AgentState::Stopped => "stopped",
            AgentState::Crashed => "crashed",
            AgentState::OutOfFuel => "out_of_fuel",
            AgentState::Finished => "finished",
        }
    }
}

/// An autonomous racer
pub struct Agent {
    pub id: ObjectId,
    pub position: Vector2D,
    /// Scalar speed (>= 0)
    pub speed: f64,
    /// Heading, kept at unit length
    pub direction: Vector2D,
    pub fuel: f64,
    pub lap: u32,
    /// Reached the far side of the track since the last lap
    pub checkpoint: bool,
    pub state: AgentState,
    /// Decision policy owned by this agent
    policy: Box<dyn DecisionPolicy>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("speed", &self.speed)
            .field("direction", &self.direction)
            .field("fuel", &self.fuel)
            .field("lap", &self.lap)
            .field("checkpoint", &self.checkpoint)
            .field("state", &self.state)
            .field("policy", &self.policy.name())
            .finish()
    }
}

impl Agent {
    pub fn new(
        id: ObjectId,
        position: Vector2D,
        speed: f64,
        direction: Vector2D,
        fuel: f64,
        policy: Box<dyn DecisionPolicy>,
    ) -> Self {
        Self {
            id,
            position,
            speed: speed.max(0.0),
            direction: direction.normalize(),
            fuel,
            lap: 0,
            checkpoint: false,
            state: AgentState::Idle,
            policy,
        }
    }

    pub fn policy(&self) -> &dyn DecisionPolicy {
        self.policy.as_ref()
    }

    /// Current velocity vector
    #[inline]
    pub fn velocity(&self) -> Vector2D {
        self.direction * self.speed
    }

    /// Velocity this agent would have after taking `action`
    #[inline]
    pub fn velocity_after(&self, action: &Action) -> Vector2D {
        self.direction.rotate(action.steer_rad) * (self.speed * action.speed_factor)
    }

    /// Advance one fixed step with the chosen action.
    ///
    /// Burns fuel for the speed held over the step, applies the action,
    /// moves, then re-derives the state. Terminal agents are left untouched.
    pub fn integrate(&mut self, action: &Action, dt: f64, fuel_usage: f64) {
        if self.state.is_terminal() {
            return;
        }

        self.fuel -= self.speed * dt * fuel_usage;

        self.speed = (self.speed * action.speed_factor).max(0.0);
        let turned = self.direction.rotate(action.steer_rad).normalize();
        // Keep the old heading if rotation ever degenerates
        if turned != Vector2D::ZERO {
            self.direction = turned;
        }
        self.position += self.direction * (self.speed * dt);

        self.state = self.derive_state();
        match self.state {
            AgentState::OutOfFuel => {
                self.fuel = 0.0;
                self.speed = 0.0;
            }
            AgentState::Stopped => self.speed = 0.0,
            _ => {}
        }
    }

    fn derive_state(&self) -> AgentState {
        if self.fuel <= 0.0 {
            AgentState::OutOfFuel
        } else if self.speed <= SPEED_EPSILON {
            AgentState::Stopped
        } else if self.speed > 0.0 {
            AgentState::Moving
        } else {
            AgentState::Idle
        }
    }

    /// Freeze the agent after a boundary hit at `contact`
    pub fn crash_at(&mut self, contact: Vector2D) {
        self.position = contact;
        self.speed = 0.0;
        self.state = AgentState::Crashed;
    }

    /// Count a lap; returns true when this lap reaches `lap_limit`.
    /// The next lap needs a fresh checkpoint.
    pub fn complete_lap(&mut self, lap_limit: u32) -> bool {
        self.lap += 1;
        self.checkpoint = false;
        if lap_limit > 0 && self.lap >= lap_limit {
            self.state = AgentState::Finished;
            self.speed = 0.0;
            return true;
        }
        false
    }

    /// Owned copy of the public fields
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            position: self.position,
            speed: self.speed,
            direction: self.direction,
            state: self.state,
            fuel: self.fuel,
            lap: self.lap,
        }
    }
}

impl Positioned for Agent {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn position(&self) -> Vector2D {
        self.position
    }
}

/// Static line segment on the track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObjectId,
    /// Segment start
    pub position: Vector2D,
    /// Segment end
    pub end: Vector2D,
}

impl Obstacle {
    pub fn new(id: ObjectId, start: Vector2D, end: Vector2D) -> Self {
        Self {
            id,
            position: start,
            end,
        }
    }

    /// Distance from a point to the nearest point of the segment
    pub fn distance_to(&self, point: Vector2D) -> f64 {
        let seg = self.end - self.position;
        let len_sq = seg.dot(seg);
        if len_sq <= f64::EPSILON {
            return self.position.distance_to(point);
        }
        let t = ((point - self.position).dot(seg) / len_sq).clamp(0.0, 1.0);
        (self.position + seg * t).distance_to(point)
    }
}

impl Positioned for Obstacle {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn position(&self) -> Vector2D {
        self.position
    }
}

/// Registry entry: every object is exactly one of these
#[derive(Debug)]
pub enum SimObject {
    Agent(Agent),
    Obstacle(Obstacle),
}

impl SimObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            SimObject::Agent(_) => ObjectKind::Agent,
            SimObject::Obstacle(_) => ObjectKind::Obstacle,
        }
    }

    pub fn as_agent(&self) -> Option<&Agent> {
        match self {
            SimObject::Agent(agent) => Some(agent),
            SimObject::Obstacle(_) => None,
        }
    }

    pub fn as_agent_mut(&mut self) -> Option<&mut Agent> {
        match self {
            SimObject::Agent(agent) => Some(agent),
            SimObject::Obstacle(_) => None,
        }
    }

    pub fn as_obstacle(&self) -> Option<&Obstacle> {
        match self {
            SimObject::Obstacle(obstacle) => Some(obstacle),
            SimObject::Agent(_) => None,
        }
    }

    /// Exact distance from `point` to this object's shape
    pub fn distance_to(&self, point: Vector2D) -> f64 {
        match self {
            SimObject::Agent(agent) => agent.position.distance_to(point),
            SimObject::Obstacle(obstacle) => obstacle.distance_to(point),
        }
    }
}

impl Positioned for SimObject {
    fn id(&self) -> ObjectId {
        match self {
            SimObject::Agent(agent) => agent.id,
            SimObject::Obstacle(obstacle) => obstacle.id,
        }
    }

    fn position(&self) -> Vector2D {
        match self {
            SimObject::Agent(agent) => agent.position,
            SimObject::Obstacle(obstacle) => obstacle.position,
        }
    }
}

/// Between-tick copy of an agent's public state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: ObjectId,
    pub position: Vector2D,
    pub speed: f64,
    pub direction: Vector2D,
    pub state: AgentState,
    pub fuel: f64,
    pub lap: u32,
}
