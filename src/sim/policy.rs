//! Agent decision policies
//!
//! A policy reads the between-tick world through [`WorldView`] and returns
//! one maneuver from the catalog. Randomness and the pairwise TTC memo come
//! in through [`DecisionScope`] so a tick can be replayed from a seed.

use std::fmt;
use std::sync::Arc;

use rand::{Rng, RngCore};

use super::action::{Action, ActionKind, BOUNDARY_ESCAPES, CATALOG};
use super::state::{Agent, ObjectId, SimObject};
use super::track::TrackBoundary;
use super::ttc::{TtcCache, time_to_agent, time_to_segment};
use super::vector::Vector2D;
use crate::error::SimResult;
use crate::settings::PolicyParams;

/// Read-only access to the world a policy decides against
pub trait WorldView {
    /// Look up an object, failing with `NotFound` for unknown ids
    fn find(&self, id: ObjectId) -> SimResult<&SimObject>;

    /// Ids of objects within `radius` of `position`, exact-distance filtered
    fn neighbors(&self, position: Vector2D, radius: f64) -> Vec<ObjectId>;
}

/// Per-tick mutable context handed to every decision
pub struct DecisionScope<'a> {
    pub rng: &'a mut dyn RngCore,
    pub cache: &'a mut TtcCache,
}

impl<'a> DecisionScope<'a> {
    pub fn new(rng: &'a mut dyn RngCore, cache: &'a mut TtcCache) -> Self {
        Self { rng, cache }
    }
}

/// Picks one action per tick for an agent
pub trait DecisionPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn decide(
        &self,
        agent: &Agent,
        world: &dyn WorldView,
        scope: &mut DecisionScope<'_>,
    ) -> SimResult<Action>;
}

impl fmt::Debug for dyn DecisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Always returns the same maneuver. Scripted agents and tests use it.
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub ActionKind);

impl DecisionPolicy for FixedPolicy {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn decide(
        &self,
        _agent: &Agent,
        _world: &dyn WorldView,
        _scope: &mut DecisionScope<'_>,
    ) -> SimResult<Action> {
        Ok(self.0.action())
    }
}

/// Uniform draw from the time-horizon window. Every comparison gets its own
/// sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSampler {
    pub lower: f64,
    pub upper: f64,
}

impl ThresholdSampler {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        if self.upper <= self.lower {
            return self.lower;
        }
        rng.random_range(self.lower..=self.upper)
    }

    /// True when `ttc` falls within a freshly drawn threshold
    #[inline]
    pub fn within(&self, ttc: f64, rng: &mut dyn RngCore) -> bool {
        ttc <= self.sample(rng)
    }
}

/// TTC-driven evasive policy.
///
/// Looks at the boundary first. When the wall is far enough away it scans
/// nearby obstacles and agents; with no threat in range it cruises,
/// occasionally accelerating. Under threat it scores every catalog action
/// by how many threats survive the maneuver.
#[derive(Debug, Clone)]
pub struct HeuristicPolicy {
    track: Arc<TrackBoundary>,
    params: PolicyParams,
    thresholds: ThresholdSampler,
}

impl HeuristicPolicy {
    pub fn new(track: Arc<TrackBoundary>, params: PolicyParams) -> Self {
        let thresholds = ThresholdSampler::new(params.time_horizon_lower, params.time_horizon_upper);
        Self {
            track,
            params,
            thresholds,
        }
    }

    pub fn params(&self) -> &PolicyParams {
        &self.params
    }

    /// Boundary escape: among the steering candidates whose boundary TTC is
    /// still inside a fresh threshold, take the one that buys the most time.
    fn escape_boundary(&self, agent: &Agent, rng: &mut dyn RngCore) -> Action {
        let mut best = Action::MAINTAIN;
        let mut best_ttc = 0.0;

        for kind in BOUNDARY_ESCAPES {
            let action = kind.action();
            let ttc = self
                .track
                .time_to_boundary(agent.position, agent.velocity_after(&action));
            if self.thresholds.within(ttc, rng) && ttc > best_ttc {
                best_ttc = ttc;
                best = action;
            }
        }
        best
    }

    /// TTC against a neighbor for the agent's current velocity. Agent pairs
    /// go through the per-tick memo.
    fn current_ttc(&self, agent: &Agent, other: &SimObject, cache: &mut TtcCache) -> f64 {
        match other {
            SimObject::Obstacle(obstacle) => {
                time_to_segment(agent.velocity(), agent.position, obstacle.position, obstacle.end)
            }
            SimObject::Agent(peer) => cache.get_or_insert_with(agent.id, peer.id, || {
                time_to_agent(
                    agent.velocity(),
                    agent.position,
                    peer.velocity(),
                    peer.position,
                    self.params.combined_radius,
                )
            }),
        }
    }

    /// TTC against a neighbor if the agent took `action`
    fn hypothetical_ttc(&self, agent: &Agent, action: &Action, other: &SimObject) -> f64 {
        let velocity = agent.velocity_after(action);
        match other {
            SimObject::Obstacle(obstacle) => {
                time_to_segment(velocity, agent.position, obstacle.position, obstacle.end)
            }
            SimObject::Agent(peer) => time_to_agent(
                velocity,
                agent.position,
                peer.velocity(),
                peer.position,
                self.params.combined_radius,
            ),
        }
    }

    /// Score every action by surviving threats; fewest wins, catalog order
    /// breaks ties.
    fn evade(&self, agent: &Agent, neighbors: &[&SimObject], rng: &mut dyn RngCore) -> Action {
        let mut best = Action::MAINTAIN;
        let mut fewest = usize::MAX;

        for action in CATALOG.iter() {
            let mut threats = 0;

            let boundary = self
                .track
                .time_to_boundary(agent.position, agent.velocity_after(action));
            if self.thresholds.within(boundary, rng) {
                threats += 1;
            }

            for other in neighbors {
                let ttc = self.hypothetical_ttc(agent, action, other);
                if self.thresholds.within(ttc, rng) {
                    threats += 1;
                }
            }

            if threats < fewest {
                fewest = threats;
                best = *action;
            }
        }
        best
    }
}

impl DecisionPolicy for HeuristicPolicy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn decide(
        &self,
        agent: &Agent,
        world: &dyn WorldView,
        scope: &mut DecisionScope<'_>,
    ) -> SimResult<Action> {
        let boundary_ttc = self.track.time_to_boundary(agent.position, agent.velocity());
        if self.thresholds.within(boundary_ttc, scope.rng) {
            return Ok(self.escape_boundary(agent, scope.rng));
        }

        let mut neighbors = Vec::new();
        for id in world.neighbors(agent.position, self.params.search_radius) {
            if id == agent.id {
                continue;
            }
            neighbors.push(world.find(id)?);
        }

        let mut nearest_threat = f64::INFINITY;
        for other in &neighbors {
            let ttc = self.current_ttc(agent, other, scope.cache);
            if self.thresholds.within(ttc, scope.rng) && ttc < nearest_threat {
                nearest_threat = ttc;
            }
        }

        if nearest_threat.is_infinite() {
            let accelerate = agent.speed < self.params.max_speed
                && scope.rng.random_bool(self.params.accel_probability);
            return Ok(if accelerate {
                Action::ACCEL_SOFT
            } else {
                Action::MAINTAIN
            });
        }

        Ok(self.evade(agent, &neighbors, scope.rng))
    }
}
