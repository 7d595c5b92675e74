//! Simulation engine
//!
//! Owns the object registry, the spatial grid, the track and the seeded RNG.
//! A tick runs in four phases: every live agent decides against the same
//! between-tick world, then all of them integrate, then the grid catches up,
//! then standings are rebuilt.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::action::Action;
use super::grid::SpatialGrid;
use super::policy::{DecisionPolicy, DecisionScope, HeuristicPolicy, WorldView};
use super::state::{
    Agent, AgentSnapshot, AgentState, IdAllocator, ObjectId, ObjectKind, Obstacle, Positioned,
    SimObject,
};
use super::tick::{
    AutonomousDriver, DriverMode, RunControl, Steppable, SteppedDriver, TickAuthority, TickDriver,
};
use super::track::TrackBoundary;
use super::ttc::TtcCache;
use super::vector::Vector2D;
use crate::error::{ConfigError, SimError, SimResult};
use crate::leaderboard::{LeaderboardEntry, rank};
use crate::settings::SimConfig;

/// Registry plus broad-phase index. This is what policies see.
#[derive(Debug)]
pub struct World {
    objects: BTreeMap<ObjectId, SimObject>,
    grid: SpatialGrid,
    /// Longest obstacle segment; widens grid queries so segments whose start
    /// lies outside the radius are still found
    obstacle_reach: f64,
}

impl World {
    fn new(grid: SpatialGrid) -> Self {
        Self {
            objects: BTreeMap::new(),
            grid,
            obstacle_reach: 0.0,
        }
    }

    fn insert(&mut self, object: SimObject) {
        let id = object.id();
        let position = object.position();
        if let SimObject::Obstacle(obstacle) = &object {
            let length = obstacle.position.distance_to(obstacle.end);
            self.obstacle_reach = self.obstacle_reach.max(length);
        }
        self.grid.insert(id, position.x(), position.y());
        self.objects.insert(id, object);
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.objects.values().filter_map(SimObject::as_agent)
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.objects.values().filter_map(SimObject::as_obstacle)
    }
}

impl WorldView for World {
    fn find(&self, id: ObjectId) -> SimResult<&SimObject> {
        self.objects.get(&id).ok_or(SimError::NotFound { id })
    }

    fn neighbors(&self, position: Vector2D, radius: f64) -> Vec<ObjectId> {
        let mut ids = self
            .grid
            .query_radius(position.x(), position.y(), radius + self.obstacle_reach);
        ids.retain(|id| {
            self.objects
                .get(id)
                .is_some_and(|object| object.distance_to(position) <= radius)
        });
        ids.sort_unstable();
        ids
    }
}

/// Agent counts per state at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub agents: usize,
    pub obstacles: usize,
    pub idle: usize,
    pub moving: usize,
    pub stopped: usize,
    pub crashed: usize,
    pub out_of_fuel: usize,
    pub finished: usize,
}

/// Lap or terminal event produced while integrating one agent
enum StepEvent {
    Crashed(Vector2D),
    OutOfFuel,
    Lap(u32),
    Finished(u32),
}

/// Source of engine instance ids, so a driver cannot tick another engine
static NEXT_ENGINE: AtomicU64 = AtomicU64::new(1);

/// The simulation. Built by the composition root and passed by reference.
///
/// Ticks only advance through the [`TickDriver`] returned by
/// [`claim_driver`](Self::claim_driver).
pub struct SimulationEngine {
    instance: u64,
    config: SimConfig,
    track: Arc<TrackBoundary>,
    world: World,
    rng: Pcg32,
    ids: IdAllocator,
    leaderboard: Vec<LeaderboardEntry>,
    tick_count: u64,
    control: RunControl,
    driver: Option<DriverMode>,
}

impl SimulationEngine {
    /// Build an empty engine. Fails if the configuration does not validate.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let grid = SpatialGrid::new(config.grid_cell_size)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let track = Arc::new(TrackBoundary::oval(&config.track));

        log::info!(
            "Engine ready: seed {}, {} Hz, track half {} radii {}..{}",
            config.seed,
            config.sim_tick_rate,
            config.track.left_rect_half,
            config.track.inner_radius,
            config.track.outer_radius
        );

        Ok(Self {
            instance: NEXT_ENGINE.fetch_add(1, Ordering::Relaxed),
            rng: Pcg32::seed_from_u64(config.seed),
            config,
            track,
            world: World::new(grid),
            ids: IdAllocator::default(),
            leaderboard: Vec::new(),
            tick_count: 0,
            control: RunControl::default(),
            driver: None,
        })
    }

    /// Engine populated with the configured agent and obstacle counts
    pub fn with_population(config: SimConfig) -> SimResult<Self> {
        let (agents, obstacles) = (config.num_agents, config.num_obstacles);
        let mut engine = Self::new(config)?;
        engine.init_obstacles(obstacles);
        engine.init_agents(agents);
        Ok(engine)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn track(&self) -> &TrackBoundary {
        &self.track
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Handle for transports to start and pause the autonomous driver
    pub fn run_control(&self) -> RunControl {
        self.control.clone()
    }

    /// Spawn `count` agents in the start zone with the heuristic policy
    pub fn init_agents(&mut self, count: usize) -> Vec<ObjectId> {
        let zone = self.config.track.agent_spawn_zone();
        let params = self.config.policy_params();

        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            let position = Vector2D::new(
                self.rng.random_range(zone.x_min..=zone.x_max),
                self.rng.random_range(zone.y_min..=zone.y_max),
            );
            let speed = self
                .rng
                .random_range(self.config.min_start_speed..=self.config.max_speed);
            let policy = HeuristicPolicy::new(Arc::clone(&self.track), params);
            spawned.push(self.spawn_agent(position, Vector2D::new(-1.0, 0.0), speed, Box::new(policy)));
        }

        log::info!("Spawned {} agents", spawned.len());
        self.rerank();
        spawned
    }

    /// Scatter `count` vertical obstacle segments along the bottom straight.
    /// Segments grow toward the infield and stop at the inner wall.
    pub fn init_obstacles(&mut self, count: usize) -> Vec<ObjectId> {
        let zone = self.config.track.obstacle_spawn_zone();
        let max_length = self.config.track.max_obstacle_length();
        let inner_wall = -self.config.track.inner_radius;

        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            let start = Vector2D::new(
                self.rng.random_range(zone.x_min..=zone.x_max),
                self.rng.random_range(zone.y_min..=zone.y_max),
            );
            let length = self.rng.random_range(0.0..=max_length.min(inner_wall - start.y()));
            spawned.push(self.spawn_obstacle(start, start + Vector2D::new(0.0, length)));
        }

        log::info!("Spawned {} obstacles", spawned.len());
        spawned
    }

    /// Place one agent with an explicit policy
    pub fn spawn_agent(
        &mut self,
        position: Vector2D,
        direction: Vector2D,
        speed: f64,
        policy: Box<dyn DecisionPolicy>,
    ) -> ObjectId {
        let id = self.ids.next_id();
        let agent = Agent::new(id, position, speed, direction, self.config.initial_fuel, policy);
        log::debug!("Agent {id} at ({:.1}, {:.1}) speed {speed:.1}", position.x(), position.y());
        self.world.insert(SimObject::Agent(agent));
        id
    }

    /// Place one obstacle segment
    pub fn spawn_obstacle(&mut self, start: Vector2D, end: Vector2D) -> ObjectId {
        let id = self.ids.next_id();
        self.world.insert(SimObject::Obstacle(Obstacle::new(id, start, end)));
        id
    }

    pub fn find(&self, id: ObjectId) -> SimResult<&SimObject> {
        self.world.find(id)
    }

    /// Typed lookup; an obstacle id is `UnsupportedType`
    pub fn find_agent(&self, id: ObjectId) -> SimResult<&Agent> {
        let object = self.world.find(id)?;
        object.as_agent().ok_or(SimError::UnsupportedType {
            id,
            expected: ObjectKind::Agent,
            found: object.kind(),
        })
    }

    pub fn neighbors(&self, position: Vector2D, radius: f64) -> Vec<ObjectId> {
        self.world.neighbors(position, radius)
    }

    /// Owned copy of every agent's public state, in id order
    pub fn snapshot(&self) -> Vec<AgentSnapshot> {
        self.world.agents().map(Agent::snapshot).collect()
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            ticks: self.tick_count,
            obstacles: self.world.obstacles().count(),
            ..RunSummary::default()
        };
        for agent in self.world.agents() {
            summary.agents += 1;
            match agent.state {
                AgentState::Idle => summary.idle += 1,
                AgentState::Moving => summary.moving += 1,
                AgentState::Stopped => summary.stopped += 1,
                AgentState::Crashed => summary.crashed += 1,
                AgentState::OutOfFuel => summary.out_of_fuel += 1,
                AgentState::Finished => summary.finished += 1,
            }
        }
        summary
    }

    /// Hand out the one tick driver. A second claim fails.
    pub fn claim_driver(&mut self, mode: DriverMode) -> SimResult<TickDriver> {
        if let Some(existing) = self.driver {
            log::warn!("Refusing {mode:?} driver: {existing:?} already owns the tick");
            return Err(SimError::DriverAlreadyClaimed { existing });
        }
        self.driver = Some(mode);
        log::info!("Tick driver claimed: {mode:?}");

        let authority = TickAuthority::new(self.instance);
        Ok(match mode {
            DriverMode::Autonomous => TickDriver::Autonomous(AutonomousDriver::new(
                self.config.tick_dt(),
                self.control.clone(),
                authority,
            )),
            DriverMode::Stepped => TickDriver::Stepped(SteppedDriver::new(authority)),
        })
    }

    /// Run one fixed tick
    fn run_tick(&mut self) -> SimResult<()> {
        let decisions = self.decide_all()?;

        let mut moved = Vec::with_capacity(decisions.len());
        for (id, action) in decisions {
            if let Some(position) = self.integrate_agent(id, &action) {
                moved.push((id, position));
            }
        }

        for (id, position) in moved {
            self.world.grid.move_to(id, position.x(), position.y());
        }

        self.rerank();
        self.tick_count += 1;
        Ok(())
    }

    /// Phase one: every live agent decides against the untouched world
    fn decide_all(&mut self) -> SimResult<Vec<(ObjectId, Action)>> {
        let mut cache = TtcCache::new();
        let mut scope = DecisionScope::new(&mut self.rng, &mut cache);

        let mut decisions = Vec::new();
        for agent in self.world.agents() {
            if agent.state.is_terminal() {
                continue;
            }
            let action = agent.policy().decide(agent, &self.world, &mut scope)?;
            decisions.push((agent.id, action));
        }
        Ok(decisions)
    }

    /// Phase two for one agent. Returns the new position when it moved.
    fn integrate_agent(&mut self, id: ObjectId, action: &Action) -> Option<Vector2D> {
        let dt = self.config.tick_dt();
        let agent = self.world.objects.get_mut(&id)?.as_agent_mut()?;

        let from = agent.position;
        let was = agent.state;
        agent.integrate(action, dt, self.config.fuel_usage);
        let to = agent.position;

        let mut event = None;
        if self.config.crash_on_boundary && to != from {
            // Velocity of one whole step: t <= 1 means the wall is inside it
            if let Some((t, piece)) = self.track.closest_hit(from, to - from) {
                if t <= 1.0 {
                    let contact = from + (to - from) * t;
                    agent.crash_at(contact);
                    log::debug!("Agent {id} hit {}", piece.name);
                    event = Some(StepEvent::Crashed(contact));
                }
            }
        }

        if event.is_none() && agent.state != AgentState::Crashed {
            if let Some(line) = self.track.finish_line() {
                if line.reached_checkpoint(agent.position) {
                    agent.checkpoint = true;
                } else if agent.checkpoint && line.crossed(from, agent.position) {
                    event = Some(if agent.complete_lap(self.config.lap_limit) {
                        StepEvent::Finished(agent.lap)
                    } else {
                        StepEvent::Lap(agent.lap)
                    });
                }
            }
        }

        if event.is_none() && was != AgentState::OutOfFuel && agent.state == AgentState::OutOfFuel {
            event = Some(StepEvent::OutOfFuel);
        }

        match event {
            Some(StepEvent::Crashed(at)) => {
                log::info!("Agent {id} crashed at ({:.1}, {:.1})", at.x(), at.y());
            }
            Some(StepEvent::OutOfFuel) => log::info!("Agent {id} ran out of fuel"),
            Some(StepEvent::Lap(lap)) => log::debug!("Agent {id} completed lap {lap}"),
            Some(StepEvent::Finished(lap)) => log::info!("Agent {id} finished after {lap} laps"),
            None => {}
        }

        (agent.position != from).then_some(agent.position)
    }

    fn rerank(&mut self) {
        self.leaderboard = rank(&self.snapshot());
    }
}

impl WorldView for SimulationEngine {
    fn find(&self, id: ObjectId) -> SimResult<&SimObject> {
        self.world.find(id)
    }

    fn neighbors(&self, position: Vector2D, radius: f64) -> Vec<ObjectId> {
        self.world.neighbors(position, radius)
    }
}

impl Steppable for SimulationEngine {
    fn advance_tick(&mut self, authority: &TickAuthority) -> SimResult<()> {
        if authority.engine() != self.instance {
            return Err(SimError::ForeignDriver {
                driver: authority.engine(),
                engine: self.instance,
            });
        }
        self.run_tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::action::ActionKind;
    use crate::sim::policy::FixedPolicy;

    fn quiet_config() -> SimConfig {
        SimConfig {
            num_agents: 0,
            num_obstacles: 0,
            ..SimConfig::default()
        }
    }

    fn scripted(engine: &mut SimulationEngine, x: f64, y: f64, dir: (f64, f64), speed: f64) -> ObjectId {
        engine.spawn_agent(
            Vector2D::new(x, y),
            Vector2D::from(dir),
            speed,
            Box::new(FixedPolicy(ActionKind::Maintain)),
        )
    }

    fn stepped(engine: &mut SimulationEngine) -> SteppedDriver {
        match engine.claim_driver(DriverMode::Stepped).unwrap() {
            TickDriver::Stepped(driver) => driver,
            TickDriver::Autonomous(_) => unreachable!(),
        }
    }

    /// As if the agent had already come round the far straight
    fn arm_checkpoint(engine: &mut SimulationEngine, id: ObjectId) {
        let agent = engine.world.objects.get_mut(&id).unwrap().as_agent_mut().unwrap();
        agent.checkpoint = true;
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = quiet_config();
        config.grid_cell_size = 0.0;
        assert!(matches!(SimulationEngine::new(config), Err(SimError::Config(_))));
    }

    #[test]
    fn test_ids_unique_across_kinds() {
        let mut engine = SimulationEngine::new(quiet_config()).unwrap();
        let obstacles = engine.init_obstacles(4);
        let agents = engine.init_agents(6);
        let mut all: Vec<ObjectId> = obstacles.into_iter().chain(agents).collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 10);
        assert_eq!(engine.world().len(), 10);
        assert_eq!(engine.world().grid().len(), 10);
    }

    #[test]
    fn test_spawns_inside_zones() {
        let mut engine = SimulationEngine::new(quiet_config()).unwrap();
        engine.init_agents(20);
        engine.init_obstacles(20);
        let geometry = engine.config().track;

        let agent_zone = geometry.agent_spawn_zone();
        for agent in engine.world().agents() {
            assert!(agent_zone.contains(agent.position));
            assert_eq!(agent.direction, Vector2D::new(-1.0, 0.0));
            assert!((50.0..=80.0).contains(&agent.speed));
        }
        let obstacle_zone = geometry.obstacle_spawn_zone();
        for obstacle in engine.world().obstacles() {
            assert!(obstacle_zone.contains(obstacle.position));
            assert_eq!(obstacle.end.x(), obstacle.position.x());
            assert!(obstacle.end.y() - obstacle.position.y() <= geometry.max_obstacle_length());
        }
    }

    #[test]
    fn test_obstacles_stop_at_inner_wall() {
        // Lane of 60 with the 15 wall margin: a 20 long segment started
        // near the top of the zone would poke 5 into the infield
        let mut engine = SimulationEngine::new(quiet_config()).unwrap();
        engine.init_obstacles(500);
        let inner = engine.config().track.inner_radius;

        let mut near_wall = 0;
        for obstacle in engine.world().obstacles() {
            assert!(obstacle.end.y() <= -inner, "{obstacle:?} crosses the inner wall");
            assert!(obstacle.end.y() >= obstacle.position.y());
            if obstacle.position.y() > -inner - 5.0 - 15.0 {
                near_wall += 1;
            }
        }
        assert!(near_wall > 0);
    }

    #[test]
    fn test_find_and_typed_lookup() {
        let mut engine = SimulationEngine::new(quiet_config()).unwrap();
        let rock = engine.spawn_obstacle(Vector2D::new(0.0, -130.0), Vector2D::new(0.0, -120.0));
        let car = scripted(&mut engine, -50.0, 130.0, (-1.0, 0.0), 10.0);

        assert_eq!(engine.find(rock).unwrap().kind(), ObjectKind::Obstacle);
        assert_eq!(engine.find_agent(car).unwrap().id, car);
        assert!(matches!(
            engine.find_agent(rock),
            Err(SimError::UnsupportedType { found: ObjectKind::Obstacle, .. })
        ));
        assert!(matches!(engine.find(ObjectId(999)), Err(SimError::NotFound { .. })));
    }

    #[test]
    fn test_neighbors_exact_distance() {
        let mut engine = SimulationEngine::new(quiet_config()).unwrap();
        let near = scripted(&mut engine, -50.0, 130.0, (-1.0, 0.0), 10.0);
        let far = scripted(&mut engine, -50.0 + 6.0, 130.0, (-1.0, 0.0), 10.0);
        // Segment start is 12 away, but the segment passes 3 away
        let wall = engine.spawn_obstacle(Vector2D::new(-47.0, 118.0), Vector2D::new(-47.0, 140.0));

        let found = engine.neighbors(Vector2D::new(-50.0, 130.0), 5.0);
        assert!(found.contains(&near));
        assert!(!found.contains(&far));
        assert!(found.contains(&wall));
    }

    #[test]
    fn test_tick_moves_agents_and_grid() {
        let mut engine = SimulationEngine::new(quiet_config()).unwrap();
        let id = scripted(&mut engine, -50.0, 130.0, (-1.0, 0.0), 60.0);
        let mut driver = stepped(&mut engine);

        for _ in 0..60 {
            driver.step(&mut engine).unwrap();
        }
        let agent = engine.find_agent(id).unwrap();
        assert!((agent.position.x() - -110.0).abs() < 1e-6);
        assert_eq!(agent.state, AgentState::Moving);
        assert_eq!(
            engine.world().grid().cell_of(id),
            Some(engine.world().grid().cell_key(agent.position.x(), agent.position.y()))
        );
        assert_eq!(engine.tick_count(), 60);
    }

    #[test]
    fn test_wall_crash_freezes_agent() {
        let mut engine = SimulationEngine::new(quiet_config()).unwrap();
        // 5 below the outer wall, heading up at 600 per second: 10 per tick
        let id = scripted(&mut engine, -50.0, 155.0, (0.0, 1.0), 600.0);
        let mut driver = stepped(&mut engine);
        driver.step(&mut engine).unwrap();

        let agent = engine.find_agent(id).unwrap();
        assert_eq!(agent.state, AgentState::Crashed);
        assert!((agent.position.y() - 160.0).abs() < 1e-9);
        assert_eq!(agent.speed, 0.0);
        assert!(engine.leaderboard().is_empty());

        // Terminal: further ticks change nothing
        driver.step(&mut engine).unwrap();
        assert!((engine.find_agent(id).unwrap().position.y() - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_crossing_finish_line_counts_lap() {
        let mut config = quiet_config();
        config.lap_limit = 2;
        let mut engine = SimulationEngine::new(config).unwrap();
        let id = scripted(&mut engine, 0.5, 130.0, (-1.0, 0.0), 60.0);
        arm_checkpoint(&mut engine, id);
        let mut driver = stepped(&mut engine);

        driver.step(&mut engine).unwrap();
        let agent = engine.find_agent(id).unwrap();
        assert_eq!(agent.lap, 1);
        assert!(!agent.checkpoint);
        assert_eq!(engine.leaderboard()[0].lap, 1);
    }

    #[test]
    fn test_crossing_without_checkpoint_is_not_a_lap() {
        let mut engine = SimulationEngine::new(quiet_config()).unwrap();
        let id = scripted(&mut engine, 0.5, 130.0, (-1.0, 0.0), 60.0);
        let mut driver = stepped(&mut engine);

        driver.step(&mut engine).unwrap();
        let agent = engine.find_agent(id).unwrap();
        assert!(agent.position.x() < 0.0);
        assert_eq!(agent.lap, 0);
    }

    #[test]
    fn test_far_straight_arms_checkpoint() {
        let mut engine = SimulationEngine::new(quiet_config()).unwrap();
        let low = scripted(&mut engine, -50.0, -130.0, (1.0, 0.0), 60.0);
        let high = scripted(&mut engine, -50.0, 130.0, (-1.0, 0.0), 60.0);
        let mut driver = stepped(&mut engine);

        driver.step(&mut engine).unwrap();
        assert!(engine.find_agent(low).unwrap().checkpoint);
        assert!(!engine.find_agent(high).unwrap().checkpoint);
    }

    #[test]
    fn test_lap_limit_finishes_agent() {
        let mut config = quiet_config();
        config.lap_limit = 1;
        let mut engine = SimulationEngine::new(config).unwrap();
        let id = scripted(&mut engine, 0.5, 130.0, (-1.0, 0.0), 60.0);
        arm_checkpoint(&mut engine, id);
        let mut driver = stepped(&mut engine);

        driver.step(&mut engine).unwrap();
        let agent = engine.find_agent(id).unwrap();
        assert_eq!(agent.state, AgentState::Finished);
        assert_eq!(engine.summary().finished, 1);
        // Finished agents keep their place on the board
        assert_eq!(engine.leaderboard().len(), 1);
    }

    #[test]
    fn test_out_of_fuel_stays_ranked() {
        let mut config = quiet_config();
        config.initial_fuel = 0.5;
        let mut engine = SimulationEngine::new(config).unwrap();
        let id = scripted(&mut engine, -50.0, 130.0, (-1.0, 0.0), 60.0);
        let mut driver = stepped(&mut engine);

        driver.step(&mut engine).unwrap();
        assert_eq!(engine.find_agent(id).unwrap().state, AgentState::OutOfFuel);
        assert_eq!(engine.leaderboard().len(), 1);
        assert_eq!(engine.summary().out_of_fuel, 1);
    }

    #[test]
    fn test_second_driver_claim_fails() {
        let mut engine = SimulationEngine::new(quiet_config()).unwrap();
        let driver = engine.claim_driver(DriverMode::Stepped).unwrap();
        assert_eq!(driver.mode(), DriverMode::Stepped);
        assert!(matches!(
            engine.claim_driver(DriverMode::Autonomous),
            Err(SimError::DriverAlreadyClaimed { existing: DriverMode::Stepped })
        ));
    }

    #[test]
    fn test_driver_cannot_tick_another_engine() {
        let mut mine = SimulationEngine::new(quiet_config()).unwrap();
        let mut other = SimulationEngine::new(quiet_config()).unwrap();
        let mut driver = stepped(&mut mine);

        assert!(matches!(
            driver.step(&mut other),
            Err(SimError::ForeignDriver { .. })
        ));
        assert_eq!(other.tick_count(), 0);
        assert_eq!(driver.ticks(), 0);

        driver.step(&mut mine).unwrap();
        assert_eq!(mine.tick_count(), 1);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut engine = SimulationEngine::new(quiet_config()).unwrap();
        scripted(&mut engine, -50.0, 130.0, (-1.0, 0.0), 60.0);
        let before = engine.snapshot();
        stepped(&mut engine).step(&mut engine).unwrap();
        let after = engine.snapshot();
        assert_ne!(before[0].position, after[0].position);
    }
}
