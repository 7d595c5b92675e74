//! Fixed timestep scheduling
//!
//! Wall time goes into an accumulator and comes out as whole ticks of the
//! same `dt`, so the simulation rate never depends on how often the driving
//! loop runs. Exactly one driver per engine may advance ticks: advancing
//! needs a [`TickAuthority`], and only the engine's `claim_driver` mints one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::SimResult;

/// Proof of the one claimed driver. Not `Clone`, and only the engine can
/// create it, so nothing outside a claimed driver can advance a tick.
///
/// ```compile_fail
/// use kinesis::sim::TickAuthority;
///
/// let forged = TickAuthority { engine: 0 };
/// ```
///
/// ```compile_fail
/// use kinesis::SimConfig;
/// use kinesis::sim::{SimulationEngine, SteppedDriver};
///
/// let mut engine = SimulationEngine::new(SimConfig::default()).unwrap();
/// let mut driver = SteppedDriver::new();
/// driver.step(&mut engine).unwrap();
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct TickAuthority {
    engine: u64,
}

impl TickAuthority {
    pub(crate) fn new(engine: u64) -> Self {
        Self { engine }
    }

    /// Instance id of the engine that issued this authority
    pub fn engine(&self) -> u64 {
        self.engine
    }
}

/// Something that advances by one fixed tick
pub trait Steppable {
    fn advance_tick(&mut self, authority: &TickAuthority) -> SimResult<()>;
}

/// Accumulator that turns elapsed time into fixed ticks
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStepper {
    dt: f64,
    accumulator: f64,
}

impl FixedStepper {
    pub fn new(dt: f64) -> Self {
        Self { dt, accumulator: 0.0 }
    }

    /// Resume from a known leftover
    pub fn with_accumulator(dt: f64, accumulator: f64) -> Self {
        Self { dt, accumulator }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Bank `frame_time` and drain it in whole ticks. Returns the number of
    /// ticks run; the leftover stays below `dt`.
    pub fn advance(
        &mut self,
        frame_time: f64,
        sim: &mut impl Steppable,
        authority: &TickAuthority,
    ) -> SimResult<u32> {
        self.accumulator += frame_time.max(0.0);

        let mut ticks = 0;
        while self.accumulator >= self.dt {
            sim.advance_tick(authority)?;
            self.accumulator -= self.dt;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Drop banked time, e.g. after a pause
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Which collaborator owns tick advancement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverMode {
    /// Wall-clock loop inside the engine process
    Autonomous,
    /// One tick per external call (render-driven)
    Stepped,
}

/// Shared start/pause flag. The only state that crosses threads.
#[derive(Debug, Clone)]
pub struct RunControl {
    running: Arc<AtomicBool>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RunControl {
    pub fn new(running: bool) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(running)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn pause(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            log::info!("Simulation paused");
        }
    }

    pub fn resume(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            log::info!("Simulation resumed");
        }
    }
}

/// Wall-clock driver. The pause flag is read only between accumulator
/// drains, never mid-tick.
#[derive(Debug)]
pub struct AutonomousDriver {
    stepper: FixedStepper,
    control: RunControl,
    last_frame: Option<Instant>,
    authority: TickAuthority,
}

impl AutonomousDriver {
    pub(crate) fn new(dt: f64, control: RunControl, authority: TickAuthority) -> Self {
        Self {
            stepper: FixedStepper::new(dt),
            control,
            last_frame: None,
            authority,
        }
    }

    pub fn control(&self) -> &RunControl {
        &self.control
    }

    pub fn stepper(&self) -> &FixedStepper {
        &self.stepper
    }

    /// Feed the time since the previous pump into the stepper.
    /// While paused, nothing is banked.
    pub fn pump(&mut self, sim: &mut impl Steppable) -> SimResult<u32> {
        if !self.control.is_running() {
            self.halt();
            return Ok(0);
        }

        let now = Instant::now();
        let frame_time = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f64());
        self.last_frame = Some(now);
        self.stepper.advance(frame_time, sim, &self.authority)
    }

    /// Feed a frame time measured by the host loop instead of the driver's
    /// own clock. Same pause rules as [`pump`](Self::pump).
    pub fn advance(&mut self, frame_time: f64, sim: &mut impl Steppable) -> SimResult<u32> {
        if !self.control.is_running() {
            self.halt();
            return Ok(0);
        }
        self.stepper.advance(frame_time, sim, &self.authority)
    }

    fn halt(&mut self) {
        self.last_frame = None;
        self.stepper.reset();
    }

    /// Pump for `duration` of wall time, sleeping a tick between pumps.
    /// Returns the total ticks run.
    pub fn run_for(&mut self, sim: &mut impl Steppable, duration: Duration) -> SimResult<u64> {
        let start = Instant::now();
        let nap = Duration::from_secs_f64(self.stepper.dt());
        let mut total = 0u64;

        while start.elapsed() < duration {
            total += u64::from(self.pump(sim)?);
            thread::sleep(nap);
        }
        // Bank the tail so the last partial frame still counts
        total += u64::from(self.pump(sim)?);
        Ok(total)
    }
}

/// Externally clocked driver: one tick per `step()`
#[derive(Debug)]
pub struct SteppedDriver {
    ticks: u64,
    authority: TickAuthority,
}

impl SteppedDriver {
    pub(crate) fn new(authority: TickAuthority) -> Self {
        Self { ticks: 0, authority }
    }

    pub fn step(&mut self, sim: &mut impl Steppable) -> SimResult<()> {
        sim.advance_tick(&self.authority)?;
        self.ticks += 1;
        Ok(())
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// The single tick authority handed out by the engine
#[derive(Debug)]
pub enum TickDriver {
    Autonomous(AutonomousDriver),
    Stepped(SteppedDriver),
}

impl TickDriver {
    pub fn mode(&self) -> DriverMode {
        match self {
            TickDriver::Autonomous(_) => DriverMode::Autonomous,
            TickDriver::Stepped(_) => DriverMode::Stepped,
        }
    }
}
