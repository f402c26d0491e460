//! Startup sequencing and the control loop.
//!
//! The orchestrator owns the pin registry and the four controllers built
//! over it.  Startup is all-or-nothing: every controller must claim its
//! pins, build its driver ports and pass its self-test, or the whole
//! start fails and every claim is rolled back.  Once running, faults are
//! isolated per controller and per cycle — one failing step never stops
//! the others.

use core::fmt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info};

use crate::config::SystemConfig;
use crate::controllers::feeding::FeedingController;
use crate::controllers::light::LightController;
use crate::controllers::threshold::ThresholdController;
use crate::controllers::{Controller, ControllerId, ControllerStatus};
use crate::error::{FatalError, RegistryError, StepError};
use crate::pins::{self, PinSpec, PinTable};
use crate::ports::{Budgeted, Clock, PulsePort, SensorPort, SwitchPort};
use crate::registry::PinRegistry;

/// Cycle records kept for diagnostics.
const CYCLE_HISTORY: usize = 100;

/// Poll granularity of the inter-cycle pause, so a stop request is
/// honoured promptly.
const PAUSE_SLICE: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Hardware bridge
// ---------------------------------------------------------------------------

/// Factory seam between the orchestrator and the driver layer.
///
/// The orchestrator hands over the claimed pin and gets back a boxed
/// port.  The production bridge opens real GPIO lines; the simulation
/// bridge (and the test mocks) return scripted ports.
pub trait HardwareBridge {
    fn sensor(&mut self, name: &str, spec: &PinSpec) -> anyhow::Result<Box<dyn SensorPort>>;
    fn switch(&mut self, name: &str, spec: &PinSpec) -> anyhow::Result<Box<dyn SwitchPort>>;
    fn feeder(&mut self, name: &str, spec: &PinSpec) -> anyhow::Result<Box<dyn PulsePort>>;
}

// ---------------------------------------------------------------------------
// Cycle records
// ---------------------------------------------------------------------------

/// Outcome of one controller's step within a cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleOutcome {
    pub controller: ControllerId,
    pub result: Result<(), StepError>,
}

/// Everything that happened in one control cycle.
#[derive(Debug, Clone)]
pub struct CycleRecord {
    pub cycle: u64,
    pub outcomes: Vec<CycleOutcome>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    registry: PinRegistry,
    controllers: Vec<Box<dyn Controller>>,
    cycle_interval: Duration,
    history: VecDeque<CycleRecord>,
    cycle: u64,
}

impl Orchestrator {
    /// Bring the whole system up: establish the pin namespace, then
    /// build and self-test every controller in fixed order.
    ///
    /// All-or-nothing: on any failure every claim already made is
    /// released, the registry is torn down, and the error names the
    /// controller (or pin) that could not start.
    pub fn initialize(
        config: &SystemConfig,
        table: PinTable,
        bridge: &mut dyn HardwareBridge,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FatalError> {
        let mut registry = PinRegistry::with_table(table)?;
        registry.initialize()?;

        let controllers = match build_controllers(&mut registry, config, bridge, &clock) {
            Ok(controllers) => controllers,
            Err(e) => {
                error!("startup failed: {e}");
                registry.cleanup();
                return Err(e);
            }
        };
        info!("all {} controllers up", controllers.len());

        Ok(Self {
            registry,
            controllers,
            cycle_interval: Duration::from_secs(config.cycle_interval_secs),
            history: VecDeque::with_capacity(CYCLE_HISTORY),
            cycle: 0,
        })
    }

    /// Execute one control cycle: step every controller in fixed order,
    /// recording each outcome.  A failing step is logged and recorded
    /// but never stops the remaining controllers.
    pub fn run_cycle(&mut self) -> CycleRecord {
        self.cycle += 1;
        let mut outcomes = Vec::with_capacity(self.controllers.len());
        for controller in &mut self.controllers {
            let id = controller.id();
            let result = controller.control();
            if let Err(e) = result {
                error!("{id}: control step failed: {e}");
            }
            outcomes.push(CycleOutcome {
                controller: id,
                result,
            });
        }

        let record = CycleRecord {
            cycle: self.cycle,
            outcomes,
        };
        if self.history.len() == CYCLE_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(record.clone());
        record
    }

    /// The control loop: cycle, pause, repeat until `stop` is raised,
    /// then tear down.  The inter-cycle pause is the only place the
    /// loop sleeps; the stop flag is re-checked every [`PAUSE_SLICE`].
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), FatalError> {
        if !self.registry.is_initialized() {
            return Err(FatalError::Loop("control loop started after teardown"));
        }
        info!("control loop running, one cycle per {:?}", self.cycle_interval);

        while !stop.load(Ordering::Relaxed) {
            self.run_cycle();
            self.pause(stop);
        }

        info!("stop requested after {} cycle(s)", self.cycle);
        self.shutdown();
        Ok(())
    }

    fn pause(&self, stop: &AtomicBool) {
        let deadline = Instant::now() + self.cycle_interval;
        loop {
            if stop.load(Ordering::Relaxed) {
                return;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return;
            }
            thread::sleep(remaining.min(PAUSE_SLICE));
        }
    }

    /// Tear down the pin namespace.  Idempotent: the registry's cleanup
    /// runs once, later calls are no-ops.
    pub fn shutdown(&mut self) {
        self.registry.cleanup();
    }

    // ── Queries ───────────────────────────────────────────────

    /// Point-in-time status of every controller, in cycle order.
    pub fn statuses(&self) -> Vec<ControllerStatus> {
        self.controllers.iter().map(|c| c.status()).collect()
    }

    /// Recorded cycles, oldest first (bounded at [`CYCLE_HISTORY`]).
    pub fn history(&self) -> impl Iterator<Item = &CycleRecord> {
        self.history.iter()
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle
    }

    pub fn registry(&self) -> &PinRegistry {
        &self.registry
    }
}

// Boxed controllers carry no useful Debug of their own; summarise.
impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("controllers", &self.controllers.len())
            .field("cycle", &self.cycle)
            .field("claimed", &self.registry.claimed_count())
            .finish_non_exhaustive()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        // Cleanup is flag-guarded, so a normal shutdown followed by the
        // drop does the work exactly once.
        self.registry.cleanup();
    }
}

// ---------------------------------------------------------------------------
// Controller construction
// ---------------------------------------------------------------------------

/// The pins each controller claims, keyed by identity.
fn pins_for(id: ControllerId) -> &'static [&'static str] {
    match id {
        ControllerId::Temperature => &[pins::TEMP_SENSOR, pins::HEATER_RELAY],
        ControllerId::Humidity => &[pins::HUMIDITY_SENSOR, pins::MIST_RELAY],
        ControllerId::Light => &[pins::LIGHT_RELAY],
        ControllerId::Feeding => &[pins::FEEDING_SERVO],
    }
}

/// Build every controller in [`ControllerId::ALL`] order, claiming pins
/// as it goes.  On any failure all claims made so far are released
/// before the error is returned.
fn build_controllers(
    registry: &mut PinRegistry,
    config: &SystemConfig,
    bridge: &mut dyn HardwareBridge,
    clock: &Arc<dyn Clock>,
) -> Result<Vec<Box<dyn Controller>>, FatalError> {
    let mut controllers: Vec<Box<dyn Controller>> = Vec::with_capacity(ControllerId::ALL.len());

    for id in ControllerId::ALL {
        match build_one(registry, config, bridge, clock, id) {
            Ok(controller) => controllers.push(controller),
            Err(e) => {
                for owner in ControllerId::ALL {
                    registry.release(owner);
                }
                return Err(e);
            }
        }
    }

    Ok(controllers)
}

fn build_one(
    registry: &mut PinRegistry,
    config: &SystemConfig,
    bridge: &mut dyn HardwareBridge,
    clock: &Arc<dyn Clock>,
    id: ControllerId,
) -> Result<Box<dyn Controller>, FatalError> {
    registry.acquire(id, pins_for(id))?;

    let budget = Duration::from_millis(config.hardware_budget_ms);
    let init_err = |e: anyhow::Error| FatalError::ControllerInit {
        controller: id,
        reason: e.to_string(),
    };

    let mut controller: Box<dyn Controller> = match id {
        ControllerId::Temperature => {
            let sensor = bridge
                .sensor(pins::TEMP_SENSOR, &spec_of(registry, pins::TEMP_SENSOR)?)
                .map_err(init_err)?;
            let relay = bridge
                .switch(pins::HEATER_RELAY, &spec_of(registry, pins::HEATER_RELAY)?)
                .map_err(init_err)?;
            Box::new(ThresholdController::heating(
                &config.temperature,
                Budgeted::new(sensor, budget),
                Budgeted::new(relay, budget),
                Arc::clone(clock),
            ))
        }
        ControllerId::Humidity => {
            let sensor = bridge
                .sensor(
                    pins::HUMIDITY_SENSOR,
                    &spec_of(registry, pins::HUMIDITY_SENSOR)?,
                )
                .map_err(init_err)?;
            let relay = bridge
                .switch(pins::MIST_RELAY, &spec_of(registry, pins::MIST_RELAY)?)
                .map_err(init_err)?;
            Box::new(ThresholdController::misting(
                &config.humidity,
                Budgeted::new(sensor, budget),
                Budgeted::new(relay, budget),
                Arc::clone(clock),
            ))
        }
        ControllerId::Light => {
            let relay = bridge
                .switch(pins::LIGHT_RELAY, &spec_of(registry, pins::LIGHT_RELAY)?)
                .map_err(init_err)?;
            Box::new(LightController::new(
                &config.light,
                Budgeted::new(relay, budget),
                Arc::clone(clock),
            ))
        }
        ControllerId::Feeding => {
            let servo = bridge
                .feeder(pins::FEEDING_SERVO, &spec_of(registry, pins::FEEDING_SERVO)?)
                .map_err(init_err)?;
            Box::new(FeedingController::new(
                &config.feeding,
                servo,
                Arc::clone(clock),
            ))
        }
    };

    if !controller.check_status() {
        return Err(FatalError::ControllerInit {
            controller: id,
            reason: "startup self-test failed".into(),
        });
    }
    info!("{id}: self-test passed");
    Ok(controller)
}

fn spec_of(registry: &PinRegistry, name: &str) -> Result<PinSpec, FatalError> {
    registry
        .spec(name)
        .copied()
        .ok_or_else(|| FatalError::Registry(RegistryError::UnknownPin(name.to_owned())))
}
