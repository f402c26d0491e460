//! Threshold (hysteresis) controller — temperature and humidity.
//!
//! One sensor, one relay, a dead-zone policy.  The same type backs the
//! heating and misting subsystems; only the configuration and the
//! claimed pins differ.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::config::ThresholdConfig;
use crate::control::hysteresis::{Demand, Hysteresis};
use crate::error::{ActuatorWriteError, SensorReadError, StepError};
use crate::ports::{Clock, SensorPort, SwitchPort};

use super::{ActuatorState, Controller, ControllerId, ControllerStatus};

pub struct ThresholdController<S: SensorPort, A: SwitchPort> {
    id: ControllerId,
    policy: Hysteresis,
    /// Plausibility range; readings outside it are rejected as
    /// `SensorReadError::OutOfRange`.
    min_valid: f32,
    max_valid: f32,
    sensor: S,
    relay: A,
    clock: Arc<dyn Clock>,
    state: ActuatorState,
    last_measured: Option<f32>,
    last_actuation: Option<Duration>,
}

impl<S: SensorPort, A: SwitchPort> ThresholdController<S, A> {
    pub fn new(
        id: ControllerId,
        cfg: &ThresholdConfig,
        sensor: S,
        relay: A,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id,
            policy: Hysteresis::new(cfg.target, cfg.band),
            min_valid: cfg.min_valid,
            max_valid: cfg.max_valid,
            sensor,
            relay,
            clock,
            state: ActuatorState::Idle,
            last_measured: None,
            last_actuation: None,
        }
    }

    /// Heating controller over the enclosure temperature probe.
    pub fn heating(cfg: &ThresholdConfig, sensor: S, relay: A, clock: Arc<dyn Clock>) -> Self {
        Self::new(ControllerId::Temperature, cfg, sensor, relay, clock)
    }

    /// Misting controller over the humidity probe.
    pub fn misting(cfg: &ThresholdConfig, sensor: S, relay: A, clock: Arc<dyn Clock>) -> Self {
        Self::new(ControllerId::Humidity, cfg, sensor, relay, clock)
    }

    fn read_validated(&mut self) -> Result<f32, SensorReadError> {
        let measured = self.sensor.read()?;
        if !(self.min_valid..=self.max_valid).contains(&measured) {
            warn!(
                "{}: reading {measured:.1} outside [{:.1}, {:.1}]",
                self.id, self.min_valid, self.max_valid
            );
            return Err(SensorReadError::OutOfRange);
        }
        Ok(measured)
    }

    /// Drive the relay to match `next`.  The write happens on every
    /// demanded step (relay writes are idempotent, and re-asserting the
    /// line lets a missed cycle self-heal); the state record and the
    /// actuation timestamp only move on an actual transition.
    ///
    /// A `Timeout` means the write reached the line but missed its
    /// budget — the transition is recorded anyway so the state mirror
    /// keeps tracking the hardware, and the timeout is still surfaced.
    fn apply(&mut self, next: ActuatorState) -> Result<(), StepError> {
        match self.relay.set(next == ActuatorState::Actuating) {
            Ok(()) => {
                self.record_transition(next);
                Ok(())
            }
            Err(ActuatorWriteError::Timeout) => {
                self.record_transition(next);
                Err(ActuatorWriteError::Timeout.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn record_transition(&mut self, next: ActuatorState) {
        if next != self.state {
            info!("{}: {} -> {}", self.id, self.state, next);
            self.state = next;
            self.last_actuation = Some(self.clock.uptime());
        }
    }
}

impl<S: SensorPort, A: SwitchPort> Controller for ThresholdController<S, A> {
    fn id(&self) -> ControllerId {
        self.id
    }

    fn check_status(&mut self) -> bool {
        // Probe the sensor and assert the safe relay state.  Both paths
        // must answer for the controller to be considered live.
        let sensor_ok = match self.read_validated() {
            Ok(v) => {
                debug!("{}: self-test read {v:.1}", self.id);
                true
            }
            Err(e) => {
                warn!("{}: self-test sensor failure: {e}", self.id);
                false
            }
        };
        let relay_ok = self.relay.set(false).is_ok();
        if !relay_ok {
            warn!("{}: self-test relay unreachable", self.id);
        }
        sensor_ok && relay_ok
    }

    fn control(&mut self) -> Result<(), StepError> {
        let measured = self.read_validated()?;
        self.last_measured = Some(measured);

        match self.policy.evaluate(measured) {
            Demand::Actuate => self.apply(ActuatorState::Actuating)?,
            Demand::Release => self.apply(ActuatorState::Idle)?,
            Demand::Hold => {
                debug!(
                    "{}: {measured:.1} within [{:.1}, {:.1}], holding {}",
                    self.id,
                    self.policy.lower(),
                    self.policy.upper(),
                    self.state
                );
            }
        }
        Ok(())
    }

    fn status(&self) -> ControllerStatus {
        ControllerStatus {
            id: self.id,
            state: self.state,
            last_measured: self.last_measured,
            last_actuation: self.last_actuation,
        }
    }
}
