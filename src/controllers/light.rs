//! Photoperiod light controller.
//!
//! Schedule-triggered rather than threshold-triggered: the canopy relay
//! follows a daily on/off window.  The window may wrap past midnight
//! (nocturnal species get an inverted photoperiod).

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::config::LightSchedule;
use crate::error::{ActuatorWriteError, StepError};
use crate::ports::{Clock, SwitchPort};

use super::{ActuatorState, Controller, ControllerId, ControllerStatus};

/// Daily lighting window, hours 0–23.
#[derive(Debug, Clone, Copy)]
pub struct Photoperiod {
    pub on_hour: u8,
    pub off_hour: u8,
}

impl Photoperiod {
    /// Whether the light should be on at `hour`.
    pub fn is_lit(&self, hour: u8) -> bool {
        if self.on_hour <= self.off_hour {
            // e.g. 6..18 — daytime window
            hour >= self.on_hour && hour < self.off_hour
        } else {
            // e.g. 20..8 — wraps past midnight
            hour >= self.on_hour || hour < self.off_hour
        }
    }
}

pub struct LightController<A: SwitchPort> {
    window: Photoperiod,
    relay: A,
    clock: Arc<dyn Clock>,
    state: ActuatorState,
    last_actuation: Option<Duration>,
}

impl<A: SwitchPort> LightController<A> {
    pub fn new(schedule: &LightSchedule, relay: A, clock: Arc<dyn Clock>) -> Self {
        Self {
            window: Photoperiod {
                on_hour: schedule.on_hour,
                off_hour: schedule.off_hour,
            },
            relay,
            clock,
            state: ActuatorState::Idle,
            last_actuation: None,
        }
    }

    /// A `Timeout` still reached the line; record the transition so the
    /// state mirror keeps tracking the hardware, then surface it.
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
            info!("light: {} -> {}", self.state, next);
            self.state = next;
            self.last_actuation = Some(self.clock.uptime());
        }
    }
}

impl<A: SwitchPort> Controller for LightController<A> {
    fn id(&self) -> ControllerId {
        ControllerId::Light
    }

    fn check_status(&mut self) -> bool {
        // Schedule-only controller: the self-test is the safe-off write.
        let ok = self.relay.set(false).is_ok();
        if !ok {
            warn!("light: self-test relay unreachable");
        }
        ok
    }

    fn control(&mut self) -> Result<(), StepError> {
        let Some(hour) = self.clock.hour_of_day() else {
            // Wall clock not available yet: hold the previous state.
            debug!("light: no wall-clock time, holding {}", self.state);
            return Ok(());
        };

        let next = if self.window.is_lit(hour) {
            ActuatorState::Actuating
        } else {
            ActuatorState::Idle
        };
        self.apply(next)
    }

    fn status(&self) -> ControllerStatus {
        ControllerStatus {
            id: ControllerId::Light,
            state: self.state,
            last_measured: None,
            last_actuation: self.last_actuation,
        }
    }
}
