//! Feeding controller — interval-scheduled trap-door servo.
//!
//! Unlike the threshold controllers this one is schedule-triggered: when
//! a feeding window opens it issues one bounded servo pulse per cycle
//! (trap open, hold, close) until the window's portion count is served,
//! then waits out the configured interval.  Feeding history is not
//! persisted; every process start begins a fresh window.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::config::FeedingSchedule;
use crate::error::StepError;
use crate::ports::{Clock, PulsePort};

use super::{ActuatorState, Controller, ControllerId, ControllerStatus};

pub struct FeedingController<P: PulsePort> {
    interval: Duration,
    feeds_per_window: u8,
    pulse_width: Duration,
    servo: P,
    clock: Arc<dyn Clock>,
    /// Uptime at which the current feeding window opened.
    window_start: Option<Duration>,
    feeds_done: u8,
    last_actuation: Option<Duration>,
}

impl<P: PulsePort> FeedingController<P> {
    pub fn new(schedule: &FeedingSchedule, servo: P, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval: Duration::from_secs(u64::from(schedule.interval_hours) * 3600),
            feeds_per_window: schedule.feeds_per_interval.max(1),
            pulse_width: Duration::from_secs(u64::from(schedule.trap_open_secs)),
            servo,
            clock,
            window_start: None,
            feeds_done: 0,
            last_actuation: None,
        }
    }

    fn feed(&mut self, now: Duration) -> Result<(), StepError> {
        self.servo.pulse(self.pulse_width)?;
        self.feeds_done += 1;
        self.last_actuation = Some(now);
        info!(
            "feeding: portion {}/{} served",
            self.feeds_done, self.feeds_per_window
        );
        Ok(())
    }
}

impl<P: PulsePort> Controller for FeedingController<P> {
    fn id(&self) -> ControllerId {
        ControllerId::Feeding
    }

    fn check_status(&mut self) -> bool {
        // Verify the servo line answers by asserting the closed rest
        // position — no sweep, no food dropped.
        let ok = self.servo.hold_closed().is_ok();
        if !ok {
            warn!("feeding: self-test servo unreachable");
        }
        ok
    }

    fn control(&mut self) -> Result<(), StepError> {
        let now = self.clock.uptime();

        match self.window_start {
            // First window opens immediately on startup.
            None => {
                self.window_start = Some(now);
                self.feeds_done = 0;
                self.feed(now)
            }
            Some(_) if self.feeds_done < self.feeds_per_window => {
                // Current window still has portions left: one bounded
                // pulse per cycle, never more.
                self.feed(now)
            }
            Some(start) if now.saturating_sub(start) >= self.interval => {
                info!("feeding: interval elapsed, opening new window");
                self.window_start = Some(now);
                self.feeds_done = 0;
                self.feed(now)
            }
            Some(_) => Ok(()), // Not due.
        }
    }

    fn status(&self) -> ControllerStatus {
        ControllerStatus {
            id: ControllerId::Feeding,
            // The pulse is bounded inside `control`; between cycles the
            // trap is always closed.
            state: ActuatorState::Idle,
            last_measured: None,
            last_actuation: self.last_actuation,
        }
    }
}
