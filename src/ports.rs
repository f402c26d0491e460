//! Port traits — the boundary between control logic and hardware drivers.
//!
//! ```text
//!   Driver adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Concrete sensor/actuator drivers (DHT22, relay boards, the feeding
//! servo) live outside this crate and implement these traits; controllers
//! consume them as boxed trait objects handed over at construction time.
//! All port errors are typed — callers handle every variant explicitly.

use std::time::{Duration, Instant};

use chrono::Timelike;

use crate::error::{ActuatorWriteError, SensorReadError};

// ───────────────────────────────────────────────────────────────
// Sensor port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one scalar measurement per call.
pub trait SensorPort {
    fn read(&mut self) -> Result<f32, SensorReadError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for on/off actuators (relays).
pub trait SwitchPort {
    fn set(&mut self, on: bool) -> Result<(), ActuatorWriteError>;
}

/// Write-side port for the feeding servo: a single bounded sweep.
pub trait PulsePort {
    /// Open the trap, hold it for `width`, close it again.  Blocks for
    /// at most `width` plus the sweep time.
    fn pulse(&mut self, width: Duration) -> Result<(), ActuatorWriteError>;

    /// Drive the servo to its closed rest position without sweeping.
    /// Used by the startup self-test to verify the line is reachable.
    fn hold_closed(&mut self) -> Result<(), ActuatorWriteError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Time source for schedule-driven controllers.
///
/// `hour_of_day` returns `None` when wall-clock time is not available
/// (RTC not set, NTP not synced); schedule controllers hold their
/// previous state in that case.
pub trait Clock {
    /// Monotonic time since process start.
    fn uptime(&self) -> Duration;

    /// Local hour of day (0–23), if wall-clock time is available.
    fn hour_of_day(&self) -> Option<u8>;
}

/// Production clock backed by `Instant` and the system local time.
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    fn hour_of_day(&self) -> Option<u8> {
        Some(chrono::Local::now().hour() as u8)
    }
}

// ───────────────────────────────────────────────────────────────
// Boxed forwarding impls
// ───────────────────────────────────────────────────────────────

impl<T: SensorPort + ?Sized> SensorPort for Box<T> {
    fn read(&mut self) -> Result<f32, SensorReadError> {
        (**self).read()
    }
}

impl<T: SwitchPort + ?Sized> SwitchPort for Box<T> {
    fn set(&mut self, on: bool) -> Result<(), ActuatorWriteError> {
        (**self).set(on)
    }
}

impl<T: PulsePort + ?Sized> PulsePort for Box<T> {
    fn pulse(&mut self, width: Duration) -> Result<(), ActuatorWriteError> {
        (**self).pulse(width)
    }

    fn hold_closed(&mut self) -> Result<(), ActuatorWriteError> {
        (**self).hold_closed()
    }
}

// ───────────────────────────────────────────────────────────────
// Timeout hardening
// ───────────────────────────────────────────────────────────────

/// Budget wrapper for any port.
///
/// A synchronous driver call cannot be preempted, so a stalled probe
/// still stalls the cycle — but an over-budget call is *surfaced* as
/// `Timeout` instead of silently returning a stale success, and the
/// result of the slow call is discarded.  Wrap driver adapters whose
/// bus can wedge (1-wire, I²C).
pub struct Budgeted<P> {
    inner: P,
    budget: Duration,
}

impl<P> Budgeted<P> {
    pub fn new(inner: P, budget: Duration) -> Self {
        Self { inner, budget }
    }
}

impl<P: SensorPort> SensorPort for Budgeted<P> {
    fn read(&mut self) -> Result<f32, SensorReadError> {
        let start = Instant::now();
        let value = self.inner.read()?;
        if start.elapsed() > self.budget {
            log::warn!(
                "sensor read exceeded budget ({:?} > {:?})",
                start.elapsed(),
                self.budget
            );
            return Err(SensorReadError::Timeout);
        }
        Ok(value)
    }
}

impl<P: SwitchPort> SwitchPort for Budgeted<P> {
    fn set(&mut self, on: bool) -> Result<(), ActuatorWriteError> {
        let start = Instant::now();
        self.inner.set(on)?;
        if start.elapsed() > self.budget {
            log::warn!(
                "actuator write exceeded budget ({:?} > {:?})",
                start.elapsed(),
                self.budget
            );
            return Err(ActuatorWriteError::Timeout);
        }
        Ok(())
    }
}
