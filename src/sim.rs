//! Simulated hardware bridge for host-side runs.
//!
//! No GPIO, no sensors: each environment channel is a first-order model
//! that drifts towards ambient while its actuator is off and towards
//! the setpoint while it is on, so the hysteresis controllers cycle the
//! way they would over a real enclosure.  Deterministic on purpose, so
//! a simulated run is reproducible.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, info};

use crate::error::{ActuatorWriteError, SensorReadError};
use crate::orchestrator::HardwareBridge;
use crate::pins::{self, PinSpec};
use crate::ports::{PulsePort, SensorPort, SwitchPort};

/// One simulated environment variable and the actuator driving it.
struct Channel {
    value: f32,
    /// Drift per read while the actuator is off (towards ambient).
    fall: f32,
    /// Drift per read while the actuator is on (towards the setpoint).
    rise: f32,
    on: bool,
}

struct ChannelSensor {
    name: &'static str,
    channel: Rc<RefCell<Channel>>,
}

impl SensorPort for ChannelSensor {
    fn read(&mut self) -> Result<f32, SensorReadError> {
        let mut ch = self.channel.borrow_mut();
        if ch.on {
            ch.value += ch.rise;
        } else {
            ch.value -= ch.fall;
        }
        debug!("[sim] {} = {:.2}", self.name, ch.value);
        Ok(ch.value)
    }
}

struct ChannelRelay {
    name: String,
    channel: Option<Rc<RefCell<Channel>>>,
}

impl SwitchPort for ChannelRelay {
    fn set(&mut self, on: bool) -> Result<(), ActuatorWriteError> {
        if let Some(channel) = &self.channel {
            channel.borrow_mut().on = on;
        }
        debug!("[sim] {} relay {}", self.name, if on { "on" } else { "off" });
        Ok(())
    }
}

struct SimServo;

impl PulsePort for SimServo {
    fn pulse(&mut self, width: Duration) -> Result<(), ActuatorWriteError> {
        info!("[sim] trap door open for {width:?}");
        Ok(())
    }

    fn hold_closed(&mut self) -> Result<(), ActuatorWriteError> {
        debug!("[sim] trap door held closed");
        Ok(())
    }
}

/// Bridge handing out ports backed by the channel models above.
pub struct SimBridge {
    temperature: Rc<RefCell<Channel>>,
    humidity: Rc<RefCell<Channel>>,
}

impl SimBridge {
    pub fn new() -> Self {
        Self {
            // Starts a little cold and dry so the heater and mister
            // engage on the first cycles.
            temperature: Rc::new(RefCell::new(Channel {
                value: 22.0,
                fall: 0.2,
                rise: 0.5,
                on: false,
            })),
            humidity: Rc::new(RefCell::new(Channel {
                value: 55.0,
                fall: 0.8,
                rise: 2.5,
                on: false,
            })),
        }
    }
}

impl Default for SimBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareBridge for SimBridge {
    fn sensor(&mut self, name: &str, _spec: &PinSpec) -> anyhow::Result<Box<dyn SensorPort>> {
        match name {
            pins::TEMP_SENSOR => Ok(Box::new(ChannelSensor {
                name: "temperature",
                channel: Rc::clone(&self.temperature),
            })),
            pins::HUMIDITY_SENSOR => Ok(Box::new(ChannelSensor {
                name: "humidity",
                channel: Rc::clone(&self.humidity),
            })),
            other => anyhow::bail!("no simulated sensor for {other}"),
        }
    }

    fn switch(&mut self, name: &str, _spec: &PinSpec) -> anyhow::Result<Box<dyn SwitchPort>> {
        let channel = match name {
            pins::HEATER_RELAY => Some(Rc::clone(&self.temperature)),
            pins::MIST_RELAY => Some(Rc::clone(&self.humidity)),
            // The canopy light has no feedback channel.
            _ => None,
        };
        Ok(Box::new(ChannelRelay {
            name: name.to_owned(),
            channel,
        }))
    }

    fn feeder(&mut self, name: &str, _spec: &PinSpec) -> anyhow::Result<Box<dyn PulsePort>> {
        if name != pins::FEEDING_SERVO {
            anyhow::bail!("no simulated servo for {name}");
        }
        Ok(Box::new(SimServo))
    }
}
