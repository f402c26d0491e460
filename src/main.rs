//! Vivarium controller — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │              HardwareBridge (outer ring)             │
//! │   SimBridge (host)  ·  GPIO bridge (driver crate)    │
//! │                                                      │
//! │  ─────────────── Port trait boundary ─────────────── │
//! │                                                      │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │        Orchestrator + controllers (pure)       │  │
//! │  │  PinRegistry · Hysteresis · Schedules          │  │
//! │  └────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use vivarium::config::SystemConfig;
use vivarium::orchestrator::Orchestrator;
use vivarium::pins::{self, PinTable};
use vivarium::ports::SystemClock;
use vivarium::sim::SimBridge;

#[derive(Parser)]
#[command(name = "vivarium", version, about = "Live-animal enclosure controller")]
struct Cli {
    /// Common configuration file (JSON).  Built-in defaults when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Species-specific override file, overlaid on the common config.
    #[arg(long, value_name = "FILE", requires = "config")]
    species: Option<PathBuf>,

    /// Pin assignment table (JSON); defaults to the built-in board map.
    #[arg(long, value_name = "FILE")]
    pins: Option<PathBuf>,

    /// Run against the simulated enclosure instead of real hardware.
    #[arg(long)]
    sim: bool,

    /// Validate the configuration and pin wiring, then exit.
    #[arg(long)]
    check: bool,
}

/// Wiring consistency check: every line the controllers need exists
/// and no two logical names share a BCM number.
fn check_wiring(table: &PinTable) -> anyhow::Result<()> {
    for name in [
        pins::TEMP_SENSOR,
        pins::HUMIDITY_SENSOR,
        pins::HEATER_RELAY,
        pins::MIST_RELAY,
        pins::LIGHT_RELAY,
        pins::FEEDING_SERVO,
    ] {
        if !table.contains(name) {
            anyhow::bail!("pin table is missing '{name}'");
        }
    }
    let mut seen: HashMap<u8, &str> = HashMap::new();
    for (name, spec) in table.iter() {
        if let Some(other) = seen.insert(spec.bcm, name) {
            anyhow::bail!("BCM {} assigned to both '{other}' and '{name}'", spec.bcm);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    info!("vivarium v{}", env!("CARGO_PKG_VERSION"));

    // ── Configuration ─────────────────────────────────────────
    let config = match &cli.config {
        Some(path) => SystemConfig::load(path, cli.species.as_deref())
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            info!("no config file given, using built-in defaults");
            SystemConfig::default()
        }
    };

    let table = match &cli.pins {
        Some(path) => {
            PinTable::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => PinTable::default_board(),
    };

    if cli.check {
        check_wiring(&table)?;
        info!("configuration and wiring OK");
        return Ok(());
    }

    // ── Hardware bridge ───────────────────────────────────────
    // Real GPIO bridges live in a driver crate and are wired in at the
    // deployment build; this binary carries the simulation backend.
    if !cli.sim {
        anyhow::bail!("no GPIO backend in this build; run with --sim");
    }
    let mut bridge = SimBridge::new();
    info!("running against the simulated enclosure");

    // ── Stop flag ─────────────────────────────────────────────
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            warn!("interrupt received, stopping after the current cycle");
            stop.store(true, Ordering::Relaxed);
        })
        .context("installing the interrupt handler")?;
    }

    // ── Startup + control loop ────────────────────────────────
    let clock = Arc::new(SystemClock::new());
    let mut orchestrator = Orchestrator::initialize(&config, table, &mut bridge, clock)
        .context("system startup")?;

    orchestrator.run(&stop).context("control loop")?;

    for status in orchestrator.statuses() {
        info!(
            "{}: {} (last measured: {:?})",
            status.id, status.state, status.last_measured
        );
    }
    info!("shutdown complete after {} cycle(s)", orchestrator.cycle_count());
    Ok(())
}
