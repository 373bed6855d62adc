//! SnakePilot - Coverage autopilot binary
//!
//! Connects to the flight controller's MSP port and the simulator's telemetry
//! port, then flies the configured corridor in recharge-sized segments.
//!
//! Configuration comes from `--config <path>`, else `snake-pilot.toml` in the
//! working directory if present, else built-in defaults. Command line flags
//! override whatever was loaded.

use clap::Parser;
use snake_pilot::link::InavLink;
use snake_pilot::telemetry::SimTelemetry;
use snake_pilot::{MissionController, PilotConfig, Result, SystemClock};

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "snake-pilot.toml";

/// Snake coverage autopilot for INAV
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Flight controller / simulator host (default: 127.0.0.1)
    #[arg(long)]
    inav_host: Option<String>,

    /// Flight controller MSP TCP port (default: 5762)
    #[arg(long)]
    inav_port: Option<u16>,

    /// Simulator telemetry port (default: 8080)
    #[arg(long)]
    sim_port: Option<u16>,

    /// Boundary hops per segment before returning to recharge (default: 7)
    #[arg(long)]
    recharge_every: Option<u32>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("snake_pilot=info")),
        )
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the mission completed.
fn run(args: Args) -> Result<bool> {
    let config = load_config(&args)?;

    info!("SnakePilot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Corridor lat {}..{} step {}, recharge every {} hops",
        config.corridor.start_lat,
        config.corridor.end_lat,
        config.corridor.lat_step,
        config.mission.recharge_every
    );

    let link = InavLink::connect_timeout(&config.inav_address(), config.timeout())?;
    let telemetry = SimTelemetry::connect_timeout(&config.sim_address(), config.timeout())?;

    let mut controller = MissionController::new(link, telemetry, SystemClock::new(), &config);
    let report = controller.run()?;

    if report.is_completed() {
        info!("Mission completed: {} segments flown", report.segments_flown);
    } else {
        error!(
            "Mission aborted after {} segments: {:?}",
            report.segments_flown, report.outcome
        );
    }

    Ok(report.is_completed())
}

fn load_config(args: &Args) -> Result<PilotConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            PilotConfig::load(path)?
        }
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            info!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
            PilotConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => {
            info!("Using default configuration");
            PilotConfig::default()
        }
    };

    // Command line overrides
    if let Some(host) = &args.inav_host {
        config.connection.inav_host = host.clone();
    }
    if let Some(port) = args.inav_port {
        config.connection.inav_port = port;
    }
    if let Some(port) = args.sim_port {
        config.connection.sim_port = port;
    }
    if let Some(every) = args.recharge_every {
        config.mission.recharge_every = every;
    }

    config.validate()?;
    Ok(config)
}
