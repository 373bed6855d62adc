//! Configuration loading for SnakePilot

use crate::control::LandingConfig;
use crate::error::{PilotError, Result};
use crate::planning::{MAX_SEGMENT_WAYPOINTS, SnakeConfig};
use crate::telemetry::RetryPolicy;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PilotConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub mission: MissionConfig,
    #[serde(default)]
    pub corridor: SnakeConfig,
    #[serde(default)]
    pub flight: FlightConfig,
    #[serde(default)]
    pub landing: LandingConfig,
}

/// Network connection settings
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Host running the flight controller (SITL) and simulator
    #[serde(default = "default_inav_host")]
    pub inav_host: String,

    /// MSP TCP port of the flight controller (default: 5762)
    #[serde(default = "default_inav_port")]
    pub inav_port: u16,

    /// Simulator telemetry port (default: 8080)
    #[serde(default = "default_sim_port")]
    pub sim_port: u16,

    /// Connect and read timeout in milliseconds (default: 5000)
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

/// Mission parameters
#[derive(Clone, Debug, Deserialize)]
pub struct MissionConfig {
    /// Cruise altitude for sweep waypoints (cm)
    #[serde(default = "default_altitude_cm")]
    pub altitude_cm: u32,

    /// Cruise speed for sweep waypoints (cm/s)
    #[serde(default = "default_speed_cms")]
    pub speed_cms: u16,

    /// Boundary hops per segment before returning home to recharge
    #[serde(default = "default_recharge_every")]
    pub recharge_every: u32,
}

/// Timing and thresholds for the flight phases
#[derive(Clone, Debug, Deserialize)]
pub struct FlightConfig {
    /// Settle time after the neutral (disarmed) frame
    #[serde(default = "default_neutral_settle_ms")]
    pub neutral_settle_ms: u64,

    /// Pause between waypoint uploads
    #[serde(default = "default_upload_interval_ms")]
    pub upload_interval_ms: u64,

    /// Settle time after arming
    #[serde(default = "default_arm_settle_ms")]
    pub arm_settle_ms: u64,

    /// Altitude poll interval during takeoff
    #[serde(default = "default_takeoff_poll_ms")]
    pub takeoff_poll_ms: u64,

    /// Give up waiting for takeoff altitude after this long (non-fatal)
    #[serde(default = "default_takeoff_timeout_secs")]
    pub takeoff_timeout_secs: u64,

    /// Reduce climb rate above this altitude (meters)
    #[serde(default = "default_slow_climb_altitude")]
    pub slow_climb_altitude_m: f64,

    /// Takeoff is complete at this altitude (meters)
    #[serde(default = "default_takeoff_altitude")]
    pub takeoff_altitude_m: f64,

    /// Poll interval while waiting for the landing trigger
    #[serde(default = "default_trigger_poll_ms")]
    pub trigger_poll_ms: u64,

    /// Precision landing engages below this altitude (meters)
    #[serde(default = "default_trigger_altitude")]
    pub trigger_altitude_m: f64,

    /// Landing trigger ignored until this long into the segment
    #[serde(default = "default_trigger_guard_secs")]
    pub trigger_guard_secs: u64,

    /// Abort the mission when a segment runs this long without landing
    #[serde(default = "default_segment_timeout_secs")]
    pub segment_timeout_secs: u64,

    /// Settle time after switching to position hold
    #[serde(default = "default_hold_settle_ms")]
    pub hold_settle_ms: u64,

    /// Precision landing control period
    #[serde(default = "default_landing_tick_ms")]
    pub landing_tick_ms: u64,

    /// Landed at or below this altitude (meters)
    #[serde(default = "default_touchdown_altitude")]
    pub touchdown_altitude_m: f64,

    /// Motor cutoff frames sent at shutdown
    #[serde(default = "default_shutdown_repeats")]
    pub shutdown_repeats: u32,

    /// Pause between motor cutoff frames
    #[serde(default = "default_shutdown_interval_ms")]
    pub shutdown_interval_ms: u64,

    /// GPS home fix acquisition
    #[serde(default = "default_gps_retry")]
    pub gps_retry: RetryPolicy,

    /// Initial simulator position acquisition
    #[serde(default = "default_position_retry")]
    pub position_retry: RetryPolicy,
}

// Default value functions
fn default_inav_host() -> String {
    "127.0.0.1".to_string()
}
fn default_inav_port() -> u16 {
    5762
}
fn default_sim_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    5000
}
fn default_altitude_cm() -> u32 {
    5000
}
fn default_speed_cms() -> u16 {
    2000
}
fn default_recharge_every() -> u32 {
    7
}

// Flight phase defaults
fn default_neutral_settle_ms() -> u64 {
    1000
}
fn default_upload_interval_ms() -> u64 {
    500
}
fn default_arm_settle_ms() -> u64 {
    500
}
fn default_takeoff_poll_ms() -> u64 {
    100
}
fn default_takeoff_timeout_secs() -> u64 {
    30
}
fn default_slow_climb_altitude() -> f64 {
    20.0
}
fn default_takeoff_altitude() -> f64 {
    45.0
} // 5m short of the 50m cruise altitude
fn default_trigger_poll_ms() -> u64 {
    500
}
fn default_trigger_altitude() -> f64 {
    15.0
}
fn default_trigger_guard_secs() -> u64 {
    20
}
fn default_segment_timeout_secs() -> u64 {
    1800
}
fn default_hold_settle_ms() -> u64 {
    500
}
fn default_landing_tick_ms() -> u64 {
    50
}
fn default_touchdown_altitude() -> f64 {
    0.35
}
fn default_shutdown_repeats() -> u32 {
    5
}
fn default_shutdown_interval_ms() -> u64 {
    500
}
fn default_gps_retry() -> RetryPolicy {
    RetryPolicy {
        attempts: 10,
        backoff_ms: 1000,
    }
}
fn default_position_retry() -> RetryPolicy {
    RetryPolicy {
        attempts: 10,
        backoff_ms: 500,
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            inav_host: default_inav_host(),
            inav_port: default_inav_port(),
            sim_port: default_sim_port(),
            timeout_ms: default_timeout(),
        }
    }
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            altitude_cm: default_altitude_cm(),
            speed_cms: default_speed_cms(),
            recharge_every: default_recharge_every(),
        }
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            neutral_settle_ms: default_neutral_settle_ms(),
            upload_interval_ms: default_upload_interval_ms(),
            arm_settle_ms: default_arm_settle_ms(),
            takeoff_poll_ms: default_takeoff_poll_ms(),
            takeoff_timeout_secs: default_takeoff_timeout_secs(),
            slow_climb_altitude_m: default_slow_climb_altitude(),
            takeoff_altitude_m: default_takeoff_altitude(),
            trigger_poll_ms: default_trigger_poll_ms(),
            trigger_altitude_m: default_trigger_altitude(),
            trigger_guard_secs: default_trigger_guard_secs(),
            segment_timeout_secs: default_segment_timeout_secs(),
            hold_settle_ms: default_hold_settle_ms(),
            landing_tick_ms: default_landing_tick_ms(),
            touchdown_altitude_m: default_touchdown_altitude(),
            shutdown_repeats: default_shutdown_repeats(),
            shutdown_interval_ms: default_shutdown_interval_ms(),
            gps_retry: default_gps_retry(),
            position_retry: default_position_retry(),
        }
    }
}

impl FlightConfig {
    pub fn neutral_settle(&self) -> Duration {
        Duration::from_millis(self.neutral_settle_ms)
    }

    pub fn upload_interval(&self) -> Duration {
        Duration::from_millis(self.upload_interval_ms)
    }

    pub fn arm_settle(&self) -> Duration {
        Duration::from_millis(self.arm_settle_ms)
    }

    pub fn takeoff_poll(&self) -> Duration {
        Duration::from_millis(self.takeoff_poll_ms)
    }

    pub fn takeoff_timeout(&self) -> Duration {
        Duration::from_secs(self.takeoff_timeout_secs)
    }

    pub fn trigger_poll(&self) -> Duration {
        Duration::from_millis(self.trigger_poll_ms)
    }

    pub fn trigger_guard(&self) -> Duration {
        Duration::from_secs(self.trigger_guard_secs)
    }

    pub fn segment_timeout(&self) -> Duration {
        Duration::from_secs(self.segment_timeout_secs)
    }

    pub fn hold_settle(&self) -> Duration {
        Duration::from_millis(self.hold_settle_ms)
    }

    pub fn landing_tick(&self) -> Duration {
        Duration::from_millis(self.landing_tick_ms)
    }

    pub fn shutdown_interval(&self) -> Duration {
        Duration::from_millis(self.shutdown_interval_ms)
    }
}

impl PilotConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PilotError::Config(format!("Failed to read config file: {}", e)))?;
        let config: PilotConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the planner and control loop cannot work with
    pub fn validate(&self) -> Result<()> {
        let corridor = &self.corridor;
        if corridor.lat_step == 0 {
            return Err(PilotError::Config("corridor.lat_step must be > 0".into()));
        }
        if corridor.left_lon == corridor.right_lon {
            return Err(PilotError::Config(
                "corridor.left_lon and corridor.right_lon must differ".into(),
            ));
        }
        if corridor.start_lat > corridor.end_lat {
            return Err(PilotError::Config(
                "corridor.start_lat must not exceed corridor.end_lat".into(),
            ));
        }
        if self.mission.recharge_every == 0 {
            return Err(PilotError::Config("mission.recharge_every must be >= 1".into()));
        }
        let longest = corridor.max_segment_len(self.mission.recharge_every);
        if longest > MAX_SEGMENT_WAYPOINTS {
            return Err(PilotError::Config(format!(
                "longest segment needs {} waypoints, the flight controller holds {}; \
                 lower mission.recharge_every or widen corridor.lat_step",
                longest, MAX_SEGMENT_WAYPOINTS
            )));
        }
        if self.landing.min_output > self.landing.max_output {
            return Err(PilotError::Config(
                "landing.min_output must not exceed landing.max_output".into(),
            ));
        }
        if self.flight.landing_tick_ms == 0 || self.flight.trigger_poll_ms == 0 {
            return Err(PilotError::Config("flight poll intervals must be > 0".into()));
        }
        Ok(())
    }

    /// Flight controller MSP address
    pub fn inav_address(&self) -> String {
        format!("{}:{}", self.connection.inav_host, self.connection.inav_port)
    }

    /// Simulator telemetry address (same host as the flight controller)
    pub fn sim_address(&self) -> String {
        format!("{}:{}", self.connection.inav_host, self.connection.sim_port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.connection.timeout_ms)
    }
}
