//! SnakePilot - Coverage autopilot for a multirotor on an INAV flight controller
//!
//! Sweeps a rectangular corridor in a boustrophedon ("snake") pattern,
//! splitting the sweep into battery-sized segments. Each segment is uploaded
//! to the flight controller as a waypoint mission; between segments the
//! vehicle returns home and lands on the pad under a precision landing
//! controller fed by simulator telemetry.
//!
//! ## Layout
//!
//! - [`planning`]: snake path generation with recharge segmentation
//! - [`control`]: RC frames and the precision landing controller
//! - [`mission`]: the phase state machine driving one mission
//! - [`link`] / [`protocol`]: MSP command channel to the flight controller
//! - [`telemetry`]: simulator kinematics and bounded fix acquisition
//! - [`transport`]: TCP sessions that reconnect after a failed exchange
//! - [`clock`]: wall-clock and virtual time for the polling loops

pub mod clock;
pub mod config;
pub mod control;
pub mod error;
pub mod link;
pub mod mission;
pub mod planning;
pub mod protocol;
pub mod telemetry;
pub mod transport;

pub use clock::{Clock, SystemClock, VirtualClock};
pub use config::PilotConfig;
pub use error::{PilotError, Result};
pub use mission::{MissionController, MissionOutcome, MissionReport};
