//! Command channel to the flight controller.

pub mod inav;

pub use inav::InavLink;

use crate::control::RcFrame;
use crate::error::Result;
use crate::planning::Waypoint;
use crate::protocol::RawGps;

/// Flight controller command channel.
///
/// Each call is one request/acknowledge exchange. Failed sends are not
/// retried here; the mission loop re-sends fresh commands on its next tick.
pub trait FlightLink {
    /// Override the RC channels
    fn send_rc(&mut self, frame: &RcFrame) -> Result<()>;

    /// Write one entry of the waypoint table
    fn set_waypoint(&mut self, waypoint: &Waypoint) -> Result<()>;

    /// Query the GPS receiver. `Ok(None)` while there is no position fix.
    fn gps_fix(&mut self) -> Result<Option<RawGps>>;

    /// Release the channel
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
