//! Vehicle telemetry from the simulator.
//!
//! Telemetry is advisory: a failed read means "unknown" for that poll and the
//! mission loop carries on with the next one.

pub mod fix;
pub mod sim;

pub use fix::{Fix, RetryPolicy};
pub use sim::SimTelemetry;

use serde::Deserialize;

use crate::error::Result;

/// Source of vehicle kinematics.
pub trait Telemetry {
    /// Take a fresh snapshot
    fn vehicle_state(&mut self) -> Result<VehicleState>;
}

/// One kinematics snapshot. Either part may be missing.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
pub struct VehicleState {
    /// World-frame position `[x, y, z]` in meters; z is altitude
    #[serde(default)]
    pub location: Option<[f64; 3]>,

    /// Attitude quaternion `[qx, qy, qz, qw]`
    #[serde(default)]
    pub orientation: Option<[f64; 4]>,
}

impl VehicleState {
    /// Altitude in meters
    pub fn altitude_m(&self) -> Option<f64> {
        self.location.map(|l| l[2])
    }

    /// Planar position in meters
    pub fn position_xy(&self) -> Option<(f64, f64)> {
        self.location.map(|l| (l[0], l[1]))
    }

    /// Heading in radians; zero when orientation is unknown
    pub fn yaw_rad(&self) -> f64 {
        self.orientation
            .map(|[qx, qy, qz, qw]| yaw_from_quaternion(qx, qy, qz, qw))
            .unwrap_or(0.0)
    }
}

/// Yaw (rotation about z) of a unit quaternion, in `[-π, π]`.
#[inline]
pub fn yaw_from_quaternion(qx: f64, qy: f64, qz: f64, qw: f64) -> f64 {
    let siny_cosp = 2.0 * (qw * qz + qx * qy);
    let cosy_cosp = 1.0 - 2.0 * (qy * qy + qz * qz);
    siny_cosp.atan2(cosy_cosp)
}
