//! Multi-segment coverage mission.
//!
//! A mission sweeps the corridor in segments. Each segment takes off from the
//! home pad, flies its uploaded waypoint table, lands back on the pad under
//! closed-loop control and waits for the next segment (battery swap or
//! recharge). The last segment shuts the motors down.

pub mod controller;
pub mod phase;

pub use controller::MissionController;
pub use phase::{MissionPhase, TakeoffStep, TriggerDecision};

/// Why a mission stopped before covering the corridor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbortReason {
    /// A segment did not reach the landing trigger in time
    SegmentTimeout,
    /// The segment could not be planned (waypoint table overflow)
    PlanRejected,
    /// The waypoint table could not be written
    UploadFailed,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::SegmentTimeout => write!(f, "segment timeout"),
            AbortReason::PlanRejected => write!(f, "segment plan rejected"),
            AbortReason::UploadFailed => write!(f, "waypoint upload failed"),
        }
    }
}

/// How the mission ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissionOutcome {
    Completed,
    Aborted(AbortReason),
}

/// Result of [`MissionController::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MissionReport {
    /// Segments that landed
    pub segments_flown: u32,
    pub outcome: MissionOutcome,
}

impl MissionReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == MissionOutcome::Completed
    }
}
