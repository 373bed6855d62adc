//! Mission phases and the pure decisions that move between them.

use std::time::Duration;

use crate::config::FlightConfig;

/// Mission phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissionPhase {
    /// Plan the next segment from the resume state
    SegmentStart,
    /// Disarmed neutral frame before touching the waypoint table
    NeutralizeControls,
    /// Write the segment's waypoints
    UploadWaypoints,
    Arm,
    /// Manual climb to cruise altitude
    Takeoff,
    /// Flight controller flies the waypoint table
    Cruise,
    /// Watch altitude until the mission's own descent is low enough
    LandingTriggerWait,
    /// Closed-loop descent onto the home pad
    PrecisionLanding,
    SegmentDone,
    /// On the pad between segments
    RechargeReturn,
    /// Motors off, channel released
    Shutdown,
}

impl MissionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            MissionPhase::SegmentStart => "segment_start",
            MissionPhase::NeutralizeControls => "neutralize_controls",
            MissionPhase::UploadWaypoints => "upload_waypoints",
            MissionPhase::Arm => "arm",
            MissionPhase::Takeoff => "takeoff",
            MissionPhase::Cruise => "cruise",
            MissionPhase::LandingTriggerWait => "landing_trigger_wait",
            MissionPhase::PrecisionLanding => "precision_landing",
            MissionPhase::SegmentDone => "segment_done",
            MissionPhase::RechargeReturn => "recharge_return",
            MissionPhase::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for MissionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress of the manual climb.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TakeoffStep {
    /// Keep full climb throttle (also while altitude is unknown)
    Climbing,
    /// Close to cruise altitude, reduce climb rate
    SlowClimb,
    /// Takeoff complete
    Reached,
}

pub fn classify_takeoff(altitude_m: Option<f64>, config: &FlightConfig) -> TakeoffStep {
    match altitude_m {
        Some(alt) if alt >= config.takeoff_altitude_m => TakeoffStep::Reached,
        Some(alt) if alt >= config.slow_climb_altitude_m => TakeoffStep::SlowClimb,
        _ => TakeoffStep::Climbing,
    }
}

/// Outcome of one landing trigger poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerDecision {
    Wait,
    /// Switch to precision landing
    Engage,
    /// Segment ran too long; abort the mission
    Abort,
}

/// Decide whether the mission descent is low enough to take over.
///
/// The guard time keeps the trigger from firing on the climb-out, where the
/// vehicle passes the same altitude band.
pub fn landing_trigger(
    altitude_m: Option<f64>,
    elapsed: Duration,
    config: &FlightConfig,
) -> TriggerDecision {
    if let Some(alt) = altitude_m
        && alt < config.trigger_altitude_m
        && elapsed > config.trigger_guard()
    {
        return TriggerDecision::Engage;
    }
    if elapsed > config.segment_timeout() {
        TriggerDecision::Abort
    } else {
        TriggerDecision::Wait
    }
}

/// True once the vehicle is on the ground. Unknown altitude never counts.
pub fn has_touched_down(altitude_m: Option<f64>, config: &FlightConfig) -> bool {
    altitude_m.is_some_and(|alt| alt <= config.touchdown_altitude_m)
}

/// Phase following a landed segment.
pub fn after_segment(finished: bool) -> MissionPhase {
    if finished {
        MissionPhase::Shutdown
    } else {
        MissionPhase::RechargeReturn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_takeoff_thresholds() {
        let cfg = FlightConfig::default();
        assert_eq!(classify_takeoff(None, &cfg), TakeoffStep::Climbing);
        assert_eq!(classify_takeoff(Some(0.0), &cfg), TakeoffStep::Climbing);
        assert_eq!(classify_takeoff(Some(19.9), &cfg), TakeoffStep::Climbing);
        assert_eq!(classify_takeoff(Some(20.0), &cfg), TakeoffStep::SlowClimb);
        assert_eq!(classify_takeoff(Some(44.9), &cfg), TakeoffStep::SlowClimb);
        assert_eq!(classify_takeoff(Some(45.0), &cfg), TakeoffStep::Reached);
    }

    #[test]
    fn test_trigger_needs_low_altitude_and_guard_time() {
        let cfg = FlightConfig::default();
        let secs = Duration::from_secs;

        // Low on the climb-out, inside the guard window
        assert_eq!(landing_trigger(Some(10.0), secs(5), &cfg), TriggerDecision::Wait);
        // At exactly the guard time the trigger still waits
        assert_eq!(landing_trigger(Some(10.0), secs(20), &cfg), TriggerDecision::Wait);
        assert_eq!(landing_trigger(Some(10.0), secs(21), &cfg), TriggerDecision::Engage);
        // Cruising
        assert_eq!(landing_trigger(Some(50.0), secs(300), &cfg), TriggerDecision::Wait);
        assert_eq!(landing_trigger(Some(15.0), secs(300), &cfg), TriggerDecision::Wait);
        // Unknown altitude never engages
        assert_eq!(landing_trigger(None, secs(300), &cfg), TriggerDecision::Wait);
    }

    #[test]
    fn test_trigger_timeout() {
        let cfg = FlightConfig::default();
        assert_eq!(
            landing_trigger(Some(50.0), Duration::from_secs(1800), &cfg),
            TriggerDecision::Wait
        );
        assert_eq!(
            landing_trigger(Some(50.0), Duration::from_secs(1801), &cfg),
            TriggerDecision::Abort
        );
        assert_eq!(
            landing_trigger(None, Duration::from_secs(4000), &cfg),
            TriggerDecision::Abort
        );
        // A valid trigger wins over the timeout on the same poll
        assert_eq!(
            landing_trigger(Some(3.0), Duration::from_secs(4000), &cfg),
            TriggerDecision::Engage
        );
    }

    #[test]
    fn test_touchdown() {
        let cfg = FlightConfig::default();
        assert!(has_touched_down(Some(0.35), &cfg));
        assert!(has_touched_down(Some(-0.1), &cfg));
        assert!(!has_touched_down(Some(0.36), &cfg));
        assert!(!has_touched_down(None, &cfg));
    }

    #[test]
    fn test_after_segment() {
        assert_eq!(after_segment(true), MissionPhase::Shutdown);
        assert_eq!(after_segment(false), MissionPhase::RechargeReturn);
        assert_eq!(MissionPhase::PrecisionLanding.to_string(), "precision_landing");
    }
}
