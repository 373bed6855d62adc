//! Mission driver.
//!
//! Owns the command link, the telemetry source and the clock, and walks the
//! phase graph segment by segment:
//!
//! ```text
//! SegmentStart -> NeutralizeControls -> UploadWaypoints -> Arm -> Takeoff
//!   -> Cruise -> LandingTriggerWait -> PrecisionLanding -> SegmentDone
//!   -> RechargeReturn -> SegmentStart ...
//!   -> Shutdown
//! ```
//!
//! Every decision lives in [`super::phase`], the landing controller or the
//! planner. This module only performs I/O and sleeps.

use tracing::{debug, error, info, warn};

use super::phase::{
    MissionPhase, TakeoffStep, TriggerDecision, after_segment, classify_takeoff,
    has_touched_down, landing_trigger,
};
use super::{AbortReason, MissionOutcome, MissionReport};
use crate::clock::Clock;
use crate::config::{FlightConfig, MissionConfig, PilotConfig};
use crate::control::{LandingController, RcFrame};
use crate::error::{PilotError, Result};
use crate::link::FlightLink;
use crate::planning::{self, HomePosition, ResumePoint, SegmentPlan, SnakeConfig, Waypoint};
use crate::telemetry::{Fix, Telemetry, VehicleState};

use std::time::Duration;

/// How a landing trigger wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TriggerWait {
    Engaged,
    TimedOut,
}

/// Coverage mission state machine.
pub struct MissionController<L, T, C> {
    link: L,
    telemetry: T,
    clock: C,
    corridor: SnakeConfig,
    mission: MissionConfig,
    flight: FlightConfig,
    landing: LandingController,
}

impl<L: FlightLink, T: Telemetry, C: Clock> MissionController<L, T, C> {
    pub fn new(link: L, telemetry: T, clock: C, config: &PilotConfig) -> Self {
        Self {
            link,
            telemetry,
            clock,
            corridor: config.corridor.clone(),
            mission: config.mission.clone(),
            flight: config.flight.clone(),
            landing: LandingController::new(config.landing.clone()),
        }
    }

    /// Fly the whole corridor.
    ///
    /// Fails only when a start-up fix cannot be acquired, in which case no
    /// flight command has been sent. Once flying, every exit path runs the
    /// shutdown sequence and the outcome is reported in the returned
    /// [`MissionReport`].
    pub fn run(&mut self) -> Result<MissionReport> {
        let target = self.acquire_position()?;
        info!(
            "Landing target recorded at ({:.2}, {:.2})",
            target.0, target.1
        );

        let home = self.acquire_home()?;
        info!(
            "Home position: lat={} lon={}",
            home.latitude, home.longitude
        );

        let (segments_flown, outcome) = self.fly(home, target);
        self.shutdown();

        Ok(MissionReport {
            segments_flown,
            outcome,
        })
    }

    /// Walk the phase graph until the corridor is done or the mission aborts.
    fn fly(&mut self, home: HomePosition, target: (f64, f64)) -> (u32, MissionOutcome) {
        let mut phase = MissionPhase::SegmentStart;
        let mut plan: Option<SegmentPlan> = None;
        let mut resume: Option<ResumePoint> = None;
        let mut segment_started = self.clock.now();
        let mut segments = 0;

        loop {
            debug!(segment = segments + 1, "Phase: {}", phase);

            phase = match phase {
                MissionPhase::SegmentStart => {
                    let next = match planning::generate(
                        &self.corridor,
                        home,
                        self.mission.altitude_cm,
                        self.mission.speed_cms,
                        resume,
                        self.mission.recharge_every,
                    ) {
                        Ok(next) => next,
                        Err(e) => {
                            error!("Segment {} cannot be planned: {}", segments + 1, e);
                            return (segments, MissionOutcome::Aborted(AbortReason::PlanRejected));
                        }
                    };
                    info!(
                        "Segment {}: {} waypoints, resume at ({}, {}), finished={}",
                        segments + 1,
                        next.waypoints.len(),
                        next.next.latitude,
                        next.next.longitude,
                        next.finished
                    );
                    plan = Some(next);
                    MissionPhase::NeutralizeControls
                }

                MissionPhase::NeutralizeControls => {
                    self.send(&RcFrame::NEUTRAL);
                    self.clock.sleep(self.flight.neutral_settle());
                    MissionPhase::UploadWaypoints
                }

                MissionPhase::UploadWaypoints => {
                    let waypoints = plan.as_ref().map_or(&[][..], |p| p.waypoints.as_slice());
                    if let Err(e) = self.upload(waypoints) {
                        error!("Waypoint upload failed: {}", e);
                        return (segments, MissionOutcome::Aborted(AbortReason::UploadFailed));
                    }

                    // Flight controller re-initialises after the table changes
                    self.send(&RcFrame::NEUTRAL);
                    self.clock.sleep(self.flight.neutral_settle());
                    MissionPhase::Arm
                }

                MissionPhase::Arm => {
                    info!("Arming");
                    self.send(&RcFrame::ARM);
                    self.clock.sleep(self.flight.arm_settle());
                    MissionPhase::Takeoff
                }

                MissionPhase::Takeoff => {
                    self.take_off();
                    MissionPhase::Cruise
                }

                MissionPhase::Cruise => {
                    self.send(&RcFrame::LEVEL);
                    self.send(&RcFrame::MISSION_START);
                    segment_started = self.clock.now();
                    info!("Mission started");
                    MissionPhase::LandingTriggerWait
                }

                MissionPhase::LandingTriggerWait => match self.wait_for_trigger(segment_started) {
                    TriggerWait::Engaged => MissionPhase::PrecisionLanding,
                    TriggerWait::TimedOut => {
                        error!(
                            "Segment {} exceeded {}s without landing, aborting mission",
                            segments + 1,
                            self.flight.segment_timeout_secs
                        );
                        return (segments, MissionOutcome::Aborted(AbortReason::SegmentTimeout));
                    }
                },

                MissionPhase::PrecisionLanding => {
                    self.land(target);
                    MissionPhase::SegmentDone
                }

                MissionPhase::SegmentDone => {
                    segments += 1;
                    let finished = plan.as_ref().is_none_or(|p| p.finished);
                    if !finished {
                        resume = plan.as_ref().map(|p| p.next);
                    }
                    info!("Segment {} landed (finished={})", segments, finished);
                    after_segment(finished)
                }

                MissionPhase::RechargeReturn => {
                    info!("Recharging before segment {}", segments + 1);
                    MissionPhase::SegmentStart
                }

                MissionPhase::Shutdown => {
                    info!("Corridor covered in {} segments", segments);
                    return (segments, MissionOutcome::Completed);
                }
            };
        }
    }

    /// Record the first simulator position as the landing target.
    fn acquire_position(&mut self) -> Result<(f64, f64)> {
        let policy = self.flight.position_retry;
        let telemetry = &mut self.telemetry;

        let fix = policy.acquire(&mut self.clock, |attempt| {
            let position = match telemetry.vehicle_state() {
                Ok(state) => state.position_xy(),
                Err(e) => {
                    debug!("Position read {} failed: {}", attempt, e);
                    None
                }
            };
            if position.is_none() {
                warn!("No position yet (attempt {}/{})", attempt, policy.attempts);
            }
            position
        });

        match fix {
            Fix::Acquired(position) => Ok(position),
            Fix::NoFix => Err(PilotError::NoPositionFix {
                attempts: policy.attempts,
            }),
        }
    }

    /// Capture the GPS home position from the flight controller.
    fn acquire_home(&mut self) -> Result<HomePosition> {
        let policy = self.flight.gps_retry;
        let link = &mut self.link;

        let fix = policy.acquire(&mut self.clock, |attempt| {
            let home = match link.gps_fix() {
                Ok(Some(gps)) if gps.has_position() => {
                    debug!("GPS fix: {} satellites", gps.num_sat);
                    Some(HomePosition::new(gps.latitude, gps.longitude))
                }
                Ok(_) => None,
                Err(e) => {
                    debug!("GPS query {} failed: {}", attempt, e);
                    None
                }
            };
            if home.is_none() {
                warn!("Waiting for GPS fix (attempt {}/{})", attempt, policy.attempts);
            }
            home
        });

        match fix {
            Fix::Acquired(home) => Ok(home),
            Fix::NoFix => Err(PilotError::NoGpsFix {
                attempts: policy.attempts,
            }),
        }
    }

    /// Write the waypoint table. The first failure aborts the upload.
    fn upload(&mut self, waypoints: &[Waypoint]) -> Result<()> {
        info!("Uploading {} waypoints", waypoints.len());
        for wp in waypoints {
            self.link.set_waypoint(wp)?;
            debug!(
                "WP {}: lat={} lon={} alt={}cm flag={}",
                wp.sequence, wp.latitude, wp.longitude, wp.altitude_cm, wp.flag
            );
            self.clock.sleep(self.flight.upload_interval());
        }
        Ok(())
    }

    /// Manual climb to cruise altitude. Timing out is not fatal.
    fn take_off(&mut self) {
        info!("Taking off");
        self.send(&RcFrame::CLIMB);

        let deadline = self.clock.now() + self.flight.takeoff_timeout();
        let mut slowed = false;

        while self.clock.now() < deadline {
            let altitude = self.snapshot().altitude_m();
            match classify_takeoff(altitude, &self.flight) {
                TakeoffStep::Reached => {
                    info!("Takeoff complete at {:.1}m", altitude.unwrap_or_default());
                    return;
                }
                TakeoffStep::SlowClimb => {
                    if !slowed {
                        debug!("Approaching cruise altitude, reducing climb rate");
                        slowed = true;
                    }
                    self.send(&RcFrame::CLIMB_SLOW);
                }
                TakeoffStep::Climbing => {}
            }
            self.clock.sleep(self.flight.takeoff_poll());
        }

        warn!(
            "Takeoff altitude not reached within {}s, continuing",
            self.flight.takeoff_timeout_secs
        );
    }

    /// Poll until the mission's own descent is low enough to take over.
    fn wait_for_trigger(&mut self, started: Duration) -> TriggerWait {
        loop {
            let altitude = self.snapshot().altitude_m();
            let elapsed = self.clock.now().saturating_sub(started);

            match landing_trigger(altitude, elapsed, &self.flight) {
                TriggerDecision::Wait => self.clock.sleep(self.flight.trigger_poll()),
                TriggerDecision::Engage => {
                    info!(
                        "Landing trigger at {:.1}m after {:.0}s",
                        altitude.unwrap_or_default(),
                        elapsed.as_secs_f64()
                    );
                    return TriggerWait::Engaged;
                }
                TriggerDecision::Abort => return TriggerWait::TimedOut,
            }
        }
    }

    /// Closed-loop descent onto `target` until touchdown.
    fn land(&mut self, target: (f64, f64)) {
        info!(
            "Precision landing onto ({:.2}, {:.2})",
            target.0, target.1
        );
        self.send(&RcFrame::POSITION_HOLD);
        self.clock.sleep(self.flight.hold_settle());

        loop {
            let state = self.snapshot();
            let altitude = state.altitude_m();

            if has_touched_down(altitude, &self.flight) {
                info!("Touchdown");
                return;
            }

            if let Some(current) = state.position_xy() {
                let cmd = self
                    .landing
                    .compute(target, current, state.yaw_rad(), altitude);
                debug!(
                    "Landing: pos=({:.2}, {:.2}) alt={:?} -> roll={} pitch={} thr={}",
                    current.0, current.1, altitude, cmd.roll, cmd.pitch, cmd.throttle
                );
                self.send(&RcFrame::landing(cmd));
            }

            self.clock.sleep(self.flight.landing_tick());
        }
    }

    /// Stop the motors and release the link.
    fn shutdown(&mut self) {
        info!("Shutting down motors");
        for _ in 0..self.flight.shutdown_repeats {
            self.send(&RcFrame::MOTOR_CUTOFF);
            self.clock.sleep(self.flight.shutdown_interval());
        }
        if let Err(e) = self.link.close() {
            warn!("Failed to close flight controller link: {}", e);
        }
    }

    /// Send one RC frame. Failures are logged; the next tick sends a fresh one.
    fn send(&mut self, frame: &RcFrame) {
        if let Err(e) = self.link.send_rc(frame) {
            warn!("RC send failed: {}", e);
        }
    }

    /// Fresh telemetry snapshot; a failed read is all-unknown.
    fn snapshot(&mut self) -> VehicleState {
        self.telemetry.vehicle_state().unwrap_or_else(|e| {
            debug!("Telemetry read failed: {}", e);
            VehicleState::default()
        })
    }
}
