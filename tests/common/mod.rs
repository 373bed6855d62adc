//! Simulated vehicle shared by the mission integration tests.
//!
//! One [`SimVehicle`] sits behind both the mock flight link and the mock
//! telemetry source. It integrates a crude point-mass model on the virtual
//! clock's timeline:
//!
//! - disarmed: settles to the ground
//! - armed, manual / position hold: climb rate from throttle, horizontal
//!   velocity from roll/pitch in the body frame
//! - armed, mission mode: cruises for `cruise`, then descends toward home,
//!   ending up `drift` meters off the pad

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use snake_pilot::control::{NavMode, RcFrame};
use snake_pilot::link::FlightLink;
use snake_pilot::planning::Waypoint;
use snake_pilot::protocol::RawGps;
use snake_pilot::telemetry::{Telemetry, VehicleState};
use snake_pilot::{Clock, PilotConfig, PilotError, Result, VirtualClock};

pub const HOME_LAT: i32 = 454270000;
pub const HOME_LON: i32 = 396630000;

/// Integration step
const DT: Duration = Duration::from_millis(10);

/// Everything the flight controller was told, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkEvent {
    Rc(RcFrame),
    Waypoint(Waypoint),
    Close,
}

pub struct SimVehicle {
    clock: VirtualClock,
    last_update: Duration,
    rc: RcFrame,
    mission_started: Option<Duration>,

    pub position: (f64, f64),
    pub altitude: f64,
    pub yaw: f64,

    /// Highest altitude the vehicle can climb to
    pub ceiling_m: f64,
    /// Mission-mode cruise time before the descent home starts
    pub cruise: Duration,
    /// False: the mission never descends (segment timeout)
    pub mission_descends: bool,
    /// Offset from the pad when the mission hands over
    pub drift: (f64, f64),

    /// GPS fix reported from this query on (1-based); None = never
    pub gps_fix_from_query: Option<u32>,
    pub gps_queries: u32,
    /// False: telemetry reports no location
    pub position_available: bool,
    /// True: every telemetry read fails
    pub telemetry_offline: bool,
    /// Fail every n-th telemetry read (1-based, counted over the whole mission)
    pub drop_every_nth_read: Option<u32>,
    /// Fail this many consecutive reads once the vehicle is in position hold
    pub landing_dropout: u32,
    pub telemetry_reads: u32,
    pub failed_reads: u32,
    /// Fail the n-th waypoint write (0-based, counted over the whole mission)
    pub fail_waypoint: Option<usize>,
    waypoint_writes: usize,
    /// Fail these RC sends (0-based, counted over the whole mission)
    pub fail_rc_sends: Vec<usize>,
    rc_sends: usize,

    pub events: Vec<LinkEvent>,
}

impl SimVehicle {
    pub fn new(clock: VirtualClock) -> Self {
        Self {
            last_update: clock.now(),
            clock,
            rc: RcFrame::NEUTRAL,
            mission_started: None,
            position: (0.0, 0.0),
            altitude: 0.0,
            yaw: 0.0,
            ceiling_m: 60.0,
            cruise: Duration::from_secs(60),
            mission_descends: true,
            drift: (2.0, -1.5),
            gps_fix_from_query: Some(1),
            gps_queries: 0,
            position_available: true,
            telemetry_offline: false,
            drop_every_nth_read: None,
            landing_dropout: 0,
            telemetry_reads: 0,
            failed_reads: 0,
            fail_waypoint: None,
            waypoint_writes: 0,
            fail_rc_sends: Vec::new(),
            rc_sends: 0,
            events: Vec::new(),
        }
    }

    /// Integrate the model up to the clock's current time.
    fn update(&mut self) {
        let now = self.clock.now();
        let mut t = self.last_update;
        while t < now {
            let step = DT.min(now - t);
            t += step;
            self.step(t, step.as_secs_f64());
        }
        self.last_update = now;
    }

    fn step(&mut self, t: Duration, dt: f64) {
        if !self.rc.is_armed() {
            self.altitude = (self.altitude - 3.0 * dt).max(0.0);
            return;
        }

        match self.rc.nav_mode() {
            NavMode::Mission => {
                let started = self.mission_started.unwrap_or(t);
                self.position = self.drift;
                if self.mission_descends && t.saturating_sub(started) >= self.cruise {
                    self.altitude = (self.altitude - 1.0 * dt).max(0.0);
                }
            }
            NavMode::Manual | NavMode::PositionHold => {
                let climb = (self.rc.throttle() as f64 - 1500.0) / 100.0;
                self.altitude = (self.altitude + climb * dt).clamp(0.0, self.ceiling_m);

                let forward = (self.rc.pitch() as f64 - 1500.0) / 150.0;
                let lateral = -(self.rc.roll() as f64 - 1500.0) / 150.0;
                let (sin, cos) = self.yaw.sin_cos();
                self.position.0 += (cos * forward - sin * lateral) * dt;
                self.position.1 += (sin * forward + cos * lateral) * dt;
            }
        }
    }

    fn apply_rc(&mut self, frame: RcFrame) {
        self.update();
        if frame.nav_mode() == NavMode::Mission && self.rc.nav_mode() != NavMode::Mission {
            self.mission_started = Some(self.clock.now());
        }
        self.rc = frame;
    }

    /// Whether the next telemetry read should fail.
    fn read_fails(&mut self) -> bool {
        self.telemetry_reads += 1;
        if self
            .drop_every_nth_read
            .is_some_and(|n| self.telemetry_reads % n == 0)
        {
            return true;
        }
        if self.landing_dropout > 0
            && self.rc.is_armed()
            && self.rc.nav_mode() == NavMode::PositionHold
        {
            self.landing_dropout -= 1;
            return true;
        }
        false
    }

    fn state(&mut self) -> VehicleState {
        self.update();
        let half = self.yaw / 2.0;
        VehicleState {
            location: self
                .position_available
                .then_some([self.position.0, self.position.1, self.altitude]),
            orientation: Some([0.0, 0.0, half.sin(), half.cos()]),
        }
    }

    pub fn rc_frames(&self) -> Vec<RcFrame> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LinkEvent::Rc(frame) => Some(*frame),
                _ => None,
            })
            .collect()
    }

    /// Uploaded waypoint tables, one per segment
    pub fn uploads(&self) -> Vec<Vec<Waypoint>> {
        let mut tables: Vec<Vec<Waypoint>> = Vec::new();
        for event in &self.events {
            if let LinkEvent::Waypoint(wp) = event {
                match tables.last_mut() {
                    Some(table) if wp.sequence != 1 => table.push(*wp),
                    _ => tables.push(vec![*wp]),
                }
            }
        }
        tables
    }

    pub fn close_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, LinkEvent::Close))
            .count()
    }
}

pub type SharedVehicle = Rc<RefCell<SimVehicle>>;

/// Flight link backed by the simulated vehicle.
pub struct MockLink {
    pub vehicle: SharedVehicle,
}

impl FlightLink for MockLink {
    fn send_rc(&mut self, frame: &RcFrame) -> Result<()> {
        let mut v = self.vehicle.borrow_mut();
        let index = v.rc_sends;
        v.rc_sends += 1;
        if v.fail_rc_sends.contains(&index) {
            return Err(PilotError::Connection(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "link dropped",
            )));
        }
        v.events.push(LinkEvent::Rc(*frame));
        v.apply_rc(*frame);
        Ok(())
    }

    fn set_waypoint(&mut self, waypoint: &Waypoint) -> Result<()> {
        let mut v = self.vehicle.borrow_mut();
        let index = v.waypoint_writes;
        v.waypoint_writes += 1;
        if v.fail_waypoint == Some(index) {
            return Err(PilotError::Protocol("MSP_SET_WP rejected".into()));
        }
        v.events.push(LinkEvent::Waypoint(*waypoint));
        Ok(())
    }

    fn gps_fix(&mut self) -> Result<Option<RawGps>> {
        let mut v = self.vehicle.borrow_mut();
        v.gps_queries += 1;
        let has_fix = v.gps_fix_from_query.is_some_and(|n| v.gps_queries >= n);
        let (latitude, longitude) = if has_fix { (HOME_LAT, HOME_LON) } else { (0, 0) };
        Ok(Some(RawGps {
            fix_type: if has_fix { 2 } else { 0 },
            num_sat: if has_fix { 11 } else { 0 },
            latitude,
            longitude,
            altitude_m: Some(0),
            ground_speed: Some(0),
            ground_course: Some(0),
        }))
    }

    fn close(&mut self) -> Result<()> {
        self.vehicle.borrow_mut().events.push(LinkEvent::Close);
        Ok(())
    }
}

/// Telemetry backed by the simulated vehicle.
pub struct MockTelemetry {
    pub vehicle: SharedVehicle,
}

impl Telemetry for MockTelemetry {
    fn vehicle_state(&mut self) -> Result<VehicleState> {
        let mut v = self.vehicle.borrow_mut();
        if v.telemetry_offline {
            return Err(PilotError::Connection(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "simulator offline",
            )));
        }
        if v.read_fails() {
            v.failed_reads += 1;
            return Err(PilotError::Connection(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "telemetry read timed out",
            )));
        }
        Ok(v.state())
    }
}

/// Simulated vehicle plus the pieces a mission controller is built from.
pub struct Rig {
    pub clock: VirtualClock,
    pub vehicle: SharedVehicle,
}

impl Rig {
    pub fn new() -> Self {
        let clock = VirtualClock::new();
        let vehicle = Rc::new(RefCell::new(SimVehicle::new(clock.clone())));
        Self { clock, vehicle }
    }

    pub fn link(&self) -> MockLink {
        MockLink {
            vehicle: Rc::clone(&self.vehicle),
        }
    }

    pub fn telemetry(&self) -> MockTelemetry {
        MockTelemetry {
            vehicle: Rc::clone(&self.vehicle),
        }
    }
}

/// Corridor short enough that a mission has a handful of segments.
pub fn short_corridor_config(recharge_every: u32) -> PilotConfig {
    let mut config = PilotConfig::default();
    config.corridor.end_lat = config.corridor.start_lat + 10 * config.corridor.lat_step as i32;
    config.mission.recharge_every = recharge_every;
    config
}
