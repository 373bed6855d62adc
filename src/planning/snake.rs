//! Snake (boustrophedon) coverage path generation.
//!
//! Sweeps a corridor bounded by two longitudes, stepping north by a fixed
//! latitude increment after every crossing. The sweep is split into flight
//! segments: after `recharge_every` boundary hops the segment returns home and
//! lands, and the returned [`ResumePoint`] tells the next segment where to
//! continue.
//!
//! Coordinates are degrees scaled by 1e7, matching the flight controller's
//! waypoint table.

use serde::Deserialize;

use crate::error::{PilotError, Result};

/// Waypoint action: fly to the given position.
pub const ACTION_WAYPOINT: u8 = 1;

/// Waypoint flag marking the last entry of the mission table (land here).
pub const FLAG_LAND: u8 = 165;

/// Largest waypoint table a segment can carry; sequence numbers are `u8`.
pub const MAX_SEGMENT_WAYPOINTS: u64 = u8::MAX as u64;

/// One entry of the flight controller's waypoint table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Waypoint {
    /// 1-based position within the segment
    pub sequence: u8,
    pub action: u8,
    /// Latitude (degrees × 1e7)
    pub latitude: i32,
    /// Longitude (degrees × 1e7)
    pub longitude: i32,
    pub altitude_cm: u32,
    pub speed_cms: u16,
    pub param1: u16,
    pub param2: u16,
    pub flag: u8,
}

impl Waypoint {
    /// Check if this is the terminal landing waypoint
    pub fn is_land(&self) -> bool {
        self.flag == FLAG_LAND
    }
}

/// Home position captured from the GPS fix at mission start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HomePosition {
    pub latitude: i32,
    pub longitude: i32,
}

impl HomePosition {
    pub fn new(latitude: i32, longitude: i32) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Corridor boundary the vehicle is currently on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Coverage corridor definition.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SnakeConfig {
    /// First sweep latitude when no resume position is given
    #[serde(default = "default_start_lat")]
    pub start_lat: i32,

    /// Left boundary longitude (sweep starts here)
    #[serde(default = "default_left_lon")]
    pub left_lon: i32,

    /// Right boundary longitude
    #[serde(default = "default_right_lon")]
    pub right_lon: i32,

    /// Terminal latitude; the sweep finishes once it is passed
    #[serde(default = "default_end_lat")]
    pub end_lat: i32,

    /// Longitude of the terminal waypoint
    #[serde(default = "default_end_lon")]
    pub end_lon: i32,

    /// Latitude advance per traversal (degrees × 1e7, must be > 0)
    #[serde(default = "default_lat_step")]
    pub lat_step: u32,
}

fn default_start_lat() -> i32 {
    454_276_736
}
fn default_left_lon() -> i32 {
    396_638_176
}
fn default_right_lon() -> i32 {
    396_587_360
}
fn default_end_lat() -> i32 {
    454_412_384
}
fn default_end_lon() -> i32 {
    396_585_696
}
fn default_lat_step() -> u32 {
    3000
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            start_lat: default_start_lat(),
            left_lon: default_left_lon(),
            right_lon: default_right_lon(),
            end_lat: default_end_lat(),
            end_lon: default_end_lon(),
            lat_step: default_lat_step(),
        }
    }
}

impl SnakeConfig {
    /// Boundary longitude for a side
    pub fn longitude(&self, side: Side) -> i32 {
        match side {
            Side::Left => self.left_lon,
            Side::Right => self.right_lon,
        }
    }

    /// Side a resume longitude belongs to. Anything off the left boundary
    /// is treated as the right side.
    pub fn side_of(&self, longitude: i32) -> Side {
        if longitude == self.left_lon {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Where the sweep begins when nothing has been flown yet
    pub fn start(&self) -> ResumePoint {
        ResumePoint {
            latitude: self.start_lat,
            longitude: self.left_lon,
        }
    }

    /// Terminal waypoint position
    pub fn terminal(&self) -> ResumePoint {
        ResumePoint {
            latitude: self.end_lat,
            longitude: self.end_lon,
        }
    }

    /// Boundary hops in a full sweep from the start latitude.
    pub fn hops(&self) -> u64 {
        if self.lat_step == 0 || self.start_lat > self.end_lat {
            return 0;
        }
        let span = i64::from(self.end_lat) - i64::from(self.start_lat);
        span as u64 / u64::from(self.lat_step)
    }

    /// Waypoint count of the longest segment a full mission uploads.
    ///
    /// A recharge segment with `k` hops carries `3k + 4` waypoints, the
    /// terminal segment with `k` hops carries `3k + 6`, and the terminal
    /// segment always has fewer hops than a full recharge interval.
    pub fn max_segment_len(&self, recharge_every: u32) -> u64 {
        let every = u64::from(recharge_every.max(1));
        let hops = self.hops();
        if hops < every {
            3 * hops + 6
        } else {
            3 * every + 4
        }
    }
}

/// Position where the next segment continues the sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResumePoint {
    pub latitude: i32,
    pub longitude: i32,
}

/// Waypoints for one flight plus the resume state for the next one.
#[derive(Clone, Debug)]
pub struct SegmentPlan {
    pub waypoints: Vec<Waypoint>,
    /// Where the next segment continues (terminal position once finished)
    pub next: ResumePoint,
    /// True once the sweep has passed the terminal latitude
    pub finished: bool,
}

/// Sweep progress threaded through one generation call.
#[derive(Clone, Copy, Debug)]
struct PathState {
    latitude: i32,
    side: Side,
    traversals_since_recharge: u32,
}

/// Accumulates waypoints with contiguous sequence numbers.
struct SegmentBuilder {
    home: HomePosition,
    altitude_cm: u32,
    speed_cms: u16,
    waypoints: Vec<Waypoint>,
}

impl SegmentBuilder {
    fn new(home: HomePosition, altitude_cm: u32, speed_cms: u16) -> Self {
        Self {
            home,
            altitude_cm,
            speed_cms,
            waypoints: Vec::new(),
        }
    }

    fn push_raw(
        &mut self,
        latitude: i32,
        longitude: i32,
        altitude_cm: u32,
        speed_cms: u16,
        flag: u8,
    ) -> Result<()> {
        let sequence = u8::try_from(self.waypoints.len() + 1).map_err(|_| {
            PilotError::Config(format!(
                "segment exceeds {} waypoints; lower mission.recharge_every or widen corridor.lat_step",
                MAX_SEGMENT_WAYPOINTS
            ))
        })?;
        self.waypoints.push(Waypoint {
            sequence,
            action: ACTION_WAYPOINT,
            latitude,
            longitude,
            altitude_cm,
            speed_cms,
            param1: 0,
            param2: 0,
            flag,
        });
        Ok(())
    }

    fn push(&mut self, latitude: i32, longitude: i32) -> Result<()> {
        self.push_raw(latitude, longitude, self.altitude_cm, self.speed_cms, 0)
    }

    fn push_home(&mut self) -> Result<()> {
        self.push(self.home.latitude, self.home.longitude)
    }

    fn push_land(&mut self) -> Result<()> {
        self.push_raw(self.home.latitude, self.home.longitude, 0, 0, FLAG_LAND)
    }

    /// Close the segment at home for a recharge.
    fn recharge(mut self, next: ResumePoint) -> Result<SegmentPlan> {
        self.push_home()?;
        self.push_land()?;
        Ok(SegmentPlan {
            waypoints: self.waypoints,
            next,
            finished: false,
        })
    }

    /// Close the segment through the terminal waypoint; the sweep is done.
    fn terminal(mut self, corridor: &SnakeConfig) -> Result<SegmentPlan> {
        let end = corridor.terminal();
        self.push(end.latitude, end.longitude)?;
        self.push_home()?;
        self.push_land()?;
        Ok(SegmentPlan {
            waypoints: self.waypoints,
            next: end,
            finished: true,
        })
    }
}

/// Generate the waypoints for one mission segment.
///
/// The segment opens with home and the resume position, then alternates a
/// step north along the current boundary with a crossing to the opposite
/// boundary. The recharge check runs after every single crossing, so a
/// segment can end on either side; the resume point is the position just
/// reached.
///
/// `recharge_every` of zero behaves like one. Pass `u32::MAX` for an
/// uninterrupted sweep.
///
/// Fails with [`PilotError::Config`] when the segment would not fit a `u8`
/// sequence number (see [`SnakeConfig::max_segment_len`]).
pub fn generate(
    corridor: &SnakeConfig,
    home: HomePosition,
    altitude_cm: u32,
    speed_cms: u16,
    resume: Option<ResumePoint>,
    recharge_every: u32,
) -> Result<SegmentPlan> {
    let resume = resume.unwrap_or_else(|| corridor.start());

    let mut segment = SegmentBuilder::new(home, altitude_cm, speed_cms);
    segment.push_home()?;
    segment.push(resume.latitude, resume.longitude)?;

    let mut state = PathState {
        latitude: resume.latitude,
        side: corridor.side_of(resume.longitude),
        traversals_since_recharge: 0,
    };

    while state.latitude <= corridor.end_lat {
        let side_lon = corridor.longitude(state.side);
        segment.push(state.latitude, side_lon)?;

        let next_lat = state.latitude.saturating_add_unsigned(corridor.lat_step);
        if next_lat > corridor.end_lat {
            return segment.terminal(corridor);
        }

        segment.push(next_lat, side_lon)?;
        state.side = state.side.opposite();
        let reached_lon = corridor.longitude(state.side);
        segment.push(next_lat, reached_lon)?;

        state.latitude = next_lat;
        state.traversals_since_recharge += 1;

        if state.traversals_since_recharge >= recharge_every {
            return segment.recharge(ResumePoint {
                latitude: next_lat,
                longitude: reached_lon,
            });
        }
    }

    segment.terminal(corridor)
}
