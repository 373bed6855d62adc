//! Coverage path planning.

pub mod snake;

pub use snake::{
    ACTION_WAYPOINT, FLAG_LAND, HomePosition, MAX_SEGMENT_WAYPOINTS, ResumePoint, SegmentPlan, Side, SnakeConfig,
    Waypoint, generate,
};
