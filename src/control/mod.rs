//! Vehicle control outputs: RC frames and the precision landing controller.

pub mod landing;
pub mod rc;

pub use landing::{LandingConfig, LandingController, MotionCommand, body_frame_error};
pub use rc::{NavMode, RC_CHANNELS, RcFrame};
