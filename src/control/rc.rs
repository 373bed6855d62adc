//! RC channel frames sent to the flight controller.
//!
//! Channel order is `[roll, pitch, throttle, yaw, aux1, aux2, aux3]`.
//! aux1 is the arm switch, aux3 selects the navigation mode.

use super::landing::MotionCommand;

/// Number of channels in a frame
pub const RC_CHANNELS: usize = 7;

/// Stick centre / switch middle position
pub const RC_MID: u16 = 1500;
/// Switch low position
pub const RC_LOW: u16 = 1000;
/// Switch high position
pub const RC_HIGH: u16 = 2000;

const THROTTLE_IDLE: u16 = 1000;
const THROTTLE_CUTOFF: u16 = 900;
const THROTTLE_CLIMB: u16 = 1900;
const THROTTLE_CLIMB_SLOW: u16 = 1750;

/// Navigation mode selected by aux3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavMode {
    /// Pilot sticks (angle mode)
    Manual,
    /// Position hold
    PositionHold,
    /// Fly the uploaded waypoint table
    Mission,
}

impl NavMode {
    fn switch(self) -> u16 {
        match self {
            NavMode::Manual => RC_LOW,
            NavMode::PositionHold => RC_MID,
            NavMode::Mission => RC_HIGH,
        }
    }
}

/// One RC command frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RcFrame {
    pub channels: [u16; RC_CHANNELS],
}

impl RcFrame {
    /// Build a frame with centred roll/pitch/yaw.
    const fn centered(throttle: u16, armed: bool, mode: u16) -> Self {
        let arm = if armed { RC_HIGH } else { RC_LOW };
        Self {
            channels: [RC_MID, RC_MID, throttle, RC_MID, arm, RC_LOW, mode],
        }
    }

    /// Disarmed, idle throttle, sticks centred
    pub const NEUTRAL: Self = Self::centered(THROTTLE_IDLE, false, RC_LOW);
    /// Arm switch on, idle throttle
    pub const ARM: Self = Self::centered(THROTTLE_IDLE, true, RC_LOW);
    /// Full climb after arming
    pub const CLIMB: Self = Self::centered(THROTTLE_CLIMB, true, RC_LOW);
    /// Reduced climb near target altitude
    pub const CLIMB_SLOW: Self = Self::centered(THROTTLE_CLIMB_SLOW, true, RC_LOW);
    /// Level flight, altitude hold
    pub const LEVEL: Self = Self::centered(RC_MID, true, RC_LOW);
    /// Hand navigation to the waypoint table
    pub const MISSION_START: Self = Self::centered(RC_MID, true, RC_HIGH);
    /// Position hold before precision landing
    pub const POSITION_HOLD: Self = Self::centered(RC_MID, true, RC_MID);
    /// Below idle: motors stop regardless of arm state
    pub const MOTOR_CUTOFF: Self = Self::centered(THROTTLE_CUTOFF, false, RC_LOW);

    /// Frame carrying a landing controller command in position-hold mode.
    pub fn landing(cmd: MotionCommand) -> Self {
        Self {
            channels: [
                cmd.roll,
                cmd.pitch,
                cmd.throttle,
                cmd.yaw,
                RC_HIGH,
                RC_LOW,
                NavMode::PositionHold.switch(),
            ],
        }
    }

    pub fn roll(&self) -> u16 {
        self.channels[0]
    }

    pub fn pitch(&self) -> u16 {
        self.channels[1]
    }

    pub fn throttle(&self) -> u16 {
        self.channels[2]
    }

    pub fn yaw(&self) -> u16 {
        self.channels[3]
    }

    /// Check the arm switch
    pub fn is_armed(&self) -> bool {
        self.channels[4] >= RC_HIGH
    }

    /// Navigation mode from aux3
    pub fn nav_mode(&self) -> NavMode {
        match self.channels[6] {
            v if v >= RC_HIGH => NavMode::Mission,
            v if v >= RC_MID => NavMode::PositionHold,
            _ => NavMode::Manual,
        }
    }
}
