//! Precision landing position controller.
//!
//! Proportional controller that steers the vehicle over a target point in
//! the simulator's world frame and descends once it is close enough.
//! Stateless: every call maps one telemetry snapshot to one command.

use serde::Deserialize;

/// Landing controller tuning.
#[derive(Clone, Debug, Deserialize)]
pub struct LandingConfig {
    /// Proportional gain (RC units per meter of error)
    #[serde(default = "default_kp")]
    pub kp: f64,

    /// RC stick centre
    #[serde(default = "default_center")]
    pub center: u16,

    /// Lower clamp for roll/pitch output
    #[serde(default = "default_min_output")]
    pub min_output: u16,

    /// Upper clamp for roll/pitch output
    #[serde(default = "default_max_output")]
    pub max_output: u16,

    /// Horizontal distance below which descent is allowed (meters)
    #[serde(default = "default_descent_radius")]
    pub descent_radius_m: f64,

    /// Altitude above which the fast descent rate is used (meters)
    #[serde(default = "default_flare_altitude")]
    pub flare_altitude_m: f64,

    /// Throttle for the fast descent stage
    #[serde(default = "default_fast_descent_throttle")]
    pub fast_descent_throttle: u16,

    /// Throttle for the final slow descent stage
    #[serde(default = "default_slow_descent_throttle")]
    pub slow_descent_throttle: u16,

    /// Throttle that holds altitude while correcting position
    #[serde(default = "default_hold_throttle")]
    pub hold_throttle: u16,
}

fn default_kp() -> f64 {
    150.0
}
fn default_center() -> u16 {
    1500
}
fn default_min_output() -> u16 {
    1350
}
fn default_max_output() -> u16 {
    1650
}
fn default_descent_radius() -> f64 {
    0.5
}
fn default_flare_altitude() -> f64 {
    5.0
}
fn default_fast_descent_throttle() -> u16 {
    1250
}
fn default_slow_descent_throttle() -> u16 {
    1320
}
fn default_hold_throttle() -> u16 {
    1500
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            kp: default_kp(),
            center: default_center(),
            min_output: default_min_output(),
            max_output: default_max_output(),
            descent_radius_m: default_descent_radius(),
            flare_altitude_m: default_flare_altitude(),
            fast_descent_throttle: default_fast_descent_throttle(),
            slow_descent_throttle: default_slow_descent_throttle(),
            hold_throttle: default_hold_throttle(),
        }
    }
}

/// Vehicle-relative stick command produced by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MotionCommand {
    pub roll: u16,
    pub pitch: u16,
    pub throttle: u16,
    pub yaw: u16,
}

/// Rotate a world-frame error into the body frame.
///
/// Returns `(forward, lateral)`.
#[inline]
pub fn body_frame_error(dx: f64, dy: f64, yaw_rad: f64) -> (f64, f64) {
    let (sin, cos) = yaw_rad.sin_cos();
    let forward = cos * dx + sin * dy;
    let lateral = -sin * dx + cos * dy;
    (forward, lateral)
}

/// Precision landing controller.
#[derive(Clone, Debug, Default)]
pub struct LandingController {
    config: LandingConfig,
}

impl LandingController {
    pub fn new(config: LandingConfig) -> Self {
        Self { config }
    }

    /// Compute the stick command that moves the vehicle toward `target`.
    ///
    /// Position error is corrected first; descent starts only inside
    /// `descent_radius_m`, slowing down below `flare_altitude_m`. An unknown
    /// altitude is treated as low.
    pub fn compute(
        &self,
        target: (f64, f64),
        current: (f64, f64),
        yaw_rad: f64,
        altitude_m: Option<f64>,
    ) -> MotionCommand {
        let dx = target.0 - current.0;
        let dy = target.1 - current.1;
        let (err_forward, err_lateral) = body_frame_error(dx, dy, yaw_rad);

        let pitch = self.stick(err_forward);
        let roll = self.stick(-err_lateral);

        let distance = dx.hypot(dy);
        let throttle = if distance < self.config.descent_radius_m {
            match altitude_m {
                Some(alt) if alt > self.config.flare_altitude_m => {
                    self.config.fast_descent_throttle
                }
                _ => self.config.slow_descent_throttle,
            }
        } else {
            self.config.hold_throttle
        };

        MotionCommand {
            roll,
            pitch,
            throttle,
            yaw: self.config.center,
        }
    }

    /// Map a signed error to a clamped stick value (truncating toward zero).
    fn stick(&self, error: f64) -> u16 {
        let raw = (self.config.center as f64 + error * self.config.kp) as i32;
        raw.clamp(self.config.min_output as i32, self.config.max_output as i32) as u16
    }
}
