use std::f64::consts::TAU;

use crate::pose::Pose;

/// Simulated compass reading the robot's heading on the floor plane.
///
/// Angles are in `[0, 2π)` and grow as the robot turns left.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Compass {
    zero: f64,
}

fn wrap(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

impl Compass {
    pub fn absolute_angle(pose: &Pose) -> f64 {
        wrap(pose.yaw())
    }

    /// Heading relative to the last [`Compass::set_zero`], wrapped into
    /// `[0, 2π)` rather than reported as a raw signed difference.
    pub fn angle(&self, pose: &Pose) -> f64 {
        wrap(Self::absolute_angle(pose) - self.zero)
    }

    pub fn set_zero(&mut self, pose: &Pose) {
        self.zero = Self::absolute_angle(pose);
    }

    pub fn reset_zero(&mut self) {
        self.zero = 0.0;
    }
}
