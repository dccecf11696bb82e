use std::fmt;

use nalgebra::{Unit, UnitQuaternion, Vector3};
use tracing::warn;
use tread_kinematics::PoseSink;

/// Robot pose in the floor's world frame.
///
/// `+y` is up. In the robot's own frame `+z` is forward and `+x` is to its
/// right, so yaw angles grow counter-clockwise seen from above. That frame is
/// left-handed, hence the negated angle handed to nalgebra.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub heading: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Pose {
            position: Vector3::zeros(),
            heading: UnitQuaternion::identity(),
        }
    }
}

impl Pose {
    /// A pose on the floor at `(x, 0, z)` facing `yaw` radians left of `+z`.
    pub fn on_floor(x: f64, z: f64, yaw: f64) -> Self {
        Pose {
            position: Vector3::new(x, 0.0, z),
            heading: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -yaw),
        }
    }

    /// World-frame direction the robot is facing.
    pub fn forward(&self) -> Vector3<f64> {
        self.heading * Vector3::z()
    }

    /// Heading in `(-π, π]`, zero along `+z`, positive toward `-x`.
    pub fn yaw(&self) -> f64 {
        let forward = self.forward();
        (-forward.x).atan2(forward.z)
    }
}

impl PoseSink for Pose {
    fn move_by(&mut self, dx: f64, dy: f64, dz: f64) {
        self.position += self.heading * Vector3::new(dx, dy, dz);
    }

    fn rotate_by(&mut self, axis_x: f64, axis_y: f64, axis_z: f64, angle: f64) {
        let Some(axis) = Unit::try_new(Vector3::new(axis_x, axis_y, axis_z), f64::EPSILON) else {
            warn!(axis_x, axis_y, axis_z, "Ignoring rotation about a zero-length axis");
            return;
        };
        self.heading *= UnitQuaternion::from_axis_angle(&axis, -angle);
        self.heading.renormalize_fast();
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(x: {:.3}, y: {:.3}, z: {:.3}, yaw: {:.3} rad)",
            self.position.x,
            self.position.y,
            self.position.z,
            self.yaw()
        )
    }
}
