use std::fmt;

use anyhow::Context;
use tracing::trace;
use tread_kinematics::{ArcMotion, DifferentialDrive, KinematicsError, WheelGeometry};

use crate::compass::Compass;
use crate::pose::Pose;
use crate::settings::RobotSettings;
use crate::source::{DriveScript, WheelDeltaSource};

pub fn default_name(index: usize) -> String {
    format!("NXT{}", index)
}

/// Pose snapshot published after every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSample {
    pub tick: u64,
    pub robot: String,
    pub x: f64,
    pub z: f64,
    pub yaw: f64,
    pub compass: f64,
}

impl fmt::Display for PoseSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} @ {}] (x: {:.3}, z: {:.3}, yaw: {:.3} rad, compass: {:.3} rad)",
            self.robot, self.tick, self.x, self.z, self.yaw, self.compass
        )
    }
}

pub struct Robot {
    name: String,
    drive: DifferentialDrive,
    pose: Pose,
    compass: Compass,
    zero_compass_on_start: bool,
    source: Box<dyn WheelDeltaSource>,
}

impl Robot {
    pub fn new(name: impl Into<String>, drive: DifferentialDrive, pose: Pose, source: Box<dyn WheelDeltaSource>) -> Self {
        Robot {
            name: name.into(),
            drive,
            pose,
            compass: Compass::default(),
            zero_compass_on_start: false,
            source,
        }
    }

    /// Make every (re)start capture the current heading as the compass zero.
    pub fn with_compass_zeroed_on_start(mut self, enabled: bool) -> Self {
        self.zero_compass_on_start = enabled;
        self
    }

    /// Builds the robot described by `settings`; `index` counts from 1.
    pub fn from_settings(index: usize, settings: &RobotSettings) -> anyhow::Result<Self> {
        let name = settings.name.clone().unwrap_or_else(|| default_name(index));
        let geometry = WheelGeometry::new(settings.wheel_span, settings.wheel_diameter)
            .with_context(|| format!("robot {} has an unusable geometry", name))?;
        let drive = DifferentialDrive::new(geometry).with_pivot_policy(settings.pivot_policy);
        let pose = Pose::on_floor(settings.start.x, settings.start.z, settings.start.yaw);
        let script = DriveScript::new(settings.script.clone());
        Ok(Robot::new(name, drive, pose, Box::new(script)).with_compass_zeroed_on_start(settings.zero_compass_on_start))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn drive(&self) -> &DifferentialDrive {
        &self.drive
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Samples the wheels once and moves the robot accordingly.
    pub fn tick(&mut self) -> Result<ArcMotion, KinematicsError> {
        let deltas = self.source.next_deltas();
        let motion = self.drive.apply(deltas, &mut self.pose)?;
        trace!(robot = %self.name, %deltas, %motion, "Robot ticked");
        Ok(motion)
    }

    /// Rewinds the delta source and re-reads the compass reference.
    pub fn restart(&mut self) {
        self.source.restart();
        if self.zero_compass_on_start {
            self.compass.set_zero(&self.pose);
        } else {
            self.compass.reset_zero();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.source.is_finished()
    }

    pub fn sample(&self, tick: u64) -> PoseSample {
        PoseSample {
            tick,
            robot: self.name.clone(),
            x: self.pose.position.x,
            z: self.pose.position.z,
            yaw: self.pose.yaw(),
            compass: self.compass.angle(&self.pose),
        }
    }
}

impl fmt::Debug for Robot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Robot")
            .field("name", &self.name)
            .field("drive", &self.drive)
            .field("pose", &self.pose)
            .finish_non_exhaustive()
    }
}
