use std::fmt;

use tracing::{info, warn};
use tread_kinematics::KinematicsError;

use crate::robot::{PoseSample, Robot};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Stopped,
    Running,
    Suspended,
}

/// A robot whose tick failed.
#[derive(Debug, Clone, PartialEq)]
pub struct TickFault {
    pub robot: String,
    pub error: KinematicsError,
}

impl fmt::Display for TickFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.robot, self.error)
    }
}

pub struct Simulation {
    robots: Vec<Robot>,
    state: SimState,
}

impl Simulation {
    pub fn new(robots: Vec<Robot>) -> Self {
        Self {
            robots,
            state: SimState::Stopped,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let robots = settings
            .robots
            .iter()
            .enumerate()
            .map(|(i, robot)| Robot::from_settings(i + 1, robot))
            .collect::<anyhow::Result<Vec<_>>>()?;
        if robots.is_empty() {
            warn!("No robots configured; the simulation will finish immediately.");
        }
        Ok(Self::new(robots))
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn play(&mut self) -> SimState {
        self.state = match self.state {
            SimState::Running => SimState::Running,
            SimState::Suspended => {
                info!("resumed");
                SimState::Running
            }
            SimState::Stopped => {
                for robot in &mut self.robots {
                    robot.restart();
                }
                info!(robots = self.robots.len(), "started");
                SimState::Running
            }
        };
        self.state
    }

    pub fn suspend(&mut self) -> SimState {
        if self.state == SimState::Running {
            info!("suspended");
            self.state = SimState::Suspended;
        }
        self.state
    }

    pub fn stop(&mut self) -> SimState {
        if self.state != SimState::Stopped {
            info!("stopped");
            self.state = SimState::Stopped;
        }
        self.state
    }

    /// Ticks every robot once while running. A failing robot keeps its pose
    /// and does not hold back the others.
    pub fn tick(&mut self) -> Vec<TickFault> {
        if self.state != SimState::Running {
            return Vec::new();
        }
        self.robots
            .iter_mut()
            .filter_map(|robot| match robot.tick() {
                Ok(_) => None,
                Err(error) => Some(TickFault {
                    robot: robot.name().to_string(),
                    error,
                }),
            })
            .collect()
    }

    /// True when no robot has any scripted motion left.
    pub fn is_finished(&self) -> bool {
        self.robots.iter().all(Robot::is_finished)
    }

    pub fn samples(&self, tick: u64) -> Vec<PoseSample> {
        self.robots.iter().map(|robot| robot.sample(tick)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Pose;
    use crate::source::{DriveScript, Segment};
    use std::f64::consts::PI;
    use tread_kinematics::{DifferentialDrive, PivotPolicy, WheelGeometry};

    const EPSILON: f64 = 1e-9;

    fn robot(name: &str, policy: PivotPolicy, segments: Vec<Segment>) -> Robot {
        let drive = DifferentialDrive::new(WheelGeometry::new(2.0, 1.0).unwrap()).with_pivot_policy(policy);
        Robot::new(name, drive, Pose::default(), Box::new(DriveScript::new(segments)))
    }

    #[test]
    fn test_transitions() {
        let mut sim = Simulation::new(Vec::new());
        assert_eq!(sim.state(), SimState::Stopped);
        assert_eq!(sim.suspend(), SimState::Stopped);
        assert_eq!(sim.stop(), SimState::Stopped);
        assert_eq!(sim.play(), SimState::Running);
        assert_eq!(sim.play(), SimState::Running);
        assert_eq!(sim.suspend(), SimState::Suspended);
        assert_eq!(sim.suspend(), SimState::Suspended);
        assert_eq!(sim.play(), SimState::Running);
        assert_eq!(sim.suspend(), SimState::Suspended);
        assert_eq!(sim.stop(), SimState::Stopped);
    }

    #[test]
    fn test_only_running_simulation_ticks() {
        let mut sim = Simulation::new(vec![robot("a", PivotPolicy::Arc, vec![Segment::new(1.0, 1.0, 5)])]);
        sim.tick();
        assert_eq!(sim.robots()[0].pose().position.z, 0.0);

        sim.play();
        sim.tick();
        sim.suspend();
        sim.tick();
        assert!((sim.robots()[0].pose().position.z - PI).abs() < EPSILON);

        sim.play();
        sim.tick();
        assert!((sim.robots()[0].pose().position.z - 2.0 * PI).abs() < EPSILON);
    }

    #[test]
    fn test_play_after_stop_restarts_scripts_and_keeps_pose() {
        let mut sim = Simulation::new(vec![robot("a", PivotPolicy::Arc, vec![Segment::new(1.0, 1.0, 1)])]);
        sim.play();
        sim.tick();
        assert!(sim.is_finished());
        sim.stop();
        sim.play();
        assert!(!sim.is_finished());
        sim.tick();
        assert!((sim.robots()[0].pose().position.z - 2.0 * PI).abs() < EPSILON);
    }

    #[test]
    fn test_faulty_robot_does_not_block_others() {
        let mut sim = Simulation::new(vec![
            robot("pivoting", PivotPolicy::Reject, vec![Segment::new(1.0, -1.0, 1)]),
            robot("straight", PivotPolicy::Reject, vec![Segment::new(1.0, 1.0, 1)]),
        ]);
        sim.play();
        let faults = sim.tick();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].robot, "pivoting");
        assert!(matches!(faults[0].error, KinematicsError::PivotUnsupported(_)));
        assert!((sim.robots()[1].pose().position.z - PI).abs() < EPSILON);

        let samples = sim.samples(1);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].z, 0.0);
    }

    #[test]
    fn test_robots_keep_separate_geometry() {
        let small = DifferentialDrive::new(WheelGeometry::new(1.0, 0.5).unwrap());
        let big = DifferentialDrive::new(WheelGeometry::new(4.0, 2.0).unwrap());
        let mut sim = Simulation::new(vec![
            Robot::new("small", small, Pose::default(), Box::new(DriveScript::new(vec![Segment::new(1.0, 1.0, 1)]))),
            Robot::new("big", big, Pose::default(), Box::new(DriveScript::new(vec![Segment::new(1.0, 1.0, 1)]))),
        ]);
        sim.play();
        sim.tick();
        assert!((sim.robots()[0].pose().position.z - 0.5 * PI).abs() < EPSILON);
        assert!((sim.robots()[1].pose().position.z - 2.0 * PI).abs() < EPSILON);
    }
}
