use std::time::Duration;

use spin_sleep::SpinSleeper;
use tracing::{info, warn};

use crate::blackboard::{Blackboard, mark_finished, raise_fault, record_tick};
use crate::bus::Topic;
use crate::robot::PoseSample;
use crate::simulation::Simulation;

/// Ticks `simulation` every `period` until `max_ticks` ticks have run
/// (0 = no bound) or every drive script is exhausted.
///
/// Poses are published on `pose_topic` and mirrored to the blackboard after
/// every tick. Returns the number of ticks run.
pub fn tick_loop(
    mut simulation: Simulation,
    bb: Blackboard,
    pose_topic: Topic<PoseSample>,
    period: Duration,
    max_ticks: u64,
) -> u64 {
    info!(?period, max_ticks, "Tick loop started.");
    let sleeper = SpinSleeper::default();
    let mut tick = 0;

    loop {
        if max_ticks != 0 && tick >= max_ticks {
            info!(tick, "Tick budget spent.");
            break;
        }
        if simulation.is_finished() {
            info!(tick, "All drive scripts finished.");
            break;
        }

        for fault in simulation.tick() {
            warn!(robot = %fault.robot, error = %fault.error, tick, "Robot tick failed; pose left unchanged.");
            raise_fault(&bb, &fault.to_string());
        }
        tick += 1;

        let samples = simulation.samples(tick);
        for sample in &samples {
            pose_topic.publish(sample.clone());
        }
        record_tick(&bb, simulation.state(), tick, samples);

        sleeper.sleep(period);
    }

    let state = simulation.stop();
    mark_finished(&bb, state);
    tick
}

/// Raises a `tick loop stalled` fault whenever no tick has landed for ten
/// periods (at least 100 ms). Returns once the tick loop marks itself finished.
pub async fn watchdog(bb: Blackboard, period: Duration) -> anyhow::Result<()> {
    info!("Watchdog task started.");
    let stall_after = (period * 10).max(Duration::from_millis(100));
    let mut tick = tokio::time::interval(stall_after / 2);
    loop {
        tick.tick().await;
        let (finished, last_tick, age) = {
            let g = bb.read();
            (g.finished, g.tick, g.last_tick_ts.elapsed())
        };
        if finished {
            return Ok(());
        }
        if age > stall_after {
            warn!(?age, last_tick, "Tick loop stalled!");
            raise_fault(&bb, "tick loop stalled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackboard::snapshot;
    use crate::pose::Pose;
    use crate::robot::Robot;
    use crate::simulation::SimState;
    use crate::source::{DriveScript, Segment};
    use std::f64::consts::PI;
    use std::sync::Arc;
    use std::time::Instant;
    use tread_kinematics::{DifferentialDrive, PivotPolicy, WheelGeometry};

    const EPSILON: f64 = 1e-9;

    fn simulation(policy: PivotPolicy, segments: Vec<Segment>) -> Simulation {
        let drive = DifferentialDrive::new(WheelGeometry::new(2.0, 1.0).unwrap()).with_pivot_policy(policy);
        let mut sim = Simulation::new(vec![Robot::new(
            "NXT1",
            drive,
            Pose::default(),
            Box::new(DriveScript::new(segments)),
        )]);
        sim.play();
        sim
    }

    #[test]
    fn test_runs_until_script_is_exhausted() {
        let bb: Blackboard = Arc::default();
        let topic = Topic::new("pose", 16);
        let mut rx = topic.subscribe();

        let ticks = tick_loop(
            simulation(PivotPolicy::Arc, vec![Segment::new(1.0, 1.0, 3)]),
            Arc::clone(&bb),
            topic,
            Duration::ZERO,
            0,
        );
        assert_eq!(ticks, 3);

        let state = snapshot(&bb);
        assert!(state.finished);
        assert_eq!(state.tick, 3);
        assert_eq!(state.sim_state, SimState::Stopped);
        assert!((state.poses[0].z - 3.0 * PI).abs() < EPSILON);

        let published: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok()).map(|s| s.tick).collect();
        assert_eq!(published, vec![1, 2, 3]);
    }

    #[test]
    fn test_tick_budget_stops_early() {
        let bb: Blackboard = Arc::default();
        let ticks = tick_loop(
            simulation(PivotPolicy::Arc, vec![Segment::new(1.0, 1.0, 100)]),
            Arc::clone(&bb),
            Topic::new("pose", 4),
            Duration::ZERO,
            5,
        );
        assert_eq!(ticks, 5);
        assert!((snapshot(&bb).poses[0].z - 5.0 * PI).abs() < 1e-6);
    }

    #[test]
    fn test_faults_reach_the_blackboard() {
        let bb: Blackboard = Arc::default();
        tick_loop(
            simulation(PivotPolicy::Reject, vec![Segment::new(1.0, -1.0, 2)]),
            Arc::clone(&bb),
            Topic::new("pose", 4),
            Duration::ZERO,
            0,
        );
        let state = snapshot(&bb);
        assert_eq!(state.tick, 2);
        assert_eq!(state.faults.len(), 1);
        assert!(state.faults[0].starts_with("NXT1: Pivot turn unsupported"));
        assert_eq!(state.poses[0].z, 0.0);
    }

    #[tokio::test]
    async fn test_watchdog_flags_a_stalled_loop_once() {
        let bb: Blackboard = Arc::default();
        bb.write().last_tick_ts = Instant::now() - Duration::from_secs(1);

        let task = tokio::spawn(watchdog(Arc::clone(&bb), Duration::from_millis(10)));
        // several checks at 50 ms each, all past the 100 ms threshold
        tokio::time::sleep(Duration::from_millis(220)).await;
        mark_finished(&bb, SimState::Stopped);

        let result = tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
        assert!(result.is_ok());
        assert_eq!(snapshot(&bb).faults, vec!["tick loop stalled".to_string()]);
    }

    #[tokio::test]
    async fn test_watchdog_returns_when_finished() {
        let bb: Blackboard = Arc::default();
        mark_finished(&bb, SimState::Stopped);
        let result = tokio::time::timeout(Duration::from_secs(1), watchdog(Arc::clone(&bb), Duration::from_millis(10)))
            .await
            .unwrap();
        assert!(result.is_ok());
        assert!(snapshot(&bb).faults.is_empty());
    }

    #[tokio::test]
    async fn test_watchdog_quiet_while_ticks_land() {
        let bb: Blackboard = Arc::default();
        let task = tokio::spawn(watchdog(Arc::clone(&bb), Duration::from_millis(10)));
        for tick in 1..=10 {
            record_tick(&bb, SimState::Running, tick, Vec::new());
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        mark_finished(&bb, SimState::Stopped);
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap().unwrap();
        assert!(snapshot(&bb).faults.is_empty());
    }
}
