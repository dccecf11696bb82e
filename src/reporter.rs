use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;
use tracing::{debug, info, warn};

use crate::robot::PoseSample;

/// Logs the latest pose of every robot once per `interval` until the pose
/// topic closes, then returns the final pose of each robot ordered by name.
pub async fn report_task(
    mut pose_rx: broadcast::Receiver<Arc<PoseSample>>,
    interval: Duration,
) -> anyhow::Result<Vec<Arc<PoseSample>>> {
    info!("Pose reporter started.");
    let mut ticker = time::interval(interval);
    let mut latest: BTreeMap<String, Arc<PoseSample>> = BTreeMap::new();
    let mut changed = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if changed {
                    for sample in latest.values() {
                        info!(%sample, "Pose");
                    }
                    changed = false;
                }
            }
            received = pose_rx.recv() => match received {
                Ok(sample) => {
                    debug!(robot = %sample.robot, tick = sample.tick, "New pose received in reporter");
                    latest.insert(sample.robot.clone(), sample);
                    changed = true;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Pose reporter lagged.");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    for sample in latest.values() {
        info!(%sample, "Final pose");
    }
    Ok(latest.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Topic;

    fn sample(robot: &str, tick: u64, z: f64) -> PoseSample {
        PoseSample {
            tick,
            robot: robot.to_string(),
            x: 0.0,
            z,
            yaw: 0.0,
            compass: 0.0,
        }
    }

    #[tokio::test]
    async fn test_returns_latest_pose_per_robot_when_topic_closes() {
        let topic: Topic<PoseSample> = Topic::new("pose", 8);
        let rx = topic.subscribe();
        topic.publish(sample("NXT2", 1, 1.0));
        topic.publish(sample("NXT1", 1, 2.0));
        topic.publish(sample("NXT2", 2, 3.0));
        drop(topic);

        let finals = report_task(rx, Duration::from_millis(5)).await.unwrap();
        assert_eq!(finals.len(), 2);
        assert_eq!(finals[0].robot, "NXT1");
        assert_eq!(finals[1].tick, 2);
        assert_eq!(finals[1].z, 3.0);
    }

    #[tokio::test]
    async fn test_survives_lag() {
        let topic: Topic<PoseSample> = Topic::new("pose", 2);
        let rx = topic.subscribe();
        for tick in 1..=5 {
            topic.publish(sample("NXT1", tick, tick as f64));
        }
        drop(topic);

        let finals = report_task(rx, Duration::from_millis(5)).await.unwrap();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].tick, 5);
    }
}
