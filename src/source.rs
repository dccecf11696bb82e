use std::collections::VecDeque;

use serde::Deserialize;
use tracing::debug;
use tread_kinematics::WheelDeltas;

/// Produces the wheel rotation of one tick.
pub trait WheelDeltaSource: Send {
    fn next_deltas(&mut self) -> WheelDeltas;

    /// Rewind to the initial state.
    fn restart(&mut self) {}

    /// True once the source will only produce zero deltas.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Constant wheel rotation, in revolutions per tick, held for `ticks` ticks.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Segment {
    pub left: f64,
    pub right: f64,
    #[serde(default)]
    pub auxiliary: f64,
    pub ticks: u32,
}

impl Segment {
    pub fn new(left: f64, right: f64, ticks: u32) -> Self {
        Segment {
            left,
            right,
            auxiliary: 0.0,
            ticks,
        }
    }

    fn deltas(&self) -> WheelDeltas {
        WheelDeltas::with_auxiliary(self.left, self.right, self.auxiliary)
    }
}

/// Plays a fixed sequence of segments, then stands still.
#[derive(Debug, Clone)]
pub struct DriveScript {
    segments: Vec<Segment>,
    queue: VecDeque<Segment>,
}

impl DriveScript {
    pub fn new(segments: Vec<Segment>) -> Self {
        let queue = segments.iter().copied().collect();
        DriveScript { segments, queue }
    }
}

impl WheelDeltaSource for DriveScript {
    fn next_deltas(&mut self) -> WheelDeltas {
        while let Some(segment) = self.queue.front_mut() {
            if segment.ticks == 0 {
                self.queue.pop_front();
                continue;
            }
            segment.ticks -= 1;
            let deltas = segment.deltas();
            let finished = segment.ticks == 0;
            if finished {
                self.queue.pop_front();
                debug!(segments_left = self.queue.len(), "Drive segment finished");
            }
            return deltas;
        }
        WheelDeltas::default()
    }

    fn restart(&mut self) {
        self.queue = self.segments.iter().copied().collect();
    }

    fn is_finished(&self) -> bool {
        self.queue.iter().all(|s| s.ticks == 0)
    }
}
