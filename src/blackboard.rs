use parking_lot::RwLock;
use std::{sync::Arc, time::Instant};

use crate::robot::PoseSample;
use crate::simulation::SimState;

#[derive(Clone)]
pub struct State {
    pub sim_state: SimState,
    pub tick: u64,
    pub poses: Vec<PoseSample>,
    pub last_tick_ts: Instant,
    pub finished: bool,
    pub faults: Vec<String>,
}

impl Default for State {
    fn default() -> Self {
        State {
            sim_state: SimState::Stopped,
            tick: 0,
            poses: Vec::new(),
            last_tick_ts: Instant::now(),
            finished: false,
            faults: Vec::new(),
        }
    }
}

pub type Blackboard = Arc<RwLock<State>>;

pub fn snapshot(bb: &Blackboard) -> State {
    (*bb.read()).clone()
}

pub fn record_tick(bb: &Blackboard, sim_state: SimState, tick: u64, poses: Vec<PoseSample>) {
    let mut g = bb.write();
    g.sim_state = sim_state;
    g.tick = tick;
    g.poses = poses;
    g.last_tick_ts = Instant::now();
}

pub fn mark_finished(bb: &Blackboard, sim_state: SimState) {
    let mut g = bb.write();
    g.sim_state = sim_state;
    g.finished = true;
}

pub fn raise_fault(bb: &Blackboard, msg: &str) {
    let mut g = bb.write();
    if !g.faults.iter().any(|s| s == msg) {
        g.faults.push(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faults_are_deduplicated() {
        let bb: Blackboard = Arc::default();
        raise_fault(&bb, "NXT1: pivot");
        raise_fault(&bb, "NXT1: pivot");
        raise_fault(&bb, "NXT2: pivot");
        assert_eq!(snapshot(&bb).faults, vec!["NXT1: pivot".to_string(), "NXT2: pivot".to_string()]);
    }

    #[test]
    fn test_record_tick_overwrites_poses() {
        let bb: Blackboard = Arc::default();
        record_tick(&bb, SimState::Running, 4, Vec::new());
        let state = snapshot(&bb);
        assert_eq!(state.tick, 4);
        assert_eq!(state.sim_state, SimState::Running);
        assert!(!state.finished);

        mark_finished(&bb, SimState::Stopped);
        assert!(snapshot(&bb).finished);
    }
}
