//! Simulation host for the `tread-kinematics` arc updater: robots with a
//! floor pose and compass, scripted wheel motion, and a paced tick loop.

pub mod blackboard;
pub mod bus;
pub mod compass;
pub mod pose;
pub mod reporter;
pub mod robot;
pub mod scheduler;
pub mod settings;
pub mod simulation;
pub mod source;
