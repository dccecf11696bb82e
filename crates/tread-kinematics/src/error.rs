#![warn(missing_docs)]

//! Error types for the kinematics library.
//!
//! Configuration problems are caught when a [`crate::WheelGeometry`] is built;
//! per-tick problems are reported by [`crate::DifferentialDrive::update`].

use core::fmt;

/// Errors that can occur while configuring or running the arc kinematics.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// The robot geometry cannot be used.
    /// Returned when the wheel span or wheel diameter is zero, negative or not finite.
    InvalidConfiguration(&'static str),
    /// A wheel delta was NaN or infinite.
    NonFiniteDelta(&'static str),
    /// The wheels turned in opposite directions and the drive is configured
    /// with [`crate::PivotPolicy::Reject`].
    PivotUnsupported(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            KinematicsError::NonFiniteDelta(msg) => write!(f, "Non-finite wheel delta: {}", msg),
            KinematicsError::PivotUnsupported(msg) => write!(f, "Pivot turn unsupported: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
