#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for tick-based differential-drive arc kinematics."]
#![doc = ""]
#![doc = "Each tick the left and right wheel revolutions are turned into arc lengths,"]
#![doc = "the robot is assumed to have travelled along a circular arc, and the resulting"]
#![doc = "local-frame translation and heading change are handed to a [`PoseSink`]."]

use core::f64::consts::PI;
use core::fmt;
use libm::{cos, fabs, sin};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::KinematicsError;

/// Fixed dimensions of a two-wheeled differential-drive robot.
///
/// Both values share one length unit; the translations produced by
/// [`DifferentialDrive`] are expressed in that unit.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawWheelGeometry"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelGeometry {
    /// Distance between the left and right wheel contact points.
    wheel_span: f64,
    /// Wheel diameter.
    wheel_diameter: f64,
}

impl WheelGeometry {
    /// Construct a validated geometry.
    ///
    /// # Arguments
    ///
    /// * `wheel_span`: Distance between the two wheel contact points.
    /// * `wheel_diameter`: Diameter of each drive wheel.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidConfiguration)` if either value is
    /// zero, negative, NaN or infinite. A zero span would otherwise divide by
    /// zero on every turn.
    pub const fn new(wheel_span: f64, wheel_diameter: f64) -> Result<Self, KinematicsError> {
        if !(wheel_span > 0.0) || !wheel_span.is_finite() {
            return Err(KinematicsError::InvalidConfiguration(
                "wheel span must be positive and finite",
            ));
        }
        if !(wheel_diameter > 0.0) || !wheel_diameter.is_finite() {
            return Err(KinematicsError::InvalidConfiguration(
                "wheel diameter must be positive and finite",
            ));
        }
        Ok(WheelGeometry {
            wheel_span,
            wheel_diameter,
        })
    }

    /// Returns the wheel span.
    pub fn wheel_span(&self) -> f64 {
        self.wheel_span
    }

    /// Returns the wheel diameter.
    pub fn wheel_diameter(&self) -> f64 {
        self.wheel_diameter
    }

    /// Distance covered by one full wheel revolution.
    pub fn circumference(&self) -> f64 {
        self.wheel_diameter * PI
    }

    /// Converts signed wheel revolutions into a signed arc length.
    pub fn arc_length(&self, revolutions: f64) -> f64 {
        revolutions * self.wheel_diameter * PI
    }
}

impl fmt::Display for WheelGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WheelGeometry (span: {:.3}, diameter: {:.3})", self.wheel_span, self.wheel_diameter)
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawWheelGeometry {
    wheel_span: f64,
    wheel_diameter: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawWheelGeometry> for WheelGeometry {
    type Error = KinematicsError;

    fn try_from(raw: RawWheelGeometry) -> Result<Self, Self::Error> {
        WheelGeometry::new(raw.wheel_span, raw.wheel_diameter)
    }
}

/// Wheel rotation accumulated since the previous tick.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelDeltas {
    /// Left wheel revolutions (negative when running in reverse).
    pub left: f64,
    /// Right wheel revolutions (negative when running in reverse).
    pub right: f64,
    /// Revolutions of a third motor. Hosts with three motor ports pass it
    /// along each tick; it never affects the drive.
    #[cfg_attr(feature = "serde", serde(default))]
    pub auxiliary: f64,
}

impl WheelDeltas {
    /// Construct deltas for the two drive wheels.
    pub const fn new(left: f64, right: f64) -> Self {
        WheelDeltas {
            left,
            right,
            auxiliary: 0.0,
        }
    }

    /// Construct deltas including the third motor's sample.
    pub const fn with_auxiliary(left: f64, right: f64, auxiliary: f64) -> Self {
        WheelDeltas {
            left,
            right,
            auxiliary,
        }
    }
}

impl fmt::Display for WheelDeltas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(L: {:.3} rev, R: {:.3} rev)", self.left, self.right)
    }
}

/// Relative motion produced by one tick, in the robot's local frame.
///
/// `+z` is forward and `+x` is the robot's right-hand side. A positive
/// `d_angle` turns the robot toward its left.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArcMotion {
    /// Lateral displacement.
    pub dx: f64,
    /// Forward displacement.
    pub dz: f64,
    /// Rotation about the vertical axis (rad).
    pub d_angle: f64,
}

impl ArcMotion {
    /// No motion at all.
    pub const ZERO: ArcMotion = ArcMotion {
        dx: 0.0,
        dz: 0.0,
        d_angle: 0.0,
    };

    /// Construct an arc motion.
    pub const fn new(dx: f64, dz: f64, d_angle: f64) -> Self {
        ArcMotion { dx, dz, d_angle }
    }

    /// True when the motion neither translates nor rotates the robot.
    pub fn is_stationary(&self) -> bool {
        self.dx == 0.0 && self.dz == 0.0 && self.d_angle == 0.0
    }
}

impl fmt::Display for ArcMotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(dx: {:.3}, dz: {:.3}, dθ: {:.3} rad)", self.dx, self.dz, self.d_angle)
    }
}

/// What to do when the two wheels turn in opposite directions.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PivotPolicy {
    /// Follow the same circular-arc model as any other turn. The turning
    /// centre then lies between the wheels; equal and opposite wheel travel
    /// spins the robot in place.
    #[default]
    Arc,
    /// Refuse the tick with [`KinematicsError::PivotUnsupported`].
    Reject,
}

/// The pose primitives a host exposes to the kinematics.
///
/// Both operations are relative and expressed in the robot's current local
/// frame (`+y` up, `+z` forward).
pub trait PoseSink {
    /// Translate the robot by `(dx, dy, dz)` in its local frame.
    fn move_by(&mut self, dx: f64, dy: f64, dz: f64);

    /// Rotate the robot by `angle` radians about the local axis
    /// `(axis_x, axis_y, axis_z)`.
    fn rotate_by(&mut self, axis_x: f64, axis_y: f64, axis_z: f64, angle: f64);
}

/// Tick-based differential-drive kinematics for one robot.
///
/// Holds nothing but the robot's immutable geometry and pivot policy, so a
/// value can be copied freely between threads; every robot owns its own.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialDrive {
    geometry: WheelGeometry,
    #[cfg_attr(feature = "serde", serde(default))]
    pivot_policy: PivotPolicy,
}

impl DifferentialDrive {
    /// Construct a drive with the default [`PivotPolicy::Arc`].
    pub const fn new(geometry: WheelGeometry) -> Self {
        DifferentialDrive {
            geometry,
            pivot_policy: PivotPolicy::Arc,
        }
    }

    /// Replace the pivot policy.
    pub const fn with_pivot_policy(mut self, pivot_policy: PivotPolicy) -> Self {
        self.pivot_policy = pivot_policy;
        self
    }

    /// Returns the robot geometry.
    pub fn geometry(&self) -> &WheelGeometry {
        &self.geometry
    }

    /// Returns the pivot policy.
    pub fn pivot_policy(&self) -> PivotPolicy {
        self.pivot_policy
    }

    /// Computes the local-frame motion for one tick of wheel rotation.
    ///
    /// The wheel revolutions are first converted to arc lengths `dsa` (left)
    /// and `dsb` (right). When one arc is longer than the other the robot
    /// follows a circle whose centre sits on the side of the shorter arc:
    ///
    /// * `|dsa| > |dsb|`: `θ = (dsa - dsb) / span`, `r = span (dsa + dsb) / (dsa - dsb) / 2`,
    ///   the robot moves by `(r - r cos θ, r sin θ)` and turns by `-θ`.
    /// * `|dsb| > |dsa|`: `θ = (dsb - dsa) / span`, `r = span (dsa + dsb) / (dsb - dsa) / 2`,
    ///   the robot moves by `(r cos θ - r, r sin θ)` and turns by `+θ`.
    ///
    /// Equal arcs in the same direction are a straight move of `dsa`; equal and
    /// opposite arcs are a spin in place by `(dsb - dsa) / span`.
    ///
    /// Near-equal arcs give very large radii; no threshold is applied beyond
    /// exact equality.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NonFiniteDelta)` if either drive wheel delta is NaN or
    /// infinite, or if a delta is so large that its travel or the resulting motion overflows.
    /// Returns `Err(KinematicsError::PivotUnsupported)` for opposite wheel directions under
    /// [`PivotPolicy::Reject`].
    pub fn update(&self, deltas: WheelDeltas) -> Result<ArcMotion, KinematicsError> {
        if !deltas.left.is_finite() || !deltas.right.is_finite() {
            return Err(KinematicsError::NonFiniteDelta("wheel deltas must be finite"));
        }

        let dsa = self.geometry.arc_length(deltas.left);
        let dsb = self.geometry.arc_length(deltas.right);
        if !dsa.is_finite() || !dsb.is_finite() {
            return Err(KinematicsError::NonFiniteDelta("wheel travel overflows"));
        }
        let span = self.geometry.wheel_span;
        // Halved arcs keep the radius ratio finite for any finite travel.
        let (ha, hb) = (dsa / 2.0, dsb / 2.0);

        let opposite = (dsa < 0.0 && dsb > 0.0) || (dsa > 0.0 && dsb < 0.0);
        if opposite && self.pivot_policy == PivotPolicy::Reject {
            return Err(KinematicsError::PivotUnsupported(
                "wheels turned in opposite directions",
            ));
        }

        let motion = if fabs(dsa) > fabs(dsb) {
            let angle = (dsa - dsb) / span;
            let radius = span / 2.0 * ((ha + hb) / (ha - hb));
            ArcMotion::new(radius - cos(angle) * radius, sin(angle) * radius, -angle)
        } else if fabs(dsb) > fabs(dsa) {
            let angle = (dsb - dsa) / span;
            let radius = span / 2.0 * ((ha + hb) / (hb - ha));
            ArcMotion::new(cos(angle) * radius - radius, sin(angle) * radius, angle)
        } else if opposite {
            // Zero radius: the centre of the robot stays put.
            ArcMotion::new(0.0, 0.0, (dsb - dsa) / span)
        } else {
            ArcMotion::new(0.0, dsa, 0.0)
        };

        if !motion.dx.is_finite() || !motion.dz.is_finite() || !motion.d_angle.is_finite() {
            return Err(KinematicsError::NonFiniteDelta("motion overflows"));
        }
        Ok(motion)
    }

    /// Computes the motion for one tick and applies it to `pose`.
    ///
    /// The translation is applied first, then the rotation about the local
    /// vertical axis. Straight moves issue no rotation. On error the pose is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`DifferentialDrive::update`].
    pub fn apply<P: PoseSink + ?Sized>(
        &self,
        deltas: WheelDeltas,
        pose: &mut P,
    ) -> Result<ArcMotion, KinematicsError> {
        let motion = self.update(deltas)?;
        pose.move_by(motion.dx, 0.0, motion.dz);
        if motion.d_angle != 0.0 {
            pose.rotate_by(0.0, 1.0, 0.0, motion.d_angle);
        }
        Ok(motion)
    }
}

impl fmt::Display for DifferentialDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DifferentialDrive (span: {:.3}, D: {:.3}, pivot: {:?})",
            self.geometry.wheel_span, self.geometry.wheel_diameter, self.pivot_policy)
    }
}
