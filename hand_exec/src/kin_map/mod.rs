//! # Kinematic mapping module
//!
//! Converts calibrated potentiometer readings into per-joint flex angles for each digit, and the
//! glove's orientation and acceleration readings into a wrist pose.
//!
//! Two simplifications must stay in step with the renderer and glove firmware:
//! - Every joint in a digit receives the same angle, scaled by `1 - 1/n` where `n` is the number
//!   of joints in the digit. A single joint digit therefore never rotates.
//! - The acceleration vector is used directly as the wrist position offset, it is not integrated.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use util::maths::lin_map;

use crate::digits::{Digit, NUM_DIGITS};

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Full scale potentiometer reading.
pub const POT_FULL_SCALE: f64 = 1023.0;

/// Flex angle at a potentiometer reading of zero.
///
/// Units: degrees
pub const MIN_FLEX_DEG: f64 = 0.0;

/// Flex angle at a full scale potentiometer reading.
///
/// Units: degrees
pub const MAX_FLEX_DEG: f64 = 90.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Joint rotation angles for every digit.
///
/// Each angle is a rotation about the joint's local X axis.
///
/// Units: degrees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointAngleSet {
    pub angles_deg: [Vec<f64>; NUM_DIGITS],
}

/// Orientation and position of the wrist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WristPose {
    /// Euler rotation about the X, Y and Z axes, `(-pitch, -yaw, -roll)` of the adjusted readings.
    ///
    /// Units: degrees
    pub euler_deg: Vector3<f64>,

    /// Orientation built from `euler_deg`, applying Z then X then Y.
    pub orientation: UnitQuaternion<f64>,

    /// Position offset, taken directly from the acceleration reading.
    pub position: Vector3<f64>,
}

/// Everything the renderer needs to pose the hand for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandPose {
    pub joints: JointAngleSet,
    pub wrist: WristPose,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during kinematic mapping.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq)]
pub enum KinMapError {
    #[error("The {0} digit has no joints configured")]
    NoJoints(Digit),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointAngleSet {
    /// Angles of the given digit's joints, base joint first.
    pub fn digit(&self, digit: Digit) -> &[f64] {
        &self.angles_deg[digit.index()]
    }
}

impl Default for WristPose {
    fn default() -> Self {
        Self {
            euler_deg: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            position: Vector3::zeros(),
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Base flex angle for a calibrated potentiometer reading.
///
/// The reading is normalised by the full scale value without clamping, so readings outside of
/// `[0, 1023]` give angles outside of `[0, 90]`.
pub fn base_angle_deg(raw_calibrated: i32) -> f64 {
    let frac = raw_calibrated as f64 / POT_FULL_SCALE;

    lin_map((0.0, 1.0), (MIN_FLEX_DEG, MAX_FLEX_DEG), frac)
}

/// Weight applied to the base angle for every joint in a digit with `joint_count` joints.
pub fn joint_weight(digit: Digit, joint_count: usize) -> Result<f64, KinMapError> {
    if joint_count == 0 {
        return Err(KinMapError::NoJoints(digit));
    }

    Ok(1.0 - 1.0 / joint_count as f64)
}

/// Joint angles for one digit.
///
/// Every joint gets `-base_angle * weight`, see [`joint_weight`].
pub fn finger_angles(
    digit: Digit,
    raw_calibrated: i32,
    joint_count: usize,
) -> Result<Vec<f64>, KinMapError> {
    let weight = joint_weight(digit, joint_count)?;
    let angle_deg = -base_angle_deg(raw_calibrated) * weight;

    Ok(vec![angle_deg; joint_count])
}

/// Build the wrist pose from adjusted orientation readings and the raw acceleration.
///
/// The orientation uses `(-pitch, -yaw, -roll)` as the X, Y and Z rotations, matching the way the
/// IMU is mounted on the glove.
pub fn wrist_pose(yaw_deg: f64, pitch_deg: f64, roll_deg: f64, accel: [f64; 3]) -> WristPose {
    let euler_deg = Vector3::new(-pitch_deg, -yaw_deg, -roll_deg);

    let rot_x = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), euler_deg.x.to_radians());
    let rot_y = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), euler_deg.y.to_radians());
    let rot_z = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), euler_deg.z.to_radians());

    WristPose {
        euler_deg,
        orientation: rot_y * rot_x * rot_z,
        position: Vector3::new(accel[0], accel[1], accel[2]),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_base_angle() {
        assert_eq!(base_angle_deg(0), 0.0);
        assert_eq!(base_angle_deg(1023), 90.0);

        // Not clamped
        assert_eq!(base_angle_deg(2046), 180.0);
        assert!((base_angle_deg(-1023) + 90.0).abs() < EPS);
        assert!((base_angle_deg(512) - 512.0 * 90.0 / 1023.0).abs() < EPS);
    }

    #[test]
    fn test_finger_angles() {
        let angles = finger_angles(Digit::Index, 1023, 3).unwrap();
        assert_eq!(angles.len(), 3);
        for a in angles.iter() {
            assert!((a + 60.0).abs() < EPS);
        }

        // Every joint in the digit gets the same angle
        let angles = finger_angles(Digit::Middle, 300, 4).unwrap();
        assert!(angles.iter().all(|a| *a == angles[0]));
    }

    #[test]
    fn test_single_joint_digit() {
        for raw in [0, 512, 1023, 2046].iter() {
            let angles = finger_angles(Digit::Thumb, *raw, 1).unwrap();
            assert_eq!(angles.len(), 1);
            assert_eq!(angles[0].abs(), 0.0);
        }
    }

    #[test]
    fn test_no_joints() {
        assert_eq!(
            finger_angles(Digit::Pinky, 100, 0),
            Err(KinMapError::NoJoints(Digit::Pinky))
        );
    }

    #[test]
    fn test_wrist_pose_axes() {
        let pose = wrist_pose(-180.0, -90.0, -180.0, [1.0, 2.0, 3.0]);

        assert_eq!(pose.euler_deg, Vector3::new(90.0, 180.0, 180.0));
        assert_eq!(pose.position, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_wrist_pose_composition() {
        // Pure yaw rotates about Y only
        let pose = wrist_pose(90.0, 0.0, 0.0, [0.0; 3]);
        let expected =
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -std::f64::consts::FRAC_PI_2);
        assert!(pose.orientation.angle_to(&expected) < EPS);

        // Roll is applied before pitch, which is applied before yaw
        let pose = wrist_pose(30.0, 20.0, 10.0, [0.0; 3]);
        let v = Vector3::new(1.0, 0.0, 0.0);
        let stepwise = {
            let after_z = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), (-10f64).to_radians()) * v;
            let after_x = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), (-20f64).to_radians()) * after_z;
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), (-30f64).to_radians()) * after_x
        };
        assert!((pose.orientation * v - stepwise).norm() < EPS);
    }

    #[test]
    fn test_default_pose() {
        let pose = HandPose::default();
        assert_eq!(pose.wrist.orientation, UnitQuaternion::identity());
        assert!(pose.joints.digit(Digit::Index).is_empty());
    }
}
