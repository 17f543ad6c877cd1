//! Implementations for the KinMap state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};

// Internal
use super::{finger_angles, wrist_pose, HandPose, JointAngleSet, KinMapError, Params};
use crate::digits::{Digit, NUM_DIGITS};
use comms_if::eqpt::hand::TelemetryFrame;
use util::{module::State, session::Session};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Highest nominal potentiometer reading.
const POT_MAX: i32 = 1023;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic mapping module state
#[derive(Default)]
pub struct KinMap {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,
}

/// Status report for KinMap processing.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusReport {
    /// Set for channels whose calibrated reading was outside of `[0, 1023]`. These readings are
    /// still mapped, this is for information only.
    pub pot_out_of_range: [bool; NUM_DIGITS],

    /// Yaw, pitch and roll after the orientation offsets were applied.
    ///
    /// Units: degrees
    pub adjusted_ypr_deg: [f64; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for KinMap {
    type InitData = Params;
    type InitError = KinMapError;

    type InputData = TelemetryFrame;
    type OutputData = HandPose;
    type StatusReport = StatusReport;
    type ProcError = KinMapError;

    /// Initialise the KinMap module.
    ///
    /// Every digit must have at least one joint.
    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: Option<&Session>,
    ) -> Result<(), Self::InitError> {
        for digit in Digit::ALL.iter() {
            if init_data.joint_counts[digit.index()] == 0 {
                return Err(KinMapError::NoJoints(*digit));
            }
        }

        debug!(
            "KinMap initialised with joint counts {:?} and orientation offsets {:?}",
            init_data.joint_counts, init_data.orientation_offsets
        );

        self.params = init_data;

        Ok(())
    }

    /// Map one calibrated telemetry frame into a hand pose.
    ///
    /// The potentiometer readings in `input_data` must already have the calibration offsets
    /// applied. The orientation offsets are applied here.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        // Build the whole pose before returning anything so that an error can't leave a partial
        // update behind
        let mut joints = JointAngleSet::default();
        for digit in Digit::ALL.iter() {
            let i = digit.index();
            let raw = input_data.pots[i];

            self.report.pot_out_of_range[i] = raw < 0 || raw > POT_MAX;

            joints.angles_deg[i] = finger_angles(*digit, raw, self.params.joint_counts[i])?;
        }

        let offsets = &self.params.orientation_offsets;
        let yaw_deg = input_data.yaw_deg + offsets.yaw_deg;
        let pitch_deg = input_data.pitch_deg + offsets.pitch_deg;
        let roll_deg = input_data.roll_deg + offsets.roll_deg;

        self.report.adjusted_ypr_deg = [yaw_deg, pitch_deg, roll_deg];

        let wrist = wrist_pose(yaw_deg, pitch_deg, roll_deg, input_data.accel);

        Ok((HandPose { joints, wrist }, self.report))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::kin_map::OrientationOffsets;
    use nalgebra::Vector3;

    fn init_kin_map() -> KinMap {
        let mut kin_map = KinMap::default();
        kin_map
            .init(
                Params {
                    joint_counts: [3, 3, 3, 3, 1],
                    orientation_offsets: OrientationOffsets::default(),
                },
                None,
            )
            .unwrap();
        kin_map
    }

    fn frame(pots: [i32; NUM_DIGITS]) -> TelemetryFrame {
        TelemetryFrame {
            pots,
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            roll_deg: 0.0,
            accel: [1.0, 2.0, 3.0],
        }
    }

    #[test]
    fn test_init_rejects_empty_digit() {
        let mut kin_map = KinMap::default();
        let res = kin_map.init(
            Params {
                joint_counts: [3, 3, 0, 3, 2],
                ..Default::default()
            },
            None,
        );
        assert_eq!(res, Err(KinMapError::NoJoints(Digit::Ring)));
    }

    #[test]
    fn test_proc_before_init() {
        let mut kin_map = KinMap::default();
        assert_eq!(
            kin_map.proc(&frame([0; NUM_DIGITS])).map(|_| ()),
            Err(KinMapError::NoJoints(Digit::Index))
        );
    }

    #[test]
    fn test_proc_orientation_offsets() {
        let mut kin_map = init_kin_map();

        let (pose, report) = kin_map.proc(&frame([0; NUM_DIGITS])).unwrap();

        assert_eq!(report.adjusted_ypr_deg, [-180.0, -90.0, -180.0]);
        assert_eq!(pose.wrist.euler_deg, Vector3::new(90.0, 180.0, 180.0));
        assert_eq!(pose.wrist.position, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_proc_joints() {
        let mut kin_map = init_kin_map();

        let (pose, report) = kin_map.proc(&frame([1023, 0, 2046, -10, 1023])).unwrap();

        assert_eq!(pose.joints.digit(Digit::Index).len(), 3);
        assert!((pose.joints.digit(Digit::Index)[0] + 60.0).abs() < 1e-9);
        assert_eq!(pose.joints.digit(Digit::Middle)[2].abs(), 0.0);
        assert!((pose.joints.digit(Digit::Ring)[1] + 120.0).abs() < 1e-9);

        // Single joint thumb never rotates
        assert_eq!(pose.joints.digit(Digit::Thumb), &[0.0]);

        assert_eq!(report.pot_out_of_range, [false, false, true, true, false]);
    }
}
