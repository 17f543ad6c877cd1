//! # Hand Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use crate::digits::{Digit, DigitJoints};
use crate::kin_map::{self, OrientationOffsets};
use comms_if::eqpt::hand::NUM_POT_CHANNELS;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandExecParams {

    /// Parameters of the serial link to the glove
    pub link: LinkParams,

    /// Target period of one main loop cycle.
    ///
    /// Units: seconds
    #[serde(default = "default_cycle_period_s")]
    pub cycle_period_s: f64,

    /// Initial potentiometer calibration offsets, in channel order
    #[serde(default)]
    pub pot_offsets: [i32; NUM_POT_CHANNELS],

    /// Offsets added to the raw orientation readings
    #[serde(default)]
    pub orientation_offsets: OrientationOffsets,

    /// Joint handles of each digit, base joint first
    pub digits: DigitJoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkParams {

    /// Serial port the glove is connected to
    pub port_name: String,

    /// Baud rate of the glove's UART
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Longest time a single line read may block for
    ///
    /// Units: milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("The {0} digit has no joints")]
    DigitWithoutJoints(Digit),

    #[error("Joint handle {0:?} is used more than once")]
    DuplicateJoint(String),

    #[error("Baud rate must be non-zero")]
    ZeroBaudRate,

    #[error("Read timeout must be non-zero")]
    ZeroReadTimeout,

    #[error("Cycle period must be positive, found {0}")]
    InvalidCyclePeriod(f64),

    #[error("Read timeout ({read_timeout_ms} ms) is longer than the cycle period ({cycle_period_s} s)")]
    ReadTimeoutExceedsCycle {
        read_timeout_ms: u64,
        cycle_period_s: f64,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HandExecParams {

    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if self.link.baud_rate == 0 {
            return Err(ParamsError::ZeroBaudRate);
        }

        if self.link.read_timeout_ms == 0 {
            return Err(ParamsError::ZeroReadTimeout);
        }

        if !(self.cycle_period_s > 0.0) || !self.cycle_period_s.is_finite() {
            return Err(ParamsError::InvalidCyclePeriod(self.cycle_period_s));
        }

        // A quiet glove makes every poll wait out the read timeout, which has to fit in a cycle
        if self.read_timeout() > self.cycle_period() {
            return Err(ParamsError::ReadTimeoutExceedsCycle {
                read_timeout_ms: self.link.read_timeout_ms,
                cycle_period_s: self.cycle_period_s,
            });
        }

                let mut seen = HashSet::new();

        for digit in Digit::ALL.iter() {
            let joints = self.digits.get(*digit);

            if joints.is_empty() {
                return Err(ParamsError::DigitWithoutJoints(*digit));
            }

            for handle in joints {
                if !seen.insert(handle) {
                    return Err(ParamsError::DuplicateJoint(handle.0.clone()));
                }
            }
        }

        Ok(())
    }

    /// Read timeout of the link.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.link.read_timeout_ms)
    }

    /// Main loop cycle period.
    pub fn cycle_period(&self) -> Duration {
        Duration::from_secs_f64(self.cycle_period_s)
    }

    /// Parameters for the kinematic mapping module.
    pub fn kin_map_params(&self) -> kin_map::Params {
        kin_map::Params {
            joint_counts: self.digits.joint_counts(),
            orientation_offsets: self.orientation_offsets,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_cycle_period_s() -> f64 {
    0.05
}

fn default_baud_rate() -> u32 {
    115200
}

fn default_read_timeout_ms() -> u64 {
    50
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::digits::test::test_joints;

    pub(crate) fn test_params() -> HandExecParams {
        HandExecParams {
            link: LinkParams {
                port_name: "mock0".into(),
                baud_rate: 115200,
                read_timeout_ms: 5,
            },
            cycle_period_s: 0.02,
            pot_offsets: [0; NUM_POT_CHANNELS],
            orientation_offsets: OrientationOffsets::default(),
            digits: test_joints(),
        }
    }

    #[test]
    fn test_load_from_toml() {
        let params: HandExecParams = util::params::from_str(
            r#"
            pot_offsets = [5, 0, 0, 0, 0]

            [link]
            port_name = "/dev/ttyUSB0"

            [orientation_offsets]
            pitch_deg = -45.0

            [digits]
            index = ["index_mcp", "index_pip", "index_dip"]
            middle = ["middle_mcp", "middle_pip", "middle_dip"]
            ring = ["ring_mcp", "ring_pip", "ring_dip"]
            pinky = ["pinky_mcp", "pinky_pip", "pinky_dip"]
            thumb = ["thumb_mcp", "thumb_ip"]
            "#,
        )
        .unwrap();

        assert_eq!(params.link.port_name, "/dev/ttyUSB0");
        assert_eq!(params.link.baud_rate, 115200);
        assert_eq!(params.read_timeout(), Duration::from_millis(50));
        assert_eq!(params.cycle_period(), Duration::from_millis(50));
        assert_eq!(params.pot_offsets, [5, 0, 0, 0, 0]);
        assert_eq!(params.orientation_offsets.pitch_deg, -45.0);
        assert_eq!(params.orientation_offsets.yaw_deg, -180.0);
        assert_eq!(params.kin_map_params().joint_counts, [3, 3, 3, 3, 2]);
        assert_eq!(params.are_valid(), Ok(()));
    }

    #[test]
    fn test_shipped_params_valid() {
        let params: HandExecParams =
            util::params::from_str(include_str!("../../params/hand_exec.toml")).unwrap();

        assert_eq!(params.are_valid(), Ok(()));
        assert!(params.read_timeout() <= params.cycle_period());
    }

    #[test]
    fn test_invalid_params() {
        let mut params = test_params();
        params.digits.ring.clear();
        assert_eq!(
            params.are_valid(),
            Err(ParamsError::DigitWithoutJoints(Digit::Ring))
        );

        let mut params = test_params();
        params.digits.thumb[0] = "index_0".into();
        assert_eq!(
            params.are_valid(),
            Err(ParamsError::DuplicateJoint("index_0".into()))
        );

        let mut params = test_params();
        params.link.baud_rate = 0;
        assert_eq!(params.are_valid(), Err(ParamsError::ZeroBaudRate));

        let mut params = test_params();
        params.link.read_timeout_ms = 0;
        assert_eq!(params.are_valid(), Err(ParamsError::ZeroReadTimeout));

        let mut params = test_params();
        params.link.read_timeout_ms = 50;
        params.cycle_period_s = 1.0 / 60.0;
        assert_eq!(
            params.are_valid(),
            Err(ParamsError::ReadTimeoutExceedsCycle {
                read_timeout_ms: 50,
                cycle_period_s: 1.0 / 60.0
            })
        );

        // Equal is fine
        params.cycle_period_s = 0.05;
        assert_eq!(params.are_valid(), Ok(()));

        let mut params = test_params();
        params.cycle_period_s = 0.0;
        assert_eq!(
            params.are_valid(),
            Err(ParamsError::InvalidCyclePeriod(0.0))
        );
    }
}
