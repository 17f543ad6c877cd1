//! Parameters structure for KinMap

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::digits::NUM_DIGITS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for kinematic mapping.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Number of joints in each digit, in channel order.
    pub joint_counts: [usize; NUM_DIGITS],

    /// Fixed offsets added to the raw orientation readings.
    #[serde(default)]
    pub orientation_offsets: OrientationOffsets,
}

/// Offsets added to the glove's raw orientation readings before they are used.
///
/// These come from the mounting of the IMU on the glove and are configuration, not calibration
/// results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationOffsets {
    /// Units: degrees
    pub yaw_deg: f64,

    /// Units: degrees
    pub pitch_deg: f64,

    /// Units: degrees
    pub roll_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for OrientationOffsets {
    fn default() -> Self {
        Self {
            yaw_deg: -180.0,
            pitch_deg: -90.0,
            roll_deg: -180.0,
        }
    }
}
