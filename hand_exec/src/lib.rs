//! # Hand library.
//!
//! This library allows other crates in the workspace (and the benches) to access items defined
//! inside the hand crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Calibration - per channel potentiometer offsets
pub mod calib;

/// Contact feedback - converts contacts reported by the renderer into servo commands
pub mod contact;

/// Digit definitions and the joint handles making up each digit
pub mod digits;

/// Hand control - runs the link, calibration, mapping and feedback together
pub mod hand_ctrl;

/// Kinematic mapping - converts calibrated telemetry into joint angles and a wrist pose
pub mod kin_map;

/// Serial link to the glove
pub mod link;

/// Executable parameters
pub mod params;
