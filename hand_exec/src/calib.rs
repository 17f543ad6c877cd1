//! # Calibration store
//!
//! Holds the per-channel potentiometer offsets and applies them to raw readings. The offsets are
//! set once at the start of a session and persist across frames.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::hand::NUM_POT_CHANNELS;
use log::debug;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Additive offsets for each potentiometer channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibStore {
    offsets: [i32; NUM_POT_CHANNELS],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CalibStore {
    /// Create a store with all offsets zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given initial offsets.
    pub fn with_offsets(offsets: [i32; NUM_POT_CHANNELS]) -> Self {
        Self { offsets }
    }

    /// Replace the stored offsets.
    pub fn set_offsets(&mut self, offsets: [i32; NUM_POT_CHANNELS]) {
        debug!("Calibration offsets set to {:?}", offsets);
        self.offsets = offsets;
    }

    /// The current offsets.
    pub fn offsets(&self) -> [i32; NUM_POT_CHANNELS] {
        self.offsets
    }

    /// Apply the offsets to a set of raw readings.
    ///
    /// Results are not clamped to the sensor range, out of range values are passed on to the
    /// kinematic mapping as they are. Only integer overflow saturates.
    pub fn apply(&self, raw: [i32; NUM_POT_CHANNELS]) -> [i32; NUM_POT_CHANNELS] {
        let mut out = raw;
        for (val, offset) in out.iter_mut().zip(self.offsets.iter()) {
            *val = val.saturating_add(*offset);
        }
        out
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
