//! # Digits and joint handles
//!
//! Identification of the hand's digits and the opaque joint handles the renderer uses for them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::hand::NUM_POT_CHANNELS;
use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of digits on the hand.
pub const NUM_DIGITS: usize = NUM_POT_CHANNELS;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An opaque handle to a joint owned by the renderer.
///
/// The controller never looks inside a handle, it only compares them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointHandle(pub String);

/// Ordered joint collections for each digit, base joint first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DigitJoints {
    pub index: Vec<JointHandle>,
    pub middle: Vec<JointHandle>,
    pub ring: Vec<JointHandle>,
    pub pinky: Vec<JointHandle>,
    pub thumb: Vec<JointHandle>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The digits of the hand, in potentiometer channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Digit {
    Index,
    Middle,
    Ring,
    Pinky,
    Thumb,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Digit {
    /// All digits in channel order.
    pub const ALL: [Digit; NUM_DIGITS] = [
        Digit::Index,
        Digit::Middle,
        Digit::Ring,
        Digit::Pinky,
        Digit::Thumb,
    ];

    /// Get the digit for a zero based channel index, or `None` if out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Zero based channel index of this digit.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The feedback servo channel driven for this digit (1 to 5).
    pub fn servo_channel(self) -> u8 {
        self as u8 + 1
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl DigitJoints {
    /// Get the joints of the given digit.
    pub fn get(&self, digit: Digit) -> &[JointHandle] {
        match digit {
            Digit::Index => &self.index,
            Digit::Middle => &self.middle,
            Digit::Ring => &self.ring,
            Digit::Pinky => &self.pinky,
            Digit::Thumb => &self.thumb,
        }
    }

    /// Number of joints in each digit, in channel order.
    pub fn joint_counts(&self) -> [usize; NUM_DIGITS] {
        let mut counts = [0; NUM_DIGITS];
        for digit in Digit::ALL.iter() {
            counts[digit.index()] = self.get(*digit).len();
        }
        counts
    }

    /// Find the digit and joint index of a handle.
    ///
    /// Digits are searched in channel order and the first matching joint wins.
    pub fn locate(&self, handle: &JointHandle) -> Option<(Digit, usize)> {
        for digit in Digit::ALL.iter() {
            if let Some(i) = self.get(*digit).iter().position(|h| h == handle) {
                return Some((*digit, i));
            }
        }
        None
    }
}

impl From<&str> for JointHandle {
    fn from(s: &str) -> Self {
        JointHandle(s.to_string())
    }
}

impl fmt::Display for JointHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Joints for a hand with three joints per finger and two in the thumb.
    pub(crate) fn test_joints() -> DigitJoints {
        let handles = |prefix: &str, n: usize| -> Vec<JointHandle> {
            (0..n)
                .map(|i| JointHandle(format!("{}_{}", prefix, i)))
                .collect()
        };

        DigitJoints {
            index: handles("index", 3),
            middle: handles("middle", 3),
            ring: handles("ring", 3),
            pinky: handles("pinky", 3),
            thumb: handles("thumb", 2),
        }
    }

    #[test]
    fn test_digit_channels() {
        assert_eq!(Digit::from_index(0), Some(Digit::Index));
        assert_eq!(Digit::from_index(4), Some(Digit::Thumb));
        assert_eq!(Digit::from_index(5), None);

        assert_eq!(Digit::Index.servo_channel(), 1);
        assert_eq!(Digit::Ring.servo_channel(), 3);
        assert_eq!(Digit::Thumb.servo_channel(), 5);
        assert_eq!(Digit::Pinky.index(), 3);
    }

    #[test]
    fn test_joint_counts() {
        assert_eq!(test_joints().joint_counts(), [3, 3, 3, 3, 2]);
    }

    #[test]
    fn test_locate() {
        let joints = test_joints();

        assert_eq!(joints.locate(&"ring_1".into()), Some((Digit::Ring, 1)));
        assert_eq!(joints.locate(&"thumb_0".into()), Some((Digit::Thumb, 0)));
        assert_eq!(joints.locate(&"wrist".into()), None);
    }

    #[test]
    fn test_locate_first_match_wins() {
        let mut joints = test_joints();
        // The same handle in two digits is reported against the first digit only
        joints.pinky[2] = "shared".into();
        joints.thumb[0] = "shared".into();

        assert_eq!(joints.locate(&"shared".into()), Some((Digit::Pinky, 2)));
    }
}
