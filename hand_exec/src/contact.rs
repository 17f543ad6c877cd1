//! # Contact feedback
//!
//! Turns contact events reported by the renderer into servo command frames, so the glove can
//! resist the wearer's finger at the angle where it touched something.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::hand::CommandFrame;
use log::debug;

use crate::digits::{Digit, DigitJoints, JointHandle, NUM_DIGITS};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Contact to command mapping for a configured hand.
#[derive(Debug, Clone)]
pub struct ContactFeedback {
    joints: DigitJoints,
}

/// One joint of one digit touching an external object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub digit: Digit,
    pub joint_index: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ContactError {
    #[error("Digit index {0} is out of range (expected 0 to {})", NUM_DIGITS - 1)]
    InvalidDigit(usize),

    #[error("The {digit} digit has no joint {joint_index}")]
    InvalidJoint { digit: Digit, joint_index: usize },

    #[error("Joint {0} is not part of any digit")]
    UnknownJoint(JointHandle),

    #[error("Contact angle {0} is not finite")]
    NonFiniteAngle(f64),

    #[error("Contact angle {0} is outside the range of a command frame")]
    AngleOutOfRange(f64),

    #[error("No angle has been mapped yet for the {digit} digit joint {joint_index}")]
    NoPose { digit: Digit, joint_index: usize },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ContactFeedback {
    pub fn new(joints: DigitJoints) -> Self {
        Self { joints }
    }

    /// Validate a contact reported by digit and joint index.
    pub fn event(&self, digit_index: usize, joint_index: usize) -> Result<ContactEvent, ContactError> {
        let digit = Digit::from_index(digit_index).ok_or(ContactError::InvalidDigit(digit_index))?;

        if joint_index >= self.joints.get(digit).len() {
            return Err(ContactError::InvalidJoint { digit, joint_index });
        }

        Ok(ContactEvent { digit, joint_index })
    }

    /// Find the contact event for a joint handle.
    ///
    /// Only the first matching joint is reported.
    pub fn event_for_handle(&self, handle: &JointHandle) -> Result<ContactEvent, ContactError> {
        self.joints
            .locate(handle)
            .map(|(digit, joint_index)| ContactEvent { digit, joint_index })
            .ok_or_else(|| ContactError::UnknownJoint(handle.clone()))
    }

    /// Build the command frame for a contact at the given joint angle.
    ///
    /// The digit selects the servo channel (`digit index + 1`) and the angle is rounded to the
    /// nearest whole degree, halves going to the even neighbour.
    pub fn on_contact(
        &self,
        digit_index: usize,
        joint_index: usize,
        current_angle_deg: f64,
    ) -> Result<CommandFrame, ContactError> {
        let event = self.event(digit_index, joint_index)?;
        command_for(event, current_angle_deg)
    }
}

/// Command frame for a validated contact event.
pub fn command_for(event: ContactEvent, angle_deg: f64) -> Result<CommandFrame, ContactError> {
    if !angle_deg.is_finite() {
        return Err(ContactError::NonFiniteAngle(angle_deg));
    }

    let rounded = angle_deg.round_ties_even();
    if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
        return Err(ContactError::AngleOutOfRange(angle_deg));
    }

    let cmd = CommandFrame {
        servo_channel: event.digit.servo_channel(),
        angle_deg: rounded as i32,
    };

    debug!(
        "Contact on {} joint {} at {:.2} deg -> {:?}",
        event.digit, event.joint_index, angle_deg, cmd
    );

    Ok(cmd)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::digits::test::test_joints;
    use comms_if::eqpt::hand::encode;

    #[test]
    fn test_on_contact() {
        let feedback = ContactFeedback::new(test_joints());

        let cmd = feedback.on_contact(2, 1, 45.6).unwrap();
        assert_eq!(
            cmd,
            CommandFrame {
                servo_channel: 3,
                angle_deg: 46
            }
        );
        assert_eq!(encode(&cmd), "3,46\n");
    }

    #[test]
    fn test_rounding() {
        let feedback = ContactFeedback::new(test_joints());

        let angle = |a: f64| feedback.on_contact(0, 0, a).unwrap().angle_deg;

        assert_eq!(angle(-60.0), -60);
        assert_eq!(angle(-59.6), -60);
        assert_eq!(angle(2.5), 2);
        assert_eq!(angle(3.5), 4);
        assert_eq!(angle(0.4), 0);
    }

    #[test]
    fn test_channels() {
        let feedback = ContactFeedback::new(test_joints());

        for digit in Digit::ALL.iter() {
            let cmd = feedback.on_contact(digit.index(), 0, 10.0).unwrap();
            assert_eq!(cmd.servo_channel as usize, digit.index() + 1);
        }
    }

    #[test]
    fn test_invalid_contacts() {
        let feedback = ContactFeedback::new(test_joints());

        assert_eq!(
            feedback.on_contact(5, 0, 10.0),
            Err(ContactError::InvalidDigit(5))
        );
        assert_eq!(
            feedback.on_contact(4, 2, 10.0),
            Err(ContactError::InvalidJoint {
                digit: Digit::Thumb,
                joint_index: 2
            })
        );
        assert!(matches!(
            feedback.on_contact(0, 0, std::f64::NAN),
            Err(ContactError::NonFiniteAngle(_))
        ));
        assert_eq!(
            feedback.on_contact(0, 0, 1e12),
            Err(ContactError::AngleOutOfRange(1e12))
        );
        assert_eq!(
            feedback.on_contact(0, 0, -1e12),
            Err(ContactError::AngleOutOfRange(-1e12))
        );

        // The extremes of the frame's range are still accepted
        assert_eq!(
            feedback.on_contact(0, 0, i32::MAX as f64).unwrap().angle_deg,
            i32::MAX
        );
        assert_eq!(
            feedback.on_contact(0, 0, i32::MIN as f64).unwrap().angle_deg,
            i32::MIN
        );
    }

    #[test]
    fn test_event_for_handle() {
        let feedback = ContactFeedback::new(test_joints());

        assert_eq!(
            feedback.event_for_handle(&"middle_2".into()),
            Ok(ContactEvent {
                digit: Digit::Middle,
                joint_index: 2
            })
        );
        assert_eq!(
            feedback.event_for_handle(&"elbow".into()),
            Err(ContactError::UnknownJoint("elbow".into()))
        );
    }
}
