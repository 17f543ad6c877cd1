//! # Hand control
//!
//! Ties the link, calibration, kinematic mapping and contact feedback together. A scheduler calls
//! [`HandCtrl::poll`] once per tick; the renderer pulls the latest pose and pushes contacts back.
//!
//! All state is owned by the one `HandCtrl`, and everything goes through `&mut self`, so there is
//! a single writer by construction.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::hand::{self, CommandFrame, DecodeError, TelemetryFrame};
use log::{trace, warn};
use thiserror::Error;

use crate::{
    calib::CalibStore,
    contact::{self, ContactError, ContactEvent, ContactFeedback},
    digits::JointHandle,
    kin_map::{HandPose, JointAngleSet, KinMap, KinMapError, WristPose},
    link::{LinkError, LinkReadError, LinkSession},
    params::HandExecParams,
};
use util::{module::State, session::Session};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The hand controller.
pub struct HandCtrl {
    link: LinkSession,

    calib: CalibStore,

    kin_map: KinMap,

    contact: ContactFeedback,

    /// Last known good pose, only replaced by a fully mapped frame.
    latest: HandPose,

    /// Number of frames successfully applied.
    pub num_frames: u64,

    /// Number of frames rejected as malformed.
    pub num_rejected: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What happened during one call to [`HandCtrl::poll`].
#[derive(Debug, PartialEq)]
pub enum PollOutcome {
    /// A frame was received and the pose updated.
    Updated,

    /// Nothing to do this tick, either no complete line arrived or the link isn't open.
    Idle,

    /// A line was received but could not be applied. The previous pose is kept.
    Malformed(FrameError),

    /// The transport reported an error. The session keeps polling.
    TransportFault,
}

/// Reasons a received line could not be applied.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    #[error("Could not decode frame: {0}")]
    Decode(#[from] DecodeError),

    #[error("Could not map frame: {0}")]
    Map(#[from] KinMapError),
}

#[derive(Debug, Error)]
pub enum HandCtrlError {
    #[error("Could not initialise kinematic mapping: {0}")]
    KinMapInit(KinMapError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HandCtrl {
    /// Create a new controller over the given (usually closed) link.
    pub fn new(
        link: LinkSession,
        params: &HandExecParams,
        session: Option<&Session>,
    ) -> Result<Self, HandCtrlError> {
        let mut kin_map = KinMap::default();
        kin_map
            .init(params.kin_map_params(), session)
            .map_err(HandCtrlError::KinMapInit)?;

        Ok(Self {
            link,
            calib: CalibStore::with_offsets(params.pot_offsets),
            kin_map,
            contact: ContactFeedback::new(params.digits.clone()),
            latest: HandPose::default(),
            num_frames: 0,
            num_rejected: 0,
        })
    }

    /// Open the link to the glove.
    pub fn open(&mut self, port_id: &str, baud_rate: u32) -> Result<(), LinkError> {
        self.link.open(port_id, baud_rate)
    }

    /// Close the link to the glove. The last pose remains available.
    pub fn close(&mut self) {
        self.link.close()
    }

    pub fn link(&self) -> &LinkSession {
        &self.link
    }

    pub fn calib(&self) -> &CalibStore {
        &self.calib
    }

    pub fn calib_mut(&mut self) -> &mut CalibStore {
        &mut self.calib
    }

    /// Perform one tick: read at most one line from the link and apply it.
    ///
    /// Never blocks for longer than the link's read timeout.
    pub fn poll(&mut self) -> PollOutcome {
        let line = match self.link.read_frame_line() {
            Ok(l) => l,
            Err(LinkReadError::Timeout) | Err(LinkReadError::Closed) => return PollOutcome::Idle,
            Err(e) => {
                warn!("Failed to read from the link: {}", e);
                return PollOutcome::TransportFault;
            }
        };

        trace!("Received: {}", line);

        match self.process_line(&line) {
            Ok(()) => PollOutcome::Updated,
            Err(e) => {
                warn!("Discarding frame {:?}: {}", line, e);
                PollOutcome::Malformed(e)
            }
        }
    }

    /// Decode, calibrate and map one telemetry line, replacing the latest pose on success.
    ///
    /// On any error the latest pose is left untouched.
    pub fn process_line(&mut self, line: &str) -> Result<(), FrameError> {
        let result = hand::decode(line)
            .map_err(FrameError::from)
            .and_then(|frame| self.apply_frame(&frame));

        if result.is_err() {
            self.num_rejected += 1;
        }

        result
    }

    /// Calibrate and map an already decoded frame.
    pub fn apply_frame(&mut self, frame: &TelemetryFrame) -> Result<(), FrameError> {
        let calibrated = TelemetryFrame {
            pots: self.calib.apply(frame.pots),
            ..*frame
        };

        let (pose, report) = self.kin_map.proc(&calibrated)?;

        trace!(
            "Adjusted YPR: Yaw={}, Pitch={}, Roll={}, Accel={:?}",
            report.adjusted_ypr_deg[0],
            report.adjusted_ypr_deg[1],
            report.adjusted_ypr_deg[2],
            frame.accel
        );
        if report.pot_out_of_range.iter().any(|b| *b) {
            trace!("Potentiometer readings out of range: {:?}", calibrated.pots);
        }

        self.latest = pose;
        self.num_frames += 1;

        Ok(())
    }

    /// Latest joint angles for every digit.
    pub fn latest_joint_angles(&self) -> &JointAngleSet {
        &self.latest.joints
    }

    /// Latest wrist pose.
    pub fn latest_wrist_pose(&self) -> &WristPose {
        &self.latest.wrist
    }

    pub fn latest_pose(&self) -> &HandPose {
        &self.latest
    }

    /// Report a contact on a digit's joint at the given angle and send the resulting command.
    ///
    /// The command is returned even if the link is closed or the write failed, write failures are
    /// logged and do not affect the session.
    pub fn report_contact(
        &mut self,
        digit_index: usize,
        joint_index: usize,
        angle_at_contact_deg: f64,
    ) -> Result<CommandFrame, ContactError> {
        let event = self.contact.event(digit_index, joint_index)?;
        self.send_contact(event, angle_at_contact_deg)
    }

    /// Report a contact on a joint handle, using that joint's latest mapped angle.
    ///
    /// If the handle appears in more than one digit only the first match is reported. Fails with
    /// [`ContactError::NoPose`] until a frame has been mapped, and nothing is sent.
    pub fn report_contact_handle(
        &mut self,
        handle: &JointHandle,
    ) -> Result<CommandFrame, ContactError> {
        let event = self.contact.event_for_handle(handle)?;

        let angle_deg = self
            .latest
            .joints
            .digit(event.digit)
            .get(event.joint_index)
            .copied()
            .ok_or(ContactError::NoPose {
                digit: event.digit,
                joint_index: event.joint_index,
            })?;

        self.send_contact(event, angle_deg)
    }

    fn send_contact(
        &mut self,
        event: ContactEvent,
        angle_deg: f64,
    ) -> Result<CommandFrame, ContactError> {
        let cmd = contact::command_for(event, angle_deg)?;

        if let Err(e) = self.link.write_command_line(&hand::encode(&cmd)) {
            warn!("Failed to send command {}: {}", cmd, e);
        }

        Ok(cmd)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
