//! # Hand Equipment Communications Module
//!
//! Line-delimited ASCII frames exchanged with the glove microcontroller over the serial link.
//!
//! Inbound telemetry frames carry eleven comma separated fields:
//!
//! ```text
//! p0,p1,p2,p3,p4,yaw,pitch,roll,ax,ay,az\n
//! ```
//!
//! where `p0..p4` are raw potentiometer readings (integers, nominally 0-1023), `yaw`, `pitch` and
//! `roll` are orientation readings in degrees and `ax`, `ay`, `az` are acceleration components.
//!
//! Outbound command frames carry a servo channel and an angle in whole degrees:
//!
//! ```text
//! servoChannel,angleDegrees\n
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Delimiter between fields of a frame.
pub const FIELD_DELIMITER: char = ',';

/// Terminator appended to every outbound line.
pub const LINE_TERMINATOR: &str = "\n";

/// Number of potentiometer channels, one per digit.
pub const NUM_POT_CHANNELS: usize = 5;

/// Number of fields in a telemetry frame.
pub const NUM_TELEM_FIELDS: usize = 11;

/// Index of the first floating point field (yaw).
const FIRST_FLOAT_FIELD: usize = NUM_POT_CHANNELS;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single decoded telemetry frame.
///
/// Values are raw, i.e. no calibration or orientation offsets have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Raw potentiometer readings in wire order.
    pub pots: [i32; NUM_POT_CHANNELS],

    /// Raw yaw reading.
    ///
    /// Units: degrees
    pub yaw_deg: f64,

    /// Raw pitch reading.
    ///
    /// Units: degrees
    pub pitch_deg: f64,

    /// Raw roll reading.
    ///
    /// Units: degrees
    pub roll_deg: f64,

    /// Raw acceleration components `[x, y, z]`.
    pub accel: [f64; 3],
}

/// A command sent to one of the glove's feedback servos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandFrame {
    /// Servo channel, 1 to 5.
    pub servo_channel: u8,

    /// Demanded servo angle.
    ///
    /// Units: degrees
    pub angle_deg: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Numeric type expected in a telemetry field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
}

/// Errors which can occur while decoding a telemetry frame.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Expected {} fields but found {0}", NUM_TELEM_FIELDS)]
    FieldCountMismatch(usize),

    #[error("Field {field} ({kind}) could not be parsed from {token:?}")]
    NumericParseError {
        field: usize,
        kind: FieldKind,
        token: String,
    },
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode one telemetry line into a [`TelemetryFrame`].
///
/// The line may or may not include its terminator. Tokens are trimmed of surrounding whitespace
/// before parsing, so a `\r\n` terminated line decodes the same as a `\n` terminated one.
///
/// Nothing is returned unless every field parsed.
pub fn decode(line: &str) -> Result<TelemetryFrame, DecodeError> {
    let line = line.trim_end_matches(|c| c == '\n' || c == '\r');

    let tokens: Vec<&str> = line.split(FIELD_DELIMITER).collect();

    if tokens.len() != NUM_TELEM_FIELDS {
        return Err(DecodeError::FieldCountMismatch(tokens.len()));
    }

    let mut pots = [0i32; NUM_POT_CHANNELS];
    for (i, pot) in pots.iter_mut().enumerate() {
        *pot = parse_field(tokens[i], i, FieldKind::Integer)?;
    }

    let mut floats = [0f64; NUM_TELEM_FIELDS - FIRST_FLOAT_FIELD];
    for (i, val) in floats.iter_mut().enumerate() {
        let field = FIRST_FLOAT_FIELD + i;
        *val = parse_field(tokens[field], field, FieldKind::Float)?;
    }

    Ok(TelemetryFrame {
        pots,
        yaw_deg: floats[0],
        pitch_deg: floats[1],
        roll_deg: floats[2],
        accel: [floats[3], floats[4], floats[5]],
    })
}

/// Encode a [`CommandFrame`] into a line ready to be written to the link, terminator included.
pub fn encode(cmd: &CommandFrame) -> String {
    format!("{}{}", cmd, LINE_TERMINATOR)
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn parse_field<T>(token: &str, field: usize, kind: FieldKind) -> Result<T, DecodeError>
where
    T: std::str::FromStr,
{
    token
        .trim()
        .parse::<T>()
        .map_err(|_| DecodeError::NumericParseError {
            field,
            kind,
            token: token.to_string(),
        })
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.servo_channel, FIELD_DELIMITER, self.angle_deg)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Float => write!(f, "float"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_valid() {
        let frame = decode("100,200,300,400,500,10.0,20.0,30.0,1.0,2.0,3.0").unwrap();

        assert_eq!(frame.pots, [100, 200, 300, 400, 500]);
        assert_eq!(frame.yaw_deg, 10.0);
        assert_eq!(frame.pitch_deg, 20.0);
        assert_eq!(frame.roll_deg, 30.0);
        assert_eq!(frame.accel, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_decode_generated_lines() {
        // Small linear congruential generator so the values are varied but repeatable
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            seed >> 11
        };

        for _ in 0..1000 {
            let mut pots = [0i32; NUM_POT_CHANNELS];
            for pot in pots.iter_mut() {
                *pot = (next() % 1024) as i32;
            }

            // Spread the floats over several magnitudes, including sub-degree and negative values
            let mut floats = [0f64; NUM_TELEM_FIELDS - FIRST_FLOAT_FIELD];
            for val in floats.iter_mut() {
                let unit = next() as f64 / (1u64 << 53) as f64;
                let scale = [0.001, 1.0, 180.0, 1e6][(next() % 4) as usize];
                *val = (unit * 2.0 - 1.0) * scale;
            }

            let tokens: Vec<String> = pots
                .iter()
                .map(|p| p.to_string())
                .chain(floats.iter().map(|f| f.to_string()))
                .collect();
            let line = format!("{}{}", tokens.join(","), LINE_TERMINATOR);

            let frame = decode(&line).unwrap();

            assert_eq!(frame.pots, pots, "line {:?}", line);
            assert_eq!(frame.yaw_deg, floats[0], "line {:?}", line);
            assert_eq!(frame.pitch_deg, floats[1], "line {:?}", line);
            assert_eq!(frame.roll_deg, floats[2], "line {:?}", line);
            assert_eq!(frame.accel, [floats[3], floats[4], floats[5]], "line {:?}", line);
        }
    }

    #[test]
    fn test_decode_with_terminators() {
        let lf = decode("0,1023,512,7,9,-1.5,2.25,359.0,0.1,-0.2,9.81\n").unwrap();
        let crlf = decode("0,1023,512,7,9,-1.5,2.25,359.0,0.1,-0.2,9.81\r\n").unwrap();

        assert_eq!(lf, crlf);
        assert_eq!(lf.pots, [0, 1023, 512, 7, 9]);
        assert_eq!(lf.accel, [0.1, -0.2, 9.81]);
    }

    #[test]
    fn test_decode_integer_floats() {
        // Floats without a fractional part are valid
        let frame = decode("1,2,3,4,5,10,20,30,1,2,3").unwrap();
        assert_eq!(frame.yaw_deg, 10.0);
        assert_eq!(frame.accel, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_decode_field_count() {
        assert_eq!(
            decode("100,200,300,400,500,10.0,20.0,30.0,1.0,2.0"),
            Err(DecodeError::FieldCountMismatch(10))
        );
        assert_eq!(
            decode("100,200,300,400,500,10.0,20.0,30.0,1.0,2.0,3.0,4.0"),
            Err(DecodeError::FieldCountMismatch(12))
        );
        assert_eq!(decode(""), Err(DecodeError::FieldCountMismatch(1)));
    }

    #[test]
    fn test_decode_non_numeric() {
        match decode("abc,200,300,400,500,10,20,30,1,2,3") {
            Err(DecodeError::NumericParseError { field, kind, token }) => {
                assert_eq!(field, 0);
                assert_eq!(kind, FieldKind::Integer);
                assert_eq!(token, "abc");
            }
            r => panic!("Unexpected decode result {:?}", r),
        }

        match decode("1,2,3,4,5,10,20,30,1,2,z") {
            Err(DecodeError::NumericParseError { field, kind, .. }) => {
                assert_eq!(field, 10);
                assert_eq!(kind, FieldKind::Float);
            }
            r => panic!("Unexpected decode result {:?}", r),
        }
    }

    #[test]
    fn test_decode_float_in_integer_field() {
        assert!(matches!(
            decode("1.5,2,3,4,5,10,20,30,1,2,3"),
            Err(DecodeError::NumericParseError { field: 0, .. })
        ));
    }

    #[test]
    fn test_encode() {
        let cmd = CommandFrame {
            servo_channel: 3,
            angle_deg: 46,
        };
        assert_eq!(encode(&cmd), "3,46\n");

        let cmd = CommandFrame {
            servo_channel: 1,
            angle_deg: -12,
        };
        assert_eq!(encode(&cmd), "1,-12\n");
    }
}
