//! Byte-level frame shapes written to the bed controller.
//!
//! Two shapes have been observed on the wire:
//!
//! ```text
//! control: 5A 01 03 10 30 <opcode> A5
//! special: 5A B0 00 A5
//! ```
//!
//! The controller never acknowledges a frame, so these types only describe
//! outbound traffic.

use std::fmt;

use thiserror::Error;

/// First byte of every frame.
pub const START_BYTE: u8 = 0x5A;

/// Last byte of every frame.
pub const END_BYTE: u8 = 0xA5;

/// Section byte shared by all main-control commands.
pub const SECTION_MAIN_CONTROL: u8 = 0x30;

/// Bytes between the start byte and the opcode of a control frame.
pub const CONTROL_HEADER: [u8; 4] = [0x01, 0x03, 0x10, SECTION_MAIN_CONTROL];

/// Bytes between the start and end bytes of the special frame.
pub const SPECIAL_BODY: [u8; 2] = [0xB0, 0x00];

/// The distinct frame layouts accepted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameShape {
    /// Seven-byte section-0x30 command carrying an opcode.
    Control,
    /// Four-byte outlier frame without an opcode.
    Special,
}

impl FrameShape {
    /// Number of bytes in a frame of this shape.
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            Self::Control => 7,
            Self::Special => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Repr {
    Control([u8; 7]),
    Special([u8; 4]),
}

/// A complete command frame ready to be written to a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    repr: Repr,
}

impl Frame {
    /// Builds a control frame for the given opcode.
    #[must_use]
    pub const fn control(opcode: u8) -> Self {
        let [b1, b2, b3, section] = CONTROL_HEADER;
        Self {
            repr: Repr::Control([START_BYTE, b1, b2, b3, section, opcode, END_BYTE]),
        }
    }

    /// Builds the four-byte special frame.
    #[must_use]
    pub const fn special() -> Self {
        let [b1, b2] = SPECIAL_BODY;
        Self {
            repr: Repr::Special([START_BYTE, b1, b2, END_BYTE]),
        }
    }

    /// Parses raw bytes into a frame, checking them against the known shapes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Malformed`] when the bytes match neither shape.
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        match bytes {
            [START_BYTE, 0x01, 0x03, 0x10, SECTION_MAIN_CONTROL, opcode, END_BYTE] => {
                Ok(Self::control(*opcode))
            }
            [START_BYTE, 0xB0, 0x00, END_BYTE] => Ok(Self::special()),
            _ => Err(FrameError::Malformed { len: bytes.len() }),
        }
    }

    /// Shape of this frame.
    #[must_use]
    pub const fn shape(&self) -> FrameShape {
        match self.repr {
            Repr::Control(_) => FrameShape::Control,
            Repr::Special(_) => FrameShape::Special,
        }
    }

    /// Opcode carried by a control frame.
    #[must_use]
    pub const fn opcode(&self) -> Option<u8> {
        match self.repr {
            Repr::Control([_, _, _, _, _, opcode, _]) => Some(opcode),
            Repr::Special(_) => None,
        }
    }

    /// Wire bytes of the frame.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8] {
        match &self.repr {
            Repr::Control(bytes) => bytes,
            Repr::Special(bytes) => bytes,
        }
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for byte in self.as_bytes() {
            if !first {
                formatter.write_str(" ")?;
            }
            write!(formatter, "{byte:02x}")?;
            first = false;
        }
        Ok(())
    }
}

/// Checks that `bytes` form a well-shaped frame.
///
/// Used to self-check outbound frames before they reach a link; device
/// traffic is never interpreted with it.
#[must_use]
pub fn validate(bytes: &[u8]) -> bool {
    Frame::parse(bytes).is_ok()
}

/// Errors raised when interpreting raw frame bytes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The bytes do not match any known frame shape.
    #[error("malformed frame of {len} bytes")]
    Malformed {
        /// Length of the rejected input.
        len: usize,
    },
    /// The frame is well formed but its opcode is not in the command table.
    #[error("opcode {opcode:#04x} is not mapped to an action")]
    UnmappedOpcode {
        /// Opcode carried by the frame.
        opcode: u8,
    },
}
