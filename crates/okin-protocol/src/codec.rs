//! Static mapping between actions and frames.

use strum::IntoEnumIterator;

use crate::action::Action;
use crate::frame::{Frame, FrameError};

/// Encodes an action into the frame the controller expects.
///
/// The mapping is a fixed table taken from captured remote traffic; the same
/// action always produces byte-identical output.
#[must_use]
pub const fn encode(action: Action) -> Frame {
    match action {
        Action::HeadUp => Frame::control(0x00),
        Action::HeadDown => Frame::control(0x01),
        Action::FootUp => Frame::control(0x02),
        Action::FootDown => Frame::control(0x03),
        Action::LumbarUp => Frame::control(0x04),
        Action::LumbarDown => Frame::control(0x07),
        Action::Stop => Frame::control(0x0F),
        Action::Flat => Frame::control(0x10),
        Action::Lounge => Frame::control(0x11),
        Action::ZeroGravity => Frame::control(0x13),
        Action::AntiSnore => Frame::control(0x16),
        Action::MassageOn => Frame::control(0x58),
        Action::Unverified6F => Frame::control(0x6F),
        Action::LightOn => Frame::control(0x73),
        Action::LightOff => Frame::control(0x74),
        Action::SpecialB0 => Frame::special(),
    }
}

/// Resolves the action carried by a well-formed frame.
#[must_use]
pub fn action_for(frame: Frame) -> Option<Action> {
    Action::iter().find(|action| encode(*action) == frame)
}

/// Parses raw bytes and resolves the action they encode.
///
/// # Errors
///
/// Returns [`FrameError::Malformed`] for bytes outside the known shapes and
/// [`FrameError::UnmappedOpcode`] for control frames whose opcode is not in
/// the table.
pub fn decode(bytes: &[u8]) -> Result<Action, FrameError> {
    let frame = Frame::parse(bytes)?;
    // The special frame always maps, so only control opcodes can miss.
    action_for(frame).ok_or(FrameError::UnmappedOpcode {
        opcode: frame.opcode().unwrap_or_default(),
    })
}
