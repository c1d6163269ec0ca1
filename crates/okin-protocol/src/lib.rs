//! Wire codec for OKIN adjustable bed controllers.
//!
//! The controller accepts fixed-length frames and never replies with a
//! structured acknowledgement. This crate maps the closed [`Action`] set onto
//! those frames and validates outbound bytes against the known
//! [`FrameShape`]s. It performs no I/O.

mod action;
mod codec;
mod frame;

pub use action::{Action, UnknownActionError};
pub use codec::{action_for, decode, encode};
pub use frame::{
    CONTROL_HEADER, END_BYTE, Frame, FrameError, FrameShape, SECTION_MAIN_CONTROL, SPECIAL_BODY,
    START_BYTE, validate,
};
