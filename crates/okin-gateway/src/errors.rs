//! Error types surfaced by the gateway.

use std::fmt;
use std::time::Duration;

use okin_protocol::{Action, Frame, UnknownActionError};
use thiserror::Error;

use crate::address::{AddressParseError, DeviceAddress};
use crate::transport::TransportError;

/// Why a session could not establish a link.
#[derive(Debug, Error)]
pub enum ConnectFailure {
    /// The transport refused or failed the attempt.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// The attempt did not finish within the configured bound.
    #[error("connection attempt exceeded {timeout:?}")]
    TimedOut {
        /// Bound that was exceeded.
        timeout: Duration,
    },

    /// The session was closed before it could reconnect.
    #[error("session is closed")]
    SessionClosed,
}

/// Why a command could not be delivered.
#[derive(Debug, Error)]
pub enum CommandFailure {
    /// The write failed; the link has been discarded.
    #[error("write failed: {0}")]
    Transport(#[source] TransportError),

    /// The session was closed while the command was queued.
    #[error("session is closed")]
    SessionClosed,

    /// The encoder produced bytes that fail structural validation.
    #[error("encoded frame failed validation: {frame}")]
    InvalidFrame {
        /// Offending frame.
        frame: Frame,
    },
}

/// Stable, copyable classification of [`GatewayError`] for front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The device could not be reached.
    ConnectFailed,
    /// The command was not delivered.
    CommandFailed,
    /// The action name is not part of the supported set.
    UnknownAction,
    /// The device address could not be parsed.
    InvalidAddress,
}

impl ErrorKind {
    /// Returns the snake-case label used in structured logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConnectFailed => "connect_failed",
            Self::CommandFailed => "command_failed",
            Self::UnknownAction => "unknown_action",
            Self::InvalidAddress => "invalid_address",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Errors returned by [`crate::Dispatcher`] and [`crate::Session`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A link to the device could not be established.
    #[error("failed to connect to {address}: {reason}")]
    ConnectFailed {
        /// Device that was unreachable.
        address: DeviceAddress,
        /// Underlying cause.
        #[source]
        reason: ConnectFailure,
    },

    /// A command was not delivered.
    #[error("failed to send {action} to {address}: {reason}")]
    CommandFailed {
        /// Device the command was addressed to.
        address: DeviceAddress,
        /// Action that was requested.
        action: Action,
        /// Underlying cause.
        #[source]
        reason: CommandFailure,
    },

    /// The requested action name is not supported.
    #[error(transparent)]
    UnknownAction(#[from] UnknownActionError),

    /// The requested device address is malformed.
    #[error(transparent)]
    InvalidAddress(#[from] AddressParseError),
}

impl GatewayError {
    pub(crate) fn connect(address: &DeviceAddress, reason: ConnectFailure) -> Self {
        Self::ConnectFailed {
            address: address.clone(),
            reason,
        }
    }

    pub(crate) fn command(
        address: &DeviceAddress,
        action: Action,
        reason: CommandFailure,
    ) -> Self {
        Self::CommandFailed {
            address: address.clone(),
            action,
            reason,
        }
    }

    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectFailed { .. } => ErrorKind::ConnectFailed,
            Self::CommandFailed { .. } => ErrorKind::CommandFailed,
            Self::UnknownAction(_) => ErrorKind::UnknownAction,
            Self::InvalidAddress(_) => ErrorKind::InvalidAddress,
        }
    }

    /// Device the failure concerns, when one was resolved.
    #[must_use]
    pub const fn address(&self) -> Option<&DeviceAddress> {
        match self {
            Self::ConnectFailed { address, .. } | Self::CommandFailed { address, .. } => {
                Some(address)
            }
            Self::UnknownAction(_) | Self::InvalidAddress(_) => None,
        }
    }
}
