//! Capability interface over the wireless transport.
//!
//! The gateway never discovers devices or speaks to a radio stack directly.
//! Concrete transports implement [`Connector`] and hand back a [`Link`] per
//! connection; test doubles implement the same traits to simulate failures.

use std::error::Error;
use std::fmt;
use std::sync::mpsc::Sender;

use thiserror::Error;

use crate::address::DeviceAddress;

/// Asynchronous notifications pushed by a transport for one live link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link dropped, for example because another controller took over.
    Disconnected,
    /// The device sent a notification payload.
    Notification(Vec<u8>),
}

/// Channel a transport uses to report [`LinkEvent`]s to the owning session.
///
/// Dropping the sender is treated the same as [`LinkEvent::Disconnected`].
pub type LinkEventSender = Sender<LinkEvent>;

/// Errors reported by transport implementations.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl TransportError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-friendly description without the optional source.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// One established connection to a device.
///
/// A link is owned by exactly one session and only touched while that
/// session holds its command lock.
pub trait Link: Send {
    /// Writes a complete frame. Returning `Ok` is the only delivery signal.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Releases the connection.
    fn disconnect(&mut self) -> Result<(), TransportError>;
}

/// Factory that establishes links to addressed devices.
pub trait Connector: Send + Sync {
    /// Connects to `address`.
    ///
    /// Implementations keep `events` alive for as long as the returned link
    /// is usable and push [`LinkEvent::Disconnected`] when it drops.
    fn connect(
        &self,
        address: &DeviceAddress,
        events: LinkEventSender,
    ) -> Result<Box<dyn Link>, TransportError>;
}

impl fmt::Debug for dyn Link {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("Link")
    }
}

impl fmt::Debug for dyn Connector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("Connector")
    }
}
