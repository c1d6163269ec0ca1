//! Structured health reporting for session lifecycle events.

use std::sync::Arc;

use okin_protocol::{Action, Frame};

use crate::address::DeviceAddress;
use crate::errors::{ConnectFailure, GatewayError};

/// Observer trait used to surface session events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked when the registry creates a session for a new address.
    fn session_created(&self, address: &DeviceAddress);

    /// Invoked before a connection attempt begins.
    fn connect_starting(&self, address: &DeviceAddress);

    /// Invoked after a link is established.
    fn connect_succeeded(&self, address: &DeviceAddress);

    /// Invoked when a connection attempt fails or times out.
    fn connect_failed(&self, address: &DeviceAddress, failure: &ConnectFailure);

    /// Invoked after a frame is written successfully.
    fn command_sent(&self, address: &DeviceAddress, action: Action, frame: &Frame);

    /// Invoked when a command cannot be delivered.
    fn command_failed(&self, error: &GatewayError);

    /// Invoked when the transport reports that a live link dropped.
    fn link_lost(&self, address: &DeviceAddress);

    /// Invoked once when a session is closed.
    fn session_closed(&self, address: &DeviceAddress);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn session_created(&self, address: &DeviceAddress) {
        (**self).session_created(address);
    }

    fn connect_starting(&self, address: &DeviceAddress) {
        (**self).connect_starting(address);
    }

    fn connect_succeeded(&self, address: &DeviceAddress) {
        (**self).connect_succeeded(address);
    }

    fn connect_failed(&self, address: &DeviceAddress, failure: &ConnectFailure) {
        (**self).connect_failed(address, failure);
    }

    fn command_sent(&self, address: &DeviceAddress, action: Action, frame: &Frame) {
        (**self).command_sent(address, action, frame);
    }

    fn command_failed(&self, error: &GatewayError) {
        (**self).command_failed(error);
    }

    fn link_lost(&self, address: &DeviceAddress) {
        (**self).link_lost(address);
    }

    fn session_closed(&self, address: &DeviceAddress) {
        (**self).session_closed(address);
    }
}

/// Default reporter that records session events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn session_created(&self, address: &DeviceAddress) {
        tracing::debug!(
            target: "okin_gateway::health",
            event = "session_created",
            address = %address,
            "session created"
        );
    }

    fn connect_starting(&self, address: &DeviceAddress) {
        tracing::info!(
            target: "okin_gateway::health",
            event = "connect_starting",
            address = %address,
            "connecting to device"
        );
    }

    fn connect_succeeded(&self, address: &DeviceAddress) {
        tracing::info!(
            target: "okin_gateway::health",
            event = "connect_succeeded",
            address = %address,
            "device connected"
        );
    }

    fn connect_failed(&self, address: &DeviceAddress, failure: &ConnectFailure) {
        tracing::error!(
            target: "okin_gateway::health",
            event = "connect_failed",
            address = %address,
            error = %failure,
            "device connection failed"
        );
    }

    fn command_sent(&self, address: &DeviceAddress, action: Action, frame: &Frame) {
        tracing::info!(
            target: "okin_gateway::health",
            event = "command_sent",
            address = %address,
            action = %action,
            frame = %frame,
            "command delivered"
        );
    }

    fn command_failed(&self, error: &GatewayError) {
        tracing::error!(
            target: "okin_gateway::health",
            event = "command_failed",
            kind = %error.kind(),
            error = %error,
            "command failed"
        );
    }

    fn link_lost(&self, address: &DeviceAddress) {
        tracing::warn!(
            target: "okin_gateway::health",
            event = "link_lost",
            address = %address,
            "device link dropped"
        );
    }

    fn session_closed(&self, address: &DeviceAddress) {
        tracing::info!(
            target: "okin_gateway::health",
            event = "session_closed",
            address = %address,
            "session closed"
        );
    }
}
