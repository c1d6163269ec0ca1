//! Health reporter that keeps events for assertions.

use std::sync::{Arc, Mutex};

use okin_protocol::{Action, Frame};

use crate::address::DeviceAddress;
use crate::errors::{ConnectFailure, ErrorKind, GatewayError};
use crate::health::HealthReporter;

/// Lifecycle event observed by the recording reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// A session was created.
    SessionCreated(DeviceAddress),
    /// A connection attempt started.
    ConnectStarting(DeviceAddress),
    /// A connection attempt succeeded.
    ConnectSucceeded(DeviceAddress),
    /// A connection attempt failed.
    ConnectFailed(DeviceAddress),
    /// A command was delivered.
    CommandSent(DeviceAddress, Action),
    /// A command failed with the given classification.
    CommandFailed(ErrorKind),
    /// The transport reported a dropped link.
    LinkLost(DeviceAddress),
    /// A session was closed.
    SessionClosed(DeviceAddress),
}

/// Reporter that records each event in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingHealthReporter {
    events: Arc<Mutex<Vec<HealthEvent>>>,
}

impl RecordingHealthReporter {
    /// Ordered list of recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn session_created(&self, address: &DeviceAddress) {
        self.record(HealthEvent::SessionCreated(address.clone()));
    }

    fn connect_starting(&self, address: &DeviceAddress) {
        self.record(HealthEvent::ConnectStarting(address.clone()));
    }

    fn connect_succeeded(&self, address: &DeviceAddress) {
        self.record(HealthEvent::ConnectSucceeded(address.clone()));
    }

    fn connect_failed(&self, address: &DeviceAddress, _failure: &ConnectFailure) {
        self.record(HealthEvent::ConnectFailed(address.clone()));
    }

    fn command_sent(&self, address: &DeviceAddress, action: Action, _frame: &Frame) {
        self.record(HealthEvent::CommandSent(address.clone(), action));
    }

    fn command_failed(&self, error: &GatewayError) {
        self.record(HealthEvent::CommandFailed(error.kind()));
    }

    fn link_lost(&self, address: &DeviceAddress) {
        self.record(HealthEvent::LinkLost(address.clone()));
    }

    fn session_closed(&self, address: &DeviceAddress) {
        self.record(HealthEvent::SessionClosed(address.clone()));
    }
}
