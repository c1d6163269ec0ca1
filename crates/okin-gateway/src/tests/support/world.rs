//! BDD test world wrapping a dispatcher and its fake transport.

use std::sync::Arc;

use okin_protocol::Action;

use crate::address::DeviceAddress;
use crate::errors::GatewayError;
use crate::registry::SessionStatus;
use crate::session::{Session, SessionState};

use super::{BED, Harness, address, fast_timing};

/// Shared state exercised by BDD step implementations.
pub struct TestWorld {
    /// Dispatcher, transport handle, and reporter under test.
    pub harness: Harness,
    /// Device the scenario talks to.
    pub address: DeviceAddress,
    /// Session captured before an eviction, for stale-handle checks.
    pub retained: Option<Arc<Session>>,
    /// Result of the most recent command.
    pub last_result: Option<Result<(), GatewayError>>,
}

impl TestWorld {
    /// Builds a world around a fresh harness.
    pub fn new() -> Self {
        Self {
            harness: Harness::new(fast_timing()),
            address: address(BED),
            retained: None,
            last_result: None,
        }
    }

    /// Performs `action` on the scenario device and records the outcome.
    pub fn perform(&mut self, action: Action) {
        let result = self.harness.dispatcher.perform(&self.address, action);
        self.last_result = Some(result);
    }

    /// Performs an action by name and records the outcome.
    pub fn perform_named(&mut self, action: &str) {
        let result = self
            .harness
            .dispatcher
            .perform_named(self.address.as_str(), action);
        self.last_result = Some(result);
    }

    /// Starts a continuous movement and records the outcome.
    pub fn start_movement(&mut self, action: Action) {
        let result = self.harness.dispatcher.start_movement(&self.address, action);
        self.last_result = Some(result);
    }

    /// Sends `action` through the retained session handle.
    pub fn send_on_retained(&mut self, action: Action) {
        let session = self
            .retained
            .clone()
            .expect("a session should have been retained");
        self.last_result = Some(session.send(action));
    }

    /// Takes the most recent result, panicking when none was recorded.
    pub fn take_result(&mut self) -> Result<(), GatewayError> {
        self.last_result
            .take()
            .expect("a command should have been issued")
    }

    /// State reported for the scenario device by `status()`.
    pub fn reported_state(&self) -> Option<SessionState> {
        self.harness
            .dispatcher
            .status()
            .into_iter()
            .find(|SessionStatus { address, .. }| *address == self.address)
            .map(|status| status.state)
    }
}
