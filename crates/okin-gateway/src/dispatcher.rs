//! Entry point used by front ends to drive beds.
//!
//! Single commands resolve their session through the registry on every call,
//! so a disconnect followed by a new command always starts from a fresh
//! session. Repeating commands (`hold` and continuous movements) stay bound
//! to the session they started on and end when that session is evicted.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use okin_config::Config;
use okin_protocol::Action;
use tracing::debug;

use crate::address::DeviceAddress;
use crate::errors::{CommandFailure, GatewayError};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::movement::{Movement, Movements};
use crate::registry::{SessionRegistry, SessionStatus};
use crate::session::SessionTiming;
use crate::transport::{Connector, TransportError};

const DISPATCH_TARGET: &str = "okin_gateway::dispatcher";

/// Outcome of a completed [`Dispatcher::hold`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldReport {
    /// Times the held action was delivered.
    pub repetitions: u32,
    /// Whether a trailing `STOP` was sent after the hold.
    pub stopped: bool,
}

/// Routes actions to per-device sessions.
#[derive(Debug)]
pub struct Dispatcher {
    registry: SessionRegistry,
    movements: Movements,
}

impl Dispatcher {
    /// Builds a dispatcher that reports lifecycle events through `tracing`.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, timing: SessionTiming) -> Self {
        Self::with_reporter(connector, Arc::new(StructuredHealthReporter::new()), timing)
    }

    /// Builds a dispatcher with timing taken from configuration.
    #[must_use]
    pub fn from_config(connector: Arc<dyn Connector>, config: &Config) -> Self {
        Self::new(connector, SessionTiming::from_config(config))
    }

    /// Builds a dispatcher with a custom health reporter.
    #[must_use]
    pub fn with_reporter(
        connector: Arc<dyn Connector>,
        reporter: Arc<dyn HealthReporter>,
        timing: SessionTiming,
    ) -> Self {
        Self::with_registry(SessionRegistry::new(connector, reporter, timing))
    }

    /// Builds a dispatcher over an existing registry.
    #[must_use]
    pub fn with_registry(registry: SessionRegistry) -> Self {
        Self {
            registry,
            movements: Movements::default(),
        }
    }

    /// Registry backing this dispatcher.
    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Sends `action` to the device at `address`.
    ///
    /// Connects first when the device has no live link.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConnectFailed`] or
    /// [`GatewayError::CommandFailed`] from the session.
    pub fn perform(&self, address: &DeviceAddress, action: Action) -> Result<(), GatewayError> {
        self.registry.get_or_create(address).send(action)
    }

    /// Parses an address and an action name, then performs the action.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidAddress`] or
    /// [`GatewayError::UnknownAction`] before any session is touched, or the
    /// errors of [`Dispatcher::perform`].
    pub fn perform_named(&self, address: &str, action: &str) -> Result<(), GatewayError> {
        let device: DeviceAddress = address.parse()?;
        let parsed: Action = action.parse()?;
        self.perform(&device, parsed)
    }

    /// Cancels the device's movements, then closes and forgets its session.
    /// A no-op when absent.
    pub fn disconnect(&self, address: &DeviceAddress) {
        for movement in self.movements.take_for(address) {
            movement.stop();
        }
        if !self.registry.remove(address) {
            debug!(
                target: DISPATCH_TARGET,
                address = %address,
                "disconnect requested for unknown device"
            );
        }
    }

    /// State of every known session in address order.
    #[must_use]
    pub fn status(&self) -> Vec<SessionStatus> {
        self.registry.snapshot()
    }

    /// Emulates holding a remote button.
    ///
    /// Sends `action` once per hold interval until `duration` has elapsed.
    /// A movement action is followed by a single `STOP`; lights, massage and
    /// `STOP` itself are not. Every repetition is a separate command on the
    /// session that was current when the hold began.
    ///
    /// # Errors
    ///
    /// Returns the first failure. No further commands are sent after it,
    /// including the trailing `STOP`. Disconnecting the device mid-hold
    /// fails the next repetition with [`CommandFailure::SessionClosed`].
    pub fn hold(
        &self,
        address: &DeviceAddress,
        action: Action,
        duration: Duration,
    ) -> Result<HoldReport, GatewayError> {
        let session = self.registry.get_or_create(address);
        let interval = self.registry.timing().hold_interval;
        let started = Instant::now();
        let mut repetitions = 0_u32;

        loop {
            session.send(action)?;
            repetitions = repetitions.saturating_add(1);

            let elapsed = started.elapsed();
            if elapsed >= duration {
                break;
            }
            thread::sleep(interval.min(duration.saturating_sub(elapsed)));
        }

        let stopped = action.is_movement();
        if stopped {
            session.send(Action::Stop)?;
        }

        debug!(
            target: DISPATCH_TARGET,
            address = %address,
            action = %action,
            repetitions,
            "hold finished"
        );
        Ok(HoldReport {
            repetitions,
            stopped,
        })
    }

    /// Starts repeating `action` every hold interval until it is stopped.
    ///
    /// The first frame is sent before this returns; later frames are sent by
    /// a worker thread. Starting an action that is already repeating for the
    /// device restarts it. The movement ends on [`Dispatcher::stop_movement`],
    /// [`Dispatcher::stop_all_movements`], [`Dispatcher::disconnect`],
    /// [`Dispatcher::shutdown`], or the first failed repetition. It never
    /// reconnects a session that was disconnected.
    ///
    /// # Errors
    ///
    /// Returns the failure of the first frame, in which case nothing keeps
    /// running, or [`GatewayError::CommandFailed`] when the worker thread
    /// cannot be spawned.
    pub fn start_movement(
        &self,
        address: &DeviceAddress,
        action: Action,
    ) -> Result<(), GatewayError> {
        self.stop_movement(address, action);

        let session = self.registry.get_or_create(address);
        session.send(action)?;

        let interval = self.registry.timing().hold_interval;
        let movement = Movement::spawn(session, action, interval).map_err(|error| {
            GatewayError::command(
                address,
                action,
                CommandFailure::Transport(TransportError::with_source(
                    "failed to spawn movement worker",
                    error,
                )),
            )
        })?;
        if let Some(replaced) = self.movements.insert(address, action, movement) {
            replaced.stop();
        }

        debug!(
            target: DISPATCH_TARGET,
            address = %address,
            action = %action,
            "movement started"
        );
        Ok(())
    }

    /// Stops repeating `action` for `address` without sending `STOP`.
    ///
    /// Waits for a repetition already on the link. Returns whether a
    /// movement was registered.
    pub fn stop_movement(&self, address: &DeviceAddress, action: Action) -> bool {
        match self.movements.take(address, action) {
            Some(movement) => {
                movement.stop();
                true
            }
            None => false,
        }
    }

    /// Stops every movement for `address`, then sends `STOP`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Dispatcher::perform`] for the `STOP` frame.
    pub fn stop_all_movements(&self, address: &DeviceAddress) -> Result<(), GatewayError> {
        for movement in self.movements.take_for(address) {
            movement.stop();
        }
        self.perform(address, Action::Stop)
    }

    /// Actions currently repeating for `address`.
    #[must_use]
    pub fn active_movements(&self, address: &DeviceAddress) -> Vec<Action> {
        self.movements.running_for(address)
    }

    /// Cancels every movement and closes every session. Used on process
    /// shutdown.
    pub fn shutdown(&self) {
        for movement in self.movements.take_all() {
            movement.stop();
        }
        self.registry.close_all();
    }
}
