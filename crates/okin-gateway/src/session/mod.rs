//! Per-device connection session.
//!
//! A [`Session`] owns at most one live [`Link`] and serialises every command
//! sent over it. Two locks are involved and are always taken in the same
//! order:
//!
//! 1. the command lock, which owns the link and is held for the full
//!    duration of a command including the post-write interval;
//! 2. the status lock, which guards the observable state, the event channel
//!    of the current link, and the last-activity timestamp.
//!
//! [`Session::state`] only takes the status lock, so status queries never
//! wait behind an in-flight command.

mod connect;
mod state;

use std::fmt;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use okin_protocol::{Action, encode, validate};
use tracing::{debug, warn};

pub use state::{SessionState, SessionTiming};

use self::connect::{Established, connect_within};
use crate::address::DeviceAddress;
use crate::errors::{CommandFailure, ConnectFailure, GatewayError};
use crate::health::HealthReporter;
use crate::transport::{Connector, Link, LinkEvent, TransportError};

/// Log target for session operations.
pub(crate) const SESSION_TARGET: &str = "okin_gateway::session";

struct Status {
    state: SessionState,
    events: Option<Receiver<LinkEvent>>,
    last_activity: Option<Instant>,
}

enum ReadyError {
    Connect(ConnectFailure),
    Closed,
}

/// Connection state and command serialisation for one device.
pub struct Session {
    address: DeviceAddress,
    connector: Arc<dyn Connector>,
    reporter: Arc<dyn HealthReporter>,
    timing: SessionTiming,
    link: Mutex<Option<Box<dyn Link>>>,
    status: Mutex<Status>,
}

impl Session {
    pub(crate) fn new(
        address: DeviceAddress,
        connector: Arc<dyn Connector>,
        reporter: Arc<dyn HealthReporter>,
        timing: SessionTiming,
    ) -> Self {
        Self {
            address,
            connector,
            reporter,
            timing,
            link: Mutex::new(None),
            status: Mutex::new(Status {
                state: SessionState::Disconnected,
                events: None,
                last_activity: None,
            }),
        }
    }

    /// Device served by this session.
    #[must_use]
    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// Current lifecycle state, after applying any pending link events.
    #[must_use]
    pub fn state(&self) -> SessionState {
        let mut status = self.lock_status();
        let lost = self.drain_events(&mut status);
        let state = status.state;
        drop(status);
        self.report_link_lost(lost);
        state
    }

    /// Time of the last successful connect, write, or device notification.
    #[must_use]
    pub fn last_activity(&self) -> Option<Instant> {
        self.lock_status().last_activity
    }

    /// Establishes a link when none is live.
    ///
    /// Waits for any in-flight command first. A no-op when the session is
    /// already [`SessionState::Ready`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConnectFailed`] when the transport fails, the
    /// attempt exceeds the connect timeout, or the session has been closed.
    pub fn ensure_ready(&self) -> Result<(), GatewayError> {
        let mut link = self.lock_link();
        self.ensure_ready_locked(&mut link).map_err(|error| {
            let reason = match error {
                ReadyError::Connect(reason) => reason,
                ReadyError::Closed => ConnectFailure::SessionClosed,
            };
            GatewayError::connect(&self.address, reason)
        })
    }

    /// Delivers one command.
    ///
    /// Holds the command lock across connect, write, and the configured
    /// command interval, so concurrent callers are served one at a time and
    /// frames never interleave on the link. Failed writes are not retried.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConnectFailed`] when no link could be
    /// established and [`GatewayError::CommandFailed`] when the session is
    /// closed or the write fails. A failed write leaves the session
    /// [`SessionState::Disconnected`].
    pub fn send(&self, action: Action) -> Result<(), GatewayError> {
        let mut link = self.lock_link();
        let result = self.send_locked(&mut link, action);
        if let Err(error @ GatewayError::CommandFailed { .. }) = &result {
            self.reporter.command_failed(error);
        }
        result
    }

    /// Releases the link and rejects all later commands.
    ///
    /// Waits for any in-flight command to finish. Calling this more than
    /// once has no further effect.
    pub fn close(&self) {
        let mut link = self.lock_link();
        {
            let mut status = self.lock_status();
            if status.state == SessionState::Closed {
                return;
            }
            status.state = SessionState::Closed;
            status.events = None;
        }
        if let Some(active) = link.take() {
            self.release(active);
        }
        self.reporter.session_closed(&self.address);
    }

    fn send_locked(
        &self,
        link: &mut Option<Box<dyn Link>>,
        action: Action,
    ) -> Result<(), GatewayError> {
        match self.ensure_ready_locked(link) {
            Ok(()) => {}
            Err(ReadyError::Connect(reason)) => {
                return Err(GatewayError::connect(&self.address, reason));
            }
            Err(ReadyError::Closed) => {
                return Err(self.command_error(action, CommandFailure::SessionClosed));
            }
        }

        let frame = encode(action);
        if !validate(frame.as_bytes()) {
            return Err(self.command_error(action, CommandFailure::InvalidFrame { frame }));
        }

        let Some(active) = link.as_mut() else {
            return Err(self.command_error(
                action,
                CommandFailure::Transport(TransportError::new("no link after connect")),
            ));
        };

        self.lock_status().state = SessionState::Sending;
        debug!(
            target: SESSION_TARGET,
            address = %self.address,
            action = %action,
            frame = %frame,
            "writing frame"
        );

        if let Err(error) = active.write(frame.as_bytes()) {
            if let Some(broken) = link.take() {
                self.release(broken);
            }
            let mut status = self.lock_status();
            status.state = SessionState::Disconnected;
            status.events = None;
            drop(status);
            return Err(self.command_error(action, CommandFailure::Transport(error)));
        }

        self.lock_status().last_activity = Some(Instant::now());
        self.reporter.command_sent(&self.address, action, &frame);

        thread::sleep(self.timing.command_interval);

        let mut status = self.lock_status();
        let lost = self.drain_events(&mut status);
        if status.state == SessionState::Sending {
            status.state = SessionState::Ready;
        }
        drop(status);
        self.report_link_lost(lost);
        Ok(())
    }

    fn ensure_ready_locked(&self, link: &mut Option<Box<dyn Link>>) -> Result<(), ReadyError> {
        let mut status = self.lock_status();
        let lost = self.drain_events(&mut status);
        let settled = match status.state {
            SessionState::Closed => Some(Err(ReadyError::Closed)),
            SessionState::Ready if link.is_some() => Some(Ok(())),
            _ => {
                status.state = SessionState::Connecting;
                status.events = None;
                None
            }
        };
        drop(status);
        self.report_link_lost(lost);
        if let Some(outcome) = settled {
            return outcome;
        }

        if let Some(stale) = link.take() {
            self.release(stale);
        }

        self.reporter.connect_starting(&self.address);
        match connect_within(&self.connector, &self.address, self.timing.connect_timeout) {
            Ok(Established {
                link: fresh,
                events,
            }) => {
                *link = Some(fresh);
                let mut status = self.lock_status();
                status.state = SessionState::Ready;
                status.events = Some(events);
                status.last_activity = Some(Instant::now());
                drop(status);
                self.reporter.connect_succeeded(&self.address);
                Ok(())
            }
            Err(failure) => {
                self.lock_status().state = SessionState::Disconnected;
                self.reporter.connect_failed(&self.address, &failure);
                Err(ReadyError::Connect(failure))
            }
        }
    }

    /// Applies queued link events. Link loss only affects connected states.
    ///
    /// Returns whether a connected link was found lost. The caller reports it
    /// once the status lock is released.
    fn drain_events(&self, status: &mut Status) -> bool {
        let Some(events) = status.events.as_ref() else {
            return false;
        };

        let mut lost = false;
        loop {
            match events.try_recv() {
                Ok(LinkEvent::Notification(payload)) => {
                    debug!(
                        target: SESSION_TARGET,
                        address = %self.address,
                        bytes = payload.len(),
                        "device notification"
                    );
                    status.last_activity = Some(Instant::now());
                }
                Ok(LinkEvent::Disconnected) | Err(TryRecvError::Disconnected) => {
                    lost = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        if !lost {
            return false;
        }
        status.events = None;
        if status.state.is_connected() {
            status.state = SessionState::Disconnected;
            return true;
        }
        false
    }

    fn report_link_lost(&self, lost: bool) {
        if lost {
            self.reporter.link_lost(&self.address);
        }
    }

    fn release(&self, mut link: Box<dyn Link>) {
        if let Err(error) = link.disconnect() {
            warn!(
                target: SESSION_TARGET,
                address = %self.address,
                error = %error,
                "link did not disconnect cleanly"
            );
        }
    }

    fn command_error(&self, action: Action, reason: CommandFailure) -> GatewayError {
        GatewayError::command(&self.address, action, reason)
    }

    fn lock_link(&self) -> MutexGuard<'_, Option<Box<dyn Link>>> {
        self.link.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn lock_status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("address", &self.address)
            .field("state", &self.lock_status().state)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}
