//! Open-ended repetition of an action until it is cancelled.
//!
//! Each running movement owns a worker thread bound to the session that was
//! current when the movement started. The worker never looks the address up
//! again, so evicting the session ends the movement with the session's
//! `CommandFailed` instead of reconnecting behind the caller's back.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use okin_protocol::Action;
use tracing::{debug, warn};

use crate::address::DeviceAddress;
use crate::session::Session;

const MOVEMENT_TARGET: &str = "okin_gateway::movement";

type MovementKey = (DeviceAddress, Action);

/// One repeating action and the means to halt it.
pub(crate) struct Movement {
    halt: Sender<()>,
    worker: JoinHandle<()>,
}

impl Movement {
    /// Spawns a worker that re-sends `action` every `interval`.
    ///
    /// The first frame is the caller's responsibility; the worker waits one
    /// interval before its first send.
    pub(crate) fn spawn(
        session: Arc<Session>,
        action: Action,
        interval: Duration,
    ) -> io::Result<Self> {
        let (halt, halted) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(format!("okin-move-{}", session.address()))
            .spawn(move || repeat(&session, action, interval, &halted))?;
        Ok(Self { halt, worker })
    }

    fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }

    /// Halts the worker and waits for it, including any send in progress.
    pub(crate) fn stop(self) {
        let Self { halt, worker } = self;
        drop(halt);
        if worker.join().is_err() {
            warn!(target: MOVEMENT_TARGET, "movement worker panicked");
        }
    }
}

fn repeat(session: &Session, action: Action, interval: Duration, halted: &Receiver<()>) {
    loop {
        match halted.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                debug!(
                    target: MOVEMENT_TARGET,
                    address = %session.address(),
                    action = %action,
                    "movement halted"
                );
                return;
            }
        }

        if let Err(error) = session.send(action) {
            debug!(
                target: MOVEMENT_TARGET,
                address = %session.address(),
                action = %action,
                error = %error,
                "movement ended by a failed command"
            );
            return;
        }
    }
}

/// Running movements keyed by device and action.
///
/// The map lock is never held while a worker is joined.
#[derive(Default)]
pub(crate) struct Movements {
    active: Mutex<BTreeMap<MovementKey, Movement>>,
}

impl Movements {
    /// Registers `movement`, returning the one it replaces.
    pub(crate) fn insert(
        &self,
        address: &DeviceAddress,
        action: Action,
        movement: Movement,
    ) -> Option<Movement> {
        self.lock_active()
            .insert((address.clone(), action), movement)
    }

    pub(crate) fn take(&self, address: &DeviceAddress, action: Action) -> Option<Movement> {
        self.lock_active().remove(&(address.clone(), action))
    }

    /// Removes every movement for `address`.
    pub(crate) fn take_for(&self, address: &DeviceAddress) -> Vec<Movement> {
        let mut active = self.lock_active();
        let keys: Vec<_> = active
            .keys()
            .filter(|(target, _)| target == address)
            .cloned()
            .collect();
        keys.iter().filter_map(|key| active.remove(key)).collect()
    }

    pub(crate) fn take_all(&self) -> Vec<Movement> {
        std::mem::take(&mut *self.lock_active())
            .into_values()
            .collect()
    }

    /// Actions still repeating for `address`, in action order.
    pub(crate) fn running_for(&self, address: &DeviceAddress) -> Vec<Action> {
        self.lock_active()
            .iter()
            .filter(|((target, _), movement)| target == address && movement.is_running())
            .map(|((_, action), _)| *action)
            .collect()
    }

    fn lock_active(&self) -> MutexGuard<'_, BTreeMap<MovementKey, Movement>> {
        self.active
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl fmt::Debug for Movements {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<_> = self.lock_active().keys().cloned().collect();
        formatter
            .debug_struct("Movements")
            .field("active", &keys)
            .finish()
    }
}
