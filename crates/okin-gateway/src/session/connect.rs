//! Connection attempts bounded by a timeout.

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use tracing::debug;

use super::SESSION_TARGET;
use crate::address::DeviceAddress;
use crate::errors::ConnectFailure;
use crate::transport::{Connector, Link, LinkEvent, TransportError};

/// Link established by a bounded attempt, paired with its event channel.
pub(super) struct Established {
    pub(super) link: Box<dyn Link>,
    pub(super) events: Receiver<LinkEvent>,
}

enum Slot {
    Pending,
    Finished(Result<Box<dyn Link>, TransportError>),
    Abandoned,
}

struct Rendezvous {
    slot: Mutex<Slot>,
    finished: Condvar,
}

/// Connects on a helper thread and waits at most `timeout` for the result.
///
/// When the deadline passes first, the attempt is abandoned: a link that
/// arrives afterwards is disconnected by the helper thread and never reaches
/// the session.
pub(super) fn connect_within(
    connector: &Arc<dyn Connector>,
    address: &DeviceAddress,
    timeout: Duration,
) -> Result<Established, ConnectFailure> {
    let (event_tx, event_rx) = mpsc::channel();
    let rendezvous = Arc::new(Rendezvous {
        slot: Mutex::new(Slot::Pending),
        finished: Condvar::new(),
    });

    let worker_connector = Arc::clone(connector);
    let worker_address = address.clone();
    let worker_rendezvous = Arc::clone(&rendezvous);
    let _worker = thread::Builder::new()
        .name(format!("okin-connect-{address}"))
        .spawn(move || {
            let outcome = worker_connector.connect(&worker_address, event_tx);
            deliver(&worker_rendezvous, &worker_address, outcome);
        })
        .map_err(|error| {
            ConnectFailure::Transport(TransportError::with_source(
                "failed to spawn connection worker",
                error,
            ))
        })?;

    let slot = rendezvous
        .slot
        .lock()
        .unwrap_or_else(|poison| poison.into_inner());
    let (mut slot, _) = rendezvous
        .finished
        .wait_timeout_while(slot, timeout, |slot| matches!(slot, Slot::Pending))
        .unwrap_or_else(|poison| poison.into_inner());

    match std::mem::replace(&mut *slot, Slot::Abandoned) {
        Slot::Finished(Ok(link)) => Ok(Established {
            link,
            events: event_rx,
        }),
        Slot::Finished(Err(error)) => Err(ConnectFailure::Transport(error)),
        Slot::Pending | Slot::Abandoned => Err(ConnectFailure::TimedOut { timeout }),
    }
}

fn deliver(
    rendezvous: &Rendezvous,
    address: &DeviceAddress,
    outcome: Result<Box<dyn Link>, TransportError>,
) {
    let mut slot = rendezvous
        .slot
        .lock()
        .unwrap_or_else(|poison| poison.into_inner());
    if matches!(*slot, Slot::Abandoned) {
        drop(slot);
        if let Ok(mut link) = outcome {
            debug!(
                target: SESSION_TARGET,
                address = %address,
                "discarding link that connected after the deadline"
            );
            if let Err(error) = link.disconnect() {
                debug!(
                    target: SESSION_TARGET,
                    address = %address,
                    error = %error,
                    "late link did not disconnect cleanly"
                );
            }
        }
        return;
    }
    *slot = Slot::Finished(outcome);
    rendezvous.finished.notify_all();
}
