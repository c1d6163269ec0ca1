//! Address-keyed ownership of device sessions.
//!
//! Sessions are created lazily the first time an address is used and live
//! until they are removed explicitly. There is no idle eviction. The map lock
//! only guards insertion and removal; it is never held while a session
//! connects, sends or closes.
//!
//! An evicted session stays in the map, marked as closing, until its close
//! has finished. Lookups for that address wait on `settled` meanwhile, so a
//! replacement session can never write while the old link is still busy.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use tracing::debug;

use crate::address::DeviceAddress;
use crate::health::HealthReporter;
use crate::session::{Session, SessionState, SessionTiming};
use crate::transport::Connector;

/// Log target for registry operations.
const REGISTRY_TARGET: &str = "okin_gateway::registry";

/// Point-in-time view of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// Device the session serves.
    pub address: DeviceAddress,
    /// Lifecycle state when the snapshot was taken.
    pub state: SessionState,
}

struct Entry {
    session: Arc<Session>,
    closing: bool,
}

type Sessions = BTreeMap<DeviceAddress, Entry>;

/// Registry of sessions keyed by device address.
pub struct SessionRegistry {
    connector: Arc<dyn Connector>,
    reporter: Arc<dyn HealthReporter>,
    timing: SessionTiming,
    sessions: Mutex<Sessions>,
    settled: Condvar,
}

impl SessionRegistry {
    /// Builds an empty registry whose sessions connect through `connector`.
    #[must_use]
    pub fn new(
        connector: Arc<dyn Connector>,
        reporter: Arc<dyn HealthReporter>,
        timing: SessionTiming,
    ) -> Self {
        Self {
            connector,
            reporter,
            timing,
            sessions: Mutex::new(BTreeMap::new()),
            settled: Condvar::new(),
        }
    }

    /// Timing applied to sessions created by this registry.
    #[must_use]
    pub fn timing(&self) -> SessionTiming {
        self.timing
    }

    /// Returns the session for `address`, creating it when absent.
    ///
    /// Concurrent callers for the same address always receive the same
    /// session. A new session starts [`SessionState::Disconnected`] and does
    /// not connect until it is first used. While a previous session for the
    /// address is still closing, this waits for the close to finish.
    pub fn get_or_create(&self, address: &DeviceAddress) -> Arc<Session> {
        let mut sessions = self.settled_for(address);
        if let Some(entry) = sessions.get(address) {
            return Arc::clone(&entry.session);
        }

        let session = Arc::new(Session::new(
            address.clone(),
            Arc::clone(&self.connector),
            Arc::clone(&self.reporter),
            self.timing,
        ));
        sessions.insert(
            address.clone(),
            Entry {
                session: Arc::clone(&session),
                closing: false,
            },
        );
        drop(sessions);

        self.reporter.session_created(address);
        session
    }

    /// Returns the session for `address` without creating one.
    ///
    /// A session that is being closed is still returned.
    #[must_use]
    pub fn get(&self, address: &DeviceAddress) -> Option<Arc<Session>> {
        self.lock_sessions()
            .get(address)
            .map(|entry| Arc::clone(&entry.session))
    }

    /// Evicts and closes the session for `address`.
    ///
    /// Returns `false` when no session was registered. The close runs
    /// without the map lock, so other addresses are not blocked while an
    /// in-flight command drains; the address itself stays reserved until
    /// the close completes. Callers still holding the evicted session
    /// receive `CommandFailed` from it.
    pub fn remove(&self, address: &DeviceAddress) -> bool {
        let session = {
            let mut sessions = self.settled_for(address);
            let Some(entry) = sessions.get_mut(address) else {
                return false;
            };
            entry.closing = true;
            Arc::clone(&entry.session)
        };

        debug!(
            target: REGISTRY_TARGET,
            address = %address,
            "evicting session"
        );
        session.close();
        self.forget([address]);
        true
    }

    /// Registered addresses in ascending order, including sessions that are
    /// still closing.
    #[must_use]
    pub fn list_addresses(&self) -> Vec<DeviceAddress> {
        self.lock_sessions().keys().cloned().collect()
    }

    /// State of every registered session in address order.
    ///
    /// A session that is being evicted reports [`SessionState::Closed`]
    /// even while its last command is still on the link.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SessionStatus> {
        let entries: Vec<_> = self
            .lock_sessions()
            .values()
            .map(|entry| (Arc::clone(&entry.session), entry.closing))
            .collect();
        entries
            .into_iter()
            .map(|(session, closing)| SessionStatus {
                address: session.address().clone(),
                state: if closing {
                    SessionState::Closed
                } else {
                    session.state()
                },
            })
            .collect()
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_sessions().len()
    }

    /// Whether no session is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_sessions().is_empty()
    }

    /// Evicts and closes every session.
    pub fn close_all(&self) {
        let evicted: Vec<_> = self
            .lock_sessions()
            .values_mut()
            .filter(|entry| !entry.closing)
            .map(|entry| {
                entry.closing = true;
                Arc::clone(&entry.session)
            })
            .collect();
        debug!(
            target: REGISTRY_TARGET,
            sessions = evicted.len(),
            "closing all sessions"
        );
        for session in &evicted {
            session.close();
        }
        self.forget(evicted.iter().map(|session| session.address()));
    }

    /// Blocks until no session for `address` is closing.
    fn settled_for(&self, address: &DeviceAddress) -> MutexGuard<'_, Sessions> {
        let sessions = self.lock_sessions();
        self.settled
            .wait_while(sessions, |sessions| {
                sessions.get(address).is_some_and(|entry| entry.closing)
            })
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn forget<'a>(&self, addresses: impl IntoIterator<Item = &'a DeviceAddress>) {
        let mut sessions = self.lock_sessions();
        for address in addresses {
            sessions.remove(address);
        }
        drop(sessions);
        self.settled.notify_all();
    }

    fn lock_sessions(&self) -> MutexGuard<'_, Sessions> {
        self.sessions
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionRegistry")
            .field("addresses", &self.list_addresses())
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}
