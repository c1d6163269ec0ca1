//! Scripted transport used in tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::address::DeviceAddress;
use crate::transport::{Connector, Link, LinkEvent, LinkEventSender, TransportError};

/// Transport operation observed by the recording connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `Connector::connect` was invoked.
    Connect(DeviceAddress),
    /// `Link::write` completed successfully with these bytes.
    Write(DeviceAddress, Vec<u8>),
    /// `Link::disconnect` was invoked.
    Disconnect(DeviceAddress),
}

/// Connector that records every call and fails on request.
#[derive(Clone, Default)]
pub struct RecordingConnector {
    shared: Arc<Mutex<TransportState>>,
}

impl RecordingConnector {
    /// Creates a connector that accepts every connect and write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle for scripting failures and asserting calls.
    pub fn handle(&self) -> TransportHandle {
        TransportHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Connector for RecordingConnector {
    fn connect(
        &self,
        address: &DeviceAddress,
        events: LinkEventSender,
    ) -> Result<Box<dyn Link>, TransportError> {
        let delay = with_state(&self.shared, |state| {
            state.calls.push(TransportCall::Connect(address.clone()));
            if state.failing_connects > 0 {
                state.failing_connects -= 1;
                return Err(TransportError::new("device out of range"));
            }
            state.senders.insert(address.clone(), events);
            Ok(state.connect_delay)
        })?;

        thread::sleep(delay);
        Ok(Box::new(RecordingLink {
            address: address.clone(),
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct RecordingLink {
    address: DeviceAddress,
    shared: Arc<Mutex<TransportState>>,
}

impl Link for RecordingLink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let delay = with_state(&self.shared, |state| {
            state.write_attempts += 1;
            if !state.in_flight.insert(self.address.clone()) {
                state.overlapping_writes += 1;
            }
            if state.failing_writes > 0 {
                state.failing_writes -= 1;
                state.in_flight.remove(&self.address);
                return Err(TransportError::new("characteristic write rejected"));
            }
            state.peak_concurrent_writes = state.peak_concurrent_writes.max(state.in_flight.len());
            Ok(state.write_delay)
        })?;

        thread::sleep(delay);

        with_state(&self.shared, |state| {
            state.in_flight.remove(&self.address);
            state
                .calls
                .push(TransportCall::Write(self.address.clone(), bytes.to_vec()));
        });
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        with_state(&self.shared, |state| {
            state.senders.remove(&self.address);
            state
                .calls
                .push(TransportCall::Disconnect(self.address.clone()));
        });
        Ok(())
    }
}

/// Handle that scripts transport behaviour and exposes recorded calls.
#[derive(Clone)]
pub struct TransportHandle {
    shared: Arc<Mutex<TransportState>>,
}

impl TransportHandle {
    /// Ordered list of transport calls.
    pub fn calls(&self) -> Vec<TransportCall> {
        with_state(&self.shared, |state| state.calls.clone())
    }

    /// Calls concerning one device, in order.
    pub fn calls_for(&self, address: &DeviceAddress) -> Vec<TransportCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                TransportCall::Connect(target)
                | TransportCall::Write(target, _)
                | TransportCall::Disconnect(target) => target == address,
            })
            .collect()
    }

    /// Connection attempts made for `address`.
    pub fn connect_count(&self, address: &DeviceAddress) -> usize {
        self.calls_for(address)
            .iter()
            .filter(|call| matches!(call, TransportCall::Connect(_)))
            .count()
    }

    /// Disconnects issued for `address`.
    pub fn disconnect_count(&self, address: &DeviceAddress) -> usize {
        self.calls_for(address)
            .iter()
            .filter(|call| matches!(call, TransportCall::Disconnect(_)))
            .count()
    }

    /// Frames successfully written to `address`, in order.
    pub fn writes_to(&self, address: &DeviceAddress) -> Vec<Vec<u8>> {
        self.calls_for(address)
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Write(_, bytes) => Some(bytes),
                TransportCall::Connect(_) | TransportCall::Disconnect(_) => None,
            })
            .collect()
    }

    /// Every write attempt, including rejected ones.
    pub fn write_attempts(&self) -> usize {
        with_state(&self.shared, |state| state.write_attempts)
    }

    /// Writes that started while another write to the same device was open.
    pub fn overlapping_writes(&self) -> usize {
        with_state(&self.shared, |state| state.overlapping_writes)
    }

    /// Highest number of devices written to at the same moment.
    pub fn peak_concurrent_writes(&self) -> usize {
        with_state(&self.shared, |state| state.peak_concurrent_writes)
    }

    /// Whether a write to `address` is currently blocked in the transport.
    pub fn is_writing(&self, address: &DeviceAddress) -> bool {
        with_state(&self.shared, |state| state.in_flight.contains(address))
    }

    /// Makes the next `count` connection attempts fail.
    pub fn fail_next_connects(&self, count: usize) {
        with_state(&self.shared, |state| state.failing_connects = count);
    }

    /// Makes the next `count` writes fail.
    pub fn fail_next_writes(&self, count: usize) {
        with_state(&self.shared, |state| state.failing_writes = count);
    }

    /// Delays every successful connect.
    pub fn set_connect_delay(&self, delay: Duration) {
        with_state(&self.shared, |state| state.connect_delay = delay);
    }

    /// Delays every write before it completes.
    pub fn set_write_delay(&self, delay: Duration) {
        with_state(&self.shared, |state| state.write_delay = delay);
    }

    /// Reports that the link to `address` dropped. Returns `false` without a
    /// live link.
    pub fn drop_link(&self, address: &DeviceAddress) -> bool {
        self.push_event(address, LinkEvent::Disconnected)
    }

    /// Pushes a device notification for `address`.
    pub fn notify(&self, address: &DeviceAddress, payload: &[u8]) -> bool {
        self.push_event(address, LinkEvent::Notification(payload.to_vec()))
    }

    /// Drops the event sender for `address` without sending anything.
    pub fn forget_events(&self, address: &DeviceAddress) -> bool {
        with_state(&self.shared, |state| state.senders.remove(address).is_some())
    }

    fn push_event(&self, address: &DeviceAddress, event: LinkEvent) -> bool {
        with_state(&self.shared, |state| {
            state
                .senders
                .get(address)
                .is_some_and(|sender| sender.send(event).is_ok())
        })
    }
}

fn with_state<R, F>(shared: &Arc<Mutex<TransportState>>, action: F) -> R
where
    F: FnOnce(&mut TransportState) -> R,
{
    let mut guard = shared.lock().unwrap_or_else(|poison| poison.into_inner());
    action(&mut guard)
}

#[derive(Default)]
struct TransportState {
    calls: Vec<TransportCall>,
    senders: HashMap<DeviceAddress, LinkEventSender>,
    in_flight: HashSet<DeviceAddress>,
    failing_connects: usize,
    failing_writes: usize,
    connect_delay: Duration,
    write_delay: Duration,
    write_attempts: usize,
    overlapping_writes: usize,
    peak_concurrent_writes: usize,
}
