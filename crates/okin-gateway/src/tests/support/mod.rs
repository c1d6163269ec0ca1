//! Shared fixtures and helpers for gateway tests.

mod recording_reporter;
mod recording_transport;
mod world;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rstest::fixture;

use crate::address::DeviceAddress;
use crate::dispatcher::Dispatcher;
use crate::session::SessionTiming;

pub use recording_reporter::{HealthEvent, RecordingHealthReporter};
pub use recording_transport::{RecordingConnector, TransportCall, TransportHandle};
pub use world::TestWorld;

/// Address used by most single-device tests.
pub const BED: &str = "AA:BB:CC:DD:EE:FF";

/// Parses a test address.
pub fn address(text: &str) -> DeviceAddress {
    text.parse().expect("test address should parse")
}

/// Timing short enough to keep tests quick while preserving ordering.
#[fixture]
pub fn fast_timing() -> SessionTiming {
    SessionTiming {
        command_interval: Duration::from_millis(2),
        connect_timeout: Duration::from_millis(500),
        hold_interval: Duration::from_millis(5),
    }
}

/// Dispatcher wired to a recording transport and reporter.
pub struct Harness {
    /// Dispatcher under test.
    pub dispatcher: Arc<Dispatcher>,
    /// Scripts and inspects the fake transport.
    pub transport: TransportHandle,
    /// Captures health events.
    pub reporter: RecordingHealthReporter,
}

impl Harness {
    /// Builds a harness with the supplied timing.
    pub fn new(timing: SessionTiming) -> Self {
        let connector = RecordingConnector::new();
        let transport = connector.handle();
        let reporter = RecordingHealthReporter::default();
        let dispatcher = Dispatcher::with_reporter(
            Arc::new(connector),
            Arc::new(reporter.clone()),
            timing,
        );
        Self {
            dispatcher: Arc::new(dispatcher),
            transport,
            reporter,
        }
    }
}

/// Harness using [`fast_timing`].
#[fixture]
pub fn harness(fast_timing: SessionTiming) -> Harness {
    Harness::new(fast_timing)
}

/// Polls `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
