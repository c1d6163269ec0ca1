//! Connection management for OKIN adjustable beds.
#![deny(missing_docs)]
//!
//! The crate keeps one [`Session`] per device address, serialises the frames
//! written to each device, and recovers links lazily after they drop. The
//! wireless stack itself stays behind the [`Connector`] and [`Link`] traits so
//! hosts can plug in a real transport and tests can inject scripted ones.
//!
//! [`Dispatcher`] is the surface front ends call:
//!
//! ```ignore
//! use std::sync::Arc;
//! use okin_gateway::{Dispatcher, SessionTiming};
//!
//! let dispatcher = Dispatcher::new(Arc::new(transport), SessionTiming::default());
//! dispatcher.perform_named("AA:BB:CC:DD:EE:FF", "head_up")?;
//! ```

mod address;
mod dispatcher;
mod errors;
mod health;
mod movement;
mod registry;
mod session;
pub mod telemetry;
mod transport;

pub use address::{AddressParseError, DeviceAddress};
pub use dispatcher::{Dispatcher, HoldReport};
pub use errors::{CommandFailure, ConnectFailure, ErrorKind, GatewayError};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use okin_protocol::{Action, UnknownActionError};
pub use registry::{SessionRegistry, SessionStatus};
pub use session::{Session, SessionState, SessionTiming};
pub use transport::{Connector, Link, LinkEvent, LinkEventSender, TransportError};

#[cfg(test)]
mod tests;
