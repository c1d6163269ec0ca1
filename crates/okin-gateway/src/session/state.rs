//! Session lifecycle states and timing.

use std::fmt;
use std::time::Duration;

use okin_config::{
    Config, default_command_interval, default_connect_timeout, default_hold_interval,
};

/// Lifecycle of a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No live link. Initial state and the state after any link loss.
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// A link is established and idle.
    Ready,
    /// A frame is being written or the post-command interval is running.
    Sending,
    /// Torn down explicitly; the session accepts no further commands.
    Closed,
}

impl SessionState {
    /// Returns the snake-case label used in status reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Sending => "sending",
            Self::Closed => "closed",
        }
    }

    /// Whether a link is held in this state.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Ready | Self::Sending)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Timing applied to every session created by a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Pause after each frame before the next frame may be written.
    pub command_interval: Duration,
    /// Upper bound on a single connection attempt.
    pub connect_timeout: Duration,
    /// Repeat rate used when a command is held.
    pub hold_interval: Duration,
}

impl SessionTiming {
    /// Extracts the effective timing from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            command_interval: config.command_interval(),
            connect_timeout: config.connect_timeout(),
            hold_interval: config.hold_interval(),
        }
    }
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            command_interval: default_command_interval(),
            connect_timeout: default_connect_timeout(),
            hold_interval: default_hold_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn timing_follows_configuration() {
        let config = Config {
            command_interval_ms: 25,
            connect_timeout_ms: 1_000,
            ..Config::default()
        };

        let timing = SessionTiming::from_config(&config);

        assert_eq!(timing.command_interval, Duration::from_millis(25));
        assert_eq!(timing.connect_timeout, Duration::from_secs(1));
        assert_eq!(timing.hold_interval, default_hold_interval());
    }

    #[rstest]
    #[case(SessionState::Disconnected, false)]
    #[case(SessionState::Connecting, false)]
    #[case(SessionState::Ready, true)]
    #[case(SessionState::Sending, true)]
    #[case(SessionState::Closed, false)]
    fn reports_connected_states(#[case] state: SessionState, #[case] connected: bool) {
        assert_eq!(state.is_connected(), connected);
    }
}
