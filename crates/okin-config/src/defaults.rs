use std::time::Duration;

/// Default log filter expression used by the gateway.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Pause enforced after every frame, taken from captured remote traffic.
pub const DEFAULT_COMMAND_INTERVAL_MS: u64 = 100;

/// Upper bound on a single link connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;

/// Repeat rate used when emulating a held remote button.
pub const DEFAULT_HOLD_INTERVAL_MS: u64 = 100;

/// Default log filter expression used by the gateway.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default pause between consecutive frames on one link.
#[must_use]
pub const fn default_command_interval() -> Duration {
    Duration::from_millis(DEFAULT_COMMAND_INTERVAL_MS)
}

/// Default bound on a connection attempt.
#[must_use]
pub const fn default_connect_timeout() -> Duration {
    Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS)
}

/// Default repeat rate for held commands.
#[must_use]
pub const fn default_hold_interval() -> Duration {
    Duration::from_millis(DEFAULT_HOLD_INTERVAL_MS)
}
