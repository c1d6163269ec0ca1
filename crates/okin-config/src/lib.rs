//! Shared configuration for the OKIN bed gateway.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! configuration file (`--config-path` or `OKIN_CONFIG_PATH`), then `OKIN_*`
//! environment variables, then command-line flags. The lowest layer is built
//! from the `DEFAULT_*` constants exported here.
//!
//! The timing defaults were measured from capture logs; no protocol document
//! specifies them.

mod defaults;
mod logging;

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_COMMAND_INTERVAL_MS, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HOLD_INTERVAL_MS,
    DEFAULT_LOG_FILTER, default_command_interval, default_connect_timeout, default_hold_interval,
    default_log_filter, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved gateway configuration.
///
/// Every field carries an `ortho_config` default, so loading with no file,
/// no `OKIN_*` variables and no flags yields [`Config::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "OKIN")]
pub struct Config {
    /// `tracing` filter expression, for example `info,okin_gateway=debug`.
    #[ortho_config(default = String::from(DEFAULT_LOG_FILTER))]
    pub log_filter: String,
    /// Output format for log records.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Pause after each frame before the link accepts the next one.
    #[ortho_config(default = DEFAULT_COMMAND_INTERVAL_MS)]
    pub command_interval_ms: u64,
    /// Upper bound on a single connection attempt.
    #[ortho_config(default = DEFAULT_CONNECT_TIMEOUT_MS)]
    pub connect_timeout_ms: u64,
    /// Repeat rate when a command is held.
    #[ortho_config(default = DEFAULT_HOLD_INTERVAL_MS)]
    pub hold_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: String::from(DEFAULT_LOG_FILTER),
            log_format: default_log_format(),
            command_interval_ms: DEFAULT_COMMAND_INTERVAL_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            hold_interval_ms: DEFAULT_HOLD_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the aggregated `ortho_config` error when any layer fails to
    /// parse.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        <Self as OrthoConfig>::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first element is treated as the program name, matching
    /// [`std::env::args_os`].
    ///
    /// # Errors
    ///
    /// Returns the aggregated `ortho_config` error when any layer fails to
    /// parse.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Pause between frames on one link.
    #[must_use]
    pub fn command_interval(&self) -> Duration {
        Duration::from_millis(self.command_interval_ms)
    }

    /// Bound on a connection attempt.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Repeat rate for held commands and continuous movements.
    #[must_use]
    pub fn hold_interval(&self) -> Duration {
        Duration::from_millis(self.hold_interval_ms)
    }
}
