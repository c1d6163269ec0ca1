//! Log output formats understood by the gateway host.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the gateway renders log records on stderr.
///
/// `json` suits a supervisor that ships logs elsewhere; `compact` is meant
/// for someone watching a bed respond from a terminal.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per record, event fields flattened.
    #[default]
    Json,
    /// One human-readable line per record.
    Compact,
}

impl LogFormat {
    /// Whether records are emitted as machine-readable objects.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Raised when `--log-format` or `OKIN_LOG_FORMAT` names no known format.
pub type LogFormatParseError = strum::ParseError;
