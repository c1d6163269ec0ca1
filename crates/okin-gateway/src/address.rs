//! Device addresses used as session keys.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Hardware address of a bed controller.
///
/// The value is opaque to the gateway. Parsing trims surrounding whitespace
/// and upper-cases ASCII letters so differently cased spellings of the same
/// address share one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Returns the normalised address text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Raised when an address string is empty after trimming.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("device address must not be empty")]
pub struct AddressParseError;

impl FromStr for DeviceAddress {
    type Err = AddressParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AddressParseError);
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }
}
