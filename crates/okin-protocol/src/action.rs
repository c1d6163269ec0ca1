//! Logical bed actions accepted by the gateway.

use std::fmt;
use std::str::FromStr;

use strum::EnumIter;
use thiserror::Error;

/// Closed set of commands the bed controller understands.
///
/// Every variant has exactly one frame in [`crate::encode`]. Actions that a
/// remote exposes but whose frame was never captured are deliberately absent;
/// see [`UnknownActionError::is_unconfirmed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum Action {
    /// Raise the head section while held.
    HeadUp,
    /// Lower the head section while held.
    HeadDown,
    /// Raise the foot section while held.
    FootUp,
    /// Lower the foot section while held.
    FootDown,
    /// Raise the lumbar section while held.
    LumbarUp,
    /// Lower the lumbar section while held.
    LumbarDown,
    /// Stop all movement.
    Stop,
    /// Flat preset.
    Flat,
    /// Lounge preset, labelled "TV" on some remotes.
    Lounge,
    /// Zero-gravity preset.
    ZeroGravity,
    /// Anti-snore preset.
    AntiSnore,
    /// Start the massage motors.
    MassageOn,
    /// Switch the under-bed light on.
    LightOn,
    /// Switch the under-bed light off.
    LightOff,
    /// Opcode `0x6F`: captured from the remote, no observed effect.
    Unverified6F,
    /// The four-byte `5A B0 00 A5` frame; purpose unconfirmed.
    SpecialB0,
}

impl Action {
    /// Returns the snake-case identifier used by front ends.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HeadUp => "head_up",
            Self::HeadDown => "head_down",
            Self::FootUp => "foot_up",
            Self::FootDown => "foot_down",
            Self::LumbarUp => "lumbar_up",
            Self::LumbarDown => "lumbar_down",
            Self::Stop => "stop",
            Self::Flat => "flat",
            Self::Lounge => "lounge",
            Self::ZeroGravity => "zero_gravity",
            Self::AntiSnore => "anti_snore",
            Self::MassageOn => "massage_on",
            Self::LightOn => "light_on",
            Self::LightOff => "light_off",
            Self::Unverified6F => "unverified_6f",
            Self::SpecialB0 => "special_b0",
        }
    }

    /// Whether the action drives an actuator rather than a light or motor toggle.
    #[must_use]
    pub const fn is_movement(self) -> bool {
        matches!(
            self,
            Self::HeadUp
                | Self::HeadDown
                | Self::FootUp
                | Self::FootDown
                | Self::LumbarUp
                | Self::LumbarDown
                | Self::Flat
                | Self::Lounge
                | Self::ZeroGravity
                | Self::AntiSnore
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Names offered by bed remotes for which no frame has been captured.
const UNCONFIRMED_NAMES: &[&str] = &[
    "massage_off",
    "massage_wave_1",
    "massage_wave_2",
    "massage_wave_3",
    "light_toggle",
    "brightness_up",
    "brightness_down",
    "ascent",
];

/// Raised when a requested action has no entry in the command table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown action '{0}'")]
pub struct UnknownActionError(String);

impl UnknownActionError {
    /// Builds an error for the supplied input.
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self(input.into())
    }

    /// Returns the normalised input that failed to resolve.
    #[must_use]
    pub fn input(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the name is a known remote button whose frame is still unconfirmed.
    #[must_use]
    pub fn is_unconfirmed(&self) -> bool {
        UNCONFIRMED_NAMES.contains(&self.0.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownActionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalised = input.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalised.as_str() {
            "head_up" => Ok(Self::HeadUp),
            "head_down" => Ok(Self::HeadDown),
            "foot_up" => Ok(Self::FootUp),
            "foot_down" => Ok(Self::FootDown),
            "lumbar_up" => Ok(Self::LumbarUp),
            "lumbar_down" => Ok(Self::LumbarDown),
            "stop" => Ok(Self::Stop),
            "flat" => Ok(Self::Flat),
            "lounge" | "tv" | "tv_position" => Ok(Self::Lounge),
            "zero_gravity" => Ok(Self::ZeroGravity),
            "anti_snore" => Ok(Self::AntiSnore),
            "massage_on" => Ok(Self::MassageOn),
            "light_on" => Ok(Self::LightOn),
            "light_off" => Ok(Self::LightOff),
            "unverified_6f" => Ok(Self::Unverified6F),
            "special_b0" => Ok(Self::SpecialB0),
            _ => Err(UnknownActionError(normalised)),
        }
    }
}
