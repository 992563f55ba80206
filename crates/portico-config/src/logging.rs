use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output formats accepted for the proxy's log stream.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, with fields flattened.
    #[default]
    Json,
    /// Single-line human-readable events.
    Compact,
}

/// Error returned when a log format label is not recognised.
pub type LogFormatParseError = strum::ParseError;
