//! Error types for the relay core.

use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the relay core
#[derive(Debug, Error)]
pub enum Error {
    /// Socket or file IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// OSC packet could not be turned into a relay message
    #[error("OSC decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Reasons a datagram or a single OSC message is dropped instead of relayed.
///
/// None of these are fatal. The listener counts and logs them, then keeps
/// receiving.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The datagram is not a valid OSC packet
    #[error("malformed OSC packet: {0}")]
    Malformed(String),

    /// The message carries no arguments, so there is no value to relay
    #[error("message {0} has no arguments")]
    MissingArgument(String),

    /// The first argument is not a number
    #[error("message {address} has a non-numeric first argument ({kind})")]
    NonNumeric {
        address: String,
        kind: &'static str,
    },

    /// The first argument is NaN or infinite and has no JSON representation
    #[error("message {0} carries a non-finite value")]
    NonFinite(String),
}
