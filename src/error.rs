//! Error types and handling for Pumpwatch
//!
//! This module defines the error types used throughout the pipeline. Station
//! level failures (rate limits, upstream errors, malformed payloads) are
//! contained by the collector; only persistence and configuration errors are
//! expected to reach the top of a run.

use thiserror::Error;

/// Result type alias for Pumpwatch operations
pub type Result<T> = std::result::Result<T, PumpwatchError>;

/// Main error type for Pumpwatch
#[derive(Debug, Error)]
pub enum PumpwatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Transport-level failures talking to the provider
    #[error("Network error: {message}")]
    Network { message: String },

    /// Non rate-limit errors reported by the provider
    #[error("API error: {message}")]
    Api { message: String },

    /// The provider asked us to slow down (HTTP 429 or equivalent)
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// Every attempt for a station was rate limited
    #[error("Retries exhausted for station {station_id} after {attempts} attempts")]
    RetriesExhausted { station_id: String, attempts: u32 },

    /// Payload did not have the expected shape
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Dataset could not be loaded or written
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl PumpwatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        PumpwatchError::Config {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        PumpwatchError::Serialization {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        PumpwatchError::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        PumpwatchError::Network {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        PumpwatchError::Api {
            message: message.into(),
        }
    }

    /// Create a new rate-limit error
    pub fn rate_limited<S: Into<String>>(message: S) -> Self {
        PumpwatchError::RateLimited {
            message: message.into(),
        }
    }

    /// Create a new retries-exhausted error
    pub fn retries_exhausted<S: Into<String>>(station_id: S, attempts: u32) -> Self {
        PumpwatchError::RetriesExhausted {
            station_id: station_id.into(),
            attempts,
        }
    }

    /// Create a new malformed-response error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        PumpwatchError::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new persistence error
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        PumpwatchError::Persistence {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        PumpwatchError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        PumpwatchError::Generic {
            message: message.into(),
        }
    }

    /// Whether this error is a transient rate-limit signal worth retrying
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PumpwatchError::RateLimited { .. })
    }
}

impl From<std::io::Error> for PumpwatchError {
    fn from(err: std::io::Error) -> Self {
        PumpwatchError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for PumpwatchError {
    fn from(err: serde_yaml::Error) -> Self {
        PumpwatchError::serialization(err.to_string())
    }
}

impl From<serde_json::Error> for PumpwatchError {
    fn from(err: serde_json::Error) -> Self {
        PumpwatchError::serialization(err.to_string())
    }
}

impl From<csv::Error> for PumpwatchError {
    fn from(err: csv::Error) -> Self {
        PumpwatchError::persistence(err.to_string())
    }
}

#[cfg(feature = "gasbuddy")]
impl From<reqwest::Error> for PumpwatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().map(|s| s.as_u16()) == Some(429) {
            return PumpwatchError::rate_limited(err.to_string());
        }
        PumpwatchError::network(err.to_string())
    }
}

impl From<chrono::ParseError> for PumpwatchError {
    fn from(err: chrono::ParseError) -> Self {
        PumpwatchError::validation("datetime", err.to_string().as_str())
    }
}
