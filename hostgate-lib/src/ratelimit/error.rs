use thiserror::Error;

use crate::ratelimit::HostKey;

/// The `Result` type of admission checks
pub type Result<T> = std::result::Result<T, AdmissionError>;

/// Reasons a request is refused before it ever reaches the transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// The request does not name a host that could be rate limited
    #[error("URI does not specify a valid host name: {uri}")]
    InvalidTarget {
        /// The offending request target
        uri: String,
    },

    /// No limit is registered for the host and the gate rejects unknown hosts
    #[error("Host {host} is not registered with a preset limit, register one with `HostGate::register`")]
    UnregisteredHost {
        /// The host that has no registered limit
        host: HostKey,
    },
}

/// Errors returned by [`crate::HostGate`] dispatch methods.
///
/// Transport errors are handed back untouched in [`GateError::Transport`], so
/// callers can inspect exactly what the wrapped client reported.
#[derive(Error, Debug)]
pub enum GateError<E> {
    /// The request was refused before dispatch
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// The wrapped transport failed while executing the request
    #[error(transparent)]
    Transport(E),
}

impl<E> GateError<E> {
    /// The admission error, if the request never left the gate
    #[must_use]
    pub const fn admission(&self) -> Option<&AdmissionError> {
        match self {
            Self::Admission(e) => Some(e),
            Self::Transport(_) => None,
        }
    }

    /// Consume the error and return the transport's own error, if any
    pub fn into_transport(self) -> Option<E> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Admission(_) => None,
        }
    }
}

/// An invalid request rate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateError {
    /// The rate string is not a number
    #[error("Cannot parse rate `{0}`: expected permits per second")]
    Parse(String),

    /// Rates must be finite and strictly positive
    #[error("Rate must be a positive number of permits per second, got {0}")]
    NotPositive(f64),

    /// The rate is too small or too large to be turned into an interval
    #[error("Rate {0} permits per second is out of range")]
    OutOfRange(f64),
}

/// Errors while loading a [`crate::GateConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read configuration file `{path}`: {source}")]
    Io {
        /// Path of the configuration file
        path: std::path::PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has unexpected fields
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
