//! Per-host rate limiting.
//!
//! This module throttles HTTP requests on a per-host basis. Every host can be
//! given its own rate, optionally reached after a warm-up period, and
//! requests to hosts without a rate are handled by a configurable policy.
//!
//! # Architecture
//!
//! - [`HostKey`]: Represents a hostname/domain for rate limiting
//! - [`Rate`]: A validated number of permits per second
//! - [`HostLimiter`]: Token bucket issuing permits for a single host
//! - [`HostRegistry`]: Concurrent map from hosts to their limiters
//! - [`HostGate`]: Admits requests through the registry before handing them
//!   to the wrapped transport
//! - [`GateConfig`]: Configuration for the gate and per-host limits

mod config;
mod error;
mod gate;
mod host;
mod registry;

pub use config::{GateConfig, HostLimitConfig, HostLimitConfigs, UnregisteredHostPolicy};
pub use error::{AdmissionError, ConfigError, GateError, RateError, Result};
pub use gate::HostGate;
pub use host::{HostKey, HostLimiter, Rate, RequestTarget};
pub use registry::HostRegistry;
