//! `hostgate` rate limits outgoing HTTP requests per host.
//!
//! Wrap an HTTP client in a [`HostGate`], register a rate for every host you
//! talk to, and send requests through the gate. Each request waits until its
//! host's limiter admits it and is then handed to the client unchanged:
//!
//! ```no_run
//! use hostgate_lib::{HostGate, Rate, UnregisteredHostPolicy};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let gate = HostGate::new(reqwest::Client::new(), UnregisteredHostPolicy::Reject);
//!   gate.register("api.github.com", Rate::per_second(5.0)?);
//!   gate.register_with_warmup("example.com", Rate::per_second(2.0)?, Duration::from_secs(10));
//!
//!   let request = reqwest::Request::new(
//!     reqwest::Method::GET,
//!     "https://api.github.com/repos/rust-lang/rust".parse()?,
//!   );
//!   let response = gate.execute(request).await?;
//!   assert!(response.status().is_success());
//!   Ok(())
//! }
//! ```
//!
//! Limits can also come from a TOML file, see [`GateConfig`].
#![warn(missing_docs)]

pub mod ratelimit;
mod transport;

#[cfg(test)]
pub(crate) mod test_utils;

pub use ratelimit::{
    AdmissionError, ConfigError, GateConfig, GateError, HostGate, HostKey, HostLimitConfig,
    HostLimitConfigs, HostLimiter, HostRegistry, Rate, RateError, RequestTarget, Result,
    UnregisteredHostPolicy,
};
pub use transport::Transport;
