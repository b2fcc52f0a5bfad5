use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::ratelimit::{ConfigError, HostKey, HostRegistry, Rate};

/// What the gate does with requests to hosts that have no registered limit.
///
/// The policy is chosen when the gate is built and never changes afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnregisteredHostPolicy {
    /// Refuse the request with [`crate::AdmissionError::UnregisteredHost`]
    #[default]
    Reject,
    /// Let the request through right away
    Allow,
    /// Sleep for the given duration, then let the request through
    Delay(#[serde(with = "humantime_serde")] Duration),
}

impl UnregisteredHostPolicy {
    /// Whether requests to unknown hosts are refused
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        matches!(self, Self::Reject)
    }
}

/// Per-host limit overrides, keyed by normalized host name
pub type HostLimitConfigs = HashMap<HostKey, HostLimitConfig>;

/// Configuration for a specific host's rate limit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostLimitConfig {
    /// Steady-state requests per second
    pub rate: Rate,

    /// Time to ramp up to `rate` after the host has been idle
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub warmup: Option<Duration>,
}

impl HostLimitConfig {
    /// Register this limit for `host` in `registry`
    pub fn register(&self, registry: &HostRegistry, host: &HostKey) {
        match self.warmup {
            Some(warmup) => registry.register_with_warmup(host, self.rate, warmup),
            None => registry.register(host, self.rate),
        }
    }
}

/// Gate configuration, usually read from a TOML file:
///
/// ```toml
/// unregistered = { delay = "1s" }
///
/// [hosts."api.github.com"]
/// rate = 5.0
///
/// [hosts."example.com"]
/// rate = 2
/// warmup = "10s"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// Handling of hosts without a limit
    #[serde(default)]
    pub unregistered: UnregisteredHostPolicy,

    /// Host-specific limits. Two entries that name the same host after
    /// normalization (`Example.com` and `example.com:443`) are rejected.
    #[serde(default, deserialize_with = "deserialize_hosts")]
    pub hosts: HostLimitConfigs,
}

fn deserialize_hosts<'de, D>(deserializer: D) -> Result<HostLimitConfigs, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, HostLimitConfig>::deserialize(deserializer)?;
    let mut hosts = HostLimitConfigs::with_capacity(raw.len());
    for (name, limit) in raw {
        let host = HostKey::from(name.as_str());
        if hosts.insert(host.clone(), limit).is_some() {
            return Err(serde::de::Error::custom(format!(
                "host `{host}` is configured more than once"
            )));
        }
    }
    Ok(hosts)
}

impl GateConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        contents.parse()
    }

    /// Register every configured host limit in `registry`
    pub fn apply(&self, registry: &HostRegistry) {
        for (host, limit) in &self.hosts {
            limit.register(registry, host);
        }
    }
}

impl FromStr for GateConfig {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(input)?)
    }
}
