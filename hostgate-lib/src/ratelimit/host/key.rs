use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::ratelimit::{AdmissionError, Result};

/// A type-safe representation of a hostname for rate limiting purposes.
///
/// Host names are case-insensitive, so every key is lowercased on
/// construction. A `:port` suffix and a trailing root `.` are dropped as
/// well, which makes `Example.com:8080` and `example.com.` the same host as
/// `example.com`. Registration and lookup therefore always agree on the key,
/// no matter how the caller spelled it.
///
/// # Examples
///
/// ```
/// use hostgate_lib::HostKey;
/// use url::Url;
///
/// let url = Url::parse("https://API.github.com/repos/user/repo").unwrap();
/// let host_key = HostKey::try_from(&url).unwrap();
/// assert_eq!(host_key.as_str(), "api.github.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct HostKey(String);

impl HostKey {
    /// Get the hostname as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the hostname as an owned String
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<&Url> for HostKey {
    type Error = AdmissionError;

    fn try_from(url: &Url) -> Result<Self> {
        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(HostKey::from(host)),
            _ => Err(AdmissionError::InvalidTarget {
                uri: url.to_string(),
            }),
        }
    }
}

impl TryFrom<Url> for HostKey {
    type Error = AdmissionError;

    fn try_from(url: Url) -> Result<Self> {
        HostKey::try_from(&url)
    }
}

impl TryFrom<&http::Uri> for HostKey {
    type Error = AdmissionError;

    fn try_from(uri: &http::Uri) -> Result<Self> {
        match uri.host() {
            Some(host) if !host.is_empty() => Ok(HostKey::from(host)),
            _ => Err(AdmissionError::InvalidTarget {
                uri: uri.to_string(),
            }),
        }
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HostKey {
    fn from(host: String) -> Self {
        HostKey::from(host.as_str())
    }
}

impl From<&str> for HostKey {
    fn from(host: &str) -> Self {
        HostKey(normalize(host))
    }
}

/// Lowercase `host` and strip a port and a trailing root label.
///
/// Bracketed IPv6 literals keep their brackets, bare IPv6 literals (more
/// than one colon) are left alone.
fn normalize(host: &str) -> String {
    let host = host.trim();
    let host = if host.starts_with('[') {
        host.find(']').map_or(host, |end| &host[..=end])
    } else {
        match host.rsplit_once(':') {
            Some((name, port))
                if !name.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) =>
            {
                name
            }
            _ => host,
        }
    };
    host.trim_end_matches('.').to_lowercase()
}

impl From<&HostKey> for HostKey {
    fn from(host: &HostKey) -> Self {
        host.clone()
    }
}

impl From<HostKey> for String {
    fn from(host: HostKey) -> Self {
        host.0
    }
}

/// Anything a request can be addressed by.
///
/// Implementors report the host a request is aimed at, or fail with
/// [`AdmissionError::InvalidTarget`] when the target carries no host at all
/// (relative references, `file:` or `data:` URLs and the like).
pub trait RequestTarget {
    /// The normalized host this request targets
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::InvalidTarget`] if no host can be determined.
    fn host_key(&self) -> Result<HostKey>;
}

impl RequestTarget for Url {
    fn host_key(&self) -> Result<HostKey> {
        HostKey::try_from(self)
    }
}

impl RequestTarget for http::Uri {
    fn host_key(&self) -> Result<HostKey> {
        HostKey::try_from(self)
    }
}

impl RequestTarget for reqwest::Request {
    fn host_key(&self) -> Result<HostKey> {
        self.url().host_key()
    }
}

impl<B> RequestTarget for http::Request<B> {
    fn host_key(&self) -> Result<HostKey> {
        self.uri().host_key()
    }
}
