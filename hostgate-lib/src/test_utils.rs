use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use url::Url;

use crate::Transport;

/// Error returned by a failing [`CountingTransport`], carrying the request target
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport failed for {0}")]
pub(crate) struct TransportFailure(pub(crate) String);

/// Transport stub that never touches the network.
///
/// It counts every executed request and answers with the request target, or
/// fails with [`TransportFailure`] if built with [`CountingTransport::failing`].
#[derive(Debug, Default)]
pub(crate) struct CountingTransport {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingTransport {
    pub(crate) fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    /// Number of requests that reached the transport
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record<R>(&self, target: String, response: R) -> Result<R, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(TransportFailure(target))
        } else {
            Ok(response)
        }
    }
}

#[async_trait]
impl Transport<reqwest::Request> for CountingTransport {
    type Response = Url;
    type Error = TransportFailure;

    async fn execute(&self, request: reqwest::Request) -> Result<Url, TransportFailure> {
        let url = request.url().clone();
        self.record(url.to_string(), url)
    }
}

#[async_trait]
impl<B> Transport<http::Request<B>> for CountingTransport
where
    B: Send + 'static,
{
    type Response = http::Uri;
    type Error = TransportFailure;

    async fn execute(&self, request: http::Request<B>) -> Result<http::Uri, TransportFailure> {
        let uri = request.uri().clone();
        self.record(uri.to_string(), uri)
    }
}

/// Build a GET request for `url`
///
/// # Panic
///
/// This panics on invalid URLs, so it should only be used for testing
pub(crate) fn get(url: &str) -> reqwest::Request {
    reqwest::Request::new(
        reqwest::Method::GET,
        Url::parse(url).expect("Expected valid request URL"),
    )
}
