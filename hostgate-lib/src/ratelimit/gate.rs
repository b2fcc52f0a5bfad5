use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::Transport;
use crate::ratelimit::{
    AdmissionError, GateConfig, GateError, HostKey, HostRegistry, Rate, RequestTarget, Result,
    UnregisteredHostPolicy,
};

/// An HTTP transport wrapped in per-host rate limiting.
///
/// Every request passes the same admission check before it reaches the
/// wrapped [`Transport`]:
///
/// 1. Determine the target host, either supplied by the caller or taken from
///    the request URI
/// 2. Look up the host's limiter in the [`HostRegistry`]
/// 3. Wait for a permit, or apply the [`UnregisteredHostPolicy`] if the host
///    has no limit
/// 4. Hand the request to the transport and return its outcome untouched
///
/// The gate keeps no per-request state; all of it lives in the registry's
/// limiters. Requests to different hosts never wait on each other.
///
/// # Examples
///
/// ```no_run
/// use hostgate_lib::{HostGate, Rate, UnregisteredHostPolicy};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gate = HostGate::new(reqwest::Client::new(), UnregisteredHostPolicy::Reject);
/// gate.register("example.com", Rate::per_second(2.0)?);
///
/// let request = reqwest::Request::new(reqwest::Method::GET, "https://example.com".parse()?);
/// let response = gate.execute(request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HostGate<T> {
    /// The wrapped HTTP client
    transport: T,

    /// Limiters per host, shared between clones of this gate
    registry: Arc<HostRegistry>,

    /// Handling of hosts without a registered limit
    policy: UnregisteredHostPolicy,
}

impl<T> HostGate<T> {
    /// Wrap `transport` with an empty registry
    #[must_use]
    pub fn new(transport: T, policy: UnregisteredHostPolicy) -> Self {
        Self::with_registry(transport, policy, Arc::new(HostRegistry::new()))
    }

    /// Wrap `transport`, taking limits from an existing `registry`
    #[must_use]
    pub const fn with_registry(
        transport: T,
        policy: UnregisteredHostPolicy,
        registry: Arc<HostRegistry>,
    ) -> Self {
        Self {
            transport,
            registry,
            policy,
        }
    }

    /// Wrap `transport` using the policy and host limits of `config`
    #[must_use]
    pub fn from_config(transport: T, config: &GateConfig) -> Self {
        let gate = Self::new(transport, config.unregistered);
        config.apply(&gate.registry);
        gate
    }

    /// Register a steady `rate` for `host`, replacing any previous limit
    pub fn register(&self, host: impl Into<HostKey>, rate: Rate) {
        self.registry.register(host, rate);
    }

    /// Register a `rate` for `host` that is reached gradually over `warmup`
    pub fn register_with_warmup(&self, host: impl Into<HostKey>, rate: Rate, warmup: Duration) {
        self.registry.register_with_warmup(host, rate, warmup);
    }

    /// The registry holding this gate's limits
    #[must_use]
    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    /// The wrapped transport
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The policy for hosts without a registered limit
    #[must_use]
    pub const fn policy(&self) -> UnregisteredHostPolicy {
        self.policy
    }

    /// Wait until `request` may be sent, without sending it.
    ///
    /// # Errors
    ///
    /// Fails with [`AdmissionError::InvalidTarget`] if the request names no
    /// host, or with [`AdmissionError::UnregisteredHost`] if the host has no
    /// limit and the gate rejects unknown hosts.
    pub async fn admit<R>(&self, request: &R) -> Result<HostKey>
    where
        R: RequestTarget + ?Sized,
    {
        let host = request.host_key()?;
        self.admit_host(&host).await?;
        Ok(host)
    }

    /// Wait until a request to `host` may be sent, without sending it.
    ///
    /// # Errors
    ///
    /// Fails with [`AdmissionError::UnregisteredHost`] if the host has no
    /// limit and the gate rejects unknown hosts.
    pub async fn admit_host(&self, host: &HostKey) -> Result<()> {
        // Clone the limiter out of the registry, no map guard is held while waiting
        let Some(limiter) = self.registry.lookup(host) else {
            return self.admit_unregistered(host).await;
        };

        let waited = limiter.acquire().await;
        if !waited.is_zero() {
            log::debug!(
                "Host {host} waited {}ms for its rate limit of {} requests per second",
                waited.as_millis(),
                limiter.rate().permits_per_second()
            );
        }
        Ok(())
    }

    async fn admit_unregistered(&self, host: &HostKey) -> Result<()> {
        match self.policy {
            UnregisteredHostPolicy::Reject => {
                Err(AdmissionError::UnregisteredHost { host: host.clone() })
            }
            UnregisteredHostPolicy::Allow => Ok(()),
            UnregisteredHostPolicy::Delay(delay) => {
                log::debug!(
                    "Host {host} has no rate limit, delaying request by {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    /// Execute `request` once its host, taken from the request URI, admits it.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Admission`] if the request was refused before
    /// dispatch and [`GateError::Transport`] with the transport's own error if
    /// executing it failed.
    pub async fn execute<Req>(
        &self,
        request: Req,
    ) -> std::result::Result<T::Response, GateError<T::Error>>
    where
        T: Transport<Req>,
        Req: RequestTarget + Send + 'static,
    {
        let host = request.host_key()?;
        self.dispatch(&host, request).await
    }

    /// Execute `request` once `host` admits it.
    ///
    /// The host is trusted as given, the request URI is not inspected. This
    /// is the shape for requests whose target was resolved beforehand.
    ///
    /// # Errors
    ///
    /// See [`HostGate::execute`].
    pub async fn execute_at<Req>(
        &self,
        host: impl Into<HostKey>,
        request: Req,
    ) -> std::result::Result<T::Response, GateError<T::Error>>
    where
        T: Transport<Req>,
        Req: Send + 'static,
    {
        self.dispatch(&host.into(), request).await
    }

    /// Execute `request` and pass the response through `handler`.
    ///
    /// # Errors
    ///
    /// See [`HostGate::execute`]. The handler only runs on success.
    pub async fn execute_with<Req, F, Fut, O>(
        &self,
        request: Req,
        handler: F,
    ) -> std::result::Result<O, GateError<T::Error>>
    where
        T: Transport<Req>,
        Req: RequestTarget + Send + 'static,
        F: FnOnce(T::Response) -> Fut,
        Fut: Future<Output = O>,
    {
        let response = self.execute(request).await?;
        Ok(handler(response).await)
    }

    /// Execute `request` once `host` admits it and pass the response through
    /// `handler`.
    ///
    /// # Errors
    ///
    /// See [`HostGate::execute`]. The handler only runs on success.
    pub async fn execute_at_with<Req, F, Fut, O>(
        &self,
        host: impl Into<HostKey>,
        request: Req,
        handler: F,
    ) -> std::result::Result<O, GateError<T::Error>>
    where
        T: Transport<Req>,
        Req: Send + 'static,
        F: FnOnce(T::Response) -> Fut,
        Fut: Future<Output = O>,
    {
        let response = self.execute_at(host, request).await?;
        Ok(handler(response).await)
    }

    /// The single path every dispatch shape goes through
    async fn dispatch<Req>(
        &self,
        host: &HostKey,
        request: Req,
    ) -> std::result::Result<T::Response, GateError<T::Error>>
    where
        T: Transport<Req>,
        Req: Send + 'static,
    {
        self.admit_host(host).await?;
        self.transport
            .execute(request)
            .await
            .map_err(GateError::Transport)
    }
}
