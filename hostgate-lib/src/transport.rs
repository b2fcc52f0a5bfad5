//! The HTTP client capability wrapped by [`crate::HostGate`].
//!
//! The gate never talks to the network itself. It hands admitted requests to
//! a [`Transport`], which is implemented for [`reqwest::Client`] out of the
//! box. Anything else that can execute a request (a mock, a client with
//! middleware, a shared handle) can be plugged in by implementing the trait.

use async_trait::async_trait;
use reqwest::{Client, Request, Response};
use std::sync::Arc;

/// Something that executes fully formed requests of type `Req`.
///
/// Per-call context travels inside the request value itself (for example in
/// [`http::Request::extensions`]), so a single `execute` covers every call
/// shape.
#[async_trait]
pub trait Transport<Req>: Send + Sync
where
    Req: Send + 'static,
{
    /// Successful outcome of a request
    type Response: Send;
    /// Transport-level failure
    type Error: Send;

    /// Execute `request` and return the transport's outcome as is
    async fn execute(&self, request: Req) -> Result<Self::Response, Self::Error>;
}

#[async_trait]
impl Transport<Request> for Client {
    type Response = Response;
    type Error = reqwest::Error;

    async fn execute(&self, request: Request) -> Result<Response, reqwest::Error> {
        Client::execute(self, request).await
    }
}

#[async_trait]
impl<B> Transport<http::Request<B>> for Client
where
    B: Into<reqwest::Body> + Send + 'static,
{
    type Response = Response;
    type Error = reqwest::Error;

    async fn execute(&self, request: http::Request<B>) -> Result<Response, reqwest::Error> {
        let request = Request::try_from(request)?;
        Client::execute(self, request).await
    }
}

#[async_trait]
impl<Req, T> Transport<Req> for Arc<T>
where
    Req: Send + 'static,
    T: Transport<Req> + ?Sized,
{
    type Response = T::Response;
    type Error = T::Error;

    async fn execute(&self, request: Req) -> Result<Self::Response, Self::Error> {
        <T as Transport<Req>>::execute(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::mock_server;

    #[tokio::test]
    async fn test_reqwest_transport() {
        let mock_server = mock_server!(http::StatusCode::OK);
        let url = reqwest::Url::parse(&mock_server.uri()).unwrap();

        let response = Transport::execute(&Client::new(), Request::new(reqwest::Method::GET, url))
            .await
            .unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reqwest_transport_with_http_request() {
        let mock_server = mock_server!(http::StatusCode::NO_CONTENT);
        let request = http::Request::get(mock_server.uri()).body(String::new()).unwrap();

        let response = Transport::execute(&Client::new(), request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_shared_transport() {
        let mock_server = mock_server!(http::StatusCode::ACCEPTED);
        let url = reqwest::Url::parse(&mock_server.uri()).unwrap();
        let client = Arc::new(Client::new());

        let response = Transport::execute(&client, Request::new(reqwest::Method::GET, url))
            .await
            .unwrap();
        assert_eq!(response.status(), http::StatusCode::ACCEPTED);
    }
}
