//! `test-utils` is used for testing `hostgate-lib`.
//! This crate does not depend on `hostgate-lib`, else we would get dependency cycles.
//! Macros are used instead, so that the importer is responsible for providing the dependencies.

/// Create a mock web server, which responds with a predefined status when
/// handling a matching request
#[macro_export]
macro_rules! mock_server {
    ($status:expr $(, $func:tt ($($arg:expr),*))*) => {{
        let mock_server = wiremock::MockServer::start().await;
        let response_template = wiremock::ResponseTemplate::new(http::StatusCode::from($status));
        let template = response_template$(.$func($($arg),*))*;
        wiremock::Mock::given(wiremock::matchers::method("GET")).respond_with(template).mount(&mock_server).await;
        mock_server
    }};
}

/// Create a mock web server that must receive exactly `$expected` GET
/// requests. The expectation is verified when the server is dropped.
#[macro_export]
macro_rules! counting_mock_server {
    ($status:expr, $expected:expr) => {{
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(http::StatusCode::from($status)))
            .expect($expected)
            .mount(&mock_server)
            .await;
        mock_server
    }};
}

/// Build a `reqwest::Request` with the given method for a URL string
///
/// # Panic
///
/// This panics on invalid URLs, so it should only be used for testing
#[macro_export]
macro_rules! request {
    ($url:expr) => {
        $crate::request!(reqwest::Method::GET, $url)
    };
    ($method:expr, $url:expr) => {{
        let url = url::Url::parse(&$url).expect("Expected valid request URL");
        reqwest::Request::new($method, url)
    }};
}
