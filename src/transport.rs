// Transport layer: moves a fully built request over the wire
//
// The dispatcher only sees `Transport`, so it can run against reqwest in
// production and against the in-process mock in tests.

use crate::dispatcher::ApiError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use std::collections::BTreeMap;

// A request ready to send: absolute URL, merged headers, optional body
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    // Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// What came back, before any interpretation of the body
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    // Fails only when no response was obtained at all (DNS, refused, reset)
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, ApiError>;
}

/// Transport backed by a shared `reqwest::Client`.
///
/// No timeout or retry policy is configured; a request either resolves or
/// the platform eventually fails it.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, ApiError> {
        let mut builder = self.client.request(request.method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

// In-process backend stand-in for tests
#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    pub fn text(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            content_type: Some("text/plain;charset=UTF-8".to_string()),
            body: Bytes::from(body.to_string()),
        }
    }

    pub fn json(status: u16, value: serde_json::Value) -> RawResponse {
        RawResponse {
            status,
            content_type: Some("application/json".to_string()),
            body: Bytes::from(value.to_string()),
        }
    }

    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<VecDeque<Result<RawResponse, ApiError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond_with(&self, response: RawResponse) {
            self.responses.lock().push_back(Ok(response));
        }

        pub fn fail_with(&self, error: ApiError) {
            self.responses.lock().push_back(Err(error));
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<RawResponse, ApiError> {
            self.requests.lock().push(request);
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::NetworkError("connection refused".to_string())))
        }
    }
}
