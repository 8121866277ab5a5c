// Request dispatcher: every backend call goes through `Dispatcher::request`
//
// It builds the request against the configured base URL, classifies the
// response body as JSON or text from its content-type, and turns non-2xx
// responses into a uniform `ApiError::HttpError`.

use crate::config::{ClientConfig, ClientError};
use crate::transport::{HttpRequest, RawResponse, Transport};
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Error, Debug, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP error: {status_code} - {message}")]
    HttpError { status_code: u16, message: String },

    #[error("Invalid JSON in response: {0}")]
    InvalidJson(String),

    #[error("Could not serialize request body: {0}")]
    Serialization(String),
}

impl ApiError {
    // Text suitable for showing inline next to a form
    pub fn user_message(&self) -> String {
        match self {
            ApiError::HttpError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// A classified response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseResult {
    Json(Value),
    Text(String),
}

impl ResponseResult {
    /// Classify a raw body by its declared content-type. Anything that does
    /// not mention `application/json` (including a missing header) is text.
    pub fn from_raw(response: &RawResponse) -> Result<Self, ApiError> {
        let is_json = response
            .content_type
            .as_deref()
            .map_or(false, |ct| ct.contains(JSON_CONTENT_TYPE));

        if is_json {
            serde_json::from_slice(&response.body)
                .map(ResponseResult::Json)
                .map_err(|e| ApiError::InvalidJson(e.to_string()))
        } else {
            Ok(ResponseResult::Text(
                String::from_utf8_lossy(&response.body).into_owned(),
            ))
        }
    }

    // Message for a failed response: text body as-is, else a usable `message`
    // field of a JSON object, else `HTTP <status>`
    pub fn error_message(&self, status: u16) -> String {
        match self {
            ResponseResult::Text(text) => text.clone(),
            ResponseResult::Json(Value::Object(map)) => map
                .get("message")
                .and_then(message_text)
                .unwrap_or_else(|| format!("HTTP {}", status)),
            ResponseResult::Json(_) => format!("HTTP {}", status),
        }
    }

    /// Flatten to a string: text and JSON strings pass through, any other
    /// JSON value is compactly encoded.
    pub fn stringify(&self) -> String {
        match self {
            ResponseResult::Text(text) => text.clone(),
            ResponseResult::Json(Value::String(text)) => text.clone(),
            ResponseResult::Json(value) => value.to_string(),
        }
    }
}

// Empty strings, null, false and zero count as no message; other scalars
// are shown in their text form
fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

// Per-call options; headers here override the defaults
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            body: Some(body.into()),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

pub struct Dispatcher<T: Transport> {
    base_url: String,
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(config: ClientConfig, transport: T) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url,
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // Base URL and endpoint are concatenated; a single trailing slash on the
    // base is dropped so "http://host/" + "/api" stays well formed
    pub fn url_for(&self, endpoint: &str) -> String {
        let base = self.base_url.strip_suffix('/').unwrap_or(&self.base_url);
        format!("{}{}", base, endpoint)
    }

    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ResponseResult, ApiError> {
        let request = self.build(endpoint, options);
        let method = request.method.clone();
        let url = request.url.clone();

        let result = self.execute(request).await;
        if let Err(ref error) = result {
            tracing::error!(%method, %url, error = %error, "API error");
        }
        result
    }

    fn build(&self, endpoint: &str, options: RequestOptions) -> HttpRequest {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());

        for (name, value) in options.headers {
            headers.retain(|existing: &String, _| !existing.eq_ignore_ascii_case(&name));
            headers.insert(name, value);
        }

        HttpRequest {
            method: options.method,
            url: self.url_for(endpoint),
            headers,
            body: options.body,
        }
    }

    async fn execute(&self, request: HttpRequest) -> Result<ResponseResult, ApiError> {
        tracing::debug!(method = %request.method, url = %request.url, "dispatching request");

        let response = self.transport.send(request).await?;
        let parsed = ResponseResult::from_raw(&response)?;

        if !response.is_success() {
            return Err(ApiError::HttpError {
                status_code: response.status,
                message: parsed.error_message(response.status),
            });
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{self, MockTransport};
    use bytes::Bytes;
    use serde_json::json;
    use test_case::test_case;
    use tokio_test::{assert_err, assert_ok};

    fn dispatcher(base_url: &str) -> Dispatcher<MockTransport> {
        Dispatcher::new(ClientConfig::new(base_url), MockTransport::new()).unwrap()
    }

    fn raw(status: u16, content_type: Option<&str>, body: &str) -> RawResponse {
        RawResponse {
            status,
            content_type: content_type.map(str::to_string),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_new_rejects_invalid_base_url() {
        let result = Dispatcher::new(ClientConfig::new("nowhere"), MockTransport::new());
        assert!(matches!(result, Err(ClientError::ConfigError(_))));
    }

    #[test_case("http://localhost:9000", "/api/hotels", "http://localhost:9000/api/hotels" ; "plain")]
    #[test_case("http://localhost:9000/", "/api/hotels", "http://localhost:9000/api/hotels" ; "trailing slash")]
    #[test_case("https://example.com/travel", "/api/booking/7", "https://example.com/travel/api/booking/7" ; "base with path")]
    fn test_url_for(base_url: &str, endpoint: &str, expected: &str) {
        assert_eq!(dispatcher(base_url).url_for(endpoint), expected);
    }

    #[test_case(Some("application/json") ; "exact")]
    #[test_case(Some("application/json; charset=utf-8") ; "with charset")]
    #[test_case(Some("application/problem+json, application/json") ; "listed")]
    fn test_json_content_types_parse_as_json(content_type: Option<&str>) {
        let parsed = ResponseResult::from_raw(&raw(200, content_type, r#"{"id":1}"#)).unwrap();
        assert_eq!(parsed, ResponseResult::Json(json!({"id": 1})));
    }

    #[test_case(None ; "missing")]
    #[test_case(Some("") ; "empty")]
    #[test_case(Some("text/plain") ; "text")]
    #[test_case(Some("text/html; charset=utf-8") ; "html")]
    #[test_case(Some("application/problem+json") ; "problem json")]
    #[test_case(Some("APPLICATION/JSON") ; "upper case")]
    fn test_other_content_types_are_text(content_type: Option<&str>) {
        let parsed = ResponseResult::from_raw(&raw(200, content_type, r#"{"id":1}"#)).unwrap();
        assert_eq!(parsed, ResponseResult::Text(r#"{"id":1}"#.to_string()));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let result = ResponseResult::from_raw(&raw(200, Some("application/json"), "{oops"));
        assert!(matches!(result, Err(ApiError::InvalidJson(_))));
    }

    #[test_case(ResponseResult::Text("Email already exists".into()), "Email already exists" ; "text body")]
    #[test_case(ResponseResult::Text(String::new()), "" ; "empty text body")]
    #[test_case(ResponseResult::Json(json!({"message": "Bad phone"})), "Bad phone" ; "json message")]
    #[test_case(ResponseResult::Json(json!({"error": "nope"})), "HTTP 422" ; "json without message")]
    #[test_case(ResponseResult::Json(json!({"message": 42})), "42" ; "numeric message")]
    #[test_case(ResponseResult::Json(json!({"message": true})), "true" ; "boolean message")]
    #[test_case(ResponseResult::Json(json!({"message": ""})), "HTTP 422" ; "empty message")]
    #[test_case(ResponseResult::Json(json!({"message": null})), "HTTP 422" ; "null message")]
    #[test_case(ResponseResult::Json(json!({"message": false})), "HTTP 422" ; "false message")]
    #[test_case(ResponseResult::Json(json!({"message": 0})), "HTTP 422" ; "zero message")]
    #[test_case(ResponseResult::Json(json!({"message": {"code": 1}})), "HTTP 422" ; "object message")]
    #[test_case(ResponseResult::Json(json!(["a", "b"])), "HTTP 422" ; "json array")]
    #[test_case(ResponseResult::Json(json!("plain")), "HTTP 422" ; "json string")]
    #[test_case(ResponseResult::Json(json!(null)), "HTTP 422" ; "json null")]
    fn test_error_message_extraction(parsed: ResponseResult, expected: &str) {
        assert_eq!(parsed.error_message(422), expected);
    }

    #[test]
    fn test_stringify() {
        assert_eq!(ResponseResult::Text("ok".into()).stringify(), "ok");
        assert_eq!(ResponseResult::Json(json!("User registered")).stringify(), "User registered");
        assert_eq!(
            ResponseResult::Json(json!({"status": "success"})).stringify(),
            r#"{"status":"success"}"#
        );
        assert_eq!(ResponseResult::Json(json!([1, 2])).stringify(), "[1,2]");
    }

    #[tokio::test]
    async fn test_request_sends_default_json_header() {
        let dispatcher = dispatcher("http://localhost:9000");
        dispatcher.transport().respond_with(mock::json(200, json!([])));

        let result = dispatcher.request("/api/hotels", RequestOptions::get()).await;
        assert_eq!(assert_ok!(result), ResponseResult::Json(json!([])));

        let requests = dispatcher.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].url, "http://localhost:9000/api/hotels");
        assert_eq!(requests[0].header("Content-Type"), Some("application/json"));
        assert_eq!(requests[0].body, None);
    }

    #[tokio::test]
    async fn test_caller_headers_override_defaults() {
        let dispatcher = dispatcher("http://localhost:9000");
        dispatcher.transport().respond_with(mock::text(200, "ok"));

        let options = RequestOptions::post("name=A")
            .header("content-type", "application/x-www-form-urlencoded")
            .header("Authorization", "Bearer t0k3n");
        assert_ok!(dispatcher.request("/api/booking", options).await);

        let request = &dispatcher.transport().requests()[0];
        assert_eq!(request.headers.len(), 2);
        assert_eq!(
            request.header("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(request.header("authorization"), Some("Bearer t0k3n"));
        assert_eq!(request.body.as_deref(), Some("name=A"));
    }

    #[tokio::test]
    async fn test_success_text_is_returned() {
        let dispatcher = dispatcher("http://localhost:9000");
        dispatcher
            .transport()
            .respond_with(mock::text(201, "Registration success"));

        let result = dispatcher
            .request("/api/user/register", RequestOptions::post("{}"))
            .await;
        assert_eq!(
            assert_ok!(result),
            ResponseResult::Text("Registration success".to_string())
        );
    }

    #[tokio::test]
    async fn test_error_status_with_json_message() {
        let dispatcher = dispatcher("http://localhost:9000");
        dispatcher
            .transport()
            .respond_with(mock::json(409, json!({"message": "Email already exists"})));

        let error = assert_err!(
            dispatcher
                .request("/api/user/register", RequestOptions::post("{}"))
                .await
        );
        assert_eq!(
            error,
            ApiError::HttpError {
                status_code: 409,
                message: "Email already exists".to_string(),
            }
        );
        assert_eq!(error.user_message(), "Email already exists");
    }

    #[tokio::test]
    async fn test_error_status_with_text_body() {
        let dispatcher = dispatcher("http://localhost:9000");
        dispatcher
            .transport()
            .respond_with(mock::text(500, "Internal Server Error"));

        let error = assert_err!(dispatcher.request("/api/booking", RequestOptions::get()).await);
        assert_eq!(error.user_message(), "Internal Server Error");
    }

    #[tokio::test]
    async fn test_error_status_with_array_body_falls_back_to_status() {
        let dispatcher = dispatcher("http://localhost:9000");
        dispatcher
            .transport()
            .respond_with(mock::json(404, json!(["not", "found"])));

        let error = assert_err!(dispatcher.request("/api/hotels/9", RequestOptions::get()).await);
        assert_eq!(
            error,
            ApiError::HttpError {
                status_code: 404,
                message: "HTTP 404".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let dispatcher = dispatcher("http://localhost:9000");
        dispatcher
            .transport()
            .fail_with(ApiError::NetworkError("dns error".to_string()));

        let error = assert_err!(dispatcher.request("/api/hotels", RequestOptions::get()).await);
        assert_eq!(error, ApiError::NetworkError("dns error".to_string()));
        assert_eq!(error.user_message(), "Network error: dns error");
    }

    #[tokio::test]
    async fn test_malformed_error_body_reports_invalid_json() {
        let dispatcher = dispatcher("http://localhost:9000");
        dispatcher.transport().respond_with(RawResponse {
            status: 502,
            content_type: Some("application/json".to_string()),
            body: Bytes::from_static(b"<html>Bad Gateway</html>"),
        });

        let error = assert_err!(dispatcher.request("/api/hotels", RequestOptions::get()).await);
        assert!(matches!(error, ApiError::InvalidJson(_)));
    }
}
