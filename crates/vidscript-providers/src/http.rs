//! Shared JSON-over-HTTP plumbing for the generic adapters
//!
//! Every failure is mapped into the core error taxonomy here, so adapters
//! only deal with successful bodies. Vendor bodies end up in the technical
//! message and context, never in the user message.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;
use vidscript_core::Error;

/// Default per-request timeout of the HTTP adapters
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest vendor body excerpt kept in error context
const BODY_EXCERPT_LIMIT: usize = 512;

/// Build the client shared by all HTTP adapters
pub fn build_client() -> Result<Client, Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("vidscript/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)).with_cause(e))
}

/// One JSON endpoint of one provider
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    service: String,
    client: Client,
    url: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpEndpoint {
    /// Parse `endpoint` and bind it to `client`
    pub fn new(service: impl Into<String>, client: Client, endpoint: &str) -> Result<Self, Error> {
        let service = service.into();
        let url = Url::parse(endpoint).map_err(|e| {
            Error::configuration(format!("Invalid endpoint for {}: {}", service, e))
                .with_context("endpoint", endpoint)
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration(format!(
                "Endpoint for {} must be http or https, got '{}'",
                service,
                url.scheme()
            )));
        }

        Ok(Self {
            service,
            client,
            url,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Send `Authorization: Bearer <key>` with every request
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST a JSON body and decode a JSON response
    pub async fn post_json<T: DeserializeOwned>(&self, body: &Value) -> Result<T, Error> {
        let request = self.request().json(body);
        self.send(request).await
    }

    /// POST raw bytes and decode a JSON response
    pub async fn post_bytes<T: DeserializeOwned>(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<T, Error> {
        let request = self
            .request()
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        self.send(request).await
    }

    fn request(&self) -> RequestBuilder {
        let request = self.client.post(self.url.clone()).timeout(self.timeout);
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        debug!(service = %self.service, url = %self.url, "Sending provider request");

        let response = request
            .send()
            .await
            .map_err(|e| classify_request_error(&self.service, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(&self.service, status, retry_after, &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_request_error(&self.service, self.timeout, e))?;
        serde_json::from_str(&body).map_err(|e| {
            Error::parse(format!("{} response", self.service), Some(e.to_string().as_str()))
                .with_context("service", self.service.as_str())
                .with_context("body", excerpt(&body))
        })
    }
}

/// Map a transport failure into the taxonomy
pub fn classify_request_error(service: &str, timeout: Duration, error: reqwest::Error) -> Error {
    let mapped = if error.is_timeout() {
        Error::timeout(service, timeout.as_millis() as u64)
    } else if error.is_connect() {
        Error::network(format!("{}: connection failed: {}", service, error))
    } else if error.is_decode() || error.is_body() {
        Error::parse(format!("{} response", service), Some(error.to_string().as_str()))
    } else {
        Error::network(format!("{}: request failed: {}", service, error))
    };
    mapped.with_context("service", service).with_cause(error)
}

/// Map a non-success HTTP status into the taxonomy
pub fn classify_status(service: &str, status: StatusCode, retry_after: Option<u64>, body: &str) -> Error {
    let detail = provider_message(body);
    let code = status.as_u16();

    let error = match code {
        401 | 403 => Error::authentication(service, Some(detail.as_str())),
        429 => Error::rate_limit(service, retry_after),
        503 => Error::service_unavailable(service, Some(detail.as_str())),
        500..=599 => Error::service(
            "SERVICE_ERROR",
            service,
            format!("{} returned {}: {}", service, code, detail),
            "The upstream service failed. Please try again later.",
            Some(code),
            true,
        ),
        _ => Error::service(
            "SERVICE_ERROR",
            service,
            format!("{} rejected the request with {}: {}", service, code, detail),
            "The request could not be processed. Please check the input and try again.",
            Some(code),
            false,
        ),
    };

    if body.is_empty() {
        error
    } else {
        error.with_context("body", excerpt(body))
    }
}

/// `Retry-After` as whole seconds; HTTP dates are ignored
pub fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

/// Best-effort error message from a vendor body
fn provider_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let nested = json
            .get("error")
            .and_then(|error| error.get("message").or(Some(error)))
            .and_then(Value::as_str);
        let flat = json.get("message").and_then(Value::as_str);
        if let Some(message) = nested.or(flat) {
            return message.to_string();
        }
    }
    if body.is_empty() {
        "empty response body".to_string()
    } else {
        excerpt(body)
    }
}

fn excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LIMIT {
        return body.to_string();
    }
    let mut end = BODY_EXCERPT_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use vidscript_core::ErrorKind;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (401, ErrorKind::Authentication, false),
            (403, ErrorKind::Authentication, false),
            (429, ErrorKind::RateLimit, true),
            (503, ErrorKind::ServiceUnavailable, true),
            (500, ErrorKind::Service, true),
            (502, ErrorKind::Service, true),
            (400, ErrorKind::Service, false),
            (404, ErrorKind::Service, false),
        ];
        for (code, kind, retryable) in cases {
            let error = classify_status("TikHub", StatusCode::from_u16(code).unwrap(), None, "");
            assert_eq!(error.kind(), kind, "{}", code);
            assert_eq!(error.is_retryable(), retryable, "{}", code);
        }
    }

    #[test]
    fn test_rate_limit_carries_retry_after() {
        let error = classify_status("TikHub", StatusCode::TOO_MANY_REQUESTS, Some(12), "");
        assert_eq!(error.retry_after(), Some(12));
        assert_eq!(error.status_code(), Some(429));
    }

    #[test]
    fn test_vendor_body_stays_out_of_user_message() {
        let body = r#"{"error":{"message":"invalid token for TikHub account 42"}}"#;
        let error = classify_status("TikHub", StatusCode::BAD_REQUEST, None, body);
        assert!(error.message().contains("invalid token for TikHub account 42"));
        assert!(!error.user_message().contains("TikHub"));
        assert_eq!(error.context()["body"], body);
    }

    #[test]
    fn test_provider_message_formats() {
        assert_eq!(provider_message(r#"{"error":{"message":"a"}}"#), "a");
        assert_eq!(provider_message(r#"{"error":"b"}"#), "b");
        assert_eq!(provider_message(r#"{"message":"c"}"#), "c");
        assert_eq!(provider_message("plain"), "plain");
        assert_eq!(provider_message(""), "empty response body");
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_secs(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        assert_eq!(retry_after_secs(&headers), Some(30));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after_secs(&headers), None);
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let long = "转".repeat(400);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= BODY_EXCERPT_LIMIT + 3);
    }

    #[test]
    fn test_endpoint_validation() {
        let client = Client::new();
        assert!(HttpEndpoint::new("X", client.clone(), "https://api.example.com/v1").is_ok());
        assert!(HttpEndpoint::new("X", client.clone(), "not a url").is_err());
        assert_eq!(
            HttpEndpoint::new("X", client, "ftp://api.example.com").unwrap_err().code(),
            "CONFIGURATION_ERROR"
        );
    }
}
