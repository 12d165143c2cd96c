//! HTTP transport to the adapter
//!
//! Every call resolves to a [`ProtocolResponse`], including timeouts and
//! connection failures (status `0`). The only rejection is an HTTP status
//! outside `200..300`, reported as a [`StatusError`].

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AttaResult;

/// Body of an outgoing request
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Serialized to JSON text before sending
    Json(Value),
    /// Sent verbatim
    Text(String),
}

impl RequestBody {
    pub fn json<T: Serialize>(value: &T) -> AttaResult<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    fn into_text(self) -> String {
        match self {
            RequestBody::Json(value) => value.to_string(),
            RequestBody::Text(text) => text,
        }
    }
}

/// Normalized result of one transport call
#[derive(Debug, Clone)]
pub struct ProtocolResponse {
    pub method: Method,
    pub url: String,
    /// Response headers; `None` when no response arrived
    pub headers: Option<HeaderMap>,
    /// HTTP status, `0` when no response arrived
    pub status: u16,
    pub status_text: String,
    /// Raw response text
    pub text: String,
    /// Parsed JSON body; `None` when parsing was not requested or failed
    pub body: Option<Value>,
    /// Set to the configured timeout when the call timed out
    pub timeout: Option<Duration>,
}

impl ProtocolResponse {
    fn unanswered(method: Method, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            headers: None,
            status: 0,
            status_text: String::new(),
            text: String::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn timed_out(&self) -> bool {
        self.timeout.is_some()
    }

    /// True when the adapter never answered (timeout or connection failure)
    pub fn is_unanswered(&self) -> bool {
        self.status == 0
    }
}

/// Rejection for a response outside the success range
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {status_text}")]
pub struct StatusError {
    pub status: u16,
    pub status_text: String,
}

pub type TransportResult = Result<ProtocolResponse, StatusError>;

/// HTTP client with one timeout governing every call
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    timeout: Duration,
}

impl Transport {
    pub fn new(timeout: Duration) -> AttaResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn get(&self, url: &str) -> TransportResult {
        self.request(Method::GET, url, None, None, true).await
    }

    pub async fn post(&self, url: &str, body: RequestBody) -> TransportResult {
        self.request(Method::POST, url, None, Some(body), true).await
    }

    /// Issue one request.
    ///
    /// `headers` are applied in order before sending. With `parse_json`
    /// the response text is parsed into `body`, and a parse failure leaves
    /// `body` empty rather than failing the call.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        headers: Option<&[(String, String)]>,
        body: Option<RequestBody>,
        parse_json: bool,
    ) -> TransportResult {
        debug!("{} {}", method, url);
        let mut resp = ProtocolResponse::unanswered(method.clone(), url);

        let mut builder = self.client.request(method, url);
        if let Some(headers) = headers {
            let mut map = HeaderMap::new();
            for (name, value) in headers {
                match (
                    HeaderName::from_bytes(name.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    (Ok(name), Ok(value)) => {
                        map.append(name, value);
                    }
                    _ => {
                        warn!("Dropping invalid request header {:?}", name);
                    }
                }
            }
            builder = builder.headers(map);
        }
        if let Some(body) = body {
            builder = builder.body(body.into_text());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return Ok(self.unanswered(resp, e)),
        };

        let status = response.status();
        resp.status = status.as_u16();
        resp.status_text = status.canonical_reason().unwrap_or_default().to_string();

        if !status.is_success() {
            debug!("{} {} -> {}", resp.method, resp.url, resp.status);
            return Err(StatusError {
                status: resp.status,
                status_text: resp.status_text,
            });
        }

        resp.headers = Some(response.headers().clone());
        match response.text().await {
            Ok(text) => resp.text = text,
            Err(e) => {
                resp.status = 0;
                resp.headers = None;
                return Ok(self.unanswered(resp, e));
            }
        }

        if parse_json {
            resp.body = serde_json::from_str(&resp.text).ok();
        }

        debug!("{} {} -> {}", resp.method, resp.url, resp.status);
        Ok(resp)
    }

    fn unanswered(&self, mut resp: ProtocolResponse, err: reqwest::Error) -> ProtocolResponse {
        if err.is_timeout() {
            debug!("{} {} timed out after {:?}", resp.method, resp.url, self.timeout);
            resp.timeout = Some(self.timeout);
        } else {
            debug!("{} {} failed: {}", resp.method, resp.url, err);
        }
        resp
    }
}
