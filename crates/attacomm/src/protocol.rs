//! ATTA wire messages and their typed interpretation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::{ProtocolResponse, TransportResult};

/// Status an adapter reports when it is ready to receive assertions
pub const STATUS_READY: &str = "READY";

/// Body of `POST /start`
#[derive(Debug, Clone, Serialize)]
pub struct StartRequest<'a> {
    pub test: &'a str,
    pub title: &'a str,
}

/// Body of a `/start` reply
#[derive(Debug, Clone, Default)]
pub struct StartResponse {
    pub status: Option<String>,
    pub api: Option<String>,
    pub status_text: Option<String>,
}

/// What a `/start` reply means for the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartReply {
    Ready { api: String },
    NotReady { status_text: String },
    MissingStatus,
    MissingApi,
}

impl StartResponse {
    /// Read a reply body field by field.
    ///
    /// A missing or malformed body reads as empty; a field of the wrong type
    /// reads as absent without hiding the others.
    pub fn from_body(body: Option<&Value>) -> Self {
        let Some(body) = body else {
            return Self::default();
        };
        Self {
            status: string_field(body, "status"),
            api: string_field(body, "API"),
            status_text: string_field(body, "statusText"),
        }
    }

    pub fn classify(self) -> StartReply {
        match (self.status, self.api) {
            (None, _) => StartReply::MissingStatus,
            (Some(status), _) if status != STATUS_READY => StartReply::NotReady {
                status_text: self.status_text.unwrap_or(status),
            },
            (Some(_), None) => StartReply::MissingApi,
            (Some(_), Some(api)) => StartReply::Ready { api },
        }
    }
}

/// Body of a `/test` reply
#[derive(Debug, Clone, Default)]
pub struct TestResponse {
    pub result: Option<String>,
    pub message: Option<String>,
}

impl TestResponse {
    /// Read a reply body field by field; a non-string `message` is kept as
    /// its JSON text
    pub fn from_body(body: &Value) -> Self {
        let message = match body.get("message") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        };
        Self {
            result: string_field(body, "result"),
            message,
        }
    }
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeKind {
    Pass,
    Fail,
    Error,
}

/// Result of one assertion, indexed from 1 within its API's sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub index: usize,
    pub kind: OutcomeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OutcomeRecord {
    pub fn pass(index: usize) -> Self {
        Self {
            index,
            kind: OutcomeKind::Pass,
            message: None,
        }
    }

    pub fn fail(index: usize, detail: &str) -> Self {
        Self {
            index,
            kind: OutcomeKind::Fail,
            message: Some(format!("{}: {}", index, detail)),
        }
    }

    pub fn error(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            kind: OutcomeKind::Error,
            message: Some(message.into()),
        }
    }

    /// Classify the settled `/test` call for assertion `index`
    pub fn from_reply(index: usize, reply: TransportResult) -> Self {
        match reply {
            Ok(resp) => Self::from_response(index, &resp),
            Err(e) => Self::fail(index, &e.status_text),
        }
    }

    fn from_response(index: usize, resp: &ProtocolResponse) -> Self {
        let Some(body) = &resp.body else {
            let reason = if let Some(timeout) = resp.timeout {
                format!("no response within {:?}", timeout)
            } else if resp.is_unanswered() {
                "no response from ATTA".to_string()
            } else {
                "malformed response from ATTA".to_string()
            };
            return Self::error(index, reason);
        };

        let reply = TestResponse::from_body(body);
        let message = reply.message.unwrap_or_default();
        match reply.result.as_deref() {
            Some("PASS") => Self::pass(index),
            Some("FAIL") => Self::fail(index, &message),
            Some("ERROR") => Self::error(index, message),
            Some(other) => Self::error(index, format!("unexpected result '{}'", other)),
            None => Self::error(index, "ATTA did not report a result"),
        }
    }
}
