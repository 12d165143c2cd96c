//! Manual fallback
//!
//! Once the adapter handshake fails the session hands the test to a human.
//! Each cause carries its own message so an operator can tell them apart.

use serde::Serialize;
use std::time::Duration;

use crate::protocol::StartReply;
use crate::transport::{ProtocolResponse, StatusError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    #[error("ATTA did not report a status")]
    MissingStatus,

    #[error("ATTA reported an error: {status_text}")]
    AdapterStatus { status_text: String },

    #[error("No API in response from ATTA")]
    MissingApi,

    #[error("Unknown AT API: {api}")]
    UnknownApi { api: String },

    #[error("No response from ATTA at {uri} within {timeout:?}")]
    NoResponse { uri: String, timeout: Duration },

    #[error("Could not connect to ATTA at {uri}")]
    Unreachable { uri: String },

    #[error("Error from ATTA: {status}: {status_text}")]
    HttpStatus { status: u16, status_text: String },
}

impl FallbackReason {
    /// Reason for a `/start` call that never got a usable answer
    pub fn unanswered(uri: &str, resp: &ProtocolResponse) -> Self {
        match resp.timeout {
            Some(timeout) => FallbackReason::NoResponse {
                uri: uri.to_string(),
                timeout,
            },
            None => FallbackReason::Unreachable {
                uri: uri.to_string(),
            },
        }
    }

    /// Reason for a `/start` call the adapter rejected
    pub fn rejected(err: StatusError) -> Self {
        FallbackReason::HttpStatus {
            status: err.status,
            status_text: err.status_text,
        }
    }

    /// Reason for a `/start` reply that was not a usable READY
    pub fn from_start_reply(reply: StartReply) -> Option<Self> {
        match reply {
            StartReply::Ready { .. } => None,
            StartReply::MissingStatus => Some(FallbackReason::MissingStatus),
            StartReply::MissingApi => Some(FallbackReason::MissingApi),
            StartReply::NotReady { status_text } => {
                Some(FallbackReason::AdapterStatus { status_text })
            }
        }
    }
}

/// Operator-facing notice for a fallback
pub fn notice(reason: &FallbackReason) -> String {
    format!("Automated run stopped, complete this test manually. {}", reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_messages_are_distinct() {
        let reasons = vec![
            FallbackReason::MissingStatus,
            FallbackReason::AdapterStatus { status_text: "busy".into() },
            FallbackReason::MissingApi,
            FallbackReason::UnknownApi { api: "AT-A".into() },
            FallbackReason::NoResponse {
                uri: "http://localhost:12345/ATTA".into(),
                timeout: Duration::from_millis(5000),
            },
            FallbackReason::Unreachable { uri: "http://localhost:12345/ATTA".into() },
            FallbackReason::HttpStatus { status: 503, status_text: "Service Unavailable".into() },
        ];
        let messages: HashSet<String> = reasons.iter().map(|r| notice(r)).collect();
        assert_eq!(messages.len(), reasons.len());
    }

    #[test]
    fn test_unknown_api_message() {
        let reason = FallbackReason::UnknownApi { api: "AT-A".into() };
        assert_eq!(reason.to_string(), "Unknown AT API: AT-A");
        assert!(notice(&reason).contains("Unknown AT API: AT-A"));
    }

    #[test]
    fn test_ready_is_not_a_fallback() {
        assert!(FallbackReason::from_start_reply(StartReply::Ready { api: "ATK".into() }).is_none());
        assert_eq!(
            FallbackReason::from_start_reply(StartReply::MissingApi),
            Some(FallbackReason::MissingApi)
        );
    }
}
