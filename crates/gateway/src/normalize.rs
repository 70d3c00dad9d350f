//! Folds every outcome of an attempt into one [`SubmissionResult`].

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::{ErrorKind, SubmissionError};
use crate::transport::{HttpReply, TransportError};

lazy_static! {
    static ref CORRELATION_ID: Regex =
        Regex::new(r"(?i)correlation:?\s*([a-f0-9-]+)").expect("hard-coded pattern");
}

/// Response body every destination API answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ApiResponse {
    /// Reads a 2xx reply, falling back to the HTTP status for missing fields.
    pub fn from_reply(reply: &HttpReply) -> Self {
        let body = &reply.body;
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| body.as_str().filter(|text| !text.is_empty()))
            .map_or_else(|| status_text(reply.status), str::to_string);
        let status_code = body
            .get("status_code")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(reply.status);

        Self {
            message,
            status_code,
            correlation_id: string_field(body, "correlation_id"),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.status_code, 200..=299)
    }
}

/// The one outcome shape handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub raw_details: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl SubmissionResult {
    pub fn failure(kind: ErrorKind, message: impl Into<String>, raw_details: Value) -> Self {
        Self {
            success: false,
            message: message.into(),
            correlation_id: None,
            raw_details,
            error_kind: Some(kind),
        }
    }
}

impl From<SubmissionError> for SubmissionResult {
    fn from(error: SubmissionError) -> Self {
        let kind = error.kind();
        let message = error.to_string();
        match error {
            SubmissionError::Transport(transport) => normalize(Err(transport)),
            SubmissionError::Validation(diagnostic) => Self::failure(
                kind,
                message,
                serde_json::to_value(&diagnostic).unwrap_or(Value::Null),
            ),
            _ => Self::failure(kind, message.clone(), json!({ "error": message })),
        }
    }
}

fn status_text(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map_or_else(|| format!("HTTP {status}"), str::to_string)
}

fn string_field(body: &Value, name: &str) -> Option<String> {
    body.as_object()?
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn correlation_in(text: &str) -> Option<String> {
    CORRELATION_ID
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

/// Any JSON error body is kept as-is unless the server labelled it `text/plain`.
fn json_error_body(content_type: Option<&str>, body: &str) -> Option<Value> {
    if content_type.is_some_and(|ct| ct.starts_with("text/plain")) {
        return None;
    }
    serde_json::from_str::<Value>(body).ok()
}

pub fn normalize(outcome: Result<HttpReply, TransportError>) -> SubmissionResult {
    match outcome {
        Ok(reply) => {
            let response = ApiResponse::from_reply(&reply);
            let success = response.is_success();
            if success {
                info!("Submission accepted: {}", response.message);
            } else {
                warn!("Submission answered with status code {}", response.status_code);
            }

            SubmissionResult {
                success,
                message: response.message,
                correlation_id: response.correlation_id,
                raw_details: reply.body,
                error_kind: (!success).then_some(ErrorKind::Transport),
            }
        }

        Err(TransportError::Status {
            status,
            content_type,
            body: Some(body),
        }) => {
            if let Some(details) = json_error_body(content_type.as_deref(), &body) {
                let message = string_field(&details, "message")
                    .unwrap_or_else(|| status_text(status));
                let correlation_id = string_field(&details, "correlation_id");

                SubmissionResult {
                    correlation_id,
                    ..SubmissionResult::failure(ErrorKind::Transport, message, details)
                }
            } else {
                let correlation_id = correlation_in(&body);
                let message = if status == 401 {
                    "Unauthorized".to_string()
                } else {
                    status_text(status)
                };

                SubmissionResult {
                    correlation_id: correlation_id.clone(),
                    ..SubmissionResult::failure(
                        ErrorKind::Transport,
                        message,
                        json!({
                            "status_code": status,
                            "error": body,
                            "correlation_id": correlation_id,
                        }),
                    )
                }
            }
        }

        Err(TransportError::Status {
            status, body: None, ..
        }) => SubmissionResult::failure(
            ErrorKind::Transport,
            format!("HTTP {status}"),
            json!({ "status_code": status }),
        ),

        Err(error @ (TransportError::Network { .. } | TransportError::Client { .. })) => {
            let message = error.to_string();
            SubmissionResult::failure(
                ErrorKind::Transport,
                message.clone(),
                json!({ "error": message }),
            )
        }
    }
}
