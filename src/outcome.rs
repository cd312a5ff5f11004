//! Response decoding.
//!
//! Reduces the raw response body to a [`DecisionOutcome`]:
//!
//! - no body, or a body that is not a JSON object with a boolean `success`:
//!   [`DecisionError::ServiceUnavailable`] (`503` / `service unavailable`)
//! - `success: false` with a `<code>:<message>` reason: [`DecisionError::Rejected`]
//! - `success: false` with any other reason shape: [`DecisionError::MalformedReason`]
//! - `success: true`: approved

use serde::Serialize;
use serde_json::Value;

pub const SERVICE_UNAVAILABLE_CODE: &str = "503";
pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "service unavailable";
pub const PARSE_ERROR_CODE: &str = "parse_error";
pub const PARSE_ERROR_MESSAGE: &str = "malformed response";

/// Why a check was not approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionError {
    /// No interpretable answer from the service.
    ServiceUnavailable,
    /// The service rejected the event.
    Rejected { code: String, message: String },
    /// Rejection whose `reason_code` is not `<code>:<message>`.
    MalformedReason { reason_code: Option<String> },
}

impl DecisionError {
    pub fn code(&self) -> &str {
        match self {
            DecisionError::ServiceUnavailable => SERVICE_UNAVAILABLE_CODE,
            DecisionError::Rejected { code, .. } => code,
            DecisionError::MalformedReason { .. } => PARSE_ERROR_CODE,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DecisionError::ServiceUnavailable => SERVICE_UNAVAILABLE_MESSAGE,
            DecisionError::Rejected { message, .. } => message,
            DecisionError::MalformedReason { .. } => PARSE_ERROR_MESSAGE,
        }
    }
}

impl std::fmt::Display for DecisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Result of one risk check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionOutcome {
    pub success: bool,
    pub error: Option<DecisionError>,
    /// Decoded response body, when there was one.
    pub raw_result: Option<Value>,
}

impl DecisionOutcome {
    pub fn approved(raw_result: Value) -> Self {
        Self {
            success: true,
            error: None,
            raw_result: Some(raw_result),
        }
    }

    pub fn failed(error: DecisionError, raw_result: Option<Value>) -> Self {
        Self {
            success: false,
            error: Some(error),
            raw_result,
        }
    }

    pub fn service_unavailable() -> Self {
        Self::failed(DecisionError::ServiceUnavailable, None)
    }

    pub fn is_approved(&self) -> bool {
        self.success
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(DecisionError::code)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(DecisionError::message)
    }

    /// Decodes a transport result.
    pub fn from_body(body: Option<&str>) -> Self {
        let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
            return Self::service_unavailable();
        };

        let decoded: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Risk service response is not valid JSON: {}", e);
                return Self::service_unavailable();
            }
        };

        match decoded.get("success").and_then(Value::as_bool) {
            Some(true) => Self::approved(decoded),
            Some(false) => {
                let error = match decoded.get("reason_code").and_then(Value::as_str) {
                    Some(reason) => parse_reason_code(reason),
                    None => DecisionError::MalformedReason { reason_code: None },
                };
                Self::failed(error, Some(decoded))
            }
            None => {
                tracing::warn!("Risk service response has no boolean 'success' field");
                Self::failed(DecisionError::ServiceUnavailable, Some(decoded))
            }
        }
    }
}

/// Splits `<code>:<message>` on the first colon.
///
/// Both halves are kept exactly as received. Anything without a separator,
/// or with an empty code, is malformed.
pub fn parse_reason_code(reason: &str) -> DecisionError {
    match reason.split_once(':') {
        Some((code, message)) if !code.is_empty() => DecisionError::Rejected {
            code: code.to_string(),
            message: message.to_string(),
        },
        _ => {
            tracing::warn!("Malformed reason_code from risk service: {:?}", reason);
            DecisionError::MalformedReason {
                reason_code: Some(reason.to_string()),
            }
        }
    }
}
