//! API Error Types
//!
//! Classifies everything that can go wrong between issuing a request and
//! holding a typed payload: transport failures, non-success statuses and
//! undecodable bodies.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error body returned by the backend
///
/// Every non-2xx response carries `{"type": ..., "message": ...}`, with an
/// optional `details` for authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Errors produced by [`ApiClient`](super::ApiClient) calls
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request did not complete in time
    #[error("Request timeout")]
    Timeout,

    /// The backend could not be reached at all
    #[error("Backend unavailable")]
    Unavailable,

    /// Any other transport-level failure
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("API error {status}: {}", describe(.body, .raw))]
    Status {
        status: StatusCode,
        body: Option<ErrorBody>,
        raw: String,
    },

    /// The response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// The configured base URL cannot be used to build request URLs
    #[error("Invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

fn describe(body: &Option<ErrorBody>, raw: &str) -> String {
    match body {
        Some(body) => match &body.details {
            Some(details) => format!("{} ({}): {}", body.message, body.kind, details),
            None => format!("{} ({})", body.message, body.kind),
        },
        None if raw.is_empty() => "no response body".to_string(),
        None => raw.to_string(),
    }
}

impl ApiError {
    /// Classify a reqwest failure the same way for every call
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Unavailable
        } else {
            ApiError::Transport(err)
        }
    }

    /// Build a status error from the response text, keeping the structured
    /// body when it parses
    pub(crate) fn from_status(status: StatusCode, raw: String) -> Self {
        let body = serde_json::from_str::<ErrorBody>(&raw).ok();
        ApiError::Status { status, body, raw }
    }

    /// HTTP status, if the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error `type` reported by the server, e.g. `"UserExists"`
    pub fn kind(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                body: Some(body), ..
            } => Some(body.kind.as_str()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(StatusCode::FORBIDDEN)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT)
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
