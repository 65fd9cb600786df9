//! Unified client-side error model.
//! Every API outcome the gateway cannot turn into a success resolves to one of
//! these variants; stores and view-models decide whether a given failure is
//! silent (expected absence of a session), page-level, or per-item.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiError {
    /// Transport never reached the server or the response never arrived.
    Network { code: String, message: String },
    /// 401: no valid session. Expected during startup checks and after expiry.
    Unauthorized { code: String, message: String },
    /// 403: authenticated but lacking privilege. Distinct from Unauthorized.
    Forbidden { code: String, message: String },
    /// 400: server-reported validation failure, message shown verbatim.
    Validation { code: String, message: String },
    NotFound { code: String, message: String },
    /// 409: duplicate enrollment and similar conflicts.
    Conflict { code: String, message: String },
    Server { code: String, message: String },
}

impl ApiError {
    pub fn code_str(&self) -> &str {
        match self {
            ApiError::Network { code, .. }
            | ApiError::Unauthorized { code, .. }
            | ApiError::Forbidden { code, .. }
            | ApiError::Validation { code, .. }
            | ApiError::NotFound { code, .. }
            | ApiError::Conflict { code, .. }
            | ApiError::Server { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Network { message, .. }
            | ApiError::Unauthorized { message, .. }
            | ApiError::Forbidden { message, .. }
            | ApiError::Validation { message, .. }
            | ApiError::NotFound { message, .. }
            | ApiError::Conflict { message, .. }
            | ApiError::Server { message, .. } => message.as_str(),
        }
    }

    pub fn network<S: Into<String>>(code: S, msg: S) -> Self { ApiError::Network { code: code.into(), message: msg.into() } }
    pub fn unauthorized<S: Into<String>>(code: S, msg: S) -> Self { ApiError::Unauthorized { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { ApiError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn validation<S: Into<String>>(code: S, msg: S) -> Self { ApiError::Validation { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { ApiError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict<S: Into<String>>(code: S, msg: S) -> Self { ApiError::Conflict { code: code.into(), message: msg.into() } }
    pub fn server<S: Into<String>>(code: S, msg: S) -> Self { ApiError::Server { code: code.into(), message: msg.into() } }

    /// Classify a non-success HTTP status, carrying the server's message through.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => ApiError::Validation { code: "validation".into(), message },
            401 => ApiError::Unauthorized { code: "unauthorized".into(), message },
            403 => ApiError::Forbidden { code: "forbidden".into(), message },
            404 => ApiError::NotFound { code: "not_found".into(), message },
            409 => ApiError::Conflict { code: "conflict".into(), message },
            _ => ApiError::Server { code: format!("http_{}", status), message },
        }
    }

    /// True for the 401 family: an absent or expired session, handled as an
    /// implicit logout rather than a displayed error.
    pub fn is_session_expiry(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // Anything reqwest itself reports (connect, timeout, body decode) is a
        // transport-level failure; retry is the user's choice, never automatic.
        ApiError::Network { code: "network".into(), message: err.to_string() }
    }
}
