use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KikError>;

/// Error body returned by the Kik API on any non-200 response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Short error code, e.g. `not_authorized`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message.as_deref().unwrap_or_default())
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Error)]
pub enum KikError {
    /// The request never completed: connection, DNS, or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The platform answered with a non-200 status and a readable error body.
    #[error("{error}")]
    Platform {
        status: u16,
        #[source]
        error: ApiError,
    },

    #[error("failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The platform answered with a non-200 status whose body is not an error record.
    #[error("undecodable error body (status {status}): {source}")]
    ErrorBody {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode JSON: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to read webhook body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("cannot send {len} messages at once (limit is {limit})")]
    BatchTooLarge { len: usize, limit: usize },
}

impl KikError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::BodyRead(_))
    }

    pub fn is_platform(&self) -> bool {
        matches!(self, Self::Platform { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::ErrorBody { .. })
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Platform { error, .. } => Some(error),
            _ => None,
        }
    }

    /// HTTP status of the failed exchange, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Platform { status, .. } | Self::ErrorBody { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
