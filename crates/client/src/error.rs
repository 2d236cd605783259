//! HTTP error type and the mapping from errors to user-facing messages.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling the marketplace API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}")]
    Status {
        status: StatusCode,
        /// Raw response body, kept for message extraction.
        body: String,
    },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status of a rejected request, if the server answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server rejected the session token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }
}

/// Turns request errors into the single message shown for a resource.
///
/// The server's error body shape is not fixed, so the fields searched are
/// configurable. Field names may be dotted to reach nested objects
/// (`error.message`). The first non-empty string wins; otherwise the
/// operation's fallback message is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessageMapping {
    fields: Vec<String>,
}

impl Default for ErrorMessageMapping {
    fn default() -> Self {
        Self::new(["message", "error.message", "error"])
    }
}

impl ErrorMessageMapping {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Message for `error`, preferring one supplied by the server.
    #[must_use]
    pub fn message_for(&self, error: &ApiError, fallback: &str) -> String {
        self.server_message(error)
            .unwrap_or_else(|| fallback.to_owned())
    }

    fn server_message(&self, error: &ApiError) -> Option<String> {
        let ApiError::Status { body, .. } = error else {
            return None;
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        self.fields.iter().find_map(|field| {
            field
                .split('.')
                .try_fold(&value, |node, key| node.get(key))
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .map(str::to_owned)
        })
    }
}
