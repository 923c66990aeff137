//! Backend errors.

use thiserror::Error;
use trolley::payload::PayloadError;

/// Errors returned by a [`CartBackend`](super::CartBackend).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// No HTTP response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a 5xx status.
    #[error("server error ({status})")]
    Server {
        /// HTTP status code.
        status: u16,

        /// Message from the response body, if any.
        message: Option<String>,
    },

    /// The backend answered with 401.
    #[error("not signed in")]
    Unauthorized {
        /// Message from the response body, if any.
        message: Option<String>,
    },

    /// The backend answered with another non-2xx status.
    #[error("request rejected ({status})")]
    Client {
        /// HTTP status code.
        status: u16,

        /// Message from the response body, if any.
        message: Option<String>,
    },

    /// The backend answered 2xx with `success: false`.
    #[error("request was not successful")]
    Rejected {
        /// Message from the response body, if any.
        message: Option<String>,
    },

    /// The response body could not be read.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Classify a non-2xx status.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 => Self::Unauthorized { message },
            500.. => Self::Server { status, message },
            _ => Self::Client { status, message },
        }
    }

    /// Whether another attempt could succeed: transport failures and 5xx responses.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server { .. })
    }

    /// Whether the backend refused the request for lack of a session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Text to show the user.
    ///
    /// Client-side rejections carry the backend's message verbatim. Everything else, and
    /// rejections without a message, fall back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Unauthorized { message }
            | Self::Client { message, .. }
            | Self::Rejected { message } => message
                .as_deref()
                .filter(|message| !message.trim().is_empty())
                .unwrap_or(fallback)
                .to_string(),
            Self::Transport(_) | Self::Server { .. } | Self::Decode(_) => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return Self::Decode(error.to_string());
        }

        match error.status() {
            Some(status) => Self::from_status(status.as_u16(), None),
            None => Self::Transport(error.to_string()),
        }
    }
}

impl From<PayloadError> for BackendError {
    fn from(error: PayloadError) -> Self {
        match error {
            PayloadError::Unsuccessful(message) => Self::Rejected { message },
            PayloadError::Malformed(_) | PayloadError::MissingData => {
                Self::Decode(error.to_string())
            }
        }
    }
}
