//! Error taxonomy shared by the normalizer, the poller and the action controllers.

use std::time::Duration;
use thiserror::Error;

/// Everything that can end an action without a usable result.
///
/// `Display` yields the text shown to the user, so remote and transport
/// variants render their message verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing selection or upload; handled locally, never reaches the network.
    #[error("{0}")]
    Precondition(String),

    /// Non-2xx response, or a task that settled in a failure state.
    #[error("{message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// Network failure or an unparseable body.
    #[error("{0}")]
    Transport(String),

    #[error("Task {task_id} did not finish within {waited:?}")]
    PollTimeout { task_id: String, waited: Duration },

    /// The owning action was torn down before it settled.
    #[error("Operation was cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Transport(format!("Malformed response body: {}", e))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
