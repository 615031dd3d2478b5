use thiserror::Error;

/// Failure categories shared by the dispatcher and the archiver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// A lookup the handler depends on returned no resources.
    #[error("{0}")]
    NotFound(String),

    /// The control plane (or a download link) answered with a non-success status,
    /// or the request never completed. `status` is `None` for transport failures.
    #[error("{}", upstream_message(.target, .status, .message))]
    Upstream {
        target: String,
        status: Option<u16>,
        message: String,
    },

    #[error("malformed response from {target}: {message}")]
    MalformedResponse { target: String, message: String },

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("failed to write object '{key}': {message}")]
    Storage { key: String, message: String },
}

impl HandlerError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn upstream(target: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            target: target.into(),
            status,
            message: message.into(),
        }
    }

    pub fn malformed(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Stable label used in response bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Upstream { .. } => "upstream_error",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::InvalidEvent(_) => "invalid_event",
            Self::Storage { .. } => "storage_error",
        }
    }
}

fn upstream_message(target: &str, status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("request to {target} failed with status {code}: {message}"),
        None => format!("request to {target} failed: {message}"),
    }
}
