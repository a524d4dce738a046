use thiserror::Error;

/// Classified API Gateway failures.
///
/// Classification happens once, at the gateway boundary; callers branch on
/// the variant and surface the detail unchanged.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// HTTP 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// HTTP 5xx.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other HTTP 4xx, including locally rejected input.
    #[error("request error ({status}): {message}")]
    Request { status: u16, message: String },

    /// Transport failure, no response received.
    #[error("network error: {0}")]
    Network(String),

    /// Federated credential payload is structurally malformed. Non-fatal:
    /// decoding is diagnostic only and never blocks a sign-in attempt.
    #[error("credential decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify an HTTP status with the message mined from the error body.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            404 => Self::NotFound(message),
            s if s >= 500 => Self::Server { status: s, message },
            s => Self::Request { status: s, message },
        }
    }

    /// A request rejected before it reaches the wire.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Request {
            status: 400,
            message: message.into(),
        }
    }

    /// Notification title for this class of failure, matching what the UI
    /// shows the user.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Not Found",
            Self::Server { .. } => "Server Error",
            Self::Request { .. } => "Request Error",
            Self::Network(_) | Self::Decode(_) => "Error",
        }
    }

    /// The bare message, without the classification prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::NotFound(message)
            | Self::Server { message, .. }
            | Self::Request { message, .. }
            | Self::Network(message)
            | Self::Decode(message) => message,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
