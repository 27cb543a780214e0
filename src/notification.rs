use crate::error::{ClientError, DEFAULT_ERROR_MESSAGE};

pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to reach the server. Please check your connection and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// Content of a user-facing notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(level: Level, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Level::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Level::Error, title, message)
    }

    /// Notice for a failed operation. Authentication failures have none:
    /// the redirect to login already tells the user.
    pub fn from_error(error: &ClientError) -> Option<Self> {
        let notification = match error {
            ClientError::Auth(_) => return None,
            ClientError::Validation(errors) => {
                Self::new(Level::Warning, "Validation failed", errors.to_string())
            }
            ClientError::Api(e) => Self::error("Request failed", e.message()),
            ClientError::Network(_) => Self::error("Network error", NETWORK_ERROR_MESSAGE),
            ClientError::Decode(_) | ClientError::Store(_) | ClientError::Config(_) => {
                Self::error("Request failed", DEFAULT_ERROR_MESSAGE)
            }
        };
        Some(notification)
    }
}
