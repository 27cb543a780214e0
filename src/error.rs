/// Client Error Handling Module
///
/// Every fallible operation in the crate returns `Result<T, ClientError>`.
/// The module covers:
/// 1. Domain-specific error types (validation, auth, backend, store, config)
/// 2. A unified client error type with `From` conversions
/// 3. Per-operation message mapping for backend failures
/// 4. Structured error logging with context

use std::error::Error as StdError;
use std::fmt;

/// Message used when neither the backend nor the calling operation has one.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// A single failed field check. Produced before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooShort(&'static str, usize),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
    Rule(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is required", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} must not exceed {} characters", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "Invalid {} format", field),
            ValidationError::Rule(msg) => write!(f, "{}", msg),
        }
    }
}

impl StdError for ValidationError {}

/// All field failures of one request, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Records the error of a failed check and passes a successful value through.
    pub fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.0.push(e);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Returns `value` when nothing was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", joined)
    }
}

impl StdError for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

/// Authentication failures resolved (or escalated) by the refresh interceptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No usable credentials; the user has to sign in again.
    AuthenticationRequired,
    /// The refresh call failed and the session was torn down.
    RefreshFailed {
        status: Option<u16>,
        message: String,
    },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::AuthenticationRequired => write!(f, "Authentication required"),
            AuthError::RefreshFailed { status: Some(status), message } => {
                write!(f, "Session refresh failed ({}): {}", status, message)
            }
            AuthError::RefreshFailed { status: None, message } => {
                write!(f, "Session refresh failed: {}", message)
            }
        }
    }
}

impl StdError for AuthError {}

/// A non-2xx response (or a `success: false` envelope) from a backend service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    /// Backend-supplied message, or the operation's fallback once mapped.
    pub message: Option<String>,
    pub error_code: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self {
            status,
            message,
            error_code: None,
        }
    }

    /// Builds an error from a raw response body, picking up `message` and
    /// `errorCode` when the body is a JSON object.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let parsed = serde_json::from_slice::<serde_json::Value>(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        Self {
            status,
            message: field("message"),
            error_code: field("errorCode"),
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(DEFAULT_ERROR_MESSAGE)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message(), self.status)
    }
}

impl StdError for ApiError {}

/// Token store errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Io(String),
    Serialization(String),
    Poisoned,
    MissingRefreshToken,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "Token store I/O error: {}", msg),
            StoreError::Serialization(msg) => write!(f, "Token store serialization error: {}", msg),
            StoreError::Poisoned => write!(f, "Token store lock poisoned"),
            StoreError::MissingRefreshToken => {
                write!(f, "Access token rejected: no refresh token stored")
            }
        }
    }
}

impl StdError for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ConfigError::MissingRequired(key),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}

/// ============================================================================
/// 2. UNIFIED CLIENT ERROR TYPE
/// ============================================================================

/// Central error type that every client operation maps to.
///
/// `Clone` because a single in-flight refresh hands the same outcome to
/// every request waiting on it.
#[derive(Debug, Clone)]
pub enum ClientError {
    Validation(ValidationErrors),
    Auth(AuthError),
    Api(ApiError),
    Network(String),
    Decode(String),
    Store(StoreError),
    Config(ConfigError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Validation(e) => write!(f, "{}", e),
            ClientError::Auth(e) => write!(f, "{}", e),
            ClientError::Api(e) => write!(f, "{}", e),
            ClientError::Network(msg) => write!(f, "Network error: {}", msg),
            ClientError::Decode(msg) => write!(f, "Unexpected response: {}", msg),
            ClientError::Store(e) => write!(f, "{}", e),
            ClientError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for ClientError {}

impl ClientError {
    /// HTTP status of a backend failure, if there was a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(e) => Some(e.status),
            ClientError::Auth(AuthError::RefreshFailed { status, .. }) => *status,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }

    /// Maps a backend failure to the calling operation's wording.
    ///
    /// `overrides` replace the message for specific statuses; `fallback` is
    /// used when the backend did not supply one. Other kinds pass through.
    pub fn describe(self, overrides: &[(u16, &str)], fallback: &str) -> Self {
        match self {
            ClientError::Api(mut e) => {
                if let Some((_, msg)) = overrides.iter().find(|(status, _)| *status == e.status) {
                    e.message = Some((*msg).to_string());
                } else if e.message.is_none() {
                    e.message = Some(fallback.to_string());
                }
                ClientError::Api(e)
            }
            other => other,
        }
    }
}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Validation(err.into())
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(err: ValidationErrors) -> Self {
        ClientError::Validation(err)
    }
}

impl From<AuthError> for ClientError {
    fn from(err: AuthError) -> Self {
        ClientError::Auth(err)
    }
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        ClientError::Api(err)
    }
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        ClientError::Store(err)
    }
}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> Self {
        ClientError::Config(err)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Network("request timed out".to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

// ============================================================================
// 3. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Error context for enhanced logging and debugging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<i64>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn log_error(&self, error: &ClientError) {
        let context = serde_json::json!({
            "request_id": self.request_id,
            "operation": self.operation,
            "user_id": self.user_id,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        match error {
            ClientError::Validation(_) => {
                tracing::warn!(error = %error, context = ?context, "Validation error");
            }
            ClientError::Auth(_) => {
                tracing::warn!(error = %error, context = ?context, "Authentication error");
            }
            ClientError::Api(e) => {
                tracing::error!(
                    error = %error,
                    status = e.status,
                    context = ?context,
                    "Backend error"
                );
            }
            ClientError::Network(_) => {
                tracing::error!(error = %error, context = ?context, "Network error");
            }
            ClientError::Decode(_) => {
                tracing::error!(error = %error, context = ?context, "Decode error");
            }
            ClientError::Store(_) => {
                tracing::error!(error = %error, context = ?context, "Token store error");
            }
            ClientError::Config(_) => {
                tracing::error!(error = %error, context = ?context, "Configuration error");
            }
        }
    }
}

/// Runs `result` through `context`, logging the failure before handing it back.
pub fn logged<T>(context: &ErrorContext, result: Result<T, ClientError>) -> Result<T, ClientError> {
    if let Err(e) = &result {
        context.log_error(e);
    }
    result
}
