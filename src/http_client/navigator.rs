/// Hook invoked when the session cannot be recovered and the user has to
/// sign in again.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Default navigator for headless use: only records the redirect.
#[derive(Debug, Clone)]
pub struct LoggingNavigator {
    login_path: String,
}

impl LoggingNavigator {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }
}

impl Navigator for LoggingNavigator {
    fn redirect_to_login(&self) {
        tracing::warn!(
            login_path = %self.login_path,
            "Session expired. Please login again."
        );
    }
}
