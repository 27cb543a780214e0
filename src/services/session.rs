use chrono::{DateTime, Duration, Utc};
use serde::de::IgnoredAny;
use serde_json::Value;

use crate::auth::token_expiry;
use crate::error::{AuthError, ClientError};
use crate::http_client::{ApiClient, Backend, RequestOptions, NO_BODY};
use crate::models::{CreateSession, SessionInfo};
use crate::token_store::Credentials;

/// Server-side session records of the user service
#[derive(Clone)]
pub struct SessionService {
    client: ApiClient,
}

impl SessionService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: &CreateSession) -> Result<SessionInfo, ClientError> {
        let options = RequestOptions::new()
            .query("userId", request.user_id)
            .query("deviceId", &request.device_id)
            .query("deviceType", &request.device_type)
            .query_opt("fcmToken", request.fcm_token.as_deref());

        self.client
            .post(Backend::User, "/sessions/create", NO_BODY, options)
            .await
            .map_err(|e| {
                e.describe(
                    &[
                        (404, "User not found"),
                        (400, "Invalid session creation parameters"),
                    ],
                    "Failed to create session",
                )
            })
    }

    /// Exchanges the stored refresh token for a new access token.
    pub async fn refresh(&self) -> Result<Credentials, ClientError> {
        self.client.refresh_session().await?;
        self.client
            .store()
            .credentials()?
            .ok_or_else(|| AuthError::AuthenticationRequired.into())
    }

    /// `true` only when the backend confirms the session; any failure reads
    /// as `false`.
    pub async fn validate(&self, session_token: Option<&str>) -> bool {
        let token = match session_token {
            Some(token) => Some(token.to_string()),
            None => self.client.store().session_token().ok().flatten(),
        };
        let Some(token) = token else {
            return false;
        };

        let result: Result<Value, ClientError> = self
            .client
            .get(
                Backend::User,
                "/sessions/validate",
                RequestOptions::new().query("sessionToken", token),
            )
            .await;

        match result {
            Ok(Value::Bool(valid)) => valid,
            Ok(Value::Null) => false,
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Session validation failed");
                false
            }
        }
    }

    /// Non-critical: failures are logged and yield `None`.
    pub async fn update_last_accessed(&self) -> Option<SessionInfo> {
        let token = self.client.store().session_token().ok().flatten()?;
        let result: Result<Option<SessionInfo>, ClientError> = self
            .client
            .patch(
                Backend::User,
                "/sessions/update-access",
                NO_BODY,
                RequestOptions::new().query("sessionToken", token),
            )
            .await;

        match result {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to update last accessed");
                None
            }
        }
    }

    pub async fn deactivate(&self, session_token: &str) -> Result<(), ClientError> {
        self.client
            .patch::<_, IgnoredAny>(
                Backend::User,
                "/sessions/deactivate",
                NO_BODY,
                RequestOptions::new().query("sessionToken", session_token),
            )
            .await
            .map(|_| ())
            .map_err(|e| e.describe(&[(404, "Session not found")], "Failed to deactivate session"))
    }

    pub async fn deactivate_all(&self, user_id: i64) -> Result<(), ClientError> {
        self.client
            .patch::<_, IgnoredAny>(
                Backend::User,
                &format!("/sessions/deactivate-all/{}", user_id),
                NO_BODY,
                RequestOptions::new(),
            )
            .await
            .map(|_| ())
            .map_err(|e| e.describe(&[(404, "User not found")], "Failed to deactivate all sessions"))
    }

    pub async fn active_sessions(&self, user_id: i64) -> Result<Vec<SessionInfo>, ClientError> {
        self.client
            .get::<Option<Vec<SessionInfo>>>(
                Backend::User,
                &format!("/sessions/user/{}/active", user_id),
                RequestOptions::new(),
            )
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| e.describe(&[(404, "User not found")], "Failed to fetch active sessions"))
    }

    /// Refreshes when the session expires within `buffer`. Returns whether a
    /// refresh happened. Without a known expiry nothing is done.
    pub async fn refresh_if_expiring(&self, buffer: Duration) -> Result<bool, ClientError> {
        let Some(expires_at) = self.expiry()? else {
            return Ok(false);
        };

        if expires_at - Utc::now() > buffer {
            return Ok(false);
        }

        tracing::info!(%expires_at, "Session close to expiry, refreshing");
        self.refresh().await?;
        Ok(true)
    }

    /// Stored expiry, falling back to the access token's `exp` claim.
    fn expiry(&self) -> Result<Option<DateTime<Utc>>, ClientError> {
        let store = self.client.store();
        if let Some(expiry) = store.session_expiry()? {
            return Ok(Some(expiry));
        }
        Ok(store.access_token()?.as_deref().and_then(token_expiry))
    }
}
