use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserProfile;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub phone: String,
    pub otp: String,
    pub device_id: String,
    pub device_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub session_token: Option<String>,
    pub refresh_token: String,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Seconds until the access token expires
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: UserProfile,
}

impl LoginResponse {
    /// Bearer token; the backend has shipped it under both names.
    pub fn bearer_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .or(self.session_token.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// A backend session record (`UserSessionDto`)
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub fcm_token: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub expires_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub last_accessed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl SessionInfo {
    /// Access token of a refresh response: `accessToken`, else `sessionToken`.
    pub fn bearer_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .or(self.session_token.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn rotated_refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// The backend issues a new session token with every refresh.
    pub fn rotated_session_token(&self) -> Option<&str> {
        self.session_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Backend timestamps are zone-less and issued in UTC.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        self.expires_at.map(|t| t.and_utc())
    }
}

impl std::fmt::Debug for SessionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionInfo")
            .field("id", &self.id)
            .field("device_id", &self.device_id)
            .field("device_type", &self.device_type)
            .field("expires_at", &self.expires_at)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Parameters of `POST /sessions/create`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSession {
    pub user_id: i64,
    pub device_id: String,
    pub device_type: String,
    pub fcm_token: Option<String>,
}
