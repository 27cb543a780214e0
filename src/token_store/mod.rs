/// Session token store
///
/// Persists the credential pair, the session token, the cached profile, the
/// device id and the access-token expiry under fixed string keys. Credential
/// writes and teardown each go through a single backend call, so readers
/// never observe an access token without its refresh token.

mod file;
mod memory;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::auth::{fingerprint, generate_device_id};
use crate::error::StoreError;
use crate::models::{Role, UserProfile};

pub use file::FileStorage;
pub use memory::MemoryStorage;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const SESSION_TOKEN_KEY: &str = "sessionToken";
pub const USER_KEY: &str = "user";
pub const DEVICE_ID_KEY: &str = "deviceId";
pub const SESSION_EXPIRY_KEY: &str = "sessionExpiry";

const ALL_KEYS: [&str; 6] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    SESSION_TOKEN_KEY,
    USER_KEY,
    DEVICE_ID_KEY,
    SESSION_EXPIRY_KEY,
];

/// Key/value persistence behind the session store.
///
/// `apply` must make all of its writes and removals visible at once.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn apply(&self, set: &[(&str, String)], remove: &[&str]) -> Result<(), StoreError>;

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.apply(&[(key, value)], &[])
    }

    fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.apply(&[], keys)
    }
}

/// What subscribers see of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    SignedOut,
    SignedIn {
        user_id: Option<i64>,
        role: Option<Role>,
    },
}

impl SessionStatus {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionStatus::SignedIn { .. })
    }
}

/// Access and refresh token, always written together
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &fingerprint(&self.access_token))
            .field("refresh_token", &fingerprint(&self.refresh_token))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Everything a successful login leaves behind
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub credentials: Credentials,
    pub session_token: Option<String>,
    pub user: UserProfile,
}

#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
    status: Arc<watch::Sender<SessionStatus>>,
}

impl SessionStore {
    /// Wraps `backend`, discarding a persisted access token that has lost
    /// its refresh token.
    pub fn new(backend: impl StorageBackend + 'static) -> Result<Self, StoreError> {
        let backend: Arc<dyn StorageBackend> = Arc::new(backend);

        let access = backend.get(ACCESS_TOKEN_KEY)?;
        let refresh = backend.get(REFRESH_TOKEN_KEY)?;
        if access.is_some() && refresh.is_none() {
            tracing::warn!("Discarding persisted access token without a refresh token");
            backend.remove(&ALL_KEYS)?;
        }

        let (sender, _) = watch::channel(SessionStatus::SignedOut);
        let store = Self {
            backend,
            status: Arc::new(sender),
        };
        store.publish()?;
        Ok(store)
    }

    pub fn in_memory() -> Self {
        let (sender, _) = watch::channel(SessionStatus::SignedOut);
        Self {
            backend: Arc::new(MemoryStorage::new()),
            status: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.backend.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.backend.get(REFRESH_TOKEN_KEY)
    }

    pub fn session_token(&self) -> Result<Option<String>, StoreError> {
        self.backend.get(SESSION_TOKEN_KEY)
    }

    pub fn session_expiry(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let Some(raw) = self.backend.get(SESSION_EXPIRY_KEY)? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| StoreError::Serialization(format!("{}: {}", SESSION_EXPIRY_KEY, e)))
    }

    pub fn user(&self) -> Result<Option<UserProfile>, StoreError> {
        match self.backend.get(USER_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn credentials(&self) -> Result<Option<Credentials>, StoreError> {
        let access = self.access_token()?;
        let refresh = self.refresh_token()?;
        match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Ok(Some(Credentials {
                access_token,
                refresh_token,
                expires_at: self.session_expiry()?,
            })),
            _ => Ok(None),
        }
    }

    pub fn is_authenticated(&self) -> Result<bool, StoreError> {
        Ok(self.access_token()?.is_some())
    }

    /// Stored device id, generating and persisting one on first use.
    pub fn device_id(&self) -> Result<String, StoreError> {
        if let Some(id) = self.backend.get(DEVICE_ID_KEY)? {
            return Ok(id);
        }
        let id = generate_device_id();
        self.backend.set(DEVICE_ID_KEY, id.clone())?;
        Ok(id)
    }

    pub fn save_login(&self, session: &LoginSession) -> Result<(), StoreError> {
        let user = serde_json::to_string(&session.user)?;
        let mut set = credential_entries(&session.credentials);
        set.push((USER_KEY, user));

        let mut remove = Vec::new();
        match &session.session_token {
            Some(token) => set.push((SESSION_TOKEN_KEY, token.clone())),
            None => remove.push(SESSION_TOKEN_KEY),
        }
        if session.credentials.expires_at.is_none() {
            remove.push(SESSION_EXPIRY_KEY);
        }

        self.backend.apply(&set, &remove)?;
        tracing::info!(
            user_id = session.user.id,
            token = %fingerprint(&session.credentials.access_token),
            "Session stored"
        );
        self.publish()
    }

    /// Replaces the access token after a refresh. The refresh and session
    /// tokens are rotated only when new ones are supplied.
    pub fn save_refreshed(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        session_token: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        if refresh_token.is_none() && self.refresh_token()?.is_none() {
            return Err(StoreError::MissingRefreshToken);
        }

        let mut set = vec![(ACCESS_TOKEN_KEY, access_token.to_string())];
        if let Some(refresh) = refresh_token {
            set.push((REFRESH_TOKEN_KEY, refresh.to_string()));
        }
        if let Some(session) = session_token {
            set.push((SESSION_TOKEN_KEY, session.to_string()));
        }
        let remove: &[&str] = match expires_at {
            Some(expiry) => {
                set.push((SESSION_EXPIRY_KEY, expiry.to_rfc3339()));
                &[]
            }
            None => &[SESSION_EXPIRY_KEY],
        };

        self.backend.apply(&set, remove)?;
        tracing::info!(
            token = %fingerprint(access_token),
            rotated = refresh_token.is_some(),
            "Access token replaced"
        );
        self.publish()
    }

    pub fn save_user(&self, user: &UserProfile) -> Result<(), StoreError> {
        self.backend.set(USER_KEY, serde_json::to_string(user)?)?;
        self.publish()
    }

    /// Removes every stored key in one operation.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(&ALL_KEYS)?;
        tracing::info!("Session cleared");
        self.status.send_replace(SessionStatus::SignedOut);
        Ok(())
    }

    fn publish(&self) -> Result<(), StoreError> {
        let status = if self.is_authenticated()? {
            let user = self.user().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Cached user profile is unreadable");
                None
            });
            SessionStatus::SignedIn {
                user_id: user.as_ref().map(|u| u.id),
                role: user.and_then(|u| u.role),
            }
        } else {
            SessionStatus::SignedOut
        };

        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        Ok(())
    }
}

fn credential_entries(credentials: &Credentials) -> Vec<(&'static str, String)> {
    let mut entries = vec![
        (ACCESS_TOKEN_KEY, credentials.access_token.clone()),
        (REFRESH_TOKEN_KEY, credentials.refresh_token.clone()),
    ];
    if let Some(expiry) = credentials.expires_at {
        entries.push((SESSION_EXPIRY_KEY, expiry.to_rfc3339()));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        serde_json::from_value(serde_json::json!({
            "id": 7,
            "firstName": "Asha",
            "phone": "9876543210",
            "role": "CUSTOMER"
        }))
        .unwrap()
    }

    fn login_session() -> LoginSession {
        LoginSession {
            credentials: Credentials {
                access_token: "A1".to_string(),
                refresh_token: "R1".to_string(),
                expires_at: DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z")
                    .ok()
                    .map(|t| t.with_timezone(&Utc)),
            },
            session_token: Some("S1".to_string()),
            user: profile(),
        }
    }

    #[test]
    fn test_login_round_trip() {
        let store = SessionStore::in_memory();
        let session = login_session();
        store.save_login(&session).unwrap();

        assert_eq!(store.credentials().unwrap(), Some(session.credentials));
        assert_eq!(store.session_token().unwrap().as_deref(), Some("S1"));
        assert_eq!(store.user().unwrap(), Some(profile()));
        assert!(store.is_authenticated().unwrap());
    }

    #[test]
    fn test_clear_empties_store() {
        let store = SessionStore::in_memory();
        store.device_id().unwrap();
        store.save_login(&login_session()).unwrap();
        store.clear().unwrap();

        for key in ALL_KEYS {
            assert_eq!(store.backend.get(key).unwrap(), None, "{} survived", key);
        }
        assert_eq!(store.status(), SessionStatus::SignedOut);
    }

    #[test]
    fn test_refresh_keeps_refresh_token_unless_rotated() {
        let store = SessionStore::in_memory();
        store.save_login(&login_session()).unwrap();

        let session_before = store.session_token().unwrap();
        store.save_refreshed("A2", None, None, None).unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("A2"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("R1"));
        assert_eq!(store.session_token().unwrap(), session_before);
        assert_eq!(store.session_expiry().unwrap(), None);

        store.save_refreshed("A3", Some("R3"), Some("S3"), None).unwrap();
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("R3"));
        assert_eq!(store.session_token().unwrap().as_deref(), Some("S3"));
    }

    #[test]
    fn test_refresh_without_any_refresh_token_is_rejected() {
        let store = SessionStore::in_memory();

        let result = store.save_refreshed("A1", None, None, None);

        assert!(matches!(result, Err(StoreError::MissingRefreshToken)));
        assert_eq!(store.access_token().unwrap(), None);
    }

    #[test]
    fn test_device_id_is_stable() {
        let store = SessionStore::in_memory();
        let first = store.device_id().unwrap();
        assert!(first.starts_with("web_"));
        assert_eq!(store.device_id().unwrap(), first);
    }

    #[test]
    fn test_partial_credentials_discarded_on_open() {
        let backend = MemoryStorage::new();
        backend.set(ACCESS_TOKEN_KEY, "A1".to_string()).unwrap();
        backend.set(USER_KEY, "{\"id\":7}".to_string()).unwrap();

        let store = SessionStore::new(backend).unwrap();
        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(store.user().unwrap(), None);
        assert_eq!(store.status(), SessionStatus::SignedOut);
    }

    #[tokio::test]
    async fn test_subscribers_see_sign_in_and_out() {
        let store = SessionStore::in_memory();
        let mut status = store.subscribe();

        store.save_login(&login_session()).unwrap();
        status.changed().await.unwrap();
        assert_eq!(
            *status.borrow_and_update(),
            SessionStatus::SignedIn {
                user_id: Some(7),
                role: Some(Role::Customer)
            }
        );

        store.clear().unwrap();
        status.changed().await.unwrap();
        assert!(!status.borrow().is_signed_in());
    }

    #[test]
    fn test_credentials_debug_hides_tokens() {
        let rendered = format!("{:?}", login_session().credentials);
        assert!(!rendered.contains("\"A1\""));
        assert!(!rendered.contains("\"R1\""));
    }
}
