#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use waterwala_client::configuration::{RefreshTokenRotation, Settings};
use waterwala_client::http_client::{ApiClient, Navigator};
use waterwala_client::models::UserProfile;
use waterwala_client::token_store::{Credentials, LoginSession, SessionStore};
use wiremock::{Match, MockServer, Request};

/// Counts redirects instead of navigating anywhere
#[derive(Default)]
pub struct CountingNavigator {
    redirects: AtomicUsize,
}

impl CountingNavigator {
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Matches requests sent without an `Authorization` header
pub struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

pub struct TestApp {
    pub server: MockServer,
    pub client: ApiClient,
    pub store: SessionStore,
    pub navigator: Arc<CountingNavigator>,
}

impl TestApp {
    pub fn redirects(&self) -> usize {
        self.navigator.redirects()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(RefreshTokenRotation::Optional).await
}

pub async fn spawn_app_with(rotation: RefreshTokenRotation) -> TestApp {
    let server = MockServer::start().await;

    let mut settings = Settings::default();
    let base_url = format!("{}/api/v1", server.uri());
    settings.services.user_base_url = base_url.clone();
    settings.services.business_base_url = base_url.clone();
    settings.services.product_base_url = base_url.clone();
    settings.services.order_base_url = base_url;
    settings.http.timeout_secs = 5;
    settings.session.refresh_token_rotation = rotation;

    let store = SessionStore::in_memory();
    let navigator = Arc::new(CountingNavigator::default());
    let client = ApiClient::new(&settings, store.clone(), navigator.clone())
        .expect("Failed to build client");

    TestApp {
        server,
        client,
        store,
        navigator,
    }
}

pub fn profile(id: i64, role: &str) -> UserProfile {
    serde_json::from_value(json!({
        "id": id,
        "firstName": "Asha",
        "lastName": "Rao",
        "phone": "9876543210",
        "role": role
    }))
    .expect("Failed to build profile")
}

/// Puts the store in the signed-in state without a login call.
pub fn sign_in(store: &SessionStore, access_token: &str, refresh_token: &str) {
    store
        .save_login(&LoginSession {
            credentials: Credentials {
                access_token: access_token.to_string(),
                refresh_token: refresh_token.to_string(),
                expires_at: None,
            },
            session_token: Some("S1".to_string()),
            user: profile(7, "CUSTOMER"),
        })
        .expect("Failed to seed session");
}

/// `{ success: true, data }` body of the user service
pub fn envelope(data: Value) -> Value {
    json!({
        "success": true,
        "message": "OK",
        "data": data,
        "timestamp": "2024-05-01T10:15:30"
    })
}
