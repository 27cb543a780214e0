mod common;

use std::time::Duration;

use common::{envelope, sign_in, spawn_app, spawn_app_with, NoAuthorization};
use serde_json::json;
use waterwala_client::configuration::RefreshTokenRotation;
use waterwala_client::error::{AuthError, ClientError};
use waterwala_client::http_client::{Backend, RequestOptions};
use waterwala_client::models::UserProfile;
use waterwala_client::notification::Notification;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

const PROFILE_PATH: &str = "/api/v1/users/id/7";
const REFRESH_PATH: &str = "/api/v1/sessions/refresh";

fn profile_body() -> serde_json::Value {
    envelope(json!({"id": 7, "firstName": "Asha", "role": "CUSTOMER"}))
}

async fn fetch_profile(app: &common::TestApp) -> Result<UserProfile, ClientError> {
    app.client
        .get(Backend::User, "/users/id/7", RequestOptions::new())
        .await
}

#[tokio::test]
async fn request_carries_stored_bearer_token() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(1)
        .mount(&app.server)
        .await;

    let profile = fetch_profile(&app).await.expect("Request failed");
    assert_eq!(profile.id, 7);
}

#[tokio::test]
async fn request_without_token_has_no_authorization_header() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .and(NoAuthorization)
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(1)
        .mount(&app.server)
        .await;

    assert!(fetch_profile(&app).await.is_ok());
}

#[tokio::test]
async fn unauthorized_request_is_refreshed_and_retried_once() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(query_param("refreshToken", "R1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!({"accessToken": "A2", "refreshToken": "R2"}))),
        )
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .and(header("Authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(1)
        .mount(&app.server)
        .await;

    let profile = fetch_profile(&app).await.expect("Retry failed");

    assert_eq!(profile.first_name.as_deref(), Some("Asha"));
    assert_eq!(app.store.access_token().unwrap().as_deref(), Some("A2"));
    assert_eq!(app.store.refresh_token().unwrap().as_deref(), Some("R2"));
    assert_eq!(app.redirects(), 0);
}

#[tokio::test]
async fn refresh_without_rotation_keeps_refresh_token() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(json!({"accessToken": "A2"}))),
        )
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .and(header("Authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .mount(&app.server)
        .await;

    assert!(fetch_profile(&app).await.is_ok());
    assert_eq!(app.store.refresh_token().unwrap().as_deref(), Some("R1"));
}

#[tokio::test]
async fn refresh_stores_rotated_session_token() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!({"sessionToken": "S2", "refreshToken": "R2"}))),
        )
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .and(header("Authorization", "Bearer S2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/sessions/deactivate"))
        .and(query_param("sessionToken", "S2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(null))))
        .expect(1)
        .mount(&app.server)
        .await;

    fetch_profile(&app).await.expect("Retry failed");
    assert_eq!(app.store.session_token().unwrap().as_deref(), Some("S2"));

    app.client.auth().logout().await.expect("Logout failed");
    assert!(!app.store.is_authenticated().unwrap());
}

#[tokio::test]
async fn failed_refresh_clears_store_and_redirects_once() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Invalid refresh token"
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let err = fetch_profile(&app).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Auth(AuthError::RefreshFailed { status: Some(401), .. })
    ));
    assert!(!app.store.is_authenticated().unwrap());
    assert!(app.store.refresh_token().unwrap().is_none());
    assert!(app.store.user().unwrap().is_none());
    assert_eq!(app.redirects(), 1);
}

#[tokio::test]
async fn second_unauthorized_after_retry_is_terminal() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Access denied for this account"
        })))
        .expect(2)
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!({"accessToken": "A2", "refreshToken": "R2"}))),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    let err = fetch_profile(&app).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    match &err {
        ClientError::Api(e) => assert_eq!(e.message(), "Access denied for this account"),
        other => panic!("Expected api error, got {:?}", other),
    }
    assert!(Notification::from_error(&err).is_some());
    assert_eq!(app.redirects(), 0);
}

#[tokio::test]
async fn missing_refresh_token_tears_down_without_refresh_call() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    let err = fetch_profile(&app).await.unwrap_err();

    assert!(matches!(err, ClientError::Auth(AuthError::AuthenticationRequired)));
    assert_eq!(app.redirects(), 1);
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(5)
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!({"accessToken": "A2", "refreshToken": "R2"})))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .and(header("Authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(5)
        .mount(&app.server)
        .await;

    let results = futures::future::join_all((0..5).map(|_| fetch_profile(&app))).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(app.store.access_token().unwrap().as_deref(), Some("A2"));
}

#[tokio::test]
async fn concurrent_requests_redirect_once_when_refresh_fails() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&app.server)
        .await;

    let results = futures::future::join_all((0..3).map(|_| fetch_profile(&app))).await;

    assert!(results.iter().all(|r| matches!(r, Err(e) if e.is_auth())));
    assert_eq!(app.redirects(), 1);
}

#[tokio::test]
async fn required_rotation_rejects_refresh_without_refresh_token() {
    let app = spawn_app_with(RefreshTokenRotation::Required).await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(json!({"accessToken": "A2"}))),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    let err = fetch_profile(&app).await.unwrap_err();

    assert!(matches!(err, ClientError::Auth(AuthError::RefreshFailed { .. })));
    assert!(app.store.access_token().unwrap().is_none());
    assert_eq!(app.redirects(), 1);
}

#[tokio::test]
async fn timeout_is_a_network_error_and_does_not_refresh() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    let err = fetch_profile(&app).await.unwrap_err();

    assert!(matches!(err, ClientError::Network(_)));
    assert!(app.store.is_authenticated().unwrap());
}
