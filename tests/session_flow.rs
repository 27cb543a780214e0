mod common;

use chrono::Duration;
use common::{envelope, sign_in, spawn_app};
use serde_json::json;
use waterwala_client::error::ClientError;
use waterwala_client::models::{LoginRequest, Role};
use waterwala_client::token_store::SessionStatus;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn login_body() -> serde_json::Value {
    envelope(json!({
        "sessionToken": "S1",
        "accessToken": "A1",
        "refreshToken": "R1",
        "expiresIn": 3600,
        "user": {
            "id": 7,
            "firstName": "Asha",
            "lastName": "Rao",
            "phone": "9876543210",
            "role": "BUSINESS_OWNER"
        }
    }))
}

async fn mount_login(app: &common::TestApp) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_partial_json(json!({
            "phone": "9876543210",
            "otp": "123456",
            "deviceId": "d1",
            "deviceType": "WEB"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/users/7/last-login"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(null))))
        .mount(&app.server)
        .await;
}

fn login_request() -> LoginRequest {
    LoginRequest {
        phone: "9876543210".to_string(),
        otp: "123456".to_string(),
        device_id: "d1".to_string(),
        device_type: "WEB".to_string(),
        fcm_token: None,
    }
}

#[tokio::test]
async fn otp_login_stores_credentials() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/send-otp"))
        .and(query_param("phone", "9876543210"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "message": "OTP sent successfully"})),
        )
        .expect(1)
        .mount(&app.server)
        .await;
    mount_login(&app).await;

    let auth = app.client.auth();
    auth.send_login_otp("9876543210").await.expect("Failed to send OTP");
    let user = auth.login_with(login_request()).await.expect("Login failed");

    assert_eq!(user.id, 7);
    assert_eq!(app.store.access_token().unwrap().as_deref(), Some("A1"));
    assert_eq!(app.store.refresh_token().unwrap().as_deref(), Some("R1"));
    assert_eq!(app.store.session_token().unwrap().as_deref(), Some("S1"));
    assert!(app.store.session_expiry().unwrap().is_some());
    assert_eq!(
        app.store.status(),
        SessionStatus::SignedIn {
            user_id: Some(7),
            role: Some(Role::BusinessOwner)
        }
    );
}

#[tokio::test]
async fn login_then_logout_leaves_store_empty() {
    let app = spawn_app().await;
    mount_login(&app).await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/sessions/deactivate"))
        .and(query_param("sessionToken", "S1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(null))))
        .expect(1)
        .mount(&app.server)
        .await;

    let auth = app.client.auth();
    let user = auth.login_with(login_request()).await.expect("Login failed");
    assert_eq!(auth.current_user().unwrap(), Some(user));
    assert!(auth.is_authenticated().unwrap());

    auth.logout().await.expect("Logout failed");

    assert!(!auth.is_authenticated().unwrap());
    assert!(app.store.credentials().unwrap().is_none());
    assert!(app.store.session_token().unwrap().is_none());
    assert!(auth.current_user().unwrap().is_none());
    assert_eq!(app.store.status(), SessionStatus::SignedOut);
}

#[tokio::test]
async fn logout_clears_store_even_when_server_fails() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("PATCH"))
        .and(path("/api/v1/sessions/deactivate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.server)
        .await;

    app.client.auth().logout().await.expect("Logout failed");
    assert!(!app.store.is_authenticated().unwrap());
}

#[tokio::test]
async fn invalid_login_input_is_rejected_before_sending() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .expect(0)
        .mount(&app.server)
        .await;

    let request = LoginRequest {
        phone: "12345".to_string(),
        otp: "12".to_string(),
        ..login_request()
    };
    let err = app.client.auth().login_with(request).await.unwrap_err();

    match err {
        ClientError::Validation(errors) => assert_eq!(errors.errors().len(), 2),
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn rate_limited_otp_has_friendly_message() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/send-otp"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&app.server)
        .await;

    let err = app.client.auth().send_login_otp("9876543210").await.unwrap_err();

    match err {
        ClientError::Api(e) => {
            assert_eq!(e.status, 429);
            assert_eq!(
                e.message(),
                "Too many OTP requests. Please wait before trying again."
            );
        }
        other => panic!("Expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn explicit_refresh_returns_new_credentials() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/refresh"))
        .and(query_param("refreshToken", "R1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "accessToken": "A2",
            "refreshToken": "R2",
            "expiresAt": "2030-01-01T00:00:00"
        }))))
        .expect(1)
        .mount(&app.server)
        .await;

    let credentials = app.client.sessions().refresh().await.expect("Refresh failed");

    assert_eq!(credentials.access_token, "A2");
    assert_eq!(credentials.refresh_token, "R2");
    assert_eq!(
        credentials.expires_at.map(|t| t.to_rfc3339()),
        Some("2030-01-01T00:00:00+00:00".to_string())
    );
}

#[tokio::test]
async fn session_validation_reads_failures_as_invalid() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");

    Mock::given(method("GET"))
        .and(path("/api/v1/sessions/validate"))
        .and(query_param("sessionToken", "S1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(true))))
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sessions/validate"))
        .and(query_param("sessionToken", "gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.server)
        .await;

    let sessions = app.client.sessions();
    assert!(sessions.validate(None).await);
    assert!(!sessions.validate(Some("gone")).await);
}

#[tokio::test]
async fn refresh_if_expiring_skips_fresh_sessions() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");
    app.store
        .save_refreshed("A1", None, None, Some(chrono::Utc::now() + Duration::hours(1)))
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    let refreshed = app
        .client
        .sessions()
        .refresh_if_expiring(Duration::minutes(5))
        .await
        .unwrap();
    assert!(!refreshed);
}

#[tokio::test]
async fn refresh_if_expiring_refreshes_close_to_expiry() {
    let app = spawn_app().await;
    sign_in(&app.store, "A1", "R1");
    app.store
        .save_refreshed("A1", None, None, Some(chrono::Utc::now() + Duration::minutes(1)))
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!({"accessToken": "A2", "refreshToken": "R2"}))),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    let refreshed = app
        .client
        .sessions()
        .refresh_if_expiring(Duration::minutes(5))
        .await
        .unwrap();
    assert!(refreshed);
    assert_eq!(app.store.access_token().unwrap().as_deref(), Some("A2"));
}
