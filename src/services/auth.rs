use chrono::{Duration, Utc};
use serde::de::IgnoredAny;

use crate::auth::token_expiry;
use crate::error::{logged, ClientError, ErrorContext, ValidationErrors};
use crate::http_client::{ApiClient, Backend, RequestOptions, NO_BODY};
use crate::models::{LoginRequest, LoginResponse, UserProfile};
use crate::token_store::{Credentials, LoginSession};
use crate::validators::{is_valid_otp, is_valid_phone};

pub const TOO_MANY_OTP_REQUESTS: &str = "Too many OTP requests. Please wait before trying again.";

/// OTP login, logout and the locally cached principal
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn send_login_otp(&self, phone: &str) -> Result<(), ClientError> {
        let phone = is_valid_phone(phone)?;

        let result = self
            .client
            .post::<_, IgnoredAny>(
                Backend::User,
                "/auth/send-otp",
                NO_BODY,
                RequestOptions::new().query("phone", &phone),
            )
            .await
            .map(|_| ())
            .map_err(|e| e.describe(&[(429, TOO_MANY_OTP_REQUESTS)], "Failed to send OTP"));

        logged(&ErrorContext::new("send_login_otp"), result)
    }

    /// Logs in with the stored device id and the configured device type.
    pub async fn login(&self, phone: &str, otp: &str) -> Result<UserProfile, ClientError> {
        let request = LoginRequest {
            phone: phone.to_string(),
            otp: otp.to_string(),
            device_id: self.client.store().device_id()?,
            device_type: self.client.settings().device.device_type.clone(),
            fcm_token: None,
        };
        self.login_with(request).await
    }

    pub async fn login_with(&self, request: LoginRequest) -> Result<UserProfile, ClientError> {
        let mut errors = ValidationErrors::new();
        let phone = errors.check(is_valid_phone(&request.phone));
        let otp = errors.check(is_valid_otp(&request.otp));
        let request = errors.finish(LoginRequest {
            phone: phone.unwrap_or_default(),
            otp: otp.unwrap_or_default(),
            ..request
        })?;

        let context = ErrorContext::new("login");
        let response: LoginResponse = logged(
            &context,
            self.client
                .post(Backend::User, "/auth/login", Some(&request), RequestOptions::new())
                .await
                .map_err(|e| e.describe(&[], "Login failed")),
        )?;

        let access_token = response
            .bearer_token()
            .ok_or_else(|| ClientError::Decode("login response carried no access token".into()))?
            .to_string();
        let expires_at = response
            .expires_in
            .map(|seconds| Utc::now() + Duration::seconds(seconds))
            .or_else(|| token_expiry(&access_token));

        let session = LoginSession {
            credentials: Credentials {
                access_token,
                refresh_token: response.refresh_token,
                expires_at,
            },
            session_token: response.session_token,
            user: response.user,
        };
        self.client.store().save_login(&session)?;
        tracing::info!(user_id = session.user.id, "User logged in");

        self.touch_last_login(session.user.id).await;
        Ok(session.user)
    }

    /// Deactivates the server session when one is known; the local store is
    /// cleared regardless.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if let Some(session_token) = self.client.store().session_token()? {
            let result = self
                .client
                .patch::<_, IgnoredAny>(
                    Backend::User,
                    "/sessions/deactivate",
                    NO_BODY,
                    RequestOptions::new().query("sessionToken", session_token),
                )
                .await;
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to deactivate session on server");
            }
        }

        self.client.store().clear()?;
        Ok(())
    }

    pub fn current_user(&self) -> Result<Option<UserProfile>, ClientError> {
        Ok(self.client.store().user()?)
    }

    pub fn is_authenticated(&self) -> Result<bool, ClientError> {
        Ok(self.client.store().is_authenticated()?)
    }

    async fn touch_last_login(&self, user_id: i64) {
        let result = self
            .client
            .patch::<_, IgnoredAny>(
                Backend::User,
                &format!("/users/{}/last-login", user_id),
                NO_BODY,
                RequestOptions::new(),
            )
            .await;
        if let Err(e) = result {
            tracing::warn!(user_id, error = %e, "Failed to update last login");
        }
    }
}
