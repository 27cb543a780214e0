use serde::de::IgnoredAny;

use crate::error::{ClientError, ValidationErrors};
use crate::http_client::{ApiClient, Backend, RequestOptions, NO_BODY};
use crate::models::{
    Page, PageQuery, RegisterUserRequest, Role, UpdateUserRequest, UserProfile, UserStatus,
    UserValidation,
};
use crate::validators::{is_valid_email, is_valid_name, is_valid_phone, optional_max_length};

use super::segment;

const MAX_PROFILE_IMAGE_URL_LENGTH: usize = 500;

#[derive(Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn register(&self, request: &RegisterUserRequest) -> Result<UserProfile, ClientError> {
        let request = validate_registration(request)?;
        self.client
            .post(Backend::User, "/users/register", Some(&request), RequestOptions::new())
            .await
            .map_err(|e| {
                e.describe(
                    &[(409, "User with this email or phone already exists")],
                    "Failed to register user",
                )
            })
    }

    pub async fn by_id(&self, id: i64) -> Result<UserProfile, ClientError> {
        self.fetch(&format!("/users/id/{}", id), "Failed to fetch user").await
    }

    pub async fn by_email(&self, email: &str) -> Result<UserProfile, ClientError> {
        let email = is_valid_email(email)?;
        self.fetch(&format!("/users/email/{}", segment(&email)), "Failed to fetch user by email")
            .await
    }

    pub async fn by_phone(&self, phone: &str) -> Result<UserProfile, ClientError> {
        let phone = is_valid_phone(phone)?;
        self.fetch(&format!("/users/phone/{}", phone), "Failed to fetch user by phone")
            .await
    }

    /// Updates the profile and refreshes the cached copy when it is the
    /// signed-in user's own.
    pub async fn update(
        &self,
        id: i64,
        request: &UpdateUserRequest,
    ) -> Result<UserProfile, ClientError> {
        let request = validate_update(request)?;
        let profile: UserProfile = self
            .client
            .put(Backend::User, &format!("/users/{}", id), Some(&request), RequestOptions::new())
            .await
            .map_err(|e| e.describe(&[(404, "User not found")], "Failed to update user"))?;

        let store = self.client.store();
        if store.user()?.map(|cached| cached.id) == Some(profile.id) {
            store.save_user(&profile)?;
        }
        Ok(profile)
    }

    pub async fn list(&self, page: &PageQuery) -> Result<Page<UserProfile>, ClientError> {
        self.page("/users".to_string(), page, "Failed to fetch users").await
    }

    pub async fn by_status(
        &self,
        status: UserStatus,
        page: &PageQuery,
    ) -> Result<Page<UserProfile>, ClientError> {
        self.page(
            format!("/users/status/{}", status.as_str()),
            page,
            "Failed to fetch users by status",
        )
        .await
    }

    pub async fn by_role(
        &self,
        role: Role,
        page: &PageQuery,
    ) -> Result<Page<UserProfile>, ClientError> {
        self.page(format!("/users/role/{}", role.as_str()), page, "Failed to fetch users by role")
            .await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, ClientError> {
        let email = is_valid_email(email)?;
        self.exists(
            &format!("/users/exists/email/{}", segment(&email)),
            "Failed to check email existence",
        )
        .await
    }

    pub async fn phone_exists(&self, phone: &str) -> Result<bool, ClientError> {
        let phone = is_valid_phone(phone)?;
        self.exists(&format!("/users/exists/phone/{}", phone), "Failed to check phone existence")
            .await
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: UserStatus,
    ) -> Result<UserProfile, ClientError> {
        self.client
            .patch(
                Backend::User,
                &format!("/users/{}/status", id),
                NO_BODY,
                RequestOptions::new().query("status", status.as_str()),
            )
            .await
            .map_err(|e| e.describe(&[(404, "User not found")], "Failed to update user status"))
    }

    pub async fn verify_phone(&self, id: i64) -> Result<UserProfile, ClientError> {
        self.client
            .patch(
                Backend::User,
                &format!("/users/{}/verify-phone", id),
                NO_BODY,
                RequestOptions::new(),
            )
            .await
            .map_err(|e| e.describe(&[(404, "User not found")], "Failed to verify phone"))
    }

    pub async fn verify_email(&self, id: i64) -> Result<UserProfile, ClientError> {
        self.client
            .patch(
                Backend::User,
                &format!("/users/{}/verify-email", id),
                NO_BODY,
                RequestOptions::new(),
            )
            .await
            .map_err(|e| e.describe(&[(404, "User not found")], "Failed to verify email"))
    }

    pub async fn update_last_login(&self, id: i64) -> Result<(), ClientError> {
        self.client
            .patch::<_, IgnoredAny>(
                Backend::User,
                &format!("/users/{}/last-login", id),
                NO_BODY,
                RequestOptions::new(),
            )
            .await
            .map(|_| ())
            .map_err(|e| e.describe(&[(404, "User not found")], "Failed to update last login"))
    }

    pub async fn validate(&self, id: i64) -> Result<UserValidation, ClientError> {
        self.client
            .get(Backend::User, &format!("/users/{}/validate", id), RequestOptions::new())
            .await
            .map_err(|e| e.describe(&[], "Failed to validate user"))
    }

    async fn fetch(&self, path: &str, fallback: &str) -> Result<UserProfile, ClientError> {
        self.client
            .get(Backend::User, path, RequestOptions::new())
            .await
            .map_err(|e| e.describe(&[(404, "User not found")], fallback))
    }

    async fn page(
        &self,
        path: String,
        page: &PageQuery,
        fallback: &str,
    ) -> Result<Page<UserProfile>, ClientError> {
        self.client
            .get(
                Backend::User,
                &path,
                RequestOptions::new().query_pairs(page.to_query("sortDir")),
            )
            .await
            .map_err(|e| e.describe(&[], fallback))
    }

    async fn exists(&self, path: &str, fallback: &str) -> Result<bool, ClientError> {
        self.client
            .get::<Option<bool>>(Backend::User, path, RequestOptions::new())
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| e.describe(&[], fallback))
    }
}

fn validate_registration(
    request: &RegisterUserRequest,
) -> Result<RegisterUserRequest, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let email = errors.check(is_valid_email(&request.email));
    let phone = errors.check(is_valid_phone(&request.phone));
    let first_name = errors.check(is_valid_name(&request.first_name, "First name"));
    let last_name = errors.check(is_valid_name(&request.last_name, "Last name"));

    errors.finish(RegisterUserRequest {
        email: email.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        first_name: first_name.unwrap_or_default(),
        last_name: last_name.unwrap_or_default(),
        role: request.role,
    })
}

/// Only the fields that are present are checked.
fn validate_update(request: &UpdateUserRequest) -> Result<UpdateUserRequest, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let email = request
        .email
        .as_deref()
        .and_then(|email| errors.check(is_valid_email(email)));
    let first_name = request
        .first_name
        .as_deref()
        .and_then(|name| errors.check(is_valid_name(name, "First name")));
    let last_name = request
        .last_name
        .as_deref()
        .and_then(|name| errors.check(is_valid_name(name, "Last name")));
    let profile_image_url = errors
        .check(optional_max_length(
            request.profile_image_url.as_deref(),
            "Profile image URL",
            MAX_PROFILE_IMAGE_URL_LENGTH,
        ))
        .flatten();

    errors.finish(UpdateUserRequest {
        email,
        first_name,
        last_name,
        profile_image_url,
    })
}
