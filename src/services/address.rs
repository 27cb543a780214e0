use serde::de::IgnoredAny;

use crate::error::{ClientError, ValidationError, ValidationErrors};
use crate::http_client::{ApiClient, Backend, RequestOptions, NO_BODY};
use crate::models::{Address, AddressRequest};
use crate::validators::{is_valid_pincode, optional_max_length, required};

const MAX_LINE_LENGTH: usize = 100;
const MAX_REGION_LENGTH: usize = 50;
const DEFAULT_COUNTRY: &str = "India";

#[derive(Clone)]
pub struct AddressService {
    client: ApiClient,
}

impl AddressService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// All addresses of a user; an unknown user has none.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Address>, ClientError> {
        let result = self
            .client
            .get::<Option<Vec<Address>>>(
                Backend::User,
                &format!("/addresses/user/{}", user_id),
                RequestOptions::new(),
            )
            .await
            .map(Option::unwrap_or_default);

        super::or_if_not_found(result, Vec::new())
            .map_err(|e| e.describe(&[], "Failed to fetch addresses"))
    }

    pub async fn get(&self, id: i64) -> Result<Address, ClientError> {
        self.client
            .get(Backend::User, &format!("/addresses/{}", id), RequestOptions::new())
            .await
            .map_err(|e| e.describe(&[(404, "Address not found")], "Failed to fetch address"))
    }

    pub async fn default_for_user(&self, user_id: i64) -> Result<Option<Address>, ClientError> {
        let result = self
            .client
            .get(
                Backend::User,
                &format!("/addresses/user/{}/default", user_id),
                RequestOptions::new(),
            )
            .await;

        super::or_if_not_found(result, None)
            .map_err(|e| e.describe(&[], "Failed to fetch default address"))
    }

    pub async fn add(&self, user_id: i64, request: &AddressRequest) -> Result<Address, ClientError> {
        let request = validate_address(request)?;
        self.client
            .post(
                Backend::User,
                &format!("/addresses/user/{}", user_id),
                Some(&request),
                RequestOptions::new(),
            )
            .await
            .map_err(|e| e.describe(&[(404, "User not found")], "Failed to add address"))
    }

    pub async fn update(&self, id: i64, request: &AddressRequest) -> Result<Address, ClientError> {
        let request = validate_address(request)?;
        self.client
            .put(
                Backend::User,
                &format!("/addresses/{}", id),
                Some(&request),
                RequestOptions::new(),
            )
            .await
            .map_err(|e| e.describe(&[(404, "Address not found")], "Failed to update address"))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.client
            .delete::<IgnoredAny>(Backend::User, &format!("/addresses/{}", id), RequestOptions::new())
            .await
            .map(|_| ())
            .map_err(|e| e.describe(&[(404, "Address not found")], "Failed to delete address"))
    }

    pub async fn set_default(&self, id: i64) -> Result<Address, ClientError> {
        self.client
            .patch(
                Backend::User,
                &format!("/addresses/{}/set-default", id),
                NO_BODY,
                RequestOptions::new(),
            )
            .await
            .map_err(|e| e.describe(&[(404, "Address not found")], "Failed to set default address"))
    }
}

/// Checks every field and returns the normalized request: trimmed values,
/// country defaulted to India and `is_default` to `false`.
pub fn validate_address(request: &AddressRequest) -> Result<AddressRequest, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let address_line1 = errors.check(required(&request.address_line1, "Address line 1", MAX_LINE_LENGTH));
    let address_line2 = errors
        .check(optional_max_length(
            request.address_line2.as_deref(),
            "Address line 2",
            MAX_LINE_LENGTH,
        ))
        .flatten();
    let landmark = errors
        .check(optional_max_length(request.landmark.as_deref(), "Landmark", MAX_LINE_LENGTH))
        .flatten();
    let city = errors.check(required(&request.city, "City", MAX_REGION_LENGTH));
    let state = errors.check(required(&request.state, "State", MAX_REGION_LENGTH));
    let pincode = errors.check(is_valid_pincode(&request.pincode));
    if request.address_type.is_none() {
        errors.push(ValidationError::EmptyField("Address type"));
    }

    let country = request
        .country
        .as_deref()
        .map(str::trim)
        .filter(|country| !country.is_empty())
        .unwrap_or(DEFAULT_COUNTRY)
        .to_string();

    errors.finish(AddressRequest {
        address_line1: address_line1.unwrap_or_default(),
        address_line2,
        landmark,
        city: city.unwrap_or_default(),
        state: state.unwrap_or_default(),
        pincode: pincode.unwrap_or_default(),
        country: Some(country),
        address_type: request.address_type,
        is_default: Some(request.is_default.unwrap_or(false)),
        latitude: request.latitude,
        longitude: request.longitude,
    })
}
