use serde::de::IgnoredAny;

use crate::error::{AuthError, ClientError, ValidationError, ValidationErrors};
use crate::http_client::{ApiClient, Backend, RequestOptions, NO_BODY};
use crate::models::{
    BusinessAddress, BusinessProfile, BusinessRegistration, BusinessSearch, BusinessUpdate,
    BusinessVerification, Page, PageQuery,
};
use crate::validators::{
    is_valid_email, is_valid_gst_number, is_valid_phone, is_valid_pincode,
    is_valid_registration_number, max_length, required,
};

const MAX_BUSINESS_NAME_LENGTH: usize = 255;
const MAX_BUSINESS_TYPE_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 1000;
const USER_ID_HEADER: &str = "X-User-Id";

/// Business profiles on the business service
#[derive(Clone)]
pub struct BusinessService {
    client: ApiClient,
}

impl BusinessService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Registers a business. A missing `user_id` is taken from the signed-in
    /// user.
    pub async fn register(
        &self,
        registration: &BusinessRegistration,
    ) -> Result<BusinessProfile, ClientError> {
        let mut registration = registration.clone();
        if registration.user_id.is_none() {
            registration.user_id = self.client.store().user()?.map(|user| user.id);
        }
        let registration = validate_registration(&registration)?;

        self.client
            .post(
                Backend::Business,
                "/businesses/register",
                Some(&registration),
                RequestOptions::new(),
            )
            .await
            .map_err(|e| {
                e.describe(&[(409, "Business already exists")], "Failed to register business")
            })
    }

    pub async fn get(&self, id: i64) -> Result<BusinessProfile, ClientError> {
        self.client
            .get(Backend::Business, &format!("/businesses/{}", id), RequestOptions::new())
            .await
            .map_err(|e| e.describe(&[(404, "Business not found")], "Failed to fetch business"))
    }

    pub async fn by_user(&self, user_id: i64) -> Result<BusinessProfile, ClientError> {
        self.client
            .get(
                Backend::Business,
                &format!("/businesses/user/{}", user_id),
                RequestOptions::new(),
            )
            .await
            .map_err(|e| {
                e.describe(
                    &[(404, "No business registered for this user")],
                    "Failed to fetch business",
                )
            })
    }

    pub async fn update(
        &self,
        id: i64,
        update: &BusinessUpdate,
    ) -> Result<BusinessProfile, ClientError> {
        let update = validate_update(update)?;
        let options = self.acting_user()?;
        self.client
            .put(Backend::Business, &format!("/businesses/{}", id), Some(&update), options)
            .await
            .map_err(|e| {
                e.describe(
                    &[(403, "Unauthorized access"), (404, "Business not found")],
                    "Failed to update business",
                )
            })
    }

    pub async fn deactivate(&self, id: i64) -> Result<(), ClientError> {
        let options = self.acting_user()?;
        self.client
            .delete::<IgnoredAny>(Backend::Business, &format!("/businesses/{}", id), options)
            .await
            .map(|_| ())
            .map_err(|e| {
                e.describe(
                    &[(403, "Unauthorized access"), (404, "Business not found")],
                    "Failed to deactivate business",
                )
            })
    }

    pub async fn search(&self, search: &BusinessSearch) -> Result<Vec<BusinessProfile>, ClientError> {
        self.client
            .get::<Option<Vec<BusinessProfile>>>(
                Backend::Business,
                "/businesses/search",
                RequestOptions::new().query_pairs(search.to_query()),
            )
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| e.describe(&[], "Failed to search businesses"))
    }

    pub async fn featured(&self, page: &PageQuery) -> Result<Page<BusinessProfile>, ClientError> {
        self.client
            .get(
                Backend::Business,
                "/businesses/featured",
                RequestOptions::new().query_pairs(page.to_query("sortDir")),
            )
            .await
            .map_err(|e| e.describe(&[], "Failed to fetch featured businesses"))
    }

    pub async fn verify(
        &self,
        id: i64,
        verification: &BusinessVerification,
    ) -> Result<(), ClientError> {
        self.client
            .post::<_, IgnoredAny>(
                Backend::Business,
                &format!("/businesses/{}/verify", id),
                Some(verification),
                RequestOptions::new(),
            )
            .await
            .map(|_| ())
            .map_err(|e| e.describe(&[(404, "Business not found")], "Failed to verify business"))
    }

    pub async fn update_rating(
        &self,
        id: i64,
        rating: f64,
        review_count: u32,
    ) -> Result<(), ClientError> {
        if !(0.0..=5.0).contains(&rating) {
            return Err(ValidationError::Rule("Rating must be between 0 and 5".to_string()).into());
        }

        self.client
            .patch::<_, IgnoredAny>(
                Backend::Business,
                &format!("/businesses/{}/rating", id),
                NO_BODY,
                RequestOptions::new()
                    .query("rating", rating)
                    .query("reviewCount", review_count),
            )
            .await
            .map(|_| ())
            .map_err(|e| e.describe(&[(404, "Business not found")], "Failed to update rating"))
    }

    pub async fn update_order_stats(
        &self,
        id: i64,
        total_orders: u32,
        completed_orders: u32,
    ) -> Result<(), ClientError> {
        if completed_orders > total_orders {
            return Err(ValidationError::Rule(
                "Completed orders cannot exceed total orders".to_string(),
            )
            .into());
        }

        self.client
            .patch::<_, IgnoredAny>(
                Backend::Business,
                &format!("/businesses/{}/orders", id),
                NO_BODY,
                RequestOptions::new()
                    .query("totalOrders", total_orders)
                    .query("completedOrders", completed_orders),
            )
            .await
            .map(|_| ())
            .map_err(|e| {
                e.describe(&[(404, "Business not found")], "Failed to update order statistics")
            })
    }

    /// Whether the signed-in user owns the business.
    pub async fn is_owner(&self, id: i64) -> Result<bool, ClientError> {
        let options = self.acting_user()?;
        let result = self
            .client
            .get::<Option<bool>>(Backend::Business, &format!("/businesses/{}/owner", id), options)
            .await
            .map(Option::unwrap_or_default);

        super::or_if_not_found(result, false)
            .map_err(|e| e.describe(&[], "Failed to check business ownership"))
    }

    /// `X-User-Id` of the signed-in user; required by owner-only endpoints.
    fn acting_user(&self) -> Result<RequestOptions, ClientError> {
        let user = self
            .client
            .store()
            .user()?
            .ok_or(AuthError::AuthenticationRequired)?;
        Ok(RequestOptions::new().header(USER_ID_HEADER, user.id))
    }
}

fn rule(message: &str) -> ValidationError {
    ValidationError::Rule(message.to_string())
}

fn valid_address(address: &BusinessAddress) -> bool {
    !address.address_line1.trim().is_empty()
        && !address.city.trim().is_empty()
        && !address.state.trim().is_empty()
        && is_valid_pincode(&address.pincode).is_ok()
}

pub fn validate_registration(
    registration: &BusinessRegistration,
) -> Result<BusinessRegistration, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if registration.user_id.is_none() {
        errors.push(rule("User ID is required"));
    }
    let business_name = errors.check(
        required(&registration.business_name, "Business name", MAX_BUSINESS_NAME_LENGTH)
            .map_err(|e| match e {
                ValidationError::EmptyField(_) => rule("Business name is required"),
                _ => rule("Business name must be less than 255 characters"),
            }),
    );
    let business_type = errors.check(
        required(&registration.business_type, "Business type", MAX_BUSINESS_TYPE_LENGTH)
            .map_err(|e| match e {
                ValidationError::EmptyField(_) => rule("Business type is required"),
                _ => rule("Business type must be less than 100 characters"),
            }),
    );
    let registration_number = errors.check(
        is_valid_registration_number(&registration.business_registration_number).map_err(|_| {
            rule("Valid business registration number is required (10-20 alphanumeric characters)")
        }),
    );
    let gst_number = errors.check(
        is_valid_gst_number(&registration.gst_number).map_err(|_| rule("Valid GST number is required")),
    );
    let contact_person_name = errors.check(
        required(
            &registration.contact_person_name,
            "Contact person name",
            MAX_BUSINESS_NAME_LENGTH,
        )
        .map_err(|e| match e {
            ValidationError::EmptyField(_) => rule("Contact person name is required"),
            _ => rule("Contact person name must be less than 255 characters"),
        }),
    );
    let contact_email = errors.check(
        is_valid_email(&registration.contact_email).map_err(|_| rule("Valid contact email is required")),
    );
    let contact_phone = errors.check(
        is_valid_phone(&registration.contact_phone)
            .map_err(|_| rule("Valid contact phone is required (10 digits starting with 6-9)")),
    );
    if !registration.address.as_ref().is_some_and(valid_address) {
        errors.push(rule("Valid business address is required"));
    }
    if registration.services.is_empty() {
        errors.push(rule("At least one business service is required"));
    }
    if registration.operating_hours.is_empty() {
        errors.push(rule("Operating hours are required"));
    }
    if let Some(description) = &registration.description {
        errors.check(
            max_length(description, "Description", MAX_DESCRIPTION_LENGTH)
                .map_err(|_| rule("Description must be less than 1000 characters")),
        );
    }

    errors.finish(BusinessRegistration {
        business_name: business_name.unwrap_or_default(),
        business_type: business_type.unwrap_or_default(),
        business_registration_number: registration_number.unwrap_or_default(),
        gst_number: gst_number.unwrap_or_default(),
        contact_person_name: contact_person_name.unwrap_or_default(),
        contact_email: contact_email.unwrap_or_default(),
        contact_phone: contact_phone.unwrap_or_default(),
        ..registration.clone()
    })
}

fn validate_update(update: &BusinessUpdate) -> Result<BusinessUpdate, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let business_name = update.business_name.as_deref().and_then(|name| {
        errors.check(required(name, "Business name", MAX_BUSINESS_NAME_LENGTH))
    });
    let contact_email = update
        .contact_email
        .as_deref()
        .and_then(|email| errors.check(is_valid_email(email)));
    let contact_phone = update
        .contact_phone
        .as_deref()
        .and_then(|phone| errors.check(is_valid_phone(phone)));
    if let Some(description) = &update.description {
        errors.check(max_length(description, "Description", MAX_DESCRIPTION_LENGTH));
    }

    errors.finish(BusinessUpdate {
        business_name,
        contact_email,
        contact_phone,
        ..update.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BusinessServiceOffering, DayOfWeek, OperatingHours, ServiceType};

    fn registration() -> BusinessRegistration {
        BusinessRegistration {
            user_id: Some(7),
            business_name: "Aqua Pure".to_string(),
            business_type: "Water Supplier".to_string(),
            business_registration_number: "ABCD1234567".to_string(),
            gst_number: "29ABCDE1234F1Z5".to_string(),
            contact_person_name: "Asha Rao".to_string(),
            contact_email: "asha@aquapure.in".to_string(),
            contact_phone: "9876543210".to_string(),
            description: None,
            logo_url: None,
            address: Some(BusinessAddress {
                id: None,
                address_line1: "12 MG Road".to_string(),
                address_line2: None,
                city: "Bengaluru".to_string(),
                state: "Karnataka".to_string(),
                pincode: "560001".to_string(),
                latitude: None,
                longitude: None,
            }),
            services: vec![BusinessServiceOffering {
                id: None,
                service_type: ServiceType::WaterDelivery,
                service_name: "20L cans".to_string(),
                description: None,
                base_price: None,
                estimated_duration: None,
                is_active: None,
            }],
            operating_hours: vec![OperatingHours {
                day_of_week: DayOfWeek::Monday,
                is_open: true,
                open_time: Some("08:00".to_string()),
                close_time: Some("20:00".to_string()),
                is_24_hours: false,
            }],
        }
    }

    #[test]
    fn test_valid_registration_passes() {
        assert!(validate_registration(&registration()).is_ok());
    }

    #[test]
    fn test_registration_messages() {
        let invalid = BusinessRegistration {
            user_id: None,
            gst_number: "29abcde1234f1z5".to_string(),
            services: Vec::new(),
            description: Some("x".repeat(1001)),
            ..registration()
        };
        let errors = validate_registration(&invalid).unwrap_err();
        let messages: Vec<String> = errors.errors().iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "User ID is required",
                "Valid GST number is required",
                "At least one business service is required",
                "Description must be less than 1000 characters",
            ]
        );
    }

    #[test]
    fn test_registration_requires_valid_address() {
        let mut invalid = registration();
        if let Some(address) = invalid.address.as_mut() {
            address.pincode = "12345".to_string();
        }
        let errors = validate_registration(&invalid).unwrap_err();
        assert!(errors
            .errors()
            .contains(&rule("Valid business address is required")));
    }
}
