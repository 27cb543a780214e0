use crate::error::{ClientError, ValidationError, ValidationErrors};
use crate::http_client::{ApiClient, Backend, RequestOptions, NO_BODY};
use crate::models::{NewOrder, Order};
use crate::validators::{is_valid_phone, is_valid_pincode, required};

use super::segment;

const ORDER_NOT_FOUND: &str = "Order not found";
const MAX_RECIPIENT_NAME_LENGTH: usize = 100;
const MAX_LINE_LENGTH: usize = 100;

#[derive(Clone)]
pub struct OrderService {
    client: ApiClient,
}

impl OrderService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, order: &NewOrder) -> Result<Order, ClientError> {
        let order = validate_order(order)?;
        let created: Order = self
            .client
            .post(Backend::Order, "/orders", Some(&order), RequestOptions::new())
            .await
            .map_err(|e| e.describe(&[], "Failed to create order"))?;

        tracing::info!(
            order_id = created.id,
            order_number = %created.order_number,
            "Order placed"
        );
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<Order, ClientError> {
        self.client
            .get(Backend::Order, &format!("/orders/{}", id), RequestOptions::new())
            .await
            .map_err(|e| e.describe(&[(404, ORDER_NOT_FOUND)], "Failed to fetch order"))
    }

    pub async fn by_number(&self, order_number: &str) -> Result<Order, ClientError> {
        self.client
            .get(
                Backend::Order,
                &format!("/orders/number/{}", segment(order_number.trim())),
                RequestOptions::new(),
            )
            .await
            .map_err(|e| e.describe(&[(404, ORDER_NOT_FOUND)], "Failed to fetch order"))
    }

    pub async fn by_customer(&self, customer_id: i64) -> Result<Vec<Order>, ClientError> {
        self.list(
            format!("/orders/customer/{}", customer_id),
            "Failed to fetch customer orders",
        )
        .await
    }

    pub async fn by_business(&self, business_id: i64) -> Result<Vec<Order>, ClientError> {
        self.list(
            format!("/orders/business/{}", business_id),
            "Failed to fetch business orders",
        )
        .await
    }

    pub async fn confirm(&self, id: i64) -> Result<Order, ClientError> {
        self.transition(id, "confirm", RequestOptions::new(), "Failed to confirm order")
            .await
    }

    pub async fn dispatch(&self, id: i64, delivery_person_id: i64) -> Result<Order, ClientError> {
        self.transition(
            id,
            "dispatch",
            RequestOptions::new().query("deliveryPersonId", delivery_person_id),
            "Failed to dispatch order",
        )
        .await
    }

    pub async fn deliver(&self, id: i64) -> Result<Order, ClientError> {
        self.transition(id, "deliver", RequestOptions::new(), "Failed to mark order delivered")
            .await
    }

    pub async fn cancel(&self, id: i64, reason: &str) -> Result<Order, ClientError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::EmptyField("Cancellation reason").into());
        }

        self.transition(
            id,
            "cancel",
            RequestOptions::new().query("reason", reason),
            "Failed to cancel order",
        )
        .await
    }

    /// `PUT /orders/{id}/{action}`; a 400 means the order's current status
    /// does not allow the step.
    async fn transition(
        &self,
        id: i64,
        action: &str,
        options: RequestOptions,
        fallback: &str,
    ) -> Result<Order, ClientError> {
        self.client
            .put(Backend::Order, &format!("/orders/{}/{}", id, action), NO_BODY, options)
            .await
            .map_err(|e| e.describe(&[(404, ORDER_NOT_FOUND)], fallback))
    }

    async fn list(&self, path: String, fallback: &str) -> Result<Vec<Order>, ClientError> {
        self.client
            .get::<Option<Vec<Order>>>(Backend::Order, &path, RequestOptions::new())
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| e.describe(&[], fallback))
    }
}

/// Delivery contact and address checks plus at least one line item.
pub fn validate_order(order: &NewOrder) -> Result<NewOrder, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let address = &order.delivery_address;

    let recipient_name = errors.check(required(
        &address.recipient_name,
        "Recipient name",
        MAX_RECIPIENT_NAME_LENGTH,
    ));
    let recipient_phone = errors.check(is_valid_phone(&address.recipient_phone));
    let address_line1 = errors.check(required(&address.address_line1, "Address line 1", MAX_LINE_LENGTH));
    let pincode = errors.check(is_valid_pincode(&address.pincode));

    if order.items.is_empty() {
        errors.push(ValidationError::Rule(
            "Order must contain at least one item".to_string(),
        ));
    }
    if order.items.iter().any(|item| item.quantity < 1) {
        errors.push(ValidationError::Rule(
            "Item quantity must be at least 1".to_string(),
        ));
    }

    let mut validated = order.clone();
    validated.delivery_address.recipient_name = recipient_name.unwrap_or_default();
    validated.delivery_address.recipient_phone = recipient_phone.unwrap_or_default();
    validated.delivery_address.address_line1 = address_line1.unwrap_or_default();
    validated.delivery_address.pincode = pincode.unwrap_or_default();
    errors.finish(validated)
}
