use rust_decimal::Decimal;
use serde::de::IgnoredAny;

use crate::error::{ClientError, ValidationError, ValidationErrors};
use crate::http_client::{ApiClient, Backend, RequestOptions, NO_BODY};
use crate::models::{Page, PageQuery, Product, ProductCategory, ProductCreate, ProductUpdate};

use super::segment;

const PRODUCT_NOT_FOUND: &str = "Product not found";
const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Catalogue and inventory calls of the product service
#[derive(Clone)]
pub struct ProductService {
    client: ApiClient,
}

impl ProductService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, product: &ProductCreate) -> Result<Product, ClientError> {
        let product = validate_product(product)?;
        self.client
            .post(Backend::Product, "/products", Some(&product), RequestOptions::new())
            .await
            .map_err(|e| {
                e.describe(
                    &[(409, "Product with this SKU already exists")],
                    "Failed to create product",
                )
            })
    }

    pub async fn get(&self, id: &str) -> Result<Product, ClientError> {
        self.client
            .get(Backend::Product, &product_path(id, ""), RequestOptions::new())
            .await
            .map_err(|e| e.describe(&[(404, PRODUCT_NOT_FOUND)], "Failed to fetch product"))
    }

    pub async fn by_sku(&self, sku: &str) -> Result<Product, ClientError> {
        self.client
            .get(
                Backend::Product,
                &format!("/products/sku/{}", segment(sku.trim())),
                RequestOptions::new(),
            )
            .await
            .map_err(|e| e.describe(&[(404, PRODUCT_NOT_FOUND)], "Failed to fetch product by SKU"))
    }

    pub async fn update(&self, id: &str, update: &ProductUpdate) -> Result<Product, ClientError> {
        let update = validate_update(update)?;
        self.client
            .put(Backend::Product, &product_path(id, ""), Some(&update), RequestOptions::new())
            .await
            .map_err(|e| {
                e.describe(
                    &[
                        (404, PRODUCT_NOT_FOUND),
                        (409, "SKU already exists for another product"),
                    ],
                    "Failed to update product",
                )
            })
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.client
            .delete::<IgnoredAny>(Backend::Product, &product_path(id, ""), RequestOptions::new())
            .await
            .map(|_| ())
            .map_err(|e| e.describe(&[(404, PRODUCT_NOT_FOUND)], "Failed to delete product"))
    }

    pub async fn list_available(&self, page: &PageQuery) -> Result<Page<Product>, ClientError> {
        self.client
            .get(
                Backend::Product,
                "/products",
                RequestOptions::new().query_pairs(page.to_query("sortDirection")),
            )
            .await
            .map_err(|e| e.describe(&[], "Failed to fetch products"))
    }

    pub async fn search(&self, name: &str) -> Result<Vec<Product>, ClientError> {
        self.list(
            "/products/search".to_string(),
            RequestOptions::new().query("name", name.trim()),
            "Failed to search products",
        )
        .await
    }

    pub async fn by_category(&self, category: ProductCategory) -> Result<Vec<Product>, ClientError> {
        self.list(
            format!("/products/category/{}", category.as_str()),
            RequestOptions::new(),
            "Failed to fetch products by category",
        )
        .await
    }

    pub async fn by_business(&self, business_id: i64) -> Result<Vec<Product>, ClientError> {
        self.list(
            format!("/products/business/{}", business_id),
            RequestOptions::new(),
            "Failed to fetch products by business",
        )
        .await
    }

    /// Adds `quantity` (negative to subtract) to the current stock.
    pub async fn update_stock(&self, id: &str, quantity: i32) -> Result<(), ClientError> {
        self.client
            .patch::<_, IgnoredAny>(
                Backend::Product,
                &product_path(id, "/stock"),
                NO_BODY,
                RequestOptions::new().query("quantity", quantity),
            )
            .await
            .map(|_| ())
            .map_err(|e| e.describe(&[(404, PRODUCT_NOT_FOUND)], "Failed to update product stock"))
    }

    pub async fn reserve_stock(&self, id: &str, quantity: u32) -> Result<(), ClientError> {
        positive_quantity(quantity)?;
        self.client
            .post::<_, IgnoredAny>(
                Backend::Product,
                &product_path(id, "/reserve-stock"),
                NO_BODY,
                RequestOptions::new().query("quantity", quantity),
            )
            .await
            .map(|_| ())
            .map_err(|e| {
                e.describe(
                    &[
                        (400, "Insufficient stock available"),
                        (404, PRODUCT_NOT_FOUND),
                    ],
                    "Failed to reserve stock",
                )
            })
    }

    pub async fn release_stock(&self, id: &str, quantity: u32) -> Result<(), ClientError> {
        positive_quantity(quantity)?;
        self.client
            .post::<_, IgnoredAny>(
                Backend::Product,
                &product_path(id, "/release-stock"),
                NO_BODY,
                RequestOptions::new().query("quantity", quantity),
            )
            .await
            .map(|_| ())
            .map_err(|e| e.describe(&[(404, PRODUCT_NOT_FOUND)], "Failed to release stock"))
    }

    /// Any failure reads as "not in stock".
    pub async fn in_stock(&self, id: &str, required_quantity: u32) -> bool {
        self.flag(
            &product_path(id, "/stock-check"),
            RequestOptions::new().query("requiredQuantity", required_quantity),
        )
        .await
    }

    pub async fn low_stock(&self) -> Result<Vec<Product>, ClientError> {
        self.list(
            "/products/low-stock".to_string(),
            RequestOptions::new(),
            "Failed to fetch low stock products",
        )
        .await
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> Result<(), ClientError> {
        self.client
            .patch::<_, IgnoredAny>(
                Backend::Product,
                &product_path(id, "/status"),
                NO_BODY,
                RequestOptions::new().query("isActive", is_active),
            )
            .await
            .map(|_| ())
            .map_err(|e| e.describe(&[(404, PRODUCT_NOT_FOUND)], "Failed to update product status"))
    }

    pub async fn set_available(&self, id: &str, is_available: bool) -> Result<(), ClientError> {
        self.client
            .patch::<_, IgnoredAny>(
                Backend::Product,
                &product_path(id, "/availability"),
                NO_BODY,
                RequestOptions::new().query("isAvailable", is_available),
            )
            .await
            .map(|_| ())
            .map_err(|e| {
                e.describe(&[(404, PRODUCT_NOT_FOUND)], "Failed to update product availability")
            })
    }

    /// Any failure reads as "not unique".
    pub async fn is_sku_unique(&self, sku: &str) -> bool {
        self.flag(
            &format!("/products/validate/sku/{}", segment(sku.trim())),
            RequestOptions::new(),
        )
        .await
    }

    async fn list(
        &self,
        path: String,
        options: RequestOptions,
        fallback: &str,
    ) -> Result<Vec<Product>, ClientError> {
        self.client
            .get::<Option<Vec<Product>>>(Backend::Product, &path, options)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| e.describe(&[], fallback))
    }

    async fn flag(&self, path: &str, options: RequestOptions) -> bool {
        match self
            .client
            .get::<Option<bool>>(Backend::Product, path, options)
            .await
        {
            Ok(flag) => flag.unwrap_or(false),
            Err(e) => {
                tracing::debug!(path, error = %e, "Product check failed");
                false
            }
        }
    }
}

fn product_path(id: &str, suffix: &str) -> String {
    format!("/products/{}{}", segment(id), suffix)
}

fn positive_quantity(quantity: u32) -> Result<(), ValidationError> {
    if quantity == 0 {
        return Err(ValidationError::Rule("Quantity must be at least 1".to_string()));
    }
    Ok(())
}

fn rule(errors: &mut ValidationErrors, failed: bool, message: &str) {
    if failed {
        errors.push(ValidationError::Rule(message.to_string()));
    }
}

fn char_count_outside(value: &str, min: usize, max: usize) -> bool {
    let count = value.trim().chars().count();
    count < min || count > max
}

/// Catalogue rules for a new product; every violation is reported.
pub fn validate_product(product: &ProductCreate) -> Result<ProductCreate, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let minimum_price = Decimal::new(1, 2);

    rule(
        &mut errors,
        char_count_outside(&product.name, 2, 255),
        "Product name must be between 2 and 255 characters",
    );
    rule(
        &mut errors,
        char_count_outside(&product.sku, 3, 50),
        "SKU must be between 3 and 50 characters",
    );
    rule(
        &mut errors,
        product.category.is_none(),
        "Valid product category is required",
    );
    rule(
        &mut errors,
        product.product_type.is_none(),
        "Valid product type is required (PRODUCT, SERVICE, SUBSCRIPTION)",
    );
    rule(
        &mut errors,
        product.base_price.map_or(true, |price| price < minimum_price),
        "Base price must be at least 0.01",
    );
    rule(
        &mut errors,
        product.discounted_price.is_some_and(|price| price < minimum_price),
        "Discounted price must be at least 0.01",
    );
    rule(
        &mut errors,
        product.available_quantity.map_or(true, |q| q < 0),
        "Available quantity must be 0 or greater",
    );
    rule(
        &mut errors,
        product.min_order_quantity.map_or(true, |q| q < 1),
        "Minimum order quantity must be at least 1",
    );
    rule(
        &mut errors,
        product.max_order_quantity.map_or(true, |q| q < 1),
        "Maximum order quantity must be at least 1",
    );
    if let (Some(min), Some(max)) = (product.min_order_quantity, product.max_order_quantity) {
        rule(
            &mut errors,
            max < min,
            "Maximum order quantity must be greater than or equal to minimum order quantity",
        );
    }
    rule(
        &mut errors,
        product.unit.trim().is_empty(),
        "Unit of measurement is required",
    );
    rule(
        &mut errors,
        product.business_id.is_none(),
        "Business ID is required",
    );

    rule(
        &mut errors,
        product.initial_stock.map_or(true, |q| q < 0),
        "Initial stock must be 0 or greater",
    );
    rule(
        &mut errors,
        product.min_stock_level.map_or(true, |q| q < 0),
        "Minimum stock level must be 0 or greater",
    );
    rule(
        &mut errors,
        product.max_stock_level.map_or(true, |q| q < 1),
        "Maximum stock level must be at least 1",
    );
    rule(
        &mut errors,
        product.reorder_point.map_or(true, |q| q < 0),
        "Reorder point must be 0 or greater",
    );
    rule(
        &mut errors,
        product.reorder_quantity.map_or(true, |q| q < 1),
        "Reorder quantity must be at least 1",
    );
    rule(
        &mut errors,
        product
            .description
            .as_deref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LENGTH),
        "Description must be less than 1000 characters",
    );

    errors.finish(ProductCreate {
        name: product.name.trim().to_string(),
        sku: product.sku.trim().to_string(),
        unit: product.unit.trim().to_string(),
        ..product.clone()
    })
}

fn validate_update(update: &ProductUpdate) -> Result<ProductUpdate, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let minimum_price = Decimal::new(1, 2);

    rule(
        &mut errors,
        update
            .name
            .as_deref()
            .is_some_and(|name| char_count_outside(name, 2, 255)),
        "Product name must be between 2 and 255 characters",
    );
    rule(
        &mut errors,
        update.base_price.is_some_and(|price| price < minimum_price),
        "Base price must be at least 0.01",
    );
    rule(
        &mut errors,
        update.discounted_price.is_some_and(|price| price < minimum_price),
        "Discounted price must be at least 0.01",
    );
    rule(
        &mut errors,
        update.available_quantity.is_some_and(|q| q < 0),
        "Available quantity must be 0 or greater",
    );
    if let (Some(min), Some(max)) = (update.min_order_quantity, update.max_order_quantity) {
        rule(
            &mut errors,
            max < min,
            "Maximum order quantity must be greater than or equal to minimum order quantity",
        );
    }
    rule(
        &mut errors,
        update
            .description
            .as_deref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LENGTH),
        "Description must be less than 1000 characters",
    );

    errors.finish(update.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductType;

    fn product() -> ProductCreate {
        ProductCreate {
            name: " Bisleri 20L Can ".to_string(),
            description: None,
            sku: "CAN-20L".to_string(),
            category: Some(ProductCategory::WaterCans),
            product_type: Some(ProductType::Product),
            base_price: Some(Decimal::new(4550, 2)),
            discounted_price: None,
            available_quantity: Some(100),
            min_order_quantity: Some(1),
            max_order_quantity: Some(10),
            unit: "can".to_string(),
            business_id: Some(3),
            brand: None,
            image_url: None,
            additional_images: Vec::new(),
            initial_stock: Some(100),
            min_stock_level: Some(10),
            max_stock_level: Some(500),
            reorder_point: Some(20),
            reorder_quantity: Some(50),
            warehouse_location: None,
        }
    }

    #[test]
    fn test_valid_product_is_trimmed() {
        let validated = validate_product(&product()).unwrap();
        assert_eq!(validated.name, "Bisleri 20L Can");
    }

    #[test]
    fn test_product_quantity_rules() {
        let invalid = ProductCreate {
            min_order_quantity: Some(5),
            max_order_quantity: Some(2),
            base_price: Some(Decimal::ZERO),
            ..product()
        };
        let errors = validate_product(&invalid).unwrap_err();
        let messages: Vec<String> = errors.errors().iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "Base price must be at least 0.01",
                "Maximum order quantity must be greater than or equal to minimum order quantity",
            ]
        );
    }

    #[test]
    fn test_product_missing_inventory_fields() {
        let invalid = ProductCreate {
            initial_stock: None,
            reorder_quantity: Some(0),
            business_id: None,
            ..product()
        };
        let errors = validate_product(&invalid).unwrap_err();
        assert_eq!(errors.errors().len(), 3);
    }

    #[test]
    fn test_update_checks_present_fields_only() {
        assert!(validate_update(&ProductUpdate::default()).is_ok());
        let invalid = ProductUpdate {
            name: Some("x".to_string()),
            ..Default::default()
        };
        assert!(validate_update(&invalid).is_err());
    }

    #[test]
    fn test_product_path_encodes_id() {
        assert_eq!(product_path("p 1", "/stock"), "/products/p%201/stock");
    }
}
