use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    WaterCans,
    WaterContainers,
    BulkWater,
    WaterTanks,
    InstallationServices,
    MaintenanceServices,
    EquipmentRental,
    WaterTesting,
    Purifiers,
    Accessories,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::WaterCans => "WATER_CANS",
            ProductCategory::WaterContainers => "WATER_CONTAINERS",
            ProductCategory::BulkWater => "BULK_WATER",
            ProductCategory::WaterTanks => "WATER_TANKS",
            ProductCategory::InstallationServices => "INSTALLATION_SERVICES",
            ProductCategory::MaintenanceServices => "MAINTENANCE_SERVICES",
            ProductCategory::EquipmentRental => "EQUIPMENT_RENTAL",
            ProductCategory::WaterTesting => "WATER_TESTING",
            ProductCategory::Purifiers => "PURIFIERS",
            ProductCategory::Accessories => "ACCESSORIES",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Product,
    Service,
    Subscription,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInventory {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub current_stock: Option<i32>,
    #[serde(default)]
    pub reserved_stock: Option<i32>,
    #[serde(default)]
    pub min_stock_level: Option<i32>,
    #[serde(default)]
    pub max_stock_level: Option<i32>,
    #[serde(default)]
    pub reorder_point: Option<i32>,
    #[serde(default)]
    pub reorder_quantity: Option<i32>,
    #[serde(default)]
    pub warehouse_location: Option<String>,
    #[serde(default)]
    pub last_updated: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sku: String,
    #[serde(default)]
    pub category: Option<ProductCategory>,
    #[serde(default, rename = "type")]
    pub product_type: Option<ProductType>,
    pub base_price: Decimal,
    #[serde(default)]
    pub discounted_price: Option<Decimal>,
    #[serde(default)]
    pub available_quantity: Option<i32>,
    #[serde(default)]
    pub min_order_quantity: Option<i32>,
    #[serde(default)]
    pub max_order_quantity: Option<i32>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub business_id: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub additional_images: Vec<String>,
    #[serde(default)]
    pub inventory: Option<ProductInventory>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Product {
    /// Discounted price when one applies, otherwise the base price.
    pub fn effective_price(&self) -> Decimal {
        match self.discounted_price {
            Some(discounted) if discounted < self.base_price => discounted,
            _ => self.base_price,
        }
    }

    pub fn is_purchasable(&self) -> bool {
        self.is_active.unwrap_or(true)
            && self.is_available.unwrap_or(true)
            && self.available_quantity.map_or(true, |q| q > 0)
    }
}

/// Body of `POST /products`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sku: String,
    pub category: Option<ProductCategory>,
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
    pub base_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<Decimal>,
    pub available_quantity: Option<i32>,
    pub min_order_quantity: Option<i32>,
    pub max_order_quantity: Option<i32>,
    pub unit: String,
    pub business_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_stock: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_stock_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stock_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_point: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse_location: Option<String>,
}

/// Body of `PUT /products/{id}`; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order_quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_order_quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}
