use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessStatus {
    PendingVerification,
    Verified,
    Suspended,
    Deactivated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    ResubmissionRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    WaterDelivery,
    TankInstallation,
    TankCleaning,
    TankMaintenance,
    WaterTesting,
    PurifierInstallation,
    PurifierMaintenance,
    BulkSupply,
    EmergencyService,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::WaterDelivery => "WATER_DELIVERY",
            ServiceType::TankInstallation => "TANK_INSTALLATION",
            ServiceType::TankCleaning => "TANK_CLEANING",
            ServiceType::TankMaintenance => "TANK_MAINTENANCE",
            ServiceType::WaterTesting => "WATER_TESTING",
            ServiceType::PurifierInstallation => "PURIFIER_INSTALLATION",
            ServiceType::PurifierMaintenance => "PURIFIER_MAINTENANCE",
            ServiceType::BulkSupply => "BULK_SUPPLY",
            ServiceType::EmergencyService => "EMERGENCY_SERVICE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessServiceOffering {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub service_type: ServiceType,
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_price: Option<Decimal>,
    /// Minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingHours {
    pub day_of_week: DayOfWeek,
    #[serde(default)]
    pub is_open: bool,
    /// `HH:mm`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_time: Option<String>,
    #[serde(default, rename = "is24Hours")]
    pub is_24_hours: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    pub id: i64,
    pub user_id: i64,
    pub business_name: String,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub business_registration_number: Option<String>,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub contact_person_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<BusinessStatus>,
    #[serde(default)]
    pub verification_status: Option<VerificationStatus>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub total_reviews: Option<u32>,
    #[serde(default)]
    pub total_orders: Option<u32>,
    #[serde(default)]
    pub completed_orders: Option<u32>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub verified_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub addresses: Vec<BusinessAddress>,
    #[serde(default)]
    pub services: Vec<BusinessServiceOffering>,
    #[serde(default)]
    pub operating_hours: Vec<OperatingHours>,
}

impl BusinessProfile {
    /// Share of orders completed, as a percentage.
    pub fn completion_rate(&self) -> Option<f64> {
        match (self.total_orders, self.completed_orders) {
            (Some(total), Some(completed)) if total > 0 => {
                Some(f64::from(completed) * 100.0 / f64::from(total))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRegistration {
    pub user_id: Option<i64>,
    pub business_name: String,
    pub business_type: String,
    pub business_registration_number: String,
    pub gst_number: String,
    pub contact_person_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub address: Option<BusinessAddress>,
    pub services: Vec<BusinessServiceOffering>,
    pub operating_hours: Vec<OperatingHours>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessVerification {
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

/// Filters of `GET /businesses/search`; unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessSearch {
    pub pincode: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub service_type: Option<ServiceType>,
    pub keyword: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<f64>,
    pub min_rating: Option<f64>,
    pub business_type: Option<String>,
}

impl BusinessSearch {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let fields: [(&str, Option<String>); 10] = [
            ("pincode", self.pincode.clone()),
            ("city", self.city.clone()),
            ("state", self.state.clone()),
            ("serviceType", self.service_type.map(|s| s.as_str().to_string())),
            ("keyword", self.keyword.clone()),
            ("latitude", self.latitude.map(|v| v.to_string())),
            ("longitude", self.longitude.map(|v| v.to_string())),
            ("radius", self.radius.map(|v| v.to_string())),
            ("minRating", self.min_rating.map(|v| v.to_string())),
            ("businessType", self.business_type.clone()),
        ];

        fields
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (key.to_string(), v))
            })
            .collect()
    }
}
