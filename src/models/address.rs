use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    Home,
    Office,
    Other,
}

impl AddressType {
    pub fn display_name(&self) -> &'static str {
        match self {
            AddressType::Home => "Home",
            AddressType::Office => "Office",
            AddressType::Other => "Other",
        }
    }

    fn priority(&self) -> u8 {
        match self {
            AddressType::Home => 1,
            AddressType::Office => 2,
            AddressType::Other => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, rename = "type")]
    pub address_type: Option<AddressType>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Body of address create and update calls
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    /// Defaults to "India" when left empty
    pub country: Option<String>,
    #[serde(rename = "type")]
    pub address_type: Option<AddressType>,
    /// Defaults to `false`
    pub is_default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

fn join_parts<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
    parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Address {
    pub fn format_full(&self) -> String {
        join_parts([
            Some(self.address_line1.as_str()),
            self.address_line2.as_deref(),
            self.landmark.as_deref(),
            Some(self.city.as_str()),
            Some(self.state.as_str()),
            Some(self.pincode.as_str()),
            self.country.as_deref(),
        ])
    }

    pub fn format_short(&self) -> String {
        join_parts([
            Some(self.address_line1.as_str()),
            Some(self.city.as_str()),
            Some(self.pincode.as_str()),
        ])
    }

    /// Great-circle distance in kilometres, rounded to two decimals.
    pub fn distance_km(&self, other: &Address) -> Option<f64> {
        let (lat1, lon1) = (self.latitude?, self.longitude?);
        let (lat2, lon2) = (other.latitude?, other.longitude?);

        let d_lat = (lat2 - lat1).to_radians();
        let d_lon = (lon2 - lon1).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        Some((EARTH_RADIUS_KM * c * 100.0).round() / 100.0)
    }

    fn type_priority(&self) -> u8 {
        self.address_type.map_or(3, |t| t.priority())
    }
}

/// Default address first, then HOME < OFFICE < OTHER, then newest first.
pub fn sort_for_display(addresses: &mut [Address]) {
    addresses.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.type_priority().cmp(&b.type_priority()))
            .then_with(|| match (a.created_at, b.created_at) {
                (Some(a_created), Some(b_created)) => b_created.cmp(&a_created),
                _ => Ordering::Equal,
            })
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(id: i64, address_type: AddressType, is_default: bool, created: &str) -> Address {
        Address {
            id,
            address_line1: "12 MG Road".to_string(),
            address_line2: None,
            landmark: Some("Near Metro".to_string()),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560001".to_string(),
            country: Some("India".to_string()),
            address_type: Some(address_type),
            is_default,
            latitude: None,
            longitude: None,
            created_at: created.parse().ok(),
            updated_at: None,
        }
    }

    #[test]
    fn test_format_full_skips_empty_parts() {
        let mut a = address(1, AddressType::Home, false, "2024-01-01T00:00:00");
        a.address_line2 = Some("  ".to_string());
        assert_eq!(
            a.format_full(),
            "12 MG Road, Near Metro, Bengaluru, Karnataka, 560001, India"
        );
        assert_eq!(a.format_short(), "12 MG Road, Bengaluru, 560001");
    }

    #[test]
    fn test_sort_for_display() {
        let mut addresses = vec![
            address(1, AddressType::Other, false, "2024-03-01T00:00:00"),
            address(2, AddressType::Home, false, "2024-01-01T00:00:00"),
            address(3, AddressType::Office, true, "2024-01-01T00:00:00"),
            address(4, AddressType::Home, false, "2024-02-01T00:00:00"),
        ];
        sort_for_display(&mut addresses);
        let ids: Vec<i64> = addresses.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3, 4, 2, 1]);
    }

    #[test]
    fn test_distance_km() {
        let mut bengaluru = address(1, AddressType::Home, false, "");
        bengaluru.latitude = Some(12.9716);
        bengaluru.longitude = Some(77.5946);
        let mut mysuru = address(2, AddressType::Home, false, "");
        mysuru.latitude = Some(12.2958);
        mysuru.longitude = Some(76.6394);

        let distance = bengaluru.distance_km(&mysuru).unwrap();
        assert!((distance - 128.0).abs() < 2.0, "distance was {}", distance);
        assert_eq!(bengaluru.distance_km(&bengaluru), Some(0.0));

        let unknown = address(3, AddressType::Home, false, "");
        assert_eq!(bengaluru.distance_km(&unknown), None);
    }
}
