use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub services: ServiceSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub device: DeviceSettings,
}

/// Base URLs of the four backend services, each already ending in `/api/v1`
#[derive(serde::Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ServiceSettings {
    pub user_base_url: String,
    pub business_base_url: String,
    pub product_base_url: String,
    pub order_base_url: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            user_base_url: "http://localhost:8081/api/v1".to_string(),
            business_base_url: "http://localhost:8082/api/v1".to_string(),
            product_base_url: "http://localhost:8083/api/v1".to_string(),
            order_base_url: "http://localhost:8084/api/v1".to_string(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Whether a refresh response must carry a new refresh token
#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTokenRotation {
    /// Keep the previous refresh token when none is returned
    #[default]
    Optional,
    /// Treat a missing refresh token as a failed refresh
    Required,
}

#[derive(serde::Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SessionSettings {
    pub refresh_token_rotation: RefreshTokenRotation,
    pub login_path: String,
    pub store_path: PathBuf,
    /// Refresh ahead of expiry when less than this many seconds remain
    pub refresh_buffer_secs: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            refresh_token_rotation: RefreshTokenRotation::Optional,
            login_path: "/login".to_string(),
            store_path: PathBuf::from(".waterwala/session.json"),
            refresh_buffer_secs: 300,
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
#[serde(default)]
pub struct DeviceSettings {
    pub device_type: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            device_type: "WEB".to_string(),
        }
    }
}

/// Loads settings from an optional `configuration` file, then `APP__*`
/// environment variables (e.g. `APP__HTTP__TIMEOUT_SECS=5`).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    fn validate(&self) -> Result<(), ConfigError> {
        let urls = [
            ("services.user_base_url", &self.services.user_base_url),
            ("services.business_base_url", &self.services.business_base_url),
            ("services.product_base_url", &self.services.product_base_url),
            ("services.order_base_url", &self.services.order_base_url),
        ];

        for (key, url) in urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!("{} = {}", key, url)));
            }
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "http.timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
