pub mod auth;
pub mod configuration;
pub mod error;
pub mod guard;
pub mod http_client;
pub mod logger;
pub mod models;
pub mod notification;
pub mod services;
pub mod telemetry;
pub mod token_store;
pub mod validators;

pub use configuration::{get_configuration, Settings};
pub use error::ClientError;
pub use http_client::{ApiClient, LoggingNavigator, Navigator};
pub use token_store::SessionStore;
