/// Domain service modules
///
/// One typed function per backend endpoint. Each validates its input,
/// issues a single call through [`ApiClient`] and maps backend failures to
/// the operation's own wording. Auth and session calls also keep the
/// token store in step.

pub mod address;
pub mod auth;
pub mod business;
pub mod order;
pub mod otp;
pub mod product;
pub mod session;
pub mod user;

use crate::error::ClientError;
use crate::http_client::ApiClient;

pub use address::AddressService;
pub use auth::AuthService;
pub use business::BusinessService;
pub use order::OrderService;
pub use otp::OtpService;
pub use product::ProductService;
pub use session::SessionService;
pub use user::UserService;

impl ApiClient {
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.clone())
    }

    pub fn sessions(&self) -> SessionService {
        SessionService::new(self.clone())
    }

    pub fn otp(&self) -> OtpService {
        OtpService::new(self.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.clone())
    }

    pub fn addresses(&self) -> AddressService {
        AddressService::new(self.clone())
    }

    pub fn businesses(&self) -> BusinessService {
        BusinessService::new(self.clone())
    }

    pub fn products(&self) -> ProductService {
        ProductService::new(self.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.clone())
    }
}

/// A 404 turned into `fallback`; every other outcome passes through.
pub(crate) fn or_if_not_found<T>(
    result: Result<T, ClientError>,
    fallback: T,
) -> Result<T, ClientError> {
    match result {
        Err(e) if e.is_not_found() => Ok(fallback),
        other => other,
    }
}

/// Path segment with reserved characters percent-encoded.
pub(crate) fn segment(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
