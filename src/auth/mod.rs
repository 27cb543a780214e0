/// Authentication helpers
///
/// Client-side token inspection, device identity and log-safe token
/// fingerprints.

mod claims;
mod token;

pub use claims::token_expiry;
pub use claims::Claims;
pub use token::fingerprint;
pub use token::generate_device_id;
