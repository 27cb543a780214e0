/// Device identity and token fingerprints
///
/// - The device id is generated once per installation and persisted
/// - Tokens are logged only as a short SHA-256 fingerprint, never in plaintext

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

const DEVICE_SUFFIX_LENGTH: usize = 9;
const FINGERPRINT_LENGTH: usize = 12;

/// Generate a new device id: `web_<unix millis>_<9 lowercase alphanumerics>`
pub fn generate_device_id() -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(DEVICE_SUFFIX_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    format!("web_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Hash a token using SHA-256
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Short, stable identifier of a token for log correlation
pub fn fingerprint(token: &str) -> String {
    let mut hash = hash_token(token);
    hash.truncate(FINGERPRINT_LENGTH);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_device_id() {
        let id = generate_device_id();
        let parts: Vec<&str> = id.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "web");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), DEVICE_SUFFIX_LENGTH);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_device_ids_differ() {
        assert_ne!(generate_device_id(), generate_device_id());
    }

    #[test]
    fn test_fingerprint() {
        let fp1 = fingerprint("A1");
        let fp2 = fingerprint("A1");

        assert_eq!(fp1, fp2);
        assert_eq!(fp1.len(), FINGERPRINT_LENGTH);
        assert_ne!(fp1, fingerprint("A2"));
        assert!(!fp1.contains("A1"));
    }
}
