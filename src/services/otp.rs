use crate::error::{ClientError, ValidationError};
use crate::http_client::{ApiClient, Backend, RequestOptions, NO_BODY};
use crate::models::{OtpResponse, OtpType};
use crate::services::auth::TOO_MANY_OTP_REQUESTS;
use crate::validators::{is_valid_email, is_valid_otp, is_valid_phone};

/// Verification codes for phone, email and password reset
#[derive(Clone)]
pub struct OtpService {
    client: ApiClient,
}

impl OtpService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn send_phone_verification(&self, phone: &str) -> Result<OtpResponse, ClientError> {
        let phone = is_valid_phone(phone)?;
        self.send("/otp/send/phone-verification", "phone", phone)
            .await
            .map_err(|e| {
                e.describe(
                    &[
                        (429, TOO_MANY_OTP_REQUESTS),
                        (400, "Invalid phone number format."),
                    ],
                    "Failed to send phone verification OTP",
                )
            })
    }

    pub async fn send_email_verification(&self, email: &str) -> Result<OtpResponse, ClientError> {
        let email = is_valid_email(email)?;
        self.send("/otp/send/email-verification", "email", email)
            .await
            .map_err(|e| {
                e.describe(
                    &[
                        (429, TOO_MANY_OTP_REQUESTS),
                        (400, "Invalid email format."),
                    ],
                    "Failed to send email verification OTP",
                )
            })
    }

    pub async fn send_password_reset(&self, phone: &str) -> Result<OtpResponse, ClientError> {
        let phone = is_valid_phone(phone)?;
        self.send("/otp/send/password-reset", "phone", phone)
            .await
            .map_err(|e| {
                e.describe(
                    &[
                        (429, TOO_MANY_OTP_REQUESTS),
                        (404, "Phone number not registered."),
                    ],
                    "Failed to send password reset OTP",
                )
            })
    }

    pub async fn verify(
        &self,
        contact: &str,
        otp_code: &str,
        otp_type: OtpType,
    ) -> Result<OtpResponse, ClientError> {
        let contact = contact.trim();
        if contact.is_empty() {
            return Err(ValidationError::EmptyField("Contact").into());
        }
        let otp_code = is_valid_otp(otp_code)?;

        let options = RequestOptions::new()
            .query("contact", contact)
            .query("otpCode", otp_code)
            .query("type", otp_type.as_str());

        self.client
            .post(Backend::User, "/otp/verify", NO_BODY, options)
            .await
            .map_err(|e| {
                e.describe(
                    &[(400, "Invalid OTP code or OTP has expired.")],
                    "Failed to verify OTP",
                )
            })
    }

    /// Whether a pending code exists; a 404 reads as `false`.
    pub async fn status(&self, contact: &str, otp_type: OtpType) -> Result<bool, ClientError> {
        let options = RequestOptions::new()
            .query("contact", contact.trim())
            .query("type", otp_type.as_str());

        let result = self
            .client
            .get::<Option<bool>>(Backend::User, "/otp/status", options)
            .await
            .map(Option::unwrap_or_default);

        super::or_if_not_found(result, false)
            .map_err(|e| e.describe(&[], "Failed to check OTP status"))
    }

    pub fn expiry_minutes(otp_type: OtpType) -> u32 {
        otp_type.expiry_minutes()
    }

    /// `+91 XXXXX XXXXX` for a valid 10-digit number, otherwise unchanged.
    pub fn format_phone(phone: &str) -> String {
        match is_valid_phone(phone) {
            Ok(digits) => format!("+91 {} {}", &digits[..5], &digits[5..]),
            Err(_) => phone.to_string(),
        }
    }

    async fn send(&self, path: &str, key: &str, value: String) -> Result<OtpResponse, ClientError> {
        self.client
            .post(Backend::User, path, NO_BODY, RequestOptions::new().query(key, value))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(OtpService::format_phone("9876543210"), "+91 98765 43210");
        assert_eq!(OtpService::format_phone("12345"), "12345");
    }

    #[test]
    fn test_expiry_minutes() {
        assert_eq!(OtpService::expiry_minutes(OtpType::Login), 5);
        assert_eq!(OtpService::expiry_minutes(OtpType::EmailVerification), 10);
    }
}
