use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OtpType {
    Login,
    Registration,
    PasswordReset,
    PhoneVerification,
    EmailVerification,
}

impl OtpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpType::Login => "LOGIN",
            OtpType::Registration => "REGISTRATION",
            OtpType::PasswordReset => "PASSWORD_RESET",
            OtpType::PhoneVerification => "PHONE_VERIFICATION",
            OtpType::EmailVerification => "EMAIL_VERIFICATION",
        }
    }

    /// Minutes an issued code stays valid
    pub fn expiry_minutes(&self) -> u32 {
        match self {
            OtpType::Login | OtpType::PasswordReset => 5,
            _ => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OtpStatus {
    Pending,
    Verified,
    Expired,
    Failed,
}

impl OtpStatus {
    pub fn description(&self) -> &'static str {
        match self {
            OtpStatus::Pending => "OTP sent and waiting for verification",
            OtpStatus::Verified => "OTP successfully verified",
            OtpStatus::Expired => "OTP has expired",
            OtpStatus::Failed => "OTP verification failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub otp_type: Option<OtpType>,
    #[serde(default)]
    pub status: Option<OtpStatus>,
    #[serde(default)]
    pub expires_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub remaining_attempts: Option<u32>,
}

impl OtpResponse {
    pub fn is_verified(&self) -> bool {
        self.status == Some(OtpStatus::Verified) || self.success == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_minutes() {
        assert_eq!(OtpType::Login.expiry_minutes(), 5);
        assert_eq!(OtpType::PasswordReset.expiry_minutes(), 5);
        assert_eq!(OtpType::Registration.expiry_minutes(), 10);
        assert_eq!(OtpType::PhoneVerification.expiry_minutes(), 10);
        assert_eq!(OtpType::EmailVerification.expiry_minutes(), 10);
    }

    #[test]
    fn test_otp_response_decodes() {
        let response: OtpResponse = serde_json::from_str(
            r#"{"success":true,"type":"PHONE_VERIFICATION","status":"VERIFIED","remainingAttempts":2}"#,
        )
        .unwrap();
        assert_eq!(response.otp_type, Some(OtpType::PhoneVerification));
        assert!(response.is_verified());
    }
}
