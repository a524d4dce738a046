use serde::{Deserialize, Serialize};

/// A user profile as returned by the notes API.
///
/// Replaced wholesale on every successful auth operation, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "dob")]
    pub date_of_birth: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Response to an OTP request (`/api/auth/signup`, `/api/auth/signin`).
///
/// The API echoes the passcode back in the response; the UI displays it
/// instead of relying on out-of-band delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpReceipt {
    pub message: String,
    pub email: String,
    #[serde(rename = "_id")]
    pub id: String,
    pub otp: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: String,
}

/// Response to a successful verification or federated sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionGrant {
    pub user: User,
    #[serde(default)]
    pub token: Option<String>,
    pub message: String,
}

/// Bare `{message}` acknowledgement (`/api/auth/logout`).
#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    pub message: String,
}

/// `/api/health` probe response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}
