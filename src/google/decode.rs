use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Deserialize;

use crate::gateway::ApiError;

/// Informational claims carried in a Google credential payload.
///
/// Everything is optional: the decode is structural, for diagnostics only,
/// and no field is ever trusted for authorization decisions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

/// Structurally decode the payload segment of a Google credential.
///
/// No signature check of any kind happens here; the raw credential goes to
/// the gateway unmodified regardless of what this returns.
/// # Errors
/// Returns [`ApiError::Decode`] when the payload segment is missing, is
/// not base64url, or does not hold a JSON object.
pub fn decode_credential(credential: &str) -> Result<GoogleClaims, ApiError> {
    let payload = credential
        .split('.')
        .nth(1)
        .ok_or_else(|| ApiError::Decode("credential has no payload segment".to_string()))?;

    let bytes = Base64UrlUnpadded::decode_vec(payload)
        .map_err(|err| ApiError::Decode(format!("payload is not base64url: {err}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|err| ApiError::Decode(format!("payload is not a claims object: {err}")))
}
