//! Client for the notes API Gateway.
//!
//! The gateway performs the actual auth calls and is where failures are
//! classified, once, into [`ApiError`]. Every call attaches
//! `Authorization: Bearer <token>` when a token is present in either
//! storage tier.

pub mod error;
pub mod types;

pub use error::ApiError;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tracing::{debug, info_span, Instrument};
use url::Url;

use crate::session::SessionStore;
use types::{Acknowledgement, HealthStatus, OtpReceipt, SessionGrant, User};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Mine an error body for something human-readable before falling back to
/// the bare status line.
fn api_error_message(json_response: &Value, status: StatusCode) -> String {
    for key in ["message", "error", "details"] {
        if let Some(message) = json_response.get(key).and_then(Value::as_str) {
            return message.to_string();
        }
    }
    format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown status")
    )
}

#[derive(Debug, Clone)]
pub struct ApiGateway {
    base_url: String,
    client: Client,
    store: SessionStore,
}

impl ApiGateway {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, store: SessionStore) -> Result<Self, ApiError> {
        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;
        Ok(Self {
            base_url: base_url.to_string(),
            client,
            store,
        })
    }

    /// # Errors
    /// Returns an error if the base URL cannot be parsed, has no host, or
    /// uses an unsupported scheme.
    pub fn endpoint_url(&self, path: &str) -> Result<String, ApiError> {
        let url = Url::parse(&self.base_url)
            .map_err(|err| ApiError::Network(format!("Error parsing URL: {err}")))?;

        let scheme = url.scheme();

        let host = url
            .host()
            .ok_or_else(|| ApiError::Network("Error parsing URL: no host specified".to_string()))?
            .to_owned();

        let port = match url.port() {
            Some(p) => p,
            None => match scheme {
                "http" => 80,
                "https" => 443,
                _ => {
                    return Err(ApiError::Network(format!(
                        "Error parsing URL: unsupported scheme {scheme}"
                    )))
                }
            },
        };

        let endpoint_url = format!("{scheme}://{host}:{port}{path}");

        debug!("endpoint URL: {}", endpoint_url);

        Ok(endpoint_url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(token) = self.store.bearer_token() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        builder
    }

    async fn accept(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let json_response: Value = response.json().await.unwrap_or(Value::Null);

        Err(ApiError::from_status(
            status.as_u16(),
            api_error_message(&json_response, status),
        ))
    }

    /// # Errors
    /// Returns a classified error if the request fails or the gateway
    /// reports a non-success status.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.endpoint_url("/api/health")?;

        let span = info_span!("gateway.health", http.method = "GET", url = %url);
        let response = self
            .request(Method::GET, &url)
            .send()
            .instrument(span)
            .await?;

        Ok(Self::accept(response).await?.json().await?)
    }

    /// Request a sign-up OTP challenge for a new account.
    /// # Errors
    /// Returns a classified error if the request fails or the gateway
    /// reports a non-success status.
    pub async fn sign_up(&self, email: &str, name: &str, dob: &str) -> Result<OtpReceipt, ApiError> {
        let url = self.endpoint_url("/api/auth/signup")?;

        let span = info_span!("gateway.sign_up", http.method = "POST", url = %url);
        let response = self
            .request(Method::POST, &url)
            .json(&json!({ "email": email, "name": name, "dob": dob }))
            .send()
            .instrument(span)
            .await?;

        Ok(Self::accept(response).await?.json().await?)
    }

    /// Confirm a sign-up OTP challenge.
    /// # Errors
    /// Returns a classified error if the request fails or the gateway
    /// reports a non-success status.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<SessionGrant, ApiError> {
        let url = self.endpoint_url("/api/auth/verify-otp")?;

        let span = info_span!("gateway.verify_otp", http.method = "POST", url = %url);
        let response = self
            .request(Method::POST, &url)
            .json(&json!({ "email": email, "otp": otp }))
            .send()
            .instrument(span)
            .await?;

        Ok(Self::accept(response).await?.json().await?)
    }

    /// Request a sign-in OTP challenge for an existing account.
    /// # Errors
    /// Returns a classified error if the request fails or the gateway
    /// reports a non-success status.
    pub async fn sign_in(&self, email: &str) -> Result<OtpReceipt, ApiError> {
        let url = self.endpoint_url("/api/auth/signin")?;

        let span = info_span!("gateway.sign_in", http.method = "POST", url = %url);
        let response = self
            .request(Method::POST, &url)
            .json(&json!({ "email": email }))
            .send()
            .instrument(span)
            .await?;

        Ok(Self::accept(response).await?.json().await?)
    }

    /// Confirm a sign-in OTP challenge.
    /// # Errors
    /// Returns a classified error if the request fails or the gateway
    /// reports a non-success status.
    pub async fn verify_signin_otp(
        &self,
        email: &str,
        otp: &str,
    ) -> Result<SessionGrant, ApiError> {
        let url = self.endpoint_url("/api/auth/verify-signin-otp")?;

        let span = info_span!("gateway.verify_signin_otp", http.method = "POST", url = %url);
        let response = self
            .request(Method::POST, &url)
            .json(&json!({ "email": email, "otp": otp }))
            .send()
            .instrument(span)
            .await?;

        Ok(Self::accept(response).await?.json().await?)
    }

    /// Fetch the profile the current bearer token belongs to.
    /// # Errors
    /// Returns a classified error if the request fails or the gateway
    /// reports a non-success status.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let url = self.endpoint_url("/api/auth/me")?;

        let span = info_span!("gateway.current_user", http.method = "GET", url = %url);
        let response = self
            .request(Method::GET, &url)
            .send()
            .instrument(span)
            .await?;

        Ok(Self::accept(response).await?.json().await?)
    }

    /// Invalidate the server-side session.
    /// # Errors
    /// Returns a classified error if the request fails or the gateway
    /// reports a non-success status.
    pub async fn logout(&self) -> Result<Acknowledgement, ApiError> {
        let url = self.endpoint_url("/api/auth/logout")?;

        let span = info_span!("gateway.logout", http.method = "POST", url = %url);
        let response = self
            .request(Method::POST, &url)
            .send()
            .instrument(span)
            .await?;

        Ok(Self::accept(response).await?.json().await?)
    }

    /// Exchange a Google-issued credential for a local session.
    /// # Errors
    /// Returns a classified error if the request fails or the gateway
    /// reports a non-success status.
    pub async fn google_auth(&self, credential: &str) -> Result<SessionGrant, ApiError> {
        let url = self.endpoint_url("/api/auth/google")?;

        let span = info_span!("gateway.google_auth", http.method = "POST", url = %url);
        let response = self
            .request(Method::POST, &url)
            .json(&json!({ "token": credential }))
            .send()
            .instrument(span)
            .await?;

        Ok(Self::accept(response).await?.json().await?)
    }
}
