//! The auth controller.
//!
//! One controller is constructed at application start and injected into
//! every consumer; it owns the authentication state, talks to the API
//! Gateway, writes through to the session store, and reports outcomes on a
//! broadcast notification channel the UI layer renders from.

pub mod state;

pub use state::{AuthState, OtpPurpose};

use std::sync::atomic::{AtomicBool, Ordering};

use secrecy::ExposeSecret;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::gateway::types::{OtpReceipt, SessionGrant, User};
use crate::gateway::{ApiError, ApiGateway};
use crate::session::{RetentionTier, SessionStore};
use state::RequestFence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// One entry on the notification side channel, shaped like the toasts the
/// UI shows: a title, and the detail underneath.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub body: String,
}

impl Notice {
    fn success(body: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: "Success!".to_string(),
            body: body.to_string(),
        }
    }

    fn failure(err: &ApiError) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: err.title().to_string(),
            body: err.detail().to_string(),
        }
    }
}

pub struct AuthController {
    gateway: ApiGateway,
    store: SessionStore,
    state: RwLock<AuthState>,
    fence: RequestFence,
    loading: AtomicBool,
    notices: broadcast::Sender<Notice>,
}

impl AuthController {
    #[must_use]
    pub fn new(gateway: ApiGateway, store: SessionStore) -> Self {
        let (notices, _) = broadcast::channel(32);
        Self {
            gateway,
            store,
            state: RwLock::new(AuthState::Unauthenticated),
            fence: RequestFence::default(),
            loading: AtomicBool::new(true),
            notices,
        }
    }

    /// Current authentication state, by value.
    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    /// The signed-in profile, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user().cloned()
    }

    /// True until [`bootstrap`](Self::bootstrap) has settled; gates the
    /// initial render.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Subscribe to the notification side channel.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Request an OTP challenge for account creation.
    ///
    /// On success the state moves to `OtpPending(Signup, email)` and the
    /// session store is untouched (no token exists until verification).
    /// # Errors
    /// Surfaces the gateway's classified error; state is unchanged.
    pub async fn request_signup_otp(
        &self,
        email: &str,
        name: &str,
        dob: &str,
    ) -> Result<OtpReceipt, ApiError> {
        let email = email.trim();
        self.check_can_request(email).await?;

        let seq = self.fence.issue(OtpPurpose::Signup, email);
        match self.gateway.sign_up(email, name, dob).await {
            Ok(receipt) => {
                self.apply_challenge(OtpPurpose::Signup, email, seq).await;
                Ok(receipt)
            }
            Err(err) => {
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Request an OTP challenge for sign-in. Re-requesting for the same
    /// email supersedes the outstanding challenge (resend).
    /// # Errors
    /// Surfaces the gateway's classified error; state is unchanged.
    pub async fn request_signin_otp(&self, email: &str) -> Result<OtpReceipt, ApiError> {
        let email = email.trim();
        self.check_can_request(email).await?;

        let seq = self.fence.issue(OtpPurpose::Signin, email);
        match self.gateway.sign_in(email).await {
            Ok(receipt) => {
                self.apply_challenge(OtpPurpose::Signin, email, seq).await;
                Ok(receipt)
            }
            Err(err) => {
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Confirm the outstanding sign-up challenge. Signup sessions are
    /// always stored at Ephemeral retention.
    /// # Errors
    /// Surfaces the gateway's classified error; state stays `OtpPending`
    /// so the user may retry or resend.
    pub async fn confirm_signup_otp(&self, code: &str) -> Result<User, ApiError> {
        let email = self.pending_email(OtpPurpose::Signup).await?;
        let seq = self.fence.current(OtpPurpose::Signup, &email);

        match self.gateway.verify_otp(&email, code).await {
            Ok(grant) => {
                if self.fence.is_current(OtpPurpose::Signup, &email, seq) {
                    self.adopt_session(&grant, RetentionTier::Ephemeral).await;
                    self.notify_success("Account created successfully!");
                } else {
                    debug!(email, "superseded sign-up confirmation dropped");
                }
                Ok(grant.user)
            }
            Err(err) => {
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Confirm the outstanding sign-in challenge. `remember` selects
    /// Persistent retention ("keep me signed in"); otherwise Ephemeral.
    /// # Errors
    /// Surfaces the gateway's classified error; state stays `OtpPending`
    /// so the user may retry or resend.
    pub async fn confirm_signin_otp(&self, code: &str, remember: bool) -> Result<User, ApiError> {
        let email = self.pending_email(OtpPurpose::Signin).await?;
        let seq = self.fence.current(OtpPurpose::Signin, &email);

        let tier = if remember {
            RetentionTier::Persistent
        } else {
            RetentionTier::Ephemeral
        };

        match self.gateway.verify_signin_otp(&email, code).await {
            Ok(grant) => {
                if self.fence.is_current(OtpPurpose::Signin, &email, seq) {
                    self.adopt_session(&grant, tier).await;
                    self.notify_success("Signed in successfully!");
                } else {
                    debug!(email, "superseded sign-in confirmation dropped");
                }
                Ok(grant.user)
            }
            Err(err) => {
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Exchange a raw federated credential for a session. A federated
    /// sign-in is the stronger trust signal and always persists at
    /// Persistent retention.
    /// # Errors
    /// Surfaces the gateway's classified error; state returns to
    /// `Unauthenticated`.
    pub async fn federated_sign_in(&self, credential: &str) -> Result<User, ApiError> {
        match self.gateway.google_auth(credential).await {
            Ok(grant) => {
                self.adopt_session(&grant, RetentionTier::Persistent).await;
                self.notify_success("Signed in with Google successfully!");
                Ok(grant.user)
            }
            Err(err) => {
                *self.state.write().await = AuthState::Unauthenticated;
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Sign out. The server-side session is invalidated best-effort; the
    /// local session is cleared unconditionally either way, so the UI can
    /// never get stuck authenticated.
    /// # Errors
    /// Surfaces the gateway's classified error after the local clear.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.gateway.logout().await;

        self.store.clear();
        *self.state.write().await = AuthState::Unauthenticated;

        match result {
            Ok(_) => {
                self.notify_success("Logged out successfully!");
                Ok(())
            }
            Err(err) => {
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// One-shot startup restore. Adopts a valid stored session without a
    /// network round-trip; with only a standalone bearer token present,
    /// re-fetches the profile and writes through at Ephemeral retention.
    /// Always terminates, and releases the loading gate on every path.
    pub async fn bootstrap(&self) -> AuthState {
        let state = self.resolve_startup_session().await;
        self.loading.store(false, Ordering::SeqCst);
        state
    }

    async fn resolve_startup_session(&self) -> AuthState {
        if let Some(record) = self.store.load() {
            debug!(email = %record.user.email, "session restored from storage");
            let state = AuthState::Authenticated(record.user);
            *self.state.write().await = state.clone();
            return state;
        }

        let Some(token) = self.store.bearer_token() else {
            *self.state.write().await = AuthState::Unauthenticated;
            return AuthState::Unauthenticated;
        };

        match self.gateway.current_user().await {
            Ok(user) => {
                self.store
                    .save(&user, Some(token.expose_secret()), RetentionTier::Ephemeral);
                let state = AuthState::Authenticated(user);
                *self.state.write().await = state.clone();
                state
            }
            Err(err) => {
                warn!("token re-fetch failed, clearing session remnants: {err}");
                self.store.clear();
                *self.state.write().await = AuthState::Unauthenticated;
                AuthState::Unauthenticated
            }
        }
    }

    async fn check_can_request(&self, email: &str) -> Result<(), ApiError> {
        if email.is_empty() {
            let err = ApiError::invalid("email must not be empty");
            self.notify_failure(&err);
            return Err(err);
        }
        if self.state.read().await.is_authenticated() {
            let err = ApiError::invalid("already signed in");
            self.notify_failure(&err);
            return Err(err);
        }
        Ok(())
    }

    /// Transition into `OtpPending`, unless a newer challenge for the same
    /// pair superseded this one while it was in flight.
    async fn apply_challenge(&self, purpose: OtpPurpose, email: &str, seq: u64) {
        if !self.fence.is_current(purpose, email, seq) {
            debug!(
                purpose = purpose.as_str(),
                email, "superseded challenge response dropped"
            );
            return;
        }
        *self.state.write().await = AuthState::OtpPending {
            purpose,
            email: email.to_owned(),
        };
        self.notify_success("OTP sent to your email. Please check and verify.");
    }

    async fn pending_email(&self, purpose: OtpPurpose) -> Result<String, ApiError> {
        let pending = match &*self.state.read().await {
            AuthState::OtpPending { purpose: p, email } if *p == purpose => Some(email.clone()),
            _ => None,
        };
        match pending {
            Some(email) => Ok(email),
            None => {
                let err = ApiError::invalid(match purpose {
                    OtpPurpose::Signup => "no sign-up verification in progress",
                    OtpPurpose::Signin => "no sign-in verification in progress",
                });
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Replace the in-memory user wholesale and write through to the
    /// chosen tier.
    async fn adopt_session(&self, grant: &SessionGrant, tier: RetentionTier) {
        self.store.save(&grant.user, grant.token.as_deref(), tier);
        *self.state.write().await = AuthState::Authenticated(grant.user.clone());
    }

    fn notify_success(&self, body: &str) {
        let _ = self.notices.send(Notice::success(body));
    }

    fn notify_failure(&self, err: &ApiError) {
        let _ = self.notices.send(Notice::failure(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_mirror_the_toast_shape() {
        let ok = Notice::success("Signed in successfully!");
        assert_eq!(ok.kind, NoticeKind::Success);
        assert_eq!(ok.title, "Success!");

        let err = Notice::failure(&ApiError::from_status(404, "User not found".into()));
        assert_eq!(err.kind, NoticeKind::Error);
        assert_eq!(err.title, "Not Found");
        assert_eq!(err.body, "User not found");
    }
}
