//! Credential bridge for Google federated sign-in.
//!
//! The provider's external library is behind the [`IdentityProvider`]
//! seam; the bridge waits for it to load, wires up one of the two sign-in
//! strategies, and funnels every completion through the same path: decode
//! for diagnostics, forward the raw credential to the controller, discard
//! the cached copy once the attempt settles.

pub mod decode;

pub use decode::{decode_credential, GoogleClaims};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::auth::AuthController;
use crate::gateway::ApiError;
use crate::session::SessionStore;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The provider library did not become available within the
    /// configured window.
    #[error("identity provider not ready after {0:?}")]
    NotReady(Duration),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Observable bridge lifecycle, for the UI to render a spinner against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Initializing,
    Ready,
    NotReady,
}

/// How sign-in completion is solicited. Both strategies converge on the
/// same credential callback and identical downstream behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInStrategy {
    /// The provider shows its own transient prompt.
    Prompt,
    /// The provider renders a persistent widget into the mount point.
    RenderedButton { mount_id: String },
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub client_id: String,
    pub strategy: SignInStrategy,
    /// How long to wait for the provider library before reporting
    /// `NotReady`.
    pub init_timeout: Duration,
    /// Grace period before checking that the rendered widget appeared.
    pub render_grace: Duration,
}

impl BridgeConfig {
    #[must_use]
    pub fn new(client_id: impl Into<String>, strategy: SignInStrategy) -> Self {
        Self {
            client_id: client_id.into(),
            strategy,
            init_timeout: Duration::from_secs(10),
            render_grace: Duration::from_millis(500),
        }
    }
}

/// Seam over the provider's external library.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves once, when the provider's library has finished loading.
    async fn loaded(&self);

    /// Initialize the provider with the application client id and the
    /// credential sink both strategies deliver into.
    fn configure(&self, client_id: &str, credentials: mpsc::UnboundedSender<String>);

    /// Ask the provider to show its transient sign-in prompt.
    async fn show_prompt(&self);

    /// Render the provider's persistent widget into the mount point.
    async fn render_button(&self, mount_id: &str);

    /// Whether the provider has placed a widget into the mount point.
    fn is_rendered(&self, mount_id: &str) -> bool;
}

pub struct GoogleBridge {
    provider: Arc<dyn IdentityProvider>,
    controller: Arc<AuthController>,
    store: SessionStore,
    config: BridgeConfig,
    state: RwLock<BridgeState>,
    credential_tx: mpsc::UnboundedSender<String>,
    credentials: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl GoogleBridge {
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        controller: Arc<AuthController>,
        store: SessionStore,
        config: BridgeConfig,
    ) -> Self {
        let (credential_tx, credentials) = mpsc::unbounded_channel();
        Self {
            provider,
            controller,
            store,
            config,
            state: RwLock::new(BridgeState::Initializing),
            credential_tx,
            credentials: Mutex::new(credentials),
        }
    }

    pub async fn state(&self) -> BridgeState {
        *self.state.read().await
    }

    /// Wait for the provider library, register the credential callback and
    /// set up the configured strategy.
    /// # Errors
    /// Returns [`BridgeError::NotReady`] when the provider library does
    /// not load within the configured window.
    pub async fn initialize(&self) -> Result<(), BridgeError> {
        if timeout(self.config.init_timeout, self.provider.loaded())
            .await
            .is_err()
        {
            *self.state.write().await = BridgeState::NotReady;
            return Err(BridgeError::NotReady(self.config.init_timeout));
        }

        self.provider
            .configure(&self.config.client_id, self.credential_tx.clone());

        if let SignInStrategy::RenderedButton { mount_id } = &self.config.strategy {
            self.provider.render_button(mount_id).await;
            sleep(self.config.render_grace).await;
            if !self.provider.is_rendered(mount_id) {
                debug!(mount_id, "widget missing after grace period, re-rendering once");
                self.provider.render_button(mount_id).await;
                // If the retry renders nothing either, give up silently:
                // the mount point stays empty, nothing is reported.
            }
        }

        *self.state.write().await = BridgeState::Ready;
        Ok(())
    }

    /// Ask the provider for its transient prompt. A no-op under the
    /// rendered-button strategy, where the widget itself solicits the
    /// sign-in.
    pub async fn request_sign_in(&self) {
        if self.config.strategy == SignInStrategy::Prompt {
            self.provider.show_prompt().await;
        }
    }

    /// Await the next provider completion and run it through sign-in.
    /// Returns `None` once the provider side of the channel is gone.
    pub async fn next_credential(&self) -> Option<Result<(), ApiError>> {
        let raw = self.credentials.lock().await.recv().await?;
        Some(self.handle_credential(&raw).await)
    }

    /// Consume provider completions until the channel closes. Failures are
    /// already reported on the controller's notification channel.
    pub async fn run(&self) {
        while let Some(result) = self.next_credential().await {
            if let Err(err) = result {
                debug!("federated sign-in attempt failed: {err}");
            }
        }
    }

    /// The single downstream path for a received credential: cache, decode
    /// for diagnostics, forward unmodified, discard the cache once the
    /// attempt settles (success or failure).
    /// # Errors
    /// Surfaces the controller's classified error.
    pub async fn handle_credential(&self, raw: &str) -> Result<(), ApiError> {
        self.store.stash_federated_credential(raw);

        match decode_credential(raw) {
            Ok(claims) => debug!(
                email = claims.email.as_deref().unwrap_or("<unknown>"),
                "federated credential received"
            ),
            Err(err) => warn!("federated credential payload not decodable: {err}"),
        }

        let result = self.controller.federated_sign_in(raw).await.map(|_| ());

        self.store.discard_federated_credential();

        result
    }
}
