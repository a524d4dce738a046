use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::gateway::types::User;

/// Which flow an OTP challenge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtpPurpose {
    Signup,
    Signin,
}

impl OtpPurpose {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Signin => "signin",
        }
    }
}

/// The process-wide authentication state, owned by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    OtpPending { purpose: OtpPurpose, email: String },
    Authenticated(User),
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Monotonic fence for superseded OTP traffic.
///
/// Every request bumps the sequence for its `(purpose, email)` pair;
/// confirmations capture the sequence at issue time. A response is applied
/// only if its sequence is still the highest issued for that pair, so a
/// late response for a superseded challenge can never overwrite newer
/// state.
#[derive(Debug, Default)]
pub(crate) struct RequestFence {
    counter: AtomicU64,
    latest: Mutex<HashMap<(OtpPurpose, String), u64>>,
}

impl RequestFence {
    fn guard(&self) -> MutexGuard<'_, HashMap<(OtpPurpose, String), u64>> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue a new sequence number, superseding any prior challenge for
    /// the pair.
    pub fn issue(&self, purpose: OtpPurpose, email: &str) -> u64 {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.guard().insert((purpose, email.to_owned()), seq);
        seq
    }

    /// The highest sequence issued for the pair so far (0 if none).
    pub fn current(&self, purpose: OtpPurpose, email: &str) -> u64 {
        self.guard()
            .get(&(purpose, email.to_owned()))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_current(&self, purpose: OtpPurpose, email: &str, seq: u64) -> bool {
        self.current(purpose, email) == seq
    }
}
