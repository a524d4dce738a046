//! Durable/ephemeral session persistence.
//!
//! Two parallel tier documents live under the state directory, holding the
//! same key names the API client has always persisted: `user`,
//! `authTimestamp` and `jwt_token`. A transient `google_credential` file
//! holds the raw federated credential only until the sign-in attempt
//! settles.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::gateway::types::User;

const PERSISTENT_FILE: &str = "session.persistent.json";
const EPHEMERAL_FILE: &str = "session.ephemeral.json";
const CREDENTIAL_FILE: &str = "google_credential";

/// Which durability class a session is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionTier {
    /// Survives for at most 8 hours.
    Ephemeral,
    /// Survives for at most 24 hours ("keep me signed in").
    Persistent,
}

impl RetentionTier {
    /// Maximum record age before a read treats the session as expired.
    #[must_use]
    pub fn max_age_ms(self) -> u64 {
        match self {
            Self::Ephemeral => 8 * 60 * 60 * 1000,
            Self::Persistent => 24 * 60 * 60 * 1000,
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            Self::Ephemeral => EPHEMERAL_FILE,
            Self::Persistent => PERSISTENT_FILE,
        }
    }

    fn other(self) -> Self {
        match self {
            Self::Ephemeral => Self::Persistent,
            Self::Persistent => Self::Ephemeral,
        }
    }
}

/// Reads check Persistent first, then Ephemeral.
const READ_ORDER: [RetentionTier; 2] = [RetentionTier::Persistent, RetentionTier::Ephemeral];

/// One live session: the profile, the bearer token it was granted with, and
/// where/when it was written.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user: User,
    pub token: Option<SecretString>,
    pub retention_tier: RetentionTier,
    pub issued_at_ms: u64,
}

/// On-disk shape of one tier. The session record is `user` +
/// `authTimestamp`; `jwt_token` can outlive the record so the bootstrap
/// fallback has something to re-fetch with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TierDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<User>,
    #[serde(
        rename = "authTimestamp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    auth_timestamp: Option<u64>,
    #[serde(rename = "jwt_token", default, skip_serializing_if = "Option::is_none")]
    jwt_token: Option<String>,
}

impl TierDocument {
    fn is_empty(&self) -> bool {
        self.user.is_none() && self.auth_timestamp.is_none() && self.jwt_token.is_none()
    }
}

/// File-backed session store. Storage errors are swallowed (logged at
/// `warn`): losing persistence degrades to "request OTP again", not to data
/// loss.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(err) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), "could not create state directory: {err}");
        }
        Self { dir }
    }

    /// Write the session record and token to the chosen tier. The other
    /// tier is emptied so no stale copy can shadow this one.
    pub fn save(&self, user: &User, token: Option<&str>, tier: RetentionTier) {
        self.save_with_timestamp(user, token, tier, epoch_ms());
    }

    fn save_with_timestamp(
        &self,
        user: &User,
        token: Option<&str>,
        tier: RetentionTier,
        issued_at_ms: u64,
    ) {
        let document = TierDocument {
            user: Some(user.clone()),
            auth_timestamp: Some(issued_at_ms),
            jwt_token: token.map(str::to_owned),
        };
        self.write_tier(tier, &document);
        self.remove_tier(tier.other());
    }

    /// Read the live session record, if any. Persistent wins over
    /// Ephemeral; an expired record purges the session record from both
    /// tiers before reporting "no session".
    #[must_use]
    pub fn load(&self) -> Option<SessionRecord> {
        self.load_at(epoch_ms())
    }

    fn load_at(&self, now_ms: u64) -> Option<SessionRecord> {
        for tier in READ_ORDER {
            let Some(document) = self.read_tier(tier) else {
                continue;
            };
            let (Some(user), Some(issued_at_ms)) = (document.user, document.auth_timestamp) else {
                continue;
            };

            if now_ms.saturating_sub(issued_at_ms) < tier.max_age_ms() {
                return Some(SessionRecord {
                    user,
                    token: document.jwt_token.map(SecretString::from),
                    retention_tier: tier,
                    issued_at_ms,
                });
            }

            debug!(?tier, "stored session expired, purging both tiers");
            self.purge_records();
            return None;
        }

        None
    }

    /// Purge both tiers and the transient credential unconditionally.
    pub fn clear(&self) {
        self.remove_tier(RetentionTier::Persistent);
        self.remove_tier(RetentionTier::Ephemeral);
        self.discard_federated_credential();
    }

    /// The standalone bearer token, Persistent tier first. No age rule:
    /// an expired record purge leaves the token behind for the bootstrap
    /// re-fetch.
    #[must_use]
    pub fn bearer_token(&self) -> Option<SecretString> {
        for tier in READ_ORDER {
            if let Some(token) = self.read_tier(tier).and_then(|d| d.jwt_token) {
                return Some(SecretString::from(token));
            }
        }
        None
    }

    /// Cache the raw federated credential until the sign-in attempt
    /// settles.
    pub fn stash_federated_credential(&self, raw: &str) {
        let path = self.dir.join(CREDENTIAL_FILE);
        if let Err(err) = fs::write(&path, raw) {
            warn!(path = %path.display(), "could not stash federated credential: {err}");
        }
    }

    /// The cached raw federated credential, if one is outstanding.
    #[must_use]
    pub fn federated_credential(&self) -> Option<String> {
        fs::read_to_string(self.dir.join(CREDENTIAL_FILE)).ok()
    }

    /// Drop the cached federated credential. Called on both the success and
    /// the failure path of a federated sign-in.
    pub fn discard_federated_credential(&self) {
        let path = self.dir.join(CREDENTIAL_FILE);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), "could not discard federated credential: {err}");
            }
        }
    }

    /// Drop `user` + `authTimestamp` from both tiers, keeping any
    /// standalone token.
    fn purge_records(&self) {
        for tier in READ_ORDER {
            let Some(mut document) = self.read_tier(tier) else {
                continue;
            };
            document.user = None;
            document.auth_timestamp = None;
            if document.is_empty() {
                self.remove_tier(tier);
            } else {
                self.write_tier(tier, &document);
            }
        }
    }

    fn read_tier(&self, tier: RetentionTier) -> Option<TierDocument> {
        let path = self.dir.join(tier.file_name());
        let bytes = fs::read(&path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(document) => Some(document),
            Err(err) => {
                warn!(path = %path.display(), "unreadable tier document, ignoring: {err}");
                None
            }
        }
    }

    fn write_tier(&self, tier: RetentionTier, document: &TierDocument) {
        let path = self.dir.join(tier.file_name());
        let json = match serde_json::to_vec(document) {
            Ok(json) => json,
            Err(err) => {
                warn!(path = %path.display(), "could not serialize tier document: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(&path, json) {
            warn!(path = %path.display(), "could not write tier document: {err}");
        }
    }

    fn remove_tier(&self, tier: RetentionTier) {
        let path = self.dir.join(tier.file_name());
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), "could not remove tier document: {err}");
            }
        }
    }
}

/// Current Unix epoch in milliseconds.
fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    fn test_user() -> User {
        User {
            id: "64f0c2".to_string(),
            name: "A B".to_string(),
            email: "a@x.com".to_string(),
            date_of_birth: "2000-01-01".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn test_store() -> (TempDir, SessionStore) {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path());
        (tmp, store)
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_tmp, store) = test_store();
        let user = test_user();

        store.save(&user, Some("tok-1"), RetentionTier::Persistent);

        let record = store.load().unwrap();
        assert_eq!(record.user, user);
        assert_eq!(record.token.unwrap().expose_secret(), "tok-1");
        assert_eq!(record.retention_tier, RetentionTier::Persistent);
    }

    #[test]
    fn save_evicts_the_other_tier() {
        let (_tmp, store) = test_store();
        let user = test_user();

        store.save(&user, Some("old"), RetentionTier::Persistent);
        store.save(&user, Some("new"), RetentionTier::Ephemeral);

        let record = store.load().unwrap();
        assert_eq!(record.retention_tier, RetentionTier::Ephemeral);
        assert_eq!(store.bearer_token().unwrap().expose_secret(), "new");
    }

    #[test]
    fn expired_persistent_record_purges_both_tiers() {
        let (_tmp, store) = test_store();
        let user = test_user();
        let stale = epoch_ms() - RetentionTier::Persistent.max_age_ms() - 1;

        store.save_with_timestamp(&user, Some("tok"), RetentionTier::Persistent, stale);

        assert!(store.load().is_none());
        // Record gone from both tiers afterward.
        assert!(store.read_tier(RetentionTier::Persistent).unwrap().user.is_none());
        assert!(store.read_tier(RetentionTier::Ephemeral).is_none());
        assert!(store.load().is_none());
    }

    #[test]
    fn expired_ephemeral_record_uses_shorter_max_age() {
        let (_tmp, store) = test_store();
        let user = test_user();
        let stale = epoch_ms() - RetentionTier::Ephemeral.max_age_ms() - 1;

        store.save_with_timestamp(&user, None, RetentionTier::Ephemeral, stale);
        assert!(store.load().is_none());

        // The same age would still be valid under Persistent retention.
        store.save_with_timestamp(&user, None, RetentionTier::Persistent, stale);
        assert!(store.load().is_some());
    }

    #[test]
    fn bearer_token_survives_record_purge() {
        let (_tmp, store) = test_store();
        let user = test_user();
        let stale = epoch_ms() - RetentionTier::Persistent.max_age_ms() - 1;

        store.save_with_timestamp(&user, Some("tok"), RetentionTier::Persistent, stale);

        assert!(store.load().is_none());
        assert_eq!(store.bearer_token().unwrap().expose_secret(), "tok");
    }

    #[test]
    fn bearer_token_prefers_persistent_tier() {
        let (tmp, store) = test_store();
        let user = test_user();

        store.save(&user, Some("eph"), RetentionTier::Ephemeral);
        // A leftover persistent token, as the purge path can produce.
        std::fs::write(
            tmp.path().join(PERSISTENT_FILE),
            serde_json::json!({ "jwt_token": "per" }).to_string(),
        )
        .unwrap();

        assert_eq!(store.bearer_token().unwrap().expose_secret(), "per");
    }

    #[test]
    fn clear_empties_everything() {
        let (_tmp, store) = test_store();
        let user = test_user();

        store.save(&user, Some("tok"), RetentionTier::Persistent);
        store.stash_federated_credential("raw-jwt");
        store.clear();

        assert!(store.load().is_none());
        assert!(store.bearer_token().is_none());
        assert!(store.federated_credential().is_none());
    }

    #[test]
    fn federated_credential_stash_and_discard() {
        let (_tmp, store) = test_store();

        assert!(store.federated_credential().is_none());
        store.stash_federated_credential("raw-jwt");
        assert_eq!(store.federated_credential().as_deref(), Some("raw-jwt"));
        store.discard_federated_credential();
        assert!(store.federated_credential().is_none());
        // Discarding twice is fine.
        store.discard_federated_credential();
    }

    #[test]
    fn unreadable_document_is_treated_as_absent() {
        let (tmp, store) = test_store();

        std::fs::write(tmp.path().join(PERSISTENT_FILE), b"not json").unwrap();
        assert!(store.load().is_none());
        assert!(store.bearer_token().is_none());
    }
}
