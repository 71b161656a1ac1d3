//! Administrative authentication: hashed credential checks and a
//! server-side session store.
//!
//! Credentials arrive from configuration as a username plus the SHA-256
//! digest of the password; the plaintext is never stored. A successful login
//! issues an opaque per-session token kept in an in-process map with a TTL,
//! so revoking one browser never affects another.

use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

pub const SHA256_DIGEST_BYTES: usize = 32;

/// Externally configured admin identity.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password_sha256: [u8; SHA256_DIGEST_BYTES],
}

impl AdminCredentials {
    /// Build credentials by hashing a plaintext password. Configuration
    /// loading decodes a pre-hashed hex digest instead; this path exists for
    /// provisioning and tests.
    pub fn from_password(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_sha256: Sha256::digest(password.as_bytes()).into(),
        }
    }

    /// Constant-time comparison of the submitted credentials against the
    /// configured pair.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let username_ok = self
            .username
            .as_bytes()
            .ct_eq(username.as_bytes())
            .unwrap_u8()
            == 1;
        let digest = Sha256::digest(password.as_bytes());
        let password_ok = self.password_sha256.ct_eq(digest.as_slice()).unwrap_u8() == 1;
        username_ok && password_ok
    }
}

#[derive(Debug, Clone, Copy)]
struct Session {
    issued_at: Instant,
}

/// In-process map of opaque session tokens. Entries expire after the
/// configured TTL and are pruned on access.
#[derive(Debug)]
pub struct SessionStore {
    entries: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    fn issue(&self) -> String {
        let mut raw = [0u8; 32];
        raw[..16].copy_from_slice(Uuid::new_v4().as_bytes());
        raw[16..].copy_from_slice(Uuid::new_v4().as_bytes());
        let token = URL_SAFE_NO_PAD.encode(raw);
        self.entries.insert(
            token.clone(),
            Session {
                issued_at: Instant::now(),
            },
        );
        token
    }

    fn validate(&self, token: &str) -> bool {
        // The shard read guard must be released before `remove` can run.
        let expired = match self.entries.get(token) {
            Some(session) => session.issued_at.elapsed() > self.ttl,
            None => return false,
        };

        if expired {
            self.entries.remove(token);
            return false;
        }
        true
    }

    fn revoke(&self, token: &str) {
        self.entries.remove(token);
    }
}

/// Gatekeeper for every administrative operation.
pub struct AuthService {
    credentials: AdminCredentials,
    sessions: SessionStore,
}

impl AuthService {
    pub fn new(credentials: AdminCredentials, session_ttl: Duration) -> Self {
        Self {
            credentials,
            sessions: SessionStore::new(session_ttl),
        }
    }

    /// Check credentials and, on success, issue a session token.
    pub fn login(&self, username: &str, password: &str) -> Option<String> {
        if self.credentials.verify(username, password) {
            Some(self.sessions.issue())
        } else {
            None
        }
    }

    pub fn is_authenticated(&self, token: &str) -> bool {
        self.sessions.validate(token)
    }

    pub fn logout(&self, token: &str) {
        self.sessions.revoke(token);
    }
}

/// Hex-encode the SHA-256 digest of a password, for generating the
/// configuration value.
pub fn password_digest_hex(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> AdminCredentials {
        let digest = Sha256::digest(b"correct horse");
        AdminCredentials {
            username: "editor".to_string(),
            password_sha256: digest.into(),
        }
    }

    fn service() -> AuthService {
        AuthService::new(credentials(), Duration::from_secs(60))
    }

    #[test]
    fn valid_credentials_issue_a_session() {
        let auth = service();
        let token = auth.login("editor", "correct horse").expect("token");
        assert!(auth.is_authenticated(&token));
    }

    #[test]
    fn wrong_password_or_username_is_rejected() {
        let auth = service();
        assert!(auth.login("editor", "wrong").is_none());
        assert!(auth.login("someone", "correct horse").is_none());
    }

    #[test]
    fn logout_revokes_only_that_session() {
        let auth = service();
        let first = auth.login("editor", "correct horse").expect("token");
        let second = auth.login("editor", "correct horse").expect("token");
        assert_ne!(first, second);

        auth.logout(&first);
        assert!(!auth.is_authenticated(&first));
        assert!(auth.is_authenticated(&second));
    }

    #[test]
    fn expired_sessions_are_pruned() {
        let auth = AuthService::new(credentials(), Duration::from_millis(1));
        let token = auth.login("editor", "correct horse").expect("token");
        std::thread::sleep(Duration::from_millis(5));
        assert!(!auth.is_authenticated(&token));
    }

    #[test]
    fn unknown_tokens_never_validate() {
        assert!(!service().is_authenticated("made-up-token"));
    }

    #[test]
    fn digest_helper_matches_manual_hashing() {
        let hex = password_digest_hex("correct horse");
        assert_eq!(hex.len(), SHA256_DIGEST_BYTES * 2);
        assert_eq!(hex, hex::encode(Sha256::digest(b"correct horse")));
    }
}
