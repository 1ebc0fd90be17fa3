//! Authentication boundary for the remote store
//!
//! An identifier/secret pair is exchanged for a [`Session`]. Credentials are
//! kept as salted PBKDF2-HMAC-SHA256 records; the secret itself is never
//! stored.

use crate::error::AuthError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// PBKDF2 rounds for new records
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 200_000;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Established identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Who signed in
    pub identifier: String,
    /// Opaque session token
    pub token: Uuid,
    /// Sign-in time
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// New session for `identifier`
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            token: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

/// Exchanges credentials for a session
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Verify credentials
    ///
    /// # Errors
    /// `AuthError::MissingCredentials` or `AuthError::InvalidCredentials`.
    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Session, AuthError>;
}

fn default_iterations() -> u32 {
    DEFAULT_PBKDF2_ITERATIONS
}

/// Salted password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Hex salt
    pub salt: String,
    /// Hex derived key
    pub hash: String,
    /// PBKDF2 rounds
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

impl CredentialRecord {
    /// Hash `secret` with a fresh random salt
    #[must_use]
    pub fn create(secret: &str, iterations: u32) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let iterations = iterations.max(1);
        let key = derive_key(secret, &salt, iterations);
        Self {
            salt: hex::encode(salt),
            hash: hex::encode(key),
            iterations,
        }
    }

    /// Check `secret` against this record
    #[must_use]
    pub fn verify(&self, secret: &str) -> bool {
        let (Ok(salt), Ok(expected)) = (hex::decode(&self.salt), hex::decode(&self.hash)) else {
            return false;
        };
        let key = derive_key(secret, &salt, self.iterations.max(1));
        constant_time_eq(&key, &expected)
    }
}

fn derive_key(secret: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt, iterations, &mut key);
    key
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Authenticator over an in-process credential registry
#[derive(Debug, Clone)]
pub struct PasswordAuthenticator {
    records: Arc<DashMap<String, CredentialRecord>>,
    iterations: u32,
}

impl PasswordAuthenticator {
    /// Registry hashing with [`DEFAULT_PBKDF2_ITERATIONS`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_iterations(DEFAULT_PBKDF2_ITERATIONS)
    }

    /// Registry hashing new records with `iterations` rounds
    #[must_use]
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            iterations: iterations.max(1),
        }
    }

    /// Add an identity
    ///
    /// # Errors
    /// Empty identifier/secret, or identifier already taken.
    pub fn register(&self, identifier: &str, secret: &str) -> Result<(), AuthError> {
        if identifier.is_empty() || secret.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if self.records.contains_key(identifier) {
            return Err(AuthError::AlreadyRegistered(identifier.to_string()));
        }
        let record = CredentialRecord::create(secret, self.iterations);
        self.records.insert(identifier.to_string(), record);
        Ok(())
    }

    /// Add a pre-hashed identity
    pub fn insert_record(&self, identifier: impl Into<String>, record: CredentialRecord) {
        self.records.insert(identifier.into(), record);
    }

    /// Remove an identity
    pub fn revoke(&self, identifier: &str) -> bool {
        self.records.remove(identifier).is_some()
    }
}

impl Default for PasswordAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for PasswordAuthenticator {
    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        if identifier.is_empty() || secret.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let Some(record) = self.records.get(identifier).map(|r| r.value().clone()) else {
            return Err(AuthError::InvalidCredentials);
        };

        let secret = secret.to_string();
        let verified = tokio::task::spawn_blocking(move || record.verify(&secret))
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        if verified {
            tracing::info!(identifier, "Signed in");
            Ok(Session::new(identifier))
        } else {
            tracing::warn!(identifier, "Rejected sign-in");
            Err(AuthError::InvalidCredentials)
        }
    }
}
