//! Credential checks for destructive operations.
//!
//! Deletes are guarded by a single shared secret. The delete handler only
//! sees a [`CredentialCheck`]; which secret it compares against, and how,
//! comes from configuration.

use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Credential-related errors.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Configured hash is not a valid PHC string.
    #[error("invalid password hash format: {0}")]
    InvalidHash(String),

    /// Hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),
}

/// Decides whether a caller-supplied credential is accepted.
pub trait CredentialCheck: Send + Sync {
    /// Return `true` if `supplied` is accepted.
    fn verify(&self, supplied: &str) -> bool;
}

/// Plain shared secret, compared via SHA-256 digests in constant time.
pub struct StaticSecret {
    digest: Vec<u8>,
}

impl StaticSecret {
    /// Create a check accepting exactly `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            digest: Sha256::digest(secret.as_bytes()).to_vec(),
        }
    }
}

impl CredentialCheck for StaticSecret {
    fn verify(&self, supplied: &str) -> bool {
        let supplied = Sha256::digest(supplied.as_bytes());
        constant_time_eq(&self.digest, supplied.as_slice())
    }
}

/// Argon2 PHC hash of the shared secret.
pub struct HashedSecret {
    phc: String,
}

impl HashedSecret {
    /// Create a check from a PHC string such as `$argon2id$v=19$...`.
    pub fn new(phc: &str) -> Result<Self, CredentialError> {
        PasswordHash::new(phc).map_err(|e| CredentialError::InvalidHash(e.to_string()))?;
        Ok(Self {
            phc: phc.to_string(),
        })
    }
}

impl CredentialCheck for HashedSecret {
    fn verify(&self, supplied: &str) -> bool {
        match PasswordHash::new(&self.phc) {
            Ok(parsed) => Argon2::default()
                .verify_password(supplied.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Refuses everything. Used when no secret is configured.
pub struct DenyAll;

impl CredentialCheck for DenyAll {
    fn verify(&self, _supplied: &str) -> bool {
        false
    }
}

/// Hash a secret with Argon2id for use in `delete_password_hash`.
pub fn hash_secret(secret: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::HashError(e.to_string()))
}

/// Build the credential check described by `config`.
///
/// A hash takes precedence over a plain secret. With neither configured,
/// every delete is refused.
pub fn from_config(config: &SecurityConfig) -> Result<Arc<dyn CredentialCheck>, CredentialError> {
    if !config.delete_password_hash.is_empty() {
        return Ok(Arc::new(HashedSecret::new(&config.delete_password_hash)?));
    }

    if !config.delete_password.is_empty() {
        return Ok(Arc::new(StaticSecret::new(&config.delete_password)));
    }

    tracing::warn!("No delete password configured; all delete requests will be rejected");
    Ok(Arc::new(DenyAll))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
