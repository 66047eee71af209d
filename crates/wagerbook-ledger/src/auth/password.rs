//! Password credentials.
//!
//! The ledger only ever sees credentials through [`CredentialVerifier`], so the
//! stored representation can change without touching the settlement code.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// Failure to produce or parse a stored credential.
#[derive(Debug, thiserror::Error)]
#[error("credential error: {0}")]
pub struct CredentialError(pub String);

/// Hashes new passwords and checks presented ones against stored hashes.
pub trait CredentialVerifier: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, CredentialError>;

    fn verify(&self, password: &str, stored: &str) -> Result<bool, CredentialError>;
}

/// argon2id with a random salt per password.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Credentials;

impl CredentialVerifier for Argon2Credentials {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        hash_password(password).map_err(|e| CredentialError(e.to_string()))
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool, CredentialError> {
        verify_password(password, stored).map_err(|e| CredentialError(e.to_string()))
    }
}

/// Hash a password using argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
