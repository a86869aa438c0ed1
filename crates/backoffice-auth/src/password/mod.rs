//! Password hashing.

pub mod hasher;

pub use hasher::PasswordHasher;

use backoffice_core::error::AppError;

/// Turns a plaintext password into the credential string the store keeps.
pub trait CredentialHasher: Send + Sync + std::fmt::Debug + 'static {
    /// Hash `password` with a fresh salt.
    fn hash_password(&self, password: &str) -> Result<String, AppError>;
}

impl CredentialHasher for PasswordHasher {
    fn hash_password(&self, password: &str) -> Result<String, AppError> {
        PasswordHasher::hash_password(self, password)
    }
}
