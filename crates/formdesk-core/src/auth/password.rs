//! Password hashing with Argon2id

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{FormdeskError, Result};

/// Argon2id hasher with the crate's default parameters
/// (19 MiB memory, 2 iterations, 1 lane).
#[derive(Clone, Default)]
pub struct PasswordHasherService {
    argon2: Argon2<'static>,
}

impl PasswordHasherService {
    /// New hasher
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash into a PHC string (`$argon2id$v=19$...`)
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| FormdeskError::Internal(format!("password hashing failed: {}", e)))
    }

    /// Constant-time check of `password` against a stored PHC string.
    ///
    /// A malformed stored hash is an internal error, not a mismatch.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| FormdeskError::Internal(format!("stored password hash is invalid: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(FormdeskError::Internal(format!("password verification failed: {}", e))),
        }
    }

    /// [`hash_password`](Self::hash_password) on the blocking pool
    pub async fn hash_password_async(&self, password: String) -> Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| FormdeskError::Internal(format!("hashing task failed: {}", e)))?
    }

    /// [`verify_password`](Self::verify_password) on the blocking pool
    pub async fn verify_password_async(&self, password: String, hash: String) -> Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
            .await
            .map_err(|e| FormdeskError::Internal(format!("hashing task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasherService::new();
        let hash = hasher.hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("correct horse", &hash).unwrap());
        assert!(!hasher.verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_salted() {
        let hasher = PasswordHasherService::new();
        assert_ne!(
            hasher.hash_password("same").unwrap(),
            hasher.hash_password("same").unwrap()
        );
    }

    #[test]
    fn test_garbage_hash_is_error() {
        let hasher = PasswordHasherService::new();
        assert!(hasher.verify_password("x", "not-a-hash").is_err());
    }
}
