//! Password hashing and verification using argon2id.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use parley_core::{RelayError, RelayResult};

/// Hash a password using argon2id with a random salt.
pub fn hash_password(password: &str) -> RelayResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| RelayError::Storage(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2id digest.
pub fn verify_password(password: &str, digest: &str) -> RelayResult<bool> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| RelayError::Storage(format!("invalid password digest: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let digest = hash_password("mysecret").unwrap();
        assert!(verify_password("mysecret", &digest).unwrap());
        assert!(!verify_password("wrongpassword", &digest).unwrap());
    }

    #[test]
    fn salts_make_hashes_unique() {
        let h1 = hash_password("same").unwrap();
        let h2 = hash_password("same").unwrap();
        assert_ne!(h1, h2);
    }
}
