//! Cryptographic utilities

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

/// Generate a cryptographically secure random token
pub fn generate_secure_token(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";
    let mut rng = rand::rng();

    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hash a string using SHA-256
pub fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(hash)
}

/// Verify password against hash
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Whether a stored value looks like a PHC-format Argon2 hash
pub fn is_password_hash(value: &str) -> bool {
    PasswordHash::new(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secure_token() {
        let token1 = generate_secure_token(12);
        let token2 = generate_secure_token(12);

        assert_eq!(token1.len(), 12);
        assert_ne!(token1, token2);
        // ambiguous characters are left out
        assert!(!token1.contains(['0', 'O', 'l', '1', 'I']));
    }

    #[test]
    fn test_hash_string() {
        assert_eq!(hash_string("127.0.0.1"), hash_string("127.0.0.1"));
        assert_ne!(hash_string("127.0.0.1"), hash_string("10.0.0.1"));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("tajna123").unwrap();
        assert!(is_password_hash(&hash));
        assert!(!hash.contains("tajna123"));
        assert!(verify_password("tajna123", &hash).unwrap());
        assert!(!verify_password("kriva", &hash).unwrap());
    }
}
