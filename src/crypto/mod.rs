//! Credential hashing and session token utilities.
//!
//! Passwords are stored as Argon2id PHC strings. Login session tokens are
//! random 32-byte values handed to the client in hex; only their SHA-256
//! digest is stored.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of the random salt fed to Argon2, in bytes
const SALT_LENGTH: usize = 16;

/// Length of a session token before hex encoding, in bytes
const TOKEN_LENGTH: usize = 32;

/// Hash a password using Argon2 with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let mut salt_bytes = [0u8; SALT_LENGTH];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)?;

    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random session token
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_LENGTH];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a token for storage
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_plaintext_is_not_a_valid_hash() {
        // Rows copied from a plaintext store must not authenticate
        assert!(!verify_password("secret", "secret"));
    }

    #[test]
    fn test_tokens_are_unique_hex() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_eq!(t1.len(), TOKEN_LENGTH * 2);
        assert!(t1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(t1, t2);
    }

    #[test]
    fn test_hash_token_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(hash_token("abc").len(), 64);
    }
}
