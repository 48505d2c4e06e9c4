//! Admin API credentials.

use argon2::{Argon2, PasswordHash, PasswordVerifier};

/// Admin configuration with hashed secret.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// PHC string of the argon2 hashed admin secret.
    pub secret_hash: String,
}

impl AdminConfig {
    pub fn new(secret_hash: String) -> Self {
        Self { secret_hash }
    }

    /// Check the plaintext from `Invl-Admin-Authorization` against the hash.
    pub fn verify_secret(&self, plaintext: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.secret_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{
        PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    #[test]
    fn test_verify_secret() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"stockroom-key", &salt)
            .unwrap()
            .to_string();
        let admin = AdminConfig::new(hash);

        assert!(admin.verify_secret("stockroom-key"));
        assert!(!admin.verify_secret("stockroom-key "));
    }

    #[test]
    fn test_malformed_hash_rejects_everything() {
        let admin = AdminConfig::new("not-a-phc-string".into());
        assert!(!admin.verify_secret("not-a-phc-string"));
    }
}
