// src/utils/hash.rs

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Checks a plain password against a stored hash.
/// A stored value that is not a valid argon2 hash never matches.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        tracing::warn!("Stored password is not a valid hash");
        return Ok(false);
    };

    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);

    Ok(result.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("student123").unwrap();
        assert_ne!(hash, "student123");
        assert!(verify_password("student123", &hash).unwrap());
        assert!(!verify_password("student124", &hash).unwrap());
    }

    #[test]
    fn plaintext_in_store_never_matches() {
        assert!(!verify_password("admin123", "admin123").unwrap());
    }
}
