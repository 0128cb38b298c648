//! Argon2id password hashing, shared by the user store (hashing on
//! create/update) and the auth service (verification at login).
//!
//! Parameters follow the OWASP recommendation: 19 MiB memory, 2
//! iterations, parallelism 1, with a fresh random salt per hash. An
//! optional server-side pepper is prepended to the password before
//! hashing; verification must supply the same pepper.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::{TrolleyError, TrolleyResult};

fn hasher() -> TrolleyResult<Argon2<'static>> {
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| TrolleyError::Internal(format!("argon2 params error: {e}")))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

fn apply_pepper(password: &str, pepper: Option<&str>) -> String {
    match pepper {
        Some(p) => format!("{p}{password}"),
        None => password.to_string(),
    }
}

pub fn hash_password(password: &str, pepper: Option<&str>) -> TrolleyResult<String> {
    let input = apply_pepper(password, pepper);
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = hasher()?
        .hash_password(input.as_bytes(), &salt)
        .map_err(|e| TrolleyError::Internal(format!("password hash error: {e}")))?;
    Ok(hash.to_string())
}

/// `Ok(false)` is a clean mismatch; `Err` means the stored hash is
/// not a valid PHC string.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> TrolleyResult<bool> {
    let input = apply_pepper(password, pepper);
    let parsed = argon2::PasswordHash::new(hash)
        .map_err(|e| TrolleyError::Internal(format!("invalid hash format: {e}")))?;

    match hasher()?.verify_password(input.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(TrolleyError::Internal(format!("verify error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_and_mismatch() {
        let hash = hash_password("grocery-run-42", None).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("grocery-run-42", &hash, None).unwrap());
        assert!(!verify_password("grocery-run-43", &hash, None).unwrap());
    }

    #[test]
    fn pepper_must_match_on_both_sides() {
        let hash = hash_password("grocery-run-42", Some("aisle9")).unwrap();
        assert!(verify_password("grocery-run-42", &hash, Some("aisle9")).unwrap());
        assert!(!verify_password("grocery-run-42", &hash, None).unwrap());
        assert!(!verify_password("grocery-run-42", &hash, Some("aisle3")).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("grocery-run-42", "not-a-phc-string", None).is_err());
    }
}
