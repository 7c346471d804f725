//! User model and password hashing.
//!
//! # Invariants
//! - Passwords are never stored in plaintext; only `sha256$<salt>$<digest>`.
//! - `login` is unique across users (enforced by a unique index).

use super::{UserId, ValidationError};
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};

const HASH_SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub login: String,
    pub password: String,
}

impl NewUser {
    /// Builds a request; both fields are kept exactly as entered.
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Both fields must be non-empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.login.is_empty() {
            return Err(ValidationError::EmptyField("login"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::EmptyField("password"));
        }
        Ok(())
    }
}

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0_u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    format!(
        "{HASH_SCHEME}${}${}",
        hex::encode(salt),
        hex::encode(digest(&salt, password))
    )
}

/// Checks `password` against a stored `sha256$<salt>$<digest>` value.
///
/// Malformed stored values never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(salt_hex), Some(digest_hex)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };

    let actual = digest(&salt, password);
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected.iter())
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password, NewUser};
    use crate::model::ValidationError;

    #[test]
    fn new_user_requires_both_fields() {
        assert_eq!(
            NewUser::new("", "x").validate(),
            Err(ValidationError::EmptyField("login"))
        );
        assert_eq!(
            NewUser::new("alice", "").validate(),
            Err(ValidationError::EmptyField("password"))
        );
        assert!(NewUser::new(" alice ", "pw").validate().is_ok());
    }

    #[test]
    fn login_is_kept_verbatim() {
        assert_eq!(NewUser::new("  bob ", "pw").login, "  bob ");
        assert!(NewUser::new("   ", "pw").validate().is_ok());
    }

    #[test]
    fn hash_roundtrip_verifies_only_the_right_password() {
        let stored = hash_password("hunter2");
        assert!(stored.starts_with("sha256$"));
        assert!(!stored.contains("hunter2"));
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn same_password_gets_different_salts() {
        assert_ne!(hash_password("pw"), hash_password("pw"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("pw", "pw"));
        assert!(!verify_password("pw", "md5$00$00"));
        assert!(!verify_password("pw", "sha256$zz$zz"));
    }
}
