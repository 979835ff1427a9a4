use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

use crate::model::User;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

lazy_static! {
    // verified against when the account is unknown, so a miss costs as much as a hit
    static ref DUMMY_HASH: String = hash_password("gym-tracker-placeholder").unwrap_or_default();
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("Password too short")]
    TooShort,
    #[error("Password too long")]
    TooLong,
}

/// Length rules for a new password, counted in characters.
pub fn check_policy(plain: &str) -> Result<(), PolicyError> {
    match plain.chars().count() {
        n if n < MIN_PASSWORD_LEN => Err(PolicyError::TooShort),
        n if n > MAX_PASSWORD_LEN => Err(PolicyError::TooLong),
        _ => Ok(()),
    }
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hash failed");
            anyhow::anyhow!("hash password: {e}")
        })
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow::anyhow!("parse password hash: {e}")
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Checks a login attempt against the account found for it, if any.
pub fn verify_login(user: Option<&User>, plain: &str) -> anyhow::Result<bool> {
    match user {
        Some(user) => verify_password(plain, user.password_hash()),
        None => {
            let _ = verify_password(plain, &DUMMY_HASH);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_counts_characters() {
        assert_eq!(check_policy("short"), Err(PolicyError::TooShort));
        assert_eq!(check_policy("ééééééé"), Err(PolicyError::TooShort));
        assert_eq!(check_policy("éééééééé"), Ok(()));
        assert_eq!(
            check_policy(&"x".repeat(MAX_PASSWORD_LEN + 1)),
            Err(PolicyError::TooLong)
        );
        assert_eq!(PolicyError::TooShort.to_string(), "Password too short");
    }

    #[test]
    fn login_checks_the_accounts_hash() {
        let user = User::new(
            "alice",
            "Alice A",
            "alice1",
            "alice@example.com",
            hash_password("correct-horse").unwrap(),
        );
        assert!(verify_login(Some(&user), "correct-horse").unwrap());
        assert!(!verify_login(Some(&user), "wrong-horse").unwrap());
    }

    #[test]
    fn unknown_account_never_logs_in() {
        assert!(!verify_login(None, "gym-tracker-placeholder").unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        let user = User::new("bob", "Bob", "bob1", "bob@example.com", "not-a-hash");
        assert!(verify_login(Some(&user), "anything").is_err());
    }
}
