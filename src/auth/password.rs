//! Password hashing and verification (Argon2id, PHC strings).

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier as _,
};
use async_trait::async_trait;
use rand::rngs::OsRng;
use std::sync::Arc;

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 32;

const DECOY_PASSWORD: &str = "decoy-password-never-matches";

/// Compares a plaintext password against a stored hash.
///
/// Implementations must spend comparable time whether `stored` is a real hash
/// or an arbitrary placeholder string.
#[async_trait]
pub trait PasswordVerifier: Send + Sync {
    async fn matches(&self, candidate: &str, stored: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct Argon2Passwords {
    decoy: Arc<str>,
}

impl Argon2Passwords {
    /// # Errors
    /// Returns an error if the decoy hash cannot be computed.
    pub fn new() -> Result<Self> {
        let decoy = hash_blocking(DECOY_PASSWORD)?;
        Ok(Self {
            decoy: Arc::from(decoy),
        })
    }

    /// Hash a plaintext password into a PHC string.
    /// # Errors
    /// Returns an error if hashing fails or the blocking task panics.
    pub async fn hash(&self, plain: &str) -> Result<String> {
        let plain = plain.to_string();
        tokio::task::spawn_blocking(move || hash_blocking(&plain))
            .await
            .context("password hashing task failed")?
    }
}

impl std::fmt::Debug for Argon2Passwords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Passwords").finish_non_exhaustive()
    }
}

#[async_trait]
impl PasswordVerifier for Argon2Passwords {
    async fn matches(&self, candidate: &str, stored: &str) -> Result<bool> {
        let candidate = candidate.to_string();
        let stored = stored.to_string();
        let decoy = Arc::clone(&self.decoy);

        tokio::task::spawn_blocking(move || verify_blocking(&candidate, &stored, &decoy))
            .await
            .context("password verification task failed")?
    }
}

fn hash_blocking(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("failed to hash password: {e}"))
}

fn verify_blocking(candidate: &str, stored: &str, decoy: &str) -> Result<bool> {
    let Ok(parsed) = PasswordHash::new(stored) else {
        // Not a PHC string: pay for a full verification anyway, then fail.
        let decoy = PasswordHash::new(decoy).map_err(|e| anyhow!("invalid decoy hash: {e}"))?;
        let _ = Argon2::default().verify_password(candidate.as_bytes(), &decoy);
        return Ok(false);
    };

    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("failed to verify password: {e}")),
    }
}

/// Check a new password against the account password policy.
///
/// # Errors
/// Returns a human readable reason when the password is rejected.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    let length = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(format!(
            "Password must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} characters"
        ));
    }

    if !password.is_ascii() {
        return Err("Password must only contain latin characters".to_string());
    }

    if password.chars().any(char::is_whitespace) {
        return Err("Password must not contain white spaces".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain a lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain an uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a number".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_punctuation()) {
        return Err("Password must contain a special character".to_string());
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let passwords = Argon2Passwords::new().unwrap();
        let hash = passwords.hash("Secret1!").await.unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(passwords.matches("Secret1!", &hash).await.unwrap());
        assert!(!passwords.matches("wrong", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn placeholder_never_matches() {
        let passwords = Argon2Passwords::new().unwrap();

        assert!(!passwords
            .matches("<RANDOM_PASSWORD_FILLER>", "<RANDOM_PASSWORD_FILLER>")
            .await
            .unwrap());
        assert!(!passwords.matches("", "").await.unwrap());
    }

    #[test]
    fn password_policy() {
        assert!(validate_password_strength("Secret1!").is_ok());
        assert!(validate_password_strength("S1!a").is_err());
        assert!(validate_password_strength("secret1!").is_err());
        assert!(validate_password_strength("SECRET1!").is_err());
        assert!(validate_password_strength("Secret!!").is_err());
        assert!(validate_password_strength("Secret12").is_err());
        assert!(validate_password_strength("Secret 1!").is_err());
        assert!(validate_password_strength("Sécret1!").is_err());
        assert!(validate_password_strength(&format!("Aa1!{}", "a".repeat(29))).is_err());
    }
}
