//! Credential check with timing-oracle mitigation and an attempt lockout.
//!
//! Every call runs the password verifier exactly once, against the stored hash
//! when the email is known and against [`PASSWORD_PLACEHOLDER`] otherwise, so an
//! unknown email costs as much as a wrong password. Each failed call adds one
//! to the attempt counter and a successful call resets it.
//!
//! Once the counter reaches [`LockoutPolicy::limit`] the result carries
//! `login_max_attempts = true` while the user's previous attempt lies within
//! [`LockoutPolicy::window_minutes`]. Unless [`LockoutPolicy::enforce`] is set
//! the flag is informational: matching credentials still log in.

use crate::auth::{
    attempts::{AttemptScope, LoginAttempts},
    password::PasswordVerifier,
    token::TokenIssuer,
};
use crate::repository::UserRepository;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const LOGIN_ATTEMPTS_LIMIT: u32 = 5;
/// Compared against a difference in whole minutes, so the window is 1800 minutes.
pub const LOGIN_TIMEOUT_MINUTES: i64 = 30 * 60;
pub const PASSWORD_PLACEHOLDER: &str = "<RANDOM_PASSWORD_FILLER>";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub limit: u32,
    pub window_minutes: i64,
    /// Refuse matching credentials while locked out.
    pub enforce: bool,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            limit: LOGIN_ATTEMPTS_LIMIT,
            window_minutes: LOGIN_TIMEOUT_MINUTES,
            enforce: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginResult {
    Success {
        email: String,
        name: String,
        user_id: String,
        token: String,
    },
    Failure {
        login_max_attempts: bool,
    },
}

impl LoginResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

pub struct LoginGuard {
    users: Arc<dyn UserRepository>,
    verifier: Arc<dyn PasswordVerifier>,
    tokens: Arc<dyn TokenIssuer>,
    attempts: LoginAttempts,
    policy: LockoutPolicy,
}

impl std::fmt::Debug for LoginGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginGuard")
            .field("attempts", &self.attempts)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl LoginGuard {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        verifier: Arc<dyn PasswordVerifier>,
        tokens: Arc<dyn TokenIssuer>,
        scope: AttemptScope,
        policy: LockoutPolicy,
    ) -> Self {
        Self {
            users,
            verifier,
            tokens,
            attempts: LoginAttempts::new(scope),
            policy,
        }
    }

    #[must_use]
    pub const fn attempts(&self) -> &LoginAttempts {
        &self.attempts
    }

    #[must_use]
    pub const fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    /// Check an email/password pair.
    ///
    /// Wrong credentials are reported through [`LoginResult::Failure`].
    ///
    /// # Errors
    /// Faults from the user repository, the password verifier or the token
    /// issuer are returned unchanged.
    #[instrument(skip(self, password))]
    pub async fn check_login_credentials(&self, email: &str, password: &str) -> Result<LoginResult> {
        let user = self.users.find_by_email(email).await?;

        let stored = user
            .as_ref()
            .map_or(PASSWORD_PLACEHOLDER, |u| u.password_hash.as_str());
        let password_checked = self.verifier.matches(password, stored).await?;

        let matched = user.is_some() && password_checked;
        let attempts = if matched {
            self.attempts.count(email)
        } else {
            self.attempts.record_failure(email)
        };

        let now = Utc::now();
        let mut login_max_attempts = false;

        if attempts >= self.policy.limit {
            let last_attempt = user
                .as_ref()
                .and_then(|u| u.last_login_attempt_time)
                .unwrap_or(now);
            let minutes = (now - last_attempt).num_minutes();

            debug!(attempts, minutes, "login attempts limit reached");

            if minutes < self.policy.window_minutes {
                login_max_attempts = true;
            }
        }

        match user {
            Some(user) if matched && !(self.policy.enforce && login_max_attempts) => {
                self.attempts.reset(email);

                let user_id = user.id.to_string();
                let token = self.tokens.issue(&user.email, &user_id)?;

                info!(user_id, "login successful");

                Ok(LoginResult::Success {
                    email: user.email,
                    name: user.name,
                    user_id,
                    token,
                })
            }
            _ => {
                if login_max_attempts {
                    warn!(attempts, "login locked out");
                } else {
                    debug!(attempts, "login failed");
                }

                Ok(LoginResult::Failure { login_max_attempts })
            }
        }
    }
}
