//! Failed-login bookkeeping for the login guard.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

const GLOBAL_KEY: &str = "";

/// How failed attempts are bucketed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttemptScope {
    /// One counter for the whole process: a failure for any email counts
    /// against every email.
    #[default]
    Global,
    /// One counter per submitted email.
    Email,
}

impl FromStr for AttemptScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "email" => Ok(Self::Email),
            _ => Err(format!("invalid attempt scope: {s}, expected global or email")),
        }
    }
}

impl fmt::Display for AttemptScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Email => write!(f, "email"),
        }
    }
}

/// Failed-attempt counters. Every read-modify-write happens under one lock,
/// so concurrent requests never lose or duplicate an increment.
#[derive(Debug, Default)]
pub struct LoginAttempts {
    scope: AttemptScope,
    counts: Mutex<HashMap<String, u32>>,
}

impl LoginAttempts {
    #[must_use]
    pub fn new(scope: AttemptScope) -> Self {
        Self {
            scope,
            counts: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn scope(&self) -> AttemptScope {
        self.scope
    }

    /// Count one failed attempt and return the updated count.
    pub fn record_failure(&self, email: &str) -> u32 {
        let mut counts = self.lock();
        let count = counts.entry(self.key(email).to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Clear the counter after a successful login.
    pub fn reset(&self, email: &str) {
        self.lock().remove(self.key(email));
    }

    #[must_use]
    pub fn count(&self, email: &str) -> u32 {
        self.lock().get(self.key(email)).copied().unwrap_or(0)
    }

    fn key<'a>(&self, email: &'a str) -> &'a str {
        match self.scope {
            AttemptScope::Global => GLOBAL_KEY,
            AttemptScope::Email => email,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, u32>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn global_scope_shares_one_counter() {
        let attempts = LoginAttempts::new(AttemptScope::Global);
        attempts.record_failure("a@example.com");
        attempts.record_failure("b@example.com");

        assert_eq!(attempts.count("a@example.com"), 2);
        assert_eq!(attempts.count("c@example.com"), 2);

        attempts.reset("c@example.com");
        assert_eq!(attempts.count("a@example.com"), 0);
    }

    #[test]
    fn email_scope_isolates_counters() {
        let attempts = LoginAttempts::new(AttemptScope::Email);
        attempts.record_failure("a@example.com");
        attempts.record_failure("a@example.com");
        attempts.record_failure("b@example.com");

        assert_eq!(attempts.count("a@example.com"), 2);
        assert_eq!(attempts.count("b@example.com"), 1);

        attempts.reset("a@example.com");
        assert_eq!(attempts.count("a@example.com"), 0);
        assert_eq!(attempts.count("b@example.com"), 1);
    }

    #[test]
    fn concurrent_failures_are_not_lost() {
        let attempts = Arc::new(LoginAttempts::new(AttemptScope::Global));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let attempts = Arc::clone(&attempts);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        attempts.record_failure("a@example.com");
                    }
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().is_ok());
        }

        assert_eq!(attempts.count("a@example.com"), 800);
    }

    #[test]
    fn parse_scope() {
        assert_eq!("global".parse::<AttemptScope>(), Ok(AttemptScope::Global));
        assert_eq!("EMAIL".parse::<AttemptScope>(), Ok(AttemptScope::Email));
        assert!("ip".parse::<AttemptScope>().is_err());
        assert_eq!(AttemptScope::Email.to_string(), "email");
    }
}
