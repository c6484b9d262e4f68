//! User accounts: listing, lookup, registration, profile and password changes.

mod query;
mod service;

pub use query::{ListQuery, SearchFilter, SortField, SortOrder, UserPage, UserSummary};
pub use service::{UserError, UsersService};

use regex::Regex;

pub const MAX_NAME_LENGTH: usize = 100;

/// Lightweight email sanity check used before persisting data.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

pub fn valid_name(name: &str) -> bool {
    let length = name.trim().chars().count();
    (1..=MAX_NAME_LENGTH).contains(&length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(valid_email("a@x.com"));
        assert!(!valid_email("a@x"));
        assert!(!valid_email("a x@x.com"));
        assert!(!valid_email(""));
    }

    #[test]
    fn names() {
        assert!(valid_name("Ana"));
        assert!(!valid_name("   "));
        assert!(!valid_name(&"a".repeat(101)));
    }
}
