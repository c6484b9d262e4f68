//! # Marketapp
//!
//! Backend for a small online market: user accounts, login with brute-force
//! lockout, and per-user shopping carts over a fixed item catalog.
//!
//! ## Login lockout
//!
//! Failed logins are counted by [`auth::LoginAttempts`]. Once the count
//! reaches the configured limit, and the user's previous attempt is inside
//! the lockout window, the login response carries `loginMaxAttempts: true`.
//! The counter is process-wide by default; `--login-attempts-scope email`
//! keys it per submitted email instead.
//!
//! Unknown emails are checked against a decoy password hash so that both
//! branches cost the same.
//!
//! ## Storage
//!
//! Users and cart lines live in `PostgreSQL` (see `migrations/`). Tests use
//! [`repository::MemoryStore`].

pub mod api;
pub mod auth;
pub mod cli;
pub mod market;
pub mod repository;
pub mod users;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
