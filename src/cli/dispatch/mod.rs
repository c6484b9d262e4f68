use crate::auth::{AttemptScope, LockoutPolicy};
use crate::cli::{
    actions::{server::Args, Action},
    commands::auth::{
        ARG_JWT_SECRET, ARG_LOGIN_ATTEMPTS_LIMIT, ARG_LOGIN_ATTEMPTS_SCOPE,
        ARG_LOGIN_LOCKOUT_ENFORCE, ARG_LOGIN_TIMEOUT_MINUTES, ARG_TOKEN_TTL_SECONDS,
    },
};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let jwt_secret = matches
        .get_one::<String>(ARG_JWT_SECRET)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --jwt-secret")?;

    let defaults = LockoutPolicy::default();
    let policy = LockoutPolicy {
        limit: matches
            .get_one::<u32>(ARG_LOGIN_ATTEMPTS_LIMIT)
            .copied()
            .unwrap_or(defaults.limit),
        window_minutes: matches
            .get_one::<i64>(ARG_LOGIN_TIMEOUT_MINUTES)
            .copied()
            .unwrap_or(defaults.window_minutes),
        enforce: matches.get_flag(ARG_LOGIN_LOCKOUT_ENFORCE),
    };

    Ok(Action::Server(Args {
        port,
        dsn,
        jwt_secret,
        token_ttl_seconds: matches
            .get_one::<i64>(ARG_TOKEN_TTL_SECONDS)
            .copied()
            .unwrap_or(crate::auth::token::DEFAULT_TOKEN_TTL_SECONDS),
        attempt_scope: matches
            .get_one::<AttemptScope>(ARG_LOGIN_ATTEMPTS_SCOPE)
            .copied()
            .unwrap_or_default(),
        policy,
    }))
}
