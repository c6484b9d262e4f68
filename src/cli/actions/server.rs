use crate::{
    api::{self, AppState},
    auth::{AttemptScope, Argon2Passwords, JwtIssuer, LockoutPolicy, LoginGuard},
    cli::telemetry,
    market::MarketService,
    repository::PgStore,
    users::UsersService,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub attempt_scope: AttemptScope,
    pub policy: LockoutPolicy,
}

/// Connect to the database, apply migrations and serve the API.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&args.dsn)
        .await
        .context("Failed to connect to database")?;

    let store = PgStore::new(pool);
    store.migrate().await?;
    let store = Arc::new(store);

    let passwords = Arc::new(Argon2Passwords::new()?);
    let tokens = Arc::new(JwtIssuer::new(&args.jwt_secret, args.token_ttl_seconds)?);

    let guard = LoginGuard::new(
        store.clone(),
        passwords.clone(),
        tokens.clone(),
        args.attempt_scope,
        args.policy,
    );

    let state = AppState {
        guard: Arc::new(guard),
        users: UsersService::new(store.clone(), passwords),
        market: MarketService::new(store.clone(), store),
        tokens,
    };

    let result = api::new(args.port, state).await;

    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        ("token_ttl_seconds", args.token_ttl_seconds.to_string()),
        ("login_attempts_limit", args.policy.limit.to_string()),
        ("login_timeout_minutes", args.policy.window_minutes.to_string()),
        ("login_attempts_scope", args.attempt_scope.to_string()),
        ("login_lockout_enforce", args.policy.enforce.to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "marketapp {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_dsn() {
        assert_eq!(
            redact_dsn("postgres://app:hunter2@db:5432/marketapp"),
            "postgres://app:REDACTED@db:5432/marketapp"
        );
        assert_eq!(
            redact_dsn("postgres://db:5432/marketapp"),
            "postgres://db:5432/marketapp"
        );
        assert_eq!(redact_dsn("not a url"), "invalid-dsn");
    }

    #[test]
    fn test_short_commit() {
        assert_eq!(short_commit("0123456789abcdef"), "0123456");
        assert_eq!(short_commit("unknown"), "unknown");
        assert_eq!(short_commit("abc"), "abc");
    }
}
