use crate::auth::{token::MAX_TOKEN_TTL_SECONDS, AttemptScope};
use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";
pub const ARG_LOGIN_ATTEMPTS_LIMIT: &str = "login-attempts-limit";
pub const ARG_LOGIN_TIMEOUT_MINUTES: &str = "login-timeout-minutes";
pub const ARG_LOGIN_ATTEMPTS_SCOPE: &str = "login-attempts-scope";
pub const ARG_LOGIN_LOCKOUT_ENFORCE: &str = "login-lockout-enforce";

fn validator_scope() -> ValueParser {
    ValueParser::from(move |scope: &str| -> std::result::Result<AttemptScope, String> {
        scope.parse()
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Secret used to sign session tokens")
                .env("MARKETAPP_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long(ARG_TOKEN_TTL_SECONDS)
                .help("Session token TTL in seconds")
                .env("MARKETAPP_TOKEN_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_LOGIN_ATTEMPTS_LIMIT)
                .long(ARG_LOGIN_ATTEMPTS_LIMIT)
                .help("Failed logins before the lockout flag is raised")
                .env("MARKETAPP_LOGIN_ATTEMPTS_LIMIT")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_LOGIN_TIMEOUT_MINUTES)
                .long(ARG_LOGIN_TIMEOUT_MINUTES)
                .help("Lockout window in minutes, compared with the time since the previous attempt")
                .env("MARKETAPP_LOGIN_TIMEOUT_MINUTES")
                .default_value("1800")
                .value_parser(clap::value_parser!(i64).range(0..)),
        )
        .arg(
            Arg::new(ARG_LOGIN_ATTEMPTS_SCOPE)
                .long(ARG_LOGIN_ATTEMPTS_SCOPE)
                .help("Count failed logins globally or per email: global, email")
                .env("MARKETAPP_LOGIN_ATTEMPTS_SCOPE")
                .default_value("global")
                .value_parser(validator_scope()),
        )
        .arg(
            Arg::new(ARG_LOGIN_LOCKOUT_ENFORCE)
                .long(ARG_LOGIN_LOCKOUT_ENFORCE)
                .help("Refuse correct credentials while the lockout flag is raised")
                .env("MARKETAPP_LOGIN_LOCKOUT_ENFORCE")
                .action(ArgAction::SetTrue),
        )
}
