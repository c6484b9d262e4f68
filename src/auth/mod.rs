//! Authentication: credential checks, password hashing and session tokens.

pub mod attempts;
pub mod guard;
pub mod password;
pub mod token;

pub use attempts::{AttemptScope, LoginAttempts};
pub use guard::{LockoutPolicy, LoginGuard, LoginResult};
pub use password::{validate_password_strength, Argon2Passwords, PasswordVerifier};
pub use token::{Claims, JwtIssuer, TokenIssuer};
