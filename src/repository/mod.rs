//! Persistence for users and cart lines.
//!
//! Services depend on the [`UserRepository`] and [`CartRepository`] traits;
//! [`PgStore`] backs them with Postgres and [`MemoryStore`] keeps everything in
//! process memory for tests and local runs.

mod memory;
mod postgres;

pub use self::memory::MemoryStore;
pub use self::postgres::PgStore;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Stored user record. `password_hash` is a PHC string produced by
/// [`crate::auth::Argon2Passwords`].
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub last_login_attempt_time: Option<DateTime<Utc>>,
}

/// One entry in a user's cart. `price` is the unit price times `quantity`.
#[derive(Clone, Debug, PartialEq)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: String,
    pub name: String,
    pub quantity: i32,
    pub price: f64,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn list(&self) -> Result<Vec<User>>;
    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User>;
    /// Returns `false` when no user has the given id.
    async fn update(&self, id: Uuid, name: &str, email: &str) -> Result<bool>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn change_password(&self, id: Uuid, password_hash: &str) -> Result<bool>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn add_line(&self, line: CartLine) -> Result<CartLine>;
    async fn lines_for_user(&self, user_id: Uuid) -> Result<Vec<CartLine>>;
    async fn find_line(&self, id: Uuid) -> Result<Option<CartLine>>;
    async fn update_line(&self, id: Uuid, quantity: i32, price: f64) -> Result<bool>;
    async fn remove_line(&self, id: Uuid) -> Result<bool>;
}
