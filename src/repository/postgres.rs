use super::{CartLine, CartRepository, User, UserRepository};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password, last_login_attempt_time";
const LINE_COLUMNS: &str = "id, user_id, item_id, name, quantity, price";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled schema migrations.
    /// # Errors
    /// Returns an error if a migration fails to apply.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password")?,
        last_login_attempt_time: row.try_get("last_login_attempt_time")?,
    })
}

fn line_from_row(row: &PgRow) -> Result<CartLine, sqlx::Error> {
    Ok(CartLine {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        item_id: row.try_get("item_id")?,
        name: row.try_get("name")?,
        quantity: row.try_get("quantity")?,
        price: row.try_get("price")?,
    })
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(user_from_row).collect::<Result<_, _>>()?)
    }

    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (id, name, email, password) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert user")?;

        Ok(user_from_row(&row)?)
    }

    async fn update(&self, id: Uuid, name: &str, email: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET name = $2, email = $3 WHERE id = $1")
            .bind(id)
            .bind(name)
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn change_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn add_line(&self, line: CartLine) -> Result<CartLine> {
        let row = sqlx::query(&format!(
            "INSERT INTO cart_lines (id, user_id, item_id, name, quantity, price) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {LINE_COLUMNS}"
        ))
        .bind(line.id)
        .bind(line.user_id)
        .bind(&line.item_id)
        .bind(&line.name)
        .bind(line.quantity)
        .bind(line.price)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert cart line")?;

        Ok(line_from_row(&row)?)
    }

    async fn lines_for_user(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(&format!(
            "SELECT {LINE_COLUMNS} FROM cart_lines WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(line_from_row).collect::<Result<_, _>>()?)
    }

    async fn find_line(&self, id: Uuid) -> Result<Option<CartLine>> {
        let row = sqlx::query(&format!("SELECT {LINE_COLUMNS} FROM cart_lines WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(line_from_row).transpose()?)
    }

    async fn update_line(&self, id: Uuid, quantity: i32, price: f64) -> Result<bool> {
        let result = sqlx::query("UPDATE cart_lines SET quantity = $2, price = $3 WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .bind(price)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_line(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
