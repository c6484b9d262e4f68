use super::{CartLine, CartRepository, User, UserRepository};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// In-process store, cheap to clone; clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    users: Arc<Mutex<Vec<User>>>,
    lines: Arc<Mutex<Vec<CartLine>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed user, replacing any user with the same id.
    pub fn insert_user(&self, user: User) {
        let mut users = self.users();
        users.retain(|u| u.id != user.id);
        users.push(user);
    }

    fn users(&self) -> MutexGuard<'_, Vec<User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lines(&self) -> MutexGuard<'_, Vec<CartLine>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users().iter().find(|u| u.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.users().clone())
    }

    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let mut users = self.users();
        if users.iter().any(|u| u.email == email) {
            bail!("duplicate email: {email}");
        }

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            last_login_attempt_time: None,
        };
        users.push(user.clone());

        Ok(user)
    }

    async fn update(&self, id: Uuid, name: &str, email: &str) -> Result<bool> {
        let mut users = self.users();
        if users.iter().any(|u| u.email == email && u.id != id) {
            bail!("duplicate email: {email}");
        }

        Ok(users.iter_mut().find(|u| u.id == id).map_or(false, |user| {
            name.clone_into(&mut user.name);
            email.clone_into(&mut user.email);
            true
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut users = self.users();
        let before = users.len();
        users.retain(|u| u.id != id);
        let removed = users.len() < before;
        drop(users);

        if removed {
            self.lines().retain(|l| l.user_id != id);
        }

        Ok(removed)
    }

    async fn change_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        Ok(self
            .users()
            .iter_mut()
            .find(|u| u.id == id)
            .map_or(false, |user| {
                password_hash.clone_into(&mut user.password_hash);
                true
            }))
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn add_line(&self, line: CartLine) -> Result<CartLine> {
        self.lines().push(line.clone());
        Ok(line)
    }

    async fn lines_for_user(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
        Ok(self
            .lines()
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_line(&self, id: Uuid) -> Result<Option<CartLine>> {
        Ok(self.lines().iter().find(|l| l.id == id).cloned())
    }

    async fn update_line(&self, id: Uuid, quantity: i32, price: f64) -> Result<bool> {
        Ok(self
            .lines()
            .iter_mut()
            .find(|l| l.id == id)
            .map_or(false, |line| {
                line.quantity = quantity;
                line.price = price;
                true
            }))
    }

    async fn remove_line(&self, id: Uuid) -> Result<bool> {
        let mut lines = self.lines();
        let before = lines.len();
        lines.retain(|l| l.id != id);
        Ok(lines.len() < before)
    }
}
