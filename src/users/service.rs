use super::query::{paginate, ListQuery, UserPage, UserSummary};
use crate::auth::{Argon2Passwords, PasswordVerifier};
use crate::repository::UserRepository;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error("email is already registered")]
    EmailTaken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct UsersService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<Argon2Passwords>,
}

impl std::fmt::Debug for UsersService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsersService").finish_non_exhaustive()
    }
}

impl UsersService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, passwords: Arc<Argon2Passwords>) -> Self {
        Self { users, passwords }
    }

    /// # Errors
    /// Returns an error if the repository fails.
    #[instrument(skip(self))]
    pub async fn list(&self, query: &ListQuery) -> Result<UserPage, UserError> {
        let users = self.users.list().await?;
        Ok(paginate(users, query))
    }

    /// # Errors
    /// [`UserError::NotFound`] if no user has this id.
    pub async fn get(&self, id: Uuid) -> Result<UserSummary, UserError> {
        self.users
            .find_by_id(id)
            .await?
            .as_ref()
            .map(UserSummary::from)
            .ok_or(UserError::NotFound)
    }

    /// Register a user, hashing the plaintext password.
    ///
    /// # Errors
    /// [`UserError::EmailTaken`] if the email is already registered.
    #[instrument(skip(self, password))]
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserSummary, UserError> {
        if self.email_is_registered(email).await? {
            return Err(UserError::EmailTaken);
        }

        let hash = self.passwords.hash(password).await?;
        let user = self.users.create(name, email, &hash).await?;

        debug!(user_id = %user.id, "user created");

        Ok(UserSummary::from(&user))
    }

    /// # Errors
    /// [`UserError::NotFound`] or [`UserError::EmailTaken`] when the new email
    /// belongs to another user.
    #[instrument(skip(self))]
    pub async fn update(&self, id: Uuid, name: &str, email: &str) -> Result<(), UserError> {
        let user = self.users.find_by_id(id).await?.ok_or(UserError::NotFound)?;

        if user.email != email && self.email_is_registered(email).await? {
            return Err(UserError::EmailTaken);
        }

        if self.users.update(id, name, email).await? {
            Ok(())
        } else {
            Err(UserError::NotFound)
        }
    }

    /// # Errors
    /// [`UserError::NotFound`] if no user has this id.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), UserError> {
        if self.users.delete(id).await? {
            Ok(())
        } else {
            Err(UserError::NotFound)
        }
    }

    /// # Errors
    /// Returns an error if the repository fails.
    pub async fn email_is_registered(&self, email: &str) -> Result<bool, UserError> {
        Ok(self.users.find_by_email(email).await?.is_some())
    }

    /// # Errors
    /// [`UserError::NotFound`] if no user has this id.
    #[instrument(skip(self, password))]
    pub async fn check_password(&self, id: Uuid, password: &str) -> Result<bool, UserError> {
        let user = self.users.find_by_id(id).await?.ok_or(UserError::NotFound)?;
        Ok(self.passwords.matches(password, &user.password_hash).await?)
    }

    /// # Errors
    /// [`UserError::NotFound`] if no user has this id.
    #[instrument(skip(self, password))]
    pub async fn change_password(&self, id: Uuid, password: &str) -> Result<(), UserError> {
        if self.users.find_by_id(id).await?.is_none() {
            return Err(UserError::NotFound);
        }

        let hash = self.passwords.hash(password).await?;

        if self.users.change_password(id, &hash).await? {
            Ok(())
        } else {
            Err(UserError::NotFound)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    fn service() -> UsersService {
        UsersService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Argon2Passwords::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn create_and_get() {
        let users = service();
        let created = users.create("Ana", "ana@x.com", "Secret1!").await.unwrap();
        let id = Uuid::parse_str(&created.id).unwrap();

        assert_eq!(users.get(id).await.unwrap(), created);
        assert!(users.email_is_registered("ana@x.com").await.unwrap());
        assert!(!users.email_is_registered("bob@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn create_duplicate_email() {
        let users = service();
        users.create("Ana", "ana@x.com", "Secret1!").await.unwrap();

        let err = users.create("Other", "ana@x.com", "Secret1!").await.unwrap_err();
        assert!(matches!(err, UserError::EmailTaken));
    }

    #[tokio::test]
    async fn update_and_delete() {
        let users = service();
        let ana = users.create("Ana", "ana@x.com", "Secret1!").await.unwrap();
        users.create("Bob", "bob@x.com", "Secret1!").await.unwrap();
        let id = Uuid::parse_str(&ana.id).unwrap();

        let err = users.update(id, "Ana", "bob@x.com").await.unwrap_err();
        assert!(matches!(err, UserError::EmailTaken));

        users.update(id, "Ana Maria", "ana@x.com").await.unwrap();
        assert_eq!(users.get(id).await.unwrap().name, "Ana Maria");

        users.delete(id).await.unwrap();
        assert!(matches!(users.get(id).await, Err(UserError::NotFound)));
        assert!(matches!(users.delete(id).await, Err(UserError::NotFound)));
    }

    #[tokio::test]
    async fn change_password() {
        let users = service();
        let ana = users.create("Ana", "ana@x.com", "Secret1!").await.unwrap();
        let id = Uuid::parse_str(&ana.id).unwrap();

        assert!(users.check_password(id, "Secret1!").await.unwrap());
        users.change_password(id, "Secret2@").await.unwrap();
        assert!(!users.check_password(id, "Secret1!").await.unwrap());
        assert!(users.check_password(id, "Secret2@").await.unwrap());

        let missing = Uuid::new_v4();
        assert!(matches!(
            users.change_password(missing, "Secret2@").await,
            Err(UserError::NotFound)
        ));
    }
}
