//! User repository.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use cartsync_core::{Email, UserId};

use super::{Database, RepositoryError};
use crate::models::User;

#[derive(Debug, Clone)]
pub(super) struct UserRow {
    email: Email,
    display_name: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn to_user(&self, id: &UserId) -> User {
        User {
            id: id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Repository for user accounts.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a user with a password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create_with_password(
        &self,
        email: &Email,
        display_name: Option<String>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.db.tables.write().await;
        if tables.user_emails.contains_key(email) {
            return Err(RepositoryError::Conflict(format!(
                "email {email} already registered"
            )));
        }

        let id = UserId::new(Uuid::new_v4().to_string());
        let row = UserRow {
            email: email.clone(),
            display_name,
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        let user = row.to_user(&id);
        tables.user_emails.insert(email.clone(), id.clone());
        tables.users.insert(id, row);
        Ok(user)
    }

    /// Get a user by their ID.
    pub async fn get_by_id(&self, id: &UserId) -> Option<User> {
        let tables = self.db.tables.read().await;
        tables.users.get(id).map(|row| row.to_user(id))
    }

    /// Get a user and their password hash by email.
    pub async fn get_password_hash(&self, email: &Email) -> Option<(User, String)> {
        let tables = self.db.tables.read().await;
        let id = tables.user_emails.get(email)?;
        let row = tables.users.get(id)?;
        Some((row.to_user(id), row.password_hash.clone()))
    }
}
