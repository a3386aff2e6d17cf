//! Membership Domain Ports
//!
//! `UserPort` is the storage interface for accounts. Two adapters exist:
//!
//! - **In-memory**: [`memory::InMemoryUserStore`], used by tests and by the
//!   server's `memory` storage mode
//! - **PostgreSQL**: `infra_db::PgUserStore`
//!
//! Emails are stored lower-cased; adapters compare them exactly.

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, PortError, UserId};

use crate::user::User;

/// Port for user account storage
#[async_trait]
pub trait UserPort: DomainPort + HealthCheckable {
    /// Retrieves a user by ID
    ///
    /// # Errors
    ///
    /// `PortError::NotFound` if no such user exists.
    async fn get(&self, id: UserId) -> Result<User, PortError>;

    /// Looks up a user by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, PortError>;

    /// Stores a new user
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` if the email is already registered.
    async fn create(&self, user: User) -> Result<User, PortError>;

    /// Replaces a stored user
    async fn update(&self, user: User) -> Result<User, PortError>;

    /// Removes a user
    async fn delete(&self, id: UserId) -> Result<(), PortError>;
}

/// In-memory implementation of UserPort
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    #[derive(Debug, Default, Clone)]
    pub struct InMemoryUserStore {
        users: Arc<RwLock<HashMap<UserId, User>>>,
    }

    impl InMemoryUserStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with users for testing
        pub async fn with_users(users: Vec<User>) -> Self {
            let store = Self::new();
            {
                let mut map = store.users.write().await;
                for user in users {
                    map.insert(user.id, user);
                }
            }
            store
        }
    }

    impl DomainPort for InMemoryUserStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryUserStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-user-store", 0)
        }
    }

    #[async_trait]
    impl UserPort for InMemoryUserStore {
        async fn get(&self, id: UserId) -> Result<User, PortError> {
            self.users
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("User", id))
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, PortError> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn create(&self, user: User) -> Result<User, PortError> {
            let mut users = self.users.write().await;
            if users.values().any(|u| u.email == user.email) {
                return Err(PortError::conflict(format!(
                    "email {} already registered",
                    user.email
                )));
            }
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn update(&self, user: User) -> Result<User, PortError> {
            let mut users = self.users.write().await;
            match users.get_mut(&user.id) {
                Some(stored) => {
                    *stored = user.clone();
                    Ok(user)
                }
                None => Err(PortError::not_found("User", user.id)),
            }
        }

        async fn delete(&self, id: UserId) -> Result<(), PortError> {
            self.users
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("User", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::InMemoryUserStore;
    use super::*;
    use chrono::Utc;

    fn user(email: &str) -> User {
        User::new(email, "hash".to_string(), None, "USD".parse().unwrap(), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryUserStore::new();
        let created = store.create(user("a@example.com")).await.unwrap();
        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = InMemoryUserStore::new();
        store.create(user("a@example.com")).await.unwrap();
        let err = store.create(user("a@example.com")).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let store = InMemoryUserStore::with_users(vec![user("a@example.com")]).await;
        assert!(store.find_by_email("a@example.com").await.unwrap().is_some());
        assert!(store.find_by_email("b@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let store = InMemoryUserStore::new();
        let ghost = user("ghost@example.com");
        assert!(store.update(ghost.clone()).await.unwrap_err().is_not_found());
        assert!(store.delete(ghost.id).await.unwrap_err().is_not_found());
    }
}
