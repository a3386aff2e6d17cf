//! PostgreSQL User Adapter
//!
//! Implements `UserPort` on top of [`UserRepository`].

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{CurrencyCode, DomainPort, HealthCheckResult, HealthCheckable, PortError, UserId};
use domain_membership::{MembershipTier, User, UserPort};

use crate::error::DatabaseError;
use crate::repositories::users::{UserRepository, UserRow};

const ADAPTER_ID: &str = "postgres-user-store";

/// PostgreSQL-backed implementation of `UserPort`
///
/// Email uniqueness is enforced by the `users.email` unique index; a
/// violation is reported as `PortError::Conflict`.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    repository: UserRepository,
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: UserRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &UserRepository {
        &self.repository
    }
}

impl DomainPort for PgUserStore {}

#[async_trait]
impl HealthCheckable for PgUserStore {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, ADAPTER_ID).await
    }
}

#[async_trait]
impl UserPort for PgUserStore {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn get(&self, id: UserId) -> Result<User, PortError> {
        debug!("Fetching user by ID");
        let row = self.repository.get_by_id(*id.as_uuid()).await?;
        Ok(row_to_user(row)?)
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, PortError> {
        debug!("Looking up user by email");
        match self.repository.find_by_email(email).await? {
            Some(row) => Ok(Some(row_to_user(row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create(&self, user: User) -> Result<User, PortError> {
        debug!("Inserting user");
        self.repository.insert(&user_to_row(&user)).await?;
        Ok(user)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update(&self, user: User) -> Result<User, PortError> {
        debug!("Updating user");
        self.repository.update(&user_to_row(&user)).await?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete(&self, id: UserId) -> Result<(), PortError> {
        debug!("Deleting user");
        Ok(self.repository.delete(*id.as_uuid()).await?)
    }
}

pub(crate) fn user_to_row(user: &User) -> UserRow {
    UserRow {
        id: *user.id.as_uuid(),
        email: user.email.clone(),
        credential_hash: user.credential_hash.clone(),
        company_name: user.company_name.clone(),
        default_currency: user.default_currency.to_string(),
        tier: user.tier.as_str().to_string(),
        subscription_expires_at: user.subscription_expires_at,
        is_active: user.is_active,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

/// Rebuilds a `User` from its row
///
/// Stored values are trusted as written except for the enumerated columns,
/// which must still parse.
pub(crate) fn row_to_user(row: UserRow) -> Result<User, DatabaseError> {
    let default_currency: CurrencyCode = row
        .default_currency
        .parse()
        .map_err(|e| DatabaseError::corrupt("users", e))?;
    let tier: MembershipTier = row
        .tier
        .parse()
        .map_err(|e| DatabaseError::corrupt("users", e))?;

    Ok(User {
        id: UserId::from_uuid(row.id),
        email: row.email,
        credential_hash: row.credential_hash,
        company_name: row.company_name,
        default_currency,
        tier,
        subscription_expires_at: row.subscription_expires_at,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
