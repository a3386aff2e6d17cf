//! Membership domain services

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use core_kernel::{CurrencyTable, PortError, UserId};

use crate::error::MembershipError;
use crate::ports::UserPort;
use crate::tier::MembershipTier;
use crate::user::{check_password, normalize_email, CredentialHasher, NewUser, User};

/// Account registration, login and plan changes
#[derive(Clone)]
pub struct MembershipService {
    users: Arc<dyn UserPort>,
    hasher: Arc<dyn CredentialHasher>,
    currencies: Arc<CurrencyTable>,
}

impl MembershipService {
    pub fn new(
        users: Arc<dyn UserPort>,
        hasher: Arc<dyn CredentialHasher>,
        currencies: Arc<CurrencyTable>,
    ) -> Self {
        Self {
            users,
            hasher,
            currencies,
        }
    }

    /// Registers a new free-tier account
    ///
    /// # Errors
    ///
    /// - `InvalidEmail` / `WeakPassword` for malformed input
    /// - `Core` validation error for an unknown default currency
    /// - `EmailTaken` if the normalized email is already registered
    pub async fn register(&self, new_user: NewUser, now: DateTime<Utc>) -> Result<User, MembershipError> {
        let email = normalize_email(&new_user.email)?;
        check_password(&new_user.password)?;
        let currency = match new_user.default_currency.as_deref() {
            Some(code) => self.currencies.require(code)?,
            None => self.currencies.default_code(),
        };

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(MembershipError::EmailTaken(email));
        }

        let credential_hash = self.hasher.hash(&new_user.password)?;
        let user = User::new(
            &email,
            credential_hash,
            new_user.company_name.as_deref(),
            currency,
            now,
        )?;

        let user = self.users.create(user).await.map_err(|e| match e {
            PortError::Conflict { .. } => MembershipError::EmailTaken(email.clone()),
            other => other.into(),
        })?;

        info!(user_id = %user.id, email = %user.email, "User registered");
        Ok(user)
    }

    /// Verifies credentials and returns the account
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, MembershipError> {
        let email = email.trim().to_lowercase();
        let user = match self.users.find_by_email(&email).await? {
            Some(user) if self.hasher.verify(password, &user.credential_hash) => user,
            _ => {
                warn!(email = %email, "Failed login attempt");
                return Err(MembershipError::InvalidCredentials);
            }
        };

        if !user.is_active {
            warn!(user_id = %user.id, "Login attempt on deactivated account");
            return Err(MembershipError::AccountInactive);
        }

        info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// Loads an account by ID
    pub async fn get(&self, id: UserId) -> Result<User, MembershipError> {
        debug!(user_id = %id, "Loading user");
        self.users.get(id).await.map_err(|e| match e {
            PortError::NotFound { .. } => MembershipError::UserNotFound(id.to_string()),
            other => other.into(),
        })
    }

    /// Switches the account's plan
    ///
    /// There is no payment step; a paid tier simply starts a fresh
    /// subscription period.
    pub async fn change_tier(
        &self,
        id: UserId,
        tier: MembershipTier,
        now: DateTime<Utc>,
    ) -> Result<User, MembershipError> {
        let mut user = self.get(id).await?;
        let previous = user.tier;
        user.change_tier(tier, now);
        let user = self.users.update(user).await?;

        info!(
            user_id = %user.id,
            from = %previous,
            to = %tier,
            expires_at = ?user.subscription_expires_at,
            "Membership tier changed"
        );
        Ok(user)
    }

    /// Deactivates an account so it can no longer log in
    pub async fn deactivate(&self, id: UserId, now: DateTime<Utc>) -> Result<User, MembershipError> {
        let mut user = self.get(id).await?;
        user.deactivate(now);
        let user = self.users.update(user).await?;
        info!(user_id = %user.id, "User deactivated");
        Ok(user)
    }

    /// Removes the account record
    ///
    /// Invoices are removed by the caller first, or by the storage cascade.
    pub async fn delete(&self, id: UserId) -> Result<(), MembershipError> {
        self.users.delete(id).await.map_err(|e| match e {
            PortError::NotFound { .. } => MembershipError::UserNotFound(id.to_string()),
            other => other.into(),
        })?;
        info!(user_id = %id, "User deleted");
        Ok(())
    }
}
