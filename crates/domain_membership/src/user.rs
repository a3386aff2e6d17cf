//! User accounts and subscription state

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use core_kernel::{sanitize_optional, CurrencyCode, UserId};

use crate::error::MembershipError;
use crate::tier::MembershipTier;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum stored length of an email address
pub const MAX_EMAIL_LENGTH: usize = 120;

/// Maximum stored length of a company name
pub const MAX_COMPANY_NAME_LENGTH: usize = 200;

/// Length of a paid subscription started by an upgrade
pub const SUBSCRIPTION_DAYS: i64 = 30;

/// Registration input before validation and hashing
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub company_name: Option<String>,
    /// Preferred invoice currency; the application default when absent
    pub default_currency: Option<String>,
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    /// Lower-cased, unique across accounts
    pub email: String,
    /// Hash produced by the configured [`CredentialHasher`]
    #[serde(skip_serializing)]
    pub credential_hash: String,
    pub company_name: Option<String>,
    pub default_currency: CurrencyCode,
    pub tier: MembershipTier,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates an active free-tier account
    ///
    /// # Errors
    ///
    /// Returns `InvalidEmail` if the address fails validation.
    pub fn new(
        email: &str,
        credential_hash: String,
        company_name: Option<&str>,
        default_currency: CurrencyCode,
        now: DateTime<Utc>,
    ) -> Result<Self, MembershipError> {
        Ok(Self {
            id: UserId::new_v7(),
            email: normalize_email(email)?,
            credential_hash,
            company_name: sanitize_optional(company_name, MAX_COMPANY_NAME_LENGTH),
            default_currency,
            tier: MembershipTier::Free,
            subscription_expires_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// The tier whose limits apply at `now`
    ///
    /// A paid tier past its expiry is treated as free. A paid tier without
    /// an expiry never lapses.
    pub fn effective_tier(&self, now: DateTime<Utc>) -> MembershipTier {
        match self.subscription_expires_at {
            Some(expires_at) if self.tier.is_paid() && expires_at <= now => MembershipTier::Free,
            _ => self.tier,
        }
    }

    /// Returns true if a paid subscription has lapsed
    pub fn subscription_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.effective_tier(now) != self.tier
    }

    /// Moves the account to `tier`
    ///
    /// Paid tiers run for [`SUBSCRIPTION_DAYS`] from `now`; free clears the
    /// expiry.
    pub fn change_tier(&mut self, tier: MembershipTier, now: DateTime<Utc>) {
        self.tier = tier;
        self.subscription_expires_at = tier
            .is_paid()
            .then(|| now + Duration::days(SUBSCRIPTION_DAYS));
        self.updated_at = now;
    }

    /// Blocks further logins
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = now;
    }
}

/// Lower-cases and validates an email address
pub fn normalize_email(email: &str) -> Result<String, MembershipError> {
    let normalized = email.trim().to_lowercase();
    if normalized.chars().count() > MAX_EMAIL_LENGTH || !normalized.validate_email() {
        return Err(MembershipError::InvalidEmail(email.trim().to_string()));
    }
    Ok(normalized)
}

/// Checks a plaintext password against the length rule
pub fn check_password(password: &str) -> Result<(), MembershipError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(MembershipError::WeakPassword {
            min_length: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// One-way password hashing
///
/// The domain never sees a hashing algorithm; the API layer supplies one.
pub trait CredentialHasher: Send + Sync {
    /// Hashes a plaintext password for storage
    fn hash(&self, password: &str) -> Result<String, MembershipError>;

    /// Returns true if `password` matches the stored hash
    fn verify(&self, password: &str, credential_hash: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn user() -> User {
        User::new(
            "  Owner@Example.COM ",
            "hash".to_string(),
            Some("  <Acme> Studio "),
            "EUR".parse().unwrap(),
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_user_defaults() {
        let user = user();
        assert_eq!(user.email, "owner@example.com");
        assert_eq!(user.company_name.as_deref(), Some("Acme Studio"));
        assert_eq!(user.tier, MembershipTier::Free);
        assert!(user.is_active);
        assert!(user.subscription_expires_at.is_none());
    }

    #[test]
    fn test_invalid_email_rejected() {
        let result = User::new("not-an-email", "h".to_string(), None, "USD".parse().unwrap(), now());
        assert!(matches!(result, Err(MembershipError::InvalidEmail(_))));
    }

    #[test]
    fn test_password_length() {
        assert!(check_password("1234567").is_err());
        assert!(check_password("12345678").is_ok());
    }

    #[test]
    fn test_paid_upgrade_sets_expiry() {
        let mut user = user();
        user.change_tier(MembershipTier::Starter, now());
        assert_eq!(user.subscription_expires_at, Some(now() + Duration::days(30)));
        assert_eq!(user.effective_tier(now()), MembershipTier::Starter);

        user.change_tier(MembershipTier::Free, now());
        assert!(user.subscription_expires_at.is_none());
    }

    #[test]
    fn test_expired_subscription_falls_back_to_free() {
        let mut user = user();
        user.change_tier(MembershipTier::Professional, now());
        let later = now() + Duration::days(31);
        assert_eq!(user.effective_tier(later), MembershipTier::Free);
        assert!(user.subscription_lapsed(later));
    }

    #[test]
    fn test_paid_tier_without_expiry_stays_active() {
        let mut user = user();
        user.tier = MembershipTier::Business;
        user.subscription_expires_at = None;
        assert_eq!(user.effective_tier(now() + Duration::days(365)), MembershipTier::Business);
    }

    #[test]
    fn test_credential_hash_not_serialized() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("credential_hash").is_none());
    }
}
