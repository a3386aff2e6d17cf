//! Membership domain errors

use core_kernel::{CoreError, PortError};
use thiserror::Error;

/// Errors that can occur in the membership domain
#[derive(Debug, Error)]
pub enum MembershipError {
    /// Tier name not recognised
    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    /// Quota value that is neither -1 nor a non-negative count
    #[error("Invalid quota value: {0}")]
    InvalidQuota(i64),

    /// Email failed syntax validation
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Password shorter than the minimum length
    #[error("Password must be at least {min_length} characters")]
    WeakPassword { min_length: usize },

    /// Another account already uses this email
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The account has been deactivated
    #[error("Account is deactivated")]
    AccountInactive,

    /// User with the given ID was not found
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Invalid user data provided
    #[error("Invalid user data: {0}")]
    InvalidData(String),

    /// Credential hashing failed
    #[error("Credential error: {0}")]
    Credential(String),

    /// Inconsistent tier configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] PortError),
}

impl MembershipError {
    /// Returns true for errors caused by caller input
    pub fn is_validation(&self) -> bool {
        match self {
            MembershipError::UnknownTier(_)
            | MembershipError::InvalidEmail(_)
            | MembershipError::WeakPassword { .. }
            | MembershipError::InvalidData(_) => true,
            MembershipError::Core(e) => e.is_validation(),
            _ => false,
        }
    }
}
