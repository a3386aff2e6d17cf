//! Membership Domain
//!
//! This crate owns everything about who is invoicing and what their plan
//! allows them to do.
//!
//! # Tiers
//!
//! | Tier | Monthly invoices | Notes |
//! |------|------------------|-------|
//! | free | 5 | default for new accounts |
//! | starter | 50 | multi-currency invoices |
//! | professional | 500 | adds currency conversion |
//! | business | unlimited | every feature |
//!
//! Quotas are counted per calendar month. A paid tier whose subscription has
//! lapsed behaves as `free` until renewed.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use domain_membership::{MembershipTier, TierCatalog, TierPolicy};
//!
//! let policy = TierPolicy::new(Arc::new(TierCatalog::standard()));
//! assert!(policy.can_create_invoice(MembershipTier::Free, 4));
//! assert!(!policy.can_create_invoice(MembershipTier::Free, 5));
//! ```

pub mod tier;
pub mod policy;
pub mod user;
pub mod ports;
pub mod services;
pub mod error;

pub use tier::{Feature, MembershipTier, Quota, TierCatalog, TierDefinition};
pub use policy::{TierPolicy, Usage};
pub use user::{check_password, normalize_email, CredentialHasher, NewUser, User};
pub use ports::UserPort;
pub use services::MembershipService;
pub use error::MembershipError;
