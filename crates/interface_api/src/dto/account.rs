//! Account DTOs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use domain_membership::{Feature, MembershipTier, User};

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    #[serde(flatten)]
    pub user: User,
    /// Tier used for quota and features; `free` once a paid plan lapses
    pub effective_tier: MembershipTier,
    pub features: BTreeSet<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    pub tier: MembershipTier,
}

#[derive(Debug, Serialize)]
pub struct AccountDeletedResponse {
    pub invoices_removed: u64,
}
