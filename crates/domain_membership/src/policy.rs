//! Quota enforcement for invoice creation
//!
//! The policy decides from a tier and a count the caller supplies; it never
//! counts anything itself. Callers must run the count and the subsequent
//! insert under per-user serialization or two concurrent requests can both
//! pass the check.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::sync::Arc;

use crate::tier::{Feature, MembershipTier, Quota, TierCatalog};

/// Invoice usage for the current period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub tier: MembershipTier,
    pub used: u64,
    /// `-1` when unlimited
    pub limit: Quota,
    /// `used / limit * 100`; zero when unlimited or the limit is zero
    pub percentage: Decimal,
    /// Invoices left this period, `None` when unlimited
    pub remaining: Option<u64>,
}

impl Usage {
    /// Returns true once no further invoices are allowed
    pub fn is_exhausted(&self) -> bool {
        !self.limit.allows(self.used)
    }
}

/// Tier-based creation gate and usage reporting
#[derive(Debug, Clone)]
pub struct TierPolicy {
    catalog: Arc<TierCatalog>,
}

impl TierPolicy {
    pub fn new(catalog: Arc<TierCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    /// The quota configured for a tier
    pub fn quota(&self, tier: MembershipTier) -> Quota {
        self.catalog.get(tier).quota
    }

    /// Whether another invoice may be created after `invoices_this_period`
    pub fn can_create_invoice(&self, tier: MembershipTier, invoices_this_period: u64) -> bool {
        self.quota(tier).allows(invoices_this_period)
    }

    /// Usage report for a tier and count
    pub fn usage(&self, tier: MembershipTier, invoices_this_period: u64) -> Usage {
        let limit = self.quota(tier);
        let (percentage, remaining) = match limit {
            Quota::Unlimited => (Decimal::ZERO, None),
            Quota::Limited(0) => (Decimal::ZERO, Some(0)),
            Quota::Limited(n) => {
                let n = u64::from(n);
                (
                    Decimal::from(invoices_this_period) / Decimal::from(n) * dec!(100),
                    Some(n.saturating_sub(invoices_this_period)),
                )
            }
        };

        Usage {
            tier,
            used: invoices_this_period,
            limit,
            percentage,
            remaining,
        }
    }

    /// Whether a tier enables a feature
    pub fn allows_feature(&self, tier: MembershipTier, feature: Feature) -> bool {
        self.catalog.has_feature(tier, feature)
    }
}
