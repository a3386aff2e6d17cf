//! Membership tiers and their static configuration
//!
//! The tier catalog is read-only reference data. It is built once at
//! startup and shared with both the quota policy and anything that renders
//! plan information, so the two always agree.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::MembershipError;

/// Named service plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    Free,
    Starter,
    Professional,
    Business,
}

impl MembershipTier {
    /// All tiers from cheapest to most expensive
    pub const ALL: [MembershipTier; 4] = [
        MembershipTier::Free,
        MembershipTier::Starter,
        MembershipTier::Professional,
        MembershipTier::Business,
    ];

    /// Stable lower-case name used in storage and over the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipTier::Free => "free",
            MembershipTier::Starter => "starter",
            MembershipTier::Professional => "professional",
            MembershipTier::Business => "business",
        }
    }

    /// Returns true for tiers that require a subscription
    pub fn is_paid(&self) -> bool {
        !matches!(self, MembershipTier::Free)
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipTier {
    type Err = MembershipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(MembershipTier::Free),
            "starter" => Ok(MembershipTier::Starter),
            "professional" => Ok(MembershipTier::Professional),
            "business" => Ok(MembershipTier::Business),
            other => Err(MembershipError::UnknownTier(other.to_string())),
        }
    }
}

/// Monthly invoice allowance
///
/// Serialized as an integer where `-1` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Quota {
    Limited(u32),
    Unlimited,
}

impl Quota {
    /// Returns true if one more invoice fits after `used` so far
    pub fn allows(&self, used: u64) -> bool {
        match self {
            Quota::Unlimited => true,
            Quota::Limited(limit) => used < u64::from(*limit),
        }
    }

    /// The limit, or `None` when unlimited
    pub fn limit(&self) -> Option<u32> {
        match self {
            Quota::Limited(limit) => Some(*limit),
            Quota::Unlimited => None,
        }
    }

    /// Raw representation with `-1` for unlimited
    pub fn as_raw(&self) -> i64 {
        match self {
            Quota::Limited(limit) => i64::from(*limit),
            Quota::Unlimited => -1,
        }
    }
}

impl TryFrom<i64> for Quota {
    type Error = MembershipError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            -1 => Ok(Quota::Unlimited),
            n => u32::try_from(n)
                .map(Quota::Limited)
                .map_err(|_| MembershipError::InvalidQuota(raw)),
        }
    }
}

impl From<Quota> for i64 {
    fn from(quota: Quota) -> i64 {
        quota.as_raw()
    }
}

/// Capabilities that are switched on per tier, not usage-counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    PdfExport,
    MultiCurrency,
    CurrencyConversion,
    AdvancedTemplates,
    CustomBranding,
    ApiAccess,
    PrioritySupport,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::PdfExport => "pdf_export",
            Feature::MultiCurrency => "multi_currency",
            Feature::CurrencyConversion => "currency_conversion",
            Feature::AdvancedTemplates => "advanced_templates",
            Feature::CustomBranding => "custom_branding",
            Feature::ApiAccess => "api_access",
            Feature::PrioritySupport => "priority_support",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of a single tier
#[derive(Debug, Clone, Serialize)]
pub struct TierDefinition {
    pub tier: MembershipTier,
    pub display_name: String,
    pub monthly_price: Decimal,
    pub quota: Quota,
    pub features: BTreeSet<Feature>,
    pub tagline: String,
    /// Marked as the recommended plan in pricing displays
    pub highlighted: bool,
}

impl TierDefinition {
    /// Returns true if the tier enables `feature`
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

/// All tier definitions keyed by tier
#[derive(Debug, Clone)]
pub struct TierCatalog {
    tiers: BTreeMap<MembershipTier, TierDefinition>,
}

impl TierCatalog {
    /// Builds a catalog from definitions
    ///
    /// # Errors
    ///
    /// Every tier must be defined exactly once.
    pub fn new(definitions: impl IntoIterator<Item = TierDefinition>) -> Result<Self, MembershipError> {
        let mut tiers = BTreeMap::new();
        for definition in definitions {
            let tier = definition.tier;
            if tiers.insert(tier, definition).is_some() {
                return Err(MembershipError::Configuration(format!(
                    "Tier {} defined more than once",
                    tier
                )));
            }
        }
        if let Some(missing) = MembershipTier::ALL.iter().find(|t| !tiers.contains_key(*t)) {
            return Err(MembershipError::Configuration(format!(
                "Tier {} has no definition",
                missing
            )));
        }
        Ok(Self { tiers })
    }

    /// The plans offered by the application
    pub fn standard() -> Self {
        use Feature::*;

        let definitions = [
            TierDefinition {
                tier: MembershipTier::Free,
                display_name: "Free".to_string(),
                monthly_price: dec!(0.00),
                quota: Quota::Limited(5),
                features: BTreeSet::from([PdfExport]),
                tagline: "Try it out with a handful of invoices".to_string(),
                highlighted: false,
            },
            TierDefinition {
                tier: MembershipTier::Starter,
                display_name: "Starter".to_string(),
                monthly_price: dec!(9.99),
                quota: Quota::Limited(50),
                features: BTreeSet::from([PdfExport, MultiCurrency]),
                tagline: "For freelancers billing a few clients".to_string(),
                highlighted: false,
            },
            TierDefinition {
                tier: MembershipTier::Professional,
                display_name: "Professional".to_string(),
                monthly_price: dec!(29.99),
                quota: Quota::Limited(500),
                features: BTreeSet::from([
                    PdfExport,
                    MultiCurrency,
                    CurrencyConversion,
                    AdvancedTemplates,
                ]),
                tagline: "For growing practices".to_string(),
                highlighted: true,
            },
            TierDefinition {
                tier: MembershipTier::Business,
                display_name: "Business".to_string(),
                monthly_price: dec!(79.99),
                quota: Quota::Unlimited,
                features: BTreeSet::from([
                    PdfExport,
                    MultiCurrency,
                    CurrencyConversion,
                    AdvancedTemplates,
                    CustomBranding,
                    ApiAccess,
                    PrioritySupport,
                ]),
                tagline: "Unlimited invoicing for teams".to_string(),
                highlighted: false,
            },
        ];

        Self {
            tiers: definitions.into_iter().map(|d| (d.tier, d)).collect(),
        }
    }

    /// Definition of a tier
    pub fn get(&self, tier: MembershipTier) -> &TierDefinition {
        // Completeness is checked at construction
        &self.tiers[&tier]
    }

    /// Features enabled for a tier
    pub fn features(&self, tier: MembershipTier) -> &BTreeSet<Feature> {
        &self.get(tier).features
    }

    /// Returns true if `tier` enables `feature`
    pub fn has_feature(&self, tier: MembershipTier, feature: Feature) -> bool {
        self.get(tier).has_feature(feature)
    }

    /// Iterates tiers from cheapest to most expensive
    pub fn iter(&self) -> impl Iterator<Item = &TierDefinition> {
        self.tiers.values()
    }
}

impl Default for TierCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
