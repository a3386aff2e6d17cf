//! Test Data Builders
//!
//! Builder patterns for users and stored invoices with sensible defaults.
//!
//! # Example
//!
//! ```rust,ignore
//! use test_utils::builders::InvoiceBuilder;
//!
//! let invoice = InvoiceBuilder::new(owner)
//!     .with_currency("JPY")
//!     .with_item("Consulting", dec!(8), dec!(15000))
//!     .build();
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{CurrencyCode, InvoiceId, TaxRate, UserId, DEFAULT_CURRENCY};
use domain_invoicing::{ClientDetails, Invoice, InvoiceRecord, InvoiceStatus, LineItem};
use domain_membership::{MembershipTier, User};

use crate::fixtures::TimeFixtures;

/// Builder for accounts
#[derive(Debug, Clone)]
pub struct UserBuilder {
    email: String,
    company_name: Option<String>,
    currency: CurrencyCode,
    tier: MembershipTier,
    expires_at: Option<Option<DateTime<Utc>>>,
    active: bool,
    now: DateTime<Utc>,
}

impl Default for UserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UserBuilder {
    pub fn new() -> Self {
        Self {
            email: "owner@example.com".to_string(),
            company_name: Some("Northwind Studio".to_string()),
            currency: DEFAULT_CURRENCY,
            tier: MembershipTier::Free,
            expires_at: None,
            active: true,
            now: TimeFixtures::now(),
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    pub fn with_company(mut self, company_name: Option<&str>) -> Self {
        self.company_name = company_name.map(str::to_string);
        self
    }

    /// Panics on an unknown code; intended for literals
    pub fn with_currency(mut self, code: &str) -> Self {
        self.currency = code.parse().expect("test currency code");
        self
    }

    pub fn with_tier(mut self, tier: MembershipTier) -> Self {
        self.tier = tier;
        self
    }

    /// Overrides the expiry that `change_tier` would set
    pub fn expiring_at(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn created_at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn build(self) -> User {
        let mut user = User::new(
            &self.email,
            format!("plain:{}", crate::fixtures::UserFixtures::password()),
            self.company_name.as_deref(),
            self.currency,
            self.now,
        )
        .expect("test user email is valid");

        if self.tier != MembershipTier::Free {
            user.change_tier(self.tier, self.now);
        }
        if let Some(expires_at) = self.expires_at {
            user.subscription_expires_at = expires_at;
        }
        if !self.active {
            user.deactivate(self.now);
        }
        user
    }
}

/// Builder for stored invoices
///
/// Builds through [`Invoice::restore`], so any status and timestamps can be
/// set directly.
#[derive(Debug, Clone)]
pub struct InvoiceBuilder {
    owner: UserId,
    number: String,
    client: ClientDetails,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    currency: CurrencyCode,
    tax_rate: Decimal,
    notes: Option<String>,
    status: InvoiceStatus,
    items: Vec<(String, Decimal, Decimal)>,
    created_at: DateTime<Utc>,
}

impl InvoiceBuilder {
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            number: "INV-0001".to_string(),
            client: ClientDetails {
                name: "Acme Corporation".to_string(),
                email: Some("billing@acme.test".to_string()),
                address: None,
            },
            issue_date: TimeFixtures::issue_date(),
            due_date: TimeFixtures::due_date(),
            currency: DEFAULT_CURRENCY,
            tax_rate: Decimal::ZERO,
            notes: None,
            status: InvoiceStatus::Draft,
            items: Vec::new(),
            created_at: TimeFixtures::now(),
        }
    }

    pub fn with_number(mut self, number: &str) -> Self {
        self.number = number.to_string();
        self
    }

    pub fn with_client(mut self, client: ClientDetails) -> Self {
        self.client = client;
        self
    }

    /// Panics on an unknown code; intended for literals
    pub fn with_currency(mut self, code: &str) -> Self {
        self.currency = code.parse().expect("test currency code");
        self
    }

    pub fn with_tax_rate(mut self, percentage: Decimal) -> Self {
        self.tax_rate = percentage;
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_item(mut self, description: &str, quantity: Decimal, rate: Decimal) -> Self {
        self.items.push((description.to_string(), quantity, rate));
        self
    }

    /// Sets the due date relative to the issue date
    pub fn due_in_days(mut self, days: i64) -> Self {
        self.due_date = self.issue_date + Duration::days(days);
        self
    }

    pub fn with_dates(mut self, issue_date: NaiveDate, due_date: NaiveDate) -> Self {
        self.issue_date = issue_date;
        self.due_date = due_date;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn build(self) -> Invoice {
        let mut items: Vec<LineItem> = self
            .items
            .iter()
            .map(|(description, quantity, rate)| {
                LineItem::new(description, *quantity, *rate).expect("test line item is valid")
            })
            .collect();
        if items.is_empty() {
            items.push(LineItem::new("Consulting", dec!(1), dec!(100.00)).expect("default item"));
        }

        Invoice::restore(InvoiceRecord {
            id: InvoiceId::new_v7(),
            owner: self.owner,
            number: self.number,
            client: self.client,
            issue_date: self.issue_date,
            due_date: self.due_date,
            currency: self.currency,
            tax_rate: TaxRate::from_percentage(self.tax_rate).expect("test tax rate in range"),
            notes: self.notes,
            status: self.status,
            items,
            created_at: self.created_at,
            updated_at: self.created_at,
        })
        .expect("test invoice totals fit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_builder_paid_tier_gets_expiry() {
        let user = UserBuilder::new()
            .with_tier(MembershipTier::Professional)
            .build();

        assert_eq!(user.tier, MembershipTier::Professional);
        assert!(user.subscription_expires_at.is_some());
    }

    #[test]
    fn test_user_builder_lapsed_subscription() {
        let now = TimeFixtures::now();
        let user = UserBuilder::new()
            .with_tier(MembershipTier::Starter)
            .expiring_at(Some(now - Duration::days(1)))
            .build();

        assert_eq!(user.effective_tier(now), MembershipTier::Free);
    }

    #[test]
    fn test_invoice_builder_computes_totals() {
        let invoice = InvoiceBuilder::new(UserId::new_v7())
            .with_item("Design", dec!(2), dec!(50.00))
            .with_item("Hosting", dec!(1), dec!(30.00))
            .with_tax_rate(dec!(10))
            .build();

        assert_eq!(invoice.totals().total, dec!(143.00));
        assert_eq!(invoice.status(), InvoiceStatus::Draft);
    }
}
