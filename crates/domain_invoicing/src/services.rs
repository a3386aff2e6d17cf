//! Invoicing domain services
//!
//! [`InvoicingService`] is the entry point request handlers use. It resolves
//! the caller's effective tier, validates input, and hands fully computed
//! invoices to the storage port. Clock readings are passed in so behaviour
//! around month and subscription boundaries is testable.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use core_kernel::{
    BillingPeriod, CurrencyTable, ExchangeRateTable, InvoiceId, MoneyFormatter, PortError, UserId,
};
use domain_membership::{
    Feature, MembershipService, MembershipTier, TierCatalog, TierPolicy, Usage, User,
};

use crate::draft::{parse_tax_rate, InvoiceDraftInput};
use crate::error::{InvoiceError, ValidationError};
use crate::invoice::{Invoice, InvoiceStatus};
use crate::line_item::{parse_line_items, LineItemInput};
use crate::numbering::next_invoice_number;
use crate::ports::{InsertOutcome, InvoicePort, QuotaGuard};
use crate::presentation::{InvoiceExport, InvoiceView};

/// Read-only reference tables shared by every request
#[derive(Debug, Clone)]
pub struct InvoicingContext {
    pub currencies: Arc<CurrencyTable>,
    pub rates: Arc<ExchangeRateTable>,
    pub tiers: Arc<TierCatalog>,
}

impl InvoicingContext {
    pub fn new(
        currencies: Arc<CurrencyTable>,
        rates: Arc<ExchangeRateTable>,
        tiers: Arc<TierCatalog>,
    ) -> Self {
        Self {
            currencies,
            rates,
            tiers,
        }
    }

    /// Standard currencies, rates and tiers
    pub fn standard() -> Result<Self, InvoiceError> {
        let currencies = Arc::new(CurrencyTable::standard());
        let rates = Arc::new(ExchangeRateTable::standard(currencies.clone())?);
        Ok(Self::new(currencies, rates, Arc::new(TierCatalog::standard())))
    }
}

/// Invoice lifecycle operations for authenticated users
#[derive(Clone)]
pub struct InvoicingService {
    invoices: Arc<dyn InvoicePort>,
    membership: MembershipService,
    context: InvoicingContext,
    policy: TierPolicy,
    formatter: MoneyFormatter,
}

impl InvoicingService {
    pub fn new(
        invoices: Arc<dyn InvoicePort>,
        membership: MembershipService,
        context: InvoicingContext,
    ) -> Self {
        let policy = TierPolicy::new(context.tiers.clone());
        let formatter = MoneyFormatter::new(context.currencies.clone());
        Self {
            invoices,
            membership,
            context,
            policy,
            formatter,
        }
    }

    pub fn context(&self) -> &InvoicingContext {
        &self.context
    }

    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    pub fn formatter(&self) -> &MoneyFormatter {
        &self.formatter
    }

    /// Creates an invoice if the owner's plan allows another one this month
    ///
    /// Validation, totals and the quota check all complete before anything
    /// is written; a rejected request leaves no trace in storage.
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed input, naming the row for line items
    /// - `FeatureUnavailable` for a non-default currency without `multi_currency`
    /// - `QuotaExceeded` when the monthly allowance is used up
    pub async fn create_invoice(
        &self,
        owner: UserId,
        input: &InvoiceDraftInput,
        now: DateTime<Utc>,
    ) -> Result<Invoice, InvoiceError> {
        let user = self.active_user(owner).await?;
        let tier = user.effective_tier(now);

        let draft = input.parse(&self.context.currencies, user.default_currency)?;
        if draft.currency != user.default_currency {
            self.require_feature(tier, Feature::MultiCurrency)?;
        }

        let invoice = Invoice::create(owner, draft, now)?;
        let guard = QuotaGuard {
            period: BillingPeriod::month_to_date(now),
            quota: self.policy.quota(tier),
        };

        match self.invoices.insert_within_quota(invoice, guard).await? {
            InsertOutcome::Created(invoice) => {
                info!(
                    user_id = %owner,
                    invoice_id = %invoice.id(),
                    number = %invoice.number(),
                    total = %invoice.totals().total,
                    currency = %invoice.currency(),
                    "Invoice created"
                );
                Ok(invoice)
            }
            InsertOutcome::QuotaReached { used } => {
                warn!(user_id = %owner, tier = %tier, used, "Invoice quota reached");
                Err(InvoiceError::QuotaExceeded {
                    tier,
                    used,
                    limit: guard.quota,
                })
            }
        }
    }

    /// Suggested number for the owner's next invoice
    pub async fn next_invoice_number(&self, owner: UserId) -> Result<String, InvoiceError> {
        let count = self.invoices.count_by_owner(owner).await?;
        Ok(next_invoice_number(count))
    }

    /// Loads one of the owner's invoices
    pub async fn get_invoice(&self, owner: UserId, id: InvoiceId) -> Result<Invoice, InvoiceError> {
        debug!(user_id = %owner, invoice_id = %id, "Loading invoice");
        self.invoices.get(owner, id).await.map_err(|e| not_found_or(e, id))
    }

    /// The owner's invoices, newest first
    pub async fn list_invoices(&self, owner: UserId) -> Result<Vec<Invoice>, InvoiceError> {
        Ok(self.invoices.list_by_owner(owner).await?)
    }

    /// The owner's unpaid invoices past their due date
    pub async fn overdue_invoices(&self, owner: UserId, today: NaiveDate) -> Result<Vec<Invoice>, InvoiceError> {
        Ok(self
            .invoices
            .list_by_owner(owner)
            .await?
            .into_iter()
            .filter(|i| i.is_overdue(today))
            .collect())
    }

    /// Replaces the line items and tax rate, recomputing totals
    ///
    /// Blank rows are skipped as on creation. The stored invoice is only
    /// replaced once the new totals are computed.
    pub async fn update_items(
        &self,
        owner: UserId,
        id: InvoiceId,
        rows: &[LineItemInput],
        tax_rate: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Invoice, InvoiceError> {
        let mut invoice = self.get_invoice(owner, id).await?;
        let items = parse_line_items(rows)?;
        let tax_rate = match tax_rate {
            Some(raw) => parse_tax_rate(Some(raw))?,
            None => invoice.tax_rate(),
        };

        invoice.replace_items(items, tax_rate, now)?;
        let invoice = self.invoices.update(invoice).await.map_err(|e| not_found_or(e, id))?;

        info!(
            user_id = %owner,
            invoice_id = %id,
            total = %invoice.totals().total,
            "Invoice items updated"
        );
        Ok(invoice)
    }

    /// Changes only the tax rate
    pub async fn update_tax_rate(
        &self,
        owner: UserId,
        id: InvoiceId,
        tax_rate: &str,
        now: DateTime<Utc>,
    ) -> Result<Invoice, InvoiceError> {
        let mut invoice = self.get_invoice(owner, id).await?;
        invoice.set_tax_rate(parse_tax_rate(Some(tax_rate))?, now)?;
        let invoice = self.invoices.update(invoice).await.map_err(|e| not_found_or(e, id))?;
        info!(user_id = %owner, invoice_id = %id, tax_rate = %invoice.tax_rate(), "Invoice tax rate updated");
        Ok(invoice)
    }

    /// Moves an invoice along draft → sent → paid
    pub async fn change_status(
        &self,
        owner: UserId,
        id: InvoiceId,
        status: InvoiceStatus,
        now: DateTime<Utc>,
    ) -> Result<Invoice, InvoiceError> {
        let mut invoice = self.get_invoice(owner, id).await?;
        let previous = invoice.status();
        invoice.transition_to(status, now)?;
        let invoice = self.invoices.update(invoice).await.map_err(|e| not_found_or(e, id))?;

        info!(
            user_id = %owner,
            invoice_id = %id,
            from = %previous,
            to = %status,
            "Invoice status changed"
        );
        Ok(invoice)
    }

    /// Deletes an invoice and its items
    pub async fn delete_invoice(&self, owner: UserId, id: InvoiceId) -> Result<(), InvoiceError> {
        self.invoices.delete(owner, id).await.map_err(|e| not_found_or(e, id))?;
        info!(user_id = %owner, invoice_id = %id, "Invoice deleted");
        Ok(())
    }

    /// Display view of an invoice, optionally with a converted total
    ///
    /// # Errors
    ///
    /// `FeatureUnavailable` when conversion is requested on a tier without
    /// `currency_conversion`; `Validation` for an unsupported target code.
    pub async fn view_invoice(
        &self,
        owner: UserId,
        id: InvoiceId,
        convert_to: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<InvoiceView, InvoiceError> {
        let invoice = self.get_invoice(owner, id).await?;
        let view = InvoiceView::build(&invoice, &self.formatter, now.date_naive());

        let target = match convert_to.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => code,
            None => return Ok(view),
        };

        let user = self.membership.get(owner).await?;
        self.require_feature(user.effective_tier(now), Feature::CurrencyConversion)?;
        let target = self
            .context
            .currencies
            .require(target)
            .map_err(|e| ValidationError::field("convert_to", e.to_string()))?;

        let quote = self.context.rates.quote(invoice.currency(), target);
        if !quote.is_available() {
            warn!(from = %quote.from, to = %quote.to, "No exchange rate for requested conversion");
        }
        Ok(view.with_conversion(quote, &self.formatter))
    }

    /// Printable view of an invoice together with its issuer
    ///
    /// # Errors
    ///
    /// `FeatureUnavailable` on a tier without `pdf_export`.
    pub async fn export_invoice(
        &self,
        owner: UserId,
        id: InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<InvoiceExport, InvoiceError> {
        let user = self.membership.get(owner).await?;
        self.require_feature(user.effective_tier(now), Feature::PdfExport)?;

        let invoice = self.get_invoice(owner, id).await?;
        let issuer = user.company_name.clone().unwrap_or_else(|| user.email.clone());
        debug!(user_id = %owner, invoice_id = %id, "Exporting invoice");
        Ok(InvoiceExport::new(
            issuer,
            InvoiceView::build(&invoice, &self.formatter, now.date_naive()),
        ))
    }

    /// This month's invoice usage against the owner's effective tier
    pub async fn usage(&self, owner: UserId, now: DateTime<Utc>) -> Result<Usage, InvoiceError> {
        let user = self.membership.get(owner).await?;
        let used = self
            .invoices
            .count_in_period(owner, BillingPeriod::month_to_date(now))
            .await?;
        Ok(self.policy.usage(user.effective_tier(now), used))
    }

    /// Switches the owner's plan (no payment step)
    pub async fn upgrade(
        &self,
        owner: UserId,
        tier: MembershipTier,
        now: DateTime<Utc>,
    ) -> Result<User, InvoiceError> {
        Ok(self.membership.change_tier(owner, tier, now).await?)
    }

    /// Removes an account together with all of its invoices
    pub async fn delete_account(&self, owner: UserId) -> Result<u64, InvoiceError> {
        self.membership.get(owner).await?;
        let removed = self.invoices.delete_all_for_owner(owner).await?;
        self.membership.delete(owner).await?;
        info!(user_id = %owner, invoices_removed = removed, "Account deleted");
        Ok(removed)
    }

    async fn active_user(&self, owner: UserId) -> Result<User, InvoiceError> {
        let user = self.membership.get(owner).await?;
        if !user.is_active {
            return Err(InvoiceError::AccountInactive);
        }
        Ok(user)
    }

    fn require_feature(&self, tier: MembershipTier, feature: Feature) -> Result<(), InvoiceError> {
        if self.policy.allows_feature(tier, feature) {
            Ok(())
        } else {
            debug!(tier = %tier, feature = %feature, "Feature not in plan");
            Err(InvoiceError::FeatureUnavailable { tier, feature })
        }
    }
}

fn not_found_or(err: PortError, id: InvoiceId) -> InvoiceError {
    match err {
        PortError::NotFound { .. } => InvoiceError::not_found(id),
        other => other.into(),
    }
}
