//! Display-ready invoice view
//!
//! Carries the raw numbers for layout alongside strings produced by the
//! money formatter bound to the invoice currency. Conversion into another
//! currency is display-only and never touches stored totals.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use core_kernel::{BoundFormatter, CurrencyCode, InvoiceId, MoneyFormatter, RateQuote, RateSource};

use crate::draft::ClientDetails;
use crate::invoice::{Invoice, InvoiceStatus};
use crate::line_item::LineItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItemView {
    pub description: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub formatted_rate: String,
    pub formatted_amount: String,
}

impl LineItemView {
    fn new(item: &LineItem, formatter: &BoundFormatter) -> Self {
        Self {
            description: item.description().to_string(),
            quantity: item.quantity(),
            rate: item.rate(),
            amount: item.amount(),
            formatted_rate: formatter.format_amount(item.rate()),
            formatted_amount: formatter.format_amount(item.amount()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedTotals {
    pub subtotal: String,
    pub tax_amount: String,
    pub total: String,
}

/// The invoice total expressed in another currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedTotal {
    pub currency: CurrencyCode,
    pub rate: Decimal,
    pub source: RateSource,
    /// Absent when no rate is known for the pair
    pub total: Option<Decimal>,
    pub formatted_total: Option<String>,
}

impl ConvertedTotal {
    /// Converts `total` with a quoted rate
    ///
    /// An unavailable rate yields no amount rather than a 1:1 figure, as
    /// does a product too large to represent.
    pub fn new(total: Decimal, quote: RateQuote, formatter: &MoneyFormatter) -> Self {
        let converted = quote
            .is_available()
            .then(|| total.checked_mul(quote.rate))
            .flatten();
        Self {
            currency: quote.to,
            rate: quote.rate,
            source: quote.source,
            total: converted,
            formatted_total: converted.map(|amount| formatter.format(amount, quote.to.as_str())),
        }
    }
}

/// Everything a template or PDF renderer needs for one invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceView {
    pub id: InvoiceId,
    pub number: String,
    pub status: InvoiceStatus,
    pub client: ClientDetails,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub overdue: bool,
    pub currency: CurrencyCode,
    pub currency_symbol: String,
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub formatted: FormattedTotals,
    pub items: Vec<LineItemView>,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConvertedTotal>,
}

impl InvoiceView {
    /// Builds the view as of `today`
    pub fn build(invoice: &Invoice, formatter: &MoneyFormatter, today: NaiveDate) -> Self {
        let bound = formatter.bind(invoice.currency());
        let totals = invoice.totals();

        Self {
            id: invoice.id(),
            number: invoice.number().to_string(),
            status: invoice.status(),
            client: invoice.client().clone(),
            issue_date: invoice.issue_date(),
            due_date: invoice.due_date(),
            overdue: invoice.is_overdue(today),
            currency: invoice.currency(),
            currency_symbol: bound.currency().symbol.clone(),
            tax_rate: invoice.tax_rate().as_percentage(),
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            total: totals.total,
            formatted: FormattedTotals {
                subtotal: bound.format_amount(totals.subtotal),
                tax_amount: bound.format_amount(totals.tax_amount),
                total: bound.format_amount(totals.total),
            },
            items: invoice
                .items()
                .iter()
                .map(|item| LineItemView::new(item, &bound))
                .collect(),
            notes: invoice.notes().map(str::to_string),
            conversion: None,
        }
    }

    /// Attaches a converted total
    pub fn with_conversion(mut self, quote: RateQuote, formatter: &MoneyFormatter) -> Self {
        self.conversion = Some(ConvertedTotal::new(self.total, quote, formatter));
        self
    }
}

/// A view prepared for a downloadable document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceExport {
    /// Company name of the issuing account, or its email when unset
    pub issuer: String,
    pub view: InvoiceView,
}

impl InvoiceExport {
    pub fn new(issuer: impl Into<String>, view: InvoiceView) -> Self {
        Self {
            issuer: issuer.into(),
            view,
        }
    }

    /// Download name such as `invoice_INV-0001.pdf`
    ///
    /// Invoice numbers are free text; anything other than ASCII letters,
    /// digits, `-` and `_` becomes `_`.
    pub fn file_name(&self, extension: &str) -> String {
        let number: String = self
            .view
            .number
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("invoice_{}.{}", number, extension)
    }
}
