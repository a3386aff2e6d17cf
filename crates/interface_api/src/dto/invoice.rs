//! Invoice DTOs
//!
//! Numeric inputs (quantity, rate, tax rate) are accepted either as JSON
//! numbers or as strings and handed to the domain as text, so that a form
//! post and a JSON client go through the same parsing and error messages.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use core_kernel::{CurrencyCode, InvoiceId, MoneyFormatter};
use domain_invoicing::{Invoice, InvoiceDraftInput, InvoiceStatus, LineItemInput};

/// Text form of a loosely typed numeric field; `null` becomes blank
pub fn numeric_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineItemRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default)]
    pub rate: Value,
}

impl From<&LineItemRequest> for LineItemInput {
    fn from(row: &LineItemRequest) -> Self {
        LineItemInput::new(
            row.description.clone(),
            numeric_text(&row.quantity),
            numeric_text(&row.rate),
        )
    }
}

pub fn line_item_inputs(rows: &[LineItemRequest]) -> Vec<LineItemInput> {
    rows.iter().map(LineItemInput::from).collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateInvoiceRequest {
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    #[serde(default)]
    pub issue_date: String,
    #[serde(default)]
    pub due_date: String,
    pub currency: Option<String>,
    #[serde(default)]
    pub tax_rate: Value,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
}

impl From<CreateInvoiceRequest> for InvoiceDraftInput {
    fn from(request: CreateInvoiceRequest) -> Self {
        let tax_rate = numeric_text(&request.tax_rate);
        InvoiceDraftInput {
            invoice_number: request.invoice_number,
            client_name: request.client_name,
            client_email: request.client_email,
            client_address: request.client_address,
            issue_date: request.issue_date,
            due_date: request.due_date,
            currency: request.currency,
            tax_rate: Some(tax_rate).filter(|t| !t.trim().is_empty()),
            notes: request.notes,
            items: line_item_inputs(&request.items),
        }
    }
}

/// Replaces all items; the tax rate is kept when omitted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItemsRequest {
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
    #[serde(default)]
    pub tax_rate: Option<Value>,
}

impl UpdateItemsRequest {
    pub fn tax_rate_text(&self) -> Option<String> {
        self.tax_rate.as_ref().map(numeric_text)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxRateRequest {
    pub tax_rate: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Only unpaid invoices past their due date
    #[serde(default)]
    pub overdue: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQuery {
    pub convert_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NextNumberResponse {
    pub invoice_number: String,
}

/// One row of the invoice list
#[derive(Debug, Serialize)]
pub struct InvoiceSummary {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub client_name: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: CurrencyCode,
    pub total: Decimal,
    pub formatted_total: String,
    pub status: InvoiceStatus,
    pub overdue: bool,
    pub created_at: DateTime<Utc>,
}

impl InvoiceSummary {
    pub fn build(invoice: &Invoice, formatter: &MoneyFormatter, today: NaiveDate) -> Self {
        let total = invoice.totals().total;
        Self {
            id: invoice.id(),
            invoice_number: invoice.number().to_string(),
            client_name: invoice.client().name.clone(),
            issue_date: invoice.issue_date(),
            due_date: invoice.due_date(),
            currency: invoice.currency(),
            total,
            formatted_total: formatter.bind(invoice.currency()).format_amount(total),
            status: invoice.status(),
            overdue: invoice.is_overdue(today),
            created_at: invoice.created_at(),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::str::FromStr;

    proptest! {
        #[test]
        fn json_numbers_read_like_their_string_form(cents in 0i64..10_000_000_000_000) {
            let expected = Decimal::new(cents, 2);
            let as_number = json!(cents as f64 / 100.0);
            let as_string = json!(expected.to_string());

            let from_number = Decimal::from_str(&numeric_text(&as_number)).unwrap();
            let from_string = Decimal::from_str(&numeric_text(&as_string)).unwrap();
            prop_assert_eq!(from_number, expected);
            prop_assert_eq!(from_string, expected);
        }
    }
}
