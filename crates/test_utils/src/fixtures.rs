//! Pre-built Test Fixtures
//!
//! Consistent, predictable data for unit and integration tests. All instants
//! fall in March 2026 so month-boundary tests can step into April.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};

use core_kernel::CurrencyTable;
use domain_invoicing::{InvoiceDraft, InvoiceDraftInput, LineItemInput};
use domain_membership::{CredentialHasher, MembershipError, NewUser};

/// Fixture for temporal test data
pub struct TimeFixtures;

impl TimeFixtures {
    /// Reference "now" (Mar 14, 2026 09:00 UTC)
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
    }

    /// Later in the same billing month
    pub fn later_this_month() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 28, 17, 30, 0).unwrap()
    }

    /// Early in the following billing month
    pub fn next_month() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 8, 0, 0).unwrap()
    }

    pub fn issue_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    /// Thirty days after [`TimeFixtures::issue_date`]
    pub fn due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 13).unwrap()
    }
}

/// Fixture for invoice inputs
pub struct InvoiceFixtures;

impl InvoiceFixtures {
    /// Two services: 2 × 50.00 and 1 × 30.00, subtotal 130.00
    pub fn design_and_hosting() -> Vec<LineItemInput> {
        vec![
            LineItemInput::new("Design", "2", "50.00"),
            LineItemInput::new("Hosting", "1", "30.00"),
        ]
    }

    /// A complete submission at 10% tax in the account's default currency
    pub fn draft_input(number: &str) -> InvoiceDraftInput {
        InvoiceDraftInput {
            invoice_number: number.to_string(),
            client_name: "Acme Corporation".to_string(),
            client_email: Some("billing@acme.test".to_string()),
            client_address: Some("1 Main Street, Springfield".to_string()),
            issue_date: TimeFixtures::issue_date().to_string(),
            due_date: TimeFixtures::due_date().to_string(),
            currency: None,
            tax_rate: Some("10".to_string()),
            notes: None,
            items: Self::design_and_hosting(),
        }
    }

    /// [`InvoiceFixtures::draft_input`] parsed against the standard table in USD
    pub fn draft(number: &str) -> InvoiceDraft {
        let currencies = CurrencyTable::standard();
        Self::draft_input(number)
            .parse(&currencies, currencies.default_code())
            .expect("fixture draft is valid")
    }

    /// The same submission as an API request body
    pub fn draft_json(number: &str) -> Value {
        json!({
            "invoice_number": number,
            "client_name": "Acme Corporation",
            "client_email": "billing@acme.test",
            "issue_date": TimeFixtures::issue_date().to_string(),
            "due_date": TimeFixtures::due_date().to_string(),
            "tax_rate": 10,
            "items": [
                { "description": "Design", "quantity": 2, "rate": "50.00" },
                { "description": "Hosting", "quantity": 1, "rate": 30 }
            ]
        })
    }
}

/// Fixture for account data
pub struct UserFixtures;

impl UserFixtures {
    pub fn email(n: usize) -> String {
        format!("owner{}@example.com", n)
    }

    pub fn password() -> &'static str {
        "correct-horse-battery"
    }

    pub fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: Self::password().to_string(),
            company_name: Some("Northwind Studio".to_string()),
            default_currency: None,
        }
    }

    pub fn register_json(email: &str) -> Value {
        json!({
            "email": email,
            "password": Self::password(),
            "company_name": "Northwind Studio"
        })
    }
}

/// Reversible "hash" so service tests skip argon2's cost
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, MembershipError> {
        Ok(format!("plain:{}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash.strip_prefix("plain:") == Some(password)
    }
}
