//! PostgreSQL Invoice Adapter
//!
//! Implements `InvoicePort` on top of [`InvoiceRepository`]. Totals are
//! written alongside each invoice for reporting queries but are recomputed
//! from the items whenever an invoice is read back.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    BillingPeriod, CurrencyCode, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId,
    LineItemId, PortError, TaxRate, UserId,
};
use domain_invoicing::{
    ClientDetails, InsertOutcome, Invoice, InvoicePort, InvoiceRecord, InvoiceStatus, LineItem,
    QuotaGuard,
};

use crate::error::DatabaseError;
use crate::repositories::invoices::{
    InvoiceItemRow, InvoiceRepository, InvoiceRow, InvoiceWithItems, QuotaCheck,
};

const ADAPTER_ID: &str = "postgres-invoice-store";

/// PostgreSQL-backed implementation of `InvoicePort`
#[derive(Debug, Clone)]
pub struct PgInvoiceStore {
    repository: InvoiceRepository,
    pool: PgPool,
}

impl PgInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: InvoiceRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &InvoiceRepository {
        &self.repository
    }
}

impl DomainPort for PgInvoiceStore {}

#[async_trait]
impl HealthCheckable for PgInvoiceStore {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, ADAPTER_ID).await
    }
}

#[async_trait]
impl InvoicePort for PgInvoiceStore {
    #[instrument(skip(self, invoice, guard), fields(user_id = %invoice.owner(), invoice_id = %invoice.id()))]
    async fn insert_within_quota(&self, invoice: Invoice, guard: QuotaGuard) -> Result<InsertOutcome, PortError> {
        debug!("Inserting invoice under quota lock");
        let data = invoice_to_rows(&invoice);
        let period = guard.period;

        match self
            .repository
            .insert_within_quota(&data, period.start(), move |used| guard.allows(used))
            .await?
        {
            QuotaCheck::Inserted => Ok(InsertOutcome::Created(invoice)),
            QuotaCheck::Rejected { used } => Ok(InsertOutcome::QuotaReached { used }),
        }
    }

    #[instrument(skip(self), fields(user_id = %owner, invoice_id = %id))]
    async fn get(&self, owner: UserId, id: InvoiceId) -> Result<Invoice, PortError> {
        debug!("Fetching invoice");
        let data = self.repository.get(*owner.as_uuid(), *id.as_uuid()).await?;
        Ok(rows_to_invoice(data)?)
    }

    #[instrument(skip(self), fields(user_id = %owner))]
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Invoice>, PortError> {
        debug!("Listing invoices");
        let rows = self.repository.list_by_owner(*owner.as_uuid()).await?;
        rows.into_iter()
            .map(|data| rows_to_invoice(data).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, invoice), fields(user_id = %invoice.owner(), invoice_id = %invoice.id()))]
    async fn update(&self, invoice: Invoice) -> Result<Invoice, PortError> {
        debug!("Updating invoice");
        self.repository.update(&invoice_to_rows(&invoice)).await?;
        Ok(invoice)
    }

    #[instrument(skip(self), fields(user_id = %owner, invoice_id = %id))]
    async fn delete(&self, owner: UserId, id: InvoiceId) -> Result<(), PortError> {
        debug!("Deleting invoice");
        Ok(self.repository.delete(*owner.as_uuid(), *id.as_uuid()).await?)
    }

    async fn count_by_owner(&self, owner: UserId) -> Result<u64, PortError> {
        Ok(self.repository.count_by_owner(*owner.as_uuid()).await?)
    }

    async fn count_in_period(&self, owner: UserId, period: BillingPeriod) -> Result<u64, PortError> {
        Ok(self
            .repository
            .count_since(*owner.as_uuid(), period.start())
            .await?)
    }

    #[instrument(skip(self), fields(user_id = %owner))]
    async fn delete_all_for_owner(&self, owner: UserId) -> Result<u64, PortError> {
        let removed = self.repository.delete_all_for_owner(*owner.as_uuid()).await?;
        debug!(removed, "Deleted all invoices for owner");
        Ok(removed)
    }
}

pub(crate) fn invoice_to_rows(invoice: &Invoice) -> InvoiceWithItems {
    let id = *invoice.id().as_uuid();
    let client = invoice.client();
    let totals = invoice.totals();

    let items = invoice
        .items()
        .iter()
        .enumerate()
        .map(|(position, item)| InvoiceItemRow {
            id: *item.id().as_uuid(),
            invoice_id: id,
            position: i32::try_from(position).unwrap_or(i32::MAX),
            description: item.description().to_string(),
            quantity: item.quantity(),
            rate: item.rate(),
        })
        .collect();

    InvoiceWithItems {
        invoice: InvoiceRow {
            id,
            user_id: *invoice.owner().as_uuid(),
            invoice_number: invoice.number().to_string(),
            client_name: client.name.clone(),
            client_email: client.email.clone(),
            client_address: client.address.clone(),
            issue_date: invoice.issue_date(),
            due_date: invoice.due_date(),
            currency: invoice.currency().to_string(),
            tax_rate: invoice.tax_rate().as_percentage(),
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            total: totals.total,
            notes: invoice.notes().map(str::to_string),
            status: invoice.status().as_str().to_string(),
            created_at: invoice.created_at(),
            updated_at: invoice.updated_at(),
        },
        items,
    }
}

pub(crate) fn rows_to_invoice(data: InvoiceWithItems) -> Result<Invoice, DatabaseError> {
    let InvoiceWithItems { invoice: row, items } = data;

    let currency: CurrencyCode = row
        .currency
        .parse()
        .map_err(|e| DatabaseError::corrupt("invoices", e))?;
    let tax_rate = TaxRate::from_percentage(row.tax_rate)
        .map_err(|e| DatabaseError::corrupt("invoices", e))?;
    let status: InvoiceStatus = row
        .status
        .parse()
        .map_err(|e| DatabaseError::corrupt("invoices", e))?;

    let items = items
        .into_iter()
        .map(|item| {
            LineItem::restore(
                LineItemId::from_uuid(item.id),
                &item.description,
                item.quantity,
                item.rate,
            )
            .map_err(|e| DatabaseError::corrupt("invoice_items", e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Invoice::restore(InvoiceRecord {
        id: InvoiceId::from_uuid(row.id),
        owner: UserId::from_uuid(row.user_id),
        number: row.invoice_number,
        client: ClientDetails {
            name: row.client_name,
            email: row.client_email,
            address: row.client_address,
        },
        issue_date: row.issue_date,
        due_date: row.due_date,
        currency,
        tax_rate,
        notes: row.notes,
        status,
        items,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
    .map_err(|e| DatabaseError::corrupt("invoices", e))
}
