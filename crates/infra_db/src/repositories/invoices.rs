//! Invoice repository
//!
//! Invoices live in `invoices` with their computed totals; line items live in
//! `invoice_items`, ordered by `position`. Every query is scoped by
//! `user_id` so one account can never read or touch another's invoices.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;

/// A row of the `invoices` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub invoice_number: String,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of the `invoice_items` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct InvoiceItemRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub position: i32,
    pub description: String,
    pub quantity: Decimal,
    pub rate: Decimal,
}

/// An invoice row with its items in position order
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceWithItems {
    pub invoice: InvoiceRow,
    pub items: Vec<InvoiceItemRow>,
}

/// Outcome of a quota-checked insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaCheck {
    Inserted,
    Rejected { used: u64 },
}

/// Quota usage: no upper bound, so rows stamped after the caller's clock
/// reading still count
const COUNT_SINCE: &str = "SELECT COUNT(*) FROM invoices WHERE user_id = $1 AND created_at >= $2";

const INVOICE_COLUMNS: &str = "id, user_id, invoice_number, client_name, client_email, \
     client_address, issue_date, due_date, currency, tax_rate, subtotal, tax_amount, total, \
     notes, status, created_at, updated_at";

/// Repository for invoices and their line items
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts an invoice if `allows(used)` holds for the owner's count of
    /// invoices created at or after `from`
    ///
    /// The owner's `users` row is locked with `FOR UPDATE` before counting,
    /// which serializes concurrent inserts for the same account until this
    /// transaction commits or rolls back.
    ///
    /// # Errors
    ///
    /// `NotFound` if the owner does not exist.
    pub async fn insert_within_quota<F>(
        &self,
        data: &InvoiceWithItems,
        from: DateTime<Utc>,
        allows: F,
    ) -> Result<QuotaCheck, DatabaseError>
    where
        F: FnOnce(u64) -> bool + Send,
    {
        let owner = data.invoice.user_id;
        let mut tx = self.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(DatabaseError::not_found("User", owner));
        }

        let used = sqlx::query_scalar::<_, i64>(COUNT_SINCE)
            .bind(owner)
            .bind(from)
            .fetch_one(&mut *tx)
        .await?;
        let used = u64::try_from(used).unwrap_or(0);

        if !allows(used) {
            debug!(user_id = %owner, used, "Quota reached, rolling back");
            tx.rollback()
                .await
                .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
            return Ok(QuotaCheck::Rejected { used });
        }

        insert_invoice(&mut tx, &data.invoice).await?;
        insert_items(&mut tx, &data.items).await?;
        commit(tx).await?;

        Ok(QuotaCheck::Inserted)
    }

    /// Retrieves one of the owner's invoices with its items
    pub async fn get(&self, owner: Uuid, id: Uuid) -> Result<InvoiceWithItems, DatabaseError> {
        let invoice = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", id))?;

        let items = sqlx::query_as::<_, InvoiceItemRow>(
            "SELECT id, invoice_id, position, description, quantity, rate \
             FROM invoice_items WHERE invoice_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(InvoiceWithItems { invoice, items })
    }

    /// The owner's invoices with items, newest first
    pub async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<InvoiceWithItems>, DatabaseError> {
        let invoices = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        if invoices.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = invoices.iter().map(|i| i.id).collect();
        let items = sqlx::query_as::<_, InvoiceItemRow>(
            "SELECT id, invoice_id, position, description, quantity, rate \
             FROM invoice_items WHERE invoice_id = ANY($1) ORDER BY invoice_id, position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(attach_items(invoices, items))
    }

    /// Rewrites an invoice and replaces all of its items
    pub async fn update(&self, data: &InvoiceWithItems) -> Result<(), DatabaseError> {
        let row = &data.invoice;
        let mut tx = self.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET invoice_number = $3,
                client_name = $4,
                client_email = $5,
                client_address = $6,
                issue_date = $7,
                due_date = $8,
                currency = $9,
                tax_rate = $10,
                subtotal = $11,
                tax_amount = $12,
                total = $13,
                notes = $14,
                status = $15,
                updated_at = $16
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(row.id)
        .bind(row.user_id)
        .bind(&row.invoice_number)
        .bind(&row.client_name)
        .bind(&row.client_email)
        .bind(&row.client_address)
        .bind(row.issue_date)
        .bind(row.due_date)
        .bind(&row.currency)
        .bind(row.tax_rate)
        .bind(row.subtotal)
        .bind(row.tax_amount)
        .bind(row.total)
        .bind(&row.notes)
        .bind(&row.status)
        .bind(row.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", row.id));
        }

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1")
            .bind(row.id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, &data.items).await?;

        commit(tx).await
    }

    /// Deletes one of the owner's invoices; items cascade
    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", id));
        }
        Ok(())
    }

    pub async fn count_by_owner(&self, owner: Uuid) -> Result<u64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices WHERE user_id = $1")
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    pub async fn count_since(&self, owner: Uuid, from: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>(COUNT_SINCE)
            .bind(owner)
            .bind(from)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Deletes every invoice of the owner, returning how many went
    pub async fn delete_all_for_owner(&self, owner: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM invoices WHERE user_id = $1")
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }
}

async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), DatabaseError> {
    tx.commit()
        .await
        .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
}

async fn insert_invoice(tx: &mut Transaction<'static, Postgres>, row: &InvoiceRow) -> Result<(), DatabaseError> {
    sqlx::query(&format!(
        "INSERT INTO invoices ({INVOICE_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"
    ))
    .bind(row.id)
    .bind(row.user_id)
    .bind(&row.invoice_number)
    .bind(&row.client_name)
    .bind(&row.client_email)
    .bind(&row.client_address)
    .bind(row.issue_date)
    .bind(row.due_date)
    .bind(&row.currency)
    .bind(row.tax_rate)
    .bind(row.subtotal)
    .bind(row.tax_amount)
    .bind(row.total)
    .bind(&row.notes)
    .bind(&row.status)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_items(
    tx: &mut Transaction<'static, Postgres>,
    items: &[InvoiceItemRow],
) -> Result<(), DatabaseError> {
    for item in items {
        sqlx::query(
            "INSERT INTO invoice_items (id, invoice_id, position, description, quantity, rate) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(item.id)
        .bind(item.invoice_id)
        .bind(item.position)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.rate)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Groups item rows under their invoices, keeping invoice order
pub(crate) fn attach_items(invoices: Vec<InvoiceRow>, items: Vec<InvoiceItemRow>) -> Vec<InvoiceWithItems> {
    let mut by_invoice: HashMap<Uuid, Vec<InvoiceItemRow>> = HashMap::new();
    for item in items {
        by_invoice.entry(item.invoice_id).or_default().push(item);
    }

    invoices
        .into_iter()
        .map(|invoice| {
            let mut items = by_invoice.remove(&invoice.id).unwrap_or_default();
            items.sort_by_key(|i| i.position);
            InvoiceWithItems { invoice, items }
        })
        .collect()
}
