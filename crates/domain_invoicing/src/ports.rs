//! Invoicing Domain Ports
//!
//! `InvoicePort` is the storage interface for invoices and their line items.
//! Every read and delete is scoped to the owning user; an invoice belonging
//! to someone else is reported as not found.
//!
//! # Quota-checked inserts
//!
//! Counting this period's invoices and inserting a new one must happen as a
//! single serialized step per user, otherwise two concurrent requests can
//! both see `limit - 1` and both insert. Adapters therefore receive the
//! [`QuotaGuard`] and perform the count and the insert together:
//!
//! - the in-memory adapter holds its write lock across both
//! - the PostgreSQL adapter locks the owner's row with `SELECT ... FOR UPDATE`
//!   inside the inserting transaction
//!
//! The count has no upper time bound (see [`BillingPeriod::counts`]), so an
//! invoice committed by a request whose clock ran ahead is never missed.

use async_trait::async_trait;

use core_kernel::{BillingPeriod, DomainPort, HealthCheckable, InvoiceId, PortError, UserId};
use domain_membership::Quota;

use crate::invoice::Invoice;

/// Quota to enforce while inserting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaGuard {
    /// Window in which existing invoices count against the quota
    pub period: BillingPeriod,
    pub quota: Quota,
}

impl QuotaGuard {
    /// Returns true if one more invoice fits after `used`
    pub fn allows(&self, used: u64) -> bool {
        self.quota.allows(used)
    }
}

/// Result of a quota-checked insert
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Created(Invoice),
    /// Nothing was written; `used` is the count the decision was based on
    QuotaReached { used: u64 },
}

/// Port for invoice storage
#[async_trait]
pub trait InvoicePort: DomainPort + HealthCheckable {
    /// Inserts an invoice with its items if the owner's quota allows it
    async fn insert_within_quota(&self, invoice: Invoice, guard: QuotaGuard) -> Result<InsertOutcome, PortError>;

    /// Retrieves one of the owner's invoices
    async fn get(&self, owner: UserId, id: InvoiceId) -> Result<Invoice, PortError>;

    /// All of the owner's invoices, newest first
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Invoice>, PortError>;

    /// Replaces a stored invoice and its items
    async fn update(&self, invoice: Invoice) -> Result<Invoice, PortError>;

    /// Deletes one of the owner's invoices together with its items
    async fn delete(&self, owner: UserId, id: InvoiceId) -> Result<(), PortError>;

    /// Total number of invoices the owner has ever kept
    async fn count_by_owner(&self, owner: UserId) -> Result<u64, PortError>;

    /// Number of the owner's invoices created since `period` started
    async fn count_in_period(&self, owner: UserId, period: BillingPeriod) -> Result<u64, PortError>;

    /// Deletes every invoice of the owner, returning how many were removed
    async fn delete_all_for_owner(&self, owner: UserId) -> Result<u64, PortError>;
}

/// In-memory implementation of InvoicePort
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    #[derive(Debug, Default, Clone)]
    pub struct InMemoryInvoiceStore {
        invoices: Arc<RwLock<HashMap<InvoiceId, Invoice>>>,
    }

    impl InMemoryInvoiceStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with invoices for testing
        pub async fn with_invoices(invoices: Vec<Invoice>) -> Self {
            let store = Self::new();
            {
                let mut map = store.invoices.write().await;
                for invoice in invoices {
                    map.insert(invoice.id(), invoice);
                }
            }
            store
        }
    }

    fn count_in(map: &HashMap<InvoiceId, Invoice>, owner: UserId, period: &BillingPeriod) -> u64 {
        map.values()
            .filter(|i| i.owner() == owner && period.counts(i.created_at()))
            .count() as u64
    }

    impl DomainPort for InMemoryInvoiceStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryInvoiceStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-invoice-store", 0)
        }
    }

    #[async_trait]
    impl InvoicePort for InMemoryInvoiceStore {
        async fn insert_within_quota(&self, invoice: Invoice, guard: QuotaGuard) -> Result<InsertOutcome, PortError> {
            let mut invoices = self.invoices.write().await;
            let used = count_in(&invoices, invoice.owner(), &guard.period);
            if !guard.allows(used) {
                return Ok(InsertOutcome::QuotaReached { used });
            }
            if invoices.contains_key(&invoice.id()) {
                return Err(PortError::conflict(format!("invoice {} already exists", invoice.id())));
            }
            invoices.insert(invoice.id(), invoice.clone());
            Ok(InsertOutcome::Created(invoice))
        }

        async fn get(&self, owner: UserId, id: InvoiceId) -> Result<Invoice, PortError> {
            self.invoices
                .read()
                .await
                .get(&id)
                .filter(|i| i.owner() == owner)
                .cloned()
                .ok_or_else(|| PortError::not_found("Invoice", id))
        }

        async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Invoice>, PortError> {
            let mut owned: Vec<Invoice> = self
                .invoices
                .read()
                .await
                .values()
                .filter(|i| i.owner() == owner)
                .cloned()
                .collect();
            owned.sort_by(|a, b| {
                b.created_at()
                    .cmp(&a.created_at())
                    .then_with(|| b.id().as_uuid().cmp(a.id().as_uuid()))
            });
            Ok(owned)
        }

        async fn update(&self, invoice: Invoice) -> Result<Invoice, PortError> {
            let mut invoices = self.invoices.write().await;
            match invoices.get_mut(&invoice.id()) {
                Some(stored) if stored.owner() == invoice.owner() => {
                    *stored = invoice.clone();
                    Ok(invoice)
                }
                _ => Err(PortError::not_found("Invoice", invoice.id())),
            }
        }

        async fn delete(&self, owner: UserId, id: InvoiceId) -> Result<(), PortError> {
            let mut invoices = self.invoices.write().await;
            match invoices.get(&id) {
                Some(stored) if stored.owner() == owner => {
                    invoices.remove(&id);
                    Ok(())
                }
                _ => Err(PortError::not_found("Invoice", id)),
            }
        }

        async fn count_by_owner(&self, owner: UserId) -> Result<u64, PortError> {
            Ok(self
                .invoices
                .read()
                .await
                .values()
                .filter(|i| i.owner() == owner)
                .count() as u64)
        }

        async fn count_in_period(&self, owner: UserId, period: BillingPeriod) -> Result<u64, PortError> {
            Ok(count_in(&*self.invoices.read().await, owner, &period))
        }

        async fn delete_all_for_owner(&self, owner: UserId) -> Result<u64, PortError> {
            let mut invoices = self.invoices.write().await;
            let before = invoices.len();
            invoices.retain(|_, i| i.owner() != owner);
            Ok((before - invoices.len()) as u64)
        }
    }
}
