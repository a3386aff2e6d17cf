//! Invoicing service tests
//!
//! - `creation` - validation, quota gate and feature checks on create
//! - `lifecycle` - updates, status changes, deletion and ownership
//! - `views` - formatted views and currency conversion
//! - `accounts` - usage reporting, upgrades and account removal

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;

use core_kernel::{RateSource, UserId};
use domain_invoicing::ports::memory::InMemoryInvoiceStore;
use domain_invoicing::{
    InvoiceDraftInput, InvoiceError, InvoicePort, InvoiceStatus, InvoicingContext,
    InvoicingService, LineItemInput, MAX_QUANTITY, MAX_RATE,
};
use domain_membership::ports::memory::InMemoryUserStore;
use domain_membership::{MembershipService, MembershipTier, NewUser, Quota};
use test_utils::{assert_newest_first, assert_totals_consistent, InvoiceBuilder, PlainHasher};

struct Harness {
    service: InvoicingService,
    membership: MembershipService,
    store: InMemoryInvoiceStore,
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

fn harness() -> Harness {
    let context = InvoicingContext::standard().unwrap();
    let membership = MembershipService::new(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(PlainHasher),
        context.currencies.clone(),
    );
    let store = InMemoryInvoiceStore::new();
    let service = InvoicingService::new(Arc::new(store.clone()), membership.clone(), context);
    Harness {
        service,
        membership,
        store,
    }
}

async fn register(h: &Harness, email: &str, tier: MembershipTier) -> UserId {
    let user = h
        .membership
        .register(
            NewUser {
                email: email.to_string(),
                password: "password123".to_string(),
                company_name: None,
                default_currency: None,
            },
            now(),
        )
        .await
        .unwrap();
    if tier != MembershipTier::Free {
        h.membership.change_tier(user.id, tier, now()).await.unwrap();
    }
    user.id
}

fn draft() -> InvoiceDraftInput {
    InvoiceDraftInput {
        invoice_number: "INV-0001".to_string(),
        client_name: "Globex Corporation".to_string(),
        client_email: Some("ap@globex.example".to_string()),
        client_address: Some("1 Cypress Creek".to_string()),
        issue_date: "2024-03-15".to_string(),
        due_date: "2024-04-14".to_string(),
        currency: None,
        tax_rate: Some("10".to_string()),
        notes: None,
        items: vec![
            LineItemInput::new("Design", "2", "50.00"),
            LineItemInput::new("Hosting", "1", "30.00"),
        ],
    }
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn test_earlier_months_do_not_count_toward_quota() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;

        let february = Utc.with_ymd_and_hms(2024, 2, 20, 10, 0, 0).unwrap();
        let history: Vec<_> = (1..=5)
            .map(|n| {
                InvoiceBuilder::new(owner)
                    .with_number(&format!("INV-{:04}", n))
                    .with_item("Retainer", dec!(1), dec!(500))
                    .created_at(february)
                    .build()
            })
            .collect();
        let store = InMemoryInvoiceStore::with_invoices(history).await;
        let service = InvoicingService::new(
            Arc::new(store.clone()),
            h.membership.clone(),
            h.service.context().clone(),
        );

        let usage = service.usage(owner, now()).await.unwrap();
        assert_eq!(usage.used, 0);
        assert!(service.create_invoice(owner, &draft(), now()).await.is_ok());
        assert_eq!(service.next_invoice_number(owner).await.unwrap(), "INV-0007");
    }

    #[tokio::test]
    async fn test_quota_counts_invoices_stamped_after_the_check() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;

        for _ in 0..4 {
            h.service.create_invoice(owner, &draft(), now()).await.unwrap();
        }
        let ahead = now() + Duration::milliseconds(5);
        h.service.create_invoice(owner, &draft(), ahead).await.unwrap();

        let behind = now() + Duration::milliseconds(1);
        let err = h.service.create_invoice(owner, &draft(), behind).await.unwrap_err();
        assert!(matches!(err, InvoiceError::QuotaExceeded { used: 5, .. }));
        assert_eq!(h.store.count_by_owner(owner).await.unwrap(), 5);
        assert_eq!(h.service.usage(owner, behind).await.unwrap().used, 5);
    }

    #[tokio::test]
    async fn test_extreme_quantity_is_a_validation_error() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        let mut input = draft();
        input.items.push(LineItemInput::new("Huge", "79228162514264337593543950335", "2"));

        match h.service.create_invoice(owner, &input, now()).await {
            Err(InvoiceError::Validation(err)) => {
                assert_eq!(err.row, Some(3));
                assert_eq!(err.field.as_deref(), Some("quantity"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(h.store.count_by_owner(owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_largest_accepted_values_create() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        let mut input = draft();
        input.tax_rate = Some("100".to_string());
        input.items = vec![LineItemInput::new(
            "Bulk",
            MAX_QUANTITY.to_string(),
            MAX_RATE.to_string(),
        )];

        let invoice = h.service.create_invoice(owner, &input, now()).await.unwrap();
        assert_eq!(invoice.totals().total, MAX_QUANTITY * MAX_RATE * dec!(2));
        assert_totals_consistent(&invoice);
    }

    #[tokio::test]
    async fn test_create_computes_totals() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;

        let invoice = h.service.create_invoice(owner, &draft(), now()).await.unwrap();
        assert_eq!(invoice.totals().subtotal, dec!(130.00));
        assert_eq!(invoice.totals().tax_amount, dec!(13.00));
        assert_eq!(invoice.totals().total, dec!(143.00));
        assert_eq!(invoice.status(), InvoiceStatus::Draft);
        assert_eq!(invoice.currency().as_str(), "USD");
    }

    #[tokio::test]
    async fn test_blank_rows_are_skipped() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        let mut input = draft();
        input.items.insert(1, LineItemInput::new("", "4", ""));

        let invoice = h.service.create_invoice(owner, &input, now()).await.unwrap();
        assert_eq!(invoice.items().len(), 2);
        assert_eq!(invoice.totals().subtotal, dec!(130.00));
    }

    #[tokio::test]
    async fn test_invalid_row_rejects_whole_invoice() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        let mut input = draft();
        input.items.push(LineItemInput::new("Support", "0", "10"));

        match h.service.create_invoice(owner, &input, now()).await.unwrap_err() {
            InvoiceError::Validation(v) => {
                assert_eq!(v.row, Some(3));
                assert_eq!(v.field.as_deref(), Some("quantity"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(h.store.count_by_owner(owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_free_tier_blocked_after_five() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;

        for _ in 0..5 {
            h.service.create_invoice(owner, &draft(), now()).await.unwrap();
        }
        let err = h.service.create_invoice(owner, &draft(), now()).await.unwrap_err();
        match err {
            InvoiceError::QuotaExceeded { tier, used, limit } => {
                assert_eq!(tier, MembershipTier::Free);
                assert_eq!(used, 5);
                assert_eq!(limit, Quota::Limited(5));
            }
            other => panic!("expected quota error, got {:?}", other),
        }
        assert_eq!(h.store.count_by_owner(owner).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_quota_resets_next_month() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        for _ in 0..5 {
            h.service.create_invoice(owner, &draft(), now()).await.unwrap();
        }

        let next_month = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 1).unwrap();
        assert!(h.service.create_invoice(owner, &draft(), next_month).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_creates_never_exceed_quota() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let service = h.service.clone();
            handles.push(tokio::spawn(async move {
                service.create_invoice(owner, &draft(), now()).await
            }));
        }

        let mut created = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(InvoiceError::QuotaExceeded { .. }) => rejected += 1,
                Err(other) => panic!("unexpected error {:?}", other),
            }
        }
        assert_eq!(created, 5);
        assert_eq!(rejected, 15);
    }

    #[tokio::test]
    async fn test_expired_subscription_uses_free_quota() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Starter).await;
        let later = now() + Duration::days(45);

        for _ in 0..5 {
            h.service.create_invoice(owner, &draft(), later).await.unwrap();
        }
        assert!(matches!(
            h.service.create_invoice(owner, &draft(), later).await,
            Err(InvoiceError::QuotaExceeded { tier: MembershipTier::Free, .. })
        ));
    }

    #[tokio::test]
    async fn test_other_currency_needs_multi_currency() {
        let h = harness();
        let free = register(&h, "free@example.com", MembershipTier::Free).await;
        let starter = register(&h, "starter@example.com", MembershipTier::Starter).await;
        let mut input = draft();
        input.currency = Some("JPY".to_string());

        assert!(matches!(
            h.service.create_invoice(free, &input, now()).await,
            Err(InvoiceError::FeatureUnavailable { .. })
        ));
        let invoice = h.service.create_invoice(starter, &input, now()).await.unwrap();
        assert_eq!(invoice.currency().as_str(), "JPY");
    }

    #[tokio::test]
    async fn test_deactivated_account_cannot_create() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        h.membership.deactivate(owner, now()).await.unwrap();
        assert!(matches!(
            h.service.create_invoice(owner, &draft(), now()).await,
            Err(InvoiceError::AccountInactive)
        ));
    }

    #[tokio::test]
    async fn test_next_number_follows_count() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        assert_eq!(h.service.next_invoice_number(owner).await.unwrap(), "INV-0001");
        h.service.create_invoice(owner, &draft(), now()).await.unwrap();
        h.service.create_invoice(owner, &draft(), now()).await.unwrap();
        assert_eq!(h.service.next_invoice_number(owner).await.unwrap(), "INV-0003");
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_update_items_recomputes_totals() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        let invoice = h.service.create_invoice(owner, &draft(), now()).await.unwrap();

        let rows = vec![LineItemInput::new("Audit", "3", "100")];
        let updated = h
            .service
            .update_items(owner, invoice.id(), &rows, Some("20"), now())
            .await
            .unwrap();
        assert_eq!(updated.totals().subtotal, dec!(300));
        assert_eq!(updated.totals().tax_amount, dec!(60));
        assert_eq!(updated.totals().total, dec!(360));
        assert_totals_consistent(&updated);

        let stored = h.service.get_invoice(owner, invoice.id()).await.unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_invoice_untouched() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        let invoice = h.service.create_invoice(owner, &draft(), now()).await.unwrap();

        let rows = vec![LineItemInput::new("Audit", "3", "-1")];
        assert!(h
            .service
            .update_items(owner, invoice.id(), &rows, Some("20"), now())
            .await
            .is_err());
        assert!(h.service.update_tax_rate(owner, invoice.id(), "101", now()).await.is_err());

        let stored = h.service.get_invoice(owner, invoice.id()).await.unwrap();
        assert_eq!(stored.totals(), invoice.totals());
    }

    #[tokio::test]
    async fn test_status_flow() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        let id = h.service.create_invoice(owner, &draft(), now()).await.unwrap().id();

        assert!(matches!(
            h.service.change_status(owner, id, InvoiceStatus::Paid, now()).await,
            Err(InvoiceError::InvalidStatusTransition { .. })
        ));
        h.service.change_status(owner, id, InvoiceStatus::Sent, now()).await.unwrap();
        let paid = h.service.change_status(owner, id, InvoiceStatus::Paid, now()).await.unwrap();
        assert_eq!(paid.status(), InvoiceStatus::Paid);
        assert!(matches!(
            h.service.update_tax_rate(owner, id, "5", now()).await,
            Err(InvoiceError::NotEditable(InvoiceStatus::Paid))
        ));
    }

    #[tokio::test]
    async fn test_other_users_invoices_are_invisible() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        let intruder = register(&h, "b@example.com", MembershipTier::Free).await;
        let id = h.service.create_invoice(owner, &draft(), now()).await.unwrap().id();

        assert!(matches!(
            h.service.get_invoice(intruder, id).await,
            Err(InvoiceError::NotFound(_))
        ));
        assert!(matches!(
            h.service.delete_invoice(intruder, id).await,
            Err(InvoiceError::NotFound(_))
        ));
        assert!(h.service.list_invoices(intruder).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_newest_first_and_delete() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        let first = h.service.create_invoice(owner, &draft(), now()).await.unwrap();
        let second = h
            .service
            .create_invoice(owner, &draft(), now() + Duration::minutes(5))
            .await
            .unwrap();

        let listed = h.service.list_invoices(owner).await.unwrap();
        assert_newest_first(&listed);
        assert_eq!(listed[0].id(), second.id());
        assert_eq!(listed[1].id(), first.id());

        h.service.delete_invoice(owner, first.id()).await.unwrap();
        assert_eq!(h.service.list_invoices(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overdue_invoices() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        h.service.create_invoice(owner, &draft(), now()).await.unwrap();

        let before_due = chrono::NaiveDate::from_ymd_opt(2024, 4, 14).unwrap();
        let after_due = chrono::NaiveDate::from_ymd_opt(2024, 4, 15).unwrap();
        assert!(h.service.overdue_invoices(owner, before_due).await.unwrap().is_empty());
        assert_eq!(h.service.overdue_invoices(owner, after_due).await.unwrap().len(), 1);
    }
}

mod views {
    use super::*;

    #[tokio::test]
    async fn test_plain_view() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        let id = h.service.create_invoice(owner, &draft(), now()).await.unwrap().id();

        let view = h.service.view_invoice(owner, id, None, now()).await.unwrap();
        assert_eq!(view.formatted.total, "$143.00");
        assert!(view.conversion.is_none());
    }

    #[tokio::test]
    async fn test_export_names_issuer_and_stays_scoped() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        let other = register(&h, "b@example.com", MembershipTier::Free).await;
        let id = h.service.create_invoice(owner, &draft(), now()).await.unwrap().id();

        let export = h.service.export_invoice(owner, id, now()).await.unwrap();
        assert_eq!(export.issuer, "a@example.com");
        assert_eq!(export.view.formatted.total, "$143.00");
        assert_eq!(export.file_name("pdf"), "invoice_INV-0001.pdf");

        assert!(matches!(
            h.service.export_invoice(other, id, now()).await,
            Err(InvoiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_conversion_requires_feature() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Starter).await;
        let id = h.service.create_invoice(owner, &draft(), now()).await.unwrap().id();

        assert!(matches!(
            h.service.view_invoice(owner, id, Some("EUR"), now()).await,
            Err(InvoiceError::FeatureUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_conversion_reports_rate_source() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Professional).await;
        let id = h.service.create_invoice(owner, &draft(), now()).await.unwrap().id();

        let view = h.service.view_invoice(owner, id, Some("jpy"), now()).await.unwrap();
        let conversion = view.conversion.unwrap();
        assert_eq!(conversion.source, RateSource::Direct);
        assert_eq!(conversion.total, Some(dec!(143.00) * dec!(149.50)));
        assert_eq!(conversion.formatted_total.as_deref(), Some("¥21,378"));

        assert!(matches!(
            h.service.view_invoice(owner, id, Some("XYZ"), now()).await,
            Err(InvoiceError::Validation(_))
        ));
    }
}

mod accounts {
    use super::*;

    #[tokio::test]
    async fn test_usage_report() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Starter).await;
        for _ in 0..10 {
            h.service.create_invoice(owner, &draft(), now()).await.unwrap();
        }
        let usage = h.service.usage(owner, now()).await.unwrap();
        assert_eq!(usage.used, 10);
        assert_eq!(usage.percentage, dec!(20));
        assert_eq!(usage.remaining, Some(40));
    }

    #[tokio::test]
    async fn test_upgrade_lifts_quota() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        for _ in 0..5 {
            h.service.create_invoice(owner, &draft(), now()).await.unwrap();
        }
        let user = h.service.upgrade(owner, MembershipTier::Business, now()).await.unwrap();
        assert_eq!(user.tier, MembershipTier::Business);
        assert!(h.service.create_invoice(owner, &draft(), now()).await.is_ok());
        assert_eq!(h.service.usage(owner, now()).await.unwrap().percentage, dec!(0));
    }

    #[tokio::test]
    async fn test_delete_account_removes_invoices() {
        let h = harness();
        let owner = register(&h, "a@example.com", MembershipTier::Free).await;
        let other = register(&h, "b@example.com", MembershipTier::Free).await;
        h.service.create_invoice(owner, &draft(), now()).await.unwrap();
        h.service.create_invoice(owner, &draft(), now()).await.unwrap();
        h.service.create_invoice(other, &draft(), now()).await.unwrap();

        assert_eq!(h.service.delete_account(owner).await.unwrap(), 2);
        assert_eq!(h.store.count_by_owner(owner).await.unwrap(), 0);
        assert_eq!(h.store.count_by_owner(other).await.unwrap(), 1);
        assert!(h.membership.get(owner).await.is_err());
    }
}
