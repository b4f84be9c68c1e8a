//! Mock-database tests for the invoice repository.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::Value;

use billet_core::invoice::{InvoiceHeader, InvoicePatch, InvoiceTotals, ItemDraft, ListParams};
use billet_shared::types::{InvoiceId, OrganisationId, PageMeta};

use super::fixtures::{
    company, invoice, item, mock, organisation, product, rows_affected, vat_rate,
};
use super::invoice::{CreateInvoiceInput, InvoiceError, InvoiceRepository};
use crate::entities::{invoice_items, invoices, organisations};

fn count_row(total: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(total)))])
}

fn header(organisation_id: Option<i64>, company_id: Option<i64>) -> InvoiceHeader {
    InvoiceHeader {
        is_active: true,
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        number: None,
        organisation_id,
        bank_account_id: None,
        company_id,
        agreement_id: None,
    }
}

fn draft(quantity: Decimal, price: Decimal) -> ItemDraft {
    ItemDraft {
        position: 1,
        product_id: Some(7),
        description: "Consulting".to_string(),
        unit_id: None,
        quantity,
        price,
        amount: None,
        discount_rate: 0,
        discount: None,
        vat_rate_id: Some(2),
        vat: None,
    }
}

// ============================================================================
// Keys that can never match
// ============================================================================

#[tokio::test]
async fn test_get_non_positive_id_skips_store() {
    let db = mock().into_connection();
    let repo = InvoiceRepository::new(db.clone());

    for id in [0, -5] {
        let err = repo.get(InvoiceId::new(id)).await.unwrap_err();
        assert!(matches!(err, InvoiceError::NotFound(n) if n == id));
    }
    assert!(db.into_transaction_log().is_empty());
}

#[tokio::test]
async fn test_next_number_non_positive_organisation_skips_store() {
    let db = mock().into_connection();
    let repo = InvoiceRepository::new(db.clone());

    let err = repo.next_number(OrganisationId::new(0)).await.unwrap_err();
    assert!(matches!(err, InvoiceError::OrganisationNotFound(0)));
    assert!(db.into_transaction_log().is_empty());
}

// ============================================================================
// Numbering
// ============================================================================

#[tokio::test]
async fn test_next_number_without_invoices_is_one() {
    let db = mock()
        .append_query_results([Vec::<invoices::Model>::new()])
        .into_connection();

    let number = InvoiceRepository::new(db)
        .next_number(OrganisationId::new(3))
        .await
        .unwrap();
    assert_eq!(number, "1");
}

#[tokio::test]
async fn test_next_number_increments_latest_for_organisation() {
    let db = mock()
        .append_query_results([vec![invoice(11, 5, "7")]])
        .into_connection();
    let repo = InvoiceRepository::new(db.clone());

    assert_eq!(repo.next_number(OrganisationId::new(5)).await.unwrap(), "8");

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("organisation_id"));
    assert!(log.contains("BigInt(Some(5))"));
    assert!(log.contains("created_at"));
}

#[tokio::test]
async fn test_next_number_rejects_non_numeric_latest() {
    let db = mock()
        .append_query_results([vec![invoice(11, 5, "INV-7")]])
        .into_connection();

    let err = InvoiceRepository::new(db)
        .next_number(OrganisationId::new(5))
        .await
        .unwrap_err();
    assert!(matches!(err, InvoiceError::Numbering(_)));
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_without_matches_skips_page_query() {
    let db = mock()
        .append_query_results([vec![count_row(0)]])
        .into_connection();
    let repo = InvoiceRepository::new(db.clone());
    let query = ListParams::default().parse().unwrap();

    let page = repo.list(&query).await.unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.meta, PageMeta::default());
    assert_eq!(db.into_transaction_log().len(), 1);
}

#[tokio::test]
async fn test_list_embeds_projections() {
    let db = mock()
        .append_query_results([vec![count_row(1)]])
        .append_query_results([vec![invoice(11, 5, "7")]])
        .append_query_results([vec![organisation(5)]])
        .append_query_results([vec![company(4)]])
        .into_connection();
    let repo = InvoiceRepository::new(db.clone());
    let query = ListParams {
        organisation_id: Some("5".to_string()),
        ..ListParams::default()
    }
    .parse()
    .unwrap();

    let page = repo.list(&query).await.unwrap();
    let (rows, meta) = (page.data, page.meta);
    assert_eq!(rows.len(), 1);
    assert_eq!(meta.total_records, 1);
    assert_eq!(meta.current_page, 1);
    assert_eq!(rows[0].organisation.as_ref().unwrap().name, "Northwind");
    assert_eq!(rows[0].company.as_ref().unwrap().name, "Acme");
    assert!(rows[0].invoice_items.is_none());

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("destroyed_at"));
    assert!(log.contains("IS NULL"));
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_rejects_missing_references_before_store() {
    let db = mock().into_connection();
    let repo = InvoiceRepository::new(db.clone());

    let err = repo
        .create(CreateInvoiceInput {
            header: header(None, None),
            items: vec![draft(dec!(-1), dec!(10))],
            user_id: Some(1),
        })
        .await
        .unwrap_err();

    let InvoiceError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get("organisation_id"), Some("must be provided"));
    assert_eq!(errors.get("company_id"), Some("must be provided"));
    assert_eq!(
        errors.get("invoice_items.0.quantity"),
        Some("must not be negative")
    );
    assert!(db.into_transaction_log().is_empty());
}

#[tokio::test]
async fn test_create_unknown_organisation_is_field_error() {
    let db = mock()
        .append_query_results([Vec::<organisations::Model>::new()])
        .into_connection();

    let err = InvoiceRepository::new(db)
        .create(CreateInvoiceInput {
            header: header(Some(9), Some(4)),
            items: Vec::new(),
            user_id: None,
        })
        .await
        .unwrap_err();

    let InvoiceError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get("organisation_id"), Some("does not exist"));
}

#[tokio::test]
async fn test_create_numbers_and_reconciles_in_one_transaction() {
    let created = invoice(12, 5, "4");
    let stored_item = item(100, 12, dec!(200), dec!(20));
    let mut reconciled = created.clone();
    reconciled.amount = dec!(200);
    reconciled.vat = dec!(20);

    let db = mock()
        // lock organisation, latest number, insert header
        .append_query_results([vec![organisation(5)]])
        .append_query_results([vec![invoice(11, 5, "3")]])
        .append_query_results([vec![created]])
        // vat rate, insert item, reconcile
        .append_query_results([vec![vat_rate(2, dec!(10))]])
        .append_query_results([vec![stored_item.clone()]])
        .append_query_results([vec![stored_item.clone()]])
        .append_exec_results([rows_affected(1)])
        // reload with projections
        .append_query_results([vec![reconciled]])
        .append_query_results([vec![stored_item]])
        .append_query_results([vec![organisation(5)]])
        .append_query_results([vec![company(4)]])
        .append_query_results([vec![product(7)]])
        .append_query_results([vec![vat_rate(2, dec!(10))]])
        .into_connection();
    let repo = InvoiceRepository::new(db.clone());

    let view = repo
        .create(CreateInvoiceInput {
            header: header(Some(5), Some(4)),
            items: vec![draft(dec!(2), dec!(100))],
            user_id: Some(1),
        })
        .await
        .unwrap();

    assert_eq!(view.number, "4");
    assert_eq!(view.amount, dec!(200));
    assert_eq!(view.vat, dec!(20));
    let items = view.invoice_items.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product.as_ref().unwrap().name, "Consulting");

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("FOR UPDATE"));
    assert!(log.contains("String(Some(\"4\"))"));
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_writes_header_columns_only() {
    let mut stored = invoice(11, 5, "7");
    stored.amount = dec!(25);
    stored.vat = dec!(2);
    let mut updated = stored.clone();
    updated.number = "7A".to_string();
    updated.is_active = false;

    let db = mock()
        // lock, update returning
        .append_query_results([vec![stored]])
        .append_query_results([vec![updated.clone()]])
        // reload: invoice, items, organisation, company
        .append_query_results([vec![updated]])
        .append_query_results([Vec::<invoice_items::Model>::new()])
        .append_query_results([vec![organisation(5)]])
        .append_query_results([vec![company(4)]])
        .into_connection();
    let repo = InvoiceRepository::new(db.clone());

    let view = repo
        .update(
            InvoiceId::new(11),
            InvoicePatch {
                number: Some("7A".to_string()),
                is_active: Some(false),
                ..InvoicePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(view.number, "7A");
    assert_eq!(view.amount, dec!(25));
    assert_eq!(view.vat, dec!(2));

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("FOR UPDATE"));
    let start = log.find("UPDATE \\\"invoices\\\"").unwrap();
    let statement = &log[start..];
    let set_clause = &statement[..statement.find("RETURNING").unwrap_or(statement.len())];
    assert!(set_clause.contains(r#"\"number\""#));
    assert!(set_clause.contains(r#"\"updated_at\""#));
    for derived in [r#"\"amount\""#, r#"\"discount\""#, r#"\"vat\""#] {
        assert!(!set_clause.contains(derived), "update wrote {derived}");
    }
}

#[tokio::test]
async fn test_update_missing_or_destroyed_invoice_is_not_found() {
    let db = mock()
        .append_query_results([Vec::<invoices::Model>::new()])
        .into_connection();
    let repo = InvoiceRepository::new(db.clone());

    let err = repo
        .update(InvoiceId::new(11), InvoicePatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, InvoiceError::NotFound(11)));

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("destroyed_at"));
    assert!(log.contains("IS NULL"));
    assert!(!log.contains("UPDATE \\\"invoices\\\""));
}

#[tokio::test]
async fn test_update_to_unknown_organisation_is_field_error() {
    let db = mock()
        .append_query_results([vec![invoice(11, 5, "7")]])
        .append_query_results([Vec::<organisations::Model>::new()])
        .into_connection();

    let err = InvoiceRepository::new(db)
        .update(
            InvoiceId::new(11),
            InvoicePatch {
                organisation_id: Some(9),
                ..InvoicePatch::default()
            },
        )
        .await
        .unwrap_err();

    let InvoiceError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get("organisation_id"), Some("does not exist"));
}

#[tokio::test]
async fn test_update_invalid_patch_skips_store() {
    let db = mock().into_connection();
    let repo = InvoiceRepository::new(db.clone());

    let err = repo
        .update(
            InvoiceId::new(11),
            InvoicePatch {
                company_id: Some(-1),
                number: Some("  ".to_string()),
                ..InvoicePatch::default()
            },
        )
        .await
        .unwrap_err();

    let InvoiceError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get("company_id"), Some("must be provided"));
    assert_eq!(errors.get("number"), Some("must not be empty"));
    assert!(db.into_transaction_log().is_empty());
}

// ============================================================================
// Delete and recompute
// ============================================================================

#[tokio::test]
async fn test_delete_missing_invoice_is_not_found() {
    let db = mock()
        .append_exec_results([rows_affected(0)])
        .into_connection();

    let err = InvoiceRepository::new(db)
        .delete(InvoiceId::new(42))
        .await
        .unwrap_err();
    assert!(matches!(err, InvoiceError::NotFound(42)));
}

#[tokio::test]
async fn test_delete_live_invoice() {
    let db = mock()
        .append_exec_results([rows_affected(1)])
        .into_connection();

    InvoiceRepository::new(db)
        .delete(InvoiceId::new(42))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_recompute_sums_current_items() {
    let db = mock()
        .append_query_results([vec![invoice(12, 5, "4")]])
        .append_query_results([vec![
            item(1, 12, dec!(20), dec!(2)),
            item(2, 12, dec!(5), dec!(0)),
        ]])
        .append_exec_results([rows_affected(1)])
        .into_connection();
    let repo = InvoiceRepository::new(db.clone());

    let totals = repo.recompute_totals(InvoiceId::new(12)).await.unwrap();
    assert_eq!(
        totals,
        InvoiceTotals {
            amount: dec!(25),
            vat: dec!(2)
        }
    );

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("FOR UPDATE"));
    assert!(log.contains("UPDATE"));
}

#[tokio::test]
async fn test_recompute_without_items_is_zero() {
    let db = mock()
        .append_query_results([vec![invoice(12, 5, "4")]])
        .append_query_results([Vec::<invoice_items::Model>::new()])
        .append_exec_results([rows_affected(1)])
        .into_connection();

    let totals = InvoiceRepository::new(db)
        .recompute_totals(InvoiceId::new(12))
        .await
        .unwrap();
    assert_eq!(totals, InvoiceTotals::ZERO);
}

#[tokio::test]
async fn test_recompute_missing_invoice_is_not_found() {
    let db = mock()
        .append_query_results([Vec::<invoices::Model>::new()])
        .into_connection();

    let err = InvoiceRepository::new(db)
        .recompute_totals(InvoiceId::new(12))
        .await
        .unwrap_err();
    assert!(matches!(err, InvoiceError::NotFound(12)));
}

#[test]
fn test_error_maps_to_app_error() {
    use billet_shared::AppError;

    let err: AppError = InvoiceError::ItemNotFound {
        invoice_id: 1,
        item_id: 2,
    }
    .into();
    assert_eq!(err.status_code(), 404);

    let err: AppError = InvoiceError::field("vat_rate_id", "does not exist").into();
    assert_eq!(err.status_code(), 422);
}
