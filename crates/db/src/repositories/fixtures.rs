//! Row builders for mock-database tests.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use crate::entities::{companies, invoice_items, invoices, organisations, products, vat_rates};

pub fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

pub fn mock() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

pub const fn rows_affected(rows: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: rows,
    }
}

pub fn invoice(id: i64, organisation_id: i64, number: &str) -> invoices::Model {
    invoices::Model {
        id,
        is_active: true,
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        number: number.to_string(),
        organisation_id,
        bank_account_id: None,
        company_id: Some(4),
        agreement_id: None,
        amount: Decimal::ZERO,
        discount: Decimal::ZERO,
        vat: Decimal::ZERO,
        user_id: Some(1),
        uuid: Uuid::new_v4(),
        destroyed_at: None,
        created_at: now(),
        updated_at: now(),
    }
}

pub fn item(id: i64, invoice_id: i64, amount: Decimal, vat: Decimal) -> invoice_items::Model {
    invoice_items::Model {
        id,
        invoice_id,
        position: 1,
        product_id: 7,
        description: "Consulting".to_string(),
        unit_id: None,
        quantity: dec!(1),
        price: amount,
        amount,
        discount_rate: 0,
        discount: Decimal::ZERO,
        vat_rate_id: Some(2),
        vat,
        created_at: now(),
        updated_at: now(),
    }
}

pub fn organisation(id: i64) -> organisations::Model {
    organisations::Model {
        id,
        name: "Northwind".to_string(),
        full_name: None,
        destroyed_at: None,
        created_at: now(),
        updated_at: now(),
    }
}

pub fn company(id: i64) -> companies::Model {
    companies::Model {
        id,
        name: "Acme".to_string(),
        full_name: None,
        destroyed_at: None,
        created_at: now(),
        updated_at: now(),
    }
}

pub fn product(id: i64) -> products::Model {
    products::Model {
        id,
        is_active: true,
        name: "Consulting".to_string(),
        sku: None,
        price: dec!(10),
        unit_id: None,
        vat_rate_id: Some(2),
        destroyed_at: None,
        created_at: now(),
        updated_at: now(),
    }
}

pub fn vat_rate(id: i64, rate: Decimal) -> vat_rates::Model {
    vat_rates::Model {
        id,
        is_active: true,
        is_default: false,
        rate,
        name: format!("{rate}%"),
        destroyed_at: None,
        created_at: now(),
        updated_at: now(),
    }
}
