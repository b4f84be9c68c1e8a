//! `SeaORM` entity definitions.

pub mod agreements;
pub mod bank_accounts;
pub mod companies;
pub mod invoice_items;
pub mod invoices;
pub mod organisations;
pub mod products;
pub mod units;
pub mod vat_rates;
