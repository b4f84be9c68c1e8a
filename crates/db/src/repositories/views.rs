//! Read models returned by the repositories.
//!
//! Reference rows are embedded as minimal projections resolved at query time.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use billet_core::invoice::{InvoiceHeader, InvoiceLine};

use crate::entities::{invoice_items, invoices};

/// `{id, name}` snapshot of a reference row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    /// Reference row ID.
    pub id: i64,
    /// Display name.
    pub name: String,
}

/// Unit snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitProjection {
    /// Unit ID.
    pub id: i64,
    /// Short code, e.g. `h`.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// VAT rate snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRateProjection {
    /// VAT rate ID.
    pub id: i64,
    /// Percentage.
    pub rate: Decimal,
    /// Display name.
    pub name: String,
}

/// Projections needed to render a batch of invoices.
#[derive(Debug, Default)]
pub(crate) struct InvoiceProjections {
    pub organisations: HashMap<i64, Projection>,
    pub bank_accounts: HashMap<i64, Projection>,
    pub companies: HashMap<i64, Projection>,
    pub agreements: HashMap<i64, Projection>,
}

/// Projections needed to render a batch of line items.
#[derive(Debug, Default)]
pub(crate) struct ItemProjections {
    pub products: HashMap<i64, Projection>,
    pub units: HashMap<i64, UnitProjection>,
    pub vat_rates: HashMap<i64, VatRateProjection>,
}

fn lookup<T: Clone>(map: &HashMap<i64, T>, id: Option<i64>) -> Option<T> {
    id.and_then(|id| map.get(&id).cloned())
}

/// An invoice as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceView {
    /// Invoice ID.
    pub id: i64,
    /// Active flag.
    pub is_active: bool,
    /// Invoice date.
    pub date: NaiveDate,
    /// Organisation-scoped number.
    pub number: String,
    /// Issuing organisation.
    pub organisation_id: i64,
    /// Bank account.
    pub bank_account_id: Option<i64>,
    /// Billed company.
    pub company_id: Option<i64>,
    /// Agreement.
    pub agreement_id: Option<i64>,
    /// Sum of line amounts.
    pub amount: Decimal,
    /// Discount total.
    pub discount: Decimal,
    /// Sum of line VAT.
    pub vat: Decimal,
    /// Creating user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// External identifier.
    pub uuid: Uuid,
    /// Organisation projection.
    pub organisation: Option<Projection>,
    /// Bank account projection.
    pub bank_account: Option<Projection>,
    /// Company projection.
    pub company: Option<Projection>,
    /// Agreement projection.
    pub agreement: Option<Projection>,
    /// Line items, present on single-invoice reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_items: Option<Vec<InvoiceItemView>>,
    /// Creation timestamp.
    pub created_at: DateTime<FixedOffset>,
    /// Last update timestamp.
    pub updated_at: DateTime<FixedOffset>,
}

impl InvoiceView {
    pub(crate) fn new(model: invoices::Model, projections: &InvoiceProjections) -> Self {
        Self {
            organisation: projections.organisations.get(&model.organisation_id).cloned(),
            bank_account: lookup(&projections.bank_accounts, model.bank_account_id),
            company: lookup(&projections.companies, model.company_id),
            agreement: lookup(&projections.agreements, model.agreement_id),
            id: model.id,
            is_active: model.is_active,
            date: model.date,
            number: model.number,
            organisation_id: model.organisation_id,
            bank_account_id: model.bank_account_id,
            company_id: model.company_id,
            agreement_id: model.agreement_id,
            amount: model.amount,
            discount: model.discount,
            vat: model.vat,
            user_id: model.user_id,
            uuid: model.uuid,
            invoice_items: None,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub(crate) fn with_items(mut self, items: Vec<InvoiceItemView>) -> Self {
        self.invoice_items = Some(items);
        self
    }
}

/// Header fields of a stored invoice.
pub(crate) fn header_of(model: &invoices::Model) -> InvoiceHeader {
    InvoiceHeader {
        is_active: model.is_active,
        date: model.date,
        number: Some(model.number.clone()),
        organisation_id: Some(model.organisation_id),
        bank_account_id: model.bank_account_id,
        company_id: model.company_id,
        agreement_id: model.agreement_id,
    }
}

/// A line item as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceItemView {
    /// Item ID.
    pub id: i64,
    /// Owning invoice.
    pub invoice_id: i64,
    /// Ordinal position.
    pub position: i32,
    /// Product ID.
    pub product_id: i64,
    /// Free-text description.
    pub description: String,
    /// Unit ID.
    pub unit_id: Option<i64>,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit price.
    pub price: Decimal,
    /// Line amount.
    pub amount: Decimal,
    /// Discount rate in whole percent.
    pub discount_rate: i32,
    /// Discount amount.
    pub discount: Decimal,
    /// VAT rate ID.
    pub vat_rate_id: Option<i64>,
    /// VAT amount.
    pub vat: Decimal,
    /// Product projection.
    pub product: Option<Projection>,
    /// Unit projection.
    pub unit: Option<UnitProjection>,
    /// VAT rate projection.
    pub vat_rate: Option<VatRateProjection>,
    /// Creation timestamp.
    pub created_at: DateTime<FixedOffset>,
    /// Last update timestamp.
    pub updated_at: DateTime<FixedOffset>,
}

impl InvoiceItemView {
    pub(crate) fn new(model: invoice_items::Model, projections: &ItemProjections) -> Self {
        Self {
            product: projections.products.get(&model.product_id).cloned(),
            unit: lookup(&projections.units, model.unit_id),
            vat_rate: lookup(&projections.vat_rates, model.vat_rate_id),
            id: model.id,
            invoice_id: model.invoice_id,
            position: model.position,
            product_id: model.product_id,
            description: model.description,
            unit_id: model.unit_id,
            quantity: model.quantity,
            price: model.price,
            amount: model.amount,
            discount_rate: model.discount_rate,
            discount: model.discount,
            vat_rate_id: model.vat_rate_id,
            vat: model.vat,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Line fields of a stored item.
pub(crate) fn line_of(model: &invoice_items::Model) -> InvoiceLine {
    InvoiceLine {
        position: model.position,
        product_id: model.product_id,
        description: model.description.clone(),
        unit_id: model.unit_id,
        quantity: model.quantity,
        price: model.price,
        amount: model.amount,
        discount_rate: model.discount_rate,
        discount: model.discount,
        vat_rate_id: model.vat_rate_id,
        vat: model.vat,
    }
}
