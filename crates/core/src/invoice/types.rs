//! Invoice domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Header fields of an invoice as supplied by a client.
///
/// Derived totals are absent: they are owned by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    /// Whether the invoice is active.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Invoice date.
    pub date: NaiveDate,
    /// Organisation-scoped number. Assigned on insert when absent.
    #[serde(default)]
    pub number: Option<String>,
    /// Issuing organisation.
    #[serde(default)]
    pub organisation_id: Option<i64>,
    /// Bank account printed on the invoice.
    #[serde(default)]
    pub bank_account_id: Option<i64>,
    /// Billed company.
    #[serde(default)]
    pub company_id: Option<i64>,
    /// Agreement the invoice is issued under.
    #[serde(default)]
    pub agreement_id: Option<i64>,
}

fn default_active() -> bool {
    true
}

/// Partial update of invoice header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvoicePatch {
    /// New active flag.
    pub is_active: Option<bool>,
    /// New date.
    pub date: Option<NaiveDate>,
    /// New number.
    pub number: Option<String>,
    /// New organisation.
    pub organisation_id: Option<i64>,
    /// New bank account.
    pub bank_account_id: Option<i64>,
    /// New company.
    pub company_id: Option<i64>,
    /// New agreement.
    pub agreement_id: Option<i64>,
}

impl InvoicePatch {
    /// Overlays the supplied fields on `current`.
    #[must_use]
    pub fn apply(self, current: &InvoiceHeader) -> InvoiceHeader {
        InvoiceHeader {
            is_active: self.is_active.unwrap_or(current.is_active),
            date: self.date.unwrap_or(current.date),
            number: self.number.or_else(|| current.number.clone()),
            organisation_id: self.organisation_id.or(current.organisation_id),
            bank_account_id: self.bank_account_id.or(current.bank_account_id),
            company_id: self.company_id.or(current.company_id),
            agreement_id: self.agreement_id.or(current.agreement_id),
        }
    }
}

/// A line item as supplied by a client, before derived values are filled in.
///
/// `amount`, `discount` and `vat` are optional; whatever is missing is
/// computed from quantity, price and the rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    /// Ordinal position within the invoice.
    #[serde(default)]
    pub position: i32,
    /// Product sold on this line.
    #[serde(default)]
    pub product_id: Option<i64>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Unit of measure.
    #[serde(default)]
    pub unit_id: Option<i64>,
    /// Quantity.
    #[serde(default)]
    pub quantity: Decimal,
    /// Unit price.
    #[serde(default)]
    pub price: Decimal,
    /// Line amount.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Discount rate in whole percent.
    #[serde(default)]
    pub discount_rate: i32,
    /// Discount amount.
    #[serde(default)]
    pub discount: Option<Decimal>,
    /// VAT rate applied to the line.
    #[serde(default)]
    pub vat_rate_id: Option<i64>,
    /// VAT amount.
    #[serde(default)]
    pub vat: Option<Decimal>,
}

/// A fully computed line item, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Ordinal position within the invoice.
    pub position: i32,
    /// Product sold on this line.
    pub product_id: i64,
    /// Free-text description.
    pub description: String,
    /// Unit of measure.
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
    /// VAT rate applied to the line.
    pub vat_rate_id: Option<i64>,
    /// VAT amount.
    pub vat: Decimal,
}

/// Partial update of a line item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ItemPatch {
    /// New position.
    pub position: Option<i32>,
    /// New product.
    pub product_id: Option<i64>,
    /// New description.
    pub description: Option<String>,
    /// New unit.
    pub unit_id: Option<i64>,
    /// New quantity.
    pub quantity: Option<Decimal>,
    /// New price.
    pub price: Option<Decimal>,
    /// Explicit amount.
    pub amount: Option<Decimal>,
    /// New discount rate.
    pub discount_rate: Option<i32>,
    /// Explicit discount.
    pub discount: Option<Decimal>,
    /// New VAT rate.
    pub vat_rate_id: Option<i64>,
    /// Explicit VAT amount.
    pub vat: Option<Decimal>,
}

impl ItemPatch {
    /// Overlays the patch on `current`, producing a draft.
    ///
    /// A derived value is kept only while none of its inputs changed and the
    /// patch does not supply it; otherwise it is left empty so it gets
    /// recomputed.
    #[must_use]
    pub fn apply(self, current: &InvoiceLine) -> ItemDraft {
        let quantity = self.quantity.unwrap_or(current.quantity);
        let price = self.price.unwrap_or(current.price);
        let discount_rate = self.discount_rate.unwrap_or(current.discount_rate);
        let vat_rate_id = self.vat_rate_id.or(current.vat_rate_id);

        let amount_inputs_same = quantity == current.quantity && price == current.price;
        let amount = self
            .amount
            .or_else(|| amount_inputs_same.then_some(current.amount));

        let amount_same = amount == Some(current.amount);
        let discount = self.discount.or_else(|| {
            (amount_same && discount_rate == current.discount_rate).then_some(current.discount)
        });
        let vat = self
            .vat
            .or_else(|| (amount_same && vat_rate_id == current.vat_rate_id).then_some(current.vat));

        ItemDraft {
            position: self.position.unwrap_or(current.position),
            product_id: Some(self.product_id.unwrap_or(current.product_id)),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
            unit_id: self.unit_id.or(current.unit_id),
            quantity,
            price,
            amount,
            discount_rate,
            discount,
            vat_rate_id,
            vat,
        }
    }
}

/// Derived monetary totals of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Sum of line amounts.
    pub amount: Decimal,
    /// Sum of line VAT.
    pub vat: Decimal,
}

/// Column an invoice list can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    /// Primary key.
    #[default]
    Id,
    /// Invoice date.
    Date,
    /// Invoice number.
    Number,
    /// Creation timestamp.
    CreatedAt,
}

impl SortField {
    /// Accepted query values.
    pub const SAFELIST: [&'static str; 4] = ["id", "date", "number", "created_at"];

    /// Parses a safelisted query value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "id" => Some(Self::Id),
            "date" => Some(Self::Date),
            "number" => Some(Self::Number),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Parses `asc` or `desc`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Filters applied to an invoice list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvoiceFilters {
    /// Restrict to one organisation.
    pub organisation_id: Option<i64>,
    /// Restrict to one company.
    pub company_id: Option<i64>,
    /// Restrict to one agreement.
    pub agreement_id: Option<i64>,
    /// Earliest invoice date, inclusive.
    pub start: Option<NaiveDate>,
    /// Latest invoice date, inclusive.
    pub end: Option<NaiveDate>,
}
