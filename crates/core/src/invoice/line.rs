//! Line item arithmetic.
//!
//! Every derived value is rounded to two decimal places; an explicit value
//! supplied by the client is stored as given.

use rust_decimal::Decimal;

use billet_shared::FieldErrors;

use super::types::{InvoiceLine, ItemDraft};
use super::validation::{check_money, validate_item};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Scale of every derived monetary value.
pub const MONEY_DP: u32 = 2;

/// `quantity × price`, or `None` if the product overflows.
#[must_use]
pub fn line_amount(quantity: Decimal, price: Decimal) -> Option<Decimal> {
    quantity
        .checked_mul(price)
        .map(|amount| amount.round_dp(MONEY_DP))
}

/// `amount × rate / 100` for a whole-percent or decimal rate, or `None` on
/// overflow.
#[must_use]
pub fn percent_of(amount: Decimal, rate: Decimal) -> Option<Decimal> {
    amount
        .checked_mul(rate)
        .and_then(|value| value.checked_div(HUNDRED))
        .map(|value| value.round_dp(MONEY_DP))
}

/// Takes an explicit value or derives one, then checks it fits its column.
fn derived(
    errors: &mut FieldErrors,
    field: &str,
    explicit: Option<Decimal>,
    derive: impl FnOnce() -> Option<Decimal>,
) -> Decimal {
    match explicit {
        Some(value) => value,
        None => {
            let value = derive().unwrap_or(Decimal::MAX);
            check_money(errors, field, value);
            value
        }
    }
}

impl ItemDraft {
    /// Returns true if resolving this draft requires the VAT rate's percentage.
    #[must_use]
    pub const fn needs_vat_rate(&self) -> bool {
        self.vat.is_none() && self.vat_rate_id.is_some()
    }

    /// Validates the draft and fills in its derived values.
    ///
    /// `vat_rate` is the percentage of `vat_rate_id`; it is only consulted when
    /// the draft carries no explicit VAT amount.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when validation fails.
    pub fn resolve(self, vat_rate: Option<Decimal>) -> Result<InvoiceLine, FieldErrors> {
        validate_item(&self).into_result()?;

        let Some(product_id) = self.product_id else {
            let mut errors = FieldErrors::new();
            errors.add("product_id", "must be provided");
            return Err(errors);
        };

        let mut errors = FieldErrors::new();
        let amount = derived(&mut errors, "amount", self.amount, || {
            line_amount(self.quantity, self.price)
        });
        let discount = derived(&mut errors, "discount", self.discount, || {
            percent_of(amount, Decimal::from(self.discount_rate))
        });
        let vat = derived(&mut errors, "vat", self.vat, || {
            vat_rate.map_or(Some(Decimal::ZERO), |rate| percent_of(amount, rate))
        });
        errors.into_result()?;

        Ok(InvoiceLine {
            position: self.position,
            product_id,
            description: self.description,
            unit_id: self.unit_id,
            quantity: self.quantity,
            price: self.price,
            amount,
            discount_rate: self.discount_rate,
            discount,
            vat_rate_id: self.vat_rate_id,
            vat,
        })
    }
}
