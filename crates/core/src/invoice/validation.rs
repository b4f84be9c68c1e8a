//! Field validation for invoice and line item input.

use rust_decimal::Decimal;

use billet_shared::FieldErrors;

use super::types::{InvoiceHeader, InvoicePatch, ItemDraft, ItemPatch};

const MUST_BE_PROVIDED: &str = "must be provided";
const NOT_NEGATIVE: &str = "must not be negative";
const TOO_LARGE: &str = "must be less than 10^13";

/// Exclusive upper bound of a money column, `NUMERIC(15, 2)`.
pub const MONEY_LIMIT: Decimal = Decimal::from_parts(1_316_134_912, 2_328, 0, false, 0);

/// Exclusive upper bound of a quantity column, `NUMERIC(15, 3)`.
pub const QUANTITY_LIMIT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Checks that `value` fits a money column.
pub(crate) fn check_money(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value < Decimal::ZERO {
        errors.add(field, NOT_NEGATIVE);
    } else if value >= MONEY_LIMIT {
        errors.add(field, TOO_LARGE);
    }
}

fn check_quantity(errors: &mut FieldErrors, quantity: Decimal) {
    if quantity < Decimal::ZERO {
        errors.add("quantity", NOT_NEGATIVE);
    } else if quantity >= QUANTITY_LIMIT {
        errors.add("quantity", "must be less than 10^12");
    }
}

fn check_key(errors: &mut FieldErrors, field: &str, key: Option<i64>) {
    errors.check(key.is_some_and(|id| id > 0), field, MUST_BE_PROVIDED);
}

fn check_number(errors: &mut FieldErrors, number: &str) {
    errors.check(!number.trim().is_empty(), "number", "must not be empty");
    errors.check(number.len() <= 50, "number", "must not be more than 50 bytes long");
}

fn check_description(errors: &mut FieldErrors, description: &str) {
    errors.check(
        description.len() <= 1_000,
        "description",
        "must not be more than 1000 bytes long",
    );
}

fn check_discount_rate(errors: &mut FieldErrors, rate: i32) {
    errors.check(
        (0..=100).contains(&rate),
        "discount_rate",
        "must be between 0 and 100",
    );
}

/// Validates invoice header fields.
#[must_use]
pub fn validate_invoice(header: &InvoiceHeader) -> FieldErrors {
    let mut errors = FieldErrors::new();

    check_key(&mut errors, "organisation_id", header.organisation_id);
    check_key(&mut errors, "company_id", header.company_id);
    if let Some(number) = &header.number {
        check_number(&mut errors, number);
    }

    errors
}

/// Validates the fields an invoice patch supplies, without the stored header.
#[must_use]
pub fn validate_invoice_patch(patch: &InvoicePatch) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if patch.organisation_id.is_some() {
        check_key(&mut errors, "organisation_id", patch.organisation_id);
    }
    if patch.company_id.is_some() {
        check_key(&mut errors, "company_id", patch.company_id);
    }
    if let Some(number) = &patch.number {
        check_number(&mut errors, number);
    }

    errors
}

/// Validates a line item draft.
#[must_use]
pub fn validate_item(item: &ItemDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();

    check_key(&mut errors, "product_id", item.product_id);
    errors.check(item.position >= 0, "position", NOT_NEGATIVE);
    check_quantity(&mut errors, item.quantity);
    check_money(&mut errors, "price", item.price);
    check_discount_rate(&mut errors, item.discount_rate);
    for (field, value) in [
        ("amount", item.amount),
        ("discount", item.discount),
        ("vat", item.vat),
    ] {
        if let Some(value) = value {
            check_money(&mut errors, field, value);
        }
    }
    check_description(&mut errors, &item.description);

    errors
}

/// Validates the fields an item patch supplies, without the stored line.
#[must_use]
pub fn validate_item_patch(patch: &ItemPatch) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if patch.product_id.is_some() {
        check_key(&mut errors, "product_id", patch.product_id);
    }
    if let Some(position) = patch.position {
        errors.check(position >= 0, "position", NOT_NEGATIVE);
    }
    if let Some(quantity) = patch.quantity {
        check_quantity(&mut errors, quantity);
    }
    if let Some(rate) = patch.discount_rate {
        check_discount_rate(&mut errors, rate);
    }
    for (field, value) in [
        ("price", patch.price),
        ("amount", patch.amount),
        ("discount", patch.discount),
        ("vat", patch.vat),
    ] {
        if let Some(value) = value {
            check_money(&mut errors, field, value);
        }
    }
    if let Some(description) = &patch.description {
        check_description(&mut errors, description);
    }

    errors
}
