//! Invoice numbering, line arithmetic, totals and input validation.

pub mod error;
pub mod line;
pub mod numbering;
pub mod query;
pub mod totals;
pub mod types;
pub mod validation;

pub use error::NumberingError;
pub use numbering::next_number;
pub use query::{InvoiceListQuery, ListParams};
pub use types::{
    InvoiceFilters, InvoiceHeader, InvoiceLine, InvoicePatch, InvoiceTotals, ItemDraft, ItemPatch,
    SortDirection, SortField,
};
pub use validation::{
    validate_invoice, validate_invoice_patch, validate_item, validate_item_patch,
};
