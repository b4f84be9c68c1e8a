//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every public call is bounded by a per-call deadline.

pub mod deadline;
pub mod invoice;
pub mod invoice_item;
pub mod reference;
pub mod views;

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod invoice_tests;

pub use deadline::{DEFAULT_STORE_DEADLINE, DeadlineExceeded};
pub use invoice::{CreateInvoiceInput, InvoiceError, InvoiceRepository};
pub use invoice_item::{InvoiceItemRepository, ReconciledItem};
pub use reference::{COMPANY_SEARCH_LIMIT, ReferenceError, ReferenceRepository};
pub use views::{InvoiceItemView, InvoiceView, Projection, UnitProjection, VatRateProjection};
