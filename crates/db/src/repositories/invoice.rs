//! Invoice repository: header reads and writes, numbering, totals reconciliation.
//!
//! Derived totals (`amount`, `vat`) are written only by [`reconcile`], which
//! always runs inside a transaction holding the invoice row lock.

use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use tracing::{error, info};
use uuid::Uuid;

use billet_core::invoice::{
    InvoiceHeader, InvoiceListQuery, InvoicePatch, InvoiceTotals, ItemDraft, NumberingError,
    SortDirection, SortField, numbering, validate_invoice, validate_invoice_patch,
    validate_item,
};
use billet_shared::types::{InvoiceId, OrganisationId, PageResponse};
use billet_shared::{AppError, FieldErrors};

use super::deadline::{DEFAULT_STORE_DEADLINE, DeadlineExceeded, bounded};
use super::invoice_item;
use super::reference;
use super::views::{InvoiceItemView, InvoiceView, header_of};
use crate::entities::{invoice_items, invoices};

/// Error types for invoice and invoice item operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    /// Invoice not found, soft-deleted, or key below 1.
    #[error("Invoice not found: {0}")]
    NotFound(i64),

    /// Line item not found on the given invoice.
    #[error("Invoice item {item_id} not found on invoice {invoice_id}")]
    ItemNotFound {
        /// Invoice the lookup was scoped to.
        invoice_id: i64,
        /// Requested item.
        item_id: i64,
    },

    /// Organisation not found or key below 1.
    #[error("Organisation not found: {0}")]
    OrganisationNotFound(i64),

    /// Input failed validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Latest stored number cannot be incremented.
    #[error(transparent)]
    Numbering(#[from] NumberingError),

    /// Store call exceeded its deadline.
    #[error(transparent)]
    Timeout(#[from] DeadlineExceeded),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl InvoiceError {
    pub(crate) fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::NotFound(_) | InvoiceError::ItemNotFound { .. } => {
                Self::NotFound("the requested resource could not be found".to_string())
            }
            InvoiceError::OrganisationNotFound(_) => {
                Self::NotFound("organisation could not be found".to_string())
            }
            InvoiceError::Validation(errors) => Self::Validation(errors),
            InvoiceError::Numbering(e) => Self::Internal(e.to_string()),
            InvoiceError::Timeout(e) => Self::Timeout(e.to_string()),
            InvoiceError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Header fields.
    pub header: InvoiceHeader,
    /// Line items persisted together with the header.
    pub items: Vec<ItemDraft>,
    /// Authenticated creator.
    pub user_id: Option<i64>,
}

/// Fails with `NotFound` for keys that can never match, before any store call.
pub(crate) fn ensure_invoice_key(id: InvoiceId) -> Result<i64, InvoiceError> {
    if id.is_valid() {
        Ok(id.get())
    } else {
        Err(InvoiceError::NotFound(id.get()))
    }
}

/// Finds a live invoice.
pub(crate) async fn find_visible<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<invoices::Model, InvoiceError> {
    invoices::Entity::find_by_id(id)
        .filter(invoices::Column::DestroyedAt.is_null())
        .one(conn)
        .await?
        .ok_or(InvoiceError::NotFound(id))
}

/// Takes the row lock on a live invoice, serialising item mutations and
/// reconciliation for it until the transaction ends.
pub(crate) async fn lock_invoice<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<invoices::Model, InvoiceError> {
    invoices::Entity::find_by_id(id)
        .filter(invoices::Column::DestroyedAt.is_null())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(InvoiceError::NotFound(id))
}

#[derive(Debug, FromQueryResult)]
struct LineAmounts {
    amount: Decimal,
    vat: Decimal,
}

/// Recomputes an invoice's totals from its current items and stores them.
///
/// Callers must hold the invoice row lock in the same transaction.
pub(crate) async fn reconcile<C: ConnectionTrait>(
    conn: &C,
    invoice_id: i64,
) -> Result<InvoiceTotals, DbErr> {
    let lines = invoice_items::Entity::find()
        .select_only()
        .column(invoice_items::Column::Amount)
        .column(invoice_items::Column::Vat)
        .filter(invoice_items::Column::InvoiceId.eq(invoice_id))
        .into_model::<LineAmounts>()
        .all(conn)
        .await?;
    let totals = InvoiceTotals::from_lines(lines.into_iter().map(|l| (l.amount, l.vat)));

    invoices::Entity::update_many()
        .col_expr(invoices::Column::Amount, Expr::value(totals.amount))
        .col_expr(invoices::Column::Vat, Expr::value(totals.vat))
        .col_expr(
            invoices::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        )
        .filter(invoices::Column::Id.eq(invoice_id))
        .exec(conn)
        .await?;

    Ok(totals)
}

/// Number of the organisation's most recently created invoice.
///
/// Soft-deleted invoices count, so their numbers are never reissued.
async fn latest_number<C: ConnectionTrait>(
    conn: &C,
    organisation_id: i64,
) -> Result<Option<String>, DbErr> {
    Ok(invoices::Entity::find()
        .filter(invoices::Column::OrganisationId.eq(organisation_id))
        .order_by_desc(invoices::Column::CreatedAt)
        .order_by_desc(invoices::Column::Id)
        .one(conn)
        .await?
        .map(|invoice| invoice.number))
}

const fn sort_column(sort: SortField) -> invoices::Column {
    match sort {
        SortField::Id => invoices::Column::Id,
        SortField::Date => invoices::Column::Date,
        SortField::Number => invoices::Column::Number,
        SortField::CreatedAt => invoices::Column::CreatedAt,
    }
}

const fn sort_order(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

fn validate_create(input: &CreateInvoiceInput) -> Result<i64, InvoiceError> {
    let mut errors = validate_invoice(&input.header);
    for (index, item) in input.items.iter().enumerate() {
        errors.merge_prefixed(&format!("invoice_items.{index}"), validate_item(item));
    }
    errors.into_result().map_err(InvoiceError::Validation)?;

    input
        .header
        .organisation_id
        .ok_or_else(|| InvoiceError::field("organisation_id", "must be provided"))
}

/// Invoice repository for header CRUD, numbering and reconciliation.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
    deadline: Duration,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            deadline: DEFAULT_STORE_DEADLINE,
        }
    }

    /// Overrides the per-call deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Lists live invoices matching the query, with reference projections.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or times out.
    pub async fn list(
        &self,
        query: &InvoiceListQuery,
    ) -> Result<PageResponse<InvoiceView>, InvoiceError> {
        bounded(self.deadline, async {
            let filters = query.filters;
            let mut select =
                invoices::Entity::find().filter(invoices::Column::DestroyedAt.is_null());
            if let Some(id) = filters.organisation_id {
                select = select.filter(invoices::Column::OrganisationId.eq(id));
            }
            if let Some(id) = filters.company_id {
                select = select.filter(invoices::Column::CompanyId.eq(id));
            }
            if let Some(id) = filters.agreement_id {
                select = select.filter(invoices::Column::AgreementId.eq(id));
            }
            if let Some(start) = filters.start {
                select = select.filter(invoices::Column::Date.gte(start));
            }
            if let Some(end) = filters.end {
                select = select.filter(invoices::Column::Date.lte(end));
            }

            let total = select.clone().count(&self.db).await?;
            if total == 0 {
                return Ok(PageResponse::new(Vec::new(), query.page, 0));
            }

            let order = sort_order(query.direction);
            select = select.order_by(sort_column(query.sort), order.clone());
            if query.sort != SortField::Id {
                select = select.order_by(invoices::Column::Id, order);
            }
            let rows = select
                .limit(query.page.limit())
                .offset(query.page.offset())
                .all(&self.db)
                .await?;

            let projections = reference::invoice_projections(&self.db, &rows).await?;
            let views = rows
                .into_iter()
                .map(|row| InvoiceView::new(row, &projections))
                .collect();

            Ok::<_, InvoiceError>(PageResponse::new(views, query.page, total))
        })
        .await
    }

    /// Gets a live invoice with its items and all projections.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` for keys below 1 without touching the
    /// store, or if no live invoice matches.
    pub async fn get(&self, id: InvoiceId) -> Result<InvoiceView, InvoiceError> {
        let id = ensure_invoice_key(id)?;
        bounded(self.deadline, self.load(id)).await
    }

    async fn load(&self, id: i64) -> Result<InvoiceView, InvoiceError> {
        let invoice = find_visible(&self.db, id).await?;
        let items = invoice_item::items_of(&self.db, id).await?;

        let projections =
            reference::invoice_projections(&self.db, std::slice::from_ref(&invoice)).await?;
        let item_projections = reference::item_projections(&self.db, &items).await?;
        let items = items
            .into_iter()
            .map(|item| InvoiceItemView::new(item, &item_projections))
            .collect();

        Ok(InvoiceView::new(invoice, &projections).with_items(items))
    }

    /// Creates an invoice, with optional line items, in one transaction.
    ///
    /// Without an explicit number the organisation row is locked and the next
    /// number derived from its latest invoice, so concurrent creates for one
    /// organisation receive distinct numbers. Totals are reconciled before
    /// commit when items are supplied; otherwise they stay zero.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Validation` for invalid input or an unknown
    /// organisation or VAT rate, and `InvoiceError::Numbering` if the latest
    /// stored number is not numeric.
    pub async fn create(&self, input: CreateInvoiceInput) -> Result<InvoiceView, InvoiceError> {
        let organisation_id = validate_create(&input)?;
        let CreateInvoiceInput {
            header,
            items,
            user_id,
        } = input;

        let invoice_id = bounded(self.deadline, async {
            let txn = self.db.begin().await?;

            if !reference::lock_organisation(&txn, organisation_id).await? {
                return Err(InvoiceError::field("organisation_id", "does not exist"));
            }

            let number = match header.number {
                Some(number) => number,
                None => {
                    let latest = latest_number(&txn, organisation_id).await?;
                    numbering::next_number(latest.as_deref())?
                }
            };

            let now = Utc::now().fixed_offset();
            let invoice = invoices::ActiveModel {
                is_active: Set(header.is_active),
                date: Set(header.date),
                number: Set(number),
                organisation_id: Set(organisation_id),
                bank_account_id: Set(header.bank_account_id),
                company_id: Set(header.company_id),
                agreement_id: Set(header.agreement_id),
                amount: Set(Decimal::ZERO),
                discount: Set(Decimal::ZERO),
                vat: Set(Decimal::ZERO),
                user_id: Set(user_id),
                uuid: Set(Uuid::new_v4()),
                destroyed_at: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            if !items.is_empty() {
                for draft in items {
                    let line = invoice_item::resolve_draft(&txn, draft).await?;
                    invoice_item::insert_line(&txn, invoice.id, &line).await?;
                }
                reconcile(&txn, invoice.id).await?;
            }

            txn.commit().await?;

            info!(
                invoice_id = invoice.id,
                organisation_id,
                number = %invoice.number,
                "Invoice created"
            );
            Ok::<_, InvoiceError>(invoice.id)
        })
        .await?;

        bounded(self.deadline, self.load(invoice_id)).await
    }

    /// Replaces header fields of a live invoice.
    ///
    /// Derived totals are never written here.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` if no live invoice matches, or
    /// `InvoiceError::Validation` if the patched header is invalid.
    pub async fn update(
        &self,
        id: InvoiceId,
        patch: InvoicePatch,
    ) -> Result<InvoiceView, InvoiceError> {
        let id = ensure_invoice_key(id)?;
        validate_invoice_patch(&patch)
            .into_result()
            .map_err(InvoiceError::Validation)?;

        bounded(self.deadline, async {
            let txn = self.db.begin().await?;
            let current = lock_invoice(&txn, id).await?;

            let header = patch.apply(&header_of(&current));
            validate_invoice(&header)
                .into_result()
                .map_err(InvoiceError::Validation)?;

            let organisation_id = header.organisation_id.unwrap_or(current.organisation_id);
            if organisation_id != current.organisation_id
                && !reference::organisation_exists(&txn, organisation_id).await?
            {
                return Err(InvoiceError::field("organisation_id", "does not exist"));
            }

            let number = header.number.unwrap_or_else(|| current.number.clone());
            let mut invoice: invoices::ActiveModel = current.into();
            invoice.is_active = Set(header.is_active);
            invoice.date = Set(header.date);
            invoice.number = Set(number);
            invoice.organisation_id = Set(organisation_id);
            invoice.bank_account_id = Set(header.bank_account_id);
            invoice.company_id = Set(header.company_id);
            invoice.agreement_id = Set(header.agreement_id);
            invoice.updated_at = Set(Utc::now().fixed_offset());
            invoice.update(&txn).await?;

            txn.commit().await?;
            info!(invoice_id = id, "Invoice updated");
            Ok::<_, InvoiceError>(())
        })
        .await?;

        bounded(self.deadline, self.load(id)).await
    }

    /// Hard-deletes a live invoice; its items go with it.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` if no live invoice was deleted.
    pub async fn delete(&self, id: InvoiceId) -> Result<(), InvoiceError> {
        let id = ensure_invoice_key(id)?;

        bounded(self.deadline, async {
            let result = invoices::Entity::delete_many()
                .filter(invoices::Column::Id.eq(id))
                .filter(invoices::Column::DestroyedAt.is_null())
                .exec(&self.db)
                .await?;

            if result.rows_affected == 0 {
                return Err(InvoiceError::NotFound(id));
            }

            info!(invoice_id = id, "Invoice deleted");
            Ok::<_, InvoiceError>(())
        })
        .await
    }

    /// Recomputes and stores the totals of a live invoice.
    ///
    /// Idempotent: with no intervening item change it stores the same totals.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` if no live invoice matches.
    pub async fn recompute_totals(&self, id: InvoiceId) -> Result<InvoiceTotals, InvoiceError> {
        let id = ensure_invoice_key(id)?;

        bounded(self.deadline, async {
            let txn = self.db.begin().await?;
            lock_invoice(&txn, id).await?;
            let totals = reconcile(&txn, id).await.inspect_err(|e| {
                error!(error = %e, invoice_id = id, "Failed to reconcile invoice totals");
            })?;
            txn.commit().await?;

            info!(
                invoice_id = id,
                amount = %totals.amount,
                vat = %totals.vat,
                "Invoice totals recomputed"
            );
            Ok::<_, InvoiceError>(totals)
        })
        .await
    }

    /// Proposes the next number for an organisation.
    ///
    /// Takes no lock; `create` re-derives the number under the organisation
    /// lock.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::OrganisationNotFound` for keys below 1 and
    /// `InvoiceError::Numbering` if the latest stored number is not numeric.
    pub async fn next_number(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<String, InvoiceError> {
        if !organisation_id.is_valid() {
            return Err(InvoiceError::OrganisationNotFound(organisation_id.get()));
        }

        bounded(self.deadline, async {
            let latest = latest_number(&self.db, organisation_id.get()).await?;
            Ok::<_, InvoiceError>(numbering::next_number(latest.as_deref())?)
        })
        .await
    }
}
