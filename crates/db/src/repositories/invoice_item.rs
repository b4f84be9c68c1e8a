//! Invoice item repository.
//!
//! Every mutation runs together with totals reconciliation in one
//! transaction that holds the parent invoice's row lock. The raw item writes
//! are private to this crate, so no caller can change an item without the
//! invoice totals following.

use std::time::Duration;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use billet_core::invoice::{
    InvoiceLine, InvoiceTotals, ItemDraft, ItemPatch, validate_item, validate_item_patch,
};
use billet_shared::types::{InvoiceId, InvoiceItemId};

use super::deadline::{DEFAULT_STORE_DEADLINE, bounded};
use super::invoice::{InvoiceError, ensure_invoice_key, find_visible, lock_invoice, reconcile};
use super::reference;
use super::views::{InvoiceItemView, line_of};
use crate::entities::invoice_items;

/// A line item after a mutation, with the invoice totals it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledItem {
    /// The stored item.
    pub item: InvoiceItemView,
    /// Invoice totals after reconciliation.
    pub totals: InvoiceTotals,
}

fn ensure_keys(invoice_id: InvoiceId, id: InvoiceItemId) -> Result<(i64, i64), InvoiceError> {
    let invoice_id = ensure_invoice_key(invoice_id)?;
    if id.is_valid() {
        Ok((invoice_id, id.get()))
    } else {
        Err(InvoiceError::ItemNotFound {
            invoice_id,
            item_id: id.get(),
        })
    }
}

/// Items of one invoice in display order.
pub(crate) async fn items_of<C: ConnectionTrait>(
    conn: &C,
    invoice_id: i64,
) -> Result<Vec<invoice_items::Model>, DbErr> {
    invoice_items::Entity::find()
        .filter(invoice_items::Column::InvoiceId.eq(invoice_id))
        .order_by_asc(invoice_items::Column::Position)
        .order_by_asc(invoice_items::Column::Id)
        .all(conn)
        .await
}

/// Finds an item only if it belongs to `invoice_id`.
async fn find_scoped<C: ConnectionTrait>(
    conn: &C,
    invoice_id: i64,
    id: i64,
) -> Result<invoice_items::Model, InvoiceError> {
    invoice_items::Entity::find_by_id(id)
        .filter(invoice_items::Column::InvoiceId.eq(invoice_id))
        .one(conn)
        .await?
        .ok_or(InvoiceError::ItemNotFound {
            invoice_id,
            item_id: id,
        })
}

/// Fills in a draft's derived values, looking up its VAT rate when needed.
pub(crate) async fn resolve_draft<C: ConnectionTrait>(
    conn: &C,
    draft: ItemDraft,
) -> Result<InvoiceLine, InvoiceError> {
    let vat_rate = match draft.vat_rate_id {
        Some(id) if draft.needs_vat_rate() => Some(
            reference::vat_rate_percentage(conn, id)
                .await?
                .ok_or_else(|| InvoiceError::field("vat_rate_id", "does not exist"))?,
        ),
        _ => None,
    };

    draft.resolve(vat_rate).map_err(InvoiceError::Validation)
}

pub(crate) async fn insert_line<C: ConnectionTrait>(
    conn: &C,
    invoice_id: i64,
    line: &InvoiceLine,
) -> Result<invoice_items::Model, DbErr> {
    let now = Utc::now().fixed_offset();
    invoice_items::ActiveModel {
        invoice_id: Set(invoice_id),
        position: Set(line.position),
        product_id: Set(line.product_id),
        description: Set(line.description.clone()),
        unit_id: Set(line.unit_id),
        quantity: Set(line.quantity),
        price: Set(line.price),
        amount: Set(line.amount),
        discount_rate: Set(line.discount_rate),
        discount: Set(line.discount),
        vat_rate_id: Set(line.vat_rate_id),
        vat: Set(line.vat),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
}

async fn update_line<C: ConnectionTrait>(
    conn: &C,
    current: invoice_items::Model,
    line: &InvoiceLine,
) -> Result<invoice_items::Model, DbErr> {
    let mut item: invoice_items::ActiveModel = current.into();
    item.position = Set(line.position);
    item.product_id = Set(line.product_id);
    item.description = Set(line.description.clone());
    item.unit_id = Set(line.unit_id);
    item.quantity = Set(line.quantity);
    item.price = Set(line.price);
    item.amount = Set(line.amount);
    item.discount_rate = Set(line.discount_rate);
    item.discount = Set(line.discount);
    item.vat_rate_id = Set(line.vat_rate_id);
    item.vat = Set(line.vat);
    item.updated_at = Set(Utc::now().fixed_offset());
    item.update(conn).await
}

async fn delete_line<C: ConnectionTrait>(
    conn: &C,
    invoice_id: i64,
    id: i64,
) -> Result<u64, DbErr> {
    let result = invoice_items::Entity::delete_many()
        .filter(invoice_items::Column::Id.eq(id))
        .filter(invoice_items::Column::InvoiceId.eq(invoice_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Invoice item repository.
#[derive(Debug, Clone)]
pub struct InvoiceItemRepository {
    db: DatabaseConnection,
    deadline: Duration,
}

impl InvoiceItemRepository {
    /// Creates a new invoice item repository.
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

    async fn view(&self, item: invoice_items::Model) -> Result<InvoiceItemView, InvoiceError> {
        let projections =
            reference::item_projections(&self.db, std::slice::from_ref(&item)).await?;
        Ok(InvoiceItemView::new(item, &projections))
    }

    /// Lists the items of a live invoice.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` if no live invoice matches.
    pub async fn list(&self, invoice_id: InvoiceId) -> Result<Vec<InvoiceItemView>, InvoiceError> {
        let invoice_id = ensure_invoice_key(invoice_id)?;

        bounded(self.deadline, async {
            find_visible(&self.db, invoice_id).await?;
            let items = items_of(&self.db, invoice_id).await?;
            let projections = reference::item_projections(&self.db, &items).await?;
            Ok::<_, InvoiceError>(items
                .into_iter()
                .map(|item| InvoiceItemView::new(item, &projections))
                .collect())
        })
        .await
    }

    /// Gets one item of a live invoice.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::ItemNotFound` if the item belongs to another
    /// invoice or does not exist.
    pub async fn get(
        &self,
        invoice_id: InvoiceId,
        id: InvoiceItemId,
    ) -> Result<InvoiceItemView, InvoiceError> {
        let (invoice_id, id) = ensure_keys(invoice_id, id)?;

        bounded(self.deadline, async {
            find_visible(&self.db, invoice_id).await?;
            let item = find_scoped(&self.db, invoice_id, id).await?;
            self.view(item).await
        })
        .await
    }

    /// Adds an item to a live invoice and reconciles its totals.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Validation` for invalid input or an unknown VAT
    /// rate, and `InvoiceError::NotFound` if no live invoice matches.
    pub async fn create_and_reconcile(
        &self,
        invoice_id: InvoiceId,
        draft: ItemDraft,
    ) -> Result<ReconciledItem, InvoiceError> {
        let invoice_id = ensure_invoice_key(invoice_id)?;
        validate_item(&draft)
            .into_result()
            .map_err(InvoiceError::Validation)?;

        let (item, totals) = bounded(self.deadline, async {
            let txn = self.db.begin().await?;
            lock_invoice(&txn, invoice_id).await?;

            let line = resolve_draft(&txn, draft).await?;
            let item = insert_line(&txn, invoice_id, &line).await?;
            let totals = reconcile(&txn, invoice_id).await?;

            txn.commit().await?;
            Ok::<_, InvoiceError>((item, totals))
        })
        .await?;

        info!(invoice_id, item_id = item.id, "Invoice item created");
        let item = bounded(self.deadline, self.view(item)).await?;
        Ok(ReconciledItem { item, totals })
    }

    /// Applies a patch to an item of a live invoice and reconciles its totals.
    ///
    /// Derived values whose inputs changed are recomputed unless supplied.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::ItemNotFound` if the item is not on this invoice,
    /// or `InvoiceError::Validation` if the patched item is invalid.
    pub async fn update_and_reconcile(
        &self,
        invoice_id: InvoiceId,
        id: InvoiceItemId,
        patch: ItemPatch,
    ) -> Result<ReconciledItem, InvoiceError> {
        let (invoice_id, id) = ensure_keys(invoice_id, id)?;
        validate_item_patch(&patch)
            .into_result()
            .map_err(InvoiceError::Validation)?;

        let (item, totals) = bounded(self.deadline, async {
            let txn = self.db.begin().await?;
            lock_invoice(&txn, invoice_id).await?;

            let current = find_scoped(&txn, invoice_id, id).await?;
            let line = resolve_draft(&txn, patch.apply(&line_of(&current))).await?;
            let item = update_line(&txn, current, &line).await?;
            let totals = reconcile(&txn, invoice_id).await?;

            txn.commit().await?;
            Ok::<_, InvoiceError>((item, totals))
        })
        .await?;

        info!(invoice_id, item_id = id, "Invoice item updated");
        let item = bounded(self.deadline, self.view(item)).await?;
        Ok(ReconciledItem { item, totals })
    }

    /// Removes an item from a live invoice and reconciles its totals.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::ItemNotFound` if the item is not on this invoice.
    pub async fn delete_and_reconcile(
        &self,
        invoice_id: InvoiceId,
        id: InvoiceItemId,
    ) -> Result<InvoiceTotals, InvoiceError> {
        let (invoice_id, id) = ensure_keys(invoice_id, id)?;

        bounded(self.deadline, async {
            let txn = self.db.begin().await?;
            lock_invoice(&txn, invoice_id).await?;

            if delete_line(&txn, invoice_id, id).await? == 0 {
                return Err(InvoiceError::ItemNotFound {
                    invoice_id,
                    item_id: id,
                });
            }
            let totals = reconcile(&txn, invoice_id).await?;

            txn.commit().await?;
            info!(invoice_id, item_id = id, "Invoice item deleted");
            Ok::<_, InvoiceError>(totals)
        })
        .await
    }
}
