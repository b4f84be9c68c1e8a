//! Reference data lookups: projections for invoice reads and active lists.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use billet_shared::AppError;

use super::deadline::{DEFAULT_STORE_DEADLINE, DeadlineExceeded, bounded};
use super::views::{
    InvoiceProjections, ItemProjections, Projection, UnitProjection, VatRateProjection,
};
use crate::entities::{
    agreements, bank_accounts, companies, invoice_items, invoices, organisations, products, units,
    vat_rates,
};

/// Maximum number of company search hits.
pub const COMPANY_SEARCH_LIMIT: u64 = 20;

/// Error types for reference lookups.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// Store call exceeded its deadline.
    #[error(transparent)]
    Timeout(#[from] DeadlineExceeded),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ReferenceError> for AppError {
    fn from(err: ReferenceError) -> Self {
        match err {
            ReferenceError::Timeout(e) => Self::Timeout(e.to_string()),
            ReferenceError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Distinct, present keys.
fn keys(ids: impl IntoIterator<Item = Option<i64>>) -> Vec<i64> {
    ids.into_iter()
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Loads rows of `$entity` whose id is in `$ids`, keyed by id.
///
/// Soft-deleted rows are included so historic invoices keep their names.
macro_rules! load_by_ids {
    ($conn:expr, $entity:ident, $ids:expr, |$m:ident| $projection:expr) => {{
        let ids = $ids;
        if ids.is_empty() {
            HashMap::new()
        } else {
            $entity::Entity::find()
                .filter($entity::Column::Id.is_in(ids))
                .all($conn)
                .await?
                .into_iter()
                .map(|$m| ($m.id, $projection))
                .collect::<HashMap<_, _>>()
        }
    }};
}

pub(crate) async fn invoice_projections<C: ConnectionTrait>(
    conn: &C,
    rows: &[invoices::Model],
) -> Result<InvoiceProjections, DbErr> {
    Ok(InvoiceProjections {
        organisations: load_by_ids!(
            conn,
            organisations,
            keys(rows.iter().map(|r| Some(r.organisation_id))),
            |m| Projection { id: m.id, name: m.name }
        ),
        bank_accounts: load_by_ids!(
            conn,
            bank_accounts,
            keys(rows.iter().map(|r| r.bank_account_id)),
            |m| Projection { id: m.id, name: m.name }
        ),
        companies: load_by_ids!(
            conn,
            companies,
            keys(rows.iter().map(|r| r.company_id)),
            |m| Projection { id: m.id, name: m.name }
        ),
        agreements: load_by_ids!(
            conn,
            agreements,
            keys(rows.iter().map(|r| r.agreement_id)),
            |m| Projection { id: m.id, name: m.name }
        ),
    })
}

pub(crate) async fn item_projections<C: ConnectionTrait>(
    conn: &C,
    rows: &[invoice_items::Model],
) -> Result<ItemProjections, DbErr> {
    Ok(ItemProjections {
        products: load_by_ids!(
            conn,
            products,
            keys(rows.iter().map(|r| Some(r.product_id))),
            |m| Projection { id: m.id, name: m.name }
        ),
        units: load_by_ids!(
            conn,
            units,
            keys(rows.iter().map(|r| r.unit_id)),
            |m| UnitProjection {
                id: m.id,
                code: m.code,
                name: m.name
            }
        ),
        vat_rates: load_by_ids!(
            conn,
            vat_rates,
            keys(rows.iter().map(|r| r.vat_rate_id)),
            |m| VatRateProjection {
                id: m.id,
                rate: m.rate,
                name: m.name
            }
        ),
    })
}

/// Percentage of a VAT rate, or `None` if no such rate exists.
pub(crate) async fn vat_rate_percentage<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<Option<Decimal>, DbErr> {
    Ok(vat_rates::Entity::find_by_id(id)
        .one(conn)
        .await?
        .map(|rate| rate.rate))
}

/// Takes a row lock on a live organisation; false if there is none.
pub(crate) async fn lock_organisation<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<bool, DbErr> {
    Ok(organisations::Entity::find_by_id(id)
        .filter(organisations::Column::DestroyedAt.is_null())
        .lock_exclusive()
        .one(conn)
        .await?
        .is_some())
}

/// Returns true if a live organisation with `id` exists.
pub(crate) async fn organisation_exists<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<bool, DbErr> {
    Ok(organisations::Entity::find_by_id(id)
        .filter(organisations::Column::DestroyedAt.is_null())
        .one(conn)
        .await?
        .is_some())
}

/// Reference repository for the lookup endpoints.
#[derive(Debug, Clone)]
pub struct ReferenceRepository {
    db: DatabaseConnection,
    deadline: Duration,
}

impl ReferenceRepository {
    /// Creates a new reference repository.
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

    /// Lists active products by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or times out.
    pub async fn products(&self) -> Result<Vec<Projection>, ReferenceError> {
        bounded(self.deadline, async {
            let rows = products::Entity::find()
                .filter(products::Column::DestroyedAt.is_null())
                .filter(products::Column::IsActive.eq(true))
                .order_by_asc(products::Column::Name)
                .all(&self.db)
                .await?;
            Ok::<_, ReferenceError>(rows
                .into_iter()
                .map(|m| Projection {
                    id: m.id,
                    name: m.name,
                })
                .collect())
        })
        .await
    }

    /// Lists live units by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or times out.
    pub async fn units(&self) -> Result<Vec<UnitProjection>, ReferenceError> {
        bounded(self.deadline, async {
            let rows = units::Entity::find()
                .filter(units::Column::DestroyedAt.is_null())
                .order_by_asc(units::Column::Name)
                .all(&self.db)
                .await?;
            Ok::<_, ReferenceError>(rows
                .into_iter()
                .map(|m| UnitProjection {
                    id: m.id,
                    code: m.code,
                    name: m.name,
                })
                .collect())
        })
        .await
    }

    /// Lists active VAT rates by rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or times out.
    pub async fn vat_rates(&self) -> Result<Vec<VatRateProjection>, ReferenceError> {
        bounded(self.deadline, async {
            let rows = vat_rates::Entity::find()
                .filter(vat_rates::Column::DestroyedAt.is_null())
                .filter(vat_rates::Column::IsActive.eq(true))
                .order_by_asc(vat_rates::Column::Rate)
                .all(&self.db)
                .await?;
            Ok::<_, ReferenceError>(rows
                .into_iter()
                .map(|m| VatRateProjection {
                    id: m.id,
                    rate: m.rate,
                    name: m.name,
                })
                .collect())
        })
        .await
    }

    /// Full-text search over company names.
    ///
    /// Uses the `simple` text search configuration, so matching is per word
    /// without stemming.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or times out.
    pub async fn search_companies(&self, query: &str) -> Result<Vec<Projection>, ReferenceError> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        bounded(self.deadline, async {
            let rows = companies::Entity::find()
                .filter(Expr::cust_with_values(
                    "to_tsvector('simple', name) @@ plainto_tsquery('simple', $1)",
                    [query],
                ))
                .filter(companies::Column::DestroyedAt.is_null())
                .order_by_asc(companies::Column::Name)
                .limit(COMPANY_SEARCH_LIMIT)
                .all(&self.db)
                .await?;
            Ok::<_, ReferenceError>(rows
                .into_iter()
                .map(|m| Projection {
                    id: m.id,
                    name: m.name,
                })
                .collect())
        })
        .await
    }
}
