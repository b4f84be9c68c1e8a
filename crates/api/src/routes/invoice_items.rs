//! Invoice item routes, nested under their invoice.
//!
//! Every mutation answers with the invoice totals it produced.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header::LOCATION},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use billet_core::invoice::{ItemDraft, ItemPatch};
use billet_shared::types::{InvoiceId, InvoiceItemId};

use super::parse_key;
use crate::{AppState, error::ApiError};

/// Creates the invoice item routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/invoices/{invoice_id}/invoice_items",
            get(list_items).post(create_item),
        )
        .route(
            "/invoices/{invoice_id}/invoice_items/{id}",
            get(get_item).patch(update_item).delete(delete_item),
        )
}

fn item_keys(invoice_id: &str, id: &str) -> Result<(InvoiceId, InvoiceItemId), ApiError> {
    Ok((parse_key(invoice_id)?, parse_key(id)?))
}

/// GET `/invoices/{invoice_id}/invoice_items` - List the items of an invoice.
async fn list_items(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.items.list(parse_key(&invoice_id)?).await?;
    Ok(Json(json!({ "data": items })))
}

/// POST `/invoices/{invoice_id}/invoice_items` - Add an item.
async fn create_item(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    Json(draft): Json<ItemDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice_id: InvoiceId = parse_key(&invoice_id)?;
    let created = state.items.create_and_reconcile(invoice_id, draft).await?;

    Ok((
        StatusCode::CREATED,
        [(
            LOCATION,
            format!(
                "/v1/invoices/{}/invoice_items/{}",
                invoice_id, created.item.id
            ),
        )],
        Json(json!({ "data": created.item, "totals": created.totals })),
    ))
}

/// GET `/invoices/{invoice_id}/invoice_items/{id}` - Get one item of an invoice.
async fn get_item(
    State(state): State<AppState>,
    Path((invoice_id, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (invoice_id, id) = item_keys(&invoice_id, &id)?;
    let item = state.items.get(invoice_id, id).await?;
    Ok(Json(json!({ "data": item })))
}

/// PATCH `/invoices/{invoice_id}/invoice_items/{id}` - Update an item.
async fn update_item(
    State(state): State<AppState>,
    Path((invoice_id, id)): Path<(String, String)>,
    Json(patch): Json<ItemPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let (invoice_id, id) = item_keys(&invoice_id, &id)?;
    let updated = state.items.update_and_reconcile(invoice_id, id, patch).await?;
    Ok(Json(json!({ "data": updated.item, "totals": updated.totals })))
}

/// DELETE `/invoices/{invoice_id}/invoice_items/{id}` - Remove an item.
async fn delete_item(
    State(state): State<AppState>,
    Path((invoice_id, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (invoice_id, id) = item_keys(&invoice_id, &id)?;
    let totals = state.items.delete_and_reconcile(invoice_id, id).await?;
    Ok(Json(json!({
        "message": "invoice item successfully deleted",
        "totals": totals
    })))
}
