//! Invoice routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header::LOCATION},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use billet_core::invoice::{InvoiceHeader, InvoicePatch, ItemDraft, ListParams};
use billet_db::CreateInvoiceInput;
use billet_shared::types::InvoiceId;

use super::parse_key;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the invoice routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/invoices/{id}",
            get(get_invoice).patch(update_invoice).delete(delete_invoice),
        )
        .route("/invoices/{id}/recompute", post(recompute_invoice))
}

/// Invoice fields accepted on create, with optional nested items.
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceBody {
    /// Header fields.
    #[serde(flatten)]
    pub header: InvoiceHeader,
    /// Line items created together with the header.
    #[serde(default)]
    pub invoice_items: Vec<ItemDraft>,
}

/// Request body for creating an invoice.
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    /// The invoice.
    pub invoice: CreateInvoiceBody,
}

/// Request body for updating an invoice.
#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceRequest {
    /// Fields to change.
    pub invoice: InvoicePatch,
}

/// GET `/invoices` - List live invoices with paging, sorting and filters.
async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.parse()?;
    let page = state.invoices.list(&query).await?;

    Ok(Json(page))
}

/// GET `/invoices/{id}` - Get an invoice with its items.
async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: InvoiceId = parse_key(&id)?;
    let invoice = state.invoices.get(id).await?;

    Ok(Json(json!({ "data": invoice })))
}

/// POST `/invoices` - Create an invoice, numbering it when no number is given.
async fn create_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let CreateInvoiceBody {
        header,
        invoice_items,
    } = payload.invoice;

    let invoice = state
        .invoices
        .create(CreateInvoiceInput {
            header,
            items: invoice_items,
            user_id: Some(auth.user_id()),
        })
        .await?;

    info!(
        invoice_id = invoice.id,
        user_id = auth.user_id(),
        "Invoice created via API"
    );

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/v1/invoices/{}", invoice.id))],
        Json(json!({ "data": invoice })),
    ))
}

/// PATCH `/invoices/{id}` - Update header fields; totals are left alone.
async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id: InvoiceId = parse_key(&id)?;
    let invoice = state.invoices.update(id, payload.invoice).await?;

    Ok(Json(json!({ "data": invoice })))
}

/// DELETE `/invoices/{id}` - Delete an invoice and its items.
async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: InvoiceId = parse_key(&id)?;
    state.invoices.delete(id).await?;

    Ok(Json(json!({ "message": "invoice successfully deleted" })))
}

/// POST `/invoices/{id}/recompute` - Recompute totals from the current items.
async fn recompute_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: InvoiceId = parse_key(&id)?;
    let totals = state.invoices.recompute_totals(id).await?;

    Ok(Json(json!({ "data": totals })))
}
