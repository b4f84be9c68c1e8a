//! Reference data lookups used to fill invoice forms.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiError};

/// Creates the reference routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/units", get(list_units))
        .route("/vat_rates", get(list_vat_rates))
        .route("/companies/search", get(search_companies))
}

/// Query parameters for company search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search terms.
    #[serde(default)]
    pub q: String,
}

/// GET `/products` - Active products.
async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = state.references.products().await?;
    Ok(Json(json!({ "data": products })))
}

/// GET `/units` - Units of measure.
async fn list_units(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let units = state.references.units().await?;
    Ok(Json(json!({ "data": units })))
}

/// GET `/vat_rates` - Active VAT rates.
async fn list_vat_rates(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rates = state.references.vat_rates().await?;
    Ok(Json(json!({ "data": rates })))
}

/// GET `/companies/search?q=` - Full-text company search.
async fn search_companies(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let companies = state.references.search_companies(&query.q).await?;
    Ok(Json(json!({ "data": companies })))
}
