//! API route definitions.

use std::str::FromStr;

use axum::{Router, middleware};

use crate::{AppState, error::ApiError, middleware::auth_middleware};

pub mod health;
pub mod invoice_items;
pub mod invoices;
pub mod references;

/// Creates the API router; everything but health requires a bearer token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(invoices::routes())
        .merge(invoice_items::routes())
        .merge(references::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// Parses a path key; anything that is not an integer is a 404.
pub(crate) fn parse_key<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found())
}
