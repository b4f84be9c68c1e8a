//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for invoices, their items and reference lookups
//! - Bearer token authentication middleware
//! - Error to JSON response mapping

pub mod error;
pub mod middleware;
pub mod routes;

pub use error::ApiError;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use billet_db::{InvoiceItemRepository, InvoiceRepository, ReferenceRepository};
use billet_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Invoice header store.
    pub invoices: InvoiceRepository,
    /// Invoice item store.
    pub items: InvoiceItemRepository,
    /// Reference data lookups.
    pub references: ReferenceRepository,
}

impl AppState {
    /// Builds the repositories over one connection pool, each bounded by
    /// `store_deadline` per call.
    #[must_use]
    pub fn new(db: DatabaseConnection, jwt_service: JwtService, store_deadline: Duration) -> Self {
        Self {
            jwt_service: Arc::new(jwt_service),
            invoices: InvoiceRepository::new(db.clone()).with_deadline(store_deadline),
            items: InvoiceItemRepository::new(db.clone()).with_deadline(store_deadline),
            references: ReferenceRepository::new(db).with_deadline(store_deadline),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
