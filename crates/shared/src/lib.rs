//! Shared types, errors, and configuration for Billet.
//!
//! This crate provides common types used across all other crates:
//! - Typed numeric IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error taxonomy
//! - Configuration management
//! - Bearer token claims and validation

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult, FieldErrors};
pub use jwt::{JwtConfig, JwtError, JwtService};
