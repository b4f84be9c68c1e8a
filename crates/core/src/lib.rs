//! Core business logic for Billet.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Invoice numbering, line arithmetic, totals aggregation and input validation
//! live here; persistence and transactions belong to `billet-db`.

pub mod invoice;
