//! Domain model and shared helpers for the identity-program dashboard.
//!
//! Holds the record and dataset types, the error enum, row normalisation,
//! descriptive statistics, ratio formulas, number formatting and CLI
//! settings used by the other dashboard crates.

pub mod calculations;
pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod stats;

pub use error::{DashboardError, Result};
