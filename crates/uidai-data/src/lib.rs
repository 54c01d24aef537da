//! Analytics pipeline for the UIDAI dashboard.
//!
//! Loads the enrolment, biometric-update and demographic-update CSV
//! extracts, groups them by region and month, derives the pressure,
//! saturation, anomaly and growth metrics, and turns those into
//! recommendation directives.

pub mod aggregator;
pub mod analysis;
pub mod metrics;
pub mod reader;
pub mod recommendations;

pub use uidai_core as core;
