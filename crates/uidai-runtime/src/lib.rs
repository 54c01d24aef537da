//! Session layer for the UIDAI dashboard.
//!
//! Keeps the loaded datasets cached for the lifetime of a session and
//! recomputes the dashboard views whenever the filter changes.

pub mod data_manager;
pub mod session;

pub use uidai_core as core;
pub use uidai_data as data;
