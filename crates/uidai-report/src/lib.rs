//! Text and JSON output for the UIDAI dashboard views.

pub mod json;
pub mod table;
pub mod text;

pub use json::render_json;
pub use text::{render_inspector, render_text};
