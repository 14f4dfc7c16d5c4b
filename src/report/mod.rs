//! Report rendering.
//!
//! Produces the terminal summary and the CSV export.

pub mod export;
pub mod summary;

pub use export::export_csv;
pub use summary::render_summary;
