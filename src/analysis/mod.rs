//! Analysis modules.
//!
//! Aggregation of fetched problems into summary statistics.

pub mod aggregator;

pub use aggregator::*;
