//! Analysis modules.
//!
//! Aggregation builds the chart tables; geo classification builds the
//! map points and legend.

pub mod aggregator;
pub mod geo;

pub use aggregator::*;
pub use geo::{classify, GeoClassification, DEFAULT_LEGEND_SIZE};
