//! Incident record source.

pub mod fetcher;

pub use fetcher::{RecordSource, SourceConfig, DEFAULT_SOURCE_URL};
