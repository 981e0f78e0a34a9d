//! Report generation modules.

pub mod generator;
pub mod geojson;

pub use generator::*;
pub use geojson::write_geojson;
