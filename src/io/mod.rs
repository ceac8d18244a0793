//! I/O layer: SWOT granule discovery and netCDF parsing in `swot`, and `writers` for
//! netCDF/GeoTIFF mask products and provenance metadata.
pub mod swot;
pub use swot::{GranuleName, SwotDirectory, SwotError, read_granule_file};

pub mod writers;
