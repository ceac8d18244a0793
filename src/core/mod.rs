//! Core mask-generation building blocks: target grid, granule model, configuration and the
//! per-granule processing chain (normalize, validity, interpolate) folded by the date
//! aggregator. These are internal primitives consumed by the high-level `api` module.
pub mod granule;
pub mod grid;
pub mod params;
pub mod processing;
