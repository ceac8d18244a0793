//! Per-granule processing chain and the per-date fold.
pub mod aggregate;
pub mod interpolate;
pub mod normalize;
pub mod validity;
