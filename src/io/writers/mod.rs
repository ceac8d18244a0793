pub mod metadata;
pub mod netcdf;
pub mod tiff;
