use gdal::DriverManager;
use gdal::raster::{Buffer, ColorInterpretation};
use gdal::spatial_ref::SpatialRef;
use gdal::Dataset;
use ndarray::{Array2, s};
use std::path::Path;

use crate::core::grid::Grid;

pub const WGS84_EPSG: u32 = 4326;

/// Write a binary mask as a single-band u8 GeoTIFF in EPSG:4326.
///
/// Mask row 0 is the southernmost latitude; rows are flipped so the raster is north-up.
pub fn write_mask_tiff(
    output: &Path,
    grid: &Grid,
    mask: &Array2<u8>,
) -> Result<Dataset, Box<dyn std::error::Error>> {
    let (rows, cols) = mask.dim();
    if (rows, cols) != grid.shape() {
        return Err(format!(
            "mask shape {:?} does not match grid shape {:?}",
            mask.dim(),
            grid.shape()
        )
        .into());
    }
    let north_up: Vec<u8> = mask.slice(s![..;-1, ..]).iter().copied().collect();

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create_with_band_type::<u8, _>(output, cols, rows, 1)?;
    ds.set_geo_transform(&grid.geotransform())?;
    let srs = SpatialRef::from_epsg(WGS84_EPSG)?;
    ds.set_spatial_ref(&srs)?;

    {
        let mut band = ds.rasterband(1)?;
        band.set_color_interpretation(ColorInterpretation::GrayIndex)?;
        let mut buf = Buffer::new((cols, rows), north_up);
        band.write((0, 0), (cols, rows), &mut buf)?;
    }
    Ok(ds)
}
