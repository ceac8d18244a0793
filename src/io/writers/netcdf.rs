//! CF-1.7 netCDF mask files: one file per date (`date` dimension of length 1) or a merged
//! `(date, lat, lon)` time series. Both share one layout so merged files read back the same way.
use std::path::Path;

use chrono::{NaiveDate, Utc};
use ndarray::Array2;
use tracing::info;

use crate::core::grid::Grid;
use crate::core::params::ExportAttributes;
use crate::error::{Error, Result};

pub const DATE_DIM: &str = "date";
pub const LAT_DIM: &str = "lat";
pub const LON_DIM: &str = "lon";
pub const MASK_VAR: &str = "mask";

const CRS: &str = "EPSG:4326";
const DATE_UNITS: &str = "days since 1970-01-01";

/// File name prefix of per-date mask products, `swotmask_<YYYYMMDD>.<ext>`
pub const MASK_FILE_PREFIX: &str = "swotmask";

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

/// One per-date mask as stored on disk
#[derive(Debug, Clone)]
pub struct StoredMask {
    pub grid: Grid,
    pub mask: Array2<u8>,
}

/// Write `masks[i]` for `dates[i]` into one netCDF file
pub fn write_mask_series(
    output: &Path,
    grid: &Grid,
    dates: &[NaiveDate],
    masks: &[&Array2<u8>],
    attributes: &ExportAttributes,
) -> Result<()> {
    if dates.len() != masks.len() {
        return Err(Error::shape_mismatch("mask series", dates.len(), masks.len()));
    }
    if let Some(bad) = masks.iter().find(|m| m.dim() != grid.shape()) {
        return Err(Error::shape_mismatch("mask", grid.shape(), bad.dim()));
    }

    let mut file = netcdf::create(output)?;
    file.add_dimension(DATE_DIM, dates.len())?;
    file.add_dimension(LAT_DIM, grid.lat().len())?;
    file.add_dimension(LON_DIM, grid.lon().len())?;

    {
        let mut date_var = file.add_variable::<i32>(DATE_DIM, &[DATE_DIM])?;
        date_var.put_attribute("standard_name", "time")?;
        date_var.put_attribute("long_name", "Date")?;
        date_var.put_attribute("units", DATE_UNITS)?;
        date_var.put_attribute("calendar", "standard")?;
        date_var.put_attribute("axis", "T")?;
        let days: Vec<i32> = dates.iter().map(|&d| days_since_epoch(d)).collect();
        date_var.put_values(&days, ..)?;
    }

    {
        let mut lat_var = file.add_variable::<f64>(LAT_DIM, &[LAT_DIM])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_attribute("long_name", "Latitude")?;
        lat_var.put_attribute("standard_name", "latitude")?;
        lat_var.put_attribute("axis", "Y")?;
        lat_var.put_attribute("valid_min", -90.0)?;
        lat_var.put_attribute("valid_max", 90.0)?;
        lat_var.put_attribute("crs", CRS)?;
        lat_var.put_values(&grid.lat().to_vec(), ..)?;
    }

    {
        let mut lon_var = file.add_variable::<f64>(LON_DIM, &[LON_DIM])?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put_attribute("long_name", "Longitude")?;
        lon_var.put_attribute("standard_name", "longitude")?;
        lon_var.put_attribute("axis", "X")?;
        lon_var.put_attribute("valid_min", -180.0)?;
        lon_var.put_attribute("valid_max", 180.0)?;
        lon_var.put_attribute("crs", CRS)?;
        lon_var.put_values(&grid.lon().to_vec(), ..)?;
    }

    {
        let mut mask_var = file.add_variable::<i8>(MASK_VAR, &[DATE_DIM, LAT_DIM, LON_DIM])?;
        mask_var.put_attribute("long_name", "SWOT mask")?;
        mask_var.put_attribute("description", attributes.comment.as_str())?;
        mask_var.put_attribute("units", "1")?;
        mask_var.put_attribute("coordinates", "lat lon")?;
        mask_var.put_attribute("crs", CRS)?;
        mask_var.put_attribute("valid_range", vec![0i8, 1])?;
        let values: Vec<i8> = masks
            .iter()
            .flat_map(|m| m.iter().map(|&v| v as i8))
            .collect();
        mask_var.put_values(&values, ..)?;
    }

    file.add_attribute("Conventions", "CF-1.7")?;
    file.add_attribute("title", attributes.title.as_str())?;
    if !attributes.institution.is_empty() {
        file.add_attribute("institution", attributes.institution.as_str())?;
    }
    file.add_attribute("source", attributes.source.as_str())?;
    file.add_attribute("comment", attributes.comment.as_str())?;
    file.add_attribute(
        "history",
        format!("Created on {}", Utc::now().format("%Y-%m-%d")).as_str(),
    )?;

    info!("Wrote {} mask(s) to {:?}", dates.len(), output);
    Ok(())
}

/// Single-date file with a `date` dimension of length 1
pub fn write_date_mask(
    output: &Path,
    grid: &Grid,
    date: NaiveDate,
    mask: &Array2<u8>,
    attributes: &ExportAttributes,
) -> Result<()> {
    write_mask_series(output, grid, &[date], &[mask], attributes)
}

/// Read a per-date mask file; the first date slice is returned for multi-date files
pub fn read_mask_file(path: &Path) -> Result<StoredMask> {
    let file = netcdf::open(path)?;
    let axis = |name: &str| -> Result<Vec<f64>> {
        let var = file
            .variable(name)
            .ok_or_else(|| Error::Processing(format!("{:?} has no `{}` variable", path, name)))?;
        Ok(var.get_values::<f64, _>(..)?)
    };
    let grid = Grid::new(axis(LAT_DIM)?, axis(LON_DIM)?)?;

    let var = file
        .variable(MASK_VAR)
        .ok_or_else(|| Error::Processing(format!("{:?} has no `{}` variable", path, MASK_VAR)))?;
    let values: Vec<i8> = var.get_values(..)?;
    let (rows, cols) = grid.shape();
    if values.len() < rows * cols {
        return Err(Error::shape_mismatch("stored mask", rows * cols, values.len()));
    }
    let mask = Array2::from_shape_vec(
        (rows, cols),
        values[..rows * cols].iter().map(|&v| u8::from(v > 0)).collect(),
    )
    .map_err(|e| Error::Processing(e.to_string()))?;

    Ok(StoredMask { grid, mask })
}

/// Per-date output file name, e.g. `swotmask_20240901.nc`
pub fn mask_file_name(date: NaiveDate, extension: &str) -> String {
    format!("{}_{}.{}", MASK_FILE_PREFIX, date.format("%Y%m%d"), extension)
}

/// Date encoded in a per-date mask file name
pub fn mask_file_date(file_name: &str) -> Option<NaiveDate> {
    let rest = file_name.strip_prefix(MASK_FILE_PREFIX)?.strip_prefix('_')?;
    let digits = rest.get(..8)?;
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}
