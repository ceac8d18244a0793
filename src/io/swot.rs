//! SWOT KaRIn granule discovery and netCDF parsing.
//!
//! Granules live under `<root>/<YYYY>/` and follow the PO.DAAC naming scheme
//! `<product>_<cycle>_<pass>_<start>_<end>_<crid>_<counter>.nc`.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use ndarray::{Array1, Array2};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::granule::{Granule, GranuleProvider, NadirLongitude};

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";
const GRANULE_EXTENSION: &str = "nc";

pub const LATITUDE_VAR: &str = "latitude";
pub const LONGITUDE_VAR: &str = "longitude";
pub const NADIR_LONGITUDE_VAR: &str = "longitude_nadir";

/// Errors encountered when locating or reading SWOT granules
#[derive(Debug, Error)]
pub enum SwotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("netCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),
    #[error("Missing variable `{0}` in granule")]
    MissingVariable(&'static str),
    #[error("Variable `{name}` has shape {shape:?}, expected {expected}")]
    Shape {
        name: &'static str,
        shape: Vec<usize>,
        expected: &'static str,
    },
    #[error("Not a SWOT granule file name: {0}")]
    InvalidName(String),
}

/// Fields encoded in a granule file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GranuleName {
    pub product: String,
    pub cycle: u32,
    pub pass: u32,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub crid: String,
    pub counter: String,
}

impl GranuleName {
    pub fn parse(file_name: &str) -> Result<Self, SwotError> {
        let invalid = || SwotError::InvalidName(file_name.to_string());
        let stem = file_name.strip_suffix(".nc").ok_or_else(invalid)?;
        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() < 7 {
            return Err(invalid());
        }
        let n = parts.len();
        let product = parts[..n - 6].join("_");
        let cycle = parts[n - 6].parse().map_err(|_| invalid())?;
        let pass = parts[n - 5].parse().map_err(|_| invalid())?;
        let start = NaiveDateTime::parse_from_str(parts[n - 4], TIMESTAMP_FORMAT)
            .map_err(|_| invalid())?;
        let end = NaiveDateTime::parse_from_str(parts[n - 3], TIMESTAMP_FORMAT)
            .map_err(|_| invalid())?;

        Ok(Self {
            product,
            cycle,
            pass,
            start,
            end,
            crid: parts[n - 2].to_string(),
            counter: parts[n - 1].to_string(),
        })
    }

    /// Acquisition start date, the day a granule is attributed to
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }
}

impl fmt::Display for GranuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{:03}_{:03}_{}_{}_{}_{}.{}",
            self.product,
            self.cycle,
            self.pass,
            self.start.format(TIMESTAMP_FORMAT),
            self.end.format(TIMESTAMP_FORMAT),
            self.crid,
            self.counter,
            GRANULE_EXTENSION
        )
    }
}

/// Year-partitioned granule archive on the local filesystem
#[derive(Debug, Clone)]
pub struct SwotDirectory {
    pub root: PathBuf,
    pub product: String,
}

impl SwotDirectory {
    pub fn new(root: impl Into<PathBuf>, product: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            product: product.into(),
        }
    }

    fn year_dir(&self, date: NaiveDate) -> PathBuf {
        self.root.join(format!("{:04}", date.year()))
    }

    /// Granules of this product starting on `date`, sorted by file name
    pub fn list_granules(&self, date: NaiveDate) -> Result<Vec<PathBuf>, SwotError> {
        let dir = self.year_dir(date);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No year directory {:?}", dir);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match GranuleName::parse(name) {
                Ok(parsed) if parsed.product == self.product && parsed.date() == date => {
                    files.push(path)
                }
                Ok(_) => {}
                Err(_) => debug!("Ignoring non-granule file {:?}", path),
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}

impl GranuleProvider for SwotDirectory {
    fn select_files(&self, date: NaiveDate) -> crate::Result<Vec<PathBuf>> {
        Ok(self.list_granules(date)?)
    }

    fn read_granule(&self, path: &Path) -> crate::Result<Granule> {
        read_granule_file(path)
    }
}

/// Parse one granule: 2D `latitude`/`longitude` plus the nadir longitude when present.
///
/// `longitude_nadir` is either one value per scan line or a full `(num_lines, num_pixels)` field.
pub fn read_granule_file(path: &Path) -> crate::Result<Granule> {
    let file = netcdf::open(path).map_err(SwotError::from)?;

    let latitude = read_field(&file, LATITUDE_VAR)?;
    let longitude = read_field(&file, LONGITUDE_VAR)?;

    let nadir = match file.variable(NADIR_LONGITUDE_VAR) {
        Some(var) => match var.dimensions().len() {
            1 => NadirLongitude::Track(Array1::from(read_scaled(&var)?)),
            2 => NadirLongitude::Field(read_field(&file, NADIR_LONGITUDE_VAR)?),
            _ => {
                return Err(SwotError::Shape {
                    name: NADIR_LONGITUDE_VAR,
                    shape: var.dimensions().iter().map(|d| d.len()).collect(),
                    expected: "(num_lines) or (num_lines, num_pixels)",
                }
                .into());
            }
        },
        None => {
            warn!(
                "{:?} has no `{}`, using the swath row mean as centerline",
                path, NADIR_LONGITUDE_VAR
            );
            NadirLongitude::Field(longitude.clone())
        }
    };

    Granule::new(latitude, longitude, nadir)
}

fn read_field(file: &netcdf::File, name: &'static str) -> Result<Array2<f64>, SwotError> {
    let var = file
        .variable(name)
        .ok_or(SwotError::MissingVariable(name))?;
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if shape.len() != 2 {
        return Err(SwotError::Shape {
            name,
            shape,
            expected: "(num_lines, num_pixels)",
        });
    }
    let (rows, cols) = (shape[0], shape[1]);
    let values = read_scaled(&var)?;
    Array2::from_shape_vec((rows, cols), values).map_err(|_| SwotError::Shape {
        name,
        shape: vec![rows, cols],
        expected: "(num_lines, num_pixels)",
    })
}

/// Raw values with CF packing undone: fill becomes NaN, then `raw * scale_factor + add_offset`
fn read_scaled(var: &netcdf::Variable) -> Result<Vec<f64>, SwotError> {
    let raw: Vec<f64> = var.get_values(..)?;
    let scale = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);
    let fill = get_f64_attr(var, "_FillValue");

    Ok(raw
        .into_iter()
        .map(|v| {
            if fill.is_some_and(|f| v == f) {
                f64::NAN
            } else {
                v * scale + offset
            }
        })
        .collect())
}

fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str =
        "SWOT_L2_LR_SSH_Expert_001_011_20080101T083428_20080101T092554_DG10_01.nc";

    #[test]
    fn test_parse_granule_name() {
        let parsed = GranuleName::parse(NAME).unwrap();
        assert_eq!(parsed.product, "SWOT_L2_LR_SSH_Expert");
        assert_eq!(parsed.cycle, 1);
        assert_eq!(parsed.pass, 11);
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2008, 1, 1).unwrap());
        assert_eq!(parsed.end.format("%H%M%S").to_string(), "092554");
        assert_eq!(parsed.crid, "DG10");
        assert_eq!(parsed.counter, "01");
        assert_eq!(parsed.to_string(), NAME);
    }

    #[test]
    fn test_reject_bad_names() {
        for name in [
            "notes.txt",
            "SWOT_L2_LR_SSH_Expert_001_011_20080101T083428.nc",
            "SWOT_L2_LR_SSH_Expert_xxx_011_20080101T083428_20080101T092554_DG10_01.nc",
            "SWOT_L2_LR_SSH_Expert_001_011_2008-01-01_20080101T092554_DG10_01.nc",
        ] {
            assert!(matches!(GranuleName::parse(name), Err(SwotError::InvalidName(_))), "{}", name);
        }
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_list_granules_filters_date_and_product() {
        let root = tempfile::tempdir().unwrap();
        let year = root.path().join("2008");
        fs::create_dir_all(&year).unwrap();
        touch(&year, "SWOT_L2_LR_SSH_Expert_001_012_20080101T101500_20080101T110600_DG10_01.nc");
        touch(&year, NAME);
        touch(&year, "SWOT_L2_LR_SSH_Expert_001_013_20080102T001500_20080102T010600_DG10_01.nc");
        touch(&year, "SWOT_L2_LR_SSH_Basic_001_011_20080101T083428_20080101T092554_DG10_01.nc");
        touch(&year, "README.md");

        let provider = SwotDirectory::new(root.path(), "SWOT_L2_LR_SSH_Expert");
        let date = NaiveDate::from_ymd_opt(2008, 1, 1).unwrap();
        let files = provider.select_files(date).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                NAME.to_string(),
                "SWOT_L2_LR_SSH_Expert_001_012_20080101T101500_20080101T110600_DG10_01.nc"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_missing_year_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let provider = SwotDirectory::new(root.path(), "SWOT_L2_LR_SSH_Expert");
        let files = provider
            .select_files(NaiveDate::from_ymd_opt(2031, 5, 5).unwrap())
            .unwrap();
        assert!(files.is_empty());
    }

    enum NadirLayout {
        Missing,
        Track,
        Field,
    }

    fn write_granule(path: &Path, nadir: NadirLayout) {
        let mut file = netcdf::create(path).unwrap();
        file.add_dimension("num_lines", 2).unwrap();
        file.add_dimension("num_pixels", 3).unwrap();

        {
            let mut lat = file
                .add_variable::<i32>(LATITUDE_VAR, &["num_lines", "num_pixels"])
                .unwrap();
            lat.put_attribute("_FillValue", i32::MAX).unwrap();
            lat.put_attribute("scale_factor", 1.0e-6f64).unwrap();
            let raw = vec![10_000_000i32, 10_000_000, i32::MAX, 10_500_000, 10_500_000, 10_500_000];
            lat.put_values(&raw, ..).unwrap();
        }
        {
            let mut lon = file
                .add_variable::<f64>(LONGITUDE_VAR, &["num_lines", "num_pixels"])
                .unwrap();
            lon.put_values(&[-90.0, -89.9, -89.8, -90.0, -89.9, -89.8], ..)
                .unwrap();
        }
        match nadir {
            NadirLayout::Missing => {}
            NadirLayout::Track => {
                let mut nadir = file
                    .add_variable::<i32>(NADIR_LONGITUDE_VAR, &["num_lines"])
                    .unwrap();
                nadir.put_attribute("scale_factor", 1.0e-6f64).unwrap();
                nadir.put_attribute("add_offset", -90.0f64).unwrap();
                nadir.put_values(&[100_000i32, 100_000], ..).unwrap();
            }
            NadirLayout::Field => {
                let mut nadir = file
                    .add_variable::<f64>(NADIR_LONGITUDE_VAR, &["num_lines", "num_pixels"])
                    .unwrap();
                nadir.put_values(&[-89.9; 6], ..).unwrap();
            }
        }
    }

    #[test]
    fn test_read_granule_applies_packing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NAME);
        write_granule(&path, NadirLayout::Track);

        let granule = read_granule_file(&path).unwrap();
        assert_eq!(granule.dim(), (2, 3));
        assert!((granule.latitude[[0, 0]] - 10.0).abs() < 1e-9);
        assert!(granule.latitude[[0, 2]].is_nan());
        assert!((granule.latitude[[1, 1]] - 10.5).abs() < 1e-9);
        assert_eq!(granule.longitude[[1, 2]], -89.8);
        match &granule.nadir {
            NadirLongitude::Track(track) => {
                assert_eq!(track.len(), 2);
                assert!((track[0] + 89.9).abs() < 1e-9);
            }
            NadirLongitude::Field(_) => panic!("expected nadir track"),
        }
    }

    #[test]
    fn test_missing_nadir_falls_back_to_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NAME);
        write_granule(&path, NadirLayout::Missing);

        let granule = read_granule_file(&path).unwrap();
        assert!(matches!(granule.nadir, NadirLongitude::Field(_)));
    }

    #[test]
    fn test_two_dimensional_nadir_is_read_as_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NAME);
        write_granule(&path, NadirLayout::Field);

        let granule = read_granule_file(&path).unwrap();
        match &granule.nadir {
            NadirLongitude::Field(field) => {
                assert_eq!(field.dim(), (2, 3));
                assert_eq!(field[[1, 2]], -89.9);
            }
            NadirLongitude::Track(_) => panic!("expected nadir field"),
        }
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NAME);
        fs::write(&path, b"not a netcdf file").unwrap();
        assert!(read_granule_file(&path).is_err());
    }
}
