//! In-memory granule model and the collaborator seam that supplies granules for a date.
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use ndarray::{Array1, Array2};

use crate::error::{Error, Result};

/// Source of the nadir centerline for a granule
#[derive(Debug, Clone)]
pub enum NadirLongitude {
    /// One sub-satellite longitude per scan row
    Track(Array1<f64>),
    /// Full 2D longitude field; the centerline follows each row's mean
    Field(Array2<f64>),
}

impl NadirLongitude {
    pub fn rows(&self) -> usize {
        match self {
            NadirLongitude::Track(track) => track.len(),
            NadirLongitude::Field(field) => field.nrows(),
        }
    }
}

/// One satellite pass: per-pixel geolocation (scan × cross-track) plus the nadir reference
#[derive(Debug, Clone)]
pub struct Granule {
    pub latitude: Array2<f64>,
    pub longitude: Array2<f64>,
    pub nadir: NadirLongitude,
}

impl Granule {
    pub fn new(latitude: Array2<f64>, longitude: Array2<f64>, nadir: NadirLongitude) -> Result<Self> {
        if latitude.dim() != longitude.dim() {
            return Err(Error::shape_mismatch(
                "granule longitude",
                latitude.dim(),
                longitude.dim(),
            ));
        }
        if nadir.rows() != latitude.nrows() {
            return Err(Error::shape_mismatch(
                "granule nadir rows",
                latitude.nrows(),
                nadir.rows(),
            ));
        }
        Ok(Self {
            latitude,
            longitude,
            nadir,
        })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.latitude.dim()
    }
}

/// File discovery and parsing collaborator consumed by the date aggregator
pub trait GranuleProvider {
    /// Granule files whose acquisition starts on `date`, in processing order
    fn select_files(&self, date: NaiveDate) -> Result<Vec<PathBuf>>;

    fn read_granule(&self, path: &Path) -> Result<Granule>;
}
