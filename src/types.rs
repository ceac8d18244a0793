//! Shared types and enums used across SWOTMASK.
//! Includes `InterpolationMethod`, `GapDetection`, `GapFill`, `OutputFormat` and the
//! derived `PassDirection`.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Scatter-to-grid resampling method
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum InterpolationMethod {
    /// Delaunay triangulation + barycentric blend, fill outside the convex hull
    Linear,
    /// Nearest sample within a maximum distance (k-d tree)
    Nearest,
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpolationMethod::Linear => write!(f, "Linear"),
            InterpolationMethod::Nearest => write!(f, "Nearest"),
        }
    }
}

/// How the nadir centerline column is located in each scan row
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum GapDetection {
    /// Column closest to the granule's nadir longitude
    Nadir,
    /// Column closest to the row's mean swath longitude
    RowMean,
}

impl std::fmt::Display for GapDetection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GapDetection::Nadir => write!(f, "Nadir"),
            GapDetection::RowMean => write!(f, "RowMean"),
        }
    }
}

/// Value written into the validity field inside the nadir gap
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum GapFill {
    Zero,
    /// NaN poisons every triangle touching the gap, which widens the excluded band
    Nan,
}

impl GapFill {
    pub fn value(self) -> f64 {
        match self {
            GapFill::Zero => 0.0,
            GapFill::Nan => f64::NAN,
        }
    }
}

impl std::fmt::Display for GapFill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GapFill::Zero => write!(f, "Zero"),
            GapFill::Nan => write!(f, "Nan"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum OutputFormat {
    #[value(name = "netcdf")]
    NetCdf,
    Tiff,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::NetCdf => "nc",
            OutputFormat::Tiff => "tiff",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::NetCdf => write!(f, "NetCDF"),
            OutputFormat::Tiff => write!(f, "GeoTIFF"),
        }
    }
}

/// Along-track direction of a pass, derived from the first column's latitudes
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PassDirection {
    Ascending,
    Descending,
}

impl std::fmt::Display for PassDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassDirection::Ascending => write!(f, "Ascending"),
            PassDirection::Descending => write!(f, "Descending"),
        }
    }
}
