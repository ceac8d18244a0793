use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{GapDetection, GapFill, InterpolationMethod, OutputFormat};

/// Equirectangular target grid as `numpy.arange`-style axes: `start` inclusive, `stop` exclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub lat_start: f64,
    pub lat_stop: f64,
    pub lon_start: f64,
    pub lon_stop: f64,
    /// Node spacing in degrees, shared by both axes
    pub step: f64,
}

impl Default for GridSpec {
    /// Gulf of Mexico at 2 arc-minutes
    fn default() -> Self {
        Self {
            lat_start: 17.5,
            lat_stop: 33.5,
            lon_start: -98.4,
            lon_stop: -73.5,
            step: 2.0 / 60.0,
        }
    }
}

/// Fixed descriptive attributes written into exported files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportAttributes {
    pub title: String,
    pub institution: String,
    pub source: String,
    pub comment: String,
}

impl Default for ExportAttributes {
    fn default() -> Self {
        Self {
            title: "SWOT swath coverage mask".to_string(),
            institution: String::new(),
            source: "SWOT L2 LR SSH Expert granules".to_string(),
            comment: "1 = covered by the KaRIn swath outside the nadir gap, 0 = not covered"
                .to_string(),
        }
    }
}

/// Mask generation parameters suitable for config files and CLI overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskParams {
    /// Root directory holding one `<YYYY>` subdirectory of granules per year
    pub data_dir: PathBuf,
    /// Granule file name prefix, e.g. `SWOT_L2_LR_SSH_Expert`
    pub product: String,
    pub grid: GridSpec,
    /// Half-width of the nadir gap in cross-track pixel columns of the source swath
    /// (not output grid cells). The band spans `[center - padding, center + padding)`.
    pub padding: usize,
    pub gap_detection: GapDetection,
    pub gap_fill: GapFill,
    pub interpolation: InterpolationMethod,
    /// Largest accepted sample distance in degrees for `InterpolationMethod::Nearest`
    pub nearest_max_distance: f64,
    /// If true, unreadable granules are skipped and recorded; otherwise they fail the date
    pub skip_unreadable_granules: bool,
    pub format: OutputFormat,
    /// Also write a JSON provenance sidecar next to each per-date output
    pub sidecar: bool,
    pub attributes: ExportAttributes,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            product: "SWOT_L2_LR_SSH_Expert".to_string(),
            grid: GridSpec::default(),
            padding: 5,
            gap_detection: GapDetection::Nadir,
            gap_fill: GapFill::Zero,
            interpolation: InterpolationMethod::Linear,
            nearest_max_distance: 0.05,
            skip_unreadable_granules: true,
            format: OutputFormat::NetCdf,
            sidecar: true,
            attributes: ExportAttributes::default(),
        }
    }
}

impl MaskParams {
    /// Load parameters from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
