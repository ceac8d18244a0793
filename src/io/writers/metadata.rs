use chrono::{NaiveDate, Utc};
use gdal::Dataset;
use gdal::Metadata;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::grid::Grid;
use crate::core::params::MaskParams;
use crate::core::processing::aggregate::{DateMask, SkippedGranule};
use crate::types::{GapDetection, GapFill, InterpolationMethod};

/// Provenance of one per-date mask product
#[derive(Debug, Clone, Serialize)]
pub struct MaskMetadata {
    pub date: NaiveDate,
    pub granules: Vec<String>,
    pub skipped_granules: Vec<SkippedGranule>,
    pub covered_cells: usize,
    /// (lat, lon) node counts
    pub grid_shape: (usize, usize),
    pub geotransform: [f64; 6],
    pub crs: String,
    pub padding: usize,
    pub gap_detection: GapDetection,
    pub gap_fill: GapFill,
    pub interpolation: InterpolationMethod,
    pub conversion_tool: String,
    pub conversion_version: String,
    pub conversion_timestamp: String,
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl MaskMetadata {
    pub fn new(result: &DateMask, grid: &Grid, params: &MaskParams) -> Self {
        Self {
            date: result.date,
            granules: result.granules.iter().map(|p| file_label(p)).collect(),
            skipped_granules: result.skipped.clone(),
            covered_cells: result.covered_cells(),
            grid_shape: grid.shape(),
            geotransform: grid.geotransform(),
            crs: "EPSG:4326".to_string(),
            padding: params.padding,
            gap_detection: params.gap_detection,
            gap_fill: params.gap_fill,
            interpolation: params.interpolation,
            conversion_tool: env!("CARGO_PKG_NAME").to_string(),
            conversion_version: env!("CARGO_PKG_VERSION").to_string(),
            conversion_timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Flatten provenance into upper-case GDAL metadata items
pub fn extract_metadata_fields(meta: &MaskMetadata) -> HashMap<String, String> {
    let mut metadata = HashMap::new();

    metadata.insert("DATE".to_string(), meta.date.format("%Y-%m-%d").to_string());
    metadata.insert("GRANULE_COUNT".to_string(), meta.granules.len().to_string());
    if !meta.granules.is_empty() {
        metadata.insert("GRANULES".to_string(), meta.granules.join(","));
    }
    if !meta.skipped_granules.is_empty() {
        let skipped: Vec<String> = meta
            .skipped_granules
            .iter()
            .map(|s| file_label(&s.path))
            .collect();
        metadata.insert("SKIPPED_GRANULES".to_string(), skipped.join(","));
    }
    metadata.insert("COVERED_CELLS".to_string(), meta.covered_cells.to_string());

    // Mask parameters
    metadata.insert("NADIR_PADDING".to_string(), meta.padding.to_string());
    metadata.insert("GAP_DETECTION".to_string(), meta.gap_detection.to_string());
    metadata.insert("GAP_FILL".to_string(), meta.gap_fill.to_string());
    metadata.insert("INTERPOLATION".to_string(), meta.interpolation.to_string());

    metadata.insert("CONVERSION_TOOL".to_string(), meta.conversion_tool.clone());
    metadata.insert(
        "CONVERSION_VERSION".to_string(),
        meta.conversion_version.clone(),
    );
    metadata.insert(
        "CONVERSION_TIMESTAMP".to_string(),
        meta.conversion_timestamp.clone(),
    );

    metadata
}

/// Embed provenance items into a GeoTIFF dataset
pub fn embed_tiff_metadata(
    ds: &mut Dataset,
    meta: &MaskMetadata,
) -> Result<(), Box<dyn std::error::Error>> {
    for (key, value) in extract_metadata_fields(meta) {
        ds.set_metadata_item(&key, &value, "")?;
    }
    Ok(())
}

/// Write `<output stem>.json` next to a product and return its path
pub fn create_metadata_sidecar(
    output_path: &Path,
    meta: &MaskMetadata,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let sidecar_path = output_path.with_extension("json");
    let json_string = serde_json::to_string_pretty(meta)?;
    std::fs::write(&sidecar_path, json_string)?;

    info!("Created metadata sidecar: {:?}", sidecar_path);
    Ok(sidecar_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> MaskMetadata {
        let grid = Grid::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        let result = DateMask {
            date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            mask: array![[1u8, 0], [1, 0]],
            granules: vec![PathBuf::from("/data/2024/a.nc"), PathBuf::from("/data/2024/b.nc")],
            skipped: vec![SkippedGranule {
                path: PathBuf::from("/data/2024/c.nc"),
                reason: "truncated".to_string(),
            }],
        };
        MaskMetadata::new(&result, &grid, &MaskParams::default())
    }

    #[test]
    fn test_extract_metadata_fields() {
        let fields = extract_metadata_fields(&sample());
        assert_eq!(fields["DATE"], "2024-09-01");
        assert_eq!(fields["GRANULES"], "a.nc,b.nc");
        assert_eq!(fields["SKIPPED_GRANULES"], "c.nc");
        assert_eq!(fields["COVERED_CELLS"], "2");
        assert_eq!(fields["NADIR_PADDING"], "5");
        assert_eq!(fields["CONVERSION_TOOL"], "swotmask");
    }

    #[test]
    fn test_sidecar_json() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("swotmask_20240901.nc");
        let path = create_metadata_sidecar(&output, &sample()).unwrap();
        assert_eq!(path, dir.path().join("swotmask_20240901.json"));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["date"], "2024-09-01");
        assert_eq!(value["granules"].as_array().unwrap().len(), 2);
        assert_eq!(value["skipped_granules"][0]["reason"], "truncated");
        assert_eq!(value["interpolation"], "Linear");
    }
}
