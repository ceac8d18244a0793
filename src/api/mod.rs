//! High-level, ergonomic library API: compute one date's coverage mask, write per-date
//! products, run inclusive date ranges in parallel, and merge per-date netCDF files into
//! one time series. Prefer these entrypoints over the low-level processing modules.
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::core::granule::GranuleProvider;
use crate::core::grid::Grid;
use crate::core::params::{ExportAttributes, MaskParams};
use crate::core::processing::aggregate::{DateMask, SkippedGranule, get_mask_for_date};
use crate::error::{Error, Result};
use crate::io::swot::SwotDirectory;
use crate::io::writers::metadata::{MaskMetadata, create_metadata_sidecar, embed_tiff_metadata};
use crate::io::writers::netcdf::{
    mask_file_date, mask_file_name, read_mask_file, write_date_mask, write_mask_series,
};
use crate::io::writers::tiff::write_mask_tiff;
use crate::types::OutputFormat;

/// Granule archive described by `params`
pub fn granule_directory(params: &MaskParams) -> SwotDirectory {
    SwotDirectory::new(&params.data_dir, &params.product)
}

/// Compute the mask of one date from the archive in `params.data_dir`
pub fn compute_date_mask(date: NaiveDate, params: &MaskParams) -> Result<(Grid, DateMask)> {
    let grid = Grid::from_spec(&params.grid)?;
    let result = get_mask_for_date(date, &grid, &granule_directory(params), params)?;
    Ok((grid, result))
}

/// Per-date output file name for `format`, e.g. `swotmask_20240901.nc`
pub fn output_file_name(date: NaiveDate, format: OutputFormat) -> String {
    mask_file_name(date, format.extension())
}

/// Write an already computed mask to `output` in `params.format`, plus the JSON sidecar
pub fn write_mask_to_path(
    result: &DateMask,
    grid: &Grid,
    output: &Path,
    params: &MaskParams,
) -> Result<()> {
    let meta = MaskMetadata::new(result, grid, params);
    match params.format {
        OutputFormat::NetCdf => {
            write_date_mask(output, grid, result.date, &result.mask, &params.attributes)?;
        }
        OutputFormat::Tiff => {
            let mut ds = write_mask_tiff(output, grid, &result.mask).map_err(Error::external)?;
            embed_tiff_metadata(&mut ds, &meta).map_err(Error::external)?;
            info!("Wrote mask GeoTIFF {:?}", output);
        }
    }
    if params.sidecar {
        create_metadata_sidecar(output, &meta).map_err(Error::external)?;
    }
    Ok(())
}

/// Compute one date with `provider` and write it to `output`
pub fn process_date_with_provider<P>(
    date: NaiveDate,
    grid: &Grid,
    provider: &P,
    output: &Path,
    params: &MaskParams,
) -> Result<DateMask>
where
    P: GranuleProvider + ?Sized,
{
    let result = get_mask_for_date(date, grid, provider, params)?;
    write_mask_to_path(&result, grid, output, params)?;
    Ok(result)
}

/// Compute one date from `params.data_dir` and write it to `output`
pub fn process_date_to_path(date: NaiveDate, output: &Path, params: &MaskParams) -> Result<DateMask> {
    let grid = Grid::from_spec(&params.grid)?;
    process_date_with_provider(date, &grid, &granule_directory(params), output, params)
}

/// Batch processing report
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Dates whose product was written, including empty ones
    pub processed: usize,
    /// Dates without any granule
    pub empty: usize,
    pub errors: usize,
    pub failed_dates: Vec<(NaiveDate, String)>,
    pub skipped_granules: Vec<SkippedGranule>,
}

/// Every date from `start` to `end`, both inclusive
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
    if end < start {
        return Err(Error::InvalidArgument {
            arg: "end",
            value: format!("{} is before start {}", end, start),
        });
    }
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}

/// Process `start..=end` into `output_dir` with `provider`, dates in parallel.
/// If `continue_on_error` is true, failed dates are recorded in the report and the batch continues;
/// otherwise the first error is returned.
pub fn process_date_range_with_provider<P>(
    start: NaiveDate,
    end: NaiveDate,
    output_dir: &Path,
    grid: &Grid,
    provider: &P,
    params: &MaskParams,
    continue_on_error: bool,
) -> Result<BatchReport>
where
    P: GranuleProvider + Sync + ?Sized,
{
    let dates = date_range(start, end)?;
    std::fs::create_dir_all(output_dir).map_err(Error::from)?;
    info!(
        "Processing {} date(s) from {} to {} into {:?}",
        dates.len(),
        start,
        end,
        output_dir
    );

    let run = |date: NaiveDate| {
        let output = output_dir.join(output_file_name(date, params.format));
        debug!("Processing {} -> {:?}", date, output);
        process_date_with_provider(date, grid, provider, &output, params)
    };

    let outcomes: Vec<(NaiveDate, Result<DateMask>)> = if continue_on_error {
        dates.par_iter().map(|&date| (date, run(date))).collect()
    } else {
        let results = dates
            .par_iter()
            .map(|&date| run(date))
            .collect::<Result<Vec<DateMask>>>()?;
        results.into_iter().map(|r| (r.date, Ok(r))).collect()
    };

    let mut report = BatchReport::default();
    for (date, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                report.processed += 1;
                if result.granules.is_empty() && result.skipped.is_empty() {
                    report.empty += 1;
                }
                report.skipped_granules.extend(result.skipped);
            }
            Err(e) => {
                warn!("Error processing {}: {}", date, e);
                report.errors += 1;
                report.failed_dates.push((date, e.to_string()));
            }
        }
    }
    Ok(report)
}

/// Process `start..=end` from `params.data_dir` into `output_dir`
pub fn process_date_range_to_dir(
    start: NaiveDate,
    end: NaiveDate,
    output_dir: &Path,
    params: &MaskParams,
    continue_on_error: bool,
) -> Result<BatchReport> {
    let grid = Grid::from_spec(&params.grid)?;
    process_date_range_with_provider(
        start,
        end,
        output_dir,
        &grid,
        &granule_directory(params),
        params,
        continue_on_error,
    )
}

/// Per-date netCDF mask files in `input_dir` with their dates, sorted by date
pub fn iterate_mask_files(input_dir: &Path) -> Result<Vec<(NaiveDate, PathBuf)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input_dir).map_err(Error::from)? {
        let path = entry.map_err(Error::from)?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(OutputFormat::NetCdf.extension()) {
            continue;
        }
        let date = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(mask_file_date);
        match date {
            Some(date) => files.push((date, path)),
            None => debug!("Skipping non-mask file {:?}", path),
        }
    }
    files.sort();
    Ok(files)
}

/// Merge every per-date netCDF mask in `input_dir` into one `(date, lat, lon)` file.
/// Returns the number of dates written.
pub fn merge_directory_to_path(
    input_dir: &Path,
    output: &Path,
    attributes: &ExportAttributes,
) -> Result<usize> {
    let files = iterate_mask_files(input_dir)?;
    if files.is_empty() {
        return Err(Error::NoInputs(input_dir.display().to_string()));
    }

    let stored = files
        .par_iter()
        .map(|(_, path)| read_mask_file(path))
        .collect::<Result<Vec<_>>>()?;

    let (first_path, first) = (&files[0].1, &stored[0]);
    for ((_, path), mask) in files.iter().zip(&stored).skip(1) {
        if mask.grid != first.grid {
            return Err(Error::GridMismatch(format!(
                "{:?} uses a {:?} grid, {:?} uses {:?}",
                path,
                mask.grid.shape(),
                first_path,
                first.grid.shape()
            )));
        }
    }

    for (date, _) in &files {
        info!("Merging: {}", date);
    }
    let dates: Vec<NaiveDate> = files.iter().map(|(date, _)| *date).collect();
    let masks: Vec<_> = stored.iter().map(|s| &s.mask).collect();
    write_mask_series(output, &first.grid, &dates, &masks, attributes)?;
    info!("Merged {} date(s) into {:?}", dates.len(), output);
    Ok(dates.len())
}
