#![doc = r#"
SWOTMASK — daily SWOT KaRIn swath-coverage masks on a regular lat/lon grid.

For every date, the SWOT L2 LR SSH granules acquired that day are read, the nadir gap
between the two KaRIn half-swaths is carved out, each swath's validity is resampled onto
an equirectangular grid, and the union of all passes is thresholded into a binary mask
(`1` = observed by KaRIn, `0` = not observed). Masks are exported as CF netCDF or GeoTIFF
and can be merged into one `(date, lat, lon)` time series.

Requirements
------------
- netCDF/HDF5 and GDAL development headers and runtime available on your system.
- Rust 2024 edition toolchain.

Quick start: one date to a file
-------------------------------
```rust,no_run
use std::path::Path;
use chrono::NaiveDate;
use swotmask::{MaskParams, process_date_to_path};

fn main() -> swotmask::Result<()> {
    let params = MaskParams {
        data_dir: "/data/swot".into(),
        padding: 5,
        ..MaskParams::default()
    };
    let date = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
    let result = process_date_to_path(date, Path::new("/out/swotmask_20240901.nc"), &params)?;
    println!("{} granules, {} covered cells", result.granules.len(), result.covered_cells());
    Ok(())
}
```

In-memory masks with your own granule source
--------------------------------------------
```rust,no_run
use chrono::NaiveDate;
use swotmask::{Grid, MaskParams, SwotDirectory, get_mask_for_date};

fn main() -> swotmask::Result<()> {
    let params = MaskParams::default();
    let grid = Grid::from_spec(&params.grid)?;
    let provider = SwotDirectory::new("/data/swot", "SWOT_L2_LR_SSH_Expert");
    let date = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
    let result = get_mask_for_date(date, &grid, &provider, &params)?;
    assert_eq!(result.mask.dim(), grid.shape());
    Ok(())
}
```
Any type implementing [`GranuleProvider`] can stand in for the filesystem archive.

Batch and merge
---------------
```rust,no_run
use std::path::Path;
use chrono::NaiveDate;
use swotmask::{MaskParams, merge_directory_to_path, process_date_range_to_dir};

fn main() -> swotmask::Result<()> {
    let params = MaskParams::default();
    let start = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();

    let report = process_date_range_to_dir(start, end, Path::new("/out"), &params, true)?;
    println!("processed={} empty={} errors={}", report.processed, report.empty, report.errors);

    merge_directory_to_path(Path::new("/out"), Path::new("/out/swot_mask.nc"), &params.attributes)?;
    Ok(())
}
```

Error handling
--------------
All public functions return `swotmask::Result<T>`; match on `swotmask::Error` to handle
specific cases, e.g. granule reader or netCDF errors.

Useful modules
--------------
- [`api`] — high-level, ergonomic entry points.
- [`core`] — grid, granule model and the mask algorithm.
- [`types`] — enums such as `InterpolationMethod`, `GapDetection`, `OutputFormat`.
- [`io`] — SWOT granule discovery/reading and product writers.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::granule::{Granule, GranuleProvider, NadirLongitude};
pub use crate::core::grid::Grid;
pub use crate::core::params::{ExportAttributes, GridSpec, MaskParams};
pub use crate::core::processing::aggregate::{DateMask, SkippedGranule, get_mask_for_date};
pub use error::{Error, Result};
pub use types::{GapDetection, GapFill, InterpolationMethod, OutputFormat, PassDirection};

// Readers
pub use io::swot::{GranuleName, SwotDirectory, SwotError, read_granule_file};

// High-level API re-exports
pub use api::{
    BatchReport, compute_date_mask, merge_directory_to_path, output_file_name,
    process_date_range_to_dir, process_date_to_path,
};
