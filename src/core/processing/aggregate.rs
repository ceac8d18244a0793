//! Date mask aggregation: every granule of a date is turned into a grid contribution by a
//! pure function, the contributions are summed, and the sum is thresholded to `{0, 1}`.
//!
//! Summing before thresholding gives union semantics: overlapping passes never double
//! count, and adding a granule can only grow the covered area.
use std::path::PathBuf;

use chrono::NaiveDate;
use ndarray::{Array2, Zip};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::granule::{Granule, GranuleProvider};
use crate::core::grid::Grid;
use crate::core::params::MaskParams;
use crate::core::processing::interpolate::{Interpolator, interpolate};
use crate::core::processing::normalize::normalize;
use crate::core::processing::validity::build_validity;
use crate::error::Result;

/// Grid value for "no coverage" outside a granule's swath
pub const FILL_VALUE: f64 = 0.0;

/// A granule that could not be read and was left out of its date
#[derive(Debug, Clone, Serialize)]
pub struct SkippedGranule {
    pub path: PathBuf,
    pub reason: String,
}

/// Binary coverage mask of one date, `(lat, lon)` ordered
#[derive(Debug, Clone)]
pub struct DateMask {
    pub date: NaiveDate,
    pub mask: Array2<u8>,
    /// Granules that contributed, in processing order
    pub granules: Vec<PathBuf>,
    pub skipped: Vec<SkippedGranule>,
}

impl DateMask {
    pub fn covered_cells(&self) -> usize {
        self.mask.iter().filter(|&&v| v == 1).count()
    }
}

/// Resample one granule's validity onto the grid
pub fn granule_contribution(granule: &Granule, grid: &Grid, params: &MaskParams) -> Result<Array2<f64>> {
    let swath = normalize(
        &granule.latitude,
        &granule.longitude,
        &granule.nadir,
        params.padding,
        params.gap_detection,
    )?;
    let validity = build_validity(&swath.classes, params.gap_fill);
    let (lat, lon, _classes) = swath.flatten();
    let values: Vec<f64> = validity.iter().copied().collect();
    interpolate(
        &lon,
        &lat,
        &values,
        grid,
        Interpolator::from_params(params)?,
        FILL_VALUE,
    )
}

/// Add a contribution into the running total; non-finite cells count as no coverage
pub fn accumulate(total: &mut Array2<f64>, contribution: &Array2<f64>) {
    Zip::from(total).and(contribution).for_each(|t, &c| {
        if c.is_finite() {
            *t += c;
        }
    });
}

/// Any non-zero cell is covered
pub fn threshold(total: &Array2<f64>) -> Array2<u8> {
    total.mapv(|v| u8::from(v != 0.0))
}

/// Build the binary coverage mask for `date`.
///
/// A date without granules yields an all-zero mask. Unreadable granules are skipped and
/// recorded when `params.skip_unreadable_granules` is set, otherwise they fail the date.
/// Geometry validation errors always fail the date.
pub fn get_mask_for_date<P>(
    date: NaiveDate,
    grid: &Grid,
    provider: &P,
    params: &MaskParams,
) -> Result<DateMask>
where
    P: GranuleProvider + ?Sized,
{
    let files = provider.select_files(date)?;
    let mut total = Array2::<f64>::zeros(grid.shape());
    let mut granules = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();

    if files.is_empty() {
        info!("No granules found for {}, mask is empty", date);
    } else {
        info!("{}: {} granule(s) selected", date, files.len());
    }

    for path in files {
        debug!("Reading granule: {:?}", path);
        let granule = match provider.read_granule(&path) {
            Ok(granule) => granule,
            Err(e) if e.is_validation() => return Err(e),
            Err(e) if params.skip_unreadable_granules => {
                warn!("Skipping unreadable granule {:?}: {}", path, e);
                skipped.push(SkippedGranule {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(e),
        };
        let contribution = granule_contribution(&granule, grid, params)?;
        accumulate(&mut total, &contribution);
        granules.push(path);
    }

    let mask = threshold(&total);
    let result = DateMask {
        date,
        mask,
        granules,
        skipped,
    };
    info!(
        "{}: {} covered cells from {} granule(s), {} skipped",
        date,
        result.covered_cells(),
        result.granules.len(),
        result.skipped.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::granule::NadirLongitude;
    use crate::error::Error;
    use crate::types::GapFill;
    use ndarray::Array1;
    use std::collections::HashMap;
    use std::path::Path;

    #[derive(Default)]
    struct MockProvider {
        files: HashMap<NaiveDate, Vec<PathBuf>>,
        granules: HashMap<PathBuf, Granule>,
    }

    impl MockProvider {
        fn with(mut self, date: NaiveDate, name: &str, granule: Option<Granule>) -> Self {
            let path = PathBuf::from(name);
            self.files.entry(date).or_default().push(path.clone());
            if let Some(g) = granule {
                self.granules.insert(path, g);
            }
            self
        }
    }

    impl GranuleProvider for MockProvider {
        fn select_files(&self, date: NaiveDate) -> Result<Vec<PathBuf>> {
            Ok(self.files.get(&date).cloned().unwrap_or_default())
        }

        fn read_granule(&self, path: &Path) -> Result<Granule> {
            self.granules
                .get(path)
                .cloned()
                .ok_or_else(|| Error::Processing(format!("corrupt file {:?}", path)))
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    fn grid_10x10() -> Grid {
        let axis: Vec<f64> = (0..10).map(|v| v as f64).collect();
        Grid::new(axis.clone(), axis).unwrap()
    }

    /// Straight north-south swath over every grid row, one column per longitude in `lons`
    fn straight_swath(lons: &[f64], nadir: f64) -> Granule {
        swath_with_rows(10, lons, nadir)
    }

    fn swath_with_rows(rows: usize, lons: &[f64], nadir: f64) -> Granule {
        let lat = Array2::from_shape_fn((rows, lons.len()), |(r, _)| r as f64);
        let lon = Array2::from_shape_fn((rows, lons.len()), |(_, c)| lons[c]);
        Granule::new(lat, lon, NadirLongitude::Track(Array1::from_elem(rows, nadir))).unwrap()
    }

    fn params(padding: usize) -> MaskParams {
        MaskParams {
            padding,
            ..MaskParams::default()
        }
    }

    fn covered_columns(mask: &Array2<u8>) -> Vec<usize> {
        (0..mask.ncols())
            .filter(|&c| mask.column(c).iter().all(|&v| v == 1))
            .collect()
    }

    #[test]
    fn test_no_granules_gives_empty_mask() {
        let provider = MockProvider::default();
        let result = get_mask_for_date(day(), &grid_10x10(), &provider, &params(1)).unwrap();
        assert_eq!(result.mask.dim(), (10, 10));
        assert!(result.mask.iter().all(|&v| v == 0u8));
        assert!(result.granules.is_empty());
    }

    #[test]
    fn test_straight_swath_with_nadir_gap() {
        // swath columns at longitudes 2..=7, nadir on 4, padding 1 excludes columns 3 and 4
        let granule = straight_swath(&[2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 4.0);
        let provider = MockProvider::default().with(day(), "a.nc", Some(granule));
        let result = get_mask_for_date(day(), &grid_10x10(), &provider, &params(1)).unwrap();

        assert_eq!(covered_columns(&result.mask), vec![2, 5, 6, 7]);
        for c in [0, 1, 3, 4, 8, 9] {
            assert!(result.mask.column(c).iter().all(|&v| v == 0), "column {}", c);
        }
        assert_eq!(result.covered_cells(), 40);
    }

    #[test]
    fn test_identical_granules_are_not_double_counted() {
        let lons = [2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let single = MockProvider::default().with(day(), "a.nc", Some(straight_swath(&lons, 4.0)));
        let double = MockProvider::default()
            .with(day(), "a.nc", Some(straight_swath(&lons, 4.0)))
            .with(day(), "b.nc", Some(straight_swath(&lons, 4.0)));

        let grid = grid_10x10();
        let one = get_mask_for_date(day(), &grid, &single, &params(1)).unwrap();
        let two = get_mask_for_date(day(), &grid, &double, &params(1)).unwrap();
        assert_eq!(one.mask, two.mask);
        assert_eq!(two.granules.len(), 2);
    }

    #[test]
    fn test_extra_granule_never_shrinks_coverage() {
        let grid = grid_10x10();
        let first = MockProvider::default().with(
            day(),
            "a.nc",
            Some(straight_swath(&[1.0, 2.0, 3.0, 4.0, 5.0], 3.0)),
        );
        let both = MockProvider::default()
            .with(day(), "a.nc", Some(straight_swath(&[1.0, 2.0, 3.0, 4.0, 5.0], 3.0)))
            .with(day(), "b.nc", Some(straight_swath(&[3.0, 4.0, 5.0, 6.0, 7.0, 8.0], 5.0)));

        let before = get_mask_for_date(day(), &grid, &first, &params(1)).unwrap();
        let after = get_mask_for_date(day(), &grid, &both, &params(1)).unwrap();
        assert!(after.covered_cells() >= before.covered_cells());
        Zip::from(&before.mask).and(&after.mask).for_each(|&b, &a| assert!(a >= b));
    }

    #[test]
    fn test_nan_gap_fill_is_not_coverage() {
        let granule = straight_swath(&[2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 4.0);
        let provider = MockProvider::default().with(day(), "a.nc", Some(granule));
        let mut p = params(1);
        p.gap_fill = GapFill::Nan;
        let result = get_mask_for_date(day(), &grid_10x10(), &provider, &p).unwrap();
        let covered = covered_columns(&result.mask);
        assert!(!covered.contains(&3) && !covered.contains(&4));
        assert!(covered.contains(&6));
    }

    #[test]
    fn test_unreadable_granule_is_skipped() {
        let provider = MockProvider::default()
            .with(day(), "broken.nc", None)
            .with(day(), "a.nc", Some(straight_swath(&[2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 4.0)));
        let result = get_mask_for_date(day(), &grid_10x10(), &provider, &params(1)).unwrap();
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].path, PathBuf::from("broken.nc"));
        assert_eq!(result.granules, vec![PathBuf::from("a.nc")]);
        assert_eq!(covered_columns(&result.mask), vec![2, 5, 6, 7]);
    }

    #[test]
    fn test_unreadable_granule_fails_date_when_not_skipping() {
        let provider = MockProvider::default().with(day(), "broken.nc", None);
        let mut p = params(1);
        p.skip_unreadable_granules = false;
        assert!(get_mask_for_date(day(), &grid_10x10(), &provider, &p).is_err());
    }

    #[test]
    fn test_invalid_geometry_fails_date() {
        let narrow = straight_swath(&[2.0, 3.0], 2.0);
        let provider = MockProvider::default().with(day(), "narrow.nc", Some(narrow));
        let err = get_mask_for_date(day(), &grid_10x10(), &provider, &params(1)).unwrap_err();
        assert!(matches!(err, Error::SwathTooNarrow { columns: 2 }));
    }

    /// Reader whose granules fail geometry validation on construction
    struct MismatchedNadirProvider;

    impl GranuleProvider for MismatchedNadirProvider {
        fn select_files(&self, _date: NaiveDate) -> Result<Vec<PathBuf>> {
            Ok(vec![PathBuf::from("bad.nc")])
        }

        fn read_granule(&self, _path: &Path) -> Result<Granule> {
            Granule::new(
                Array2::zeros((10, 6)),
                Array2::zeros((10, 6)),
                NadirLongitude::Track(Array1::zeros(7)),
            )
        }
    }

    #[test]
    fn test_granule_shape_mismatch_fails_date_even_when_skipping() {
        let p = params(1);
        assert!(p.skip_unreadable_granules);
        let err = get_mask_for_date(day(), &grid_10x10(), &MismatchedNadirProvider, &p).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { what: "granule nadir rows", .. }));
    }

    #[test]
    fn test_single_row_granule_contributes_nothing() {
        // one scan line is collinear: no triangles, so the contribution is all fill
        let granule = swath_with_rows(1, &[2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 4.0);
        let contribution = granule_contribution(&granule, &grid_10x10(), &params(1)).unwrap();
        assert!(contribution.iter().all(|&v| v == FILL_VALUE));

        let provider = MockProvider::default().with(day(), "a.nc", Some(granule));
        let result = get_mask_for_date(day(), &grid_10x10(), &provider, &params(1)).unwrap();
        assert_eq!(result.covered_cells(), 0);
        assert_eq!(result.granules, vec![PathBuf::from("a.nc")]);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_negative_nearest_radius_fails_date() {
        let provider = MockProvider::default()
            .with(day(), "a.nc", Some(straight_swath(&[2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 4.0)));
        let p = MaskParams {
            interpolation: crate::types::InterpolationMethod::Nearest,
            nearest_max_distance: -0.5,
            ..params(1)
        };
        let err = get_mask_for_date(day(), &grid_10x10(), &provider, &p).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_threshold_is_binary() {
        let total = Array2::from_shape_vec((1, 4), vec![0.0, 0.25, 1.0, 2.0]).unwrap();
        assert_eq!(threshold(&total).into_raw_vec(), vec![0, 1, 1, 1]);
    }
}
