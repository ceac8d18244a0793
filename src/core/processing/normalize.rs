//! Swath geometry normalization: longitude wrap, nadir centerline localization and
//! cross-track border extrapolation.
//!
//! All longitude arithmetic goes through [`longitude_delta`], which works modulo 360, so a
//! granule crossing the 180° seam keeps small adjacent-pixel differences after wrapping.
use ndarray::{Array2, s};
use tracing::debug;

use crate::core::granule::NadirLongitude;
use crate::error::{Error, Result};
use crate::types::{GapDetection, PassDirection};

/// Extra columns appended on each cross-track edge
pub const BORDER_COLUMNS: usize = 2;

/// Multiples of the lateral gradient for the inner and outer border column
const BORDER_SCALES: [f64; BORDER_COLUMNS] = [1.0, 1.5];

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PixelClass {
    /// Inside the true swath and outside the nadir gap
    Swath,
    NadirGap,
    /// Extrapolated padding beyond the true swath edge
    Border,
}

/// Granule geometry extended by the border columns, with per-pixel classes
#[derive(Debug, Clone)]
pub struct NormalizedSwath {
    pub latitude: Array2<f64>,
    /// Wrapped into [-180, 180]
    pub longitude: Array2<f64>,
    pub classes: Array2<PixelClass>,
    /// Centerline column per row in source swath indices; None if the row has no usable pixel
    pub centers: Vec<Option<usize>>,
    pub direction: PassDirection,
}

impl NormalizedSwath {
    pub fn dim(&self) -> (usize, usize) {
        self.latitude.dim()
    }

    /// Row-major 1D copies of (latitude, longitude, classes) ready for scatter interpolation
    pub fn flatten(&self) -> (Vec<f64>, Vec<f64>, Vec<PixelClass>) {
        (
            self.latitude.iter().copied().collect(),
            self.longitude.iter().copied().collect(),
            self.classes.iter().copied().collect(),
        )
    }
}

/// Map a longitude from [0, 360) (or slightly outside [-180, 180]) into [-180, 180]
#[inline]
pub fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// Signed shortest angular difference `to - from` in [-180, 180)
#[inline]
pub fn longitude_delta(from: f64, to: f64) -> f64 {
    let d = (to - from).rem_euclid(360.0);
    if d >= 180.0 { d - 360.0 } else { d }
}

/// Mean longitude of each row, averaged as offsets from the row's first finite pixel
pub fn row_mean_longitudes(field: &Array2<f64>) -> Vec<f64> {
    field
        .rows()
        .into_iter()
        .map(|row| {
            let mut anchor: Option<f64> = None;
            let mut sum = 0.0;
            let mut count = 0usize;
            for &v in row.iter().filter(|v| v.is_finite()) {
                let v = wrap_longitude(v);
                match anchor {
                    None => anchor = Some(v),
                    Some(a) => sum += longitude_delta(a, v),
                }
                count += 1;
            }
            match anchor {
                Some(a) => wrap_longitude(a + sum / count as f64),
                None => f64::NAN,
            }
        })
        .collect()
}

/// Per row, the column whose longitude is closest to `reference[row]` (first one on ties)
pub fn locate_centers(longitude: &Array2<f64>, reference: &[f64]) -> Vec<Option<usize>> {
    longitude
        .rows()
        .into_iter()
        .zip(reference)
        .map(|(row, &target)| {
            if !target.is_finite() {
                return None;
            }
            let mut best: Option<(usize, f64)> = None;
            for (c, &v) in row.iter().enumerate() {
                if !v.is_finite() {
                    continue;
                }
                let d = longitude_delta(v, target).abs();
                if best.is_none_or(|(_, bd)| d < bd) {
                    best = Some((c, d));
                }
            }
            best.map(|(c, _)| c)
        })
        .collect()
}

/// `latitude[0,0] > latitude[last,0]` means the satellite moves south
pub fn pass_direction(latitude: &Array2<f64>) -> PassDirection {
    let rows = latitude.nrows();
    if rows > 0 && latitude[[0, 0]] > latitude[[rows - 1, 0]] {
        PassDirection::Descending
    } else {
        PassDirection::Ascending
    }
}

fn max_lateral_step(row: &[f64]) -> f64 {
    row.windows(2)
        .filter(|w| w[0].is_finite() && w[1].is_finite())
        .map(|w| longitude_delta(w[0], w[1]).abs())
        .fold(0.0, f64::max)
}

/// Normalize one granule's geometry.
///
/// `padding` is the gap half-width in source swath columns: the band covers
/// `[center - padding, center + padding)`, clipped to the swath.
pub fn normalize(
    latitude: &Array2<f64>,
    longitude: &Array2<f64>,
    nadir: &NadirLongitude,
    padding: usize,
    detection: GapDetection,
) -> Result<NormalizedSwath> {
    if latitude.dim() != longitude.dim() {
        return Err(Error::shape_mismatch(
            "swath longitude",
            latitude.dim(),
            longitude.dim(),
        ));
    }
    let (rows, cols) = latitude.dim();
    if rows == 0 {
        return Err(Error::ShapeMismatch {
            what: "swath rows",
            expected: "at least 1".to_string(),
            found: rows.to_string(),
        });
    }
    if cols < 3 {
        return Err(Error::SwathTooNarrow { columns: cols });
    }
    if nadir.rows() != rows {
        return Err(Error::shape_mismatch("nadir rows", rows, nadir.rows()));
    }

    let lon = longitude.mapv(wrap_longitude);
    let reference: Vec<f64> = match (detection, nadir) {
        (GapDetection::Nadir, NadirLongitude::Track(track)) => {
            track.iter().map(|&v| wrap_longitude(v)).collect()
        }
        (GapDetection::Nadir, NadirLongitude::Field(field)) => row_mean_longitudes(field),
        (GapDetection::RowMean, _) => row_mean_longitudes(&lon),
    };
    let centers = locate_centers(&lon, &reference);
    let direction = pass_direction(latitude);

    let ext_cols = cols + 2 * BORDER_COLUMNS;
    let mut lat_ext = Array2::from_elem((rows, ext_cols), f64::NAN);
    let mut lon_ext = Array2::from_elem((rows, ext_cols), f64::NAN);
    let mut classes = Array2::from_elem((rows, ext_cols), PixelClass::Border);
    lat_ext
        .slice_mut(s![.., BORDER_COLUMNS..BORDER_COLUMNS + cols])
        .assign(latitude);
    lon_ext
        .slice_mut(s![.., BORDER_COLUMNS..BORDER_COLUMNS + cols])
        .assign(&lon);
    classes
        .slice_mut(s![.., BORDER_COLUMNS..BORDER_COLUMNS + cols])
        .fill(PixelClass::Swath);

    for (r, center) in centers.iter().enumerate() {
        if let Some(c) = *center {
            let start = c.saturating_sub(padding);
            let end = (c + padding).min(cols);
            classes
                .slice_mut(s![r, BORDER_COLUMNS + start..BORDER_COLUMNS + end])
                .fill(PixelClass::NadirGap);
        }

        let row = lon.row(r).to_vec();
        let (Some(first), Some(last)) = (
            row.iter().position(|v| v.is_finite()),
            row.iter().rposition(|v| v.is_finite()),
        ) else {
            continue;
        };
        let lateral = max_lateral_step(&row);
        let gradient = longitude_delta(row[first], row[last]);
        let sign = if gradient > 0.0 {
            1.0
        } else if gradient < 0.0 {
            -1.0
        } else {
            match direction {
                PassDirection::Ascending => 1.0,
                PassDirection::Descending => -1.0,
            }
        };

        for (k, scale) in BORDER_SCALES.iter().enumerate() {
            let offset = sign * scale * lateral;
            let left = BORDER_COLUMNS - 1 - k;
            let right = BORDER_COLUMNS + cols + k;
            lon_ext[[r, left]] = wrap_longitude(row[first] - offset);
            lon_ext[[r, right]] = wrap_longitude(row[last] + offset);
            lat_ext[[r, left]] = latitude[[r, first]];
            lat_ext[[r, right]] = latitude[[r, last]];
        }
    }

    debug!(
        "Normalized swath {}x{} -> {}x{}, pass {}, {} rows without centerline",
        rows,
        cols,
        rows,
        ext_cols,
        direction,
        centers.iter().filter(|c| c.is_none()).count()
    );

    Ok(NormalizedSwath {
        latitude: lat_ext,
        longitude: lon_ext,
        classes,
        centers,
        direction,
    })
}
