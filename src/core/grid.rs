//! Target equirectangular lat/lon grid shared read-only by every per-date computation.
use ndarray::Array1;

use crate::core::params::GridSpec;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    lat: Array1<f64>,
    lon: Array1<f64>,
}

fn validate_axis(name: &str, values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(Error::InvalidGrid(format!("{} axis is empty", name)));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(Error::InvalidGrid(format!(
            "{} axis contains non-finite value {}",
            name, bad
        )));
    }
    if let Some(i) = values.windows(2).position(|w| w[1] <= w[0]) {
        return Err(Error::InvalidGrid(format!(
            "{} axis is not strictly increasing at index {} ({} -> {})",
            name,
            i + 1,
            values[i],
            values[i + 1]
        )));
    }
    Ok(())
}

fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let n = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..n).map(|i| start + i as f64 * step).collect()
}

impl Grid {
    /// Build a grid from explicit axes; both must be finite, non-empty and strictly increasing
    pub fn new(lat: Vec<f64>, lon: Vec<f64>) -> Result<Self> {
        validate_axis("latitude", &lat)?;
        validate_axis("longitude", &lon)?;
        Ok(Self {
            lat: Array1::from(lat),
            lon: Array1::from(lon),
        })
    }

    pub fn from_spec(spec: &GridSpec) -> Result<Self> {
        if !(spec.step.is_finite() && spec.step > 0.0) {
            return Err(Error::InvalidGrid(format!(
                "step must be positive, got {}",
                spec.step
            )));
        }
        Self::new(
            arange(spec.lat_start, spec.lat_stop, spec.step),
            arange(spec.lon_start, spec.lon_stop, spec.step),
        )
    }

    pub fn lat(&self) -> &Array1<f64> {
        &self.lat
    }

    pub fn lon(&self) -> &Array1<f64> {
        &self.lon
    }

    /// (rows, cols) = (latitudes, longitudes)
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    /// Mean node spacing (lat, lon) in degrees; 1.0 along an axis with a single node
    pub fn spacing(&self) -> (f64, f64) {
        let mean_step = |axis: &Array1<f64>| {
            let n = axis.len();
            if n < 2 {
                1.0
            } else {
                (axis[n - 1] - axis[0]) / (n - 1) as f64
            }
        };
        (mean_step(&self.lat), mean_step(&self.lon))
    }

    /// GDAL geotransform of the north-up raster whose pixel centres are the grid nodes
    pub fn geotransform(&self) -> [f64; 6] {
        let (dlat, dlon) = self.spacing();
        let west = self.lon[0] - 0.5 * dlon;
        let north = self.lat[self.lat.len() - 1] + 0.5 * dlat;
        [west, dlon, 0.0, north, 0.0, -dlat]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_spec_matches_arange() {
        let spec = GridSpec {
            lat_start: 0.0,
            lat_stop: 10.0,
            lon_start: -5.0,
            lon_stop: 0.0,
            step: 1.0,
        };
        let grid = Grid::from_spec(&spec).unwrap();
        assert_eq!(grid.shape(), (10, 5));
        assert_eq!(grid.lat()[9], 9.0);
        assert_eq!(grid.lon()[0], -5.0);
        assert_eq!(grid.lon()[4], -1.0);
    }

    #[test]
    fn test_default_region_shape() {
        let grid = Grid::from_spec(&GridSpec::default()).unwrap();
        let (rows, cols) = grid.shape();
        assert!((480..=481).contains(&rows));
        assert!((747..=748).contains(&cols));
    }

    #[test]
    fn test_rejects_non_monotonic_axis() {
        let err = Grid::new(vec![0.0, 1.0, 1.0], vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidGrid(_)));
        let err = Grid::new(vec![0.0, 1.0], vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidGrid(_)));
        let err = Grid::new(vec![0.0, f64::NAN], vec![0.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidGrid(_)));
    }

    #[test]
    fn test_geotransform_is_north_up() {
        let grid = Grid::new(vec![10.0, 11.0, 12.0], vec![-3.0, -2.0]).unwrap();
        let gt = grid.geotransform();
        assert_eq!(gt, [-3.5, 1.0, 0.0, 12.5, 0.0, -1.0]);
    }
}
