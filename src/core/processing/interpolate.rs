//! Scatter-to-grid resampling of a validity field onto the target grid.
//!
//! `Linear` triangulates the scatter set (Delaunay) and blends barycentrically inside each
//! triangle; grid nodes outside every triangle keep `fill_value`. `Nearest` takes the closest
//! sample from a k-d tree, accepted only within a maximum distance. Both are deterministic
//! functions of their inputs.
use std::ops::Range;

use delaunator::{Point, triangulate};
use kiddo::{KdTree, SquaredEuclidean};
use ndarray::{Array2, Zip};
use tracing::debug;

use crate::core::grid::Grid;
use crate::core::params::MaskParams;
use crate::error::{Error, Result};
use crate::types::InterpolationMethod;

/// Tolerance on barycentric weights so that nodes on shared edges and on the hull are kept
const BARYCENTRIC_EPS: f64 = 1e-10;

/// Triangles wider than this in longitude connect both sides of the antimeridian
const MAX_TRIANGLE_LON_SPAN: f64 = 180.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Interpolator {
    Linear,
    Nearest { max_distance: f64 },
}

impl Interpolator {
    /// The search radius must be finite and non-negative; it is squared for the k-d tree
    pub fn from_params(params: &MaskParams) -> Result<Self> {
        match params.interpolation {
            InterpolationMethod::Linear => Ok(Interpolator::Linear),
            InterpolationMethod::Nearest => {
                let max_distance = params.nearest_max_distance;
                if !max_distance.is_finite() || max_distance < 0.0 {
                    return Err(Error::InvalidArgument {
                        arg: "nearest_max_distance",
                        value: max_distance.to_string(),
                    });
                }
                Ok(Interpolator::Nearest { max_distance })
            }
        }
    }
}

/// Resample scattered `(lon, lat, value)` samples onto `grid`, shape `(lat, lon)`.
///
/// Samples with non-finite coordinates are ignored. Fewer than three usable samples, or a
/// collinear set, yields an all-`fill_value` array.
pub fn interpolate(
    lon: &[f64],
    lat: &[f64],
    values: &[f64],
    grid: &Grid,
    method: Interpolator,
    fill_value: f64,
) -> Result<Array2<f64>> {
    if lon.len() != lat.len() {
        return Err(Error::shape_mismatch("scatter latitude", lon.len(), lat.len()));
    }
    if lon.len() != values.len() {
        return Err(Error::shape_mismatch("scatter values", lon.len(), values.len()));
    }

    let mut xs = Vec::with_capacity(lon.len());
    let mut ys = Vec::with_capacity(lon.len());
    let mut vs = Vec::with_capacity(lon.len());
    for ((&x, &y), &v) in lon.iter().zip(lat).zip(values) {
        if x.is_finite() && y.is_finite() {
            xs.push(x);
            ys.push(y);
            vs.push(v);
        }
    }

    let out = match method {
        Interpolator::Linear => interpolate_linear(&xs, &ys, &vs, grid, fill_value),
        Interpolator::Nearest { max_distance } => {
            interpolate_nearest(&xs, &ys, &vs, grid, fill_value, max_distance)
        }
    };
    Ok(out)
}

/// Indices of the sorted `axis` values inside `[lo, hi]`
fn axis_range(axis: &[f64], lo: f64, hi: f64) -> Range<usize> {
    let start = axis.partition_point(|&v| v < lo);
    let end = axis.partition_point(|&v| v <= hi);
    start..end.max(start)
}

/// Weighted sum that skips zero weights, so an exact vertex hit ignores its neighbours
#[inline]
fn blend(terms: [(f64, f64); 3]) -> f64 {
    terms
        .iter()
        .filter(|(w, _)| *w != 0.0)
        .map(|(w, v)| w * v)
        .sum()
}

fn interpolate_linear(xs: &[f64], ys: &[f64], vs: &[f64], grid: &Grid, fill_value: f64) -> Array2<f64> {
    let mut out = Array2::from_elem(grid.shape(), fill_value);
    if xs.len() < 3 {
        debug!("Only {} scatter points, nothing to triangulate", xs.len());
        return out;
    }

    let points: Vec<Point> = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| Point { x, y })
        .collect();
    let triangulation = triangulate(&points);
    if triangulation.triangles.is_empty() {
        debug!("Degenerate scatter set ({} collinear points), contribution left empty", xs.len());
        return out;
    }

    let grid_lat = grid.lat().to_vec();
    let grid_lon = grid.lon().to_vec();
    let mut skipped_seam = 0usize;

    for tri in triangulation.triangles.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let (xa, ya, xb, yb, xc, yc) = (xs[a], ys[a], xs[b], ys[b], xs[c], ys[c]);

        let min_x = xa.min(xb).min(xc);
        let max_x = xa.max(xb).max(xc);
        if max_x - min_x > MAX_TRIANGLE_LON_SPAN {
            skipped_seam += 1;
            continue;
        }
        let min_y = ya.min(yb).min(yc);
        let max_y = ya.max(yb).max(yc);

        let det = (yb - yc) * (xa - xc) + (xc - xb) * (ya - yc);
        if det == 0.0 {
            continue;
        }

        for i in axis_range(&grid_lat, min_y, max_y) {
            let y = grid_lat[i];
            for j in axis_range(&grid_lon, min_x, max_x) {
                let x = grid_lon[j];
                let l1 = ((yb - yc) * (x - xc) + (xc - xb) * (y - yc)) / det;
                let l2 = ((yc - ya) * (x - xc) + (xa - xc) * (y - yc)) / det;
                let l3 = 1.0 - l1 - l2;
                if l1 < -BARYCENTRIC_EPS || l2 < -BARYCENTRIC_EPS || l3 < -BARYCENTRIC_EPS {
                    continue;
                }
                out[[i, j]] = blend([(l1, vs[a]), (l2, vs[b]), (l3, vs[c])]);
            }
        }
    }

    if skipped_seam > 0 {
        debug!("Dropped {} triangles spanning the antimeridian", skipped_seam);
    }
    out
}

fn interpolate_nearest(
    xs: &[f64],
    ys: &[f64],
    vs: &[f64],
    grid: &Grid,
    fill_value: f64,
    max_distance: f64,
) -> Array2<f64> {
    let mut out = Array2::from_elem(grid.shape(), fill_value);
    if xs.is_empty() {
        debug!("No scatter points, nearest contribution left empty");
        return out;
    }

    let mut tree: KdTree<f64, 2> = KdTree::with_capacity(xs.len());
    for (i, (&x, &y)) in xs.iter().zip(ys).enumerate() {
        tree.add(&[x, y], i as u64);
    }
    let max_sq = max_distance * max_distance;
    let grid_lon = grid.lon();

    Zip::from(out.rows_mut())
        .and(grid.lat())
        .par_for_each(|mut row, &y| {
            for (cell, &x) in row.iter_mut().zip(grid_lon.iter()) {
                let nearest = tree.nearest_one::<SquaredEuclidean>(&[x, y]);
                if nearest.distance <= max_sq {
                    *cell = vs[nearest.item as usize];
                }
            }
        });
    out
}
