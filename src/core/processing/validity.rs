//! Validity field: what a swath pixel contributes to the coverage mask.
//!
//! `1.0` means "inside the true swath and outside the nadir gap". Gap pixels carry the
//! configured `GapFill` value, border padding is always `0.0`.
use ndarray::Array2;

use crate::core::processing::normalize::PixelClass;
use crate::types::GapFill;

#[inline]
fn pixel_value(class: PixelClass, gap_fill: GapFill) -> f64 {
    match class {
        PixelClass::Swath => 1.0,
        PixelClass::NadirGap => gap_fill.value(),
        PixelClass::Border => 0.0,
    }
}

/// Per-pixel validity aligned with the normalized swath classes
pub fn build_validity(classes: &Array2<PixelClass>, gap_fill: GapFill) -> Array2<f64> {
    classes.mapv(|class| pixel_value(class, gap_fill))
}
