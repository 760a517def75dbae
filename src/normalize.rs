// normalize.rs — Turn the read-back accumulator into final colors.
//
// The accumulator is unpadded and row-major, the same traversal as
// `Frame::as_slice()`, so pixel i of the accumulator is pixel i of the
// destination.

use crate::convert::AccumTexel;
use crate::frame::{ComputableColor, Frame};

/// Write `weighted_sum / weight` for every pixel into `result`.
///
/// # Panics
/// Panics if `accum.len()` differs from the number of pixels in `result`.
/// A non-positive weight trips a debug assertion.
pub fn normalize_into<C: ComputableColor>(accum: &[AccumTexel], result: &mut Frame<C>) {
    assert_eq!(
        accum.len(),
        result.size().pixel_count(),
        "accumulator length ({}) must equal destination pixel count ({})",
        accum.len(),
        result.size().pixel_count(),
    );
    for (dst, texel) in result.as_mut_slice().iter_mut().zip(accum) {
        *dst = texel.normalized();
    }
}
