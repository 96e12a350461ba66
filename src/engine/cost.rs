// -----------------------------------------------------------------------------
// L2 reconstruction cost
// -----------------------------------------------------------------------------
use super::ImageStack;
use crate::error::{FitError, FitResult};

/// Sum of squared per-pixel differences, accumulated in f64.
#[inline]
pub(crate) fn sum_squared_error(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum()
}

/// Euclidean norm of `a - b`. Stacks must share one shape.
pub fn l2_distance(a: &ImageStack, b: &ImageStack) -> FitResult<f64> {
    if a.shape() != b.shape() {
        return Err(FitError::ShapeMismatch { expected: a.shape(), actual: b.shape() });
    }
    let sse: f64 = a
        .planes()
        .iter()
        .zip(b.planes())
        .map(|(pa, pb)| sum_squared_error(pa.data(), pb.data()))
        .sum();
    Ok(sse.sqrt())
}
