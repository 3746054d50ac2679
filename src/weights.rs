/*!
Per-feature distance weights estimated from a simulated batch.

Each feature's weight is the inverse of its standard deviation across the
batch, so no feature dominates the distance purely because of its numeric
scale. The estimate is recomputed every round: as the proposal narrows,
the variance of a feature that is informative about the parameter keeps
shrinking while an uninformative feature's variance stays put, and only
per-round re-estimation separates the two.
*/

use ndarray::{Array1, ArrayView2, Axis, NdFloat};
use num_traits::FromPrimitive;

/// Estimates one weight per feature (column) of `batch`: `1/sigma_j`,
/// with `sigma_j` the population standard deviation (ddof = 0).
///
/// A feature that is constant across the batch gets weight `0` instead of
/// triggering a division by zero; the zero stays visible in the round's
/// weight-history entry.
pub fn estimate_weights<F>(batch: &ArrayView2<F>) -> Array1<F>
where
    F: NdFloat + FromPrimitive,
{
    let sigma = batch.std_axis(Axis(0), F::zero());
    sigma.mapv(|s| if s > F::zero() { s.recip() } else { F::zero() })
}
