/*!
Weighted Euclidean distance between an observed feature vector and a batch
of simulated feature vectors.

```rust
use mini_abc::distance::weighted_distances;
use ndarray::array;

let observed = array![0.0, 0.0];
let simulated = array![[3.0, 4.0], [1.0, 0.0]];

// Unweighted: plain Euclidean.
let d = weighted_distances(&observed.view(), &simulated.view(), None);
assert_eq!(d, array![5.0, 1.0]);

// Down-weight the second feature entirely.
let w = array![1.0, 0.0];
let d = weighted_distances(&observed.view(), &simulated.view(), Some(&w.view()));
assert_eq!(d, array![3.0, 1.0]);
```
*/

use ndarray::{Array1, ArrayView1, ArrayView2, Axis, NdFloat};

/// Computes `sqrt(sum_j (w_j * (s_ij - o_j))^2)` for every row `i` of
/// `simulated`.
///
/// With `weights == None` this is the ordinary Euclidean distance, which
/// is also the metric used by the first SMC round before any weights have
/// been estimated. Pure function; supports any `d >= 1` and batch size
/// `>= 1`.
pub fn weighted_distances<F: NdFloat>(
    observed: &ArrayView1<F>,
    simulated: &ArrayView2<F>,
    weights: Option<&ArrayView1<F>>,
) -> Array1<F> {
    let diff = simulated - observed;
    let scaled = match weights {
        Some(w) => diff * w,
        None => diff,
    };
    scaled
        .mapv(|x| x * x)
        .sum_axis(Axis(1))
        .mapv(F::sqrt)
}
