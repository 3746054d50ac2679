/*!
The simulator collaborator: anything that maps a parameter vector to a
simulated feature vector, given an explicit random-generator handle.

The trait is implemented for plain closures, so a test or demo can pass a
function directly:

```rust
use mini_abc::error::SimulatorError;
use mini_abc::simulator::Simulator;
use ndarray::{array, Array1, ArrayView1};
use rand::rngs::SmallRng;
use rand::SeedableRng;

let double = |theta: ArrayView1<f64>, _rng: &mut SmallRng| -> Result<Array1<f64>, SimulatorError> {
    Ok(array![2.0 * theta[0]])
};

let mut rng = SmallRng::seed_from_u64(0);
assert_eq!(double.simulate(array![3.0].view(), &mut rng).unwrap(), array![6.0]);
```
*/

use ndarray::{Array1, ArrayView1};
use rand::rngs::SmallRng;

use crate::error::SimulatorError;

/// Maps one candidate parameter vector to one simulated feature vector.
///
/// The random state is passed in explicitly (never taken from a global),
/// so that a run with a fixed master seed reproduces bit-identical
/// populations even when the batch is simulated across rayon workers.
/// The output dimensionality must be the same for every call within a
/// run; the controller checks it against the observed data and aborts
/// with [`DimensionMismatch`](crate::error::AbcError::DimensionMismatch)
/// on disagreement.
pub trait Simulator {
    fn simulate(
        &self,
        params: ArrayView1<f64>,
        rng: &mut SmallRng,
    ) -> Result<Array1<f64>, SimulatorError>;
}

impl<G> Simulator for G
where
    G: Fn(ArrayView1<f64>, &mut SmallRng) -> Result<Array1<f64>, SimulatorError>,
{
    fn simulate(
        &self,
        params: ArrayView1<f64>,
        rng: &mut SmallRng,
    ) -> Result<Array1<f64>, SimulatorError> {
        self(params, rng)
    }
}
