/*!
# mini-abc

A compact library for adaptive-distance sequential Monte Carlo ABC
(approximate Bayesian computation). Instead of evaluating a likelihood,
candidate parameters are judged by a weighted Euclidean distance between
simulated and observed feature vectors; the per-feature weights are
re-estimated from every round's simulated batch, so features whose
variance shrinks under the narrowing proposal gain influence while
noise-dominated features stay down-weighted.

The caller supplies three collaborators: a [`simulator::Simulator`], a
[`distributions::Prior`] (round 1) and a
[`distributions::PerturbationKernel`] (later rounds). The
[`smc::AdaptiveSmc`] controller runs the round loop.

## Example

```rust
use mini_abc::distributions::{GaussianKernel, UniformPrior};
use mini_abc::error::SimulatorError;
use mini_abc::smc::AdaptiveSmc;
use ndarray::{array, Array1, ArrayView1};
use rand::rngs::SmallRng;
use rand_distr::{Distribution, Normal};

// Simulator: two features with very different noise scales.
let simulator = |theta: ArrayView1<f64>, rng: &mut SmallRng| -> Result<Array1<f64>, SimulatorError> {
    let narrow = Normal::new(theta[0], 1.0).unwrap();
    let wide = Normal::new(theta[0], 100.0).unwrap();
    Ok(array![narrow.sample(rng), wide.sample(rng)])
};

let prior = UniformPrior::new(array![0.0], array![50.0]);
let observed = array![20.0, 20.0];

let mut smc = AdaptiveSmc::new(simulator, prior, GaussianKernel::default(), observed, 50, 0.1)
    .set_seed(42);
let result = smc.run(2).unwrap();
assert_eq!(result.population.nrows(), 50);
assert_eq!(result.weight_history.len(), 2);
```
*/

pub mod distance;
pub mod distributions;
pub mod error;
pub mod population;
pub mod simulator;
pub mod smc;
pub mod weights;
