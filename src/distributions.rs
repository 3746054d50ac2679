/*!
Defines the proposal-side collaborators of the SMC round loop: priors
(round 1) and perturbation kernels (every later round), along with simple
concrete implementations for independent-component models.

All sampling takes an explicit [`SmallRng`] handle instead of owning a
random state, so the controller can derive deterministic streams from its
master seed.

# Examples

```rust
use mini_abc::distributions::{GaussianKernel, PerturbationKernel, Prior, UniformPrior};
use ndarray::array;
use rand::rngs::SmallRng;
use rand::SeedableRng;

let prior = UniformPrior::new(array![0.0, -1.0], array![1.0, 1.0]);
let mut rng = SmallRng::seed_from_u64(3);
let batch = prior.sample(100, &mut rng);
assert_eq!(batch.dim(), (100, 2));

// Perturb a previous population into a fresh proposal batch.
let kernel = GaussianKernel::default();
let proposals = kernel.propose(batch.view(), 200, &mut rng);
assert_eq!(proposals.dim(), (200, 2));
```
*/

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::SmallRng;
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

/// A prior over parameter vectors, used only to seed the first round.
pub trait Prior {
    /// Draws `n` parameter vectors, one per row.
    fn sample(&self, n: usize, rng: &mut SmallRng) -> Array2<f64>;
}

/// A local-move proposal for rounds after the first: given the previous
/// round's accepted population (one particle per row), produce a batch of
/// perturbed candidates. The retained particles are treated as
/// equally-weighted seeds; the kernel is opaque to the round loop and can
/// be swapped out freely.
pub trait PerturbationKernel {
    fn propose(&self, previous: ArrayView2<f64>, n: usize, rng: &mut SmallRng) -> Array2<f64>;
}

/// A prior with independent uniform components on `[low_j, high_j)`.
#[derive(Debug, Clone)]
pub struct UniformPrior {
    pub low: Array1<f64>,
    pub high: Array1<f64>,
}

impl UniformPrior {
    /// Creates a uniform prior over the axis-aligned box `[low, high)`.
    pub fn new(low: Array1<f64>, high: Array1<f64>) -> Self {
        assert_eq!(low.len(), high.len(), "low and high must have equal length");
        Self { low, high }
    }
}

impl Prior for UniformPrior {
    fn sample(&self, n: usize, rng: &mut SmallRng) -> Array2<f64> {
        let dists: Vec<Uniform<f64>> = self
            .low
            .iter()
            .zip(self.high.iter())
            .map(|(&lo, &hi)| Uniform::new(lo, hi))
            .collect();
        let mut out = Array2::zeros((n, dists.len()));
        for mut row in out.rows_mut() {
            for (x, dist) in row.iter_mut().zip(dists.iter()) {
                *x = dist.sample(rng);
            }
        }
        out
    }
}

/// A prior with independent Gaussian components.
#[derive(Debug, Clone)]
pub struct GaussianPrior {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl GaussianPrior {
    /// Creates a Gaussian prior with per-component mean and standard
    /// deviation.
    pub fn new(mean: Array1<f64>, std: Array1<f64>) -> Self {
        assert_eq!(mean.len(), std.len(), "mean and std must have equal length");
        Self { mean, std }
    }
}

impl Prior for GaussianPrior {
    fn sample(&self, n: usize, rng: &mut SmallRng) -> Array2<f64> {
        let dists: Vec<Normal<f64>> = self
            .mean
            .iter()
            .zip(self.std.iter())
            .map(|(&m, &s)| {
                Normal::new(m, s).expect("Expecting creation of normal distribution to succeed.")
            })
            .collect();
        let mut out = Array2::zeros((n, dists.len()));
        for mut row in out.rows_mut() {
            for (x, dist) in row.iter_mut().zip(dists.iter()) {
                *x = dist.sample(rng);
            }
        }
        out
    }
}

/**
Component-wise Gaussian jitter around seed particles pulled toward the
population mean, in the manner of the Liu-West kernel.

Each candidate starts from a uniformly chosen seed particle, keeps
`shrink` of the seed's offset from the population mean, and adds
`N(0, (scale * sigma_j)^2)` noise per component, where `sigma_j` is the
previous population's empirical standard deviation. The proposal's
per-component spread is therefore `sqrt(shrink^2 + scale^2)` times the
population's; with the defaults (`shrink = 0.8`, `scale = 0.3`) that
factor is below 1 and each round's proposal comes out tighter than the
population it perturbs. A component whose population std is zero is
copied through unperturbed.
*/
#[derive(Debug, Clone, Copy)]
pub struct GaussianKernel {
    pub shrink: f64,
    pub scale: f64,
}

impl Default for GaussianKernel {
    fn default() -> Self {
        Self {
            shrink: 0.8,
            scale: 0.3,
        }
    }
}

impl PerturbationKernel for GaussianKernel {
    fn propose(&self, previous: ArrayView2<f64>, n: usize, rng: &mut SmallRng) -> Array2<f64> {
        let mean = previous
            .mean_axis(Axis(0))
            .expect("Expecting a non-empty previous population.");
        let bandwidth = previous.std_axis(Axis(0), 0.0) * self.scale;
        let dists: Vec<Normal<f64>> = bandwidth
            .iter()
            .map(|&b| {
                Normal::new(0.0, b).expect("Expecting creation of normal distribution to succeed.")
            })
            .collect();
        let n_prev = previous.nrows();
        let mut out = Array2::zeros((n, previous.ncols()));
        for mut row in out.rows_mut() {
            let seed_particle = previous.row(rng.gen_range(0..n_prev));
            for (((x, &base), &m), dist) in row
                .iter_mut()
                .zip(seed_particle.iter())
                .zip(mean.iter())
                .zip(dists.iter())
            {
                *x = m + self.shrink * (base - m) + dist.sample(rng);
            }
        }
        out
    }
}
