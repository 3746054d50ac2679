/*!
# Adaptive-Distance SMC-ABC Controller

Orchestrates the sequential rounds of an adaptive-distance SMC-ABC run.
Round 1 draws candidates from the prior and selects with an unweighted
(or user-seeded) Euclidean distance; every later round perturbs the
previous population through the kernel and selects with the weight vector
estimated from the *previous* round's simulated batch. The weights
estimated from a round's own batch feed forward into the next round only
-- round 1 has no data to estimate them from before it runs.

Rounds are strictly sequential and atomic: the proposal for round `k+1`
needs round `k`'s population, and its metric needs round `k`'s freshly
estimated weights. A simulator failure aborts the run, discards the
partial batch, and leaves the last fully-completed round's snapshot in
[`AdaptiveSmc::last_completed`].

## Example

```rust
use mini_abc::distributions::{GaussianKernel, UniformPrior};
use mini_abc::error::SimulatorError;
use mini_abc::smc::AdaptiveSmc;
use ndarray::{array, Array1, ArrayView1};
use rand::rngs::SmallRng;
use rand_distr::{Distribution, Normal};

let simulator = |theta: ArrayView1<f64>, rng: &mut SmallRng| -> Result<Array1<f64>, SimulatorError> {
    let noise = Normal::new(0.0, 1.0).unwrap();
    Ok(array![theta[0] + noise.sample(rng)])
};
let prior = UniformPrior::new(array![-10.0], array![10.0]);

let mut smc = AdaptiveSmc::new(simulator, prior, GaussianKernel::default(), array![3.0], 100, 0.2)
    .set_seed(42);
let result = smc.run(3).unwrap();

assert_eq!(result.population.nrows(), 100);
assert_eq!(result.n_simulations, 3 * 500);
```
*/

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array1, Array2};
use rand::{thread_rng, Rng};

use crate::distributions::{PerturbationKernel, Prior};
use crate::error::AbcError;
use crate::population::{propose_and_select, Population, Proposal};
use crate::simulator::Simulator;
use crate::weights::estimate_weights;

/// Distance-weighting strategy, fixed at configuration time.
#[derive(Debug, Clone)]
pub enum Weighting {
    /// One weight vector (or plain Euclidean, if `None`) for every round.
    Fixed(Option<Array1<f64>>),
    /// Re-estimate the weights from each round's simulated batch; the
    /// optional `initial` vector seeds round 1's selection.
    Adaptive { initial: Option<Array1<f64>> },
}

/// Immutable record of one completed round. The controller only ever
/// replaces its reference to the latest snapshot; nothing mutates a
/// snapshot after the round that produced it.
#[derive(Debug, Clone)]
pub struct RoundSnapshot {
    /// 1-based round index.
    pub round: usize,
    /// The round's accepted population.
    pub population: Population,
    /// Weight vector estimated from this round's simulated batch (feeds
    /// the *next* round's selection).
    pub weights: Array1<f64>,
    /// Cumulative simulation count up to and including this round.
    pub n_simulations: usize,
}

/// Result of a completed run, exposed to calling/reporting code.
#[derive(Debug, Clone)]
pub struct SmcResult {
    /// Requested population size.
    pub n_samples: usize,
    /// Total simulator invocations across all rounds.
    pub n_simulations: usize,
    /// Final round's acceptance threshold.
    pub threshold: f64,
    /// Parameter vectors of the final accepted particles, one per row,
    /// sorted by distance.
    pub population: Array2<f64>,
    /// The final particles' simulated feature vectors.
    pub features: Array2<f64>,
    /// The final particles' distances, ascending.
    pub distances: Array1<f64>,
    /// Per-round acceptance thresholds. Not monotonic in general: the
    /// metric itself changes between rounds.
    pub thresholds: Vec<f64>,
    /// One weight vector per completed round, append-only.
    pub weight_history: Vec<Array1<f64>>,
}

/**
The adaptive-distance SMC-ABC sampler.

Owns the three external collaborators (simulator, prior, perturbation
kernel), the observed feature vector, and the run configuration. All
round-to-round state lives in local, per-round snapshots; the only thing
surviving an aborted run is [`AdaptiveSmc::last_completed`].

# Type Parameters
- `S`: the simulator collaborator.
- `P`: the prior sampler, used only in round 1.
- `K`: the perturbation kernel, used in every later round.
*/
#[derive(Debug, Clone)]
pub struct AdaptiveSmc<S, P, K> {
    /// The simulator mapping parameters to feature vectors.
    pub simulator: S,
    /// The prior over parameter vectors.
    pub prior: P,
    /// The local-move proposal used for rounds after the first.
    pub kernel: K,
    /// The observed feature vector; immutable for the run's lifetime.
    pub observed: Array1<f64>,
    /// Number of particles retained per round.
    pub n_samples: usize,
    /// Fraction of each round's batch retained; batch size is
    /// `ceil(n_samples / quantile)`.
    pub quantile: f64,
    /// Distance-weighting strategy.
    pub weighting: Weighting,
    /// Master random seed.
    pub seed: u64,
    /// Snapshot of the last fully-completed round, kept for inspection
    /// when a later round aborts.
    pub last_completed: Option<RoundSnapshot>,
}

impl<S, P, K> AdaptiveSmc<S, P, K>
where
    S: Simulator + Sync,
    P: Prior,
    K: PerturbationKernel,
{
    /// Creates a sampler with adaptive weighting and a random seed.
    ///
    /// # Arguments
    ///
    /// * `simulator` - Maps a parameter vector to a feature vector.
    /// * `prior` - Samples round 1's candidates.
    /// * `kernel` - Perturbs the previous population in later rounds.
    /// * `observed` - The observed feature vector.
    /// * `n_samples` - Particles retained per round.
    /// * `quantile` - Retained fraction of each round's batch, in `(0, 1]`.
    pub fn new(
        simulator: S,
        prior: P,
        kernel: K,
        observed: Array1<f64>,
        n_samples: usize,
        quantile: f64,
    ) -> Self {
        Self {
            simulator,
            prior,
            kernel,
            observed,
            n_samples,
            quantile,
            weighting: Weighting::Adaptive { initial: None },
            seed: thread_rng().gen::<u64>(),
            last_completed: None,
        }
    }

    /// Sets the master seed. Two runs with the same seed, configuration,
    /// and deterministic simulator produce bit-identical populations and
    /// weight histories.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replaces the weighting strategy (default: adaptive, unweighted
    /// round 1).
    pub fn set_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Runs `n_rounds` sequential rounds and returns the final population
    /// with its diagnostics.
    pub fn run(&mut self, n_rounds: usize) -> Result<SmcResult, AbcError> {
        self.run_inner(n_rounds, None)
    }

    /// Like [`run`](Self::run), but renders a per-round progress bar with
    /// the current threshold and cumulative simulation count.
    pub fn run_progress(&mut self, n_rounds: usize) -> Result<SmcResult, AbcError> {
        let pb = ProgressBar::new(n_rounds as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:8} {bar:40.white} ETA {eta:3} | {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        pb.set_prefix("SMC-ABC");
        let result = self.run_inner(n_rounds, Some(&pb));
        match &result {
            Ok(_) => pb.finish_with_message("Done!"),
            Err(e) => pb.abandon_with_message(format!("Aborted: {e}")),
        }
        result
    }

    /// Batch size for one round, validating the configuration before any
    /// simulation work is dispatched.
    fn batch_size(&self) -> Result<usize, AbcError> {
        if self.n_samples == 0 {
            return Err(AbcError::InvalidPopulationSize {
                n_samples: self.n_samples,
            });
        }
        let batch_size = if self.quantile > 0.0 {
            (self.n_samples as f64 / self.quantile).ceil() as usize
        } else {
            0
        };
        if !(0.0..=1.0).contains(&self.quantile) || batch_size < self.n_samples {
            return Err(AbcError::InvalidQuantile {
                quantile: self.quantile,
                n_samples: self.n_samples,
                batch_size,
            });
        }
        Ok(batch_size)
    }

    fn run_inner(
        &mut self,
        n_rounds: usize,
        pb: Option<&ProgressBar>,
    ) -> Result<SmcResult, AbcError> {
        if n_rounds == 0 {
            return Err(AbcError::InvalidRounds { n_rounds });
        }
        let batch_size = self.batch_size()?;

        // Weights applied to the *upcoming* round's selection.
        let mut current_weights: Option<Array1<f64>> = match &self.weighting {
            Weighting::Fixed(w) => w.clone(),
            Weighting::Adaptive { initial } => initial.clone(),
        };

        let mut weight_history: Vec<Array1<f64>> = Vec::with_capacity(n_rounds);
        let mut thresholds: Vec<f64> = Vec::with_capacity(n_rounds);
        let mut latest: Option<RoundSnapshot> = None;
        let mut n_simulations = 0usize;

        for round in 1..=n_rounds {
            // Per-round seed block: one stream for the proposal draws plus
            // one per candidate simulation.
            let seed_base = self
                .seed
                .wrapping_add((round as u64 - 1) * (batch_size as u64 + 1));

            let proposal = match &latest {
                None => Proposal::Prior(&self.prior),
                Some(snapshot) => Proposal::Kernel {
                    kernel: &self.kernel,
                    previous: &snapshot.population,
                },
            };

            let weights_view = current_weights.as_ref().map(|w| w.view());
            let (population, batch_features) = propose_and_select(
                proposal,
                &self.simulator,
                &self.observed.view(),
                weights_view.as_ref(),
                self.n_samples,
                batch_size,
                seed_base,
            )?;
            n_simulations += batch_size;

            // Reweight for the next round from this round's own batch.
            let round_weights = match &self.weighting {
                Weighting::Adaptive { .. } => estimate_weights(&batch_features.view()),
                Weighting::Fixed(w) => w
                    .clone()
                    .unwrap_or_else(|| Array1::ones(self.observed.len())),
            };
            if matches!(self.weighting, Weighting::Adaptive { .. }) {
                current_weights = Some(round_weights.clone());
            }
            weight_history.push(round_weights.clone());
            thresholds.push(population.threshold);

            if let Some(pb) = pb {
                pb.inc(1);
                pb.set_message(format!(
                    "eps={:.4} sims={}",
                    population.threshold, n_simulations
                ));
            }

            let snapshot = RoundSnapshot {
                round,
                population,
                weights: round_weights,
                n_simulations,
            };
            self.last_completed = Some(snapshot.clone());
            latest = Some(snapshot);
        }

        let last = latest.expect("Expecting at least one round to have completed.");
        Ok(SmcResult {
            n_samples: self.n_samples,
            n_simulations,
            threshold: last.population.threshold,
            population: last.population.params,
            features: last.population.features,
            distances: last.population.distances,
            thresholds,
            weight_history,
        })
    }
}
