/*!
One SMC round's proposal, simulation, and selection step.

A batch of candidates is drawn from the round's proposal, simulated in
parallel, scored with the current weighted distance, and the best
`n_samples` candidates become the new population. The acceptance
threshold is the largest distance among the accepted particles, i.e. the
`n_samples`-th smallest distance of the complete batch.
*/

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::distance::weighted_distances;
use crate::distributions::{PerturbationKernel, Prior};
use crate::error::AbcError;
use crate::simulator::Simulator;

/// The accepted particles of one completed round, sorted by distance
/// (ascending). Immutable once built; the next round only reads it.
#[derive(Debug, Clone)]
pub struct Population {
    /// Accepted parameter vectors, one particle per row.
    pub params: Array2<f64>,
    /// The accepted particles' simulated feature vectors.
    pub features: Array2<f64>,
    /// Weighted distances to the observed data, ascending.
    pub distances: Array1<f64>,
    /// Maximum accepted distance (closed, inclusive bound).
    pub threshold: f64,
}

impl Population {
    /// Number of particles in the population.
    pub fn len(&self) -> usize {
        self.params.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.params.nrows() == 0
    }
}

/// The proposal mechanism for one round: the prior in round 1, a
/// perturbation kernel around the previous population afterwards.
pub(crate) enum Proposal<'a, P, K> {
    Prior(&'a P),
    Kernel { kernel: &'a K, previous: &'a Population },
}

/// Runs one full population-sampler step and returns the new population
/// together with the complete batch of simulated feature vectors (the
/// weight estimator needs the whole batch, not just the accepted part).
///
/// Candidates are simulated concurrently; every draw owns an RNG seeded
/// from `seed_base + index`, so the result does not depend on the thread
/// schedule. All `batch_size` results are collected before selection
/// because the threshold is an order statistic over the complete batch.
/// A simulator error aborts the whole round; the partial batch is
/// dropped.
pub(crate) fn propose_and_select<S, P, K>(
    proposal: Proposal<'_, P, K>,
    simulator: &S,
    observed: &ArrayView1<f64>,
    weights: Option<&ArrayView1<f64>>,
    n_samples: usize,
    batch_size: usize,
    seed_base: u64,
) -> Result<(Population, Array2<f64>), AbcError>
where
    S: Simulator + Sync,
    P: Prior,
    K: PerturbationKernel,
{
    debug_assert!(batch_size >= n_samples);

    let mut proposal_rng = SmallRng::seed_from_u64(seed_base);
    let params = match proposal {
        Proposal::Prior(prior) => prior.sample(batch_size, &mut proposal_rng),
        Proposal::Kernel { kernel, previous } => {
            kernel.propose(previous.params.view(), batch_size, &mut proposal_rng)
        }
    };

    let features = simulate_batch(simulator, &params.view(), observed.len(), seed_base)?;
    let distances = weighted_distances(observed, &features.view(), weights);

    // Stable argsort keeps ties at the threshold in original draw order.
    let mut order: Vec<usize> = (0..batch_size).collect();
    order.sort_by(|&i, &j| distances[i].total_cmp(&distances[j]));

    let accepted = &order[..n_samples];
    let population = Population {
        params: params.select(Axis(0), accepted),
        features: features.select(Axis(0), accepted),
        distances: accepted.iter().map(|&i| distances[i]).collect(),
        threshold: distances[accepted[n_samples - 1]],
    };
    Ok((population, features))
}

/// Simulates every row of `params`, in parallel, checking each output
/// against the expected feature dimension.
fn simulate_batch<S>(
    simulator: &S,
    params: &ArrayView2<f64>,
    expected_dim: usize,
    seed_base: u64,
) -> Result<Array2<f64>, AbcError>
where
    S: Simulator + Sync,
{
    let rows: Vec<Array1<f64>> = (0..params.nrows())
        .into_par_iter()
        .map(|i| {
            let mut rng = SmallRng::seed_from_u64(seed_base.wrapping_add(1 + i as u64));
            let out = simulator
                .simulate(params.row(i), &mut rng)
                .map_err(AbcError::Simulator)?;
            if out.len() != expected_dim {
                return Err(AbcError::DimensionMismatch {
                    expected: expected_dim,
                    got: out.len(),
                });
            }
            Ok(out)
        })
        .collect::<Result<_, _>>()?;

    let mut features = Array2::zeros((rows.len(), expected_dim));
    for (mut row, sim) in features.rows_mut().into_iter().zip(rows.iter()) {
        row.assign(sim);
    }
    Ok(features)
}
