//! End-to-end tests for the adaptive-distance SMC-ABC sampler.
//!
//! Covers the headline behaviors: scale normalization between features of
//! very different noise levels, per-round weight adaptation separating
//! informative from uninformative features, the degenerate-variance
//! guard, configuration-error reporting, and bit-exact reproducibility
//! under a fixed seed.

use mini_abc::distance::weighted_distances;
use mini_abc::distributions::{GaussianKernel, GaussianPrior, Prior, UniformPrior};
use mini_abc::error::{AbcError, SimulatorError};
use mini_abc::simulator::Simulator;
use mini_abc::smc::AdaptiveSmc;
use mini_abc::weights::estimate_weights;
use ndarray::{array, Array1, Array2, ArrayView1, Axis};
use ndarray_stats::QuantileExt;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Two features tracking the same parameter on very different noise
/// scales: S1 ~ N(theta, 1), S2 ~ N(theta, 100).
fn two_scale_sim(
    theta: ArrayView1<f64>,
    rng: &mut SmallRng,
) -> Result<Array1<f64>, SimulatorError> {
    let narrow = Normal::new(theta[0], 1.0).unwrap();
    let wide = Normal::new(theta[0], 100.0).unwrap();
    Ok(array![narrow.sample(rng), wide.sample(rng)])
}

/// S1 ~ N(theta, 0.1) is informative; S2 ~ N(1, 1) ignores theta.
fn uninformative_second_sim(
    theta: ArrayView1<f64>,
    rng: &mut SmallRng,
) -> Result<Array1<f64>, SimulatorError> {
    let informative = Normal::new(theta[0], 0.1).unwrap();
    let noise = Normal::new(1.0, 1.0).unwrap();
    Ok(array![informative.sample(rng), noise.sample(rng)])
}

/// Simulates every row of `params` with per-row seeded RNGs, mirroring
/// what one sampler round does internally.
fn simulate_all<S: Simulator>(simulator: &S, params: &Array2<f64>, seed: u64) -> Array2<f64> {
    let mut out = Array2::zeros((params.nrows(), 2));
    for (i, theta) in params.outer_iter().enumerate() {
        let mut rng = SmallRng::seed_from_u64(seed + i as u64);
        out.row_mut(i)
            .assign(&simulator.simulate(theta, &mut rng).unwrap());
    }
    out
}

/// Indices of the `n` smallest distances (stable order).
fn best_n(distances: &Array1<f64>, n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..distances.len()).collect();
    order.sort_by(|&i, &j| distances[i].total_cmp(&distances[j]));
    order.truncate(n);
    order
}

/// Scenario: one round over a 10k-candidate prior batch. The noisy
/// feature's batch variance dwarfs the narrow one's, so its weight must
/// come out much smaller, and selecting with those weights must beat a
/// plain Euclidean selection on the very same batch.
#[test]
fn weighting_normalizes_feature_scales() {
    let observed = array![20.0, 20.0];
    let prior = UniformPrior::new(array![0.0], array![50.0]);

    let mut rng = SmallRng::seed_from_u64(81);
    let params = prior.sample(10_000, &mut rng);
    let batch = simulate_all(&two_scale_sim, &params, 810);

    let w = estimate_weights(&batch.view());
    assert!(
        w[0] > 3.0 * w[1],
        "narrow feature weight {} should dominate noisy one {}",
        w[0],
        w[1]
    );

    let weighted = weighted_distances(&observed.view(), &batch.view(), Some(&w.view()));
    let unweighted = weighted_distances(&observed.view(), &batch.view(), None);

    let spread = |idx: &[usize]| {
        idx.iter().map(|&i| (params[[i, 0]] - 20.0).abs()).sum::<f64>() / idx.len() as f64
    };
    let spread_w = spread(&best_n(&weighted, 100));
    let spread_u = spread(&best_n(&unweighted, 100));
    assert!(
        spread_w < spread_u,
        "weighted selection spread {spread_w} should beat unweighted {spread_u}"
    );
}

/// Same scenario through the public round loop: the round-1 entry of the
/// weight history must already show the scale separation.
#[test]
fn round_one_weight_history_shows_scale_separation() {
    let prior = UniformPrior::new(array![0.0], array![50.0]);
    let mut smc = AdaptiveSmc::new(
        two_scale_sim,
        prior,
        GaussianKernel::default(),
        array![20.0, 20.0],
        100,
        0.01,
    )
    .set_seed(81);

    let result = smc.run(1).unwrap();
    assert_eq!(result.n_simulations, 10_000);
    assert_eq!(result.population.nrows(), 100);

    let w = &result.weight_history[0];
    assert!(w[0] > 3.0 * w[1], "expected w1 >> w2, got {w:?}");
}

/// Scenario: an uninformative feature's weight stays near 1 across all
/// rounds while the informative feature's weight grows as the proposal
/// concentrates.
#[test]
fn adaptive_weights_separate_informative_features() {
    let prior = GaussianPrior::new(array![0.0], array![100.0]);
    let mut smc = AdaptiveSmc::new(
        uninformative_second_sim,
        prior,
        GaussianKernel::default(),
        array![0.0, 0.0],
        1000,
        0.5,
    )
    .set_seed(4242);

    let result = smc.run(5).unwrap();
    assert_eq!(result.weight_history.len(), 5);

    let w1: Vec<f64> = result.weight_history.iter().map(|w| w[0]).collect();
    let w2: Vec<f64> = result.weight_history.iter().map(|w| w[1]).collect();

    for pair in w1.windows(2) {
        assert!(
            pair[1] > pair[0],
            "informative weight should grow each round: {w1:?}"
        );
    }
    for &w in &w2 {
        assert!(
            (0.85..1.15).contains(&w),
            "uninformative weight should stay near 1: {w2:?}"
        );
    }
}

/// Scenario: a simulator-constant feature must get weight 0 instead of a
/// division by zero, and later rounds must keep running with it ignored.
#[test]
fn constant_feature_weight_is_zeroed() {
    let constant_second = |theta: ArrayView1<f64>,
                           rng: &mut SmallRng|
     -> Result<Array1<f64>, SimulatorError> {
        let narrow = Normal::new(theta[0], 1.0).unwrap();
        Ok(array![narrow.sample(rng), 5.0])
    };
    let prior = UniformPrior::new(array![-10.0], array![10.0]);
    let mut smc = AdaptiveSmc::new(
        constant_second,
        prior,
        GaussianKernel::default(),
        array![0.0, 5.0],
        50,
        0.25,
    )
    .set_seed(7);

    let result = smc.run(2).unwrap();
    for entry in &result.weight_history {
        assert_eq!(entry[1], 0.0);
        assert!(entry[0] > 0.0);
    }
}

/// Scenario: quantile 1.5 must fail before a single simulation runs.
#[test]
fn bad_quantile_fails_without_simulating() {
    let calls = AtomicUsize::new(0);
    let counting = |theta: ArrayView1<f64>,
                    _rng: &mut SmallRng|
     -> Result<Array1<f64>, SimulatorError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(array![theta[0]])
    };
    let prior = UniformPrior::new(array![0.0], array![1.0]);
    let mut smc = AdaptiveSmc::new(
        &counting,
        prior,
        GaussianKernel::default(),
        array![0.5],
        100,
        1.5,
    );

    assert!(matches!(
        smc.run(3),
        Err(AbcError::InvalidQuantile { .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Fixed seed + deterministic simulator => bit-identical populations and
/// weight histories, independent of how rayon schedules the batch.
#[test]
fn runs_are_reproducible() {
    let run_once = || {
        let prior = UniformPrior::new(array![0.0], array![50.0]);
        let mut smc = AdaptiveSmc::new(
            two_scale_sim,
            prior,
            GaussianKernel::default(),
            array![20.0, 20.0],
            100,
            0.1,
        )
        .set_seed(123);
        smc.run(3).unwrap()
    };

    let a = run_once();
    let b = run_once();
    assert_eq!(a.population, b.population);
    assert_eq!(a.distances, b.distances);
    assert_eq!(a.thresholds, b.thresholds);
    assert_eq!(a.weight_history, b.weight_history);
    assert_eq!(a.n_simulations, b.n_simulations);
}

/// Within a round the threshold is exactly the largest accepted distance,
/// and every weight-history entry is non-negative.
#[test]
fn threshold_and_positivity_invariants() {
    let prior = UniformPrior::new(array![0.0], array![50.0]);
    let mut smc = AdaptiveSmc::new(
        two_scale_sim,
        prior,
        GaussianKernel::default(),
        array![20.0, 20.0],
        200,
        0.2,
    )
    .set_seed(55);

    let result = smc.run(4).unwrap();
    assert_eq!(result.threshold, *result.distances.max().unwrap());
    assert_eq!(result.threshold, result.distances[result.n_samples - 1]);
    for entry in &result.weight_history {
        assert!(entry.iter().all(|&w| w >= 0.0));
    }
    // The final population should have homed in on theta = 20.
    let mean = result.population.mean_axis(Axis(0)).unwrap()[0];
    assert!((mean - 20.0).abs() < 2.0, "population mean {mean} far off");
}
