use mini_abc::distributions::{GaussianKernel, UniformPrior};
use mini_abc::error::SimulatorError;
use mini_abc::smc::{AdaptiveSmc, Weighting};
use ndarray::{array, Array1, ArrayView1, Axis};
use rand::rngs::SmallRng;
use rand_distr::{Distribution, Normal};

/// Two features track the same parameter, one sharply (std 1) and one
/// drowned in noise (std 100). Adaptive weighting should discover that
/// the second feature deserves almost no say.
fn simulate(theta: ArrayView1<f64>, rng: &mut SmallRng) -> Result<Array1<f64>, SimulatorError> {
    let narrow = Normal::new(theta[0], 1.0).unwrap();
    let wide = Normal::new(theta[0], 100.0).unwrap();
    Ok(array![narrow.sample(rng), wide.sample(rng)])
}

fn main() {
    let observed = array![20.0, 20.0];

    let mut adaptive = AdaptiveSmc::new(
        simulate,
        UniformPrior::new(array![0.0], array![50.0]),
        GaussianKernel::default(),
        observed.clone(),
        500,
        0.05,
    )
    .set_seed(42);
    let adaptive_result = adaptive.run_progress(4).unwrap();

    let mut plain = AdaptiveSmc::new(
        simulate,
        UniformPrior::new(array![0.0], array![50.0]),
        GaussianKernel::default(),
        observed,
        500,
        0.05,
    )
    .set_seed(42)
    .set_weighting(Weighting::Fixed(None));
    let plain_result = plain.run_progress(4).unwrap();

    let summary = |name: &str, result: &mini_abc::smc::SmcResult| {
        let mean = result.population.mean_axis(Axis(0)).unwrap()[0];
        let std = result.population.std_axis(Axis(0), 0.0)[0];
        println!(
            "{name}: mean={mean:.3} std={std:.3} eps={:.3} sims={}",
            result.threshold, result.n_simulations
        );
    };
    summary("adaptive", &adaptive_result);
    summary("fixed   ", &plain_result);

    println!("weight history (adaptive):");
    for (round, w) in adaptive_result.weight_history.iter().enumerate() {
        println!("  round {}: w = {:.4?}", round + 1, w.to_vec());
    }
}
