use mini_abc::distributions::{GaussianKernel, GaussianPrior};
use mini_abc::error::SimulatorError;
use mini_abc::smc::AdaptiveSmc;
use ndarray::{array, Array1, ArrayView1};
use rand::rngs::SmallRng;
use rand_distr::{Distribution, Normal};

/// The first feature follows the parameter closely; the second ignores it
/// entirely. Watch the weight history: the informative feature's weight
/// climbs round over round while the uninformative one stays put.
fn simulate(theta: ArrayView1<f64>, rng: &mut SmallRng) -> Result<Array1<f64>, SimulatorError> {
    let informative = Normal::new(theta[0], 0.1).unwrap();
    let noise = Normal::new(1.0, 1.0).unwrap();
    Ok(array![informative.sample(rng), noise.sample(rng)])
}

fn main() {
    let mut smc = AdaptiveSmc::new(
        simulate,
        GaussianPrior::new(array![0.0], array![100.0]),
        GaussianKernel::default(),
        array![0.0, 0.0],
        1000,
        0.5,
    )
    .set_seed(7);

    let result = smc.run_progress(5).unwrap();

    println!("round | w_informative | w_noise | eps");
    for (i, w) in result.weight_history.iter().enumerate() {
        println!(
            "{:>5} | {:>13.4} | {:>7.4} | {:.4}",
            i + 1,
            w[0],
            w[1],
            result.thresholds[i]
        );
    }
    println!("total simulations: {}", result.n_simulations);
}
