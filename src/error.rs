//! Error types for the SMC-ABC round loop.
//!
//! Configuration problems are caught before any simulation is dispatched;
//! simulator failures abort the run. A zero-variance feature is *not* an
//! error: the weight estimator recovers by zeroing that feature's weight
//! (visible in the weight history).

use thiserror::Error;

/// Boxed error type produced by a [`Simulator`](crate::simulator::Simulator)
/// collaborator.
pub type SimulatorError = Box<dyn std::error::Error + Send + Sync>;

/// Failures surfaced by [`AdaptiveSmc`](crate::smc::AdaptiveSmc).
#[derive(Debug, Error)]
pub enum AbcError {
    /// The retention quantile lies outside `(0, 1]`, so the proposal batch
    /// would be smaller than the requested population.
    #[error("quantile {quantile} is outside (0, 1]; the batch of {batch_size} candidates cannot cover {n_samples} samples")]
    InvalidQuantile {
        quantile: f64,
        n_samples: usize,
        batch_size: usize,
    },

    /// The requested population is empty, so no round could ever retain a
    /// particle.
    #[error("requested population size {n_samples} must be at least 1")]
    InvalidPopulationSize { n_samples: usize },

    /// A run needs at least one round to produce a population.
    #[error("requested round count {n_rounds} must be at least 1")]
    InvalidRounds { n_rounds: usize },

    /// The simulator returned a feature vector whose length differs from
    /// the observed data's.
    #[error("simulator returned {got} features but the observed data has {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The simulator itself failed; the run is aborted and the last fully
    /// completed round remains available for inspection.
    #[error("simulator failed: {0}")]
    Simulator(#[from] SimulatorError),
}
