use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Parameters of a log-normal draw: `exp(mu_log + sigma_log * z)` with
/// `z ~ N(0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogNormalParams {
    pub mu_log: f64,
    pub sigma_log: f64,
}

impl LogNormalParams {
    pub fn median(&self) -> f64 {
        self.mu_log.exp()
    }
}

/// Source of multiplicative mutation factors.
///
/// Implementations must return a positive, finite factor.
pub trait MutationSource {
    fn sample_log_normal(&mut self, params: LogNormalParams) -> f64;
}

impl<S: MutationSource + ?Sized> MutationSource for &mut S {
    fn sample_log_normal(&mut self, params: LogNormalParams) -> f64 {
        (**self).sample_log_normal(params)
    }
}

impl<S: MutationSource + ?Sized> MutationSource for Box<S> {
    fn sample_log_normal(&mut self, params: LogNormalParams) -> f64 {
        (**self).sample_log_normal(params)
    }
}

/// Adapts any `rand` generator into a mutation source.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> MutationSource for RngSource<R> {
    fn sample_log_normal(&mut self, params: LogNormalParams) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        (params.mu_log + params.sigma_log * z).exp()
    }
}
