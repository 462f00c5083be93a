use crate::config::{
    BIAS_CEILING, ETHICS_STABILITY_RATE, FLOW_CAP, INCOMING_FLOW_WEIGHT, STABILITY_FLOW_RATE,
    VOLATILITY_FLOW_RATE,
};
use serde::{Deserialize, Serialize};

/// Accumulated behavior of one wallet, biasing its future mutations.
///
/// Biases only ever grow, by multiplication with factors >= 1, and stop at
/// `BIAS_CEILING`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Amplifies variance in future mutations.
    pub volatility_bias: f64,
    /// Damps shocks, makes mutations gentler.
    pub stability_bias: f64,
    /// Number of mutations applied so far.
    pub events: u64,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            volatility_bias: 1.0,
            stability_bias: 1.0,
            events: 0,
        }
    }
}

impl Memory {
    /// Deterministic transfer. Outgoing flows destabilize twice as much as
    /// incoming flows of the same size.
    pub(crate) fn record_flow(&mut self, magnitude: f64, incoming: bool) {
        let m = magnitude.abs().min(FLOW_CAP) / FLOW_CAP;
        let direction = if incoming { INCOMING_FLOW_WEIGHT } else { 1.0 };

        self.stability_bias = amplify(self.stability_bias, STABILITY_FLOW_RATE * m);
        self.volatility_bias = amplify(self.volatility_bias, VOLATILITY_FLOW_RATE * direction * m);
    }

    /// Stochastic mutation with multiplicative `factor` under the raw,
    /// unclamped ethics score; only the ceiling bounds its effect.
    pub(crate) fn record_mutation(&mut self, factor: f64, ethics: f64) {
        self.events += 1;

        let shock = factor.ln().abs();
        self.volatility_bias = amplify(self.volatility_bias, shock);

        if ethics > 0.0 {
            self.stability_bias = amplify(self.stability_bias, ETHICS_STABILITY_RATE * ethics);
        }
    }
}

fn amplify(bias: f64, rate: f64) -> f64 {
    // NaN rates leave the bias as is.
    let rate = if rate > 0.0 { rate } else { 0.0 };
    (bias * (1.0 + rate)).min(BIAS_CEILING).max(bias)
}
