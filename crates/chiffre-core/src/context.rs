use serde::{Deserialize, Serialize};

/// Ethical score of the actor holding a wallet, expected in [-1, +1].
///
/// Positive scores reduce variance and add slight positive drift; negative
/// scores widen variance and bias towards losses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EthicsScore {
    pub score: f64,
}

impl EthicsScore {
    pub const fn new(score: f64) -> Self {
        Self { score }
    }

    /// Score as used by the draw: NaN counts as neutral.
    pub fn clamped(self) -> f64 {
        nan_to_zero(self.score).clamp(-1.0, 1.0)
    }
}

/// Position within a periodic cycle, expected in [0, 1).
///
/// 0.0 and 0.5 are the zero crossings of the variance boost; 0.25 is the
/// peak (x1.5) and 0.75 the trough (x0.5).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CyclePhase {
    pub phase: f64,
}

impl CyclePhase {
    pub const fn new(phase: f64) -> Self {
        Self { phase }
    }

    /// Phase of `step` within a cycle of `period` steps.
    pub fn from_step(step: u64, period: u64) -> Self {
        if period == 0 {
            return Self::default();
        }
        Self::new((step % period) as f64 / period as f64)
    }

    pub fn clamped(self) -> f64 {
        nan_to_zero(self.phase).clamp(0.0, 1.0)
    }
}

fn nan_to_zero(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}
