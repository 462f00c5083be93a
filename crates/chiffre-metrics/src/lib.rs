mod metrics;

pub use metrics::{mean_balance, ChiffreMetrics};
