//! Configuration data model.

use serde::{Deserialize, Serialize};

fn default_rewrite_k() -> usize {
    4
}

fn default_resub_k() -> usize {
    8
}

fn default_max_divisors() -> usize {
    150
}

fn default_max_cuts() -> usize {
    16
}

fn default_activity_vectors() -> usize {
    1024
}

fn default_activity_seed() -> u64 {
    0x5EED_CAFE
}

/// Optimizer defaults, overridable per `logopt` invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Default cut bound for rewriting.
    #[serde(default = "default_rewrite_k")]
    pub rewrite_k: usize,
    /// Default cut bound for resubstitution.
    #[serde(default = "default_resub_k")]
    pub resub_k: usize,
    /// Divisor cap for resubstitution.
    #[serde(default = "default_max_divisors")]
    pub max_divisors: usize,
    /// Cuts kept per entry during enumeration.
    #[serde(default = "default_max_cuts")]
    pub max_cuts: usize,
    /// Random vectors per switching-activity estimate.
    #[serde(default = "default_activity_vectors")]
    pub activity_vectors: usize,
    /// Seed for the activity estimator.
    #[serde(default = "default_activity_seed")]
    pub activity_seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            rewrite_k: default_rewrite_k(),
            resub_k: default_resub_k(),
            max_divisors: default_max_divisors(),
            max_cuts: default_max_cuts(),
            activity_vectors: default_activity_vectors(),
            activity_seed: default_activity_seed(),
        }
    }
}

/// The whole tool configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Optimizer defaults.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_parameters() {
        let config = ToolConfig::default();
        assert_eq!(config.optimizer.rewrite_k, 4);
        assert_eq!(config.optimizer.resub_k, 8);
        assert_eq!(config.optimizer.max_divisors, 150);
        assert_eq!(config.optimizer.max_cuts, 16);
    }
}
