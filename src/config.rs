use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};

/// Exponential cooling is the only supported simulated-annealing method;
/// anything else is `ConfigurationInvalid`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimulatedAnnealingConfig {
    pub start_temperature: f64,
    pub end_temperature: f64,
    pub step: f64,
    pub method: String,
}

impl Default for SimulatedAnnealingConfig {
    fn default() -> Self {
        Self {
            start_temperature: 1000.0,
            end_temperature: 1.0,
            step: 1e-3,
            method: "exponential".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SelectorConfig {
    /// Scores awarded to the operator pair used this iteration, indexed
    /// as `[best, better, accepted, rejected]`.
    pub scores: [f64; 4],
    pub decay: f64,
    pub seg_length: u64,
    pub num_destroy: usize,
    pub num_repair: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            scores: [33.0, 9.0, 13.0, 0.0],
            decay: 0.8,
            seg_length: 100,
            num_destroy: 4,
            num_repair: 2,
        }
    }
}

/// Recognized configuration options. The crate never reads this from a
/// file or the environment, an embedding application deserializes it
/// however it likes (YAML, JSON, hand-built) and passes it to
/// `run_alns`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub seed: Option<u64>,
    pub num_iterations: u64,
    pub xi: f64,
    pub p: f64,
    pub simulated_annealing: SimulatedAnnealingConfig,
    pub selector: SelectorConfig,
    pub wait_time_weight: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            num_iterations: 1000,
            xi: 0.2,
            p: 10.0,
            simulated_annealing: SimulatedAnnealingConfig::default(),
            selector: SelectorConfig::default(),
            wait_time_weight: 0.5,
        }
    }
}

impl Config {
    /// Raises `ConfigurationInvalid` for an unsupported acceptance method
    /// or an out-of-range value. Called once before an ALNS run starts.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.simulated_annealing.method != "exponential" {
            bail!(
                "unsupported simulated_annealing.method: {:?} (only \"exponential\" is supported)",
                self.simulated_annealing.method
            );
        }
        ensure!(
            self.xi > 0.0 && self.xi <= 1.0,
            "xi must be in (0, 1], got {}",
            self.xi
        );
        ensure!(self.p > 0.0, "p must be positive, got {}", self.p);
        ensure!(
            self.simulated_annealing.end_temperature > 0.0,
            "simulated_annealing.end_temperature must be positive"
        );
        ensure!(
            self.simulated_annealing.start_temperature >= self.simulated_annealing.end_temperature,
            "simulated_annealing.start_temperature must be >= end_temperature"
        );
        ensure!(
            self.simulated_annealing.step > 0.0 && self.simulated_annealing.step < 1.0,
            "simulated_annealing.step must be in (0, 1)"
        );
        ensure!(
            self.selector.decay >= 0.0 && self.selector.decay <= 1.0,
            "selector.decay must be in [0, 1]"
        );
        ensure!(
            self.selector.seg_length > 0,
            "selector.seg_length must be positive"
        );
        ensure!(
            self.selector.num_destroy > 0 && self.selector.num_repair > 0,
            "selector.num_destroy and selector.num_repair must be positive"
        );
        Ok(())
    }
}
