//! DQN hyperparameter configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::network::QNetworkConfig;

/// Rejected hyperparameter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid agent configuration: {0}")]
pub struct ConfigError(String);

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Configuration for the deep Q-learning agent
///
/// Defaults are tuned for the 12-feature Snake environment.
///
/// # Example
///
/// ```rust
/// use snake_dqn::rl::DqnConfig;
///
/// let config = DqnConfig {
///     learning_rate: 5e-4,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqnConfig {
    /// Maximum number of transitions kept for replay
    ///
    /// Default: 10 000
    pub replay_capacity: usize,

    /// Discount factor applied to the bootstrapped next-state value
    ///
    /// Default: 0.95
    pub gamma: f32,

    /// Exploration rate at construction
    ///
    /// Default: 1.0
    pub epsilon_start: f64,

    /// Exploration never decays below this floor
    ///
    /// Default: 0.01
    pub epsilon_min: f64,

    /// Multiplicative decay applied after each training step
    ///
    /// Default: 0.995
    pub epsilon_decay: f64,

    /// Learning rate for the Adam optimizer
    ///
    /// Default: 1e-3
    pub learning_rate: f64,

    /// Q-network shape
    pub network: QNetworkConfig,

    /// Seed for exploration and minibatch sampling; `None` uses OS entropy
    pub seed: Option<u64>,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            replay_capacity: 10_000,
            gamma: 0.95,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            learning_rate: 1e-3,
            network: QNetworkConfig::default(),
            seed: None,
        }
    }
}

impl DqnConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replay_capacity == 0 {
            return Err(ConfigError::new("replay_capacity must be at least 1"));
        }

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::new(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }

        if !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err(ConfigError::new(format!(
                "epsilon_min must be in [0, 1], got {}",
                self.epsilon_min
            )));
        }

        if !(self.epsilon_min..=1.0).contains(&self.epsilon_start) {
            return Err(ConfigError::new(format!(
                "epsilon_start must be in [epsilon_min, 1], got {}",
                self.epsilon_start
            )));
        }

        if self.epsilon_decay <= 0.0 || self.epsilon_decay > 1.0 {
            return Err(ConfigError::new(format!(
                "epsilon_decay must be in (0, 1], got {}",
                self.epsilon_decay
            )));
        }

        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ConfigError::new(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }

        if self.network.hidden_sizes.contains(&0) {
            return Err(ConfigError::new("hidden layer sizes must be at least 1"));
        }

        Ok(())
    }
}
