use serde::{Deserialize, Serialize};

use super::GameError;

/// Configuration for the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Width of the game grid
    pub grid_width: usize,
    /// Height of the game grid
    pub grid_height: usize,

    // Rewards (for RL)
    /// Reward for eating food
    pub food_reward: f32,
    /// Reward for every other surviving step (small penalty)
    pub step_reward: f32,
    /// Reward on the tick the episode dies
    pub death_reward: f32,

    /// Ticks without eating before the episode is force-terminated
    pub max_steps_without_food: u32,

    /// Seed for food placement; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 20,
            food_reward: 100.0,
            step_reward: -0.1,
            death_reward: -100.0,
            max_steps_without_food: 100,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Never end a game for going too long without food
    pub fn without_stall_limit(mut self) -> Self {
        self.max_steps_without_food = u32::MAX;
        self
    }

    /// Number of cells on the board
    pub fn cell_count(&self) -> usize {
        self.grid_width * self.grid_height
    }

    /// Reject configurations the simulator cannot run
    pub fn validate(&self) -> Result<(), GameError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(GameError::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }

        if self.grid_width > i32::MAX as usize || self.grid_height > i32::MAX as usize {
            return Err(GameError::InvalidConfig(
                "grid dimensions must fit in i32 coordinates".to_string(),
            ));
        }

        if self.cell_count() < 2 {
            return Err(GameError::InvalidConfig(
                "grid needs room for the snake and one food cell".to_string(),
            ));
        }

        if self.max_steps_without_food == 0 {
            return Err(GameError::InvalidConfig(
                "max_steps_without_food must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("food_reward", self.food_reward),
            ("step_reward", self.step_reward),
            ("death_reward", self.death_reward),
        ] {
            if !value.is_finite() {
                return Err(GameError::InvalidConfig(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }

        Ok(())
    }
}
