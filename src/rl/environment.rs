use super::observation::{encode_state, EncodedState};
use crate::game::{Action, Direction, GameConfig, GameEngine, GameError, GameState};

/// Outcome of one environment tick
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub observation: EncodedState,
    pub reward: f32,
    pub done: bool,
}

/// Snake environment for reinforcement learning
///
/// Wraps the game engine behind the agent-facing interface:
/// - 12-feature encoded observations
/// - Discrete action space of 4 directions (0=Up, 1=Right, 2=Down, 3=Left)
/// - reset / step returning (observation, reward, done)
pub struct SnakeEnvironment {
    engine: GameEngine,
    state: GameState,
}

impl SnakeEnvironment {
    /// Create a new Snake environment
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        let mut engine = GameEngine::new(config)?;
        let state = engine.reset();
        Ok(Self { engine, state })
    }

    /// Reset the environment and return the initial observation
    pub fn reset(&mut self) -> EncodedState {
        self.state = self.engine.reset();
        self.observation()
    }

    /// Step the environment with a discrete action index.
    ///
    /// Indices outside `0..4` are rejected rather than clamped. Stepping
    /// after the episode ended returns the current observation with zero
    /// reward and `done = true`.
    pub fn step(&mut self, action_idx: usize) -> Result<Step, GameError> {
        let direction = Direction::try_from(action_idx)?;
        let result = self.engine.step(&mut self.state, Action::Move(direction));

        Ok(Step {
            observation: self.observation(),
            reward: result.reward,
            done: result.terminated,
        })
    }

    /// Current observation without stepping
    pub fn observation(&self) -> EncodedState {
        encode_state(&self.state)
    }

    /// Read-only view of the game for renderers and metrics
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        self.engine.config()
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Position;

    fn env() -> SnakeEnvironment {
        SnakeEnvironment::new(GameConfig::small().with_seed(3)).unwrap()
    }

    #[test]
    fn test_environment_creation() {
        let env = env();
        assert!(env.state().is_alive());
        assert_eq!(env.state().score, 0);
        assert_eq!(env.state().steps, 0);
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(SnakeEnvironment::new(GameConfig::new(0, 5)).is_err());
    }

    #[test]
    fn test_invalid_action_fails_fast() {
        let mut env = env();
        let before = env.state().clone();

        assert_eq!(env.step(4), Err(GameError::InvalidAction(4)));
        assert_eq!(env.step(usize::MAX), Err(GameError::InvalidAction(usize::MAX)));
        assert_eq!(env.state(), &before);
    }

    #[test]
    fn test_step_returns_step_reward() {
        let mut env = env();
        env.state_mut().food = Position::new(0, 0);

        let step = env.step(1).unwrap();

        assert_eq!(step.reward, -0.1);
        assert!(!step.done);
        assert_eq!(step.observation, env.observation());
    }

    #[test]
    fn test_food_reward() {
        let mut env = env();
        let head = env.state().snake.head();
        env.state_mut().food = head.moved_by(1, 0);

        let step = env.step(1).unwrap();

        assert_eq!(step.reward, 100.0);
        assert_eq!(env.state().score, 1);
    }

    #[test]
    fn test_terminal_state_handling() {
        let mut env = env();
        env.state_mut().snake.body[0] = Position::new(9, 5);
        env.state_mut().food = Position::new(0, 0);

        let step = env.step(1).unwrap();
        assert!(step.done);
        assert_eq!(step.reward, -100.0);

        // Further steps are inert until reset
        let again = env.step(0).unwrap();
        assert!(again.done);
        assert_eq!(again.reward, 0.0);

        env.reset();
        assert!(env.state().is_alive());
    }

    #[test]
    fn test_multiple_episodes() {
        let mut env = env();

        for _ in 0..2 {
            env.reset();
            let mut steps = 0;
            let mut done = false;

            while !done {
                done = env.step(1).unwrap().done;
                steps += 1;
            }

            // Heading right from the centre of a 10-wide grid hits the wall
            assert_eq!(steps, 5);
        }
    }
}
