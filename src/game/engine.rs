use super::{
    action::{Action, Direction},
    config::GameConfig,
    state::{CollisionType, GameState, Position, Snake},
    GameError,
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::debug;

/// Random probes before falling back to enumerating free cells
const FOOD_SAMPLE_ATTEMPTS: usize = 64;

/// Information about a step
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Whether the snake ate food this step
    pub ate_food: bool,
    /// Why the episode ended, if it ended this step
    pub collision_type: Option<CollisionType>,
}

/// Result of a game step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Reward for this step
    pub reward: f32,
    /// Whether the game has terminated
    pub terminated: bool,
    pub info: StepInfo,
}

impl StepResult {
    fn ended(reward: f32, collision_type: CollisionType) -> Self {
        Self {
            reward,
            terminated: true,
            info: StepInfo {
                ate_food: false,
                collision_type: Some(collision_type),
            },
        }
    }
}

/// Applies the rules of the game to a [`GameState`]
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine, rejecting unusable configurations
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Start a new episode: one-cell snake at the centre heading right
    pub fn reset(&mut self) -> GameState {
        let center_x = (self.config.grid_width / 2) as i32;
        let center_y = (self.config.grid_height / 2) as i32;

        let snake = Snake::new(Position::new(center_x, center_y), Direction::Right, 1);

        // A fresh 1-cell snake always leaves a free cell (validated grid >= 2 cells)
        let food = self
            .spawn_food(&snake)
            .unwrap_or_else(|| Position::new(0, 0));

        GameState::new(snake, food, self.config.grid_width, self.config.grid_height)
    }

    /// Advance the game one tick.
    ///
    /// Stepping a terminal state is a no-op that reports `terminated` with
    /// zero reward and leaves the state untouched.
    pub fn step(&mut self, state: &mut GameState, action: Action) -> StepResult {
        if state.terminal {
            debug!("step called on a terminal game, ignoring");
            return StepResult {
                reward: 0.0,
                terminated: true,
                info: StepInfo {
                    ate_food: false,
                    collision_type: None,
                },
            };
        }

        // Reversal requests are dropped silently
        if let Action::Move(new_direction) = action {
            if !state.snake.direction.is_opposite(new_direction) {
                state.snake.direction = new_direction;
            }
        }

        let new_head = state.snake.head().moved_in_direction(state.snake.direction);

        state.steps = state.steps.saturating_add(1);
        state.steps_since_food = state.steps_since_food.saturating_add(1);

        if let Some(collision_type) = self.check_collision(state, new_head) {
            state.terminal = true;
            return StepResult::ended(self.config.death_reward, collision_type);
        }

        state.snake.push_head(new_head);

        if new_head != state.food {
            state.snake.pop_tail();
            return StepResult {
                reward: self.config.step_reward,
                terminated: false,
                info: StepInfo {
                    ate_food: false,
                    collision_type: None,
                },
            };
        }

        state.score += 1;
        state.steps_since_food = 0;

        let collision_type = match self.spawn_food(&state.snake) {
            Some(food) => {
                state.food = food;
                None
            }
            None => {
                debug!(score = state.score, "board is full");
                state.terminal = true;
                Some(CollisionType::BoardFull)
            }
        };

        StepResult {
            reward: self.config.food_reward,
            terminated: state.terminal,
            info: StepInfo {
                ate_food: true,
                collision_type,
            },
        }
    }

    /// Why the head cannot move to `pos`, if it cannot
    fn check_collision(&self, state: &GameState, pos: Position) -> Option<CollisionType> {
        if !state.is_in_bounds(pos) {
            return Some(CollisionType::Wall);
        }

        // The tail has not moved yet, so it still counts
        if state.is_occupied_by_snake(pos) {
            return Some(CollisionType::SelfCollision);
        }

        if state.steps_since_food >= self.config.max_steps_without_food {
            return Some(CollisionType::Stall);
        }

        None
    }

    /// Pick a uniformly random cell not covered by the snake.
    ///
    /// Rejection sampling is cheap while the board is sparse; once it keeps
    /// missing, the free cells are enumerated so the call always terminates.
    /// Returns `None` when the snake covers the whole board.
    fn spawn_food(&mut self, snake: &Snake) -> Option<Position> {
        let width = self.config.grid_width;
        let height = self.config.grid_height;

        for _ in 0..FOOD_SAMPLE_ATTEMPTS {
            let x = self.rng.gen_range(0..width) as i32;
            let y = self.rng.gen_range(0..height) as i32;
            let pos = Position::new(x, y);

            if !snake.occupies(pos) {
                return Some(pos);
            }
        }

        let free: Vec<Position> = (0..height as i32)
            .flat_map(|y| (0..width as i32).map(move |x| Position::new(x, y)))
            .filter(|pos| !snake.occupies(*pos))
            .collect();

        free.choose(&mut self.rng).copied()
    }
}
