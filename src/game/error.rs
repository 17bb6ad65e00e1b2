use thiserror::Error;

/// Errors raised by the game simulator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    /// Action index outside the four-direction action space
    #[error("invalid action index {0}, expected 0..4")]
    InvalidAction(usize),

    /// Configuration rejected at construction time
    #[error("invalid game configuration: {0}")]
    InvalidConfig(String),
}
