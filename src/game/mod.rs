//! Core game logic module for Snake
//!
//! This module contains all the game rules without any I/O or rendering dependencies.
//! It is driven both by the keyboard (human mode) and by the learning agent.

pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod state;

// Re-export commonly used types
pub use action::{Action, Direction};
pub use config::GameConfig;
pub use engine::{GameEngine, StepInfo, StepResult};
pub use error::GameError;
pub use state::{CollisionType, GameState, Position, Snake};
