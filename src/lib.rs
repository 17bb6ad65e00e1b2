//! Snake DQN - a Snake game with a deep Q-learning agent
//!
//! This library provides:
//! - Core game logic (game module)
//! - State encoding, Q-network, replay buffer and DQN agent (rl module)
//! - TUI rendering and keyboard input (render, input modules)
//! - Episode statistics and CSV export (metrics module)
//! - Execution modes: human, train, play, evaluate (modes module)

pub mod game;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod rl;
