//! Reinforcement learning for the Snake game
//!
//! Provides:
//! - 12-feature state encoding and the agent-facing environment
//! - Q-network approximator
//! - Experience replay buffer
//! - DQN agent with epsilon-greedy exploration and a target network
//! - Model persistence and greedy playback of saved models

pub mod agent;
pub mod backend;
pub mod buffer;
pub mod config;
pub mod environment;
pub mod network;
pub mod observation;
pub mod persistence;
pub mod policy;

pub use agent::{greedy_action, DqnAgent};
pub use backend::{default_device, InferenceBackend, TrainingBackend};
pub use buffer::{ReplayBuffer, Transition};
pub use config::{ConfigError, DqnConfig};
pub use environment::{SnakeEnvironment, Step};
pub use network::{QNetwork, QNetworkConfig, ACTION_COUNT};
pub use observation::{encode_state, EncodedState, STATE_SIZE};
pub use persistence::{ModelMetadata, PersistenceError};
pub use policy::GreedyPolicy;
