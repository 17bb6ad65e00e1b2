//! Experience replay buffer
//!
//! A fixed-capacity FIFO of past transitions. Training samples uniform
//! minibatches from it without removing anything, which decorrelates
//! consecutive ticks of the same episode.

use rand::{seq::index, Rng};
use std::collections::VecDeque;

use super::config::ConfigError;
use super::observation::EncodedState;

/// One tick of experience
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: EncodedState,
    pub action: usize,
    pub reward: f32,
    pub next_state: EncodedState,
    pub done: bool,
}

/// Bounded FIFO store of transitions
///
/// # Example
///
/// ```rust
/// use snake_dqn::rl::{EncodedState, ReplayBuffer, Transition};
///
/// let mut buffer = ReplayBuffer::new(2).unwrap();
/// let state = EncodedState([0.0; 12]);
///
/// for reward in [1.0, 2.0, 3.0] {
///     buffer.push(Transition { state, action: 0, reward, next_state: state, done: false });
/// }
///
/// // The oldest transition was evicted
/// assert_eq!(buffer.len(), 2);
/// assert_eq!(buffer.iter().next().unwrap().reward, 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    transitions: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    /// Create an empty buffer; a zero capacity is a configuration error
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::new("replay capacity must be at least 1"));
        }

        Ok(Self {
            transitions: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a transition, evicting the oldest one when full
    pub fn push(&mut self, transition: Transition) {
        if self.transitions.len() >= self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Sample `batch_size` distinct transitions uniformly.
    ///
    /// Returns `None` while the buffer holds fewer than `batch_size`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, batch_size: usize) -> Option<Vec<&Transition>> {
        if batch_size == 0 || self.transitions.len() < batch_size {
            return None;
        }

        let picked = index::sample(rng, self.transitions.len(), batch_size);
        Some(picked.into_iter().map(|i| &self.transitions[i]).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}
