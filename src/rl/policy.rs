use burn::tensor::backend::Backend;
use std::path::Path;

use super::agent::{greedy_action, q_values};
use super::network::{QNetwork, ACTION_COUNT};
use super::observation::EncodedState;
use super::persistence::{self, ModelMetadata, PersistenceError};

/// Saved network acting greedily, no exploration and no training
pub struct GreedyPolicy<B: Backend> {
    network: QNetwork<B>,
    metadata: ModelMetadata,
    device: B::Device,
}

impl<B: Backend> GreedyPolicy<B> {
    pub fn load(path: &Path, device: B::Device) -> Result<Self, PersistenceError> {
        let (network, metadata) = persistence::load_network::<B>(path, &device)?;
        Ok(Self {
            network,
            metadata,
            device,
        })
    }

    pub fn q_values(&self, state: &EncodedState) -> [f32; ACTION_COUNT] {
        q_values(self.network.forward(state.to_tensor(&self.device)))
    }

    /// Highest-valued action, ties to the lowest index
    pub fn act(&self, state: &EncodedState) -> usize {
        greedy_action(&self.q_values(state))
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
