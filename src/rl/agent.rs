//! Deep Q-learning agent
//!
//! Combines a live Q-network trained every step with a frozen target copy
//! used to compute bootstrapped targets, epsilon-greedy exploration, and an
//! experience replay buffer.

use burn::{
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, ElementConversion, Int, Tensor, TensorData},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::Path;
use tracing::debug;

use super::buffer::{ReplayBuffer, Transition};
use super::config::{ConfigError, DqnConfig};
use super::network::{QNetwork, ACTION_COUNT};
use super::observation::{batch_tensor, EncodedState};
use super::persistence::{self, ModelMetadata, PersistenceError};

/// DQN agent
///
/// # Type Parameters
///
/// * `B` - Autodiff backend for gradient computation; the target network
///   lives on its inner backend and never tracks gradients
///
/// # Example
///
/// ```rust
/// use snake_dqn::rl::{default_device, DqnAgent, DqnConfig, EncodedState, TrainingBackend};
///
/// let mut agent = DqnAgent::<TrainingBackend>::new(DqnConfig::default(), default_device()).unwrap();
/// let action = agent.select_action(&EncodedState([0.0; 12]), true);
/// assert!(action < 4);
///
/// // Nothing to learn from yet
/// assert_eq!(agent.train_step(64), None);
/// ```
pub struct DqnAgent<B: AutodiffBackend> {
    /// Live network, updated every training step
    network: QNetwork<B>,

    /// Snapshot of the live network, replaced wholesale by `sync_target`
    target: QNetwork<B::InnerBackend>,

    optim: OptimizerAdaptor<Adam, QNetwork<B>, B>,

    config: DqnConfig,

    buffer: ReplayBuffer,

    epsilon: f64,

    rng: StdRng,

    training_steps: usize,

    episodes_trained: usize,

    device: B::Device,
}

impl<B: AutodiffBackend> DqnAgent<B> {
    /// Create an agent with freshly initialized, identical live and target
    /// networks
    pub fn new(config: DqnConfig, device: B::Device) -> Result<Self, ConfigError> {
        config.validate()?;

        let network = config.network.init::<B>(&device);
        let target = network.valid();
        let buffer = ReplayBuffer::new(config.replay_capacity)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            network,
            target,
            optim: AdamConfig::new().init(),
            epsilon: config.epsilon_start,
            config,
            buffer,
            rng,
            training_steps: 0,
            episodes_trained: 0,
            device,
        })
    }

    /// Pick an action index for `state`.
    ///
    /// With `exploring` set, a uniformly random action is taken with
    /// probability epsilon. Otherwise the action with the highest predicted
    /// value is taken, ties going to the lowest index.
    pub fn select_action(&mut self, state: &EncodedState, exploring: bool) -> usize {
        if exploring && self.rng.gen::<f64>() < self.epsilon {
            return self.rng.gen_range(0..ACTION_COUNT);
        }

        greedy_action(&self.predict(state))
    }

    /// Live network's Q-values for one state
    pub fn predict(&self, state: &EncodedState) -> [f32; ACTION_COUNT] {
        q_values(self.network.valid().forward(state.to_tensor(&self.device)))
    }

    /// Target network's Q-values for one state
    pub fn predict_target(&self, state: &EncodedState) -> [f32; ACTION_COUNT] {
        q_values(self.target.forward(state.to_tensor(&self.device)))
    }

    /// Store a transition for replay
    pub fn remember(&mut self, transition: Transition) {
        self.buffer.push(transition);
    }

    /// One gradient step on a sampled minibatch.
    ///
    /// Returns `None` without touching anything while the buffer holds fewer
    /// than `batch_size` transitions. Otherwise returns the minibatch loss
    /// and decays epsilon.
    pub fn train_step(&mut self, batch_size: usize) -> Option<f32> {
        let batch = self.buffer.sample(&mut self.rng, batch_size)?;
        let n = batch.len();

        let states: Tensor<B, 2> = batch_tensor(batch.iter().map(|t| &t.state), &self.device);
        let next_states: Tensor<B::InnerBackend, 2> =
            batch_tensor(batch.iter().map(|t| &t.next_state), &self.device);

        let actions: Vec<i64> = batch.iter().map(|t| t.action as i64).collect();
        let actions: Tensor<B, 1, Int> =
            Tensor::from_data(TensorData::new(actions, [n]), &self.device);

        let rewards: Vec<f32> = batch.iter().map(|t| t.reward).collect();
        let rewards: Tensor<B::InnerBackend, 1> =
            Tensor::from_data(TensorData::new(rewards, [n]), &self.device);

        let continues: Vec<f32> = batch
            .iter()
            .map(|t| if t.done { 0.0 } else { 1.0 })
            .collect();
        let continues: Tensor<B::InnerBackend, 1> =
            Tensor::from_data(TensorData::new(continues, [n]), &self.device);

        // Terminal transitions bootstrap nothing
        let next_max = self.target.forward(next_states).max_dim(1).squeeze::<1>(1);
        let targets = rewards + (next_max * continues).mul_scalar(self.config.gamma);
        let targets = Tensor::<B, 1>::from_inner(targets);

        let predicted = self
            .network
            .forward(states)
            .gather(1, actions.unsqueeze_dim(1))
            .squeeze::<1>(1);

        let diff = predicted - targets;
        let loss = (diff.clone() * diff).mean();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.network);
        self.network = self
            .optim
            .step(self.config.learning_rate, self.network.clone(), grads);

        self.training_steps += 1;
        self.decay_epsilon();

        Some(loss.into_scalar().elem::<f32>())
    }

    fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
    }

    /// Replace the target network with a copy of the live network
    pub fn sync_target(&mut self) {
        self.target = self.network.valid();
        debug!(training_steps = self.training_steps, "Synchronized target network");
    }

    /// Save the live network and metadata to `path`
    pub fn persist(&self, path: &Path) -> Result<(), PersistenceError> {
        persistence::save_network(&self.network.valid(), &self.metadata(), path)
    }

    /// Load live weights from `path` and sync the target to them.
    ///
    /// Training and episode counters continue from the saved metadata;
    /// epsilon keeps its current value and the optimizer starts over. A
    /// model whose network shape differs from this agent's is reported as
    /// corrupt.
    pub fn restore(&mut self, path: &Path) -> Result<ModelMetadata, PersistenceError> {
        let metadata = persistence::load_metadata(path)?;
        if metadata.dqn_config.network != self.config.network {
            return Err(PersistenceError::Corrupt {
                path: path.to_path_buf(),
                reason: format!(
                    "network shape {:?} does not match {:?}",
                    metadata.dqn_config.network, self.config.network
                ),
            });
        }

        let (network, metadata) = persistence::load_network::<B>(path, &self.device)?;
        self.network = network;
        self.optim = AdamConfig::new().init();
        self.training_steps = metadata.training_steps;
        self.episodes_trained = metadata.episodes_trained;
        self.sync_target();

        debug!(path = %path.display(), version = %metadata.version, "Restored network weights");
        Ok(metadata)
    }

    fn metadata(&self) -> ModelMetadata {
        ModelMetadata::new(
            self.config.clone(),
            self.training_steps,
            self.episodes_trained,
            self.epsilon,
        )
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn training_steps(&self) -> usize {
        self.training_steps
    }

    pub fn episodes_trained(&self) -> usize {
        self.episodes_trained
    }

    pub fn increment_episode(&mut self) {
        self.episodes_trained += 1;
    }
}

/// Index of the largest value; ties go to the lowest index
pub fn greedy_action(values: &[f32; ACTION_COUNT]) -> usize {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = i;
        }
    }
    best
}

/// Flatten a `[1, ACTION_COUNT]` prediction
pub fn q_values<B: burn::tensor::backend::Backend>(
    prediction: Tensor<B, 2>,
) -> [f32; ACTION_COUNT] {
    let mut values = [0.0; ACTION_COUNT];
    let data = prediction.into_data();
    for (slot, value) in values.iter_mut().zip(data.iter::<f32>()) {
        *slot = value;
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::rl::{default_device, SnakeEnvironment, TrainingBackend};
    use tempfile::TempDir;

    fn config() -> DqnConfig {
        DqnConfig::default().with_seed(11)
    }

    fn create_test_agent() -> DqnAgent<TrainingBackend> {
        DqnAgent::new(config(), default_device()).unwrap()
    }

    fn state(tag: f32) -> EncodedState {
        let mut features = [0.0; 12];
        features[1] = 1.0;
        features[7] = tag;
        features[11] = 0.01;
        EncodedState(features)
    }

    fn fill(agent: &mut DqnAgent<TrainingBackend>, count: usize) {
        for i in 0..count {
            agent.remember(Transition {
                state: state((i % 2) as f32),
                action: i % ACTION_COUNT,
                reward: if i % 5 == 0 { 100.0 } else { -0.1 },
                next_state: state(((i + 1) % 2) as f32),
                done: i % 7 == 0,
            });
        }
    }

    #[test]
    fn test_agent_creation() {
        let agent = create_test_agent();
        assert_eq!(agent.epsilon(), 1.0);
        assert_eq!(agent.training_steps(), 0);
        assert_eq!(agent.buffer_len(), 0);
        assert_eq!(agent.predict(&state(0.0)), agent.predict_target(&state(0.0)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut bad = config();
        bad.replay_capacity = 0;
        assert!(DqnAgent::<TrainingBackend>::new(bad, default_device()).is_err());
    }

    #[test]
    fn test_greedy_action_ties_take_lowest_index() {
        assert_eq!(greedy_action(&[1.0, 3.0, 3.0, 0.0]), 1);
        assert_eq!(greedy_action(&[0.0, 0.0, 0.0, 0.0]), 0);
        assert_eq!(greedy_action(&[-1.0, -2.0, -0.5, -0.5]), 2);
    }

    #[test]
    fn test_exploit_matches_argmax() {
        let mut agent = create_test_agent();
        let s = state(1.0);
        let expected = greedy_action(&agent.predict(&s));

        for _ in 0..10 {
            assert_eq!(agent.select_action(&s, false), expected);
        }
    }

    #[test]
    fn test_full_exploration_covers_actions() {
        let mut agent = create_test_agent();
        let s = state(0.0);
        let mut seen = [false; ACTION_COUNT];

        for _ in 0..200 {
            seen[agent.select_action(&s, true)] = true;
        }

        assert!(seen.iter().all(|&s| s), "epsilon 1.0 should try every action");
    }

    #[test]
    fn test_train_step_requires_batch() {
        let mut agent = create_test_agent();
        fill(&mut agent, 10);

        assert_eq!(agent.train_step(32), None);
        assert_eq!(agent.epsilon(), 1.0);
        assert_eq!(agent.training_steps(), 0);
    }

    #[test]
    fn test_train_step_updates_live_only() {
        let mut agent = create_test_agent();
        fill(&mut agent, 64);
        let s = state(1.0);
        let before = agent.predict(&s);

        let loss = agent.train_step(32).unwrap();

        assert!(loss.is_finite());
        assert!(loss >= 0.0);
        assert_eq!(agent.training_steps(), 1);
        assert_ne!(agent.predict(&s), before, "live network should move");
        assert_eq!(agent.predict_target(&s), before, "target must stay frozen");

        agent.sync_target();
        assert_eq!(agent.predict_target(&s), agent.predict(&s));
    }

    #[test]
    fn test_epsilon_decay_and_floor() {
        let mut agent = create_test_agent();
        fill(&mut agent, 16);

        for n in 1..=5 {
            agent.train_step(8).unwrap();
            let expected = 0.995f64.powi(n).max(0.01);
            assert!((agent.epsilon() - expected).abs() < 1e-12);
        }

        let mut fast = config();
        fast.epsilon_decay = 0.5;
        fast.epsilon_min = 0.2;
        let mut agent = DqnAgent::<TrainingBackend>::new(fast, default_device()).unwrap();
        fill(&mut agent, 16);
        for _ in 0..10 {
            agent.train_step(8).unwrap();
        }
        assert_eq!(agent.epsilon(), 0.2);
    }

    #[test]
    fn test_learns_terminal_reward() {
        let mut cfg = config();
        cfg.learning_rate = 1e-2;
        let mut agent = DqnAgent::<TrainingBackend>::new(cfg, default_device()).unwrap();

        let s = state(1.0);
        for _ in 0..32 {
            agent.remember(Transition {
                state: s,
                action: 2,
                reward: 10.0,
                next_state: s,
                done: true,
            });
        }

        for _ in 0..300 {
            agent.train_step(16);
        }

        let q = agent.predict(&s);
        assert!((q[2] - 10.0).abs() < 1.0, "Q(s, 2) = {}", q[2]);
        assert_eq!(greedy_action(&q), 2);
    }

    #[test]
    fn test_persist_and_restore() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snake_model");
        let s = state(0.0);

        let mut agent = create_test_agent();
        fill(&mut agent, 64);
        agent.train_step(32);
        let saved = agent.predict(&s);
        agent.persist(&path).unwrap();

        for _ in 0..5 {
            agent.train_step(32);
        }
        assert_ne!(agent.predict(&s), saved);

        let metadata = agent.restore(&path).unwrap();
        assert_eq!(metadata.training_steps, 1);
        assert_eq!(agent.training_steps(), 1);
        for (a, b) in agent.predict(&s).iter().zip(saved) {
            assert!((a - b).abs() < 1e-6);
        }
        assert_eq!(agent.predict_target(&s), agent.predict(&s));
    }

    #[test]
    fn test_restore_missing_and_mismatched() {
        let dir = TempDir::new().unwrap();
        let mut agent = create_test_agent();

        let err = agent.restore(&dir.path().join("nothing")).unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound { .. }));

        let mut small = config();
        small.network = small.network.with_hidden_sizes([8, 8]);
        let other = DqnAgent::<TrainingBackend>::new(small, default_device()).unwrap();
        let path = dir.path().join("small");
        other.persist(&path).unwrap();

        let err = agent.restore(&path).unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt { .. }));
    }

    #[test]
    fn test_integration_with_environment() {
        let mut env = SnakeEnvironment::new(GameConfig::small().with_seed(5)).unwrap();
        let mut agent = create_test_agent();
        let mut obs = env.reset();
        let mut losses = Vec::new();

        for _ in 0..80 {
            let action = agent.select_action(&obs, true);
            let step = env.step(action).unwrap();
            agent.remember(Transition {
                state: obs,
                action,
                reward: step.reward,
                next_state: step.observation,
                done: step.done,
            });

            losses.extend(agent.train_step(16));
            obs = if step.done { env.reset() } else { step.observation };
        }

        assert!(!losses.is_empty());
        assert!(losses.iter().all(|l| l.is_finite()));
        assert_eq!(agent.buffer_len(), 80);
    }
}
