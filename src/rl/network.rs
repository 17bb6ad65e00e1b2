//! Q-value network for the Snake agent
//!
//! A small multilayer perceptron mapping the encoded state to one predicted
//! return per action.
//!
//! # Architecture
//!
//! ```text
//! Input: [batch, 12]
//!   ↓ Linear(12 → 64) + ReLU
//!   ↓ Linear(64 → 64) + ReLU
//!   ↓ Linear(64 → 4)
//! Output: [batch, 4] Q-values (Up, Right, Down, Left)
//! ```
//!
//! # Example
//!
//! ```rust
//! use snake_dqn::rl::{QNetworkConfig, STATE_SIZE};
//! use burn::backend::ndarray::NdArrayDevice;
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//!
//! let device = NdArrayDevice::default();
//! let network = QNetworkConfig::new().init::<NdArray<f32>>(&device);
//!
//! let states = Tensor::zeros([8, STATE_SIZE], &device);
//! assert_eq!(network.forward(states).dims(), [8, 4]);
//! ```

use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    tensor::{activation::relu, backend::Backend, Tensor},
};
use serde::{Deserialize, Serialize};

use super::observation::STATE_SIZE;

/// Number of discrete actions
pub const ACTION_COUNT: usize = 4;

/// Shape of the Q-network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QNetworkConfig {
    /// Input features (default: 12)
    pub input_size: usize,
    /// Width of the two hidden layers (default: [64, 64])
    pub hidden_sizes: [usize; 2],
    /// Output values, one per action (default: 4)
    pub num_actions: usize,
}

impl QNetworkConfig {
    pub fn new() -> Self {
        Self {
            input_size: STATE_SIZE,
            hidden_sizes: [64, 64],
            num_actions: ACTION_COUNT,
        }
    }

    pub fn with_hidden_sizes(mut self, hidden_sizes: [usize; 2]) -> Self {
        self.hidden_sizes = hidden_sizes;
        self
    }

    /// Initialize a network with freshly randomized weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        QNetwork {
            fc1: LinearConfig::new(self.input_size, self.hidden_sizes[0]).init(device),
            fc2: LinearConfig::new(self.hidden_sizes[0], self.hidden_sizes[1]).init(device),
            output: LinearConfig::new(self.hidden_sizes[1], self.num_actions).init(device),
        }
    }
}

impl Default for QNetworkConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Multilayer perceptron approximating Q(s, a)
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    /// Linear output layer, one unit per action
    output: Linear<B>,
}

impl<B: Backend> QNetwork<B> {
    /// Predict Q-values for a batch of encoded states.
    ///
    /// `states` has shape `[batch, 12]`; the result has shape `[batch, 4]`.
    pub fn forward(&self, states: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.fc1.forward(states));
        let x = relu(self.fc2.forward(x));
        self.output.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};
    use burn::backend::Autodiff;
    use burn::tensor::{Distribution, TensorData};

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_forward_pass_shapes() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::new().init::<TestBackend>(&device);

        for batch_size in [1, 4, 64] {
            let states = Tensor::zeros([batch_size, STATE_SIZE], &device);
            assert_eq!(network.forward(states).dims(), [batch_size, ACTION_COUNT]);
        }
    }

    #[test]
    fn test_custom_hidden_sizes() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::new()
            .with_hidden_sizes([16, 8])
            .init::<TestBackend>(&device);

        let states = Tensor::ones([2, STATE_SIZE], &device);
        assert_eq!(network.forward(states).dims(), [2, ACTION_COUNT]);
    }

    #[test]
    fn test_gradient_flow() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::new().init::<TestAutodiffBackend>(&device);

        let states = Tensor::<TestAutodiffBackend, 2>::ones([1, STATE_SIZE], &device).require_grad();
        let loss = network.forward(states.clone()).sum();
        let gradients = loss.backward();

        assert!(
            states.grad(&gradients).is_some(),
            "Gradients should flow back to the input"
        );
    }

    #[test]
    fn test_batch_consistency() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::new().init::<TestBackend>(&device);

        let single = Tensor::<TestBackend, 2>::random(
            [1, STATE_SIZE],
            Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let batch = Tensor::cat(vec![single.clone(), single.clone(), single.clone()], 0);

        let single_q: TensorData = network.forward(single).into_data();
        let batch_q: TensorData = network.forward(batch).into_data();

        let single_vals = single_q.as_slice::<f32>().unwrap();
        let batch_vals = batch_q.as_slice::<f32>().unwrap();

        for row in 0..3 {
            for a in 0..ACTION_COUNT {
                let diff = (single_vals[a] - batch_vals[row * ACTION_COUNT + a]).abs();
                assert!(diff < 1e-5, "row {row} action {a} differs by {diff}");
            }
        }
    }

    #[test]
    fn test_output_finite() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::new().init::<TestBackend>(&device);

        let states = Tensor::random([16, STATE_SIZE], Distribution::Uniform(0.0, 1.0), &device);
        let q: TensorData = network.forward(states).into_data();

        for &val in q.as_slice::<f32>().unwrap() {
            assert!(val.is_finite(), "Q-values should be finite, got: {}", val);
        }
    }
}
