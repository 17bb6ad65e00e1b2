//! Backend type aliases and device management
//!
//! - **TrainingBackend**: Autodiff-enabled NdArray backend (CPU) for the live
//!   network
//! - **InferenceBackend**: Plain NdArray backend for the target network and
//!   for playing saved models
//!
//! A 12-feature MLP is far too small to benefit from a GPU backend.
//!
//! # Example
//!
//! ```rust
//! use snake_dqn::rl::{default_device, InferenceBackend, QNetworkConfig};
//!
//! let device = default_device();
//! let network = QNetworkConfig::new().init::<InferenceBackend>(&device);
//! ```

use burn::backend::{
    ndarray::{NdArray, NdArrayDevice},
    Autodiff,
};

/// Backend for training (with autodiff)
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Backend for inference (no gradient tracking)
pub type InferenceBackend = NdArray<f32>;

/// Default device for computation (CPU)
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Tensor;

    #[test]
    fn test_device_is_usable_by_both_backends() {
        let device = default_device();

        let a = Tensor::<TrainingBackend, 1>::ones([3], &device);
        let b = Tensor::<InferenceBackend, 1>::ones([3], &device);

        assert_eq!(a.dims(), b.dims());
    }
}
