//! Model persistence for saving and loading trained agents
//!
//! A saved model is two files next to each other:
//! - `<path>.mpk` - network weights (Burn record format, full precision)
//! - `<path>.meta.json` - [`ModelMetadata`] as JSON
//!
//! Loading distinguishes a model that was never written
//! ([`PersistenceError::NotFound`]) from one that exists but cannot be used
//! ([`PersistenceError::Corrupt`]).

use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::Backend,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::config::DqnConfig;
use super::network::QNetwork;

/// Failure to save or restore a model
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Nothing has been saved at this location
    #[error("no saved model at {}", path.display())]
    NotFound { path: PathBuf },

    /// Files exist but cannot be decoded or do not fit the network
    #[error("saved model at {} is unusable: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to write model to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistenceError {
    fn corrupt(path: &Path, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Metadata saved with the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Agent configuration used during training; its network shape is used
    /// to rebuild the module before loading weights
    pub dqn_config: DqnConfig,

    /// Completed gradient steps
    pub training_steps: usize,

    /// Episodes the agent has been trained on
    pub episodes_trained: usize,

    /// Exploration rate at save time
    pub epsilon: f64,

    /// Crate version that wrote the model
    pub version: String,
}

impl ModelMetadata {
    pub fn new(
        dqn_config: DqnConfig,
        training_steps: usize,
        episodes_trained: usize,
        epsilon: f64,
    ) -> Self {
        Self {
            dqn_config,
            training_steps,
            episodes_trained,
            epsilon,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Location of the weights file for a model path
pub fn weights_path(path: &Path) -> PathBuf {
    with_suffix(path, ".mpk")
}

/// Location of the metadata sidecar for a model path
pub fn metadata_path(path: &Path) -> PathBuf {
    with_suffix(path, ".meta.json")
}

// Appended rather than `with_extension`, so dots already in the file name
// (`run.v2`) stay part of it
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Whether a model has been written at `path`
pub fn model_exists(path: &Path) -> bool {
    weights_path(path).is_file()
}

/// Save network weights and metadata.
///
/// Creates parent directories if they don't exist. Existing files are
/// overwritten.
pub fn save_network<B: Backend>(
    network: &QNetwork<B>,
    metadata: &ModelMetadata,
    path: &Path,
) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
    }

    // The recorder resets the extension itself; handing it the full weights
    // path keeps that a no-op
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(network.clone().into_record(), weights_path(path))
        .map_err(|e| PersistenceError::io(path, std::io::Error::other(format!("{e:?}"))))?;

    let meta_path = metadata_path(path);
    let meta_json = serde_json::to_string_pretty(metadata)
        .map_err(|e| PersistenceError::io(&meta_path, e.into()))?;
    std::fs::write(&meta_path, meta_json).map_err(|e| PersistenceError::io(&meta_path, e))?;

    Ok(())
}

/// Read the metadata sidecar of a saved model
pub fn load_metadata(path: &Path) -> Result<ModelMetadata, PersistenceError> {
    if !model_exists(path) {
        return Err(PersistenceError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let meta_path = metadata_path(path);
    let meta_json = std::fs::read_to_string(&meta_path)
        .map_err(|e| PersistenceError::corrupt(path, format!("metadata unreadable: {e}")))?;

    serde_json::from_str(&meta_json)
        .map_err(|e| PersistenceError::corrupt(path, format!("metadata invalid: {e}")))
}

/// Load a saved network, rebuilding it from the shape in its metadata
pub fn load_network<B: Backend>(
    path: &Path,
    device: &B::Device,
) -> Result<(QNetwork<B>, ModelMetadata), PersistenceError> {
    let metadata = load_metadata(path)?;
    let network = metadata.dqn_config.network.init::<B>(device);

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let record = recorder
        .load(weights_path(path), device)
        .map_err(|e| PersistenceError::corrupt(path, format!("weights unreadable: {e:?}")))?;

    Ok((network.load_record(record), metadata))
}
