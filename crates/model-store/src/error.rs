// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model instances.

use model_ir::ModelError;
use std::path::PathBuf;

/// Errors surfaced by [`crate::CheckpointModel`] and its components.
///
/// Nothing is retried; every error reaches the immediate caller.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required checkpoint file does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A strict artifact lookup named an artifact that does not exist.
    #[error("artifact not found: {name}")]
    ArtifactNotFound { name: String },

    /// An identifier was empty or otherwise unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The parameter or symbol file failed to parse.
    #[error("malformed model: {0}")]
    MalformedModel(#[source] ModelError),

    /// A parameter cannot be represented in the requested type.
    #[error("unsupported data type for parameter '{name}': {source}")]
    UnsupportedDataType {
        name: String,
        #[source]
        source: tensor_core::TensorError,
    },

    /// A tensor-bearing operation was called on a closed model.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    /// The artifact directory or an artifact file could not be read.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Positional parameter access past the end of the store.
    #[error("index {index} out of range for {len} parameters")]
    IndexOutOfRange { index: usize, len: usize },

    /// The configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<ModelError> for StoreError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::FileNotFound { path } => StoreError::NotFound { path },
            other => StoreError::MalformedModel(other),
        }
    }
}
