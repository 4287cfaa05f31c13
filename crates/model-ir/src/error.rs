// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for checkpoint file parsing.

use std::path::PathBuf;

/// Errors that can occur when reading or writing checkpoint files.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A required checkpoint file does not exist.
    #[error("checkpoint file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// A checkpoint file exists but could not be read or written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The symbol JSON is malformed.
    #[error("failed to parse symbol file: {0}")]
    SymbolParse(#[from] serde_json::Error),

    /// The parameter file is not a valid SafeTensors container.
    #[error("failed to parse parameter file '{}': {detail}", path.display())]
    ParamsParse { path: PathBuf, detail: String },

    /// Two entries written to one parameter file share a name.
    #[error("duplicate parameter name '{name}'")]
    DuplicateName { name: String },

    /// The symbol graph parsed but is structurally invalid.
    #[error("invalid symbol graph: {0}")]
    InvalidGraph(String),

    /// A tensor stored in the parameter file is inconsistent.
    #[error("invalid tensor '{name}': {source}")]
    Tensor {
        name: String,
        #[source]
        source: tensor_core::TensorError,
    },
}

impl ModelError {
    /// Maps an I/O error on `path`, turning `NotFound` into [`ModelError::FileNotFound`].
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ModelError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ModelError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
