// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Load configuration read from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! prefix = "./models/resnet/resnet-18"
//! epoch = 0
//! dtype = "f16"
//! strip_name_prefixes = true
//! ```

use crate::StoreError;
use std::path::{Path, PathBuf};
use tensor_core::DType;

/// Describes which checkpoint to load and how.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoadConfig {
    /// Checkpoint prefix: directory plus checkpoint name.
    pub prefix: PathBuf,
    /// Checkpoint epoch.
    #[serde(default)]
    pub epoch: u32,
    /// Data type to cast every parameter to after loading (e.g. `"f16"`).
    pub dtype: Option<String>,
    /// Whether to strip `arg:` / `aux:` prefixes from parameter names.
    #[serde(default = "default_true")]
    pub strip_name_prefixes: bool,
}

fn default_true() -> bool {
    true
}

impl LoadConfig {
    /// Creates a config for `prefix` at `epoch` with default options.
    pub fn new(prefix: impl Into<PathBuf>, epoch: u32) -> Self {
        Self {
            prefix: prefix.into(),
            epoch,
            ..Self::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, StoreError> {
        toml::from_str(toml_str).map_err(|e| StoreError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, StoreError> {
        toml::to_string_pretty(self)
            .map_err(|e| StoreError::Config(format!("TOML serialise error: {e}")))
    }

    /// Parses the optional `dtype` field.
    pub fn target_dtype(&self) -> Result<Option<DType>, StoreError> {
        self.dtype
            .as_deref()
            .map(|s| {
                DType::parse(s).ok_or_else(|| {
                    StoreError::InvalidArgument(format!(
                        "unknown dtype '{s}'; expected one of f32, f64, f16, bf16, i8, i32, u8"
                    ))
                })
            })
            .transpose()
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            prefix: PathBuf::from("./model"),
            epoch: 0,
            dtype: None,
            strip_name_prefixes: true,
        }
    }
}
