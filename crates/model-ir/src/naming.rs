// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Checkpoint file-naming convention.
//!
//! A checkpoint saved under `prefix` at `epoch` consists of two files in the
//! same directory:
//! - `<prefix>-<epoch:04>.params`: the parameter tensors.
//! - `<prefix>-symbol.json`: the symbol graph.
//!
//! Prefix `"models/A"` at epoch `122` therefore resolves to
//! `models/A-0122.params` and `models/A-symbol.json`, and `models/` is the
//! base directory searched for artifacts.

use std::path::{Path, PathBuf};

/// Extension of parameter files.
pub const PARAMS_EXTENSION: &str = "params";

/// Suffix appended to the prefix to form the symbol file name.
pub const SYMBOL_SUFFIX: &str = "-symbol.json";

/// Resolved file locations for one `(prefix, epoch)` checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPaths {
    name: String,
    epoch: u32,
    base_dir: PathBuf,
    params: PathBuf,
    symbol: PathBuf,
}

impl CheckpointPaths {
    /// Resolves the file names for `prefix` at `epoch`.
    ///
    /// # Example
    /// ```
    /// use model_ir::CheckpointPaths;
    ///
    /// let paths = CheckpointPaths::new("models/A", 122);
    /// assert_eq!(paths.params_file_name(), "A-0122.params");
    /// assert_eq!(paths.symbol_file_name(), "A-symbol.json");
    /// ```
    pub fn new(prefix: impl AsRef<Path>, epoch: u32) -> Self {
        let prefix = prefix.as_ref();
        let name = prefix
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base_dir = match prefix.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let params = base_dir.join(format!("{name}-{epoch:04}.{PARAMS_EXTENSION}"));
        let symbol = base_dir.join(format!("{name}{SYMBOL_SUFFIX}"));
        Self {
            name,
            epoch,
            base_dir,
            params,
            symbol,
        }
    }

    /// Lists every checkpoint in `dir` whose parameter file follows the
    /// naming convention, sorted by name then epoch.
    ///
    /// Checkpoints without a matching symbol file are still listed; loading
    /// them reports the missing file.
    pub fn discover(dir: &Path) -> std::io::Result<Vec<CheckpointPaths>> {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some((name, epoch)) = parse_params_file_name(&file_name.to_string_lossy()) {
                found.push(CheckpointPaths::new(dir.join(name), epoch));
            }
        }
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.epoch.cmp(&b.epoch)));
        Ok(found)
    }

    /// The checkpoint name (final component of the prefix).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The checkpoint epoch.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Directory holding the checkpoint files; the root for artifact discovery.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Full path of the parameter file.
    pub fn params(&self) -> &Path {
        &self.params
    }

    /// Full path of the symbol file.
    pub fn symbol(&self) -> &Path {
        &self.symbol
    }

    /// File name of the parameter file, e.g. `"A-0122.params"`.
    pub fn params_file_name(&self) -> String {
        format!("{}-{:04}.{PARAMS_EXTENSION}", self.name, self.epoch)
    }

    /// File name of the symbol file, e.g. `"A-symbol.json"`.
    pub fn symbol_file_name(&self) -> String {
        format!("{}{SYMBOL_SUFFIX}", self.name)
    }

    /// Returns `true` if both checkpoint files exist.
    pub fn exists(&self) -> bool {
        self.params.is_file() && self.symbol.is_file()
    }
}

/// Splits a parameter file name into `(name, epoch)`.
///
/// Returns `None` unless the name has the form `<name>-<digits>.params`
/// with at least four epoch digits.
pub fn parse_params_file_name(file_name: &str) -> Option<(String, u32)> {
    let stem = file_name.strip_suffix(PARAMS_EXTENSION)?.strip_suffix('.')?;
    let (name, epoch) = stem.rsplit_once('-')?;
    if name.is_empty() || epoch.len() < 4 || !epoch.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((name.to_string(), epoch.parse().ok()?))
}
