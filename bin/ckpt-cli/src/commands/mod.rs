// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and the pieces they share.

pub mod artifacts;
pub mod cast;
pub mod inspect;

use anyhow::Context;
use model_ir::CheckpointPaths;
use model_store::LoadConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. `RUST_LOG` wins over `-v` when set.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Selects the checkpoint a subcommand works on.
#[derive(Debug, clap::Args)]
pub struct CheckpointArgs {
    /// Checkpoint prefix: directory plus name (e.g. `./models/resnet-18`).
    #[arg(short, long)]
    pub prefix: Option<PathBuf>,

    /// Checkpoint epoch.
    #[arg(short, long, conflicts_with = "latest")]
    pub epoch: Option<u32>,

    /// Use the highest epoch found next to the prefix.
    #[arg(long)]
    pub latest: bool,
}

impl CheckpointArgs {
    /// Merges these flags over the optional config file.
    pub fn resolve(self, config_path: Option<&Path>) -> anyhow::Result<LoadConfig> {
        let mut config = match config_path {
            Some(path) => LoadConfig::from_file(path)?,
            None => {
                let prefix = self
                    .prefix
                    .clone()
                    .context("no checkpoint given; pass --prefix or --config")?;
                LoadConfig::new(prefix, 0)
            }
        };
        if let Some(prefix) = self.prefix {
            config.prefix = prefix;
        }
        if let Some(epoch) = self.epoch {
            config.epoch = epoch;
        }
        if self.latest {
            config.epoch = latest_epoch(&config.prefix)?;
        }
        Ok(config)
    }
}

/// Finds the highest epoch saved for `prefix`.
fn latest_epoch(prefix: &Path) -> anyhow::Result<u32> {
    let wanted = CheckpointPaths::new(prefix, 0);
    let found = CheckpointPaths::discover(wanted.base_dir()).with_context(|| {
        format!("cannot scan '{}' for checkpoints", wanted.base_dir().display())
    })?;
    found
        .iter()
        .filter(|p| p.name() == wanted.name())
        .map(CheckpointPaths::epoch)
        .max()
        .with_context(|| format!("no checkpoints named '{}' found", wanted.name()))
}

/// Formats a byte count for display.
pub fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KB * KB {
        format!("{:.2} MB", b / (KB * KB))
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Truncates a string to `max_len` with ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
