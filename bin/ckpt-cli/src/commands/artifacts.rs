// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `ckpt artifacts` command: list the files stored with a checkpoint, or
//! stream one of them to stdout.

use anyhow::Context;
use model_store::{CheckpointModel, LoadConfig, Model};
use std::io::Write;

pub fn execute(mut config: LoadConfig, show: Option<String>) -> anyhow::Result<()> {
    // Artifacts do not depend on parameter types.
    config.dtype = None;
    let model = CheckpointModel::from_config(&config).with_context(|| {
        format!("failed to load checkpoint '{}'", config.prefix.display())
    })?;

    match show {
        Some(name) => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let copied = model.load_artifact(&name, |stream| {
                std::io::copy(stream, &mut out).map_err(anyhow::Error::from)
            })?;
            out.flush()?;
            tracing::debug!("wrote {copied} bytes of '{name}'");
        }
        None => {
            let names = model.artifact_names()?;
            if names.is_empty() {
                eprintln!("no artifacts under '{}'", model.base_dir().display());
            }
            for name in names.iter() {
                println!("{name}");
            }
        }
    }
    Ok(())
}
