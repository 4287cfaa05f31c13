// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `ckpt cast` command: convert every parameter to a new data type and
//! save the result as a new checkpoint.
//!
//! ```text
//! load(prefix, epoch) → cast(dtype) → save(out)
//! ```

use super::format_bytes;
use anyhow::Context;
use model_store::{CheckpointModel, LoadConfig, Model};
use std::path::PathBuf;
use std::time::Instant;
use tensor_core::DType;

pub fn execute(mut config: LoadConfig, dtype: DType, out: PathBuf) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║               ckpt · Checkpoint Converter            ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // The target comes from --dtype; a configured dtype would cast twice.
    config.dtype = None;

    println!("  [1/3] Loading '{}' epoch {}...", config.prefix.display(), config.epoch);
    let model = CheckpointModel::from_config(&config).with_context(|| {
        format!("failed to load checkpoint '{}'", config.prefix.display())
    })?;
    let before = model.parameters()?.total_bytes();
    println!(
        "        {} parameters, {}",
        model.parameters()?.len(),
        format_bytes(before)
    );

    println!("  [2/3] Casting to {dtype}...");
    let start = Instant::now();
    let cast = model
        .cast(dtype)
        .with_context(|| format!("cannot cast parameters to {dtype}"))?;
    let after = cast.parameters()?.total_bytes();
    println!(
        "        {} → {} in {:.1} ms",
        format_bytes(before),
        format_bytes(after),
        start.elapsed().as_secs_f64() * 1000.0
    );

    println!("  [3/3] Saving to '{}'...", out.display());
    let written = cast.save(&out)?;
    println!("        {}", written.params().display());
    println!("        {}", written.symbol().display());
    println!();

    Ok(())
}
