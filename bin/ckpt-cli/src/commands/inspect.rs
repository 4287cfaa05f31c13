// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `ckpt inspect` command: display a checkpoint's contents.
//!
//! Loads the parameter and symbol files and prints the parameter table, the
//! graph inputs, the inputs a caller must feed, and the artifact catalogue.

use super::{format_bytes, truncate};
use anyhow::Context;
use model_store::{CheckpointModel, LoadConfig, Model};

pub fn execute(config: LoadConfig) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║               ckpt · Checkpoint Inspector            ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let model = CheckpointModel::from_config(&config).with_context(|| {
        format!(
            "failed to load checkpoint '{}' epoch {}",
            config.prefix.display(),
            config.epoch
        )
    })?;
    let params = model.parameters()?;

    // ── Summary ────────────────────────────────────────────────
    println!("  Checkpoint: {}", model.paths().name());
    println!("  Epoch:      {}", model.paths().epoch());
    println!("  Directory:  {}", model.base_dir().display());
    println!("  Graph:      {}", model.symbol().summary());
    println!(
        "  Parameters: {} ({})",
        params.len(),
        format_bytes(params.total_bytes())
    );
    println!();

    // ── Parameters ─────────────────────────────────────────────
    println!(
        "  {:<4} {:<36} {:<6} {:<20} {:>12}",
        "Idx", "Name", "DType", "Shape", "Size",
    );
    println!("  {}", "-".repeat(82));
    for (i, (name, tensor)) in params.iter().enumerate() {
        println!(
            "  {:<4} {:<36} {:<6} {:<20} {:>12}",
            i,
            truncate(name, 36),
            model.engine().data_type(tensor).as_str(),
            truncate(&tensor.shape().to_string(), 20),
            format_bytes(tensor.size_bytes()),
        );
    }
    println!();

    // ── Inputs ─────────────────────────────────────────────────
    let inputs = model.symbol_inputs();
    println!("  Symbol inputs ({}):", inputs.len());
    for input in inputs {
        let source = if params.contains(&input.name) { "param" } else { "data" };
        println!("   {:<36} {source}", truncate(&input.name, 36));
    }
    println!();

    let required = model.describe_input()?;
    println!("  Required inputs ({}):", required.len());
    for desc in required.iter() {
        println!("   {desc}");
    }
    println!();

    // ── Artifacts ──────────────────────────────────────────────
    let artifacts = model.artifact_names()?;
    println!("  Artifacts ({}):", artifacts.len());
    for name in artifacts.iter() {
        println!("   {name}");
    }
    println!();

    Ok(())
}
