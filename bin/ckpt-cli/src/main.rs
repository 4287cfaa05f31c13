// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # ckpt
//!
//! Command-line interface for model checkpoints.
//!
//! ## Usage
//! ```bash
//! # Show parameters, inputs and artifacts
//! ckpt inspect --prefix ./models/resnet-18 --epoch 0
//!
//! # Inspect the newest epoch on disk
//! ckpt inspect --prefix ./models/resnet-18 --latest
//!
//! # List artifacts, or print one
//! ckpt artifacts --prefix ./models/resnet-18 --show synset.txt
//!
//! # Convert every parameter to f16 and save a new checkpoint
//! ckpt cast --prefix ./models/resnet-18 --dtype f16 --out ./models/resnet-18-fp16
//! ```

mod commands;

use clap::{Parser, Subcommand};
use commands::CheckpointArgs;
use tensor_core::DType;

#[derive(Parser)]
#[command(
    name = "ckpt",
    about = "Inspect, convert and unpack model checkpoints",
    version,
    author
)]
struct Cli {
    /// Path to a TOML load configuration (command-line flags take precedence).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print parameters, symbol inputs, required inputs and artifacts.
    Inspect {
        #[command(flatten)]
        checkpoint: CheckpointArgs,
    },

    /// List the artifact files stored with a checkpoint.
    Artifacts {
        #[command(flatten)]
        checkpoint: CheckpointArgs,

        /// Write the named artifact to stdout instead of listing.
        #[arg(long)]
        show: Option<String>,
    },

    /// Convert every parameter to another data type and save the result.
    Cast {
        #[command(flatten)]
        checkpoint: CheckpointArgs,

        /// Target data type: f32, f64, f16, bf16, i8, i32, u8.
        #[arg(short, long, value_parser = parse_dtype)]
        dtype: DType,

        /// Prefix of the checkpoint to write.
        #[arg(short, long)]
        out: std::path::PathBuf,
    },
}

fn parse_dtype(s: &str) -> Result<DType, String> {
    DType::parse(s).ok_or_else(|| format!("unknown dtype '{s}'"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Inspect { checkpoint } => commands::inspect::execute(checkpoint.resolve(config)?),
        Commands::Artifacts { checkpoint, show } => {
            commands::artifacts::execute(checkpoint.resolve(config)?, show)
        }
        Commands::Cast {
            checkpoint,
            dtype,
            out,
        } => commands::cast::execute(checkpoint.resolve(config)?, dtype, out),
    }
}
