// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-store
//!
//! Loaded model checkpoints: their parameters, the inputs a caller must
//! feed, and the artifact files stored alongside them.
//!
//! ## Components
//!
//! - [`ParameterStore`]: ordered `(name, tensor)` pairs with a revision stamp
//!   that changes on every mutation.
//! - [`InputResolver`]: symbol inputs minus loaded parameters, cached per
//!   store revision.
//! - [`ArtifactManager`]: lazy, memoized catalogue of the files next to the
//!   checkpoint, with stream and transform access.
//! - [`CheckpointModel`]: the [`Model`] façade tying the above together.
//! - [`LoadConfig`]: TOML-backed load options.
//!
//! # Example
//! ```no_run
//! use model_store::{CheckpointModel, Model};
//!
//! # fn demo() -> Result<(), model_store::StoreError> {
//! let model = CheckpointModel::load("models/A", 122)?;
//! println!("{} parameters", model.parameters()?.len());
//! for name in model.artifact_names()?.iter() {
//!     println!("artifact: {name}");
//! }
//! let labels = model.artifacts().read_lines("synset.txt")?;
//! # Ok(())
//! # }
//! ```

mod artifacts;
mod config;
mod describe;
mod error;
mod model;
mod parameters;

pub use artifacts::{ArtifactManager, ArtifactStream};
pub use config::LoadConfig;
pub use describe::{describe_input, DataDesc, InputResolver};
pub use error::StoreError;
pub use model::{CheckpointModel, Model, ModelState};
pub use parameters::ParameterStore;
