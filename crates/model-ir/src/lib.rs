// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-ir
//!
//! On-disk representation of a model checkpoint.
//!
//! - [`CheckpointPaths`]: the `<prefix>-<epoch:04>.params` /
//!   `<prefix>-symbol.json` naming convention.
//! - [`SymbolGraph`]: the parsed computation-graph definition, with a
//!   **type-state pattern** (`Loaded` → `Validated`), exposing the ordered
//!   input names.
//! - [`read_params`] / [`write_params`]: the parameter-file codec
//!   (SafeTensors containers, entries kept in on-disk order).
//!
//! # Example
//! ```no_run
//! use model_ir::{read_params, CheckpointPaths, SymbolGraph};
//!
//! let paths = CheckpointPaths::new("./models/resnet-18", 0);
//! let symbol = SymbolGraph::from_file(paths.symbol()).unwrap().validate().unwrap();
//! let params = read_params(paths.params(), true).unwrap();
//! println!("{} ({} parameters)", symbol.summary(), params.len());
//! ```

mod error;
mod naming;
mod params;
pub mod symbol;

pub use error::ModelError;
pub use naming::{parse_params_file_name, CheckpointPaths, PARAMS_EXTENSION, SYMBOL_SUFFIX};
pub use params::{read_params, strip_name_prefix, write_params};
pub use symbol::{SymbolGraph, SymbolInput, SymbolNode};
