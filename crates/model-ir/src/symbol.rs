// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Symbol graph: the computation-graph definition saved next to a checkpoint.
//!
//! Only the parts needed to enumerate inputs are modelled. The graph is never
//! executed here.
//!
//! # Format
//! ```json
//! {
//!   "nodes": [
//!     { "op": "null", "name": "data", "inputs": [],
//!       "attrs": { "__shape__": "(1, 3, 224, 224)", "__dtype__": "0" } },
//!     { "op": "null", "name": "fc1_weight", "inputs": [] },
//!     { "op": "FullyConnected", "name": "fc1", "inputs": [[0, 0, 0], [1, 0, 0]] }
//!   ],
//!   "arg_nodes": [0, 1],
//!   "heads": [[2, 0, 0]]
//! }
//! ```
//!
//! Variables (`op == "null"`) are the graph inputs: data the caller feeds and
//! parameters the checkpoint supplies.
//!
//! # Type-State Pattern
//!
//! ```text
//! SymbolGraph<Loaded>: JSON parsed, not yet checked.
//!       │  .validate()
//!       ▼
//! SymbolGraph<Validated>: inputs enumerable, ready for a model.
//! ```

use crate::ModelError;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use tensor_core::{DType, Shape};

/// Operator name marking a variable node.
const VARIABLE_OP: &str = "null";

/// Attribute carrying a variable's declared shape.
const SHAPE_ATTR: &str = "__shape__";

/// Attribute carrying a variable's declared type flag.
const DTYPE_ATTR: &str = "__dtype__";

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been parsed but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

// ── Serialized form ────────────────────────────────────────────────

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct SymbolFile {
    nodes: Vec<SymbolNode>,
    #[serde(default)]
    arg_nodes: Option<Vec<usize>>,
    #[serde(default)]
    heads: Vec<Vec<usize>>,
}

/// A single node of the symbol graph.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SymbolNode {
    /// Operator name; `"null"` for variables.
    pub op: String,
    /// Node name, unique among variables.
    pub name: String,
    /// Upstream edges as `[node, output, version]` triples.
    #[serde(default)]
    pub inputs: Vec<Vec<usize>>,
    /// Operator / variable attributes.
    #[serde(default, alias = "attr", alias = "param")]
    pub attrs: BTreeMap<String, String>,
}

impl SymbolNode {
    fn is_variable(&self) -> bool {
        self.op == VARIABLE_OP
    }
}

/// A variable declared by the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInput {
    /// Variable name.
    pub name: String,
    /// Shape from the `__shape__` attribute, if declared and parseable.
    pub shape: Option<Shape>,
    /// Type from the `__dtype__` attribute, if declared and known.
    pub dtype: Option<DType>,
}

// ── SymbolGraph ────────────────────────────────────────────────────

/// A parsed symbol graph. `S` encodes the validation state.
#[derive(Debug, Clone)]
pub struct SymbolGraph<S: GraphState = Loaded> {
    nodes: Vec<SymbolNode>,
    /// Indices of variable nodes, in declaration order.
    arg_nodes: Vec<usize>,
    heads: Vec<Vec<usize>>,
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl SymbolGraph<Loaded> {
    /// Reads and parses a symbol file.
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
        Self::from_json(&content)
    }

    /// Parses a symbol graph from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let file: SymbolFile = serde_json::from_str(json)?;
        let arg_nodes = match file.arg_nodes {
            Some(indices) => indices,
            None => file
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| n.is_variable())
                .map(|(i, _)| i)
                .collect(),
        };
        Ok(Self {
            nodes: file.nodes,
            arg_nodes,
            heads: file.heads,
            _state: std::marker::PhantomData,
        })
    }

    /// Validates the graph and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - The graph has at least one node.
    /// - Every `arg_nodes` entry is in range and names a variable.
    /// - Variable names are unique.
    /// - Every head refers to an existing node.
    pub fn validate(self) -> Result<SymbolGraph<Validated>, ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidGraph("symbol graph contains no nodes".into()));
        }

        let mut seen = HashSet::new();
        for &index in &self.arg_nodes {
            let node = self.nodes.get(index).ok_or_else(|| {
                ModelError::InvalidGraph(format!(
                    "arg_nodes entry {index} out of range ({} nodes)",
                    self.nodes.len()
                ))
            })?;
            if !node.is_variable() {
                return Err(ModelError::InvalidGraph(format!(
                    "arg_nodes entry {index} ('{}') is a '{}' operator, not a variable",
                    node.name, node.op
                )));
            }
            if !seen.insert(node.name.as_str()) {
                return Err(ModelError::InvalidGraph(format!(
                    "duplicate input name '{}'",
                    node.name
                )));
            }
        }

        for head in &self.heads {
            if let Some(&index) = head.first() {
                if index >= self.nodes.len() {
                    return Err(ModelError::InvalidGraph(format!(
                        "head refers to missing node {index}"
                    )));
                }
            }
        }

        Ok(SymbolGraph {
            nodes: self.nodes,
            arg_nodes: self.arg_nodes,
            heads: self.heads,
            _state: std::marker::PhantomData,
        })
    }
}

// ── Validated state ────────────────────────────────────────────────

impl SymbolGraph<Validated> {
    /// Returns every input name in declaration order.
    pub fn input_names(&self) -> Vec<&str> {
        self.arg_nodes
            .iter()
            .map(|&i| self.nodes[i].name.as_str())
            .collect()
    }

    /// Returns every input with whatever shape/type the graph declares.
    pub fn inputs(&self) -> Vec<SymbolInput> {
        self.arg_nodes
            .iter()
            .map(|&i| {
                let node = &self.nodes[i];
                SymbolInput {
                    name: node.name.clone(),
                    shape: node.attrs.get(SHAPE_ATTR).and_then(|s| Shape::parse_tuple(s)),
                    dtype: node
                        .attrs
                        .get(DTYPE_ATTR)
                        .and_then(|s| s.trim().parse::<i64>().ok())
                        .and_then(DType::from_mxnet_code),
                }
            })
            .collect()
    }

    /// Returns the names of the nodes producing the graph outputs.
    pub fn output_names(&self) -> Vec<&str> {
        self.heads
            .iter()
            .filter_map(|h| h.first())
            .map(|&i| self.nodes[i].name.as_str())
            .collect()
    }

    /// Returns the total number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of operator (non-variable) nodes.
    pub fn num_operators(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_variable()).count()
    }

    /// Returns a one-line description of the graph.
    pub fn summary(&self) -> String {
        format!(
            "symbol: {} nodes, {} operators, {} inputs, {} outputs",
            self.num_nodes(),
            self.num_operators(),
            self.arg_nodes.len(),
            self.heads.len(),
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> fmt::Display for SymbolGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SymbolGraph ({} nodes):", self.nodes.len())?;
        for node in &self.nodes {
            writeln!(f, "  {:<24} {}", node.op, node.name)?;
        }
        Ok(())
    }
}
