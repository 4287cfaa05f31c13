// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Input descriptors: which graph inputs the caller must feed.
//!
//! A symbol graph declares every variable it reads. Variables whose name
//! matches a loaded parameter are satisfied by the checkpoint; the rest are
//! data inputs the caller supplies at inference time.

use crate::ParameterStore;
use model_ir::SymbolInput;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tensor_core::{DType, Shape};

/// Describes one input the caller must supply.
///
/// `shape` and `dtype` are `None` unless the symbol graph declares them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDesc {
    pub name: String,
    pub shape: Option<Shape>,
    pub dtype: Option<DType>,
}

impl DataDesc {
    /// A descriptor with unspecified shape and type.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: None,
            dtype: None,
        }
    }
}

impl From<&SymbolInput> for DataDesc {
    fn from(input: &SymbolInput) -> Self {
        Self {
            name: input.name.clone(),
            shape: input.shape.clone(),
            dtype: input.dtype,
        }
    }
}

impl fmt::Display for DataDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match &self.shape {
            Some(shape) => write!(f, " {shape}")?,
            None => write!(f, " [?]")?,
        }
        match self.dtype {
            Some(dtype) => write!(f, " {dtype}"),
            None => write!(f, " ?"),
        }
    }
}

/// Returns the symbol inputs not covered by a parameter name, in symbol order.
pub fn describe_input<'a>(
    symbol_inputs: &[SymbolInput],
    param_names: impl IntoIterator<Item = &'a str>,
) -> Vec<DataDesc> {
    let params: HashSet<&str> = param_names.into_iter().collect();
    symbol_inputs
        .iter()
        .filter(|input| !params.contains(input.name.as_str()))
        .map(DataDesc::from)
        .collect()
}

#[derive(Debug, Clone, Default)]
enum CacheState {
    #[default]
    Absent,
    Present {
        revision: u64,
        descs: Arc<[DataDesc]>,
    },
}

/// Memoizes [`describe_input`] against a [`ParameterStore`] revision.
///
/// The cached list is reused while the store's revision is unchanged and
/// rebuilt on the first call after any `add`/`remove`.
#[derive(Debug, Default)]
pub struct InputResolver {
    cache: Mutex<CacheState>,
}

impl InputResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the inputs of `symbol_inputs` not satisfied by `params`.
    pub fn resolve(&self, symbol_inputs: &[SymbolInput], params: &ParameterStore) -> Arc<[DataDesc]> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let CacheState::Present { revision, descs } = &*cache {
            if *revision == params.revision() {
                tracing::trace!("input descriptor cache hit (revision {revision})");
                return Arc::clone(descs);
            }
        }

        let descs: Arc<[DataDesc]> = describe_input(symbol_inputs, params.names()).into();
        tracing::debug!(
            "resolved {} required inputs from {} symbol inputs (revision {})",
            descs.len(),
            symbol_inputs.len(),
            params.revision(),
        );
        *cache = CacheState::Present {
            revision: params.revision(),
            descs: Arc::clone(&descs),
        };
        descs
    }

    /// Drops any cached result.
    pub fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = CacheState::Absent;
    }

    /// Returns `true` if a result is cached.
    pub fn is_cached(&self) -> bool {
        matches!(
            *self.cache.lock().unwrap_or_else(PoisonError::into_inner),
            CacheState::Present { .. }
        )
    }
}
