// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Ordered parameter storage.
//!
//! [`ParameterStore`] keeps `(name, tensor)` pairs in insertion order. Every
//! mutation stamps the store with a new revision; caches derived from the
//! store (the input descriptor list) record the revision they were built
//! from and rebuild when it moves.

use crate::StoreError;
use std::sync::atomic::{AtomicU64, Ordering};
use tensor_core::{DType, NdArrayEngine, Tensor};

/// Revisions are process-wide so that a store swapped in wholesale never
/// reuses a revision seen by a cache.
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// An ordered list of named parameter tensors.
///
/// Names are not required to be unique at this layer. Lookups by name
/// act on the first matching entry.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    entries: Vec<(String, Tensor)>,
    revision: u64,
}

impl ParameterStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    /// Returns the entry at `index`.
    pub fn get(&self, index: usize) -> Result<(&str, &Tensor), StoreError> {
        self.entries
            .get(index)
            .map(|(name, tensor)| (name.as_str(), tensor))
            .ok_or(StoreError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// Returns the first tensor named `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&Tensor> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, tensor)| tensor)
    }

    /// Returns `true` if some entry is named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Appends an entry, even if the name is already present.
    pub fn add(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.entries.push((name.into(), tensor));
        self.touch();
    }

    /// Removes the first entry named `name`. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|(n, _)| n == name) {
            Some(index) => {
                self.entries.remove(index);
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Drops every tensor, releasing its memory.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.touch();
        }
    }

    /// Returns a new store with every tensor converted to `target`.
    ///
    /// All-or-nothing: the first tensor that cannot be represented aborts the
    /// cast with [`StoreError::UnsupportedDataType`]. `self` is never modified.
    pub fn cast_all(&self, engine: &dyn NdArrayEngine, target: DType) -> Result<ParameterStore, StoreError> {
        let entries = self
            .entries
            .iter()
            .map(|(name, tensor)| {
                engine
                    .convert(tensor, target)
                    .map(|converted| (name.clone(), converted))
                    .map_err(|source| StoreError::UnsupportedDataType {
                        name: name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ParameterStore::from(entries))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over `(name, tensor)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.entries.iter().map(|(name, tensor)| (name.as_str(), tensor))
    }

    /// Total bytes held by all tensors.
    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|(_, t)| t.size_bytes()).sum()
    }

    /// Revision stamp. Changes whenever the entries change; two stores with
    /// the same stamp hold the same entries.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = next_revision();
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<(String, Tensor)>> for ParameterStore {
    fn from(entries: Vec<(String, Tensor)>) -> Self {
        Self {
            entries,
            revision: next_revision(),
        }
    }
}

/// Stores compare by entries; the revision counter is ignored.
impl PartialEq for ParameterStore {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
