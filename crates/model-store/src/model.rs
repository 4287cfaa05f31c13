// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The model instance: parameters, symbol graph and artifacts of one
//! checkpoint behind a single handle.
//!
//! ```text
//! CheckpointModel::load(prefix, epoch)
//!     │
//!     ▼
//!   Open ──.cast(dtype)──▶ new, independent Open model
//!     │
//!     │ .close()
//!     ▼
//!   Closed   (tensor memory released; artifacts still readable)
//! ```

use crate::{
    ArtifactManager, ArtifactStream, DataDesc, InputResolver, LoadConfig, ParameterStore,
    StoreError,
};
use model_ir::symbol::Validated;
use model_ir::{read_params, write_params, CheckpointPaths, SymbolGraph, SymbolInput};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tensor_core::{CpuEngine, DType, NdArrayEngine};

/// Operations every loaded model supports.
pub trait Model {
    /// The loaded parameters, in on-disk order.
    fn parameters(&self) -> Result<&ParameterStore, StoreError>;

    /// Mutable access to the parameters. Any change is picked up by the next
    /// [`Model::describe_input`] call.
    fn parameters_mut(&mut self) -> Result<&mut ParameterStore, StoreError>;

    /// The symbol inputs not satisfied by a parameter, in symbol order.
    fn describe_input(&self) -> Result<Arc<[DataDesc]>, StoreError>;

    /// Returns a new model whose parameters are converted to `dtype`.
    ///
    /// The receiver is left unchanged.
    fn cast(&self, dtype: DType) -> Result<Self, StoreError>
    where
        Self: Sized;

    /// Sorted names of the artifact files stored with the model.
    fn artifact_names(&self) -> Result<Arc<[String]>, StoreError>;

    /// Releases the parameter memory. Calling it again has no effect.
    fn close(&mut self);

    /// Returns `true` once [`Model::close`] has been called.
    fn is_closed(&self) -> bool;
}

/// Lifecycle state of a [`CheckpointModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Open,
    Closed,
}

/// A model loaded from a `<prefix>-<epoch>.params` / `<prefix>-symbol.json`
/// pair.
///
/// # Example
/// ```no_run
/// use model_store::{CheckpointModel, Model};
/// use tensor_core::DType;
///
/// # fn demo() -> Result<(), model_store::StoreError> {
/// let model = CheckpointModel::load("models/resnet-18", 0)?;
/// for desc in model.describe_input()?.iter() {
///     println!("feed: {desc}");
/// }
/// let half = model.cast(DType::F16)?;
/// println!("{} bytes", half.parameters()?.total_bytes());
/// # Ok(())
/// # }
/// ```
pub struct CheckpointModel {
    paths: CheckpointPaths,
    symbol: Arc<SymbolGraph<Validated>>,
    symbol_inputs: Arc<[SymbolInput]>,
    params: ParameterStore,
    resolver: InputResolver,
    artifacts: ArtifactManager,
    engine: Arc<dyn NdArrayEngine>,
    state: ModelState,
}

impl CheckpointModel {
    /// Loads the checkpoint saved under `prefix` at `epoch` on the CPU engine.
    ///
    /// # Errors
    /// - [`StoreError::InvalidArgument`] if `prefix` has no file-name part.
    /// - [`StoreError::NotFound`] if the parameter or symbol file is missing.
    /// - [`StoreError::MalformedModel`] if either file fails to parse.
    pub fn load(prefix: impl AsRef<Path>, epoch: u32) -> Result<Self, StoreError> {
        Self::from_config(&LoadConfig::new(prefix.as_ref(), epoch))
    }

    /// Loads the checkpoint described by `config` on the CPU engine, casting
    /// it when `config.dtype` is set.
    pub fn from_config(config: &LoadConfig) -> Result<Self, StoreError> {
        Self::load_with(config, Arc::new(CpuEngine))
    }

    /// Loads the checkpoint described by `config` using `engine` for
    /// tensor conversions.
    pub fn load_with(config: &LoadConfig, engine: Arc<dyn NdArrayEngine>) -> Result<Self, StoreError> {
        let paths = CheckpointPaths::new(&config.prefix, config.epoch);
        if paths.name().trim().is_empty() {
            return Err(StoreError::InvalidArgument(format!(
                "model prefix '{}' has no name",
                config.prefix.display()
            )));
        }
        let target = config.target_dtype()?;

        let symbol = SymbolGraph::from_file(paths.symbol())?.validate()?;
        let params = ParameterStore::from(read_params(paths.params(), config.strip_name_prefixes)?);
        tracing::info!(
            "loaded '{}' epoch {}: {} parameters ({} bytes), {}",
            paths.name(),
            paths.epoch(),
            params.len(),
            params.total_bytes(),
            symbol.summary()
        );

        let symbol_inputs: Arc<[SymbolInput]> = symbol.inputs().into();
        let model = Self {
            artifacts: ArtifactManager::new(&paths),
            paths,
            symbol: Arc::new(symbol),
            symbol_inputs,
            params,
            resolver: InputResolver::new(),
            engine,
            state: ModelState::Open,
        };

        match target {
            Some(dtype) => model.cast(dtype),
            None => Ok(model),
        }
    }

    /// The parsed symbol graph, shared with every model cast from this one.
    pub fn symbol(&self) -> &Arc<SymbolGraph<Validated>> {
        &self.symbol
    }

    /// Every input declared by the symbol graph, parameters included.
    pub fn symbol_inputs(&self) -> &[SymbolInput] {
        &self.symbol_inputs
    }

    /// Directory the checkpoint was loaded from.
    pub fn base_dir(&self) -> &Path {
        self.paths.base_dir()
    }

    /// The resolved checkpoint file locations.
    pub fn paths(&self) -> &CheckpointPaths {
        &self.paths
    }

    /// The engine used for conversions.
    pub fn engine(&self) -> &Arc<dyn NdArrayEngine> {
        &self.engine
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ModelState {
        self.state
    }

    /// The artifact manager for this model.
    pub fn artifacts(&self) -> &ArtifactManager {
        &self.artifacts
    }

    /// Opens an artifact, failing with [`StoreError::ArtifactNotFound`] if it
    /// does not exist.
    pub fn artifact_as_stream(&self, name: &str) -> Result<ArtifactStream, StoreError> {
        self.artifacts.open_stream(name)
    }

    /// Opens an artifact, or returns `Ok(None)` if it does not exist.
    pub fn artifact(&self, name: &str) -> Result<Option<ArtifactStream>, StoreError> {
        self.artifacts.get(name)
    }

    /// Opens an artifact and applies `transform` to it. See
    /// [`ArtifactManager::load`].
    pub fn load_artifact<T, E, F>(&self, name: &str, transform: F) -> Result<T, E>
    where
        F: FnOnce(&mut ArtifactStream) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.artifacts.load(name, transform)
    }

    /// Writes the parameters and a copy of the symbol file as a new
    /// checkpoint under `prefix`, keeping this model's epoch.
    ///
    /// Parameter order is preserved. Returns the paths written.
    pub fn save(&self, prefix: impl AsRef<Path>) -> Result<CheckpointPaths, StoreError> {
        self.ensure_open()?;
        let out = CheckpointPaths::new(prefix.as_ref(), self.paths.epoch());
        if out.name().trim().is_empty() {
            return Err(StoreError::InvalidArgument(format!(
                "output prefix '{}' has no name",
                prefix.as_ref().display()
            )));
        }

        std::fs::create_dir_all(out.base_dir())?;
        write_params(out.params(), self.params.iter())?;
        if out.symbol() != self.paths.symbol() {
            std::fs::copy(self.paths.symbol(), out.symbol())?;
        }
        tracing::info!(
            "saved {} parameters to '{}'",
            self.params.len(),
            out.params().display()
        );
        Ok(out)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        match self.state {
            ModelState::Open => Ok(()),
            ModelState::Closed => Err(StoreError::IllegalState("model is closed")),
        }
    }
}

impl Model for CheckpointModel {
    fn parameters(&self) -> Result<&ParameterStore, StoreError> {
        self.ensure_open()?;
        Ok(&self.params)
    }

    fn parameters_mut(&mut self) -> Result<&mut ParameterStore, StoreError> {
        self.ensure_open()?;
        Ok(&mut self.params)
    }

    fn describe_input(&self) -> Result<Arc<[DataDesc]>, StoreError> {
        self.ensure_open()?;
        Ok(self.resolver.resolve(&self.symbol_inputs, &self.params))
    }

    fn cast(&self, dtype: DType) -> Result<Self, StoreError> {
        self.ensure_open()?;
        let params = self.params.cast_all(self.engine.as_ref(), dtype)?;
        tracing::info!(
            "cast {} parameters of '{}' to {dtype} on {} ({} -> {} bytes)",
            params.len(),
            self.paths.name(),
            self.engine.name(),
            self.params.total_bytes(),
            params.total_bytes()
        );
        Ok(Self {
            paths: self.paths.clone(),
            symbol: Arc::clone(&self.symbol),
            symbol_inputs: Arc::clone(&self.symbol_inputs),
            params,
            resolver: InputResolver::new(),
            artifacts: ArtifactManager::new(&self.paths),
            engine: Arc::clone(&self.engine),
            state: ModelState::Open,
        })
    }

    fn artifact_names(&self) -> Result<Arc<[String]>, StoreError> {
        self.artifacts.list()
    }

    fn close(&mut self) {
        if self.state == ModelState::Closed {
            return;
        }
        self.params.clear();
        self.resolver.invalidate();
        self.state = ModelState::Closed;
        tracing::debug!("closed model '{}'", self.paths.name());
    }

    fn is_closed(&self) -> bool {
        self.state == ModelState::Closed
    }
}

impl fmt::Debug for CheckpointModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckpointModel")
            .field("paths", &self.paths)
            .field("parameters", &self.params.len())
            .field("inputs", &self.symbol_inputs.len())
            .field("engine", &self.engine.name())
            .field("state", &self.state)
            .finish()
    }
}
