// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Artifact discovery and access.
//!
//! Artifacts are the files stored next to a checkpoint that are not the
//! checkpoint itself: label maps, vocabularies, preprocessing configs.
//! They are addressed by their `/`-separated path relative to the
//! checkpoint's base directory.
//!
//! The catalogue is built by a single recursive scan on first use and kept
//! for the lifetime of the [`ArtifactManager`]. Files created afterwards are
//! only visible to a new manager (a freshly loaded model).
//!
//! Streams are RAII guards, in the style of the memory pool's buffer guards:
//! each [`ArtifactStream`] counts itself as live until dropped, so callers
//! and tests can check that every stream was released.

use crate::StoreError;
use model_ir::{parse_params_file_name, CheckpointPaths};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
enum Catalogue {
    #[default]
    Unscanned,
    Scanned(Arc<[String]>),
}

/// Lazily scans and serves the artifacts under a checkpoint directory.
#[derive(Debug)]
pub struct ArtifactManager {
    base_dir: PathBuf,
    checkpoint_name: String,
    symbol_file: String,
    catalogue: Mutex<Catalogue>,
    live_streams: Arc<AtomicUsize>,
}

impl ArtifactManager {
    /// Creates a manager rooted at the checkpoint's base directory.
    ///
    /// Nothing is read from disk until the catalogue is first needed.
    pub fn new(paths: &CheckpointPaths) -> Self {
        Self {
            base_dir: paths.base_dir().to_path_buf(),
            checkpoint_name: paths.name().to_string(),
            symbol_file: paths.symbol_file_name(),
            catalogue: Mutex::new(Catalogue::Unscanned),
            live_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Root directory of the artifacts.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the sorted artifact names, scanning the directory on first call.
    ///
    /// Fails with [`StoreError::Io`] if the base directory cannot be read.
    /// A failed scan is not cached.
    pub fn list(&self) -> Result<Arc<[String]>, StoreError> {
        let mut catalogue = self.catalogue.lock().unwrap_or_else(PoisonError::into_inner);
        if let Catalogue::Scanned(names) = &*catalogue {
            return Ok(Arc::clone(names));
        }

        let mut names = Vec::new();
        self.scan_dir(&self.base_dir, "", &mut names)?;
        names.sort();
        tracing::debug!(
            "artifact scan of '{}' found {} files",
            self.base_dir.display(),
            names.len()
        );

        let names: Arc<[String]> = names.into();
        *catalogue = Catalogue::Scanned(Arc::clone(&names));
        Ok(names)
    }

    /// Returns `true` if the catalogue has been built.
    pub fn is_scanned(&self) -> bool {
        matches!(
            *self.catalogue.lock().unwrap_or_else(PoisonError::into_inner),
            Catalogue::Scanned(_)
        )
    }

    /// Opens an artifact for reading.
    ///
    /// Fails with [`StoreError::InvalidArgument`] for a blank name and
    /// [`StoreError::ArtifactNotFound`] if the artifact is not catalogued.
    pub fn open_stream(&self, name: &str) -> Result<ArtifactStream, StoreError> {
        self.get(name)?
            .ok_or_else(|| StoreError::ArtifactNotFound { name: name.to_string() })
    }

    /// Opens an artifact for reading, or returns `Ok(None)` if it does not exist.
    ///
    /// A catalogued file deleted since the scan also yields `Ok(None)`.
    /// A blank name is still an error.
    pub fn get(&self, name: &str) -> Result<Option<ArtifactStream>, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidArgument("artifact name is empty".into()));
        }
        let catalogue = self.list()?;
        if catalogue.binary_search_by(|n| n.as_str().cmp(name)).is_err() {
            return Ok(None);
        }

        let file = match File::open(self.base_dir.join(name)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("artifact '{name}' was removed after the catalogue was built");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(ArtifactStream {
            name: name.to_string(),
            file,
            bytes_read: 0,
            _live: LiveGuard::new(Arc::clone(&self.live_streams)),
        }))
    }

    /// Opens `name`, hands the stream to `transform`, and returns its result.
    ///
    /// The stream is closed on every path out of this call. Errors raised by
    /// `transform` are returned unchanged; lookup errors are converted into
    /// `E` through `From<StoreError>`.
    ///
    /// # Example
    /// ```no_run
    /// # use model_store::{ArtifactManager, StoreError};
    /// # fn demo(artifacts: &ArtifactManager) -> Result<(), StoreError> {
    /// use std::io::Read;
    /// let size = artifacts.load("synset.txt", |stream| {
    ///     let mut buf = Vec::new();
    ///     stream.read_to_end(&mut buf)?;
    ///     Ok::<_, StoreError>(buf.len())
    /// })?;
    /// # Ok(()) }
    /// ```
    pub fn load<T, E, F>(&self, name: &str, transform: F) -> Result<T, E>
    where
        F: FnOnce(&mut ArtifactStream) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut stream = self.open_stream(name)?;
        transform(&mut stream)
    }

    /// Reads an artifact as UTF-8 text.
    pub fn read_to_string(&self, name: &str) -> Result<String, StoreError> {
        self.load(name, |stream| {
            let mut text = String::new();
            stream.read_to_string(&mut text)?;
            Ok(text)
        })
    }

    /// Reads an artifact as lines of text, e.g. a `synset.txt` label map.
    pub fn read_lines(&self, name: &str) -> Result<Vec<String>, StoreError> {
        self.load(name, |stream| {
            BufReader::new(stream)
                .lines()
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from)
        })
    }

    /// Number of streams handed out by this manager that are still open.
    pub fn open_streams(&self) -> usize {
        self.live_streams.load(Ordering::Acquire)
    }

    // ── Private helpers ────────────────────────────────────────

    /// Collects regular files under `dir` into `out` as `/`-joined paths.
    fn scan_dir(&self, dir: &Path, rel: &str, out: &mut Vec<String>) -> Result<(), StoreError> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(
                        "skipping non-UTF-8 entry '{}' under '{}'",
                        raw.to_string_lossy(),
                        dir.display()
                    );
                    continue;
                }
            };
            let rel_path = if rel.is_empty() {
                file_name.clone()
            } else {
                format!("{rel}/{file_name}")
            };

            let file_type = entry.file_type()?;
            // Symlinks are followed for files only, which keeps the scan free of cycles.
            let is_file = file_type.is_file()
                || (file_type.is_symlink() && entry.path().is_file());

            if is_file {
                if rel.is_empty() && self.is_checkpoint_file(&file_name) {
                    continue;
                }
                out.push(rel_path);
            } else if file_type.is_dir() {
                if let Err(e) = self.scan_dir(&entry.path(), &rel_path, out) {
                    tracing::warn!("skipping unreadable directory '{rel_path}': {e}");
                }
            }
        }
        Ok(())
    }

    /// Returns `true` for this checkpoint's own symbol and parameter files.
    fn is_checkpoint_file(&self, file_name: &str) -> bool {
        file_name == self.symbol_file
            || matches!(parse_params_file_name(file_name), Some((name, _)) if name == self.checkpoint_name)
    }
}

/// A readable artifact file.
///
/// Reads go straight to the file; nothing is buffered ahead. Dropping the
/// stream closes the file.
#[derive(Debug)]
pub struct ArtifactStream {
    name: String,
    file: File,
    bytes_read: u64,
    _live: LiveGuard,
}

impl ArtifactStream {
    /// The artifact name this stream was opened for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes consumed so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl Read for ArtifactStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.file.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// Counts a stream as live from creation until drop.
#[derive(Debug)]
struct LiveGuard {
    counter: Arc<AtomicUsize>,
}

impl LiveGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self { counter }
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}
