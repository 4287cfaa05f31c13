// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! End-to-end checks against checkpoints written to temporary directories.

use model_ir::write_params;
use model_store::{CheckpointModel, DataDesc, LoadConfig, Model, StoreError};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tensor_core::{DType, Shape, Tensor};

/// Symbol graph declaring inputs `a` through `e` feeding one operator.
const SYMBOL_JSON: &str = r#"{
    "nodes": [
        { "op": "null", "name": "a" },
        { "op": "null", "name": "b" },
        { "op": "null", "name": "c" },
        { "op": "null", "name": "d" },
        { "op": "null", "name": "e" },
        { "op": "Custom", "name": "out",
          "inputs": [[0, 0, 0], [1, 0, 0], [2, 0, 0], [3, 0, 0], [4, 0, 0]] }
    ],
    "arg_nodes": [0, 1, 2, 3, 4],
    "heads": [[5, 0, 0]]
}"#;

fn tensor(values: &[f32]) -> Tensor {
    Tensor::from_f32(Shape::vector(values.len()), values).unwrap()
}

/// Writes checkpoint `A` at epoch 122 into `dir`.
///
/// The first parameter is named after the parameter file itself; `b` and
/// `c` cover two of the symbol inputs.
fn write_checkpoint(dir: &Path) {
    let first = tensor(&[0.5, -1.5]);
    let b = tensor(&[1.0, 2.0, 3.0]);
    let c = tensor(&[4.0]);
    write_params(
        &dir.join("A-0122.params"),
        [("A-0122.params", &first), ("b", &b), ("c", &c)],
    )
    .unwrap();
    std::fs::write(dir.join("A-symbol.json"), SYMBOL_JSON).unwrap();
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_checkpoint(dir.path());
    dir
}

fn load(dir: &Path) -> CheckpointModel {
    CheckpointModel::load(dir.join("A"), 122).unwrap()
}

fn names(descs: &[DataDesc]) -> Vec<&str> {
    descs.iter().map(|d| d.name.as_str()).collect()
}

// ── Loading ────────────────────────────────────────────────────

#[test]
fn first_parameter_is_named_after_file() {
    let dir = fixture();
    let model = load(dir.path());
    let (name, tensor) = model.parameters().unwrap().get(0).unwrap();
    assert_eq!(name, "A-0122.params");
    assert_eq!(tensor.to_f64_vec(), [0.5, -1.5]);
    assert_eq!(model.parameters().unwrap().len(), 3);
}

#[test]
fn missing_files_are_not_found() {
    let dir = fixture();
    assert!(matches!(
        CheckpointModel::load(dir.path().join("A"), 7),
        Err(StoreError::NotFound { .. })
    ));
    std::fs::remove_file(dir.path().join("A-symbol.json")).unwrap();
    assert!(matches!(
        CheckpointModel::load(dir.path().join("A"), 122),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn corrupt_files_are_malformed() {
    let dir = fixture();
    std::fs::write(dir.path().join("A-symbol.json"), "{ not json").unwrap();
    assert!(matches!(
        CheckpointModel::load(dir.path().join("A"), 122),
        Err(StoreError::MalformedModel(_))
    ));

    let dir = fixture();
    std::fs::write(dir.path().join("A-0122.params"), b"\x08\0\0\0\0\0\0\0garbage!").unwrap();
    assert!(matches!(
        CheckpointModel::load(dir.path().join("A"), 122),
        Err(StoreError::MalformedModel(_))
    ));
}

#[test]
fn placeholder_params_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("A-0122.params"), b"").unwrap();
    std::fs::write(dir.path().join("A-symbol.json"), SYMBOL_JSON).unwrap();
    let model = load(dir.path());
    assert!(model.parameters().unwrap().is_empty());
    assert_eq!(names(&model.describe_input().unwrap()), ["a", "b", "c", "d", "e"]);
}

#[test]
fn load_from_config_file() {
    let dir = fixture();
    let config_path = dir.path().join("load.toml");
    let config = LoadConfig {
        dtype: Some("float64".into()),
        ..LoadConfig::new(dir.path().join("A"), 122)
    };
    std::fs::write(&config_path, config.to_toml().unwrap()).unwrap();

    let model = CheckpointModel::from_config(&LoadConfig::from_file(&config_path).unwrap()).unwrap();
    assert!(model.parameters().unwrap().iter().all(|(_, t)| t.dtype() == DType::F64));
}

// ── Input descriptors ──────────────────────────────────────────

#[test]
fn describe_input_tracks_parameter_mutations() {
    let dir = fixture();
    let mut model = load(dir.path());
    assert_eq!(names(&model.describe_input().unwrap()), ["a", "d", "e"]);

    let params = model.parameters_mut().unwrap();
    assert!(params.remove("A-0122.params"));
    params.add("a", tensor(&[0.0]));
    assert_eq!(names(&model.describe_input().unwrap()), ["d", "e"]);
}

#[test]
fn removing_a_symbol_input_parameter_reveals_it() {
    let dir = fixture();
    let mut model = load(dir.path());
    assert!(model.parameters_mut().unwrap().remove("c"));
    let descs = model.describe_input().unwrap();
    assert!(names(&descs).contains(&"c"));
    assert_eq!(names(&descs), ["a", "c", "d", "e"]);
}

#[test]
fn unrelated_parameter_does_not_shrink_inputs() {
    let dir = fixture();
    let mut model = load(dir.path());
    let before = model.describe_input().unwrap();
    model.parameters_mut().unwrap().add("dummy", tensor(&[1.0]));
    let after = model.describe_input().unwrap();
    assert_eq!(before, after);
}

#[test]
fn describe_input_is_cached() {
    let dir = fixture();
    let model = load(dir.path());
    let first = model.describe_input().unwrap();
    let second = model.describe_input().unwrap();
    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.iter().all(|d| d.shape.is_none() && d.dtype.is_none()));
}

// ── Cast ───────────────────────────────────────────────────────

#[test]
fn cast_converts_every_parameter() {
    let dir = fixture();
    let model = load(dir.path());
    let cast = model.cast(DType::F64).unwrap();

    let original = model.parameters().unwrap();
    let converted = cast.parameters().unwrap();
    assert_eq!(converted.len(), original.len());
    assert!(converted.names().eq(original.names()));
    assert!(converted
        .iter()
        .all(|(_, t)| cast.engine().data_type(t) == DType::F64));

    // The source model is unaffected and still open.
    assert!(!model.is_closed());
    assert!(original.iter().all(|(_, t)| t.dtype() == DType::F32));
}

/// Exercises a model through the trait only.
fn cast_twice<M: Model>(model: &M) -> M {
    let half = model.cast(DType::F16).unwrap();
    assert!(half.parameters().unwrap().iter().all(|(_, t)| t.dtype() == DType::F16));
    half.cast(DType::F32).unwrap()
}

#[test]
fn cast_result_supports_the_full_model_api() {
    let dir = fixture();
    let model = load(dir.path());
    let mut round = cast_twice(&model);
    assert_eq!(round.parameters().unwrap(), model.parameters().unwrap());
    assert_eq!(names(&round.describe_input().unwrap()), ["a", "d", "e"]);
    round.close();
    assert!(round.is_closed());
    assert!(!model.is_closed());
}

#[test]
fn failed_cast_leaves_model_untouched() {
    let dir = fixture();
    let mut model = load(dir.path());
    model.parameters_mut().unwrap().add("big", tensor(&[1.0e9]));
    let before = model.parameters().unwrap().clone();

    let err = model.cast(DType::I8).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedDataType { ref name, .. } if name == "big"));
    assert_eq!(model.parameters().unwrap(), &before);
}

#[test]
fn cast_overflowing_float_fails() {
    let dir = tempfile::tempdir().unwrap();
    let huge = Tensor::from_f64(Shape::vector(2), &[1.0, 1.0e300]).unwrap();
    write_params(&dir.path().join("A-0122.params"), [("b", &huge)]).unwrap();
    std::fs::write(dir.path().join("A-symbol.json"), SYMBOL_JSON).unwrap();
    let model = load(dir.path());

    let err = model.cast(DType::F16).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedDataType { ref name, .. } if name == "b"));
    assert!(model.parameters().unwrap().iter().all(|(_, t)| t.dtype() == DType::F64));
}

#[test]
fn save_and_reload_keeps_order_with_empty_tensors() {
    let dir = fixture();
    let mut model = load(dir.path());
    let empty = Tensor::zeros(Shape::new(vec![0, 4]), DType::F32);
    for name in ["z0", "z1", "z2", "z3"] {
        model.parameters_mut().unwrap().add(name, empty.clone());
    }
    model.parameters_mut().unwrap().add("tail", tensor(&[9.0]));

    model.save(dir.path().join("copy/A")).unwrap();
    let reloaded = CheckpointModel::load(dir.path().join("copy/A"), 122).unwrap();
    assert_eq!(reloaded.parameters().unwrap(), model.parameters().unwrap());
    assert_eq!(
        reloaded.parameters().unwrap().names().collect::<Vec<_>>(),
        ["A-0122.params", "b", "c", "z0", "z1", "z2", "z3", "tail"]
    );
}

// ── Artifacts ──────────────────────────────────────────────────

#[test]
fn artifact_listing_scenario() {
    let dir = fixture();
    assert!(load(dir.path()).artifact_names().unwrap().is_empty());

    std::fs::write(dir.path().join("synset.txt"), "cat\ndog\n").unwrap();
    assert_eq!(&*load(dir.path()).artifact_names().unwrap(), ["synset.txt"]);

    std::fs::create_dir(dir.path().join("inner")).unwrap();
    std::fs::write(dir.path().join("inner/innerFiles"), "").unwrap();
    assert_eq!(
        &*load(dir.path()).artifact_names().unwrap(),
        ["inner/innerFiles", "synset.txt"]
    );
}

#[test]
fn artifact_listing_is_memoized_per_instance() {
    let dir = fixture();
    let model = load(dir.path());
    assert!(model.artifact_names().unwrap().is_empty());

    std::fs::write(dir.path().join("synset.txt"), "").unwrap();
    std::fs::create_dir(dir.path().join("inner")).unwrap();
    std::fs::write(dir.path().join("inner/innerFiles"), "").unwrap();
    assert!(model.artifact_names().unwrap().is_empty());

    assert_eq!(
        &*load(dir.path()).artifact_names().unwrap(),
        ["inner/innerFiles", "synset.txt"]
    );
}

#[test]
fn cast_model_rescans_artifacts() {
    let dir = fixture();
    let model = load(dir.path());
    assert!(model.artifact_names().unwrap().is_empty());
    std::fs::write(dir.path().join("synset.txt"), "").unwrap();
    let cast = model.cast(DType::F64).unwrap();
    assert_eq!(&*cast.artifact_names().unwrap(), ["synset.txt"]);
}

#[test]
fn artifact_lookups() {
    let dir = fixture();
    std::fs::write(dir.path().join("synset.txt"), "cat\ndog\n").unwrap();
    let model = load(dir.path());

    assert!(matches!(model.artifact(""), Err(StoreError::InvalidArgument(_))));
    assert!(model.artifact("doesNotExist").unwrap().is_none());
    assert!(matches!(
        model.artifact_as_stream("doesNotExist"),
        Err(StoreError::ArtifactNotFound { .. })
    ));

    let mut stream = model.artifact("synset.txt").unwrap().unwrap();
    assert_eq!(stream.bytes_read(), 0);
    let mut text = String::new();
    stream.read_to_string(&mut text).unwrap();
    assert_eq!(text, "cat\ndog\n");
}

#[derive(Debug, PartialEq)]
enum LabelError {
    Store(String),
    Rejected(&'static str),
}

impl From<StoreError> for LabelError {
    fn from(e: StoreError) -> Self {
        LabelError::Store(e.to_string())
    }
}

#[test]
fn load_artifact_propagates_transform_failure_and_releases_stream() {
    let dir = fixture();
    std::fs::write(dir.path().join("synset.txt"), "").unwrap();
    let model = load(dir.path());

    let result: Result<(), LabelError> =
        model.load_artifact("synset.txt", |_| Err(LabelError::Rejected("Test")));
    assert_eq!(result, Err(LabelError::Rejected("Test")));
    assert_eq!(model.artifacts().open_streams(), 0);

    let ok: Result<&str, LabelError> = model.load_artifact("synset.txt", |_| Ok("Hello"));
    assert_eq!(ok, Ok("Hello"));
    assert_eq!(model.artifacts().open_streams(), 0);
}

#[test]
fn open_stream_counts_until_dropped() {
    let dir = fixture();
    std::fs::write(dir.path().join("synset.txt"), "x").unwrap();
    let model = load(dir.path());

    let a = model.artifact_as_stream("synset.txt").unwrap();
    let b = model.artifact_as_stream("synset.txt").unwrap();
    assert_eq!(model.artifacts().open_streams(), 2);
    drop(a);
    assert_eq!(model.artifacts().open_streams(), 1);
    drop(b);
    assert_eq!(model.artifacts().open_streams(), 0);
}

// ── Lifecycle ──────────────────────────────────────────────────

#[test]
fn close_is_idempotent_and_keeps_artifacts() {
    let dir = fixture();
    std::fs::write(dir.path().join("synset.txt"), "cat\n").unwrap();
    let mut model = load(dir.path());
    model.close();
    model.close();

    assert!(matches!(model.parameters(), Err(StoreError::IllegalState(_))));
    assert!(matches!(model.describe_input(), Err(StoreError::IllegalState(_))));
    assert!(matches!(model.cast(DType::F16), Err(StoreError::IllegalState(_))));
    assert_eq!(model.artifacts().read_lines("synset.txt").unwrap(), ["cat"]);
}

#[test]
fn models_are_shareable_across_threads() {
    let dir = fixture();
    let model = Arc::new(load(dir.path()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let model = Arc::clone(&model);
            std::thread::spawn(move || names(&model.describe_input().unwrap()).len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
}
