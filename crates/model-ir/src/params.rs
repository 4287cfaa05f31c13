// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Parameter file codec.
//!
//! Parameter files are SafeTensors containers. Entries are returned in the
//! order their data appears in the file, which is the order they were
//! written, so index 0 is always the first declared parameter.
//!
//! A zero-byte file is accepted as a checkpoint with no parameters.

use crate::ModelError;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use tensor_core::{DType, Shape, Tensor};

/// Name prefixes some exporters put in front of argument and auxiliary
/// state names.
const NAME_PREFIXES: [&str; 2] = ["arg:", "aux:"];

/// Header alignment used when writing.
const HEADER_ALIGN: usize = 8;

/// Header section holding free-form string metadata.
const METADATA_KEY: &str = "__metadata__";

/// Metadata entry listing tensor names in write order, as a JSON array.
const ORDER_KEY: &str = "order";

/// Reads every tensor from a parameter file, in on-disk order.
///
/// When `strip_prefixes` is set, `arg:` / `aux:` name prefixes are removed.
///
/// Uses memory-mapped I/O so only the tensor bytes are copied out.
pub fn read_params(path: &Path, strip_prefixes: bool) -> Result<Vec<(String, Tensor)>, ModelError> {
    let file = std::fs::File::open(path).map_err(|e| ModelError::io(path, e))?;
    let len = file.metadata().map_err(|e| ModelError::io(path, e))?.len();
    if len == 0 {
        tracing::debug!("parameter file '{}' is empty", path.display());
        return Ok(Vec::new());
    }

    let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| ModelError::io(path, e))?;
    let st = safetensors::SafeTensors::deserialize(&mmap).map_err(|e| ModelError::ParamsParse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    // Zero-size tensors share their start offset with a neighbour, so the
    // write order recorded in the header breaks ties.
    let rank = recorded_order(&mmap);
    let rank_of = |name: &str| rank.get(name).copied().unwrap_or(usize::MAX);
    let mut views = st.tensors();
    views.sort_by(|(a_name, a), (b_name, b)| {
        (a.data().as_ptr() as usize, a.data().len(), rank_of(a_name))
            .cmp(&(b.data().as_ptr() as usize, b.data().len(), rank_of(b_name)))
            .then_with(|| a_name.cmp(b_name))
    });

    let mut params = Vec::with_capacity(views.len());
    for (name, view) in views {
        let dtype = convert_safetensor_dtype(view.dtype()).ok_or_else(|| ModelError::ParamsParse {
            path: path.to_path_buf(),
            detail: format!("tensor '{name}' has unsupported dtype {:?}", view.dtype()),
        })?;
        let shape = Shape::new(view.shape().to_vec());
        let tensor = Tensor::from_bytes(shape, dtype, view.data().to_vec())
            .map_err(|source| ModelError::Tensor { name: name.clone(), source })?;
        let name = if strip_prefixes { strip_name_prefix(&name).to_string() } else { name };
        if params.iter().any(|(existing, _)| *existing == name) {
            tracing::warn!("duplicate parameter name '{name}' in '{}'", path.display());
        }
        params.push((name, tensor));
    }

    tracing::debug!("read {} tensors from '{}'", params.len(), path.display());
    Ok(params)
}

/// Writes `entries` to `path` as a SafeTensors container.
///
/// Tensor data is laid out in iteration order, so [`read_params`] returns
/// the entries in the same order. Names must be unique.
pub fn write_params<'a, I>(path: &Path, entries: I) -> Result<(), ModelError>
where
    I: IntoIterator<Item = (&'a str, &'a Tensor)>,
{
    let mut header = serde_json::Map::new();
    let mut seen = HashSet::new();
    let mut tensors = Vec::new();
    let mut names = Vec::new();
    let mut offset = 0usize;

    for (name, tensor) in entries {
        if !seen.insert(name) {
            return Err(ModelError::DuplicateName { name: name.to_string() });
        }
        let end = offset + tensor.size_bytes();
        header.insert(
            name.to_string(),
            serde_json::json!({
                "dtype": safetensor_dtype_name(tensor.dtype()),
                "shape": tensor.shape().dims(),
                "data_offsets": [offset, end],
            }),
        );
        tensors.push(tensor);
        names.push(name);
        offset = end;
    }

    let order = serde_json::to_string(&names).map_err(|e| ModelError::ParamsParse {
        path: path.to_path_buf(),
        detail: format!("cannot encode header: {e}"),
    })?;
    header.insert(
        METADATA_KEY.to_string(),
        serde_json::json!({ ORDER_KEY: order }),
    );

    let mut header_bytes = serde_json::to_vec(&header).map_err(|e| ModelError::ParamsParse {
        path: path.to_path_buf(),
        detail: format!("cannot encode header: {e}"),
    })?;
    let padded = header_bytes.len().div_ceil(HEADER_ALIGN) * HEADER_ALIGN;
    header_bytes.resize(padded, b' ');

    let io_err = |e| ModelError::io(path, e);
    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut out = std::io::BufWriter::new(file);
    out.write_all(&(header_bytes.len() as u64).to_le_bytes()).map_err(io_err)?;
    out.write_all(&header_bytes).map_err(io_err)?;
    for tensor in tensors {
        out.write_all(tensor.as_bytes()).map_err(io_err)?;
    }
    out.flush().map_err(io_err)?;

    tracing::debug!("wrote {} tensors to '{}'", seen.len(), path.display());
    Ok(())
}

/// Returns each tensor's position in the write order recorded by
/// [`write_params`]. Files from other writers carry no order and yield an
/// empty map.
fn recorded_order(buffer: &[u8]) -> HashMap<String, usize> {
    let header = buffer
        .get(..8)
        .and_then(|len| len.try_into().ok())
        .map(|len: [u8; 8]| u64::from_le_bytes(len) as usize)
        .and_then(|len| buffer.get(8..8usize.checked_add(len)?));
    let Some(header) = header else {
        return HashMap::new();
    };

    serde_json::from_slice::<serde_json::Value>(header)
        .ok()
        .and_then(|value| value.get(METADATA_KEY)?.get(ORDER_KEY)?.as_str().map(str::to_owned))
        .and_then(|order| serde_json::from_str::<Vec<String>>(&order).ok())
        .map(|names| names.into_iter().enumerate().map(|(i, n)| (n, i)).collect())
        .unwrap_or_default()
}

/// Removes a leading `arg:` or `aux:` from a parameter name.
pub fn strip_name_prefix(name: &str) -> &str {
    NAME_PREFIXES
        .iter()
        .find_map(|p| name.strip_prefix(p))
        .unwrap_or(name)
}

fn convert_safetensor_dtype(st_dtype: safetensors::Dtype) -> Option<DType> {
    match st_dtype {
        safetensors::Dtype::F32 => Some(DType::F32),
        safetensors::Dtype::F64 => Some(DType::F64),
        safetensors::Dtype::F16 => Some(DType::F16),
        safetensors::Dtype::BF16 => Some(DType::BF16),
        safetensors::Dtype::I8 => Some(DType::I8),
        safetensors::Dtype::I32 => Some(DType::I32),
        safetensors::Dtype::U8 => Some(DType::U8),
        _ => None,
    }
}

fn safetensor_dtype_name(dtype: DType) -> &'static str {
    match dtype {
        DType::F32 => "F32",
        DType::F64 => "F64",
        DType::F16 => "F16",
        DType::BF16 => "BF16",
        DType::I8 => "I8",
        DType::I32 => "I32",
        DType::U8 => "U8",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(values: &[f32]) -> Tensor {
        Tensor::from_f32(Shape::vector(values.len()), values).unwrap()
    }

    #[test]
    fn test_write_then_read_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m-0001.params");
        let (z, a, m) = (tensor(&[1.0]), tensor(&[2.0, 3.0]), tensor(&[4.0]));
        write_params(&path, [("zeta", &z), ("alpha", &a), ("mid", &m)]).unwrap();

        let params = read_params(&path, false).unwrap();
        let names: Vec<_> = params.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert_eq!(params[1].1, a);
    }

    #[test]
    fn test_zero_size_tensors_keep_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m-0001.params");
        let empty = Tensor::zeros(Shape::new(vec![0]), DType::F32);
        let head = tensor(&[1.0]);
        let last = tensor(&[2.0, 3.0]);

        let mut expected: Vec<String> = vec!["head".into()];
        expected.extend((0..6).map(|i| format!("z{i}_0")));
        expected.push("last".into());
        let entries: Vec<(&str, &Tensor)> = expected
            .iter()
            .map(|name| match name.as_str() {
                "head" => (name.as_str(), &head),
                "last" => (name.as_str(), &last),
                _ => (name.as_str(), &empty),
            })
            .collect();
        write_params(&path, entries).unwrap();

        for _ in 0..10 {
            let params = read_params(&path, false).unwrap();
            let names: Vec<_> = params.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, expected);
        }
    }

    #[test]
    fn test_foreign_file_without_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m-0001.params");
        let header = br#"{"b":{"dtype":"U8","shape":[1],"data_offsets":[0,1]},"a":{"dtype":"U8","shape":[1],"data_offsets":[1,2]}}"#;
        let mut bytes = (header.len() as u64).to_le_bytes().to_vec();
        bytes.extend_from_slice(header);
        bytes.extend_from_slice(&[7, 9]);
        std::fs::write(&path, bytes).unwrap();

        let params = read_params(&path, false).unwrap();
        assert_eq!(params[0].0, "b");
        assert_eq!(params[1].0, "a");
        assert_eq!(recorded_order(b"short"), HashMap::new());
    }

    #[test]
    fn test_mixed_dtypes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m-0001.params");
        let wide = Tensor::from_f64(Shape::vector(1), &[0.25]).unwrap();
        let bytes = Tensor::from_bytes(Shape::vector(3), DType::U8, vec![1, 2, 3]).unwrap();
        write_params(&path, [("bytes", &bytes), ("wide", &wide)]).unwrap();

        let params = read_params(&path, false).unwrap();
        assert_eq!(params[0].1.dtype(), DType::U8);
        assert_eq!(params[1].1.to_f64_vec(), vec![0.25]);
    }

    #[test]
    fn test_strip_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m-0001.params");
        let t = tensor(&[1.0]);
        write_params(&path, [("arg:fc_weight", &t), ("aux:bn_mean", &t)]).unwrap();

        let stripped = read_params(&path, true).unwrap();
        assert_eq!(stripped[0].0, "fc_weight");
        assert_eq!(stripped[1].0, "bn_mean");
        let raw = read_params(&path, false).unwrap();
        assert_eq!(raw[0].0, "arg:fc_weight");
    }

    #[test]
    fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m-0001.params");
        std::fs::File::create(&path).unwrap();
        assert!(read_params(&path, true).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let result = read_params(Path::new("/nonexistent/m-0001.params"), true);
        assert!(matches!(result, Err(ModelError::FileNotFound { .. })));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m-0001.params");
        std::fs::write(&path, b"definitely not safetensors").unwrap();
        assert!(matches!(
            read_params(&path, true),
            Err(ModelError::ParamsParse { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m-0001.params");
        let t = tensor(&[1.0]);
        let result = write_params(&path, [("w", &t), ("w", &t)]);
        assert!(matches!(result, Err(ModelError::DuplicateName { .. })));
    }

    #[test]
    fn test_strip_name_prefix() {
        assert_eq!(strip_name_prefix("arg:w"), "w");
        assert_eq!(strip_name_prefix("aux:w"), "w");
        assert_eq!(strip_name_prefix("w:arg"), "w:arg");
    }
}
