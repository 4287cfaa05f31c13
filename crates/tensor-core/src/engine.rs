// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The array-engine capability consumed by checkpoint code.
//!
//! Model code never touches element bytes directly. It asks an
//! [`NdArrayEngine`] to report a tensor's type or to produce a converted copy,
//! so a different backend can be plugged in without changing the callers.

use crate::{DType, Tensor, TensorError};

/// Element-type inspection and conversion for tensors.
pub trait NdArrayEngine: Send + Sync {
    /// Returns a human-readable engine name (for logging).
    fn name(&self) -> &str;

    /// Returns a new tensor holding `tensor`'s values as `target`.
    ///
    /// The source tensor is never modified. Implementations must fail with
    /// [`TensorError::Unrepresentable`] rather than silently wrapping values
    /// that do not fit the target type.
    fn convert(&self, tensor: &Tensor, target: DType) -> Result<Tensor, TensorError>;

    /// Returns the element type of `tensor`.
    fn data_type(&self, tensor: &Tensor) -> DType {
        tensor.dtype()
    }
}

/// Portable element-by-element conversion on the host CPU.
///
/// Values are widened to `f64` and narrowed to the target type.
/// Float targets round to nearest (`f16`/`bf16` via `half`) and reject
/// finite values beyond the target's range; NaN and infinities carry over.
/// Integer targets truncate toward zero and reject non-finite or
/// out-of-range values.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuEngine;

impl CpuEngine {
    pub fn new() -> Self {
        Self
    }
}

impl NdArrayEngine for CpuEngine {
    fn name(&self) -> &str {
        "cpu"
    }

    fn convert(&self, tensor: &Tensor, target: DType) -> Result<Tensor, TensorError> {
        let source = tensor.dtype();
        if source == target {
            return Ok(tensor.clone());
        }

        let values = tensor.to_f64_vec();
        let mut data = Vec::with_capacity(values.len() * target.size_bytes());
        for value in values {
            encode(value, source, target, &mut data)?;
        }
        Tensor::from_bytes(tensor.shape().clone(), target, data)
    }
}

/// Appends the little-endian encoding of `value` as `target` to `out`.
fn encode(value: f64, from: DType, to: DType, out: &mut Vec<u8>) -> Result<(), TensorError> {
    match to {
        DType::F32 => {
            let v = value as f32;
            check_float_range(value, v.is_finite(), from, to)?;
            out.extend_from_slice(&v.to_le_bytes());
        }
        DType::F64 => out.extend_from_slice(&value.to_le_bytes()),
        DType::F16 => {
            let v = half::f16::from_f64(value);
            check_float_range(value, v.is_finite(), from, to)?;
            out.extend_from_slice(&v.to_le_bytes());
        }
        DType::BF16 => {
            let v = half::bf16::from_f64(value);
            check_float_range(value, v.is_finite(), from, to)?;
            out.extend_from_slice(&v.to_le_bytes());
        }
        DType::I8 => {
            let v = checked_integer(value, i8::MIN as f64, i8::MAX as f64, from, to)?;
            out.push(v as i8 as u8);
        }
        DType::I32 => {
            let v = checked_integer(value, i32::MIN as f64, i32::MAX as f64, from, to)?;
            out.extend_from_slice(&(v as i32).to_le_bytes());
        }
        DType::U8 => {
            let v = checked_integer(value, 0.0, u8::MAX as f64, from, to)?;
            out.push(v as u8);
        }
    }
    Ok(())
}

/// A finite value must stay finite after narrowing; NaN and infinities pass.
fn check_float_range(value: f64, narrowed_finite: bool, from: DType, to: DType) -> Result<(), TensorError> {
    if value.is_finite() && !narrowed_finite {
        return Err(TensorError::Unrepresentable { from, to, value });
    }
    Ok(())
}

fn checked_integer(value: f64, min: f64, max: f64, from: DType, to: DType) -> Result<f64, TensorError> {
    let truncated = value.trunc();
    if !value.is_finite() || truncated < min || truncated > max {
        return Err(TensorError::Unrepresentable { from, to, value });
    }
    Ok(truncated)
}
