// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor construction and conversion.

use crate::DType;

/// Errors that can occur when building or converting tensors.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// The provided buffer size does not match the expected size for the given shape and dtype.
    #[error("shape mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// A value cannot be represented in the requested target type.
    #[error("cannot convert {from} to {to}: value {value} is not representable")]
    Unrepresentable { from: DType, to: DType, value: f64 },
}
