// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Lightweight tensor types for checkpoint parameters.
//!
//! This crate provides:
//! - [`Tensor`]: an owned n-dimensional tensor over a little-endian byte buffer.
//! - [`Shape`]: runtime shape descriptors.
//! - [`DType`]: supported element data types (f32, f64, f16, bf16, i8, i32, u8).
//! - [`NdArrayEngine`]: the conversion capability model code consumes,
//!   with [`CpuEngine`] as the portable implementation.
//!
//! # Example
//! ```
//! use tensor_core::{CpuEngine, DType, NdArrayEngine, Shape, Tensor};
//!
//! let t = Tensor::from_f32(Shape::vector(2), &[0.5, 2.0]).unwrap();
//! let wide = CpuEngine.convert(&t, DType::F64).unwrap();
//! assert_eq!(CpuEngine.data_type(&wide), DType::F64);
//! ```

mod dtype;
mod engine;
mod error;
mod shape;
mod tensor;

pub use dtype::DType;
pub use engine::{CpuEngine, NdArrayEngine};
pub use error::TensorError;
pub use shape::Shape;
pub use tensor::Tensor;
