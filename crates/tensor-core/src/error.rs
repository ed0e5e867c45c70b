// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor operations.

use crate::DType;

/// Errors that can occur when accessing or resizing a tensor.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// Typed access with the wrong element type.
    #[error("tensor '{name}' holds {held:?}, accessed as {requested:?}")]
    DTypeMismatch {
        name: String,
        held: DType,
        requested: DType,
    },

    /// Bulk copy-in with the wrong element count.
    #[error("tensor '{name}' holds {expected} elements, got {actual}")]
    CountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Data access before the tensor was given a shape.
    #[error("tensor '{name}' is uninitialized")]
    Uninitialized { name: String },

    /// Typed owned access on a tensor backed by a scratch window.
    ///
    /// Window-backed data lives in the arena; resolve it there.
    #[error("tensor '{name}' is backed by a scratch window, not owned storage")]
    WindowBacked { name: String },

    /// A scratch window cannot hold the requested shape.
    #[error("tensor '{name}' is bound to a {window_bytes}-byte scratch window, which cannot hold {shape_bytes} bytes")]
    WindowSizeMismatch {
        name: String,
        window_bytes: usize,
        shape_bytes: usize,
    },
}
