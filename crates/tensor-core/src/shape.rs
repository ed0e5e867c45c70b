// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and dimension utilities.

use std::fmt;

/// Describes the dimensionality of a [`crate::Tensor`].
///
/// Feature maps use the canonical `[N, C, H, W]` axis order. The empty shape
/// (rank 0) marks a tensor that has not been sized yet and counts zero
/// elements — registry entries start out this way and receive their real
/// shape on first use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![1, 3, 8, 8]);
    /// assert_eq!(s.rank(), 4);
    /// assert_eq!(s.count(), 192);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates the empty (unsized) shape.
    pub fn empty() -> Self {
        Self { dims: vec![] }
    }

    /// Returns `true` for the empty (unsized) shape.
    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements; the empty shape counts 0.
    pub fn count(&self) -> usize {
        if self.dims.is_empty() {
            0
        } else {
            self.dims.iter().product()
        }
    }

    /// Returns the element count over axes `axis..rank`.
    ///
    /// `count_from(1)` on `[N, C, H, W]` is the per-batch-item stride.
    /// Returns 0 when `axis` is out of range or the shape is empty.
    pub fn count_from(&self, axis: usize) -> usize {
        if self.dims.is_empty() || axis >= self.dims.len() {
            0
        } else {
            self.dims[axis..].iter().product()
        }
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Computes the memory footprint in bytes for a given [`crate::DType`].
    pub fn size_bytes(&self, dtype: super::DType) -> usize {
        self.count() * dtype.size_bytes()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Convenience: `Shape::from(vec![2, 3])`.
impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

/// Convenience: `Shape::from(&[2, 3][..])`.
impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}
