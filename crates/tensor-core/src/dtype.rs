// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Supported tensor element data types.

/// Enumerates the element types a [`crate::Tensor`] can hold.
///
/// The workspace registry uses `DType` as the type tag checked on every
/// lookup: a name, once bound, keeps its element type for the registry's
/// lifetime, and fetching it under a different type is a contract violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit IEEE 754 floating point. Carries all activations and weights.
    F32,
    /// 32-bit signed integer.
    I32,
    /// Raw bytes, used for backend workspace scratch.
    U8,
}

impl DType {
    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::I32 => 4,
            DType::U8 => 1,
        }
    }

    /// Returns a human-readable label for this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::I32 => "i32",
            DType::U8 => "u8",
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
