// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the inference engine.
//!
//! [`EngineError`] is the single error surface of this crate. Storage and
//! arena failures from the lower crates are wrapped via `#[from]` so operator
//! code can use `?` throughout; failures raised by an operator during a pass
//! are wrapped in [`EngineError::OpFailed`] together with the operator name.

use scratch_arena::ArenaError;
use tensor_core::{DType, Shape, TensorError};
use thiserror::Error;

/// Errors that can occur while building or running a network.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Tensor storage rejected an access or a reshape.
    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),

    /// The scratch arena rejected a reservation or a carve.
    #[error("scratch arena error: {0}")]
    Arena(#[from] ArenaError),

    /// A workspace entry exists under this name but with another dtype.
    #[error("tensor '{name}' holds {held} data but {requested} was requested")]
    TensorTypeMismatch {
        name: String,
        held: DType,
        requested: DType,
    },

    /// A required tensor is not present in the workspace.
    #[error("required tensor '{name}' is not in the workspace")]
    MissingTensor { name: String },

    /// A tensor was re-created with a shape that conflicts with the one it
    /// already carries.
    #[error("tensor '{name}' already has shape {existing}, cannot create it with shape {requested}")]
    ShapeConflict {
        name: String,
        existing: Shape,
        requested: Shape,
    },

    /// A scratch tensor was requested with an element count of zero.
    #[error("scratch tensor '{name}' would have zero elements")]
    ZeroSizedScratchTensor { name: String },

    /// An operator received the wrong number of inputs or outputs.
    #[error("operator '{op}' expects {expected} {kind}, got {actual}")]
    ArityMismatch {
        op: String,
        kind: &'static str,
        expected: String,
        actual: usize,
    },

    /// An operator's shape preconditions do not hold.
    #[error("operator '{op}': {detail}")]
    ShapeMismatch { op: String, detail: String },

    /// A parameter is present but malformed or out of range.
    #[error("invalid parameter '{name}': {detail}")]
    BadParam { name: String, detail: String },

    /// The workspace has no compute context yet.
    #[error("workspace has no compute context; call create_context first")]
    MissingContext,

    /// The network definition names an operator type nobody registered.
    #[error("unknown operator type '{op_type}' (known types: {known})")]
    UnknownOp { op_type: String, known: String },

    /// Two operators in the same network definition share a name.
    #[error("duplicate operator name '{name}' in network definition")]
    DuplicateOp { name: String },

    /// No compute backend is registered under this name.
    #[error("unknown compute backend '{name}'")]
    UnknownBackend { name: String },

    /// A compute backend failed while executing a planned algorithm.
    #[error("backend '{backend}' failed: {detail}")]
    Backend { backend: String, detail: String },

    /// A network definition could not be parsed or failed validation.
    #[error("invalid network definition: {0}")]
    InvalidNetDef(String),

    /// An engine configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An operator failed mid-pass; the source describes the actual failure.
    #[error("operator '{op}' failed: {source}")]
    OpFailed {
        op: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Wraps an error with the name of the operator that raised it.
    ///
    /// Already-wrapped errors are passed through unchanged so nested calls
    /// between operators do not stack attribution.
    pub fn in_op(self, op: &str) -> Self {
        match self {
            EngineError::OpFailed { .. } => self,
            other => EngineError::OpFailed {
                op: op.to_string(),
                source: Box::new(other),
            },
        }
    }
}

/// Convenience alias used throughout the engine crates.
pub type EngineResult<T> = Result<T, EngineError>;
