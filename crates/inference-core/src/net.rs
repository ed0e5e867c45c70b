// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Network definitions and the pass runner.
//!
//! A [`NetDef`] is the JSON-serializable description of a fixed operator
//! graph: declared input tensors plus an ordered operator list. [`Network`]
//! turns a definition into runnable form — it owns the workspace, the
//! instantiated operators, and the per-pass scratch protocol (reset, then run
//! every operator in definition order).
//!
//! Execution order is the definition order. Graphs here are small,
//! preprocessing/postprocessing heads rather than full backbones, and their
//! authors topologically order them by hand; the runner only checks that the
//! definition is internally consistent.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::operator::{OpDesc, Operator};
use crate::registry::OpRegistry;
use crate::workspace::Workspace;
use tensor_core::{DType, Shape};

/// A declared network input: name plus fixed dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDecl {
    pub name: String,
    pub dims: Vec<usize>,
}

/// Declarative form of a network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetDef {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<InputDecl>,
    pub ops: Vec<OpDesc>,
}

impl NetDef {
    /// Parses a definition from JSON text.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::InvalidNetDef(e.to_string()))
    }

    /// Reads and parses a definition from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::InvalidNetDef(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Serializes the definition to pretty JSON.
    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::InvalidNetDef(e.to_string()))
    }

    /// Checks internal consistency of the definition.
    ///
    /// Operator names must be present and unique; inputs must have at least
    /// one dimension and no zero extents. Dataflow (whether every bottom is
    /// produced by something) is left to the operators themselves, which
    /// fail with a missing-tensor error on first use.
    pub fn validate(&self) -> EngineResult<()> {
        if self.name.is_empty() {
            return Err(EngineError::InvalidNetDef(
                "network name must not be empty".to_string(),
            ));
        }
        if self.ops.is_empty() {
            return Err(EngineError::InvalidNetDef(format!(
                "network '{}' has no operators",
                self.name
            )));
        }
        for input in &self.inputs {
            if input.dims.is_empty() || input.dims.contains(&0) {
                return Err(EngineError::InvalidNetDef(format!(
                    "input '{}' has invalid dims {:?}",
                    input.name, input.dims
                )));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for op in &self.ops {
            if op.name.is_empty() {
                return Err(EngineError::InvalidNetDef(format!(
                    "operator of type '{}' has an empty name",
                    op.op_type
                )));
            }
            if !seen.insert(op.name.as_str()) {
                return Err(EngineError::DuplicateOp {
                    name: op.name.clone(),
                });
            }
            if op.tops.is_empty() {
                tracing::warn!(op = %op.name, "operator produces no outputs");
            }
        }
        Ok(())
    }
}

/// A runnable network: instantiated operators bound to a workspace.
pub struct Network {
    name: String,
    ops: Vec<Box<dyn Operator>>,
    ws: Workspace,
}

impl Network {
    /// Validates `def`, instantiates every operator through `registry`, and
    /// prepares a workspace according to `config`.
    ///
    /// Declared inputs are created as zero-filled f32 tensors; callers fill
    /// them before the first [`forward`](Network::forward).
    pub fn build(def: &NetDef, registry: &OpRegistry, config: &EngineConfig) -> EngineResult<Self> {
        def.validate()?;

        let mut ws = match config.scratch_budget()? {
            Some(budget) => Workspace::with_scratch_limit(budget),
            None => Workspace::new(),
        };
        ws.create_context(&config.context)?;

        for input in &def.inputs {
            let shape = Shape::new(input.dims.clone());
            ws.create_tensor(&input.name, DType::F32, Some(&shape))?;
        }

        let ops = def
            .ops
            .iter()
            .map(|desc| registry.create(desc))
            .collect::<EngineResult<Vec<_>>>()?;

        tracing::info!(
            net = %def.name,
            ops = ops.len(),
            inputs = def.inputs.len(),
            "network built"
        );
        Ok(Network {
            name: def.name.clone(),
            ops,
            ws,
        })
    }

    /// Runs one full pass: scratch reset, then every operator in order.
    pub fn forward(&mut self) -> EngineResult<()> {
        self.ws.reset_scratch();
        for op in &mut self.ops {
            tracing::debug!(op = %op.name(), op_type = %op.op_type(), "running operator");
            op.forward(&mut self.ws)
                .map_err(|e| e.in_op(op.name()))?;
        }
        tracing::debug!(net = %self.name, summary = %self.ws.summary(), "pass complete");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// The workspace holding this network's tensors.
    pub fn workspace(&self) -> &Workspace {
        &self.ws
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.ws
    }
}
