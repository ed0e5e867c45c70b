// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator type registry.
//!
//! Maps type names from network definitions to constructor functions.
//! Operator libraries register their types into a caller-owned registry
//! rather than a global table, so two networks in one process can run with
//! different operator sets.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::operator::{OpDesc, Operator};

/// Constructs an operator instance from its description.
pub type OpConstructor = fn(&OpDesc) -> EngineResult<Box<dyn Operator>>;

/// Name-to-constructor table for operator types.
#[derive(Default)]
pub struct OpRegistry {
    table: HashMap<String, OpConstructor>,
}

impl OpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor under `op_type`, replacing any previous one.
    pub fn register(&mut self, op_type: &str, ctor: OpConstructor) {
        if self.table.insert(op_type.to_string(), ctor).is_some() {
            tracing::debug!(op_type, "operator constructor replaced");
        }
    }

    pub fn contains(&self, op_type: &str) -> bool {
        self.table.contains_key(op_type)
    }

    /// Registered type names, sorted for stable output.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiates the operator described by `desc`.
    pub fn create(&self, desc: &OpDesc) -> EngineResult<Box<dyn Operator>> {
        match self.table.get(&desc.op_type) {
            Some(ctor) => ctor(desc).map_err(|e| e.in_op(&desc.name)),
            None => Err(EngineError::UnknownOp {
                op_type: desc.op_type.clone(),
                known: self.type_names().join(", "),
            }),
        }
    }
}
