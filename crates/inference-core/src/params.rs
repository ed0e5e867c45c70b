// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator parameter bags.
//!
//! Network definitions attach free-form parameters to each operator
//! (`kernel_size`, `stride`, `nms_threshold`, ...). [`OpParams`] stores them
//! as a name-to-value map and offers typed accessors with defaults, so an
//! operator constructor reads like the schema it implements. A missing key
//! yields the default; a key holding the wrong type is an error rather than
//! a silent fallback.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One parameter value from a network definition.
///
/// Deserialized untagged, so JSON scalars and arrays map onto the natural
/// variant: `true` to `Bool`, `3` to `Int`, `0.7` to `Float`, `"relu"` to
/// `Str`, `[8, 16, 32]` to `IntList` and `[0.5, 1.0]` to `FloatList`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_string())
    }
}

impl From<Vec<i64>> for ArgValue {
    fn from(v: Vec<i64>) -> Self {
        ArgValue::IntList(v)
    }
}

impl From<Vec<f64>> for ArgValue {
    fn from(v: Vec<f64>) -> Self {
        ArgValue::FloatList(v)
    }
}

/// Named parameters of one operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpParams(BTreeMap<String, ArgValue>);

impl OpParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used by tests and programmatic net construction.
    pub fn set(mut self, key: &str, value: impl Into<ArgValue>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A single integer, or `default` when the key is absent.
    pub fn single_i64(&self, key: &str, default: i64) -> EngineResult<i64> {
        match self.0.get(key) {
            None => Ok(default),
            Some(ArgValue::Int(v)) => Ok(*v),
            Some(other) => Err(wrong_type(key, "an integer", other)),
        }
    }

    /// A single non-negative integer, or `default` when the key is absent.
    pub fn single_usize(&self, key: &str, default: usize) -> EngineResult<usize> {
        let v = self.single_i64(key, default as i64)?;
        usize::try_from(v).map_err(|_| EngineError::BadParam {
            name: key.to_string(),
            detail: format!("must be non-negative, got {v}"),
        })
    }

    /// A single float, or `default` when the key is absent. Integer values
    /// are accepted and widened.
    pub fn single_f32(&self, key: &str, default: f32) -> EngineResult<f32> {
        match self.0.get(key) {
            None => Ok(default),
            Some(ArgValue::Float(v)) => Ok(*v as f32),
            Some(ArgValue::Int(v)) => Ok(*v as f32),
            Some(other) => Err(wrong_type(key, "a number", other)),
        }
    }

    /// A single boolean, or `default` when the key is absent.
    pub fn single_bool(&self, key: &str, default: bool) -> EngineResult<bool> {
        match self.0.get(key) {
            None => Ok(default),
            Some(ArgValue::Bool(v)) => Ok(*v),
            Some(other) => Err(wrong_type(key, "a boolean", other)),
        }
    }

    /// A single string, or `default` when the key is absent.
    pub fn single_str(&self, key: &str, default: &str) -> EngineResult<String> {
        match self.0.get(key) {
            None => Ok(default.to_string()),
            Some(ArgValue::Str(v)) => Ok(v.clone()),
            Some(other) => Err(wrong_type(key, "a string", other)),
        }
    }

    /// A list of floats, or `None` when the key is absent. Integer lists are
    /// accepted and widened.
    pub fn repeated_f32(&self, key: &str) -> EngineResult<Option<Vec<f32>>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(ArgValue::FloatList(v)) => Ok(Some(v.iter().map(|x| *x as f32).collect())),
            Some(ArgValue::IntList(v)) => Ok(Some(v.iter().map(|x| *x as f32).collect())),
            Some(other) => Err(wrong_type(key, "a list of numbers", other)),
        }
    }

    /// A list of integers, or `None` when the key is absent.
    pub fn repeated_i64(&self, key: &str) -> EngineResult<Option<Vec<i64>>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(ArgValue::IntList(v)) => Ok(Some(v.clone())),
            Some(other) => Err(wrong_type(key, "a list of integers", other)),
        }
    }
}

fn wrong_type(key: &str, expected: &str, actual: &ArgValue) -> EngineError {
    let held = match actual {
        ArgValue::Bool(_) => "a boolean",
        ArgValue::Int(_) => "an integer",
        ArgValue::Float(_) => "a float",
        ArgValue::Str(_) => "a string",
        ArgValue::IntList(_) => "a list of integers",
        ArgValue::FloatList(_) => "a list of floats",
    };
    EngineError::BadParam {
        name: key.to_string(),
        detail: format!("expected {expected}, got {held}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_key_yields_default() {
        let params = OpParams::new();
        assert_eq!(params.single_i64("kernel_size", 3).unwrap(), 3);
        assert_eq!(params.single_f32("nms_threshold", 0.7).unwrap(), 0.7);
        assert!(params.single_bool("bias_term", true).unwrap());
        assert_eq!(params.single_str("activation", "").unwrap(), "");
        assert_eq!(params.repeated_f32("scales").unwrap(), None);
    }

    #[test]
    fn test_present_key_wins() {
        let params = OpParams::new()
            .set("kernel_size", 4i64)
            .set("bias_term", false)
            .set("scales", vec![8.0, 16.0, 32.0]);
        assert_eq!(params.single_i64("kernel_size", 3).unwrap(), 4);
        assert!(!params.single_bool("bias_term", true).unwrap());
        assert_eq!(
            params.repeated_f32("scales").unwrap(),
            Some(vec![8.0, 16.0, 32.0])
        );
    }

    #[test]
    fn test_int_widens_to_float() {
        let params = OpParams::new().set("spatial_scale", 2i64);
        assert_eq!(params.single_f32("spatial_scale", 1.0).unwrap(), 2.0);
        let params = OpParams::new().set("scales", vec![8i64, 16, 32]);
        assert_eq!(
            params.repeated_f32("scales").unwrap(),
            Some(vec![8.0, 16.0, 32.0])
        );
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let params = OpParams::new().set("kernel_size", "big");
        let err = params.single_i64("kernel_size", 3).unwrap_err();
        assert!(matches!(err, EngineError::BadParam { .. }));
        assert!(err.to_string().contains("kernel_size"));
    }

    #[test]
    fn test_negative_rejected_for_usize() {
        let params = OpParams::new().set("pad", -1i64);
        assert!(params.single_usize("pad", 0).is_err());
    }

    #[test]
    fn test_json_round_trip_preserves_variants() {
        let json = r#"{
            "bias_term": true,
            "num_output": 16,
            "nms_threshold": 0.7,
            "activation": "relu",
            "anchor_scales": [8, 16, 32],
            "ratios": [0.5, 1.0, 2.0]
        }"#;
        let params: OpParams = serde_json::from_str(json).unwrap();
        assert!(params.single_bool("bias_term", false).unwrap());
        assert_eq!(params.single_i64("num_output", 0).unwrap(), 16);
        assert_eq!(params.single_f32("nms_threshold", 0.0).unwrap(), 0.7);
        assert_eq!(params.single_str("activation", "").unwrap(), "relu");
        assert_eq!(
            params.repeated_i64("anchor_scales").unwrap(),
            Some(vec![8, 16, 32])
        );
        assert_eq!(
            params.repeated_f32("ratios").unwrap(),
            Some(vec![0.5, 1.0, 2.0])
        );
    }
}
