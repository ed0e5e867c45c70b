// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The operator contract.
//!
//! An operator is constructed once from its [`OpDesc`] (validating arity and
//! parameters up front) and then run any number of times against a
//! [`Workspace`]. `forward` receives the workspace mutably: operators resolve
//! inputs by name, create or reshape outputs by name, and reserve scratch for
//! the duration of their own execution. Nothing about tensor shapes is fixed
//! at construction; shape inference happens on every pass from the actual
//! inputs.

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::params::OpParams;
use crate::workspace::Workspace;

/// A single computation node in a network.
pub trait Operator {
    /// The instance name from the network definition.
    fn name(&self) -> &str;

    /// The registered type name, e.g. `"Deconvolution"`.
    fn op_type(&self) -> &'static str;

    /// Runs one forward pass over the workspace.
    fn forward(&mut self, ws: &mut Workspace) -> EngineResult<()>;
}

/// Declarative description of one operator instance.
///
/// `bottoms` name the input tensors, `tops` the outputs, following the usual
/// bottom-to-top dataflow convention of layer graphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpDesc {
    pub name: String,
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default)]
    pub bottoms: Vec<String>,
    #[serde(default)]
    pub tops: Vec<String>,
    #[serde(default, skip_serializing_if = "OpParams::is_empty")]
    pub params: OpParams,
}

impl OpDesc {
    pub fn new(name: &str, op_type: &str) -> Self {
        OpDesc {
            name: name.to_string(),
            op_type: op_type.to_string(),
            bottoms: Vec::new(),
            tops: Vec::new(),
            params: OpParams::new(),
        }
    }

    /// Builder-style input append.
    pub fn bottom(mut self, name: &str) -> Self {
        self.bottoms.push(name.to_string());
        self
    }

    /// Builder-style output append.
    pub fn top(mut self, name: &str) -> Self {
        self.tops.push(name.to_string());
        self
    }

    /// Replaces the parameter bag.
    pub fn params(mut self, params: OpParams) -> Self {
        self.params = params;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desc_builder() {
        let desc = OpDesc::new("deconv1", "Deconvolution")
            .bottom("data")
            .bottom("weights")
            .top("upsampled")
            .params(OpParams::new().set("kernel_size", 4i64));
        assert_eq!(desc.name, "deconv1");
        assert_eq!(desc.bottoms, vec!["data", "weights"]);
        assert_eq!(desc.tops, vec!["upsampled"]);
        assert_eq!(desc.params.single_i64("kernel_size", 0).unwrap(), 4);
    }

    #[test]
    fn test_desc_json_shape() {
        let json = r#"{
            "name": "proposal1",
            "type": "Proposal",
            "bottoms": ["rpn_cls_prob", "rpn_bbox_pred", "im_info"],
            "tops": ["rois"],
            "params": {"feat_stride": 16, "nms_threshold": 0.7}
        }"#;
        let desc: OpDesc = serde_json::from_str(json).unwrap();
        assert_eq!(desc.op_type, "Proposal");
        assert_eq!(desc.bottoms.len(), 3);
        assert_eq!(desc.params.single_f32("nms_threshold", 0.0).unwrap(), 0.7);
    }

    #[test]
    fn test_desc_defaults_optional_fields() {
        let desc: OpDesc = serde_json::from_str(r#"{"name": "x", "type": "Noop"}"#).unwrap();
        assert!(desc.bottoms.is_empty());
        assert!(desc.tops.is_empty());
        assert!(desc.params.is_empty());
    }
}
