// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-workspace compute context.
//!
//! The context bundles the strategies every operator dispatches through: the
//! [`Gemm`] implementation, and optionally a [`ConvBackend`] for accelerated
//! transposed convolution. A workspace creates its context once, before the
//! first pass; operators then borrow it read-only during `forward`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conv::ConvBackend;
use crate::error::EngineResult;
use crate::gemm::{create_gemm, Gemm};

fn default_gemm_backend() -> String {
    "faer".to_string()
}

/// Configuration for [`Context::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Logical device slot. This engine is CPU-only, so the id only
    /// distinguishes contexts; 0 is the default slot.
    #[serde(default)]
    pub device_id: i32,

    /// GEMM strategy name, one of `"naive"` or `"faer"`.
    #[serde(default = "default_gemm_backend")]
    pub gemm_backend: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            device_id: 0,
            gemm_backend: default_gemm_backend(),
        }
    }
}

/// Compute strategies shared by every operator running in one workspace.
pub struct Context {
    device_id: i32,
    gemm: Box<dyn Gemm>,
    conv: Option<Box<dyn ConvBackend>>,
}

impl Context {
    pub fn new(config: &ContextConfig) -> EngineResult<Self> {
        let gemm = create_gemm(&config.gemm_backend)?;
        tracing::debug!(
            device_id = config.device_id,
            gemm = gemm.name(),
            "compute context created"
        );
        Ok(Context {
            device_id: config.device_id,
            gemm,
            conv: None,
        })
    }

    pub fn device_id(&self) -> i32 {
        self.device_id
    }

    /// The matrix-multiply strategy operators dispatch through.
    pub fn gemm(&self) -> &dyn Gemm {
        self.gemm.as_ref()
    }

    /// The accelerated deconvolution backend, when one is installed.
    pub fn conv_backend(&self) -> Option<&dyn ConvBackend> {
        self.conv.as_deref()
    }

    /// Installs an accelerated deconvolution backend.
    ///
    /// Replaces any previously installed backend.
    pub fn set_conv_backend(&mut self, backend: Box<dyn ConvBackend>) {
        tracing::debug!(backend = backend.name(), "conv backend installed");
        self.conv = Some(backend);
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("device_id", &self.device_id)
            .field("gemm", &self.gemm.name())
            .field("conv", &self.conv.as_ref().map(|b| b.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ContextConfig::default();
        assert_eq!(config.device_id, 0);
        assert_eq!(config.gemm_backend, "faer");
    }

    #[test]
    fn test_context_from_config() {
        let config = ContextConfig {
            device_id: 1,
            gemm_backend: "naive".to_string(),
        };
        let ctx = Context::new(&config).unwrap();
        assert_eq!(ctx.device_id(), 1);
        assert_eq!(ctx.gemm().name(), "naive");
        assert!(ctx.conv_backend().is_none());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let config = ContextConfig {
            device_id: 0,
            gemm_backend: "tpu".to_string(),
        };
        assert!(Context::new(&config).is_err());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ContextConfig = toml::from_str("").unwrap();
        assert_eq!(config.device_id, 0);
        assert_eq!(config.gemm_backend, "faer");
    }
}
