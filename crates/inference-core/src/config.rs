// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Engine configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! scratch_limit = "64M"
//! accelerated_conv = true
//!
//! [context]
//! device_id = 0
//! gemm_backend = "faer"
//! ```

use std::path::Path;

use scratch_arena::ScratchBudget;

use crate::context::ContextConfig;
use crate::error::{EngineError, EngineResult};

fn default_true() -> bool {
    true
}

/// Configuration for building a [`Network`](crate::Network).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Compute context settings (device slot, GEMM strategy).
    #[serde(default)]
    pub context: ContextConfig,
    /// Scratch arena ceiling (human-readable, e.g. `"64M"`). Absent means
    /// the arena grows without bound.
    #[serde(default)]
    pub scratch_limit: Option<String>,
    /// Whether to install the accelerated deconvolution backend.
    #[serde(default = "default_true")]
    pub accelerated_conv: bool,
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> EngineResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| EngineError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> EngineResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("TOML serialise error: {e}")))
    }

    /// Parses the scratch limit string into a [`ScratchBudget`].
    pub fn scratch_budget(&self) -> EngineResult<Option<ScratchBudget>> {
        match &self.scratch_limit {
            None => Ok(None),
            Some(s) => ScratchBudget::parse(s)
                .map(Some)
                .map_err(|e| EngineError::Config(format!("invalid scratch limit: {e}"))),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context: ContextConfig::default(),
            scratch_limit: None,
            accelerated_conv: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = EngineConfig::default();
        assert_eq!(c.context.gemm_backend, "faer");
        assert!(c.scratch_limit.is_none());
        assert!(c.accelerated_conv);
        assert_eq!(c.scratch_budget().unwrap(), None);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
scratch_limit = "32M"
accelerated_conv = false

[context]
device_id = 1
gemm_backend = "naive"
"#;
        let c = EngineConfig::from_toml(toml).unwrap();
        assert_eq!(c.context.device_id, 1);
        assert_eq!(c.context.gemm_backend, "naive");
        assert!(!c.accelerated_conv);
        assert_eq!(c.scratch_budget().unwrap().unwrap().as_mb(), 32);
    }

    #[test]
    fn test_from_toml_all_defaults() {
        let c = EngineConfig::from_toml("").unwrap();
        assert_eq!(c.context.device_id, 0);
        assert!(c.accelerated_conv);
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = EngineConfig {
            scratch_limit: Some("128M".to_string()),
            ..Default::default()
        };
        let toml = c.to_toml().unwrap();
        let back = EngineConfig::from_toml(&toml).unwrap();
        assert_eq!(back.scratch_limit, c.scratch_limit);
        assert_eq!(back.context.gemm_backend, c.context.gemm_backend);
    }

    #[test]
    fn test_invalid_limit_rejected() {
        let c = EngineConfig {
            scratch_limit: Some("plenty".to_string()),
            ..Default::default()
        };
        assert!(matches!(c.scratch_budget(), Err(EngineError::Config(_))));
    }
}
