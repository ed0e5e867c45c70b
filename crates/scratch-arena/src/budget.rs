// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scratch capacity ceilings with human-readable parsing.
//!
//! A [`ScratchBudget`] caps how far the arena may grow. Configuration files
//! express it as a string (`"64M"`, `"1G"`), parsed here.

use crate::ArenaError;
use std::fmt;

/// A hard ceiling on scratch arena capacity.
///
/// # Parsing
/// Supports SI-style suffixes, case-insensitive:
/// - `"64M"` or `"64MB"` → 64 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1 × 1024³ bytes
/// - `"512K"` or `"512KB"` → 512 × 1024 bytes
/// - `"4096"` → raw byte count
///
/// # Examples
/// ```
/// use scratch_arena::ScratchBudget;
///
/// let b = ScratchBudget::parse("64M").unwrap();
/// assert_eq!(b.as_mb(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScratchBudget {
    bytes: usize,
}

impl ScratchBudget {
    /// Creates a budget from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a budget from mebibytes.
    pub fn from_mb(mb: usize) -> Self {
        Self {
            bytes: mb * 1024 * 1024,
        }
    }

    /// Returns the budget in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the budget in mebibytes (truncated).
    pub fn as_mb(&self) -> usize {
        self.bytes / (1024 * 1024)
    }

    /// Parses a human-readable budget string.
    ///
    /// Accepted formats: `"64M"`, `"64MB"`, `"1G"`, `"1GB"`, `"512K"`,
    /// `"512KB"`, or a plain byte count. Case-insensitive. Zero is rejected —
    /// an arena that can never grow cannot serve any operator.
    pub fn parse(s: &str) -> Result<Self, ArenaError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ArenaError::InvalidBudget("empty string".to_string()));
        }

        let upper = s.to_uppercase();
        let (num_str, multiplier) = if upper.ends_with("GB") {
            (&s[..s.len() - 2], 1024 * 1024 * 1024)
        } else if upper.ends_with('G') {
            (&s[..s.len() - 1], 1024 * 1024 * 1024)
        } else if upper.ends_with("MB") {
            (&s[..s.len() - 2], 1024 * 1024)
        } else if upper.ends_with('M') {
            (&s[..s.len() - 1], 1024 * 1024)
        } else if upper.ends_with("KB") {
            (&s[..s.len() - 2], 1024)
        } else if upper.ends_with('K') {
            (&s[..s.len() - 1], 1024)
        } else if upper.ends_with('B') {
            (&s[..s.len() - 1], 1)
        } else {
            (s, 1)
        };

        let value: usize = num_str.trim().parse().map_err(|_| {
            ArenaError::InvalidBudget(format!(
                "'{s}' — expected a number with an optional K/M/G suffix"
            ))
        })?;

        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| ArenaError::InvalidBudget(format!("'{s}' overflows")))?;

        if bytes == 0 {
            return Err(ArenaError::InvalidBudget(
                "budget must be non-zero".to_string(),
            ));
        }

        Ok(Self { bytes })
    }
}

impl fmt::Display for ScratchBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes >= 1024 * 1024 * 1024 && self.bytes % (1024 * 1024 * 1024) == 0 {
            write!(f, "{} GB", self.bytes / (1024 * 1024 * 1024))
        } else if self.bytes >= 1024 * 1024 && self.bytes % (1024 * 1024) == 0 {
            write!(f, "{} MB", self.bytes / (1024 * 1024))
        } else if self.bytes >= 1024 && self.bytes % 1024 == 0 {
            write!(f, "{} KB", self.bytes / 1024)
        } else {
            write!(f, "{} B", self.bytes)
        }
    }
}
