// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena usage statistics for diagnostics.
//!
//! [`ArenaStats`] tracks how the scratch arena is exercised across forward
//! passes: how often it is reserved and carved, how often a reservation
//! actually had to grow the backing store, and the high-water mark of carved
//! bytes. These numbers are what you look at when sizing a scratch limit.

/// Cumulative statistics about scratch-arena usage.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ArenaStats {
    /// Total number of reservation calls.
    pub reservations: u64,
    /// Number of reservations that grew the backing store.
    pub growth_events: u64,
    /// Total number of windows carved.
    pub carves: u64,
    /// Largest byte extent ever carved within one sequence.
    pub high_water_bytes: usize,
    /// Largest single reservation request in bytes.
    pub peak_request_bytes: usize,
}

impl ArenaStats {
    pub(crate) fn record_reservation(&mut self, requested_bytes: usize, grew: bool) {
        self.reservations += 1;
        if grew {
            self.growth_events += 1;
        }
        if requested_bytes > self.peak_request_bytes {
            self.peak_request_bytes = requested_bytes;
        }
    }

    pub(crate) fn record_carve(&mut self, cursor_bytes: usize) {
        self.carves += 1;
        if cursor_bytes > self.high_water_bytes {
            self.high_water_bytes = cursor_bytes;
        }
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Scratch: {} reservations ({} grew), {} carves, high water {} bytes, peak request {} bytes",
            self.reservations,
            self.growth_events,
            self.carves,
            self.high_water_bytes,
            self.peak_request_bytes,
        )
    }
}
