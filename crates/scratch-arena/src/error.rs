// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for scratch-arena operations.

/// Errors that can occur while reserving, carving, or resolving scratch windows.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// A reservation would grow the arena past its configured ceiling.
    #[error("scratch limit exceeded: requested {requested_bytes} bytes, limit is {limit_bytes}")]
    ExceedsLimit {
        requested_bytes: usize,
        limit_bytes: usize,
    },

    /// A carve does not fit in the reserved capacity.
    #[error("scratch carve of {requested_bytes} bytes at offset {offset_bytes} exceeds reserved capacity of {capacity_bytes} bytes")]
    OutOfCapacity {
        requested_bytes: usize,
        offset_bytes: usize,
        capacity_bytes: usize,
    },

    /// Attempted to carve a zero-sized window.
    #[error("cannot carve a zero-sized scratch window")]
    ZeroSizedCarve,

    /// `count * elem_size` overflowed.
    #[error("scratch request overflows: {count} elements of {elem_size} bytes")]
    SizeOverflow { count: usize, elem_size: usize },

    /// The window was carved before the most recent reservation or reset.
    #[error("stale scratch window: carved in generation {window_generation}, arena is at generation {arena_generation}")]
    StaleWindow {
        window_generation: u64,
        arena_generation: u64,
    },

    /// The window does not lie within the arena's current capacity.
    #[error("scratch window [{offset_bytes}, +{len_bytes}) is outside arena capacity of {capacity_bytes} bytes")]
    WindowOutOfBounds {
        offset_bytes: usize,
        len_bytes: usize,
        capacity_bytes: usize,
    },

    /// The window cannot be resolved at the requested element width.
    #[error("scratch window [{offset_bytes}, +{len_bytes}) is not aligned for {elem_size}-byte elements")]
    MisalignedWindow {
        offset_bytes: usize,
        len_bytes: usize,
        elem_size: usize,
    },

    /// Two windows that must be disjoint overlap.
    #[error("scratch windows alias: [{a_offset}, +{a_len}) overlaps [{b_offset}, +{b_len})")]
    AliasedWindows {
        a_offset: usize,
        a_len: usize,
        b_offset: usize,
        b_len: usize,
    },

    /// A budget string failed to parse.
    #[error("invalid scratch budget: {0}")]
    InvalidBudget(String),
}
