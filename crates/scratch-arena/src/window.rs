// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bounds-checked handles into the scratch arena.
//!
//! A [`ScratchWindow`] is a plain descriptor — byte offset, byte length, and
//! the arena generation it was carved in. It holds no pointer: resolving a
//! window back into a slice goes through the arena, which re-validates the
//! generation and bounds on every access. A window carved before the most
//! recent reservation or reset can therefore never read through to moved
//! memory; it fails with [`ArenaError::StaleWindow`](crate::ArenaError::StaleWindow)
//! instead.

/// A non-owning descriptor of a byte range inside a [`ScratchArena`](crate::ScratchArena).
///
/// Windows are minted only by [`ScratchArena::carve`](crate::ScratchArena::carve)
/// and become invalid at the next reservation or reset (the arena's generation
/// moves past theirs). They are cheap to copy and carry no lifetime, which is
/// what lets tensors store them across the carve/compute boundary of a
/// forward step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchWindow {
    offset: usize,
    len: usize,
    generation: u64,
}

impl ScratchWindow {
    pub(crate) fn new(offset: usize, len: usize, generation: u64) -> Self {
        Self {
            offset,
            len,
            generation,
        }
    }

    /// Byte offset of this window from the arena base.
    pub fn offset_bytes(&self) -> usize {
        self.offset
    }

    /// Length of this window in bytes.
    pub fn len_bytes(&self) -> usize {
        self.len
    }

    /// One past the last byte of this window.
    pub fn end_bytes(&self) -> usize {
        self.offset + self.len
    }

    /// The arena generation this window was carved in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this window overlaps `other` by at least one byte.
    pub fn overlaps(&self, other: &ScratchWindow) -> bool {
        self.offset < other.end_bytes() && other.offset < self.end_bytes()
    }
}
