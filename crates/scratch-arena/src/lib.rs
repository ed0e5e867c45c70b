// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # scratch-arena
//!
//! A growable, bump-allocated scratch buffer for operator temporaries.
//!
//! Inference over a fixed graph runs the same operators with the same shapes
//! pass after pass. Allocating and freeing temporaries per operator would
//! dominate the loop, so all temporaries come out of one shared arena that
//! grows to the largest single step and is then reused forever.
//!
//! # Key Components
//!
//! - [`ScratchArena`] — the allocator: `grow` reserves capacity and begins a
//!   carve sequence, `carve` hands out packed windows, `reset` ends a pass.
//! - [`ScratchWindow`] — a bounds-checked, generation-stamped window handle;
//!   resolving a window after the arena moved on is an error, not a read of
//!   reused memory.
//! - [`ScratchBudget`] — a hard capacity ceiling with human-readable parsing
//!   (`"64M"`, `"1G"`, etc.).
//! - [`ArenaStats`] — cumulative usage metrics (growth events, carve count,
//!   high-water mark).
//!
//! # Protocol
//!
//! ```text
//! per forward step:            grow(total, elem_size)
//! per temporary:               carve(count, elem_size) ──► ScratchWindow
//! inside the kernel:           f32_slice / f32_slice_mut / split_f32_mut
//! per full-graph pass:         reset()
//! ```
//!
//! # Example
//! ```
//! use scratch_arena::{ScratchArena, ScratchBudget};
//!
//! let mut arena = ScratchArena::with_limit(ScratchBudget::parse("1M").unwrap());
//! arena.grow(100, 4).unwrap();
//!
//! let col = arena.carve(40, 4).unwrap();
//! let ones = arena.carve(60, 4).unwrap();
//! arena.f32_slice_mut(&ones).unwrap().fill(1.0);
//!
//! // Windows are packed and disjoint.
//! assert_eq!(ones.offset_bytes(), col.end_bytes());
//! ```

mod arena;
mod budget;
mod error;
mod stats;
mod window;

pub use arena::{align_up, ScratchArena, ARENA_ALIGN};
pub use budget::ScratchBudget;
pub use error::ArenaError;
pub use stats::ArenaStats;
pub use window::ScratchWindow;
