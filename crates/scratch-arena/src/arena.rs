// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The bump-allocated scratch arena.
//!
//! One [`ScratchArena`] backs all temporary tensors of a workspace. Operators
//! follow a reserve-then-carve protocol:
//!
//! ```text
//! grow(total, elem_size)      ── ensure capacity, begin a new carve sequence
//!       │
//!       ▼
//! carve(n1, 4) ──► ScratchWindow { offset: 0,   len: n1*4 }
//! carve(n2, 4) ──► ScratchWindow { offset: ▲,   len: n2*4 }   (packed after n1)
//!       │
//!       ▼
//! f32_slice / f32_slice_mut / u8_slice_mut(window)  ── bounds-checked access
//! ```
//!
//! Capacity only grows, never shrinks, so a steady-state inference loop stops
//! allocating after the largest operator has run once. Every reservation and
//! every [`reset`](ScratchArena::reset) bumps the arena generation; windows
//! carved earlier resolve to [`ArenaError::StaleWindow`] instead of aliasing
//! reused memory.

use crate::{ArenaError, ArenaStats, ScratchBudget, ScratchWindow};

/// Carve alignment in bytes. Keeps windows friendly to vectorized kernels.
pub const ARENA_ALIGN: usize = 16;

const WORD: usize = std::mem::size_of::<f32>();

/// Rounds `value` up to the next multiple of `align` (a power of two).
///
/// Operators use this to budget reservations: each carve starts at an
/// [`ARENA_ALIGN`]-aligned offset, so the capacity for two windows is
/// `align_up(first_bytes, ARENA_ALIGN) + second_bytes`, not their plain sum.
pub fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// A growable scratch buffer with bump-style window carving.
///
/// The backing store is a `Vec<f32>`, so f32 windows — the overwhelmingly
/// common case — resolve as plain subslices. Byte windows reinterpret the
/// same storage; carve offsets are [`ARENA_ALIGN`]-aligned, so the
/// reinterpretation never straddles a neighboring window.
///
/// # Examples
/// ```
/// use scratch_arena::ScratchArena;
///
/// let mut arena = ScratchArena::new();
/// arena.grow(100, 4).unwrap();
///
/// let a = arena.carve(40, 4).unwrap();
/// let b = arena.carve(60, 4).unwrap();
/// assert_eq!((a.offset_bytes(), a.len_bytes()), (0, 160));
/// assert_eq!((b.offset_bytes(), b.len_bytes()), (160, 240));
/// assert!(!a.overlaps(&b));
///
/// arena.f32_slice_mut(&a).unwrap().fill(1.0);
/// assert_eq!(arena.f32_slice(&a).unwrap()[39], 1.0);
/// ```
#[derive(Debug, Default)]
pub struct ScratchArena {
    buf: Vec<f32>,
    /// Next carve offset in bytes.
    cursor: usize,
    /// Bumped on every reservation and reset; stamps carved windows.
    generation: u64,
    /// Optional hard ceiling on capacity, in bytes.
    limit: Option<usize>,
    stats: ArenaStats,
}

impl ScratchArena {
    /// Creates an empty arena with no capacity ceiling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty arena that refuses to grow past `budget`.
    pub fn with_limit(budget: ScratchBudget) -> Self {
        Self {
            limit: Some(budget.as_bytes()),
            ..Self::default()
        }
    }

    /// Ensures capacity is at least `count * elem_size` bytes and begins a new
    /// carve sequence.
    ///
    /// The carve cursor returns to offset zero and the generation advances, so
    /// windows from earlier sequences become stale. Capacity never shrinks:
    /// a request smaller than the current capacity only restarts the cursor.
    pub fn grow(&mut self, count: usize, elem_size: usize) -> Result<(), ArenaError> {
        let requested = count
            .checked_mul(elem_size)
            .ok_or(ArenaError::SizeOverflow { count, elem_size })?;
        let grew = requested > self.capacity_bytes();
        if grew {
            if let Some(limit) = self.limit {
                if requested > limit {
                    return Err(ArenaError::ExceedsLimit {
                        requested_bytes: requested,
                        limit_bytes: limit,
                    });
                }
            }
            let words = align_up(requested, WORD) / WORD;
            tracing::debug!(
                old_capacity = self.capacity_bytes(),
                new_capacity = words * WORD,
                "scratch arena grown"
            );
            self.buf.resize(words, 0.0);
        }
        self.cursor = 0;
        self.generation += 1;
        self.stats.record_reservation(requested, grew);
        Ok(())
    }

    /// Carves the next window of `count * elem_size` bytes from the current
    /// sequence, advancing the cursor.
    ///
    /// Windows within one sequence are packed at increasing, non-overlapping,
    /// [`ARENA_ALIGN`]-aligned offsets. Fails if `count` is zero or the window
    /// would overrun the reserved capacity.
    pub fn carve(&mut self, count: usize, elem_size: usize) -> Result<ScratchWindow, ArenaError> {
        if count == 0 {
            return Err(ArenaError::ZeroSizedCarve);
        }
        let bytes = count
            .checked_mul(elem_size)
            .ok_or(ArenaError::SizeOverflow { count, elem_size })?;
        let offset = align_up(self.cursor, ARENA_ALIGN);
        let end = offset.saturating_add(bytes);
        if end > self.capacity_bytes() {
            return Err(ArenaError::OutOfCapacity {
                requested_bytes: bytes,
                offset_bytes: offset,
                capacity_bytes: self.capacity_bytes(),
            });
        }
        self.cursor = end;
        self.stats.record_carve(self.cursor);
        tracing::trace!(offset, bytes, "scratch window carved");
        Ok(ScratchWindow::new(offset, bytes, self.generation))
    }

    /// Invalidates all outstanding windows and returns the cursor to zero.
    ///
    /// Called by the network runner at the start of every full-graph pass.
    /// Capacity is retained.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.generation += 1;
    }

    /// Current capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.buf.len() * WORD
    }

    /// Bytes carved so far in the current sequence.
    pub fn used_bytes(&self) -> usize {
        self.cursor
    }

    /// Bytes still carvable in the current sequence (ignoring alignment).
    pub fn remaining_bytes(&self) -> usize {
        self.capacity_bytes() - self.cursor
    }

    /// The current generation; windows from older generations are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The configured capacity ceiling, if any.
    pub fn limit_bytes(&self) -> Option<usize> {
        self.limit
    }

    /// Cumulative usage statistics.
    pub fn stats(&self) -> &ArenaStats {
        &self.stats
    }

    /// Resolves a window as a shared `f32` slice.
    pub fn f32_slice(&self, win: &ScratchWindow) -> Result<&[f32], ArenaError> {
        self.check(win)?;
        check_f32(win)?;
        Ok(&self.buf[win.offset_bytes() / WORD..win.end_bytes() / WORD])
    }

    /// Resolves a window as a mutable `f32` slice.
    pub fn f32_slice_mut(&mut self, win: &ScratchWindow) -> Result<&mut [f32], ArenaError> {
        self.check(win)?;
        check_f32(win)?;
        Ok(&mut self.buf[win.offset_bytes() / WORD..win.end_bytes() / WORD])
    }

    /// Resolves a window as a mutable byte slice.
    ///
    /// Byte windows need not be word-sized; the tail shares its last word with
    /// carve padding, never with another window.
    pub fn u8_slice_mut(&mut self, win: &ScratchWindow) -> Result<&mut [u8], ArenaError> {
        self.check(win)?;
        let start_word = win.offset_bytes() / WORD;
        let end_word = align_up(win.end_bytes(), WORD) / WORD;
        let words = &mut self.buf[start_word..end_word];
        // SAFETY: `u8` has alignment 1 and every bit pattern is valid for both
        // `u8` and `f32`. The covering word span lies inside the backing store
        // (capacity is word-aligned), and the final subslice confines access
        // to this window's own carve.
        let bytes = unsafe {
            std::slice::from_raw_parts_mut(words.as_mut_ptr() as *mut u8, words.len() * WORD)
        };
        Ok(&mut bytes[..win.len_bytes()])
    }

    /// Resolves two disjoint windows at once: `dst` mutably, `src` shared.
    ///
    /// This is the access path for kernels that read one scratch window while
    /// writing another. Overlapping windows are an error — they cannot be
    /// produced by [`carve`](Self::carve), so an overlap means a caller
    /// fabricated or reused a window incorrectly.
    pub fn split_f32_mut(
        &mut self,
        dst: &ScratchWindow,
        src: &ScratchWindow,
    ) -> Result<(&mut [f32], &[f32]), ArenaError> {
        self.check(dst)?;
        self.check(src)?;
        check_f32(dst)?;
        check_f32(src)?;
        if dst.overlaps(src) {
            return Err(ArenaError::AliasedWindows {
                a_offset: dst.offset_bytes(),
                a_len: dst.len_bytes(),
                b_offset: src.offset_bytes(),
                b_len: src.len_bytes(),
            });
        }
        let (first, second) = if dst.offset_bytes() < src.offset_bytes() {
            (dst, src)
        } else {
            (src, dst)
        };
        let (front, back) = self.buf.split_at_mut(second.offset_bytes() / WORD);
        let first_slice = &mut front[first.offset_bytes() / WORD..first.end_bytes() / WORD];
        let second_slice = &mut back[..second.len_bytes() / WORD];
        if dst.offset_bytes() < src.offset_bytes() {
            Ok((first_slice, &*second_slice))
        } else {
            Ok((second_slice, &*first_slice))
        }
    }

    fn check(&self, win: &ScratchWindow) -> Result<(), ArenaError> {
        if win.generation() != self.generation {
            return Err(ArenaError::StaleWindow {
                window_generation: win.generation(),
                arena_generation: self.generation,
            });
        }
        if win.end_bytes() > self.capacity_bytes() {
            return Err(ArenaError::WindowOutOfBounds {
                offset_bytes: win.offset_bytes(),
                len_bytes: win.len_bytes(),
                capacity_bytes: self.capacity_bytes(),
            });
        }
        Ok(())
    }
}

fn check_f32(win: &ScratchWindow) -> Result<(), ArenaError> {
    if win.offset_bytes() % WORD != 0 || win.len_bytes() % WORD != 0 {
        return Err(ArenaError::MisalignedWindow {
            offset_bytes: win.offset_bytes(),
            len_bytes: win.len_bytes(),
            elem_size: WORD,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grow_then_carve_contiguous() {
        let mut arena = ScratchArena::new();
        arena.grow(100, 4).unwrap();
        assert_eq!(arena.capacity_bytes(), 400);

        let a = arena.carve(40, 4).unwrap();
        let b = arena.carve(60, 4).unwrap();
        assert_eq!(a.offset_bytes(), 0);
        assert_eq!(a.len_bytes(), 160);
        assert_eq!(b.offset_bytes(), 160);
        assert_eq!(b.len_bytes(), 240);
        assert!(!a.overlaps(&b));
        assert_eq!(b.offset_bytes(), a.end_bytes()); // packed back to back
    }

    #[test]
    fn test_capacity_monotonic() {
        let mut arena = ScratchArena::new();
        arena.grow(100, 4).unwrap();
        assert_eq!(arena.capacity_bytes(), 400);

        arena.grow(10, 4).unwrap();
        assert_eq!(arena.capacity_bytes(), 400); // smaller request: unchanged

        arena.grow(200, 4).unwrap();
        assert_eq!(arena.capacity_bytes(), 800);
    }

    #[test]
    fn test_grow_restarts_sequence() {
        let mut arena = ScratchArena::new();
        arena.grow(50, 4).unwrap();
        let old = arena.carve(50, 4).unwrap();

        arena.grow(50, 4).unwrap();
        let fresh = arena.carve(50, 4).unwrap();
        assert_eq!(fresh.offset_bytes(), 0);
        assert!(matches!(
            arena.f32_slice(&old),
            Err(ArenaError::StaleWindow { .. })
        ));
    }

    #[test]
    fn test_carve_alignment() {
        let mut arena = ScratchArena::new();
        arena.grow(100, 4).unwrap();
        let a = arena.carve(1, 4).unwrap(); // 4 bytes
        let b = arena.carve(1, 4).unwrap();
        assert_eq!(a.offset_bytes(), 0);
        assert_eq!(b.offset_bytes(), ARENA_ALIGN);
    }

    #[test]
    fn test_carve_beyond_capacity() {
        let mut arena = ScratchArena::new();
        arena.grow(10, 4).unwrap();
        let err = arena.carve(11, 4).unwrap_err();
        assert!(matches!(err, ArenaError::OutOfCapacity { .. }));
    }

    #[test]
    fn test_zero_sized_carve() {
        let mut arena = ScratchArena::new();
        arena.grow(10, 4).unwrap();
        assert!(matches!(
            arena.carve(0, 4),
            Err(ArenaError::ZeroSizedCarve)
        ));
    }

    #[test]
    fn test_limit_enforced() {
        let mut arena = ScratchArena::with_limit(ScratchBudget::from_bytes(1024));
        arena.grow(256, 4).unwrap(); // exactly at the limit
        let err = arena.grow(257, 4).unwrap_err();
        assert!(matches!(err, ArenaError::ExceedsLimit { .. }));
        assert_eq!(arena.capacity_bytes(), 1024); // failed grow left capacity alone
    }

    #[test]
    fn test_reset_invalidates_windows() {
        let mut arena = ScratchArena::new();
        arena.grow(10, 4).unwrap();
        let w = arena.carve(10, 4).unwrap();
        assert!(arena.f32_slice(&w).is_ok());

        arena.reset();
        assert!(matches!(
            arena.f32_slice(&w),
            Err(ArenaError::StaleWindow { .. })
        ));
        assert_eq!(arena.used_bytes(), 0);
        assert_eq!(arena.capacity_bytes(), 40); // capacity retained
    }

    #[test]
    fn test_f32_write_then_read() {
        let mut arena = ScratchArena::new();
        arena.grow(8, 4).unwrap();
        let w = arena.carve(8, 4).unwrap();
        {
            let s = arena.f32_slice_mut(&w).unwrap();
            for (i, v) in s.iter_mut().enumerate() {
                *v = i as f32;
            }
        }
        let s = arena.f32_slice(&w).unwrap();
        assert_eq!(s.len(), 8);
        assert_eq!(s[7], 7.0);
    }

    #[test]
    fn test_u8_window() {
        let mut arena = ScratchArena::new();
        arena.grow(1000, 1).unwrap();
        let w = arena.carve(999, 1).unwrap();
        let bytes = arena.u8_slice_mut(&w).unwrap();
        assert_eq!(bytes.len(), 999);
        bytes[0] = 0xAB;
        bytes[998] = 0xCD;
        let again = arena.u8_slice_mut(&w).unwrap();
        assert_eq!(again[0], 0xAB);
        assert_eq!(again[998], 0xCD);
    }

    #[test]
    fn test_split_disjoint_windows() {
        let mut arena = ScratchArena::new();
        arena.grow(100, 4).unwrap();
        let a = arena.carve(40, 4).unwrap();
        let b = arena.carve(60, 4).unwrap();
        arena.f32_slice_mut(&b).unwrap().fill(2.5);

        // Write a while reading b, in both argument orders.
        {
            let (dst, src) = arena.split_f32_mut(&a, &b).unwrap();
            dst[0] = src[59];
        }
        assert_eq!(arena.f32_slice(&a).unwrap()[0], 2.5);

        let (dst, src) = arena.split_f32_mut(&b, &a).unwrap();
        assert_eq!(src[0], 2.5);
        dst[0] = 9.0;
    }

    #[test]
    fn test_split_rejects_aliasing() {
        let mut arena = ScratchArena::new();
        arena.grow(10, 4).unwrap();
        let w = arena.carve(10, 4).unwrap();
        assert!(matches!(
            arena.split_f32_mut(&w, &w),
            Err(ArenaError::AliasedWindows { .. })
        ));
    }

    #[test]
    fn test_stats_tracking() {
        let mut arena = ScratchArena::new();
        arena.grow(100, 4).unwrap();
        arena.carve(40, 4).unwrap();
        arena.carve(60, 4).unwrap();
        arena.grow(10, 4).unwrap();

        let stats = arena.stats();
        assert_eq!(stats.reservations, 2);
        assert_eq!(stats.growth_events, 1);
        assert_eq!(stats.carves, 2);
        assert_eq!(stats.high_water_bytes, 400);
        assert_eq!(stats.peak_request_bytes, 400);
    }
}
