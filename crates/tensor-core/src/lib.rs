// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Type-tagged tensor containers for fixed-graph inference.
//!
//! This crate provides:
//! - [`Tensor`] — a named, shape-aware array with either owned typed storage
//!   or a non-owning window into a scratch arena.
//! - [`Shape`] — dimension descriptors with `[N, C, H, W]` conventions.
//! - [`DType`] — the closed set of supported element types (f32, i32, u8),
//!   doubling as the registry type tag.
//! - Clean error types via `thiserror`.
//!
//! # Design Goals
//! - The element type of a tensor never changes after construction; every
//!   typed access re-checks it, so a registry of type-erased handles keeps
//!   its fail-fast lookup contract.
//! - Scratch tensors carry window descriptors instead of pointers: stale or
//!   out-of-bounds views surface as errors at the arena, never as silent
//!   reads of reused memory.

mod dtype;
mod error;
mod shape;
mod tensor;

pub use dtype::DType;
pub use error::TensorError;
pub use shape::Shape;
pub use tensor::Tensor;
