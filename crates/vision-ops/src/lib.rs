// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # vision-ops
//!
//! Operator library for the inference engine: the transposed-convolution
//! (deconvolution) operator, the detection region-proposal operator, and the
//! CPU numeric kernels they dispatch to.
//!
//! # Key Components
//!
//! - [`kernels`] — free numeric functions over raw `f32` slices: col2im
//!   scatter-accumulate, IoU / greedy NMS, fused activations, bias broadcast.
//! - [`DeconvOp`] — transposed convolution with a portable GEMM+col2im path
//!   and an accelerated [`ConvBackend`](inference_core::ConvBackend) path.
//! - [`ProposalOp`] — anchor-based box decoding, validity filtering, ranking
//!   and non-maximum suppression.
//! - [`GemmConvBackend`] — the accelerated deconvolution backend (implicit
//!   GEMM with a planned workspace, or a zero-workspace direct gather).
//! - [`generate_anchors`] — ratio/scale anchor template enumeration.
//!
//! # Wiring
//!
//! ```
//! use inference_core::OpRegistry;
//!
//! let mut registry = OpRegistry::new();
//! vision_ops::register_builtins(&mut registry);
//! assert!(registry.contains("Deconvolution"));
//! assert!(registry.contains("Proposal"));
//! ```

pub mod anchors;
pub mod backend;
pub mod deconv;
pub mod kernels;
pub mod proposal;

pub use anchors::generate_anchors;
pub use backend::{install_conv_backend, GemmConvBackend};
pub use deconv::DeconvOp;
pub use proposal::ProposalOp;

use inference_core::OpRegistry;

/// Registers every operator type this crate provides.
pub fn register_builtins(registry: &mut OpRegistry) {
    registry.register("Deconvolution", DeconvOp::create);
    registry.register("Proposal", ProposalOp::create);
}
