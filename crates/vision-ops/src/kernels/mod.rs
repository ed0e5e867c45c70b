// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CPU numeric kernels.
//!
//! Free functions over raw `f32` slices, invoked from inside an operator's
//! forward step. Every kernel takes pre-sized buffers; the operators validate
//! shapes before calling in, so the kernels themselves only carry
//! `debug_assert` guards on slice lengths.

mod activate;
mod boxes;
mod col2im;

pub use activate::{add_bias, Activation};
pub use boxes::{iou, nms, Candidate};
pub use col2im::col2im;
