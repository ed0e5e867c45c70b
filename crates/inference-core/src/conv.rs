// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Contract between deconvolution operators and accelerated backends.
//!
//! Transposed convolution is evaluated as the data-gradient of a forward
//! convolution, so the backend trait speaks in "backward data" terms: the
//! operator describes the problem with a [`DeconvDesc`], asks the backend to
//! [plan](ConvBackend::plan_backward_data) an algorithm under a workspace
//! ceiling, carves the requested scratch from the arena, and then runs
//! [`ConvBackend::backward_data`] over raw slices. Backends never allocate;
//! all temporary storage flows in through the `scratch` argument.

use crate::error::EngineResult;

/// Geometry of one transposed-convolution problem.
///
/// `in_*` describe the operator input (the small feature map), `out_*` the
/// operator output (the upsampled map). Square kernels and symmetric
/// stride/pad/dilation only, matching the operator surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeconvDesc {
    pub batch: usize,
    pub in_c: usize,
    pub in_h: usize,
    pub in_w: usize,
    pub out_c: usize,
    pub out_h: usize,
    pub out_w: usize,
    pub kernel: usize,
    pub stride: usize,
    pub pad: usize,
    pub dilation: usize,
    pub group: usize,
}

impl DeconvDesc {
    /// Spatial size of one input channel plane.
    pub fn in_spatial(&self) -> usize {
        self.in_h * self.in_w
    }

    /// Spatial size of one output channel plane.
    pub fn out_spatial(&self) -> usize {
        self.out_h * self.out_w
    }

    /// Rows of the column buffer contributed by one group.
    ///
    /// The weight tensor is laid out `[in_c, out_c / group, kernel, kernel]`,
    /// so each group multiplies `in_c / group` input channels into
    /// `kernel * kernel * out_c / group` column rows.
    pub fn kernel_dim(&self) -> usize {
        self.kernel * self.kernel * (self.out_c / self.group)
    }

    /// Total `f32` element count of the column buffer for one image.
    pub fn col_elems(&self) -> usize {
        self.kernel_dim() * self.group * self.in_spatial()
    }

    /// Element count of one input image.
    pub fn input_elems(&self) -> usize {
        self.in_c * self.in_spatial()
    }

    /// Element count of one output image.
    pub fn output_elems(&self) -> usize {
        self.out_c * self.out_spatial()
    }

    /// Element count of the full weight tensor.
    pub fn weight_elems(&self) -> usize {
        self.in_c * self.kernel_dim()
    }
}

/// Computes one spatial extent of a transposed-convolution output.
///
/// Returns `None` when the parameters would produce a non-positive extent.
pub fn deconv_out_size(
    in_size: usize,
    kernel: usize,
    stride: usize,
    pad: usize,
    dilation: usize,
) -> Option<usize> {
    let out = stride as isize * (in_size as isize - 1) + dilation as isize * (kernel as isize - 1)
        + 1
        - 2 * pad as isize;
    if out > 0 {
        Some(out as usize)
    } else {
        None
    }
}

/// Algorithm chosen by [`ConvBackend::plan_backward_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BwdDataAlgo {
    /// Column-buffer GEMM followed by a scatter back to image layout.
    /// Needs a workspace proportional to the column buffer.
    ImplicitGemm,
    /// Direct scatter loop. No workspace, slower on large problems.
    Direct,
}

impl BwdDataAlgo {
    pub fn as_str(&self) -> &'static str {
        match self {
            BwdDataAlgo::ImplicitGemm => "implicit-gemm",
            BwdDataAlgo::Direct => "direct",
        }
    }
}

/// Result of planning: the algorithm to run and the scratch bytes it needs.
#[derive(Debug, Clone, Copy)]
pub struct BackwardDataPlan {
    pub algo: BwdDataAlgo,
    pub workspace_bytes: usize,
}

/// An accelerated evaluator for transposed convolution.
///
/// Installed into the compute context by the operator library; the core
/// engine only defines the contract.
pub trait ConvBackend {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Picks an algorithm whose workspace fits under `workspace_limit` bytes.
    ///
    /// Planning never fails: when nothing fits the limit the backend falls
    /// back to an algorithm with zero workspace.
    fn plan_backward_data(&self, desc: &DeconvDesc, workspace_limit: usize) -> BackwardDataPlan;

    /// Runs the planned algorithm over one full batch.
    ///
    /// `weight` holds `desc.weight_elems()` values, `input`
    /// `desc.batch * desc.input_elems()` and `output`
    /// `desc.batch * desc.output_elems()`. `scratch` must be at least the
    /// planned `workspace_bytes` long and is clobbered. `output` is fully
    /// overwritten.
    fn backward_data(
        &self,
        desc: &DeconvDesc,
        algo: BwdDataAlgo,
        weight: &[f32],
        input: &[f32],
        scratch: &mut [u8],
        output: &mut [f32],
    ) -> EngineResult<()>;
}
