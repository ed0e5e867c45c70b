// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The transposed-convolution (deconvolution) operator.
//!
//! Upsamples a `[N, Cin, H, W]` feature map into
//! `[N, num_output, outH, outW]` where each spatial extent follows
//! `out = (in - 1) * stride - 2 * pad + dilation * (kernel - 1) + 1`.
//!
//! Two compute paths produce identical results:
//!
//! - **Portable**: per image and group, a transposed-weight GEMM into a
//!   column scratch buffer, then a col2im scatter-accumulate into the output.
//!   Bias is broadcast via a rank-1 GEMM against a ones vector.
//! - **Accelerated**: the context's [`ConvBackend`] plans a backward-data
//!   algorithm under a bounded workspace budget and runs the full batch;
//!   bias and activation are applied identically afterward.

use inference_core::{
    deconv_out_size, BackwardDataPlan, DeconvDesc, EngineError, EngineResult, OpDesc, Operator,
    TensorHandle, Workspace,
};
use scratch_arena::{align_up, ScratchWindow, ARENA_ALIGN};
use tensor_core::{DType, Shape};

use crate::kernels::{self, Activation};

/// Workspace ceiling for the accelerated algorithm query. Grouped layouts
/// get no budget and therefore the zero-workspace direct algorithm.
const ACCEL_WORKSPACE_LIMIT: usize = 64 * 1024 * 1024;

/// Transposed-convolution operator.
///
/// Bottoms: input, weight, and (when `bias_term` is set) bias. Tops: one
/// output tensor. The weight tensor is laid out
/// `[Cin, num_output / group, kernel, kernel]`.
pub struct DeconvOp {
    name: String,
    bottoms: Vec<String>,
    tops: Vec<String>,
    num_output: usize,
    kernel: usize,
    stride: usize,
    pad: usize,
    dilation: usize,
    group: usize,
    bias_term: bool,
    activation: Option<Activation>,
    accelerated: bool,
}

impl DeconvOp {
    /// Registry constructor.
    pub fn create(desc: &OpDesc) -> EngineResult<Box<dyn Operator>> {
        Ok(Box::new(Self::from_desc(desc)?))
    }

    /// Validates the description and builds the operator.
    pub fn from_desc(desc: &OpDesc) -> EngineResult<Self> {
        let bias_term = desc.params.single_bool("bias_term", true)?;
        let expected_bottoms = if bias_term { 3 } else { 2 };
        if desc.bottoms.len() != expected_bottoms {
            return Err(EngineError::ArityMismatch {
                op: desc.name.clone(),
                kind: "inputs",
                expected: expected_bottoms.to_string(),
                actual: desc.bottoms.len(),
            });
        }
        if desc.tops.len() != 1 {
            return Err(EngineError::ArityMismatch {
                op: desc.name.clone(),
                kind: "outputs",
                expected: "1".to_string(),
                actual: desc.tops.len(),
            });
        }

        let num_output = desc.params.single_usize("num_output", 0)?;
        let kernel = desc.params.single_usize("kernel_size", 0)?;
        let stride = desc.params.single_usize("stride", 1)?;
        let pad = desc.params.single_usize("pad", 0)?;
        let dilation = desc.params.single_usize("dilation", 1)?;
        let group = desc.params.single_usize("group", 1)?;
        for (name, value) in [
            ("num_output", num_output),
            ("kernel_size", kernel),
            ("stride", stride),
            ("dilation", dilation),
            ("group", group),
        ] {
            if value == 0 {
                return Err(EngineError::BadParam {
                    name: name.to_string(),
                    detail: "must be positive".to_string(),
                });
            }
        }
        if num_output % group != 0 {
            return Err(EngineError::BadParam {
                name: "group".to_string(),
                detail: format!("num_output {num_output} is not divisible by group {group}"),
            });
        }
        let activation = Activation::parse(&desc.params.single_str("activation", "")?)?;
        let accelerated = desc.params.single_bool("accelerated", true)?;

        Ok(DeconvOp {
            name: desc.name.clone(),
            bottoms: desc.bottoms.clone(),
            tops: desc.tops.clone(),
            num_output,
            kernel,
            stride,
            pad,
            dilation,
            group,
            bias_term,
            activation,
            accelerated,
        })
    }

    /// Infers the problem geometry from the actual input shape.
    fn problem(&self, input: &TensorHandle) -> EngineResult<DeconvDesc> {
        let t = input.borrow();
        let shape = t.shape();
        if shape.rank() != 4 {
            return Err(EngineError::ShapeMismatch {
                op: self.name.clone(),
                detail: format!(
                    "input '{}' must be 4-d [N, C, H, W], got {shape}",
                    self.bottoms[0]
                ),
            });
        }
        let dims = shape.dims();
        let (batch, in_c, in_h, in_w) = (dims[0], dims[1], dims[2], dims[3]);
        if in_c % self.group != 0 {
            return Err(EngineError::ShapeMismatch {
                op: self.name.clone(),
                detail: format!(
                    "input channels {in_c} not divisible by group {}",
                    self.group
                ),
            });
        }
        let out_of_range = || EngineError::ShapeMismatch {
            op: self.name.clone(),
            detail: format!(
                "kernel {} stride {} pad {} dilation {} produce no output for input {shape}",
                self.kernel, self.stride, self.pad, self.dilation
            ),
        };
        let out_h = deconv_out_size(in_h, self.kernel, self.stride, self.pad, self.dilation)
            .ok_or_else(out_of_range)?;
        let out_w = deconv_out_size(in_w, self.kernel, self.stride, self.pad, self.dilation)
            .ok_or_else(out_of_range)?;
        Ok(DeconvDesc {
            batch,
            in_c,
            in_h,
            in_w,
            out_c: self.num_output,
            out_h,
            out_w,
            kernel: self.kernel,
            stride: self.stride,
            pad: self.pad,
            dilation: self.dilation,
            group: self.group,
        })
    }

    fn forward_portable(
        &self,
        ws: &mut Workspace,
        desc: &DeconvDesc,
        input: &TensorHandle,
        weight: &TensorHandle,
        bias: Option<&TensorHandle>,
        output: &TensorHandle,
    ) -> EngineResult<()> {
        // One reservation covers the column buffer plus, with bias, the ones
        // vector; the carves pack at aligned offsets within it.
        let col_bytes = desc.col_elems() * DType::F32.size_bytes();
        let ones_bytes = if bias.is_some() {
            desc.out_spatial() * DType::F32.size_bytes()
        } else {
            0
        };
        ws.grow_scratch(align_up(col_bytes, ARENA_ALIGN) + ones_bytes, 1)?;

        let col_shape = Shape::new(vec![desc.kernel_dim() * desc.group, desc.in_spatial()]);
        let col_win = self.carve(ws, "col", DType::F32, &col_shape)?;
        let ones_win = match bias {
            Some(_) => Some(self.carve(
                ws,
                "ones",
                DType::F32,
                &Shape::new(vec![desc.out_spatial()]),
            )?),
            None => None,
        };

        let input_ref = input.borrow();
        let input_data = input_ref.as_f32()?;
        let weight_ref = weight.borrow();
        let weight_data = weight_ref.as_f32()?;
        let bias_ref = bias.map(|h| h.borrow());
        let bias_data = match &bias_ref {
            Some(r) => Some(r.as_f32()?),
            None => None,
        };
        let mut out_ref = output.borrow_mut();
        let out_data = out_ref.as_f32_mut()?;
        out_data.fill(0.0);

        let (arena, ctx) = ws.scratch_and_context()?;
        let gemm = ctx.gemm();

        let kdim = desc.kernel_dim();
        let cpg = desc.in_c / desc.group;
        let spatial = desc.in_spatial();

        if let Some(win) = &ones_win {
            arena.f32_slice_mut(win)?.fill(1.0);
        }

        for n in 0..desc.batch {
            let image = &input_data[n * desc.input_elems()..][..desc.input_elems()];
            {
                let col = arena.f32_slice_mut(&col_win)?;
                for g in 0..desc.group {
                    gemm.gemm(
                        true,
                        false,
                        kdim,
                        spatial,
                        cpg,
                        1.0,
                        &weight_data[g * cpg * kdim..][..cpg * kdim],
                        &image[g * cpg * spatial..][..cpg * spatial],
                        0.0,
                        &mut col[g * kdim * spatial..][..kdim * spatial],
                    );
                }
            }

            let col = arena.f32_slice(&col_win)?;
            let out_image = &mut out_data[n * desc.output_elems()..][..desc.output_elems()];
            kernels::col2im(
                col,
                desc.out_c,
                desc.out_h,
                desc.out_w,
                desc.kernel,
                desc.pad,
                desc.stride,
                desc.dilation,
                out_image,
            );

            if let (Some(bias_data), Some(win)) = (bias_data, &ones_win) {
                let ones = arena.f32_slice(win)?;
                gemm.gemm(
                    false,
                    false,
                    desc.out_c,
                    desc.out_spatial(),
                    1,
                    1.0,
                    bias_data,
                    ones,
                    1.0,
                    out_image,
                );
            }
        }
        Ok(())
    }

    fn forward_accelerated(
        &self,
        ws: &mut Workspace,
        desc: &DeconvDesc,
        plan: BackwardDataPlan,
        input: &TensorHandle,
        weight: &TensorHandle,
        bias: Option<&TensorHandle>,
        output: &TensorHandle,
    ) -> EngineResult<()> {
        let scratch_win = if plan.workspace_bytes > 0 {
            ws.grow_scratch(plan.workspace_bytes, 1)?;
            let shape = Shape::new(vec![plan.workspace_bytes]);
            Some(self.carve(ws, "workspace", DType::U8, &shape)?)
        } else {
            None
        };

        let input_ref = input.borrow();
        let input_data = input_ref.as_f32()?;
        let weight_ref = weight.borrow();
        let weight_data = weight_ref.as_f32()?;
        let bias_ref = bias.map(|h| h.borrow());
        let bias_data = match &bias_ref {
            Some(r) => Some(r.as_f32()?),
            None => None,
        };
        let mut out_ref = output.borrow_mut();
        let out_data = out_ref.as_f32_mut()?;

        let (arena, ctx) = ws.scratch_and_context()?;
        let Some(backend) = ctx.conv_backend() else {
            unreachable!("forward dispatches here only with a backend installed")
        };

        let mut no_scratch: [u8; 0] = [];
        let scratch: &mut [u8] = match &scratch_win {
            Some(win) => arena.u8_slice_mut(win)?,
            None => &mut no_scratch,
        };
        backend.backward_data(desc, plan.algo, weight_data, input_data, scratch, out_data)?;

        if let Some(bias_data) = bias_data {
            for n in 0..desc.batch {
                kernels::add_bias(
                    &mut out_data[n * desc.output_elems()..][..desc.output_elems()],
                    bias_data,
                    desc.out_spatial(),
                );
            }
        }
        Ok(())
    }

    /// Carves a named scratch tensor and returns its arena window.
    fn carve(
        &self,
        ws: &mut Workspace,
        suffix: &str,
        dtype: DType,
        shape: &Shape,
    ) -> EngineResult<ScratchWindow> {
        let handle = ws.create_scratch_tensor(&format!("{}_{suffix}", self.name), dtype, shape)?;
        let Some(win) = handle.borrow().window() else {
            unreachable!("scratch tensors are window-backed")
        };
        Ok(win)
    }
}

impl Operator for DeconvOp {
    fn name(&self) -> &str {
        &self.name
    }

    fn op_type(&self) -> &'static str {
        "Deconvolution"
    }

    fn forward(&mut self, ws: &mut Workspace) -> EngineResult<()> {
        let input = ws.require_tensor(&self.bottoms[0], DType::F32)?;
        let weight = ws.require_tensor(&self.bottoms[1], DType::F32)?;
        let bias = if self.bias_term {
            Some(ws.require_tensor(&self.bottoms[2], DType::F32)?)
        } else {
            None
        };

        let desc = self.problem(&input)?;
        if weight.borrow().count() != desc.weight_elems() {
            return Err(EngineError::ShapeMismatch {
                op: self.name.clone(),
                detail: format!(
                    "weight '{}' holds {} elements, geometry needs {}",
                    self.bottoms[1],
                    weight.borrow().count(),
                    desc.weight_elems()
                ),
            });
        }
        if let Some(b) = &bias {
            if b.borrow().count() != self.num_output {
                return Err(EngineError::ShapeMismatch {
                    op: self.name.clone(),
                    detail: format!(
                        "bias '{}' holds {} elements, expected {}",
                        self.bottoms[2],
                        b.borrow().count(),
                        self.num_output
                    ),
                });
            }
        }

        let output = ws.create_tensor(&self.tops[0], DType::F32, None)?;
        output.borrow_mut().reshape(Shape::new(vec![
            desc.batch,
            desc.out_c,
            desc.out_h,
            desc.out_w,
        ]))?;

        // Accelerated when a backend is installed and the operator allows it.
        let limit = if desc.group == 1 {
            ACCEL_WORKSPACE_LIMIT
        } else {
            0
        };
        let plan = if self.accelerated {
            ws.context()?
                .conv_backend()
                .map(|b| b.plan_backward_data(&desc, limit))
        } else {
            None
        };

        match plan {
            Some(plan) => {
                tracing::debug!(op = %self.name, algo = plan.algo.as_str(), "accelerated path");
                self.forward_accelerated(ws, &desc, plan, &input, &weight, bias.as_ref(), &output)?;
            }
            None => {
                tracing::debug!(op = %self.name, "portable path");
                self.forward_portable(ws, &desc, &input, &weight, bias.as_ref(), &output)?;
            }
        }

        if let Some(act) = self.activation {
            act.apply(output.borrow_mut().as_f32_mut()?);
        }
        Ok(())
    }
}
