// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The accelerated deconvolution backend.
//!
//! Implements the engine's [`ConvBackend`] contract with two algorithms:
//!
//! - [`BwdDataAlgo::ImplicitGemm`] — one transposed-weight GEMM per group
//!   into a column workspace, then a col2im scatter per image. Fast, needs a
//!   workspace the size of one column buffer.
//! - [`BwdDataAlgo::Direct`] — a gather loop computing every output pixel
//!   from the input taps that reach it. No workspace, always admissible.
//!
//! Planning picks implicit GEMM whenever its workspace fits the caller's
//! limit. Both algorithms produce results identical to the operator's
//! portable path within float tolerance.

use inference_core::{
    create_gemm, BackwardDataPlan, BwdDataAlgo, ConvBackend, DeconvDesc, EngineConfig,
    EngineError, EngineResult, Gemm, Workspace,
};

use crate::kernels::col2im;

/// [`ConvBackend`] built from a [`Gemm`] strategy.
pub struct GemmConvBackend {
    gemm: Box<dyn Gemm>,
}

impl GemmConvBackend {
    pub fn new(gemm: Box<dyn Gemm>) -> Self {
        Self { gemm }
    }

    /// Builds the backend around the named GEMM strategy.
    pub fn from_strategy(name: &str) -> EngineResult<Self> {
        Ok(Self::new(create_gemm(name)?))
    }

    fn implicit_gemm(
        &self,
        desc: &DeconvDesc,
        weight: &[f32],
        input: &[f32],
        scratch: &mut [u8],
        output: &mut [f32],
    ) -> EngineResult<()> {
        // SAFETY: every bit pattern is a valid f32 and the slice is only used
        // as plain numeric storage. Alignment is checked via the empty prefix.
        let (prefix, col, _) = unsafe { scratch.align_to_mut::<f32>() };
        if !prefix.is_empty() || col.len() < desc.col_elems() {
            return Err(EngineError::Backend {
                backend: self.name().to_string(),
                detail: format!(
                    "implicit-gemm workspace must hold {} aligned f32 values, got {} bytes",
                    desc.col_elems(),
                    scratch.len()
                ),
            });
        }

        let kdim = desc.kernel_dim();
        let cpg = desc.in_c / desc.group;
        let spatial = desc.in_spatial();

        output.fill(0.0);
        for n in 0..desc.batch {
            let image = &input[n * desc.input_elems()..][..desc.input_elems()];
            for g in 0..desc.group {
                self.gemm.gemm(
                    true,
                    false,
                    kdim,
                    spatial,
                    cpg,
                    1.0,
                    &weight[g * cpg * kdim..][..cpg * kdim],
                    &image[g * cpg * spatial..][..cpg * spatial],
                    0.0,
                    &mut col[g * kdim * spatial..][..kdim * spatial],
                );
            }
            let out_image = &mut output[n * desc.output_elems()..][..desc.output_elems()];
            col2im(
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
        }
        Ok(())
    }
}

impl ConvBackend for GemmConvBackend {
    fn name(&self) -> &'static str {
        "gemm-conv"
    }

    fn plan_backward_data(&self, desc: &DeconvDesc, workspace_limit: usize) -> BackwardDataPlan {
        let col_bytes = desc.col_elems() * std::mem::size_of::<f32>();
        let plan = if col_bytes <= workspace_limit {
            BackwardDataPlan {
                algo: BwdDataAlgo::ImplicitGemm,
                workspace_bytes: col_bytes,
            }
        } else {
            BackwardDataPlan {
                algo: BwdDataAlgo::Direct,
                workspace_bytes: 0,
            }
        };
        tracing::debug!(
            algo = plan.algo.as_str(),
            workspace_bytes = plan.workspace_bytes,
            limit = workspace_limit,
            "backward-data plan"
        );
        plan
    }

    fn backward_data(
        &self,
        desc: &DeconvDesc,
        algo: BwdDataAlgo,
        weight: &[f32],
        input: &[f32],
        scratch: &mut [u8],
        output: &mut [f32],
    ) -> EngineResult<()> {
        if weight.len() < desc.weight_elems()
            || input.len() < desc.batch * desc.input_elems()
            || output.len() < desc.batch * desc.output_elems()
        {
            return Err(EngineError::Backend {
                backend: self.name().to_string(),
                detail: "slice lengths do not match the problem description".to_string(),
            });
        }
        match algo {
            BwdDataAlgo::ImplicitGemm => self.implicit_gemm(desc, weight, input, scratch, output),
            BwdDataAlgo::Direct => {
                direct_backward_data(desc, weight, input, output);
                Ok(())
            }
        }
    }
}

/// Direct transposed convolution: gathers, per output pixel, the input taps
/// that scatter onto it. Zero workspace.
fn direct_backward_data(desc: &DeconvDesc, weight: &[f32], input: &[f32], output: &mut [f32]) {
    let cpg = desc.in_c / desc.group;
    let ocpg = desc.out_c / desc.group;
    let ksq = desc.kernel * desc.kernel;

    for n in 0..desc.batch {
        let image = &input[n * desc.input_elems()..][..desc.input_elems()];
        let out_image = &mut output[n * desc.output_elems()..][..desc.output_elems()];
        for g in 0..desc.group {
            for oc in 0..ocpg {
                let c = g * ocpg + oc;
                for oh in 0..desc.out_h {
                    for ow in 0..desc.out_w {
                        let mut acc = 0.0f32;
                        for kh in 0..desc.kernel {
                            let th = oh + desc.pad;
                            let reach_h = kh * desc.dilation;
                            if reach_h > th || (th - reach_h) % desc.stride != 0 {
                                continue;
                            }
                            let ih = (th - reach_h) / desc.stride;
                            if ih >= desc.in_h {
                                continue;
                            }
                            for kw in 0..desc.kernel {
                                let tw = ow + desc.pad;
                                let reach_w = kw * desc.dilation;
                                if reach_w > tw || (tw - reach_w) % desc.stride != 0 {
                                    continue;
                                }
                                let iw = (tw - reach_w) / desc.stride;
                                if iw >= desc.in_w {
                                    continue;
                                }
                                for ic in 0..cpg {
                                    let ci = g * cpg + ic;
                                    acc += image[(ci * desc.in_h + ih) * desc.in_w + iw]
                                        * weight[(ci * ocpg + oc) * ksq
                                            + kh * desc.kernel
                                            + kw];
                                }
                            }
                        }
                        out_image[(c * desc.out_h + oh) * desc.out_w + ow] = acc;
                    }
                }
            }
        }
    }
}

/// Installs the accelerated backend into a workspace's context when the
/// engine configuration asks for it.
///
/// The backend shares the context's GEMM strategy name, so a `"naive"`
/// context gets a naive-GEMM backend and a `"faer"` context the optimized
/// one.
pub fn install_conv_backend(ws: &mut Workspace, config: &EngineConfig) -> EngineResult<()> {
    if !config.accelerated_conv {
        return Ok(());
    }
    let backend = GemmConvBackend::from_strategy(&config.context.gemm_backend)?;
    ws.context_mut()?.set_conv_backend(Box::new(backend));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_core::NaiveGemm;

    fn backend() -> GemmConvBackend {
        GemmConvBackend::new(Box::new(NaiveGemm))
    }

    fn desc_2x2_up() -> DeconvDesc {
        DeconvDesc {
            batch: 1,
            in_c: 1,
            in_h: 2,
            in_w: 2,
            out_c: 1,
            out_h: 3,
            out_w: 3,
            kernel: 2,
            stride: 1,
            pad: 0,
            dilation: 1,
            group: 1,
        }
    }

    #[test]
    fn test_plan_respects_limit() {
        let desc = desc_2x2_up();
        let col_bytes = desc.col_elems() * 4;

        let plan = backend().plan_backward_data(&desc, col_bytes);
        assert_eq!(plan.algo, BwdDataAlgo::ImplicitGemm);
        assert_eq!(plan.workspace_bytes, col_bytes);

        let plan = backend().plan_backward_data(&desc, col_bytes - 1);
        assert_eq!(plan.algo, BwdDataAlgo::Direct);
        assert_eq!(plan.workspace_bytes, 0);

        let plan = backend().plan_backward_data(&desc, 0);
        assert_eq!(plan.algo, BwdDataAlgo::Direct);
    }

    #[test]
    fn test_direct_known_values() {
        // 2x2 input, all-ones 2x2 kernel, stride 1: classic overlap pattern.
        let desc = desc_2x2_up();
        let input = [1.0, 2.0, 3.0, 4.0];
        let weight = [1.0; 4];
        let mut output = [f32::NAN; 9];
        backend()
            .backward_data(&desc, BwdDataAlgo::Direct, &weight, &input, &mut [], &mut output)
            .unwrap();
        #[rustfmt::skip]
        let expected = [
            1.0, 3.0, 2.0,
            4.0, 10.0, 6.0,
            3.0, 7.0, 4.0,
        ];
        assert_eq!(output, expected);
    }

    #[test]
    fn test_algorithms_agree() {
        let desc = DeconvDesc {
            batch: 2,
            in_c: 4,
            in_h: 3,
            in_w: 4,
            out_c: 6,
            out_h: 7,
            out_w: 9,
            kernel: 3,
            stride: 2,
            pad: 0,
            dilation: 1,
            group: 2,
        };
        let weight: Vec<f32> = (0..desc.weight_elems())
            .map(|i| ((i * 31 + 7) % 13) as f32 * 0.25 - 1.0)
            .collect();
        let input: Vec<f32> = (0..desc.batch * desc.input_elems())
            .map(|i| ((i * 17 + 3) % 11) as f32 * 0.5 - 2.0)
            .collect();

        let b = backend();
        let mut direct = vec![0.0; desc.batch * desc.output_elems()];
        b.backward_data(&desc, BwdDataAlgo::Direct, &weight, &input, &mut [], &mut direct)
            .unwrap();

        // f32 backing mirrors the arena's alignment guarantee.
        let mut backing = vec![0.0f32; desc.col_elems()];
        let (_, scratch, _) = unsafe { backing.align_to_mut::<u8>() };
        let mut gemm = vec![f32::NAN; desc.batch * desc.output_elems()];
        b.backward_data(
            &desc,
            BwdDataAlgo::ImplicitGemm,
            &weight,
            &input,
            scratch,
            &mut gemm,
        )
        .unwrap();

        for (i, (d, g)) in direct.iter().zip(gemm.iter()).enumerate() {
            assert!((d - g).abs() < 1e-4, "element {i}: direct {d}, gemm {g}");
        }
    }

    #[test]
    fn test_implicit_gemm_rejects_short_workspace() {
        let desc = desc_2x2_up();
        let mut scratch = vec![0u8; 4];
        let mut output = [0.0; 9];
        let err = backend()
            .backward_data(
                &desc,
                BwdDataAlgo::ImplicitGemm,
                &[1.0; 4],
                &[1.0; 4],
                &mut scratch,
                &mut output,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Backend { .. }));
    }

    #[test]
    fn test_rejects_short_slices() {
        let desc = desc_2x2_up();
        let mut output = [0.0; 9];
        let err = backend()
            .backward_data(&desc, BwdDataAlgo::Direct, &[1.0; 2], &[1.0; 4], &mut [], &mut output)
            .unwrap_err();
        assert!(matches!(err, EngineError::Backend { .. }));
    }
}
