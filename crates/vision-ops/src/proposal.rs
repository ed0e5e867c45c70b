// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The detection region-proposal operator.
//!
//! Turns a pair of RPN maps — foreground/background scores `[1, 2A, H, W]`
//! and box-regression deltas `[1, 4A, H, W]` — into a ranked, suppressed list
//! of region proposals `[K, 5]`, each row `(batch_index, xmin, ymin, xmax,
//! ymax)`. Per cell and anchor slot the configured template is translated by
//! the feature stride, refined by the regression deltas, clipped to the image
//! and filtered by minimum size; survivors are stable-sorted by score,
//! truncated to the pre-NMS cap, greedily suppressed and truncated again.
//!
//! Candidate boxes live in a scratch table carved from the workspace arena;
//! nothing persists across forward calls except the output tensor.

use inference_core::{
    EngineError, EngineResult, OpDesc, Operator, TensorHandle, Workspace,
};
use scratch_arena::{align_up, ScratchWindow, ARENA_ALIGN};
use tensor_core::{DType, Shape};

use crate::anchors::generate_anchors;
use crate::kernels::{nms, Candidate};

const DEFAULT_RATIOS: [f32; 3] = [0.5, 1.0, 2.0];
const DEFAULT_SCALES: [f32; 3] = [8.0, 16.0, 32.0];

/// Columns of one row in the scratch proposal table:
/// `[xmin, ymin, xmax, ymax, score, valid]`.
const TABLE_COLS: usize = 6;

/// Region-proposal operator.
///
/// Bottoms: score map, delta map, image-info vector `(height, width, scale)`.
/// Tops: one proposal tensor, reshaped to `[K, 5]` every pass.
pub struct ProposalOp {
    name: String,
    bottoms: Vec<String>,
    tops: Vec<String>,
    feat_stride: usize,
    pre_nms_top_n: usize,
    post_nms_top_n: usize,
    min_size: f32,
    nms_thresh: f32,
    /// `[A, 4]` anchor templates, row-major.
    anchors: Vec<f32>,
}

impl ProposalOp {
    /// Registry constructor.
    pub fn create(desc: &OpDesc) -> EngineResult<Box<dyn Operator>> {
        Ok(Box::new(Self::from_desc(desc)?))
    }

    /// Validates the description and builds the operator.
    ///
    /// Anchor templates come from an explicit `anchors` parameter when given,
    /// otherwise from `base_size`/`ratios`/`scales` enumeration.
    pub fn from_desc(desc: &OpDesc) -> EngineResult<Self> {
        if desc.bottoms.len() != 3 {
            return Err(EngineError::ArityMismatch {
                op: desc.name.clone(),
                kind: "inputs",
                expected: "3".to_string(),
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

        let anchors = match desc.params.repeated_f32("anchors")? {
            Some(table) => {
                if table.is_empty() || table.len() % 4 != 0 {
                    return Err(EngineError::BadParam {
                        name: "anchors".to_string(),
                        detail: format!(
                            "must be a non-empty list of (xmin, ymin, xmax, ymax) rows, got {} values",
                            table.len()
                        ),
                    });
                }
                table
            }
            None => {
                let base_size = desc.params.single_usize("base_size", 16)?;
                let ratios = desc
                    .params
                    .repeated_f32("ratios")?
                    .unwrap_or_else(|| DEFAULT_RATIOS.to_vec());
                let scales = desc
                    .params
                    .repeated_f32("scales")?
                    .unwrap_or_else(|| DEFAULT_SCALES.to_vec());
                generate_anchors(base_size, &ratios, &scales)
            }
        };

        Ok(ProposalOp {
            name: desc.name.clone(),
            bottoms: desc.bottoms.clone(),
            tops: desc.tops.clone(),
            feat_stride: desc.params.single_usize("feat_stride", 16)?,
            pre_nms_top_n: desc.params.single_usize("pre_nms_top_n", 6000)?,
            post_nms_top_n: desc.params.single_usize("post_nms_top_n", 300)?,
            min_size: desc.params.single_f32("min_size", 16.0)?,
            nms_thresh: desc.params.single_f32("nms_threshold", 0.7)?,
            anchors,
        })
    }

    /// Number of anchor slots per spatial cell.
    pub fn num_anchors(&self) -> usize {
        self.anchors.len() / 4
    }

    fn check_shapes(
        &self,
        scores: &TensorHandle,
        deltas: &TensorHandle,
        im_info: &TensorHandle,
    ) -> EngineResult<(usize, usize)> {
        let a = self.num_anchors();
        let mismatch = |detail: String| EngineError::ShapeMismatch {
            op: self.name.clone(),
            detail,
        };

        let scores_ref = scores.borrow();
        let s = scores_ref.shape();
        if s.rank() != 4 || s.dim(0) != Some(1) {
            return Err(mismatch(format!(
                "score map '{}' must be [1, 2A, H, W], got {s}",
                self.bottoms[0]
            )));
        }
        if s.dim(1) != Some(2 * a) {
            return Err(mismatch(format!(
                "score map '{}' has {} channels, expected 2A = {}",
                self.bottoms[0],
                s.dims()[1],
                2 * a
            )));
        }
        let (h, w) = (s.dims()[2], s.dims()[3]);

        let deltas_ref = deltas.borrow();
        let d = deltas_ref.shape();
        if d.rank() != 4 || d.dim(0) != Some(1) || d.dim(1) != Some(4 * a) {
            return Err(mismatch(format!(
                "delta map '{}' must be [1, 4A, H, W] with A = {a}, got {d}",
                self.bottoms[1]
            )));
        }
        if d.dims()[2] != h || d.dims()[3] != w {
            return Err(mismatch(format!(
                "delta map '{}' grid {d} does not match score grid {s}",
                self.bottoms[1]
            )));
        }

        if im_info.borrow().count() != 3 {
            return Err(mismatch(format!(
                "image info '{}' must hold (height, width, scale), got {} values",
                self.bottoms[2],
                im_info.borrow().count()
            )));
        }
        Ok((h, w))
    }

    /// Decodes every cell/slot into the scratch table.
    ///
    /// Row `(cell * A + slot) * 6` holds `[xmin, ymin, xmax, ymax, score,
    /// valid]` with corners already clipped to the image.
    #[allow(clippy::too_many_arguments)]
    fn decode(
        &self,
        table: &mut [f32],
        anchors: &[f32],
        score_data: &[f32],
        delta_data: &[f32],
        h: usize,
        w: usize,
        im_h: f32,
        im_w: f32,
        min_box: f32,
    ) {
        let a_count = self.num_anchors();
        let fg_offset = a_count * h * w;

        for hh in 0..h {
            for ww in 0..w {
                for a in 0..a_count {
                    let template = &anchors[a * 4..a * 4 + 4];
                    let shift_x = (ww * self.feat_stride) as f32;
                    let shift_y = (hh * self.feat_stride) as f32;
                    let xmin = template[0] + shift_x;
                    let ymin = template[1] + shift_y;
                    let xmax = template[2] + shift_x;
                    let ymax = template[3] + shift_y;

                    // Inclusive extents, center at corner + (size - 1) / 2.
                    let aw = xmax - xmin + 1.0;
                    let ah = ymax - ymin + 1.0;
                    let cx = xmin + 0.5 * (aw - 1.0);
                    let cy = ymin + 0.5 * (ah - 1.0);

                    let dx = delta_data[((a * 4) * h + hh) * w + ww];
                    let dy = delta_data[((a * 4 + 1) * h + hh) * w + ww];
                    let dw = delta_data[((a * 4 + 2) * h + hh) * w + ww];
                    let dh = delta_data[((a * 4 + 3) * h + hh) * w + ww];

                    let pcx = cx + aw * dx;
                    let pcy = cy + ah * dy;
                    let pw = aw * dw.exp();
                    let ph = ah * dh.exp();

                    let x0 = (pcx - 0.5 * (pw - 1.0)).max(0.0).min(im_w - 1.0);
                    let y0 = (pcy - 0.5 * (ph - 1.0)).max(0.0).min(im_h - 1.0);
                    let x1 = (pcx + 0.5 * (pw - 1.0)).max(0.0).min(im_w - 1.0);
                    let y1 = (pcy + 0.5 * (ph - 1.0)).max(0.0).min(im_h - 1.0);

                    let valid = x1 - x0 + 1.0 >= min_box && y1 - y0 + 1.0 >= min_box;
                    let score = score_data[fg_offset + (a * h + hh) * w + ww];

                    let row = ((hh * w + ww) * a_count + a) * TABLE_COLS;
                    table[row..row + TABLE_COLS]
                        .copy_from_slice(&[x0, y0, x1, y1, score, valid as u32 as f32]);
                }
            }
        }
    }

    fn carve(&self, ws: &mut Workspace, suffix: &str, shape: &Shape) -> EngineResult<ScratchWindow> {
        let handle =
            ws.create_scratch_tensor(&format!("{}_{suffix}", self.name), DType::F32, shape)?;
        let Some(win) = handle.borrow().window() else {
            unreachable!("scratch tensors are window-backed")
        };
        Ok(win)
    }
}

impl Operator for ProposalOp {
    fn name(&self) -> &str {
        &self.name
    }

    fn op_type(&self) -> &'static str {
        "Proposal"
    }

    fn forward(&mut self, ws: &mut Workspace) -> EngineResult<()> {
        let scores = ws.require_tensor(&self.bottoms[0], DType::F32)?;
        let deltas = ws.require_tensor(&self.bottoms[1], DType::F32)?;
        let im_info = ws.require_tensor(&self.bottoms[2], DType::F32)?;
        let (h, w) = self.check_shapes(&scores, &deltas, &im_info)?;

        let a_count = self.num_anchors();
        let rows = h * w * a_count;

        // One reservation covers the anchor table plus the proposal table.
        let anchors_bytes = self.anchors.len() * DType::F32.size_bytes();
        let table_bytes = rows * TABLE_COLS * DType::F32.size_bytes();
        ws.grow_scratch(align_up(anchors_bytes, ARENA_ALIGN) + table_bytes, 1)?;
        let anchors_win = self.carve(ws, "anchors", &Shape::new(vec![a_count, 4]))?;
        let table_win = self.carve(ws, "proposals", &Shape::new(vec![rows, TABLE_COLS]))?;

        let (im_h, im_w, im_scale) = {
            let info_ref = im_info.borrow();
            let info = info_ref.as_f32()?;
            (info[0], info[1], info[2])
        };
        let min_box = self.min_size * im_scale;

        let scores_ref = scores.borrow();
        let score_data = scores_ref.as_f32()?;
        let deltas_ref = deltas.borrow();
        let delta_data = deltas_ref.as_f32()?;

        let arena = ws.arena_mut();
        arena
            .f32_slice_mut(&anchors_win)?
            .copy_from_slice(&self.anchors);

        let mut candidates: Vec<Candidate> = Vec::new();
        {
            let (table, anchor_table) = arena.split_f32_mut(&table_win, &anchors_win)?;
            self.decode(
                table,
                anchor_table,
                score_data,
                delta_data,
                h,
                w,
                im_h,
                im_w,
                min_box,
            );

            // Enumeration order is preserved here; the stable sort below keeps
            // it for equal scores, which downstream consumers rely on.
            for row in table.chunks_exact(TABLE_COLS) {
                if row[5] != 0.0 && row[4] > 0.0 {
                    candidates.push(Candidate {
                        xmin: row[0],
                        ymin: row[1],
                        xmax: row[2],
                        ymax: row[3],
                        score: row[4],
                    });
                }
            }
        }

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if self.pre_nms_top_n > 0 && candidates.len() > self.pre_nms_top_n {
            candidates.truncate(self.pre_nms_top_n);
        }

        let mut kept = nms(&candidates, self.nms_thresh);
        if self.post_nms_top_n > 0 && kept.len() > self.post_nms_top_n {
            kept.truncate(self.post_nms_top_n);
        }
        tracing::debug!(
            op = %self.name,
            candidates = candidates.len(),
            kept = kept.len(),
            "proposals emitted"
        );

        let output = ws.create_tensor(&self.tops[0], DType::F32, None)?;
        let mut out_ref = output.borrow_mut();
        out_ref.reshape(Shape::new(vec![kept.len(), 5]))?;
        if !kept.is_empty() {
            let out = out_ref.as_f32_mut()?;
            for (i, &k) in kept.iter().enumerate() {
                let c = &candidates[k];
                out[i * 5..i * 5 + 5].copy_from_slice(&[0.0, c.xmin, c.ymin, c.xmax, c.ymax]);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_core::{ContextConfig, OpParams};

    fn workspace() -> Workspace {
        let mut ws = Workspace::new();
        ws.create_context(&ContextConfig {
            device_id: 0,
            gemm_backend: "naive".to_string(),
        })
        .unwrap();
        ws
    }

    fn seed(ws: &mut Workspace, name: &str, dims: &[usize], values: &[f32]) {
        let handle = ws
            .create_tensor(name, DType::F32, Some(&Shape::new(dims.to_vec())))
            .unwrap();
        handle.borrow_mut().set_f32(values).unwrap();
    }

    fn desc(params: OpParams) -> OpDesc {
        OpDesc::new("proposal1", "Proposal")
            .bottom("scores")
            .bottom("deltas")
            .bottom("im_info")
            .top("rois")
            .params(params)
    }

    /// One anchor slot with the base 16x16 template.
    fn single_anchor_params() -> OpParams {
        OpParams::new().set("anchors", vec![0.0, 0.0, 15.0, 15.0])
    }

    fn rois(ws: &Workspace) -> Vec<f32> {
        let out = ws.require_tensor("rois", DType::F32).unwrap();
        let out = out.borrow();
        if out.count() == 0 {
            return Vec::new();
        }
        out.as_f32().unwrap().to_vec()
    }

    #[test]
    fn test_zero_delta_decodes_anchor() {
        let mut ws = workspace();
        seed(&mut ws, "scores", &[1, 2, 1, 1], &[0.1, 0.9]);
        seed(&mut ws, "deltas", &[1, 4, 1, 1], &[0.0; 4]);
        seed(&mut ws, "im_info", &[3], &[20.0, 20.0, 1.0]);
        let mut op = ProposalOp::from_desc(&desc(single_anchor_params())).unwrap();
        op.forward(&mut ws).unwrap();

        // Within the 20x20 image the box is unchanged by clipping.
        assert_eq!(rois(&ws), vec![0.0, 0.0, 0.0, 15.0, 15.0]);
    }

    #[test]
    fn test_grid_cell_translates_anchor() {
        let mut ws = workspace();
        seed(&mut ws, "scores", &[1, 2, 1, 2], &[0.1, 0.1, 0.0, 0.9]);
        seed(&mut ws, "deltas", &[1, 4, 1, 2], &[0.0; 8]);
        seed(&mut ws, "im_info", &[3], &[64.0, 64.0, 1.0]);
        let mut op = ProposalOp::from_desc(&desc(single_anchor_params())).unwrap();
        op.forward(&mut ws).unwrap();

        // Only cell (0, 1) scores positive; its anchor is shifted by the
        // feature stride.
        assert_eq!(rois(&ws), vec![0.0, 16.0, 0.0, 31.0, 15.0]);
    }

    #[test]
    fn test_deltas_scale_and_translate() {
        let mut ws = workspace();
        seed(&mut ws, "scores", &[1, 2, 1, 1], &[0.1, 0.9]);
        // dx shifts by one anchor width; dw = ln(2) doubles the width.
        let two: f32 = 2.0;
        seed(
            &mut ws,
            "deltas",
            &[1, 4, 1, 1],
            &[1.0, 0.0, two.ln(), 0.0],
        );
        seed(&mut ws, "im_info", &[3], &[256.0, 256.0, 1.0]);
        let mut op = ProposalOp::from_desc(&desc(single_anchor_params())).unwrap();
        op.forward(&mut ws).unwrap();

        // Center moves 7.5 -> 23.5, width 16 -> 32: corners 8 and 39.
        let r = rois(&ws);
        assert_eq!(&r[..3], &[0.0, 8.0, 0.0]);
        assert_eq!(r[3], 39.0);
        assert_eq!(r[4], 15.0);
    }

    #[test]
    fn test_clipping_to_image() {
        let mut ws = workspace();
        seed(&mut ws, "scores", &[1, 2, 1, 1], &[0.1, 0.9]);
        seed(&mut ws, "deltas", &[1, 4, 1, 1], &[0.0; 4]);
        seed(&mut ws, "im_info", &[3], &[10.0, 10.0, 1.0]);
        let mut op = ProposalOp::from_desc(&desc(
            single_anchor_params().set("min_size", 1i64),
        ))
        .unwrap();
        op.forward(&mut ws).unwrap();

        assert_eq!(rois(&ws), vec![0.0, 0.0, 0.0, 9.0, 9.0]);
    }

    #[test]
    fn test_min_size_filter_scales_with_image() {
        // The 16-wide box passes at scale 1 but fails min_size * 2.
        let mut ws = workspace();
        seed(&mut ws, "scores", &[1, 2, 1, 1], &[0.1, 0.9]);
        seed(&mut ws, "deltas", &[1, 4, 1, 1], &[0.0; 4]);
        seed(&mut ws, "im_info", &[3], &[100.0, 100.0, 2.0]);
        let mut op = ProposalOp::from_desc(&desc(single_anchor_params())).unwrap();
        op.forward(&mut ws).unwrap();

        assert!(rois(&ws).is_empty());
        let out = ws.require_tensor("rois", DType::F32).unwrap();
        assert_eq!(out.borrow().shape().dims(), &[0, 5]);
    }

    #[test]
    fn test_non_positive_scores_discarded() {
        let mut ws = workspace();
        seed(&mut ws, "scores", &[1, 2, 1, 2], &[0.1, 0.1, 0.0, -0.5]);
        seed(&mut ws, "deltas", &[1, 4, 1, 2], &[0.0; 8]);
        seed(&mut ws, "im_info", &[3], &[64.0, 64.0, 1.0]);
        let mut op = ProposalOp::from_desc(&desc(single_anchor_params())).unwrap();
        op.forward(&mut ws).unwrap();

        assert!(rois(&ws).is_empty());
    }

    #[test]
    fn test_descending_order_with_stable_ties() {
        // Three disjoint cells: scores 0.5, 0.9, 0.5. The winner leads and
        // the tied pair keeps enumeration order (cell 0 before cell 2).
        let mut ws = workspace();
        seed(
            &mut ws,
            "scores",
            &[1, 2, 1, 3],
            &[0.1, 0.1, 0.1, 0.5, 0.9, 0.5],
        );
        seed(&mut ws, "deltas", &[1, 4, 1, 3], &[0.0; 12]);
        seed(&mut ws, "im_info", &[3], &[64.0, 64.0, 1.0]);
        let mut op = ProposalOp::from_desc(&desc(single_anchor_params())).unwrap();
        op.forward(&mut ws).unwrap();

        let r = rois(&ws);
        assert_eq!(r.len(), 15);
        assert_eq!(r[1], 16.0); // score 0.9, cell 1
        assert_eq!(r[6], 0.0); // tie: cell 0 first
        assert_eq!(r[11], 32.0); // then cell 2
    }

    #[test]
    fn test_nms_keeps_higher_scoring_duplicate() {
        // Two anchor slots with identical templates decode to identical
        // boxes; IoU 1.0 suppresses the lower-scoring one.
        let mut ws = workspace();
        seed(
            &mut ws,
            "scores",
            &[1, 4, 1, 1],
            &[0.1, 0.1, 0.4, 0.8],
        );
        seed(&mut ws, "deltas", &[1, 8, 1, 1], &[0.0; 8]);
        seed(&mut ws, "im_info", &[3], &[64.0, 64.0, 1.0]);
        let params = OpParams::new().set(
            "anchors",
            vec![0.0, 0.0, 15.0, 15.0, 0.0, 0.0, 15.0, 15.0],
        );
        let mut op = ProposalOp::from_desc(&desc(params)).unwrap();
        op.forward(&mut ws).unwrap();

        let r = rois(&ws);
        assert_eq!(r.len(), 5);
        // The kept box is slot 1's (score 0.8); geometry is identical.
        assert_eq!(r, vec![0.0, 0.0, 0.0, 15.0, 15.0]);
    }

    #[test]
    fn test_pre_nms_cap_truncates_ranking() {
        let mut ws = workspace();
        seed(
            &mut ws,
            "scores",
            &[1, 2, 1, 3],
            &[0.1, 0.1, 0.1, 0.5, 0.9, 0.7],
        );
        seed(&mut ws, "deltas", &[1, 4, 1, 3], &[0.0; 12]);
        seed(&mut ws, "im_info", &[3], &[64.0, 64.0, 1.0]);
        let mut op =
            ProposalOp::from_desc(&desc(single_anchor_params().set("pre_nms_top_n", 1i64)))
                .unwrap();
        op.forward(&mut ws).unwrap();

        let r = rois(&ws);
        assert_eq!(r.len(), 5);
        assert_eq!(r[1], 16.0); // only the 0.9-scoring cell survives the cap
    }

    #[test]
    fn test_post_nms_cap_truncates_kept_list() {
        let mut ws = workspace();
        seed(
            &mut ws,
            "scores",
            &[1, 2, 1, 3],
            &[0.1, 0.1, 0.1, 0.5, 0.9, 0.7],
        );
        seed(&mut ws, "deltas", &[1, 4, 1, 3], &[0.0; 12]);
        seed(&mut ws, "im_info", &[3], &[64.0, 64.0, 1.0]);
        let mut op =
            ProposalOp::from_desc(&desc(single_anchor_params().set("post_nms_top_n", 2i64)))
                .unwrap();
        op.forward(&mut ws).unwrap();

        let r = rois(&ws);
        assert_eq!(r.len(), 10);
        assert_eq!(r[1], 16.0); // 0.9 first
        assert_eq!(r[6], 32.0); // 0.7 second; 0.5 truncated
    }

    #[test]
    fn test_default_anchor_grid() {
        let op = ProposalOp::from_desc(&desc(OpParams::new())).unwrap();
        assert_eq!(op.num_anchors(), 9);
    }

    #[test]
    fn test_rejects_batch_greater_than_one() {
        let mut ws = workspace();
        seed(&mut ws, "scores", &[2, 2, 1, 1], &[0.1; 4]);
        seed(&mut ws, "deltas", &[2, 4, 1, 1], &[0.0; 8]);
        seed(&mut ws, "im_info", &[3], &[64.0, 64.0, 1.0]);
        let mut op = ProposalOp::from_desc(&desc(single_anchor_params())).unwrap();
        assert!(matches!(
            op.forward(&mut ws),
            Err(EngineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_channel_mismatch() {
        let mut ws = workspace();
        seed(&mut ws, "scores", &[1, 6, 1, 1], &[0.1; 6]);
        seed(&mut ws, "deltas", &[1, 4, 1, 1], &[0.0; 4]);
        seed(&mut ws, "im_info", &[3], &[64.0, 64.0, 1.0]);
        let mut op = ProposalOp::from_desc(&desc(single_anchor_params())).unwrap();
        assert!(matches!(
            op.forward(&mut ws),
            Err(EngineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_im_info() {
        let mut ws = workspace();
        seed(&mut ws, "scores", &[1, 2, 1, 1], &[0.1, 0.9]);
        seed(&mut ws, "deltas", &[1, 4, 1, 1], &[0.0; 4]);
        seed(&mut ws, "im_info", &[2], &[64.0, 64.0]);
        let mut op = ProposalOp::from_desc(&desc(single_anchor_params())).unwrap();
        assert!(matches!(
            op.forward(&mut ws),
            Err(EngineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_anchor_table() {
        let params = OpParams::new().set("anchors", vec![0.0, 0.0, 15.0]);
        assert!(matches!(
            ProposalOp::from_desc(&desc(params)),
            Err(EngineError::BadParam { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_arity() {
        let d = OpDesc::new("proposal1", "Proposal")
            .bottom("scores")
            .bottom("deltas")
            .top("rois");
        assert!(matches!(
            ProposalOp::from_desc(&d),
            Err(EngineError::ArityMismatch { .. })
        ));
    }
}
