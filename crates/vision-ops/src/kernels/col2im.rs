// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scatter-accumulation of a column buffer back into image layout.

/// Scatter-adds a column-organized buffer into a spatial image tensor.
///
/// `col` is the `[channels * kernel * kernel, col_h * col_w]` row-major
/// column buffer produced by the transposed-weight GEMM, where the column
/// grid `(col_h, col_w)` is derived from the image extent and the
/// kernel/stride/pad/dilation geometry (the forward-convolution output size
/// for that geometry). `im` is one `[channels, im_h, im_w]` image; values are
/// accumulated into it, so the caller zero-fills before the first call.
///
/// Each column entry `(c, kh, kw, hc, wc)` lands at image row
/// `hc * stride + kh * dilation - pad` and column `wc * stride + kw *
/// dilation - pad`. Entries whose destination falls outside
/// `[0, im_h) x [0, im_w)` contribute nothing; the bounds check guards every
/// accumulation.
pub fn col2im(
    col: &[f32],
    channels: usize,
    im_h: usize,
    im_w: usize,
    kernel: usize,
    pad: usize,
    stride: usize,
    dilation: usize,
    im: &mut [f32],
) {
    let extent = dilation * (kernel - 1) + 1;
    let col_h = (im_h + 2 * pad - extent) / stride + 1;
    let col_w = (im_w + 2 * pad - extent) / stride + 1;
    let col_spatial = col_h * col_w;
    debug_assert!(col.len() >= channels * kernel * kernel * col_spatial);
    debug_assert!(im.len() >= channels * im_h * im_w);

    for c in 0..channels {
        for kh in 0..kernel {
            for kw in 0..kernel {
                let row = ((c * kernel + kh) * kernel + kw) * col_spatial;
                for hc in 0..col_h {
                    let h_im = (hc * stride + kh * dilation) as isize - pad as isize;
                    if h_im < 0 || h_im >= im_h as isize {
                        continue;
                    }
                    for wc in 0..col_w {
                        let w_im = (wc * stride + kw * dilation) as isize - pad as isize;
                        if w_im < 0 || w_im >= im_w as isize {
                            continue;
                        }
                        im[(c * im_h + h_im as usize) * im_w + w_im as usize] +=
                            col[row + hc * col_w + wc];
                    }
                }
            }
        }
    }
}
