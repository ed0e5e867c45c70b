// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Anchor template enumeration.

/// Enumerates anchor template boxes around the base box `(0, 0, base_size-1,
/// base_size-1)`, returning `ratios.len() * scales.len()` boxes as a flat
/// `[A, 4]` row-major `(xmin, ymin, xmax, ymax)` buffer.
///
/// Enumeration is ratio-major: all scales of the first ratio, then all scales
/// of the second, and so on. For each ratio the base box's area is rescaled
/// to `area / ratio` with the width rounded to the nearest integer and the
/// height rounded from `width * ratio`; each scale then multiplies the
/// rounded extents about the fixed center `(base_size - 1) / 2`, with corners
/// reconstructed under the inclusive pixel convention.
///
/// # Examples
/// ```
/// let anchors = vision_ops::generate_anchors(16, &[1.0], &[1.0]);
/// assert_eq!(anchors, vec![0.0, 0.0, 15.0, 15.0]);
/// ```
pub fn generate_anchors(base_size: usize, ratios: &[f32], scales: &[f32]) -> Vec<f32> {
    let base = base_size as f32;
    let ctr = (base - 1.0) * 0.5;
    let area = base * base;

    let mut anchors = Vec::with_capacity(ratios.len() * scales.len() * 4);
    for &ratio in ratios {
        let width = (area / ratio).sqrt().round();
        let height = (width * ratio).round();
        for &scale in scales {
            let w = width * scale;
            let h = height * scale;
            anchors.extend_from_slice(&[
                ctr - 0.5 * (w - 1.0),
                ctr - 0.5 * (h - 1.0),
                ctr + 0.5 * (w - 1.0),
                ctr + 0.5 * (h - 1.0),
            ]);
        }
    }
    anchors
}
