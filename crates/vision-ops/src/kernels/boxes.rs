// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Box overlap and greedy non-maximum suppression.
//!
//! Corners are inclusive pixel coordinates, so a box covering a single pixel
//! has `xmin == xmax` and width 1: areas and intersection extents both add 1,
//! and two identical boxes score an IoU of exactly 1.0.

/// A scored candidate box that survived decoding and validity filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub score: f32,
}

impl Candidate {
    /// Inclusive pixel-count area.
    pub fn area(&self) -> f32 {
        (self.xmax - self.xmin + 1.0) * (self.ymax - self.ymin + 1.0)
    }
}

/// Intersection-over-union of two boxes; disjoint boxes score 0.
pub fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let iw = a.xmax.min(b.xmax) - a.xmin.max(b.xmin) + 1.0;
    let ih = a.ymax.min(b.ymax) - a.ymin.max(b.ymin) + 1.0;
    if iw <= 0.0 || ih <= 0.0 {
        return 0.0;
    }
    let inter = iw * ih;
    inter / (a.area() + b.area() - inter)
}

/// Greedy NMS over candidates already sorted by descending score.
///
/// Walks the candidates in order and keeps each one unless its IoU with any
/// already-kept candidate strictly exceeds `threshold`. Returns the kept
/// indices, still in descending-score order.
pub fn nms(candidates: &[Candidate], threshold: f32) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::new();
    'candidates: for (i, c) in candidates.iter().enumerate() {
        for &k in &kept {
            if iou(c, &candidates[k]) > threshold {
                continue 'candidates;
            }
        }
        kept.push(i);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(xmin: f32, ymin: f32, xmax: f32, ymax: f32, score: f32) -> Candidate {
        Candidate {
            xmin,
            ymin,
            xmax,
            ymax,
            score,
        }
    }

    #[test]
    fn test_area_is_inclusive() {
        assert_eq!(boxed(0.0, 0.0, 0.0, 0.0, 1.0).area(), 1.0);
        assert_eq!(boxed(0.0, 0.0, 15.0, 15.0, 1.0).area(), 256.0);
    }

    #[test]
    fn test_iou_identical_boxes() {
        let a = boxed(0.0, 0.0, 9.0, 9.0, 1.0);
        assert_eq!(iou(&a, &a), 1.0);
    }

    #[test]
    fn test_iou_disjoint_is_zero() {
        let a = boxed(0.0, 0.0, 4.0, 4.0, 1.0);
        let b = boxed(10.0, 10.0, 14.0, 14.0, 1.0);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // Areas 100 each; inclusive intersection extent (9-5+1) squared = 25.
        let a = boxed(0.0, 0.0, 9.0, 9.0, 1.0);
        let b = boxed(5.0, 5.0, 14.0, 14.0, 1.0);
        let expected = 25.0 / (100.0 + 100.0 - 25.0);
        assert!((iou(&a, &b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_nms_suppresses_duplicate() {
        // IoU = 1.0 against threshold 0.7: only the higher-scoring box stays.
        let cands = [
            boxed(0.0, 0.0, 9.0, 9.0, 0.9),
            boxed(0.0, 0.0, 9.0, 9.0, 0.5),
        ];
        assert_eq!(nms(&cands, 0.7), vec![0]);
    }

    #[test]
    fn test_nms_keeps_low_overlap_pair() {
        let cands = [
            boxed(0.0, 0.0, 9.0, 9.0, 0.9),
            boxed(20.0, 20.0, 29.0, 29.0, 0.5),
        ];
        assert_eq!(nms(&cands, 0.7), vec![0, 1]);
    }

    #[test]
    fn test_nms_threshold_is_strict() {
        // Overlap exactly at the threshold is kept; suppression needs
        // strictly greater IoU.
        let a = boxed(0.0, 0.0, 9.0, 9.0, 0.9);
        let b = boxed(5.0, 5.0, 14.0, 14.0, 0.5);
        let overlap = iou(&a, &b);
        assert_eq!(nms(&[a, b], overlap), vec![0, 1]);
        assert_eq!(nms(&[a, b], overlap - 1e-6), vec![0]);
    }

    #[test]
    fn test_nms_chain_suppression() {
        // b overlaps a and is suppressed; c overlaps b but not a, so c
        // survives because suppression only compares against kept boxes.
        let a = boxed(0.0, 0.0, 9.0, 9.0, 0.9);
        let b = boxed(3.0, 0.0, 12.0, 9.0, 0.8);
        let c = boxed(6.0, 0.0, 15.0, 9.0, 0.7);
        assert!(iou(&a, &b) > 0.3);
        assert!(iou(&b, &c) > 0.3);
        assert!(iou(&a, &c) < 0.3);
        assert_eq!(nms(&[a, b, c], 0.3), vec![0, 2]);
    }
}
