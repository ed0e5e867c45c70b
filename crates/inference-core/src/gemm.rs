// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pluggable matrix-multiply strategies.
//!
//! Every compute-heavy operator lowers to `C = alpha * op(A) * op(B) + beta * C`
//! over row-major `f32` slices, so the whole engine is tuned by swapping the
//! [`Gemm`] implementation carried by the compute context. Two strategies are
//! provided:
//!
//! - [`NaiveGemm`]: straightforward triple loop, used as the reference
//!   implementation and for tiny problem sizes in tests.
//! - [`FaerGemm`]: delegates to the `faer` matmul kernels.
//!
//! Strategies are selected by name through [`create_gemm`].

use faer::linalg::matmul::matmul;
use faer::mat::{MatMut, MatRef};
use faer::{Accum, Par};

use crate::error::{EngineError, EngineResult};

/// A dense single-precision matrix multiply.
///
/// Computes `C = alpha * op(A) * op(B) + beta * C` where `op(X)` is `X` or
/// its transpose, all matrices row-major. `op(A)` is `m x k`, `op(B)` is
/// `k x n` and `C` is `m x n`. When `beta` is zero, `C` is treated as
/// write-only and its prior contents (including NaN) are ignored.
///
/// Callers must supply slices of at least `m * k`, `k * n` and `m * n`
/// elements; operators derive these sizes from validated tensor shapes.
pub trait Gemm {
    /// Short identifier used in logs and configuration files.
    fn name(&self) -> &'static str;

    #[allow(clippy::too_many_arguments)]
    fn gemm(
        &self,
        trans_a: bool,
        trans_b: bool,
        m: usize,
        n: usize,
        k: usize,
        alpha: f32,
        a: &[f32],
        b: &[f32],
        beta: f32,
        c: &mut [f32],
    );
}

/// Creates a GEMM strategy from its configured name.
pub fn create_gemm(name: &str) -> EngineResult<Box<dyn Gemm>> {
    match name.to_lowercase().as_str() {
        "naive" | "reference" => Ok(Box::new(NaiveGemm)),
        "faer" | "optimized" => Ok(Box::new(FaerGemm)),
        other => Err(EngineError::UnknownBackend {
            name: other.to_string(),
        }),
    }
}

// ── Naive strategy ──────────────────────────────────────────────────────────

/// Triple-loop reference GEMM.
pub struct NaiveGemm;

impl Gemm for NaiveGemm {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn gemm(
        &self,
        trans_a: bool,
        trans_b: bool,
        m: usize,
        n: usize,
        k: usize,
        alpha: f32,
        a: &[f32],
        b: &[f32],
        beta: f32,
        c: &mut [f32],
    ) {
        debug_assert!(a.len() >= m * k, "lhs slice too short");
        debug_assert!(b.len() >= k * n, "rhs slice too short");
        debug_assert!(c.len() >= m * n, "output slice too short");

        let c = &mut c[..m * n];
        if beta == 0.0 {
            c.fill(0.0);
        } else if beta != 1.0 {
            for v in c.iter_mut() {
                *v *= beta;
            }
        }

        match (trans_a, trans_b) {
            (false, false) => {
                for i in 0..m {
                    for p in 0..k {
                        let aip = alpha * a[i * k + p];
                        for j in 0..n {
                            c[i * n + j] += aip * b[p * n + j];
                        }
                    }
                }
            }
            (true, false) => {
                // A is stored k x m.
                for p in 0..k {
                    for i in 0..m {
                        let api = alpha * a[p * m + i];
                        for j in 0..n {
                            c[i * n + j] += api * b[p * n + j];
                        }
                    }
                }
            }
            (false, true) => {
                // B is stored n x k.
                for i in 0..m {
                    for j in 0..n {
                        let mut sum = 0.0;
                        for p in 0..k {
                            sum += a[i * k + p] * b[j * k + p];
                        }
                        c[i * n + j] += alpha * sum;
                    }
                }
            }
            (true, true) => {
                for i in 0..m {
                    for j in 0..n {
                        let mut sum = 0.0;
                        for p in 0..k {
                            sum += a[p * m + i] * b[j * k + p];
                        }
                        c[i * n + j] += alpha * sum;
                    }
                }
            }
        }
    }
}

// ── Faer strategy ───────────────────────────────────────────────────────────

/// GEMM backed by the `faer` matmul kernels.
pub struct FaerGemm;

fn faer_parallelism() -> Par {
    let par = faer::get_global_parallelism();
    if par.degree() == 1 {
        Par::Seq
    } else {
        par
    }
}

impl Gemm for FaerGemm {
    fn name(&self) -> &'static str {
        "faer"
    }

    fn gemm(
        &self,
        trans_a: bool,
        trans_b: bool,
        m: usize,
        n: usize,
        k: usize,
        alpha: f32,
        a: &[f32],
        b: &[f32],
        beta: f32,
        c: &mut [f32],
    ) {
        // faer prefers column-major output, so compute C^T = op(B)^T * op(A)^T
        // into a column-major (n x m) view of C. The underlying buffer layout
        // matches row-major (m x n), so no output copy is needed.
        let op_a_t = if trans_a {
            MatRef::from_row_major_slice(&a[..k * m], k, m)
        } else {
            MatRef::from_row_major_slice(&a[..m * k], m, k).transpose()
        };
        let op_b_t = if trans_b {
            MatRef::from_row_major_slice(&b[..n * k], n, k)
        } else {
            MatRef::from_row_major_slice(&b[..k * n], k, n).transpose()
        };

        let c = &mut c[..m * n];
        let accum = if beta == 0.0 {
            Accum::Replace
        } else {
            if beta != 1.0 {
                for v in c.iter_mut() {
                    *v *= beta;
                }
            }
            Accum::Add
        };

        let mut out_view = MatMut::from_column_major_slice_mut(c, n, m);
        matmul(&mut out_view, accum, op_b_t, op_a_t, alpha, faer_parallelism());
    }
}
