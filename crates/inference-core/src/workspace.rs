// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Named tensor registry with a shared scratch arena.
//!
//! A [`Workspace`] is the blackboard a network runs on. Operators look up
//! their inputs by name, create their outputs by name, and carve per-pass
//! temporaries from the workspace's scratch arena. Handles are reference
//! counted with interior mutability, so an operator can hold its input and
//! output tensors simultaneously and still reach the arena in between.
//!
//! Creation is idempotent by design. Graphs are fixed at build time, so
//! re-running a pass re-creates every tensor by name; the registry hands
//! back the existing instance as long as dtype (and shape, when given) agree,
//! and nothing reallocates.
//!
//! # Examples
//! ```
//! use inference_core::Workspace;
//! use tensor_core::{DType, Shape};
//!
//! let mut ws = Workspace::new();
//! let data = ws
//!     .create_tensor("data", DType::F32, Some(&Shape::new(vec![1, 3, 8, 8])))
//!     .unwrap();
//! data.borrow_mut().fill_f32(1.0).unwrap();
//! assert!(ws.has_tensor("data"));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use scratch_arena::{ScratchArena, ScratchBudget};
use tensor_core::{DType, Shape, Tensor};

use crate::context::{Context, ContextConfig};
use crate::error::{EngineError, EngineResult};

/// Shared, interior-mutable handle to a registry tensor.
///
/// The engine is single-threaded per workspace; `RefCell` enforces the
/// borrow discipline at runtime while letting several operators hold the
/// same tensor across a pass.
pub type TensorHandle = Rc<RefCell<Tensor>>;

/// Registry of named tensors plus the scratch arena and compute context
/// they share.
#[derive(Default)]
pub struct Workspace {
    tensors: HashMap<String, TensorHandle>,
    arena: ScratchArena,
    ctx: Option<Context>,
}

impl Workspace {
    /// Creates a workspace with an unbounded scratch arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a workspace whose scratch arena refuses to grow past `budget`.
    pub fn with_scratch_limit(budget: ScratchBudget) -> Self {
        Workspace {
            tensors: HashMap::new(),
            arena: ScratchArena::with_limit(budget),
            ctx: None,
        }
    }

    // ── Tensor registry ─────────────────────────────────────────────────

    pub fn has_tensor(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    pub fn num_tensors(&self) -> usize {
        self.tensors.len()
    }

    /// Looks up a tensor by name.
    ///
    /// Returns `Ok(None)` (with a warning log) when the name is absent, so
    /// callers probing for optional inputs do not pay an error. A present
    /// entry with the wrong dtype is an error.
    pub fn tensor(&self, name: &str, dtype: DType) -> EngineResult<Option<TensorHandle>> {
        match self.tensors.get(name) {
            Some(handle) => {
                let held = handle.borrow().dtype();
                if held != dtype {
                    return Err(EngineError::TensorTypeMismatch {
                        name: name.to_string(),
                        held,
                        requested: dtype,
                    });
                }
                Ok(Some(Rc::clone(handle)))
            }
            None => {
                tracing::warn!(tensor = %name, "tensor not found in workspace");
                Ok(None)
            }
        }
    }

    /// Looks up a tensor that must exist.
    pub fn require_tensor(&self, name: &str, dtype: DType) -> EngineResult<TensorHandle> {
        match self.tensors.get(name) {
            Some(handle) => {
                let held = handle.borrow().dtype();
                if held != dtype {
                    return Err(EngineError::TensorTypeMismatch {
                        name: name.to_string(),
                        held,
                        requested: dtype,
                    });
                }
                Ok(Rc::clone(handle))
            }
            None => Err(EngineError::MissingTensor {
                name: name.to_string(),
            }),
        }
    }

    /// Creates a tensor, or returns the existing one registered under `name`.
    ///
    /// With `Some(shape)` the new tensor is owned and zero-filled. Re-creating
    /// an existing entry checks dtype, then shape: an unshaped entry adopts
    /// the requested shape, a matching shape is a no-op, and a conflicting
    /// shape is an error. With `None` an absent entry is created unshaped and
    /// an existing entry is returned as-is.
    pub fn create_tensor(
        &mut self,
        name: &str,
        dtype: DType,
        shape: Option<&Shape>,
    ) -> EngineResult<TensorHandle> {
        if let Some(handle) = self.tensors.get(name) {
            let handle = Rc::clone(handle);
            {
                let mut t = handle.borrow_mut();
                if t.dtype() != dtype {
                    return Err(EngineError::TensorTypeMismatch {
                        name: name.to_string(),
                        held: t.dtype(),
                        requested: dtype,
                    });
                }
                if let Some(shape) = shape {
                    if t.shape().is_empty() {
                        t.reshape(shape.clone())?;
                    } else if t.shape() != shape {
                        return Err(EngineError::ShapeConflict {
                            name: name.to_string(),
                            existing: t.shape().clone(),
                            requested: shape.clone(),
                        });
                    }
                }
            }
            return Ok(handle);
        }

        let tensor = match shape {
            Some(shape) => Tensor::zeros(name, dtype, shape.clone()),
            None => Tensor::empty(name, dtype),
        };
        tracing::trace!(tensor = %name, ?dtype, "tensor created");
        let handle = Rc::new(RefCell::new(tensor));
        self.tensors.insert(name.to_string(), Rc::clone(&handle));
        Ok(handle)
    }

    // ── Scratch tensors ─────────────────────────────────────────────────

    /// Creates (or rebinds) a tensor backed by a fresh arena window.
    ///
    /// The entry is cleared and bound to a newly carved window sized for
    /// `shape`, so repeated passes rebind the same registry entry to the
    /// current carve sequence. The caller must have reserved enough arena
    /// capacity via [`grow_scratch`](Workspace::grow_scratch) beforehand.
    pub fn create_scratch_tensor(
        &mut self,
        name: &str,
        dtype: DType,
        shape: &Shape,
    ) -> EngineResult<TensorHandle> {
        let count = shape.count();
        if count == 0 {
            return Err(EngineError::ZeroSizedScratchTensor {
                name: name.to_string(),
            });
        }
        let handle = self.create_tensor(name, dtype, None)?;
        let win = self.arena.carve(count, dtype.size_bytes())?;
        {
            let mut t = handle.borrow_mut();
            t.clear();
            t.attach_window(win, shape.clone())?;
        }
        Ok(handle)
    }

    /// Reserves scratch capacity for at least `count * elem_size` bytes and
    /// begins a new carve sequence.
    pub fn grow_scratch(&mut self, count: usize, elem_size: usize) -> EngineResult<()> {
        self.arena.grow(count, elem_size)?;
        Ok(())
    }

    /// Invalidates all scratch windows and rewinds the arena cursor.
    /// Capacity is retained. Called once per pass by the network runner.
    pub fn reset_scratch(&mut self) {
        self.arena.reset();
    }

    pub fn arena(&self) -> &ScratchArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ScratchArena {
        &mut self.arena
    }

    /// Borrows the arena mutably and the context immutably at once.
    ///
    /// The compute phase of an operator streams through scratch windows while
    /// dispatching GEMM and backend calls; splitting the borrow here lets both
    /// happen without re-entering the workspace.
    pub fn scratch_and_context(&mut self) -> EngineResult<(&mut ScratchArena, &Context)> {
        match &self.ctx {
            Some(ctx) => Ok((&mut self.arena, ctx)),
            None => Err(EngineError::MissingContext),
        }
    }

    // ── Compute context ─────────────────────────────────────────────────

    /// Creates the compute context, or returns the existing one when it
    /// already targets the requested device.
    pub fn create_context(&mut self, config: &ContextConfig) -> EngineResult<&Context> {
        let rebuild = match &self.ctx {
            Some(ctx) => ctx.device_id() != config.device_id,
            None => true,
        };
        if rebuild {
            self.ctx = Some(Context::new(config)?);
        }
        Ok(self.ctx.as_ref().unwrap())
    }

    pub fn context(&self) -> EngineResult<&Context> {
        self.ctx.as_ref().ok_or(EngineError::MissingContext)
    }

    pub fn context_mut(&mut self) -> EngineResult<&mut Context> {
        self.ctx.as_mut().ok_or(EngineError::MissingContext)
    }

    // ── Diagnostics ─────────────────────────────────────────────────────

    /// Total bytes held by owned tensor storage.
    pub fn size_bytes(&self) -> usize {
        self.tensors
            .values()
            .map(|t| t.borrow().owned_size_bytes())
            .sum()
    }

    /// Capacity of the scratch arena in bytes.
    pub fn scratch_size_bytes(&self) -> usize {
        self.arena.capacity_bytes()
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "workspace: {} tensors ({} bytes owned), scratch {} bytes capacity / {} bytes used",
            self.tensors.len(),
            self.size_bytes(),
            self.arena.capacity_bytes(),
            self.arena.used_bytes()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(dims: &[usize]) -> Shape {
        Shape::new(dims.to_vec())
    }

    #[test]
    fn test_create_then_lookup() {
        let mut ws = Workspace::new();
        ws.create_tensor("data", DType::F32, Some(&shape(&[2, 3])))
            .unwrap();
        assert!(ws.has_tensor("data"));
        let handle = ws.require_tensor("data", DType::F32).unwrap();
        assert_eq!(handle.borrow().count(), 6);
    }

    #[test]
    fn test_lookup_absent_is_soft() {
        let ws = Workspace::new();
        assert!(ws.tensor("ghost", DType::F32).unwrap().is_none());
        assert!(matches!(
            ws.require_tensor("ghost", DType::F32),
            Err(EngineError::MissingTensor { .. })
        ));
    }

    #[test]
    fn test_lookup_wrong_dtype_is_hard() {
        let mut ws = Workspace::new();
        ws.create_tensor("data", DType::F32, Some(&shape(&[4])))
            .unwrap();
        assert!(matches!(
            ws.tensor("data", DType::I32),
            Err(EngineError::TensorTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_create_is_idempotent() {
        let mut ws = Workspace::new();
        let first = ws
            .create_tensor("data", DType::F32, Some(&shape(&[2, 3])))
            .unwrap();
        first.borrow_mut().set_f32(&[1., 2., 3., 4., 5., 6.]).unwrap();

        // Same name, same dtype, same shape: same instance, data intact.
        let second = ws
            .create_tensor("data", DType::F32, Some(&shape(&[2, 3])))
            .unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(second.borrow().as_f32().unwrap()[3], 4.0);
    }

    #[test]
    fn test_create_shape_conflict() {
        let mut ws = Workspace::new();
        ws.create_tensor("data", DType::F32, Some(&shape(&[2, 3])))
            .unwrap();
        assert!(matches!(
            ws.create_tensor("data", DType::F32, Some(&shape(&[6]))),
            Err(EngineError::ShapeConflict { .. })
        ));
    }

    #[test]
    fn test_create_adopts_shape_onto_unshaped_entry() {
        let mut ws = Workspace::new();
        ws.create_tensor("out", DType::F32, None).unwrap();
        let handle = ws
            .create_tensor("out", DType::F32, Some(&shape(&[3, 5])))
            .unwrap();
        assert_eq!(handle.borrow().count(), 15);
    }

    #[test]
    fn test_create_dtype_conflict() {
        let mut ws = Workspace::new();
        ws.create_tensor("mask", DType::U8, Some(&shape(&[8])))
            .unwrap();
        assert!(matches!(
            ws.create_tensor("mask", DType::F32, Some(&shape(&[8]))),
            Err(EngineError::TensorTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_scratch_tensor_binds_window() {
        let mut ws = Workspace::new();
        ws.grow_scratch(32, 4).unwrap();
        let col = ws
            .create_scratch_tensor("col", DType::F32, &shape(&[4, 8]))
            .unwrap();
        assert!(col.borrow().is_window());
        assert_eq!(col.borrow().count(), 32);

        // Windows resolve through the arena.
        let win = col.borrow().window().unwrap();
        ws.arena_mut().f32_slice_mut(&win).unwrap().fill(2.0);
        assert_eq!(ws.arena().f32_slice(&win).unwrap()[31], 2.0);
    }

    #[test]
    fn test_scratch_tensor_rebinds_across_passes() {
        let mut ws = Workspace::new();
        ws.grow_scratch(16, 4).unwrap();
        let first = ws
            .create_scratch_tensor("col", DType::F32, &shape(&[16]))
            .unwrap();
        let win_a = first.borrow().window().unwrap();

        ws.reset_scratch();
        ws.grow_scratch(16, 4).unwrap();
        let second = ws
            .create_scratch_tensor("col", DType::F32, &shape(&[16]))
            .unwrap();
        let win_b = second.borrow().window().unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_ne!(win_a.generation(), win_b.generation());
        // The stale window no longer resolves.
        assert!(ws.arena().f32_slice(&win_a).is_err());
        assert!(ws.arena().f32_slice(&win_b).is_ok());
    }

    #[test]
    fn test_scratch_tensor_rejects_zero_elements() {
        let mut ws = Workspace::new();
        ws.grow_scratch(4, 4).unwrap();
        assert!(matches!(
            ws.create_scratch_tensor("z", DType::F32, &Shape::empty()),
            Err(EngineError::ZeroSizedScratchTensor { .. })
        ));
    }

    #[test]
    fn test_scratch_limit_enforced() {
        let mut ws = Workspace::with_scratch_limit(ScratchBudget::from_bytes(64));
        assert!(ws.grow_scratch(16, 4).is_ok());
        assert!(ws.grow_scratch(17, 4).is_err());
    }

    #[test]
    fn test_context_lifecycle() {
        let mut ws = Workspace::new();
        assert!(matches!(ws.context(), Err(EngineError::MissingContext)));

        let config = ContextConfig {
            device_id: 0,
            gemm_backend: "naive".to_string(),
        };
        ws.create_context(&config).unwrap();
        assert_eq!(ws.context().unwrap().device_id(), 0);

        // Same device: kept. Different device: rebuilt.
        ws.create_context(&config).unwrap();
        let other = ContextConfig {
            device_id: 2,
            gemm_backend: "naive".to_string(),
        };
        assert_eq!(ws.create_context(&other).unwrap().device_id(), 2);
    }

    #[test]
    fn test_size_accounting() {
        let mut ws = Workspace::new();
        ws.create_tensor("a", DType::F32, Some(&shape(&[10])))
            .unwrap();
        ws.create_tensor("b", DType::U8, Some(&shape(&[3])))
            .unwrap();
        assert_eq!(ws.size_bytes(), 43);

        ws.grow_scratch(100, 4).unwrap();
        assert!(ws.scratch_size_bytes() >= 400);
        // Scratch tensors do not count as owned bytes.
        ws.create_scratch_tensor("tmp", DType::F32, &shape(&[100]))
            .unwrap();
        assert_eq!(ws.size_bytes(), 43);
    }
}
