// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type with owned or arena-backed storage.

use crate::{DType, Shape, TensorError};
use scratch_arena::ScratchWindow;

/// Where a tensor's elements live.
///
/// Owned variants are typed buffers sized exactly to the shape. The window
/// variant is a non-owning descriptor into the workspace's scratch arena;
/// its bytes are resolved through the arena, never through the tensor.
#[derive(Debug, Clone)]
enum Storage {
    F32(Vec<f32>),
    I32(Vec<i32>),
    U8(Vec<u8>),
    Window(ScratchWindow),
}

fn empty_storage(dtype: DType) -> Storage {
    match dtype {
        DType::F32 => Storage::F32(Vec::new()),
        DType::I32 => Storage::I32(Vec::new()),
        DType::U8 => Storage::U8(Vec::new()),
    }
}

/// A named, type-tagged, shape-aware array container.
///
/// `Tensor` is the unit the workspace registry manages. The element type is
/// fixed at construction for the tensor's whole lifetime; shape and storage
/// change through [`reshape`](Tensor::reshape), [`attach_window`](Tensor::attach_window),
/// and [`clear`](Tensor::clear). Persistent tensors own their buffers;
/// scratch tensors are bound to arena windows valid only within the carve
/// sequence that produced them.
///
/// # Examples
/// ```
/// use tensor_core::{DType, Shape, Tensor};
///
/// let mut t = Tensor::zeros("data", DType::F32, Shape::new(vec![2, 3]));
/// t.set_f32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(t.as_f32().unwrap()[4], 5.0);
/// ```
#[derive(Debug, Clone)]
pub struct Tensor {
    name: String,
    dtype: DType,
    shape: Shape,
    storage: Storage,
}

impl Tensor {
    /// Creates an unsized tensor; a later reshape or window bind gives it storage.
    pub fn empty(name: impl Into<String>, dtype: DType) -> Self {
        Self {
            name: name.into(),
            dtype,
            shape: Shape::empty(),
            storage: empty_storage(dtype),
        }
    }

    /// Creates an owned, zero-filled tensor of the given shape.
    pub fn zeros(name: impl Into<String>, dtype: DType, shape: Shape) -> Self {
        let mut t = Self::empty(name, dtype);
        // reshape on owned storage cannot fail
        let _ = t.reshape(shape);
        t
    }

    /// Creates an owned f32 tensor initialized from `values`.
    pub fn from_f32(
        name: impl Into<String>,
        shape: Shape,
        values: &[f32],
    ) -> Result<Self, TensorError> {
        let mut t = Self::zeros(name, DType::F32, shape);
        t.set_f32(values)?;
        Ok(t)
    }

    /// Returns the tensor's registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tensor's element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the total element count.
    pub fn count(&self) -> usize {
        self.shape.count()
    }

    /// Returns the byte footprint implied by shape and dtype.
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes(self.dtype)
    }

    /// Bytes held in owned storage; window-backed tensors report 0.
    pub fn owned_size_bytes(&self) -> usize {
        match &self.storage {
            Storage::F32(v) => v.len() * 4,
            Storage::I32(v) => v.len() * 4,
            Storage::U8(v) => v.len(),
            Storage::Window(_) => 0,
        }
    }

    /// Resizes the tensor.
    ///
    /// Owned storage reallocates only when the element count changes (the new
    /// region is zero-filled); an equal-count reshape updates metadata and
    /// keeps the data. Window-backed tensors accept only shapes with the same
    /// byte footprint as their window.
    pub fn reshape(&mut self, shape: Shape) -> Result<(), TensorError> {
        if let Storage::Window(win) = &self.storage {
            let shape_bytes = shape.size_bytes(self.dtype);
            if shape_bytes != win.len_bytes() {
                return Err(TensorError::WindowSizeMismatch {
                    name: self.name.clone(),
                    window_bytes: win.len_bytes(),
                    shape_bytes,
                });
            }
            self.shape = shape;
            return Ok(());
        }
        let count = shape.count();
        match &mut self.storage {
            Storage::F32(v) => v.resize(count, 0.0),
            Storage::I32(v) => v.resize(count, 0),
            Storage::U8(v) => v.resize(count, 0),
            Storage::Window(_) => unreachable!("window storage handled above"),
        }
        self.shape = shape;
        Ok(())
    }

    /// Bulk copy-in of f32 values; `values.len()` must equal [`count`](Tensor::count).
    pub fn set_f32(&mut self, values: &[f32]) -> Result<(), TensorError> {
        self.check_dtype(DType::F32)?;
        let expected = self.count();
        if values.len() != expected {
            return Err(TensorError::CountMismatch {
                name: self.name.clone(),
                expected,
                actual: values.len(),
            });
        }
        match &mut self.storage {
            Storage::F32(v) => {
                v.copy_from_slice(values);
                Ok(())
            }
            Storage::Window(_) => Err(TensorError::WindowBacked {
                name: self.name.clone(),
            }),
            _ => unreachable!("dtype checked above"),
        }
    }

    /// Shared access to owned f32 elements.
    pub fn as_f32(&self) -> Result<&[f32], TensorError> {
        self.check_dtype(DType::F32)?;
        self.check_initialized()?;
        match &self.storage {
            Storage::F32(v) => Ok(v),
            Storage::Window(_) => Err(TensorError::WindowBacked {
                name: self.name.clone(),
            }),
            _ => unreachable!("dtype checked above"),
        }
    }

    /// Mutable access to owned f32 elements.
    pub fn as_f32_mut(&mut self) -> Result<&mut [f32], TensorError> {
        self.check_dtype(DType::F32)?;
        self.check_initialized()?;
        match &mut self.storage {
            Storage::F32(v) => Ok(v),
            Storage::Window(_) => Err(TensorError::WindowBacked {
                name: self.name.clone(),
            }),
            _ => unreachable!("dtype checked above"),
        }
    }

    /// Shared access to owned i32 elements.
    pub fn as_i32(&self) -> Result<&[i32], TensorError> {
        self.check_dtype(DType::I32)?;
        self.check_initialized()?;
        match &self.storage {
            Storage::I32(v) => Ok(v),
            Storage::Window(_) => Err(TensorError::WindowBacked {
                name: self.name.clone(),
            }),
            _ => unreachable!("dtype checked above"),
        }
    }

    /// Shared access to owned byte elements.
    pub fn as_u8(&self) -> Result<&[u8], TensorError> {
        self.check_dtype(DType::U8)?;
        self.check_initialized()?;
        match &self.storage {
            Storage::U8(v) => Ok(v),
            Storage::Window(_) => Err(TensorError::WindowBacked {
                name: self.name.clone(),
            }),
            _ => unreachable!("dtype checked above"),
        }
    }

    /// Fills owned f32 storage with a constant.
    pub fn fill_f32(&mut self, value: f32) -> Result<(), TensorError> {
        self.as_f32_mut()?.fill(value);
        Ok(())
    }

    /// Binds this tensor as a non-owning view over a scratch window.
    ///
    /// Used exclusively by the workspace when carving scratch tensors; any
    /// owned storage is dropped. The window must hold exactly
    /// `shape.size_bytes(dtype)` bytes.
    pub fn attach_window(&mut self, win: ScratchWindow, shape: Shape) -> Result<(), TensorError> {
        let shape_bytes = shape.size_bytes(self.dtype);
        if win.len_bytes() != shape_bytes {
            return Err(TensorError::WindowSizeMismatch {
                name: self.name.clone(),
                window_bytes: win.len_bytes(),
                shape_bytes,
            });
        }
        self.storage = Storage::Window(win);
        self.shape = shape;
        Ok(())
    }

    /// The scratch window backing this tensor, if it is window-backed.
    pub fn window(&self) -> Option<ScratchWindow> {
        match &self.storage {
            Storage::Window(win) => Some(*win),
            _ => None,
        }
    }

    /// Whether this tensor is a non-owning view into the scratch arena.
    pub fn is_window(&self) -> bool {
        matches!(self.storage, Storage::Window(_))
    }

    /// Releases owned storage (or detaches the window) and resets the shape
    /// to empty. The element type is retained.
    pub fn clear(&mut self) {
        self.storage = empty_storage(self.dtype);
        self.shape = Shape::empty();
    }

    fn check_dtype(&self, requested: DType) -> Result<(), TensorError> {
        if self.dtype != requested {
            return Err(TensorError::DTypeMismatch {
                name: self.name.clone(),
                held: self.dtype,
                requested,
            });
        }
        Ok(())
    }

    fn check_initialized(&self) -> Result<(), TensorError> {
        if self.shape.count() == 0 {
            return Err(TensorError::Uninitialized {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}
