// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Inference engine core: workspace, compute context, and operator contract.
//!
//! This crate wires the storage layer (`tensor-core`, `scratch-arena`) into a
//! runnable engine. The shape of a pass:
//!
//! ```text
//!   NetDef (JSON) ──▶ OpRegistry::create ──▶ Vec<Box<dyn Operator>>
//!                                                   │
//!   Network::forward ──▶ reset scratch ──▶ op.forward(&mut Workspace)
//!                                                   │
//!                              ┌────────────────────┼────────────────────┐
//!                              ▼                    ▼                    ▼
//!                       named tensors        scratch arena        Context (GEMM,
//!                       (Rc<RefCell>)       (grow + carve)        conv backend)
//! ```
//!
//! Operator crates depend on this one: they implement [`Operator`], register
//! constructors in an [`OpRegistry`], and optionally install a
//! [`ConvBackend`] into the context. The engine stays free of any concrete
//! operator so the dependency arrow points one way only.

pub mod config;
pub mod context;
pub mod conv;
pub mod error;
pub mod gemm;
pub mod net;
pub mod operator;
pub mod params;
pub mod registry;
pub mod workspace;

pub use config::EngineConfig;
pub use context::{Context, ContextConfig};
pub use conv::{deconv_out_size, BackwardDataPlan, BwdDataAlgo, ConvBackend, DeconvDesc};
pub use error::{EngineError, EngineResult};
pub use gemm::{create_gemm, FaerGemm, Gemm, NaiveGemm};
pub use net::{InputDecl, NetDef, Network};
pub use operator::{OpDesc, Operator};
pub use params::{ArgValue, OpParams};
pub use registry::{OpConstructor, OpRegistry};
pub use workspace::{TensorHandle, Workspace};
