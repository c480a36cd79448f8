//! Svalin Transpiler
//!
//! A multi-stage compilation pipeline that rewrites quantum circuits
//! for hardware targets: layout selection, swap routing against a
//! coupling graph, basis translation, gate optimization, and
//! duration-aware scheduling.
//!
//! The public surface is [`transpile`] / [`transpile_batch`] driven by
//! [`TranspileOptions`]; the pieces underneath (passes, the pass
//! manager, presets) are exported for callers that assemble their own
//! pipelines.
//!
//! # Example
//!
//! ```rust
//! use svalin_ir::Circuit;
//! use svalin_transpile::{
//!     transpile, CouplingMap, CouplingSpec, TranspileOptions,
//! };
//!
//! let circuit = Circuit::ghz(4).unwrap();
//! let options = TranspileOptions {
//!     basis_gates: Some(vec!["rz".into(), "sx".into(), "x".into(), "cx".into()]),
//!     coupling_map: Some(CouplingSpec::Explicit(CouplingMap::linear(4))),
//!     optimization_level: Some(2),
//!     seed: Some(42),
//!     ..Default::default()
//! };
//! let compiled = transpile(circuit, &options).unwrap();
//! assert!(compiled.num_ops() > 0);
//! ```

pub mod config;
pub mod coupling;
pub mod dispatch;
pub mod durations;
pub mod error;
pub mod layout;
pub mod manager;
pub mod pass;
pub mod passes;
pub mod preset;
pub mod property;
pub mod resolver;
pub mod target;
mod transpile;

pub use config::{
    CircuitConfig, CouplingSpec, DurationsSpec, LayoutSpec, OutputName, SharedConfig,
    TranspileOptions,
};
pub use coupling::CouplingMap;
pub use dispatch::{DispatchContext, Parallelism};
pub use durations::InstructionDurations;
pub use error::{TranspileError, TranspileResult};
pub use layout::Layout;
pub use manager::{PassCallback, PassEvent, PassManager, Stage};
pub use pass::{Pass, PassKind};
pub use preset::{preset_pass_manager, PassManagerConfig};
pub use property::PropertySet;
pub use resolver::resolve;
pub use target::{Target, TargetView, TimingConstraints};
pub use transpile::{transpile, transpile_batch, transpile_batch_with};
