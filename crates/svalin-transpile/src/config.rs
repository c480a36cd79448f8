//! User-facing transpilation options and resolved configurations.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use svalin_ir::{QubitId, TimeUnit};

use crate::coupling::CouplingMap;
use crate::durations::InstructionDurations;
use crate::layout::Layout;
use crate::manager::PassCallback;
use crate::target::{Target, TargetView, TimingConstraints};

/// Connectivity constraint argument.
#[derive(Debug, Clone)]
pub enum CouplingSpec {
    /// A prebuilt coupling map.
    Explicit(CouplingMap),
    /// Directed edge pairs; the map is built during resolution.
    Edges(Vec<(u32, u32)>),
}

/// Initial layout argument.
#[derive(Debug, Clone)]
pub enum LayoutSpec {
    /// A prebuilt layout.
    Layout(Layout),
    /// Entry i is the physical qubit of virtual qubit i.
    PhysicalList(Vec<u32>),
    /// Explicit virtual-to-physical pairs.
    VirtualMap(Vec<(QubitId, u32)>),
}

/// Instruction duration argument.
#[derive(Debug, Clone)]
pub enum DurationsSpec {
    /// A prebuilt table.
    Table(InstructionDurations),
    /// `(name, qubits, duration, unit)` tuples; a missing unit means
    /// `dt`.
    Tuples(Vec<(String, Vec<u32>, f64, Option<TimeUnit>)>),
}

/// Output circuit naming argument.
#[derive(Debug, Clone)]
pub enum OutputName {
    /// Name for a single-circuit call.
    Single(String),
    /// One name per input circuit, in order.
    PerCircuit(Vec<String>),
}

/// Everything a caller can hand to [`transpile`](crate::transpile).
///
/// All fields default to "unset"; unset fields fall back to the target,
/// then to the backend, in that order.
#[derive(Default)]
pub struct TranspileOptions {
    /// Backend whose capability view supplies unset constraints.
    pub backend: Option<Arc<dyn TargetView>>,
    /// Explicit target; overrides the backend view.
    pub target: Option<Target>,
    /// Native gate names.
    pub basis_gates: Option<Vec<String>>,
    /// Device connectivity.
    pub coupling_map: Option<CouplingSpec>,
    /// Starting virtual-to-physical assignment.
    pub initial_layout: Option<LayoutSpec>,
    /// Layout stage method name.
    pub layout_method: Option<String>,
    /// Routing stage method name.
    pub routing_method: Option<String>,
    /// Translation stage method name.
    pub translation_method: Option<String>,
    /// Scheduling stage method name; unset disables scheduling.
    pub scheduling_method: Option<String>,
    /// Instruction durations, overriding the target's table.
    pub instruction_durations: Option<DurationsSpec>,
    /// Sample time in seconds.
    pub dt: Option<f64>,
    /// Fidelity/gate-count tradeoff in `[0, 1]`; 1.0 is exact.
    pub approximation_degree: Option<f64>,
    /// Hardware alignment constraints.
    pub timing_constraints: Option<TimingConstraints>,
    /// Seed for all stochastic passes.
    pub seed: Option<u64>,
    /// Preset level 0-3; defaults to 1.
    pub optimization_level: Option<u8>,
    /// Observer invoked after every executed pass.
    pub callback: Option<Arc<PassCallback>>,
    /// Output circuit naming.
    pub output_name: Option<OutputName>,
    /// Unitary synthesis plugin name, carried to the translation stage.
    pub unitary_synthesis_method: Option<String>,
    /// Opaque plugin configuration.
    pub unitary_synthesis_plugin_config: Option<serde_json::Value>,
    /// High-level synthesis configuration.
    pub hls_config: Option<serde_json::Value>,
    /// Init stage method override.
    pub init_method: Option<String>,
    /// Optimization stage method override.
    pub optimization_method: Option<String>,
    /// Ignore method defaults a backend advertises.
    pub ignore_backend_default_methods: bool,
}

/// Configuration identical for every circuit of a batch.
///
/// Built once by the resolver, wrapped in an `Arc`, and read by every
/// worker.
#[derive(Debug, Clone, Serialize)]
pub struct SharedConfig {
    /// Preset level in 0-3.
    pub optimization_level: u8,
    /// Resolved basis gate names.
    pub basis_gates: Vec<String>,
    /// Resolved seed; 0 when the caller gave none.
    pub seed: u64,
    /// Init stage method override.
    pub init_method: Option<String>,
    /// Optimization stage method override.
    pub optimization_method: Option<String>,
}

/// Per-circuit slice of the resolved configuration.
#[derive(Clone)]
pub struct CircuitConfig {
    /// Device connectivity for this circuit.
    pub coupling_map: Option<CouplingMap>,
    /// Validated initial layout, if the caller chose one.
    pub initial_layout: Option<Layout>,
    /// Merged duration table.
    pub durations: Option<InstructionDurations>,
    /// Alignment constraints.
    pub timing_constraints: TimingConstraints,
    /// Name to give the output circuit.
    pub output_name: Option<String>,
    /// Fidelity/gate-count tradeoff.
    pub approximation_degree: Option<f64>,
    /// Layout method name.
    pub layout_method: Option<String>,
    /// Routing method name.
    pub routing_method: Option<String>,
    /// Translation method name.
    pub translation_method: Option<String>,
    /// Scheduling method name.
    pub scheduling_method: Option<String>,
    /// Observer for this circuit's pipeline run.
    pub callback: Option<Arc<PassCallback>>,
}

impl fmt::Debug for CircuitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitConfig")
            .field("coupling_map", &self.coupling_map)
            .field("initial_layout", &self.initial_layout)
            .field("durations", &self.durations)
            .field("timing_constraints", &self.timing_constraints)
            .field("output_name", &self.output_name)
            .field("approximation_degree", &self.approximation_degree)
            .field("layout_method", &self.layout_method)
            .field("routing_method", &self.routing_method)
            .field("translation_method", &self.translation_method)
            .field("scheduling_method", &self.scheduling_method)
            .field("callback", &self.callback.as_ref().map(|_| ".."))
            .finish()
    }
}
