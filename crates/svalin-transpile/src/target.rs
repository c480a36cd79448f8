//! Hardware target description.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::coupling::CouplingMap;
use crate::durations::InstructionDurations;

/// Hardware timing granularity constraints.
///
/// All values are in `dt` units. The defaults (all 1) describe a device
/// with no alignment requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConstraints {
    /// Instruction durations must be a multiple of this.
    pub granularity: u32,
    /// Minimum instruction duration.
    pub min_length: u32,
    /// Gate start times must be a multiple of this.
    pub pulse_alignment: u32,
    /// Measurement start times must be a multiple of this.
    pub acquire_alignment: u32,
}

impl Default for TimingConstraints {
    fn default() -> Self {
        Self {
            granularity: 1,
            min_length: 1,
            pulse_alignment: 1,
            acquire_alignment: 1,
        }
    }
}

/// Read-only capability view of a compilation target.
///
/// Backends and locally built [`Target`] values expose the same
/// interface, so the pipeline never cares where its constraints came
/// from.
pub trait TargetView: Send + Sync {
    /// Number of physical qubits.
    fn num_qubits(&self) -> u32;

    /// Native gate names.
    fn basis_gates(&self) -> &[String];

    /// Device connectivity, if constrained.
    fn coupling_map(&self) -> Option<&CouplingMap>;

    /// Instruction duration table, if known.
    fn durations(&self) -> Option<&InstructionDurations>;

    /// Sample time in seconds, if known.
    fn dt(&self) -> Option<f64>;

    /// Timing alignment constraints.
    fn timing_constraints(&self) -> TimingConstraints {
        TimingConstraints::default()
    }

    /// Names of instructions with pulse-level calibrations.
    fn calibrated_instructions(&self) -> &FxHashSet<String>;
}

/// A concrete compilation target assembled from explicit constraints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Target {
    num_qubits: u32,
    basis_gates: Vec<String>,
    coupling_map: Option<CouplingMap>,
    durations: Option<InstructionDurations>,
    dt: Option<f64>,
    timing_constraints: TimingConstraints,
    calibrated: FxHashSet<String>,
}

impl Target {
    /// Start building a target with the given qubit count.
    pub fn builder(num_qubits: u32) -> TargetBuilder {
        TargetBuilder {
            target: Target {
                num_qubits,
                ..Target::default()
            },
        }
    }
}

impl TargetView for Target {
    fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    fn basis_gates(&self) -> &[String] {
        &self.basis_gates
    }

    fn coupling_map(&self) -> Option<&CouplingMap> {
        self.coupling_map.as_ref()
    }

    fn durations(&self) -> Option<&InstructionDurations> {
        self.durations.as_ref()
    }

    fn dt(&self) -> Option<f64> {
        self.dt
    }

    fn timing_constraints(&self) -> TimingConstraints {
        self.timing_constraints
    }

    fn calibrated_instructions(&self) -> &FxHashSet<String> {
        &self.calibrated
    }
}

/// Builder for [`Target`].
#[derive(Debug, Clone)]
pub struct TargetBuilder {
    target: Target,
}

impl TargetBuilder {
    /// Set the native gate names.
    pub fn basis_gates(mut self, gates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.target.basis_gates = gates.into_iter().map(Into::into).collect();
        self
    }

    /// Set the coupling map.
    pub fn coupling_map(mut self, map: CouplingMap) -> Self {
        self.target.coupling_map = Some(map);
        self
    }

    /// Set the instruction duration table.
    pub fn durations(mut self, durations: InstructionDurations) -> Self {
        self.target.durations = Some(durations);
        self
    }

    /// Set the sample time in seconds.
    pub fn dt(mut self, dt: f64) -> Self {
        self.target.dt = Some(dt);
        self
    }

    /// Set the timing constraints.
    pub fn timing_constraints(mut self, constraints: TimingConstraints) -> Self {
        self.target.timing_constraints = constraints;
        self
    }

    /// Mark an instruction name as having a pulse calibration.
    pub fn calibrated(mut self, name: impl Into<String>) -> Self {
        self.target.calibrated.insert(name.into());
        self
    }

    /// Finish building.
    pub fn build(self) -> Target {
        self.target
    }
}
