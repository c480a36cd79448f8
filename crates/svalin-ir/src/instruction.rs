//! Circuit instructions combining operations with operands.

use serde::{Deserialize, Serialize};

use crate::gate::StandardGate;
use crate::qubit::{ClbitId, QubitId};

/// Time unit for durations and delays.
///
/// `Dt` is the device sample-time unit (an abstract integer step);
/// `Seconds` is physical time. The two domains can only be mixed when a
/// `dt` conversion factor is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Device sample-time steps.
    #[default]
    Dt,
    /// Physical seconds.
    Seconds,
}

/// The kind of operation an instruction performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A quantum gate operation.
    Gate(StandardGate),
    /// Measurement into a classical bit.
    Measure,
    /// Reset a qubit to |0>.
    Reset,
    /// Barrier (synchronization point).
    Barrier,
    /// Idle a qubit for a fixed duration.
    Delay {
        /// Duration value.
        duration: f64,
        /// Unit of the duration.
        unit: TimeUnit,
    },
}

/// A complete instruction with operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubit operands, in order.
    pub qubits: Vec<QubitId>,
    /// Classical operands (for measure).
    pub clbits: Vec<ClbitId>,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn gate(gate: StandardGate, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Gate(gate),
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Create a single-qubit gate instruction.
    pub fn single_qubit_gate(gate: StandardGate, qubit: QubitId) -> Self {
        Self::gate(gate, [qubit])
    }

    /// Create a two-qubit gate instruction.
    pub fn two_qubit_gate(gate: StandardGate, q1: QubitId, q2: QubitId) -> Self {
        Self::gate(gate, [q1, q2])
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    /// Create a reset instruction.
    pub fn reset(qubit: QubitId) -> Self {
        Self {
            kind: InstructionKind::Reset,
            qubits: vec![qubit],
            clbits: vec![],
        }
    }

    /// Create a barrier instruction.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Barrier,
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Create a delay instruction.
    pub fn delay(qubit: QubitId, duration: f64, unit: TimeUnit) -> Self {
        Self {
            kind: InstructionKind::Delay { duration, unit },
            qubits: vec![qubit],
            clbits: vec![],
        }
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    /// Check if this is a barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, InstructionKind::Barrier)
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&StandardGate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Check if this is a two-qubit gate.
    pub fn is_two_qubit_gate(&self) -> bool {
        self.as_gate().is_some_and(|g| g.num_qubits() == 2)
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &'static str {
        match &self.kind {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure => "measure",
            InstructionKind::Reset => "reset",
            InstructionKind::Barrier => "barrier",
            InstructionKind::Delay { .. } => "delay",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_instruction() {
        let inst = Instruction::single_qubit_gate(StandardGate::H, QubitId(0));
        assert!(inst.is_gate());
        assert_eq!(inst.name(), "h");
        assert_eq!(inst.qubits.len(), 1);
    }

    #[test]
    fn test_measure_instruction() {
        let inst = Instruction::measure(QubitId(1), ClbitId(0));
        assert!(inst.is_measure());
        assert_eq!(inst.clbits, vec![ClbitId(0)]);
    }

    #[test]
    fn test_two_qubit_predicate() {
        assert!(Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1))
            .is_two_qubit_gate());
        assert!(!Instruction::single_qubit_gate(StandardGate::X, QubitId(0)).is_two_qubit_gate());
        assert!(!Instruction::barrier([QubitId(0), QubitId(1)]).is_two_qubit_gate());
    }

    #[test]
    fn test_delay_instruction() {
        let inst = Instruction::delay(QubitId(0), 160.0, TimeUnit::Dt);
        assert_eq!(inst.name(), "delay");
        match inst.kind {
            InstructionKind::Delay { duration, unit } => {
                assert_eq!(duration, 160.0);
                assert_eq!(unit, TimeUnit::Dt);
            }
            _ => panic!("expected Delay"),
        }
    }
}
