//! Ordered-operation quantum circuit.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind, TimeUnit};
use crate::qubit::{ClassicalRegister, ClbitId, QuantumRegister, QubitId};

/// A quantum circuit.
///
/// The circuit is an ordered sequence of instructions over a contiguous
/// qubit/clbit index space owned by its registers. Every push validates
/// that operands resolve to bits the circuit owns, so a constructed
/// circuit never contains a dangling operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Quantum registers, in allocation order.
    qregs: Vec<QuantumRegister>,
    /// Classical registers, in allocation order.
    cregs: Vec<ClassicalRegister>,
    /// Instructions, in program order.
    instructions: Vec<Instruction>,
    /// Global phase in radians.
    global_phase: f64,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qregs: vec![],
            cregs: vec![],
            instructions: vec![],
            global_phase: 0.0,
        }
    }

    /// Create a circuit with default registers `q` and `c`.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        if num_qubits > 0 {
            circuit.add_qreg("q", num_qubits);
        }
        if num_clbits > 0 {
            circuit.add_creg("c", num_clbits);
        }
        circuit
    }

    /// Add a quantum register, returning the global ids of its bits.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> Vec<QubitId> {
        let offset = self.num_qubits();
        let reg = QuantumRegister {
            name: name.into(),
            size,
            offset,
        };
        let ids: Vec<_> = reg.bits().collect();
        self.qregs.push(reg);
        ids
    }

    /// Add a classical register, returning the global ids of its bits.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> Vec<ClbitId> {
        let offset = self.num_clbits();
        let reg = ClassicalRegister {
            name: name.into(),
            size,
            offset,
        };
        let ids: Vec<_> = reg.bits().collect();
        self.cregs.push(reg);
        ids
    }

    /// Append an instruction, validating its operands.
    pub fn push(&mut self, instruction: Instruction) -> IrResult<()> {
        let num_qubits = self.num_qubits();
        let num_clbits = self.num_clbits();

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = instruction.qubits.len() as u32;
            if expected != got {
                return Err(IrError::ArityMismatch {
                    gate_name: gate.name(),
                    expected,
                    got,
                });
            }
        }

        if matches!(instruction.kind, InstructionKind::Measure)
            && instruction.qubits.len() != instruction.clbits.len()
        {
            return Err(IrError::MeasureShapeMismatch {
                qubits: instruction.qubits.len(),
                clbits: instruction.clbits.len(),
            });
        }

        for &qubit in &instruction.qubits {
            if qubit.0 >= num_qubits {
                return Err(IrError::QubitOutOfRange { qubit, num_qubits });
            }
        }
        for &clbit in &instruction.clbits {
            if clbit.0 >= num_clbits {
                return Err(IrError::ClbitOutOfRange { clbit, num_clbits });
            }
        }

        for (i, &qubit) in instruction.qubits.iter().enumerate() {
            if instruction.qubits[..i].contains(&qubit) {
                return Err(IrError::DuplicateOperand {
                    qubit,
                    name: instruction.name(),
                });
            }
        }

        self.instructions.push(instruction);
        Ok(())
    }

    /// Replace the instruction sequence wholesale.
    ///
    /// Used by transformation passes that rewrite the whole program.
    /// Operands are validated the same way `push` validates them.
    pub fn replace_instructions(
        &mut self,
        instructions: impl IntoIterator<Item = Instruction>,
    ) -> IrResult<()> {
        let old = std::mem::take(&mut self.instructions);
        for inst in instructions {
            if let Err(e) = self.push(inst) {
                self.instructions = old;
                return Err(e);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Gate builder helpers
    // =========================================================================

    /// Apply a Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::H, qubit))?;
        Ok(self)
    }

    /// Apply a Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::X, qubit))?;
        Ok(self)
    }

    /// Apply a Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::Z, qubit))?;
        Ok(self)
    }

    /// Apply an S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::S, qubit))?;
        Ok(self)
    }

    /// Apply a T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::T, qubit))?;
        Ok(self)
    }

    /// Apply an Rx rotation.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::Rx(theta), qubit))?;
        Ok(self)
    }

    /// Apply an Ry rotation.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::Ry(theta), qubit))?;
        Ok(self)
    }

    /// Apply an Rz rotation.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::Rz(theta), qubit))?;
        Ok(self)
    }

    /// Apply a CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(StandardGate::CX, control, target))?;
        Ok(self)
    }

    /// Apply a CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(StandardGate::CZ, control, target))?;
        Ok(self)
    }

    /// Apply a SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(StandardGate::Swap, q1, q2))?;
        Ok(self)
    }

    /// Apply a controlled-phase gate.
    pub fn cp(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(
            StandardGate::CP(theta),
            control,
            target,
        ))?;
        Ok(self)
    }

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.push(Instruction::measure(qubit, clbit))?;
        Ok(self)
    }

    /// Apply a barrier across all qubits.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        let qubits: Vec<_> = (0..self.num_qubits()).map(QubitId).collect();
        self.push(Instruction::barrier(qubits))?;
        Ok(self)
    }

    /// Idle a qubit for a fixed duration.
    pub fn delay(&mut self, qubit: QubitId, duration: f64, unit: TimeUnit) -> IrResult<&mut Self> {
        self.push(Instruction::delay(qubit, duration, unit))?;
        Ok(self)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the circuit.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.qregs.iter().map(|r| r.size).sum()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> u32 {
        self.cregs.iter().map(|r| r.size).sum()
    }

    /// Get the quantum registers.
    pub fn qregs(&self) -> &[QuantumRegister] {
        &self.qregs
    }

    /// Get the classical registers.
    pub fn cregs(&self) -> &[ClassicalRegister] {
        &self.cregs
    }

    /// Get the instruction sequence.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Get the number of operations.
    pub fn num_ops(&self) -> usize {
        self.instructions.len()
    }

    /// Get the global phase.
    pub fn global_phase(&self) -> f64 {
        self.global_phase
    }

    /// Add to the global phase.
    pub fn add_global_phase(&mut self, phase: f64) {
        self.global_phase += phase;
    }

    /// Calculate the circuit depth.
    ///
    /// Depth is the length of the longest chain of operations over any
    /// wire; barriers synchronize but do not count as a level.
    pub fn depth(&self) -> usize {
        let mut qubit_level: FxHashMap<QubitId, usize> = FxHashMap::default();
        let mut clbit_level: FxHashMap<ClbitId, usize> = FxHashMap::default();
        let mut max_depth = 0;

        for inst in &self.instructions {
            let front = inst
                .qubits
                .iter()
                .map(|q| qubit_level.get(q).copied().unwrap_or(0))
                .chain(
                    inst.clbits
                        .iter()
                        .map(|c| clbit_level.get(c).copied().unwrap_or(0)),
                )
                .max()
                .unwrap_or(0);

            let level = if inst.is_barrier() { front } else { front + 1 };

            for &q in &inst.qubits {
                qubit_level.insert(q, level);
            }
            for &c in &inst.clbits {
                clbit_level.insert(c, level);
            }
            max_depth = max_depth.max(level);
        }

        max_depth
    }

    /// Count operations by name.
    pub fn count_ops(&self) -> FxHashMap<&'static str, usize> {
        let mut counts = FxHashMap::default();
        for inst in &self.instructions {
            *counts.entry(inst.name()).or_insert(0) += 1;
        }
        counts
    }

    /// Count two-qubit gates.
    pub fn two_qubit_gate_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| i.is_two_qubit_gate())
            .count()
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a GHZ state circuit with measurements.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("ghz", n, n);
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        for i in 0..n {
            circuit.measure(QubitId(i), ClbitId(i))?;
        }
        Ok(circuit)
    }

    /// Create a QFT circuit (without measurements).
    pub fn qft(n: u32) -> IrResult<Self> {
        use std::f64::consts::PI;

        let mut circuit = Self::with_size("qft", n, 0);
        for i in 0..n {
            circuit.h(QubitId(i))?;
            for j in (i + 1)..n {
                let angle = PI / f64::from(1u32 << (j - i));
                circuit.cp(angle, QubitId(j), QubitId(i))?;
            }
        }
        for i in 0..n / 2 {
            circuit.swap(QubitId(i), QubitId(n - 1 - i))?;
        }
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_size() {
        let circuit = Circuit::with_size("test", 3, 2);
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.num_ops(), 0);
    }

    #[test]
    fn test_operand_validation() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        let err = circuit.cx(QubitId(0), QubitId(5)).unwrap_err();
        assert!(matches!(err, IrError::QubitOutOfRange { .. }));

        let err = circuit
            .push(Instruction::gate(StandardGate::CX, [QubitId(0)]))
            .unwrap_err();
        assert!(matches!(err, IrError::ArityMismatch { .. }));

        let err = circuit.cx(QubitId(1), QubitId(1)).unwrap_err();
        assert!(matches!(err, IrError::DuplicateOperand { .. }));
    }

    #[test]
    fn test_depth() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        circuit.measure(QubitId(1), ClbitId(1)).unwrap();
        // H, CX, then parallel measures
        assert_eq!(circuit.depth(), 3);
    }

    #[test]
    fn test_parallel_depth() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.h(QubitId(1)).unwrap();
        assert_eq!(circuit.depth(), 1);
    }

    #[test]
    fn test_barrier_depth_neutral() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.barrier_all().unwrap();
        circuit.h(QubitId(1)).unwrap();
        assert_eq!(circuit.depth(), 2);
    }

    #[test]
    fn test_count_ops() {
        let circuit = Circuit::ghz(3).unwrap();
        let counts = circuit.count_ops();
        assert_eq!(counts.get("h"), Some(&1));
        assert_eq!(counts.get("cx"), Some(&2));
        assert_eq!(counts.get("measure"), Some(&3));
        assert_eq!(circuit.two_qubit_gate_count(), 2);
    }

    #[test]
    fn test_replace_instructions_rolls_back() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        let bad = vec![Instruction::single_qubit_gate(StandardGate::X, QubitId(9))];
        assert!(circuit.replace_instructions(bad).is_err());
        // Original program restored on failure.
        assert_eq!(circuit.num_ops(), 1);
    }

    #[test]
    fn test_qft_structure() {
        let circuit = Circuit::qft(3).unwrap();
        let counts = circuit.count_ops();
        assert_eq!(counts.get("h"), Some(&3));
        assert_eq!(counts.get("cp"), Some(&3));
        assert_eq!(counts.get("swap"), Some(&1));
    }
}
