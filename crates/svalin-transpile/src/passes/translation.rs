//! Basis translation passes.

use rustc_hash::FxHashSet;
use svalin_ir::{Circuit, Instruction, InstructionKind, QubitId, StandardGate};
use tracing::debug;

use crate::coupling::CouplingMap;
use crate::error::{TranspileError, TranspileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

use super::euler::{emit_1q, u_params};

const MAX_DEPTH: usize = 24;

/// Rewrites gates on three or more qubits into one- and two-qubit
/// gates.
///
/// Runs in the init stage so that layout and routing only ever see
/// two-qubit interactions.
pub struct Decompose3q;

impl Pass for Decompose3q {
    fn name(&self) -> &'static str {
        "unroll_3q"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _props: &mut PropertySet) -> TranspileResult<()> {
        let mut out = Vec::with_capacity(circuit.num_ops());
        for inst in circuit.instructions() {
            match inst.as_gate() {
                Some(StandardGate::CCX) => {
                    let (a, b, t) = (inst.qubits[0], inst.qubits[1], inst.qubits[2]);
                    out.extend(ccx_decomposition(a, b, t));
                }
                _ => out.push(inst.clone()),
            }
        }
        circuit.replace_instructions(out)?;
        Ok(())
    }

    fn should_run(&self, circuit: &Circuit, _props: &PropertySet) -> bool {
        circuit
            .instructions()
            .iter()
            .any(|i| i.as_gate().is_some_and(|g| g.num_qubits() > 2))
    }
}

/// Rewrites every gate into the target basis through recursive
/// decomposition rules.
///
/// Two-qubit gates reduce to cx (or cz when only cz is native) plus
/// one-qubit corrections; one-qubit gates re-emit through the canonical
/// `U` form as either a `u` gate or an rz/sx sequence. Gates already in
/// the basis pass through untouched, except on a directed device, where
/// a two-qubit gate running against the edge direction is flipped:
/// operand-symmetric gates swap operands, cx is conjugated with
/// Hadamards.
pub struct BasisTranslation {
    basis: FxHashSet<String>,
    basis_names: Vec<String>,
    coupling: Option<CouplingMap>,
}

impl BasisTranslation {
    /// Create the pass for a gate basis.
    pub fn new(basis: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let basis_names: Vec<String> = basis.into_iter().map(Into::into).collect();
        Self {
            basis: basis_names.iter().cloned().collect(),
            basis_names,
            coupling: None,
        }
    }

    /// Honor edge direction on a directed device.
    pub fn with_coupling(mut self, coupling: CouplingMap) -> Self {
        self.coupling = Some(coupling);
        self
    }

    fn has(&self, name: &str) -> bool {
        self.basis.contains(name)
    }

    /// True when the pair runs against the edge direction but the
    /// reversed pair is natively supported.
    fn needs_flip(&self, a: QubitId, b: QubitId) -> bool {
        self.coupling
            .as_ref()
            .is_some_and(|c| !c.is_connected(a.0, b.0) && c.is_connected(b.0, a.0))
    }

    fn fail(&self, gate: &'static str) -> TranspileError {
        TranspileError::TranslationFailed {
            gate,
            basis: self.basis_names.clone(),
        }
    }

    fn translate_gate(
        &self,
        gate: StandardGate,
        qubits: &[QubitId],
        out: &mut Vec<Instruction>,
        phase: &mut f64,
        depth: usize,
    ) -> TranspileResult<()> {
        let flip = gate.num_qubits() == 2 && self.needs_flip(qubits[0], qubits[1]);
        if self.has(gate.name()) && !flip {
            out.push(Instruction::gate(gate, qubits.iter().copied()));
            return Ok(());
        }
        if depth >= MAX_DEPTH {
            return Err(self.fail(gate.name()));
        }

        if flip {
            if gate.is_operand_symmetric() {
                return self.translate_gate(gate, &[qubits[1], qubits[0]], out, phase, depth + 1);
            }
            if self.has(gate.name()) {
                let reversed = self
                    .reverse_rule(gate, qubits)
                    .ok_or_else(|| self.fail(gate.name()))?;
                for inst in reversed {
                    match inst.kind {
                        InstructionKind::Gate(g) => {
                            self.translate_gate(g, &inst.qubits, out, phase, depth + 1)?;
                        }
                        _ => out.push(inst),
                    }
                }
                return Ok(());
            }
            // Not in the basis: decompose normally below, the direction
            // check reapplies to the inner two-qubit gates.
        }

        if gate.num_qubits() == 1 {
            let (t, p, l, g_phase) = u_params(&gate).ok_or_else(|| self.fail(gate.name()))?;
            let (gates, extra) =
                emit_1q(t, p, l, g_phase, |n| self.has(n)).ok_or_else(|| self.fail(gate.name()))?;
            *phase += extra;
            for g in gates {
                out.push(Instruction::single_qubit_gate(g, qubits[0]));
            }
            return Ok(());
        }

        let replacement = self
            .two_qubit_rule(gate, qubits)
            .ok_or_else(|| self.fail(gate.name()))?;
        for inst in replacement {
            match inst.kind {
                InstructionKind::Gate(g) => {
                    self.translate_gate(g, &inst.qubits, out, phase, depth + 1)?;
                }
                _ => out.push(inst),
            }
        }
        Ok(())
    }

    /// Rewrite for an in-basis, non-symmetric gate whose operands run
    /// against the device edge direction.
    fn reverse_rule(&self, gate: StandardGate, q: &[QubitId]) -> Option<Vec<Instruction>> {
        use StandardGate::*;
        let one = Instruction::single_qubit_gate;
        let two = Instruction::two_qubit_gate;
        Some(match gate {
            CX => vec![
                one(H, q[0]),
                one(H, q[1]),
                two(CX, q[1], q[0]),
                one(H, q[0]),
                one(H, q[1]),
            ],
            _ => return None,
        })
    }

    /// Decomposition rule for a multi-qubit gate not in the basis.
    fn two_qubit_rule(&self, gate: StandardGate, q: &[QubitId]) -> Option<Vec<Instruction>> {
        use StandardGate::*;
        let one = Instruction::single_qubit_gate;
        let two = Instruction::two_qubit_gate;
        Some(match gate {
            CX if self.has("cz") => vec![one(H, q[1]), two(CZ, q[0], q[1]), one(H, q[1])],
            CZ => vec![one(H, q[1]), two(CX, q[0], q[1]), one(H, q[1])],
            CY => vec![one(Sdg, q[1]), two(CX, q[0], q[1]), one(S, q[1])],
            Swap => vec![
                two(CX, q[0], q[1]),
                two(CX, q[1], q[0]),
                two(CX, q[0], q[1]),
            ],
            ISwap => vec![
                one(S, q[0]),
                one(S, q[1]),
                one(H, q[0]),
                two(CX, q[0], q[1]),
                two(CX, q[1], q[0]),
                one(H, q[1]),
            ],
            CP(t) => vec![
                one(P(t / 2.0), q[0]),
                two(CX, q[0], q[1]),
                one(P(-t / 2.0), q[1]),
                two(CX, q[0], q[1]),
                one(P(t / 2.0), q[1]),
            ],
            RZZ(t) => vec![two(CX, q[0], q[1]), one(Rz(t), q[1]), two(CX, q[0], q[1])],
            CCX => ccx_decomposition(q[0], q[1], q[2]),
            _ => return None,
        })
    }
}

impl Pass for BasisTranslation {
    fn name(&self) -> &'static str {
        "basis_translation"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _props: &mut PropertySet) -> TranspileResult<()> {
        let mut out = Vec::with_capacity(circuit.num_ops());
        let mut phase = 0.0;
        for inst in circuit.instructions() {
            match &inst.kind {
                InstructionKind::Gate(g) => {
                    self.translate_gate(*g, &inst.qubits, &mut out, &mut phase, 0)?;
                }
                _ => out.push(inst.clone()),
            }
        }
        circuit.replace_instructions(out)?;
        circuit.add_global_phase(phase);
        debug!(ops = circuit.num_ops(), "translated to basis");
        Ok(())
    }

    fn should_run(&self, circuit: &Circuit, _props: &PropertySet) -> bool {
        circuit.instructions().iter().any(|i| {
            i.as_gate().is_some_and(|g| {
                !self.has(g.name())
                    || (i.qubits.len() == 2 && self.needs_flip(i.qubits[0], i.qubits[1]))
            })
        })
    }
}

/// Standard six-cx Toffoli decomposition.
fn ccx_decomposition(a: QubitId, b: QubitId, t: QubitId) -> Vec<Instruction> {
    use StandardGate::*;
    let one = Instruction::single_qubit_gate;
    let two = Instruction::two_qubit_gate;
    vec![
        one(H, t),
        two(CX, b, t),
        one(Tdg, t),
        two(CX, a, t),
        one(T, t),
        two(CX, b, t),
        one(Tdg, t),
        two(CX, a, t),
        one(T, b),
        one(T, t),
        one(H, t),
        two(CX, a, b),
        one(T, a),
        one(Tdg, b),
        two(CX, a, b),
    ]
}
