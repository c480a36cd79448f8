//! Gate-level optimization passes.

use rustc_hash::{FxHashMap, FxHashSet};
use svalin_ir::{Circuit, Instruction, QubitId, StandardGate};
use tracing::debug;

use crate::error::TranspileResult;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

use super::euler::{
    emit_1q, gate_matrix, matmul, params_from_matrix, wrap_angle, Matrix2, ANGLE_TOL,
};

fn identity_matrix() -> Matrix2 {
    use num_complex::Complex64;
    [
        [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
        [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
    ]
}

/// Merges runs of adjacent one-qubit gates.
///
/// Each maximal run on a wire is accumulated into a 2x2 unitary and
/// re-emitted in the basis when that yields fewer gates. Runs that
/// multiply out to the identity disappear entirely (their phase moves
/// to the circuit's global phase).
pub struct Optimize1qGates {
    basis: FxHashSet<String>,
}

impl Optimize1qGates {
    /// Create the pass for a gate basis.
    pub fn new(basis: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            basis: basis.into_iter().map(Into::into).collect(),
        }
    }

    /// Re-emit one run, preferring the merged form when it is shorter.
    fn flush(
        &self,
        qubit: QubitId,
        run: &mut Vec<StandardGate>,
        out: &mut Vec<Instruction>,
        phase: &mut f64,
    ) {
        if run.is_empty() {
            return;
        }
        let mut m = identity_matrix();
        for g in run.iter() {
            if let Some(gm) = gate_matrix(g) {
                m = matmul(&gm, &m);
            }
        }
        let (t, p, l, m_phase) = params_from_matrix(&m);
        let merged = emit_1q(t, p, l, m_phase, |n| self.basis.contains(n));

        match merged {
            Some((gates, extra)) if gates.len() < run.len() => {
                *phase += extra;
                for g in gates {
                    out.push(Instruction::single_qubit_gate(g, qubit));
                }
            }
            _ => {
                for &g in run.iter() {
                    out.push(Instruction::single_qubit_gate(g, qubit));
                }
            }
        }
        run.clear();
    }
}

impl Pass for Optimize1qGates {
    fn name(&self) -> &'static str {
        "optimize_1q"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &["check_map"]
    }

    fn run(&self, circuit: &mut Circuit, _props: &mut PropertySet) -> TranspileResult<()> {
        let mut out = Vec::with_capacity(circuit.num_ops());
        let mut phase = 0.0;
        let mut pending: FxHashMap<QubitId, Vec<StandardGate>> = FxHashMap::default();

        for inst in circuit.instructions() {
            let single = inst.is_gate() && inst.qubits.len() == 1;
            if single {
                if let Some(g) = inst.as_gate() {
                    pending.entry(inst.qubits[0]).or_default().push(*g);
                    continue;
                }
            }
            // Blocker: flush the runs it touches, in operand order.
            for &q in &inst.qubits {
                if let Some(mut run) = pending.remove(&q) {
                    self.flush(q, &mut run, &mut out, &mut phase);
                }
            }
            out.push(inst.clone());
        }

        let mut tails: Vec<QubitId> = pending.keys().copied().collect();
        tails.sort_unstable_by_key(|q| q.0);
        for q in tails {
            if let Some(mut run) = pending.remove(&q) {
                self.flush(q, &mut run, &mut out, &mut phase);
            }
        }

        circuit.replace_instructions(out)?;
        circuit.add_global_phase(phase);
        Ok(())
    }
}

fn cancels(g1: &StandardGate, ops1: &[QubitId], g2: &StandardGate, ops2: &[QubitId]) -> bool {
    let inverse_pair =
        (g1.is_self_inverse() && g1 == g2) || g1.inverse().as_ref() == Some(g2);
    if !inverse_pair {
        return false;
    }
    if ops1 == ops2 {
        return true;
    }
    // Same qubits in the other order only cancels for gates that do not
    // distinguish their operands.
    ops1.len() == 2
        && ops2.len() == 2
        && ops1[0] == ops2[1]
        && ops1[1] == ops2[0]
        && g1.is_operand_symmetric()
        && g2.is_operand_symmetric()
}

/// Per-wire last-touch bookkeeping shared by the cancellation passes.
struct WireStacks {
    stacks: FxHashMap<QubitId, Vec<usize>>,
}

impl WireStacks {
    fn new() -> Self {
        Self {
            stacks: FxHashMap::default(),
        }
    }

    fn push(&mut self, inst: &Instruction, idx: usize) {
        for &q in &inst.qubits {
            self.stacks.entry(q).or_default().push(idx);
        }
    }

    /// Last live instruction index on a wire.
    fn top(&mut self, qubit: QubitId, out: &[Option<Instruction>]) -> Option<usize> {
        let stack = self.stacks.get_mut(&qubit)?;
        while let Some(&idx) = stack.last() {
            if out[idx].is_some() {
                return Some(idx);
            }
            stack.pop();
        }
        None
    }

    fn remove_top(&mut self, qubits: &[QubitId]) {
        for q in qubits {
            if let Some(stack) = self.stacks.get_mut(q) {
                stack.pop();
            }
        }
    }
}

/// Cancels adjacent inverse gate pairs on the same operands.
pub struct CancelInverseGates;

impl Pass for CancelInverseGates {
    fn name(&self) -> &'static str {
        "cancel_inverses"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &["check_map"]
    }

    fn run(&self, circuit: &mut Circuit, _props: &mut PropertySet) -> TranspileResult<()> {
        let mut out: Vec<Option<Instruction>> = Vec::with_capacity(circuit.num_ops());
        let mut wires = WireStacks::new();

        for inst in circuit.instructions() {
            let candidate = inst.as_gate().and_then(|_| {
                let mut tops = inst.qubits.iter().map(|&q| wires.top(q, &out));
                let first = tops.next()??;
                tops.all(|t| t == Some(first)).then_some(first)
            });

            if let (Some(idx), Some(g2)) = (candidate, inst.as_gate()) {
                let matched = out[idx].as_ref().is_some_and(|prev| {
                    prev.as_gate()
                        .is_some_and(|g1| cancels(g1, &prev.qubits, g2, &inst.qubits))
                });
                if matched {
                    let prev_qubits = out[idx].as_ref().map(|p| p.qubits.clone()).unwrap_or_default();
                    out[idx] = None;
                    wires.remove_top(&prev_qubits);
                    continue;
                }
            }

            let idx = out.len();
            out.push(Some(inst.clone()));
            wires.push(inst, idx);
        }

        let remaining = out.into_iter().flatten();
        circuit.replace_instructions(remaining)?;
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq)]
enum CommuteFamily {
    /// Diagonal gates: slide through a cx control.
    ZLike,
    /// X-axis gates: slide through a cx target.
    XLike,
}

fn commute_family(gate: &StandardGate) -> Option<CommuteFamily> {
    use StandardGate::*;
    match gate {
        Z | S | Sdg | T | Tdg | Rz(_) | P(_) => Some(CommuteFamily::ZLike),
        X | SX | SXdg | Rx(_) => Some(CommuteFamily::XLike),
        _ => None,
    }
}

/// Cancels inverse one-qubit pairs separated by cx gates they commute
/// with.
///
/// A diagonal gate on a cx control and an X-axis gate on a cx target
/// both commute with the cx, so a matching inverse on the far side of
/// the cx still cancels.
pub struct CommutativeCancellation;

impl CommutativeCancellation {
    /// Search down a wire for a cancellation partner, skipping cx gates
    /// the family commutes with.
    fn find_partner(
        out: &[Option<Instruction>],
        stack: &[usize],
        qubit: QubitId,
        family: CommuteFamily,
        gate: &StandardGate,
    ) -> Option<usize> {
        for &idx in stack.iter().rev() {
            let Some(prev) = out[idx].as_ref() else {
                continue;
            };
            if let Some(StandardGate::CX) = prev.as_gate() {
                let commutes = match family {
                    CommuteFamily::ZLike => prev.qubits[0] == qubit,
                    CommuteFamily::XLike => prev.qubits[1] == qubit,
                };
                if commutes {
                    continue;
                }
                return None;
            }
            let g1 = prev.as_gate()?;
            if prev.qubits.len() == 1
                && commute_family(g1) == Some(family)
                && cancels(g1, &prev.qubits, gate, std::slice::from_ref(&qubit))
            {
                return Some(idx);
            }
            return None;
        }
        None
    }
}

impl Pass for CommutativeCancellation {
    fn name(&self) -> &'static str {
        "commutative_cancellation"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &["check_map"]
    }

    fn run(&self, circuit: &mut Circuit, _props: &mut PropertySet) -> TranspileResult<()> {
        let mut out: Vec<Option<Instruction>> = Vec::with_capacity(circuit.num_ops());
        let mut wires = WireStacks::new();

        for inst in circuit.instructions() {
            let family = inst
                .as_gate()
                .filter(|_| inst.qubits.len() == 1)
                .and_then(commute_family);

            if let (Some(fam), Some(gate)) = (family, inst.as_gate()) {
                let qubit = inst.qubits[0];
                let stack = wires.stacks.entry(qubit).or_default().clone();
                if let Some(idx) = Self::find_partner(&out, &stack, qubit, fam, gate) {
                    out[idx] = None;
                    continue;
                }
            }

            let idx = out.len();
            out.push(Some(inst.clone()));
            wires.push(inst, idx);
        }

        let remaining = out.into_iter().flatten();
        circuit.replace_instructions(remaining)?;
        Ok(())
    }
}

/// Merges adjacent two-qubit rotations on the same pair and drops the
/// negligible remainder.
///
/// With an approximation degree below 1.0 the negligibility threshold
/// widens proportionally, trading fidelity for gate count.
pub struct ResynthesizeTwoQubitRuns {
    threshold: f64,
}

impl ResynthesizeTwoQubitRuns {
    /// Create the pass; `approximation_degree` of `None` means exact.
    pub fn new(approximation_degree: Option<f64>) -> Self {
        let degree = approximation_degree.unwrap_or(1.0);
        Self {
            threshold: ANGLE_TOL + (1.0 - degree) * std::f64::consts::PI,
        }
    }

    fn same_pair(a: &Instruction, b: &Instruction) -> bool {
        (a.qubits[0] == b.qubits[0] && a.qubits[1] == b.qubits[1])
            || (a.qubits[0] == b.qubits[1] && a.qubits[1] == b.qubits[0])
    }

    fn angle_of(gate: &StandardGate) -> Option<f64> {
        match gate {
            StandardGate::CP(t) | StandardGate::RZZ(t) => Some(*t),
            _ => None,
        }
    }
}

impl Pass for ResynthesizeTwoQubitRuns {
    fn name(&self) -> &'static str {
        "resynth_2q_blocks"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &["check_map"]
    }

    fn run(&self, circuit: &mut Circuit, _props: &mut PropertySet) -> TranspileResult<()> {
        let mut out: Vec<Instruction> = Vec::with_capacity(circuit.num_ops());
        let mut dropped = 0usize;

        for inst in circuit.instructions() {
            let Some(angle) = inst.as_gate().and_then(Self::angle_of) else {
                out.push(inst.clone());
                continue;
            };

            let mut angle = angle;
            if let Some(last) = out.last() {
                let mergeable = last.as_gate().and_then(Self::angle_of).filter(|_| {
                    Self::same_pair(last, inst)
                        && std::mem::discriminant(last.as_gate().unwrap())
                            == std::mem::discriminant(inst.as_gate().unwrap())
                });
                if let Some(prev_angle) = mergeable {
                    out.pop();
                    angle += prev_angle;
                }
            }

            if wrap_angle(angle).abs() <= self.threshold {
                dropped += 1;
                continue;
            }
            let gate = match inst.as_gate() {
                Some(StandardGate::CP(_)) => StandardGate::CP(angle),
                _ => StandardGate::RZZ(angle),
            };
            out.push(Instruction::two_qubit_gate(gate, inst.qubits[0], inst.qubits[1]));
        }

        if dropped > 0 {
            debug!(dropped, "dropped negligible two-qubit rotations");
        }
        circuit.replace_instructions(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn basis() -> Optimize1qGates {
        Optimize1qGates::new(["rz", "sx", "x", "cx"])
    }

    #[test]
    fn test_merge_rotation_run() {
        let mut circuit = Circuit::with_size("t", 1, 0);
        circuit.rz(0.3, QubitId(0)).unwrap();
        circuit.rz(0.4, QubitId(0)).unwrap();
        circuit.rz(0.5, QubitId(0)).unwrap();
        basis().run(&mut circuit, &mut PropertySet::new()).unwrap();
        assert_eq!(circuit.num_ops(), 1);
        match circuit.instructions()[0].as_gate() {
            Some(StandardGate::Rz(t)) => assert!((t - 1.2).abs() < 1e-9),
            other => panic!("expected rz, got {other:?}"),
        }
    }

    #[test]
    fn test_inverse_run_vanishes() {
        let mut circuit = Circuit::with_size("t", 1, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.h(QubitId(0)).unwrap();
        basis().run(&mut circuit, &mut PropertySet::new()).unwrap();
        assert_eq!(circuit.num_ops(), 0);
    }

    #[test]
    fn test_runs_blocked_by_cx() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.rz(0.3, QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.rz(-0.3, QubitId(0)).unwrap();
        basis().run(&mut circuit, &mut PropertySet::new()).unwrap();
        // The cx splits the runs; nothing merges.
        assert_eq!(circuit.num_ops(), 3);
    }

    #[test]
    fn test_cancel_adjacent_cx() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.h(QubitId(0)).unwrap();
        CancelInverseGates
            .run(&mut circuit, &mut PropertySet::new())
            .unwrap();
        assert_eq!(circuit.count_ops().get("cx"), None);
        assert_eq!(circuit.num_ops(), 1);
    }

    #[test]
    fn test_reversed_cx_does_not_cancel() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.cx(QubitId(1), QubitId(0)).unwrap();
        CancelInverseGates
            .run(&mut circuit, &mut PropertySet::new())
            .unwrap();
        assert_eq!(circuit.num_ops(), 2);
    }

    #[test]
    fn test_reversed_cz_cancels() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.cz(QubitId(0), QubitId(1)).unwrap();
        circuit.cz(QubitId(1), QubitId(0)).unwrap();
        CancelInverseGates
            .run(&mut circuit, &mut PropertySet::new())
            .unwrap();
        assert_eq!(circuit.num_ops(), 0);
    }

    #[test]
    fn test_t_tdg_cancels() {
        let mut circuit = Circuit::with_size("t", 1, 0);
        circuit.t(QubitId(0)).unwrap();
        circuit
            .push(Instruction::single_qubit_gate(StandardGate::Tdg, QubitId(0)))
            .unwrap();
        CancelInverseGates
            .run(&mut circuit, &mut PropertySet::new())
            .unwrap();
        assert_eq!(circuit.num_ops(), 0);
    }

    #[test]
    fn test_commute_through_control() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.rz(0.7, QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.rz(-0.7, QubitId(0)).unwrap();
        CommutativeCancellation
            .run(&mut circuit, &mut PropertySet::new())
            .unwrap();
        assert_eq!(circuit.num_ops(), 1);
        assert_eq!(circuit.instructions()[0].name(), "cx");
    }

    #[test]
    fn test_no_commute_through_target() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.rz(0.7, QubitId(1)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.rz(-0.7, QubitId(1)).unwrap();
        CommutativeCancellation
            .run(&mut circuit, &mut PropertySet::new())
            .unwrap();
        // rz does not commute through the cx target.
        assert_eq!(circuit.num_ops(), 3);
    }

    #[test]
    fn test_x_commutes_through_target() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.x(QubitId(1)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.x(QubitId(1)).unwrap();
        CommutativeCancellation
            .run(&mut circuit, &mut PropertySet::new())
            .unwrap();
        assert_eq!(circuit.num_ops(), 1);
    }

    #[test]
    fn test_merge_cp_pair() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.cp(0.3, QubitId(0), QubitId(1)).unwrap();
        circuit.cp(0.4, QubitId(1), QubitId(0)).unwrap();
        ResynthesizeTwoQubitRuns::new(None)
            .run(&mut circuit, &mut PropertySet::new())
            .unwrap();
        assert_eq!(circuit.num_ops(), 1);
        match circuit.instructions()[0].as_gate() {
            Some(StandardGate::CP(t)) => assert!((t - 0.7).abs() < 1e-9),
            other => panic!("expected cp, got {other:?}"),
        }
    }

    #[test]
    fn test_merged_full_turn_drops() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.cp(PI, QubitId(0), QubitId(1)).unwrap();
        circuit.cp(PI, QubitId(0), QubitId(1)).unwrap();
        ResynthesizeTwoQubitRuns::new(None)
            .run(&mut circuit, &mut PropertySet::new())
            .unwrap();
        assert_eq!(circuit.num_ops(), 0);
    }

    #[test]
    fn test_approximation_widens_threshold() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.cp(0.01, QubitId(0), QubitId(1)).unwrap();
        ResynthesizeTwoQubitRuns::new(Some(0.9))
            .run(&mut circuit, &mut PropertySet::new())
            .unwrap();
        assert_eq!(circuit.num_ops(), 0);

        let mut exact = Circuit::with_size("t", 2, 0);
        exact.cp(0.01, QubitId(0), QubitId(1)).unwrap();
        ResynthesizeTwoQubitRuns::new(None)
            .run(&mut exact, &mut PropertySet::new())
            .unwrap();
        assert_eq!(exact.num_ops(), 1);
    }
}
