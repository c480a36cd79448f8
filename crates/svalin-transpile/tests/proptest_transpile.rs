//! Property-based tests for the transpile pipeline.
//!
//! Random circuits through every preset level must come out valid for
//! the device: gates in the basis, two-qubit gates on coupled pairs,
//! and measurements preserved.

use proptest::prelude::*;
use svalin_ir::{Circuit, ClbitId, InstructionKind, QubitId};
use svalin_transpile::{
    transpile, CouplingMap, CouplingSpec, Layout, TranspileOptions,
};

const BASIS: &[&str] = &["rz", "sx", "x", "cx"];

/// Operations that can be applied to a random circuit.
#[derive(Debug, Clone)]
enum Op {
    H(u32),
    X(u32),
    T(u32),
    Rz(f64, u32),
    Cx(u32, u32),
    Cz(u32, u32),
    Measure(u32),
}

impl Op {
    fn apply(self, circuit: &mut Circuit) {
        let n = circuit.num_qubits();
        match self {
            Op::H(q) => {
                let _ = circuit.h(QubitId(q % n));
            }
            Op::X(q) => {
                let _ = circuit.x(QubitId(q % n));
            }
            Op::T(q) => {
                let _ = circuit.t(QubitId(q % n));
            }
            Op::Rz(theta, q) => {
                let _ = circuit.rz(theta, QubitId(q % n));
            }
            Op::Cx(a, b) => {
                let (a, b) = (a % n, b % n);
                if a != b {
                    let _ = circuit.cx(QubitId(a), QubitId(b));
                }
            }
            Op::Cz(a, b) => {
                let (a, b) = (a % n, b % n);
                if a != b {
                    let _ = circuit.cz(QubitId(a), QubitId(b));
                }
            }
            Op::Measure(q) => {
                let q = q % n;
                let _ = circuit.measure(QubitId(q), ClbitId(q));
            }
        }
    }
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..8).prop_map(Op::H),
        (0u32..8).prop_map(Op::X),
        (0u32..8).prop_map(Op::T),
        ((-6.0..6.0f64), 0u32..8).prop_map(|(t, q)| Op::Rz(t, q)),
        (0u32..8, 0u32..8).prop_map(|(a, b)| Op::Cx(a, b)),
        (0u32..8, 0u32..8).prop_map(|(a, b)| Op::Cz(a, b)),
        (0u32..8).prop_map(Op::Measure),
    ]
}

fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (2u32..=5, prop::collection::vec(arb_op(), 1..=20)).prop_map(|(n, ops)| {
        let mut circuit = Circuit::with_size("random", n, n);
        for op in ops {
            op.apply(&mut circuit);
        }
        circuit
    })
}

proptest! {
    #[test]
    fn transpiled_output_is_hardware_valid(
        circuit in arb_circuit(),
        level in 0u8..=3,
        seed in 0u64..1000,
    ) {
        let coupling = CouplingMap::linear(5);
        let options = TranspileOptions {
            basis_gates: Some(BASIS.iter().map(|s| (*s).to_owned()).collect()),
            coupling_map: Some(CouplingSpec::Explicit(coupling.clone())),
            optimization_level: Some(level),
            seed: Some(seed),
            ..Default::default()
        };
        let measures = circuit.count_ops().get("measure").copied().unwrap_or(0);

        let compiled = transpile(circuit, &options).unwrap();

        for inst in compiled.instructions() {
            if let InstructionKind::Gate(gate) = &inst.kind {
                prop_assert!(BASIS.contains(&gate.name()));
                if inst.qubits.len() == 2 {
                    prop_assert!(coupling.is_coupled(inst.qubits[0].0, inst.qubits[1].0));
                }
            }
        }
        let out_measures = compiled.count_ops().get("measure").copied().unwrap_or(0);
        prop_assert_eq!(out_measures, measures);
    }

    #[test]
    fn linear_coupling_distance_is_index_gap(
        n in 2u32..20,
        a in 0u32..20,
        b in 0u32..20,
    ) {
        let coupling = CouplingMap::linear(n);
        let (a, b) = (a % n, b % n);
        prop_assert_eq!(coupling.distance(a, b), Some(a.abs_diff(b)));
        if let Some(path) = coupling.shortest_path(a, b) {
            prop_assert_eq!(path.len() as u32, a.abs_diff(b) + 1);
            prop_assert_eq!(path[0], a);
            prop_assert_eq!(*path.last().unwrap(), b);
        }
    }

    #[test]
    fn physical_list_roundtrips(
        perm in (2u32..8).prop_flat_map(|n| Just((0..n).collect::<Vec<u32>>()).prop_shuffle()),
    ) {
        let n = perm.len() as u32;
        let layout = Layout::from_physical_list(&perm, n, n).unwrap();
        prop_assert_eq!(layout.as_physical_list(), perm.clone());
        for (virt, &phys) in perm.iter().enumerate() {
            prop_assert_eq!(layout.virtual_qubit(phys), Some(QubitId(virt as u32)));
        }
    }

    #[test]
    fn swap_physical_is_an_involution(
        perm in (2u32..8).prop_flat_map(|n| Just((0..n).collect::<Vec<u32>>()).prop_shuffle()),
        a in 0u32..8,
        b in 0u32..8,
    ) {
        let n = perm.len() as u32;
        let mut layout = Layout::from_physical_list(&perm, n, n).unwrap();
        let (a, b) = (a % n, b % n);
        layout.swap_physical(a, b);
        layout.swap_physical(a, b);
        prop_assert_eq!(layout.as_physical_list(), perm);
    }
}
