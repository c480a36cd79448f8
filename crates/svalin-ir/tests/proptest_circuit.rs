//! Property-based tests for circuit construction invariants.
//!
//! Operand validation happens at push time, so a circuit can never
//! hold an instruction referencing bits it does not own, and a failed
//! wholesale rewrite must leave the circuit untouched.

use proptest::prelude::*;
use svalin_ir::{Circuit, Instruction, IrError, QubitId, StandardGate};

proptest! {
    #[test]
    fn push_validates_qubit_range(n in 1u32..8, q in 0u32..16) {
        let mut circuit = Circuit::with_size("c", n, 0);
        let result = circuit.push(Instruction::single_qubit_gate(StandardGate::X, QubitId(q)));
        if q < n {
            prop_assert!(result.is_ok());
            prop_assert_eq!(circuit.num_ops(), 1);
        } else {
            prop_assert!(
                matches!(result, Err(IrError::QubitOutOfRange { .. })),
                "expected QubitOutOfRange, got {:?}", result
            );
            prop_assert_eq!(circuit.num_ops(), 0);
        }
    }

    #[test]
    fn duplicate_two_qubit_operand_rejected(n in 1u32..8, q in 0u32..8) {
        let mut circuit = Circuit::with_size("c", n, 0);
        let result = circuit.cx(QubitId(q % n), QubitId(q % n));
        prop_assert!(
            matches!(result, Err(IrError::DuplicateOperand { .. })),
            "expected DuplicateOperand, got {:?}", result
        );
        prop_assert_eq!(circuit.num_ops(), 0);
    }

    #[test]
    fn replace_instructions_rolls_back_on_invalid(n in 2u32..8, bad in 8u32..16) {
        let mut circuit = Circuit::with_size("c", n, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let before = circuit.instructions().to_vec();

        let invalid = vec![
            Instruction::single_qubit_gate(StandardGate::H, QubitId(0)),
            Instruction::single_qubit_gate(StandardGate::X, QubitId(bad)),
        ];
        prop_assert!(circuit.replace_instructions(invalid).is_err());
        prop_assert_eq!(circuit.instructions(), before.as_slice());
    }

    #[test]
    fn depth_bounded_by_op_count(n in 1u32..6, qubits in prop::collection::vec(0u32..6, 0..30)) {
        let mut circuit = Circuit::with_size("c", n, 0);
        for q in qubits {
            circuit.x(QubitId(q % n)).unwrap();
        }
        prop_assert!(circuit.depth() <= circuit.num_ops());
        prop_assert_eq!(circuit.depth() == 0, circuit.num_ops() == 0);
    }
}
