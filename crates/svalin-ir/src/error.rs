//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur when building or mutating circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit operand does not resolve to a bit owned by the circuit.
    #[error("Qubit {qubit} is out of range for circuit with {num_qubits} qubits")]
    QubitOutOfRange {
        /// The offending operand.
        qubit: QubitId,
        /// Number of qubits the circuit owns.
        num_qubits: u32,
    },

    /// Classical operand does not resolve to a bit owned by the circuit.
    #[error("Classical bit {clbit} is out of range for circuit with {num_clbits} bits")]
    ClbitOutOfRange {
        /// The offending operand.
        clbit: ClbitId,
        /// Number of classical bits the circuit owns.
        num_clbits: u32,
    },

    /// Gate applied with the wrong number of qubit operands.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    ArityMismatch {
        /// Name of the gate.
        gate_name: &'static str,
        /// Expected operand count.
        expected: u32,
        /// Provided operand count.
        got: u32,
    },

    /// The same qubit used twice in one operation.
    #[error("Duplicate qubit {qubit} in '{name}' operands")]
    DuplicateOperand {
        /// The duplicated qubit.
        qubit: QubitId,
        /// Instruction name.
        name: &'static str,
    },

    /// Measurement with mismatched qubit/clbit operand counts.
    #[error("Measurement qubit count ({qubits}) does not match clbit count ({clbits})")]
    MeasureShapeMismatch {
        /// Qubit operand count.
        qubits: usize,
        /// Classical operand count.
        clbits: usize,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
