//! Standard gate vocabulary.

use serde::{Deserialize, Serialize};

/// Standard gates with fixed semantics.
///
/// Rotation angles are concrete `f64` radians; the transpiler operates
/// on fully bound circuits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around the X axis.
    Rx(f64),
    /// Rotation around the Y axis.
    Ry(f64),
    /// Rotation around the Z axis.
    Rz(f64),
    /// Phase gate.
    P(f64),
    /// Universal single-qubit gate U(theta, phi, lambda).
    U(f64, f64, f64),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// SWAP gate.
    Swap,
    /// iSWAP gate.
    ISwap,
    /// Controlled phase gate.
    CP(f64),
    /// ZZ rotation gate.
    RZZ(f64),

    // Three-qubit gates
    /// Toffoli gate (CCX).
    CCX,
}

impl StandardGate {
    /// Get the OpenQASM-style name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(..) => "u",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::Swap => "swap",
            StandardGate::ISwap => "iswap",
            StandardGate::CP(_) => "cp",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::CCX => "ccx",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::SXdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::P(_)
            | StandardGate::U(..) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::Swap
            | StandardGate::ISwap
            | StandardGate::CP(_)
            | StandardGate::RZZ(_) => 2,

            StandardGate::CCX => 3,
        }
    }

    /// Get the inverse of this gate, if it is expressible as a single
    /// standard gate.
    pub fn inverse(&self) -> Option<StandardGate> {
        match self {
            StandardGate::I => Some(StandardGate::I),
            StandardGate::X => Some(StandardGate::X),
            StandardGate::Y => Some(StandardGate::Y),
            StandardGate::Z => Some(StandardGate::Z),
            StandardGate::H => Some(StandardGate::H),
            StandardGate::S => Some(StandardGate::Sdg),
            StandardGate::Sdg => Some(StandardGate::S),
            StandardGate::T => Some(StandardGate::Tdg),
            StandardGate::Tdg => Some(StandardGate::T),
            StandardGate::SX => Some(StandardGate::SXdg),
            StandardGate::SXdg => Some(StandardGate::SX),
            StandardGate::Rx(t) => Some(StandardGate::Rx(-t)),
            StandardGate::Ry(t) => Some(StandardGate::Ry(-t)),
            StandardGate::Rz(t) => Some(StandardGate::Rz(-t)),
            StandardGate::P(t) => Some(StandardGate::P(-t)),
            StandardGate::U(t, p, l) => Some(StandardGate::U(-t, -l, -p)),
            StandardGate::CX => Some(StandardGate::CX),
            StandardGate::CY => Some(StandardGate::CY),
            StandardGate::CZ => Some(StandardGate::CZ),
            StandardGate::Swap => Some(StandardGate::Swap),
            StandardGate::CP(t) => Some(StandardGate::CP(-t)),
            StandardGate::RZZ(t) => Some(StandardGate::RZZ(-t)),
            StandardGate::CCX => Some(StandardGate::CCX),
            StandardGate::ISwap => None,
        }
    }

    /// Check if this gate is its own inverse.
    pub fn is_self_inverse(&self) -> bool {
        matches!(
            self,
            StandardGate::I
                | StandardGate::X
                | StandardGate::Y
                | StandardGate::Z
                | StandardGate::H
                | StandardGate::CX
                | StandardGate::CY
                | StandardGate::CZ
                | StandardGate::Swap
                | StandardGate::CCX
        )
    }

    /// Check if this gate is symmetric under operand exchange.
    pub fn is_operand_symmetric(&self) -> bool {
        matches!(
            self,
            StandardGate::CZ | StandardGate::Swap | StandardGate::ISwap | StandardGate::CP(_) | StandardGate::RZZ(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_arity() {
        assert_eq!(StandardGate::H.name(), "h");
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::CCX.num_qubits(), 3);
        assert_eq!(StandardGate::Rz(1.0).name(), "rz");
    }

    #[test]
    fn test_inverse() {
        assert_eq!(StandardGate::S.inverse(), Some(StandardGate::Sdg));
        assert_eq!(StandardGate::Rx(0.5).inverse(), Some(StandardGate::Rx(-0.5)));
        assert_eq!(StandardGate::ISwap.inverse(), None);
        assert!(StandardGate::CX.is_self_inverse());
        assert!(!StandardGate::S.is_self_inverse());
    }

    #[test]
    fn test_operand_symmetry() {
        assert!(StandardGate::CZ.is_operand_symmetric());
        assert!(!StandardGate::CX.is_operand_symmetric());
    }
}
