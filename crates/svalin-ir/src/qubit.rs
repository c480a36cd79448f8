//! Qubit and classical bit identifiers and registers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a virtual qubit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// Index of a classical bit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClbitId(pub u32);

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for ClbitId {
    fn from(id: u32) -> Self {
        ClbitId(id)
    }
}

/// A named block of qubits.
///
/// Registers partition a circuit's contiguous qubit index space; the
/// `offset` is the global index of the register's first bit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumRegister {
    /// Register name.
    pub name: String,
    /// Number of qubits in the register.
    pub size: u32,
    /// Global index of the first qubit.
    pub offset: u32,
}

impl QuantumRegister {
    /// Global qubit id of bit `index` within this register.
    pub fn bit(&self, index: u32) -> Option<QubitId> {
        (index < self.size).then(|| QubitId(self.offset + index))
    }

    /// Iterate over the global qubit ids of this register.
    pub fn bits(&self) -> impl Iterator<Item = QubitId> + '_ {
        (self.offset..self.offset + self.size).map(QubitId)
    }
}

/// A named block of classical bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicalRegister {
    /// Register name.
    pub name: String,
    /// Number of bits in the register.
    pub size: u32,
    /// Global index of the first bit.
    pub offset: u32,
}

impl ClassicalRegister {
    /// Global clbit id of bit `index` within this register.
    pub fn bit(&self, index: u32) -> Option<ClbitId> {
        (index < self.size).then(|| ClbitId(self.offset + index))
    }

    /// Iterate over the global clbit ids of this register.
    pub fn bits(&self) -> impl Iterator<Item = ClbitId> + '_ {
        (self.offset..self.offset + self.size).map(ClbitId)
    }
}
