//! Svalin Circuit Intermediate Representation
//!
//! Core data structures for representing quantum circuits: registers,
//! gates, instructions, and the ordered-operation [`Circuit`] value that
//! the Svalin transpiler consumes and produces.
//!
//! The circuit is deliberately simple: an ordered sequence of validated
//! instructions over a contiguous qubit index space. Compilation passes
//! read the sequence and produce rewritten sequences; there is no
//! graph-based mutation API to keep consistent.
//!
//! # Example
//!
//! ```rust
//! use svalin_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 2);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind, TimeUnit};
pub use qubit::{ClassicalRegister, ClbitId, QuantumRegister, QubitId};
