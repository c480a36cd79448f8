//! Error types for the transpilation pipeline.

use thiserror::Error;

/// Errors that can occur during transpilation.
///
/// Configuration errors are detected eagerly, before or during pipeline
/// construction. Pass errors abort the run for the affected circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TranspileError {
    /// Invalid or conflicting configuration arguments.
    #[error("Invalid transpiler configuration: {0}")]
    InvalidConfiguration(String),

    /// Circuit is wider than the target device.
    #[error(
        "Number of qubits ({required}) in '{circuit}' is greater than maximum ({available}) in the coupling map"
    )]
    CircuitTooWide {
        /// Circuit name.
        circuit: String,
        /// Qubits the circuit needs.
        required: u32,
        /// Qubits the device has.
        available: u32,
    },

    /// Unknown method name requested for a pipeline stage.
    #[error("Unknown {stage} method '{method}' (expected one of: {known})")]
    UnknownStageMethod {
        /// Stage the method was requested for.
        stage: &'static str,
        /// The unknown method name.
        method: String,
        /// Comma-separated known method names.
        known: &'static str,
    },

    /// Optimization level outside the supported 0-3 range.
    #[error("optimization_level can range from 0 to 3, got {0}")]
    InvalidOptimizationLevel(u8),

    /// A pass was run without its declared preconditions satisfied.
    #[error("Pass '{pass}' precondition violated: {reason}")]
    PassPrecondition {
        /// Name of the failing pass.
        pass: &'static str,
        /// What was missing.
        reason: String,
    },

    /// Pipeline declared a pass dependency that is not satisfied by order.
    #[error("Pass '{pass}' requires '{requires}' to run earlier in the pipeline")]
    UnsatisfiedDependency {
        /// The dependent pass.
        pass: String,
        /// The missing predecessor.
        requires: String,
    },

    /// No routing path exists between two physical qubits.
    #[error("No path between physical qubits {0} and {1} in the coupling map")]
    RoutingFailed(u32, u32),

    /// Gate cannot be rewritten into the target basis.
    #[error("No translation rule reaches basis {basis:?} for gate '{gate}'")]
    TranslationFailed {
        /// The untranslatable gate.
        gate: &'static str,
        /// The target basis.
        basis: Vec<String>,
    },

    /// Instruction durations could not be reconciled into one unit domain.
    #[error("Cannot resolve duration of '{name}' on qubits {qubits:?}: {reason}")]
    DurationUnresolved {
        /// Instruction name.
        name: String,
        /// Qubit operands.
        qubits: Vec<u32>,
        /// Why resolution failed.
        reason: String,
    },

    /// One circuit of a batch failed, attributed to its input index.
    #[error("Transpilation of circuit {index} failed: {source}")]
    CircuitFailed {
        /// Original input index of the failing circuit.
        index: usize,
        /// The underlying failure.
        #[source]
        source: Box<TranspileError>,
    },

    /// Error from the circuit IR layer.
    #[error(transparent)]
    Ir(#[from] svalin_ir::IrError),
}

/// Result type for transpiler operations.
pub type TranspileResult<T> = Result<T, TranspileError>;
