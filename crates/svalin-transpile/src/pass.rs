//! The compilation pass interface.

use svalin_ir::Circuit;

use crate::error::TranspileResult;
use crate::property::PropertySet;

/// What a pass does to the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Reads the circuit and records results in the property set.
    Analysis,
    /// Rewrites the circuit.
    Transformation,
}

/// A single compilation pass.
///
/// Passes are stateless between runs: all per-run state lives in the
/// circuit and the [`PropertySet`]. Dependencies on earlier passes are
/// declared through [`requires`](Pass::requires) and checked when the
/// pipeline is assembled, not discovered at run time.
pub trait Pass: Send + Sync {
    /// Stable pass name, used in dependency declarations and callbacks.
    fn name(&self) -> &'static str;

    /// Whether this pass analyzes or transforms.
    fn kind(&self) -> PassKind;

    /// Names of passes that must appear earlier in the pipeline.
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }

    /// Names of analysis results this pass makes stale when it changes
    /// the circuit.
    fn invalidates(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether re-running on an already-processed circuit is a no-op.
    fn is_idempotent(&self) -> bool {
        true
    }

    /// Execute the pass.
    fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()>;

    /// Whether the pass applies to this circuit in its current state.
    fn should_run(&self, _circuit: &Circuit, _props: &PropertySet) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountOps;

    impl Pass for CountOps {
        fn name(&self) -> &'static str {
            "count_ops"
        }

        fn kind(&self) -> PassKind {
            PassKind::Analysis
        }

        fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()> {
            props.set(circuit.num_ops());
            props.mark_valid(self.name());
            Ok(())
        }
    }

    #[test]
    fn test_defaults() {
        let pass = CountOps;
        assert!(pass.requires().is_empty());
        assert!(pass.invalidates().is_empty());
        assert!(pass.is_idempotent());

        let mut circuit = Circuit::ghz(2).unwrap();
        let mut props = PropertySet::new();
        assert!(pass.should_run(&circuit, &props));
        pass.run(&mut circuit, &mut props).unwrap();
        assert_eq!(props.get::<usize>(), Some(&4));
        assert!(props.is_valid("count_ops"));
    }
}
