//! Pipeline assembly and execution.

use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::time::{Duration, Instant};
use svalin_ir::Circuit;
use tracing::{debug, instrument, trace};

use crate::error::{TranspileError, TranspileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// The fixed stage order of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Input normalization and early simplification.
    Init,
    /// Virtual-to-physical qubit assignment.
    Layout,
    /// SWAP insertion to satisfy the coupling map.
    Routing,
    /// Rewriting into the target basis.
    Translation,
    /// Gate-count and depth reduction.
    Optimization,
    /// Start-time assignment and delay insertion.
    Scheduling,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 6] = [
        Stage::Init,
        Stage::Layout,
        Stage::Routing,
        Stage::Translation,
        Stage::Optimization,
        Stage::Scheduling,
    ];

    /// Stable display name.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Layout => "layout",
            Stage::Routing => "routing",
            Stage::Translation => "translation",
            Stage::Optimization => "optimization",
            Stage::Scheduling => "scheduling",
        }
    }
}

/// Snapshot handed to the observer callback after each executed pass.
///
/// Observability only; the callback cannot alter the run.
pub struct PassEvent<'a> {
    /// Name of the pass that just ran.
    pub pass: &'static str,
    /// The circuit after the pass.
    pub circuit: &'a Circuit,
    /// Wall time the pass took.
    pub elapsed: Duration,
    /// The property set after the pass.
    pub properties: &'a PropertySet,
    /// How many times this pass has executed so far in this run.
    pub count: usize,
}

/// Observer invoked after every executed pass.
pub type PassCallback = dyn Fn(&PassEvent<'_>) + Send + Sync;

#[derive(Default)]
struct StagePasses {
    passes: Vec<Box<dyn Pass>>,
    /// Re-run the stage to a fixed point with this iteration bound.
    max_iterations: Option<usize>,
}

/// An ordered, validated sequence of compilation passes.
///
/// Assembled through [`PassManager::builder`]; `finish()` checks every
/// declared pass dependency against pipeline order, so a constructed
/// manager can only fail at run time inside a pass.
pub struct PassManager {
    stages: FxHashMap<Stage, StagePasses>,
}

impl fmt::Debug for PassManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassManager")
            .field("passes", &self.pass_names())
            .finish()
    }
}

impl PassManager {
    /// Start assembling a pipeline.
    pub fn builder() -> PassManagerBuilder {
        PassManagerBuilder {
            stages: FxHashMap::default(),
        }
    }

    /// Names of all passes, in execution order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        let mut names = vec![];
        for stage in Stage::ALL {
            if let Some(sp) = self.stages.get(&stage) {
                names.extend(sp.passes.iter().map(|p| p.name()));
            }
        }
        names
    }

    /// Run the pipeline over one circuit.
    ///
    /// Stages execute in their fixed order; a stage configured with an
    /// iteration bound re-runs until the circuit digest stabilizes or
    /// the bound is reached. Hitting the bound is normal termination.
    #[instrument(skip_all, fields(circuit = circuit.name()))]
    pub fn run(
        &self,
        circuit: &mut Circuit,
        props: &mut PropertySet,
        callback: Option<&PassCallback>,
    ) -> TranspileResult<()> {
        let mut counts: FxHashMap<&'static str, usize> = FxHashMap::default();

        for stage in Stage::ALL {
            let Some(sp) = self.stages.get(&stage) else {
                continue;
            };
            if sp.passes.is_empty() {
                continue;
            }

            let bound = sp.max_iterations.unwrap_or(1);
            let mut digest = circuit_digest(circuit);
            for iteration in 0..bound {
                trace!(stage = stage.name(), iteration, "running stage");
                self.run_stage(sp, circuit, props, callback, &mut counts)?;
                let next = circuit_digest(circuit);
                if next == digest {
                    break;
                }
                digest = next;
            }
        }
        Ok(())
    }

    fn run_stage(
        &self,
        sp: &StagePasses,
        circuit: &mut Circuit,
        props: &mut PropertySet,
        callback: Option<&PassCallback>,
        counts: &mut FxHashMap<&'static str, usize>,
    ) -> TranspileResult<()> {
        for pass in &sp.passes {
            if !pass.should_run(circuit, props) {
                debug!(pass = pass.name(), "skipped");
                continue;
            }

            let digest_before = circuit_digest(circuit);
            let start = Instant::now();
            pass.run(circuit, props)?;
            let elapsed = start.elapsed();

            if pass.kind() == PassKind::Transformation && circuit_digest(circuit) != digest_before
            {
                for name in pass.invalidates() {
                    props.invalidate(name);
                }
            }

            let count = counts.entry(pass.name()).or_insert(0);
            *count += 1;
            debug!(pass = pass.name(), ?elapsed, count = *count, "executed");

            if let Some(cb) = callback {
                cb(&PassEvent {
                    pass: pass.name(),
                    circuit,
                    elapsed,
                    properties: props,
                    count: *count,
                });
            }
        }
        Ok(())
    }
}

/// Cheap structural fingerprint used for fixed-point detection.
fn circuit_digest(circuit: &Circuit) -> (usize, usize, usize) {
    (
        circuit.num_ops(),
        circuit.depth(),
        circuit.two_qubit_gate_count(),
    )
}

/// Builder for [`PassManager`].
pub struct PassManagerBuilder {
    stages: FxHashMap<Stage, StagePasses>,
}

impl PassManagerBuilder {
    /// Append a pass to a stage.
    pub fn add_pass(mut self, stage: Stage, pass: Box<dyn Pass>) -> Self {
        self.stages.entry(stage).or_default().passes.push(pass);
        self
    }

    /// Re-run a stage to a fixed point, bounded by `max_iterations`.
    pub fn fixed_point(mut self, stage: Stage, max_iterations: usize) -> Self {
        self.stages.entry(stage).or_default().max_iterations = Some(max_iterations.max(1));
        self
    }

    /// Validate dependencies and produce the manager.
    ///
    /// Every name a pass declares in `requires()` must belong to a pass
    /// earlier in the pipeline (same stage counts when it is earlier in
    /// the stage's list).
    pub fn finish(self) -> TranspileResult<PassManager> {
        let mut seen: FxHashSet<&'static str> = FxHashSet::default();
        for stage in Stage::ALL {
            let Some(sp) = self.stages.get(&stage) else {
                continue;
            };
            for pass in &sp.passes {
                for &req in pass.requires() {
                    if !seen.contains(req) {
                        return Err(TranspileError::UnsatisfiedDependency {
                            pass: pass.name().to_owned(),
                            requires: req.to_owned(),
                        });
                    }
                }
                seen.insert(pass.name());
            }
        }
        Ok(PassManager {
            stages: self.stages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use svalin_ir::{Instruction, QubitId, StandardGate};

    struct MarkDone;

    impl Pass for MarkDone {
        fn name(&self) -> &'static str {
            "mark_done"
        }
        fn kind(&self) -> PassKind {
            PassKind::Analysis
        }
        fn run(&self, _circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()> {
            props.mark_valid(self.name());
            Ok(())
        }
    }

    struct NeedsMark;

    impl Pass for NeedsMark {
        fn name(&self) -> &'static str {
            "needs_mark"
        }
        fn kind(&self) -> PassKind {
            PassKind::Analysis
        }
        fn requires(&self) -> &'static [&'static str] {
            &["mark_done"]
        }
        fn run(&self, _circuit: &mut Circuit, _props: &mut PropertySet) -> TranspileResult<()> {
            Ok(())
        }
    }

    /// Removes one trailing X gate per invocation.
    struct PopOne;

    impl Pass for PopOne {
        fn name(&self) -> &'static str {
            "pop_one"
        }
        fn kind(&self) -> PassKind {
            PassKind::Transformation
        }
        fn invalidates(&self) -> &'static [&'static str] {
            &["mark_done"]
        }
        fn run(&self, circuit: &mut Circuit, _props: &mut PropertySet) -> TranspileResult<()> {
            let mut insts: Vec<Instruction> = circuit.instructions().to_vec();
            insts.pop();
            circuit.replace_instructions(insts)?;
            Ok(())
        }
        fn should_run(&self, circuit: &Circuit, _props: &PropertySet) -> bool {
            circuit.num_ops() > 0
        }
    }

    fn x_chain(n: usize) -> Circuit {
        let mut circuit = Circuit::with_size("chain", 1, 0);
        for _ in 0..n {
            circuit
                .push(Instruction::single_qubit_gate(StandardGate::X, QubitId(0)))
                .unwrap();
        }
        circuit
    }

    #[test]
    fn test_dependency_validation() {
        let err = PassManager::builder()
            .add_pass(Stage::Optimization, Box::new(NeedsMark))
            .finish()
            .unwrap_err();
        assert!(matches!(err, TranspileError::UnsatisfiedDependency { .. }));

        let pm = PassManager::builder()
            .add_pass(Stage::Init, Box::new(MarkDone))
            .add_pass(Stage::Optimization, Box::new(NeedsMark))
            .finish()
            .unwrap();
        assert_eq!(pm.pass_names(), vec!["mark_done", "needs_mark"]);
    }

    #[test]
    fn test_fixed_point_bound() {
        let pm = PassManager::builder()
            .add_pass(Stage::Optimization, Box::new(PopOne))
            .fixed_point(Stage::Optimization, 3)
            .finish()
            .unwrap();

        let mut circuit = x_chain(10);
        let mut props = PropertySet::new();
        pm.run(&mut circuit, &mut props, None).unwrap();
        // Bound of 3 iterations removes exactly 3 gates.
        assert_eq!(circuit.num_ops(), 7);
    }

    #[test]
    fn test_fixed_point_stabilizes() {
        let pm = PassManager::builder()
            .add_pass(Stage::Optimization, Box::new(PopOne))
            .fixed_point(Stage::Optimization, 100)
            .finish()
            .unwrap();

        let mut circuit = x_chain(2);
        let mut props = PropertySet::new();
        pm.run(&mut circuit, &mut props, None).unwrap();
        // Empty after 2 iterations; should_run stops the loop well
        // before the bound.
        assert_eq!(circuit.num_ops(), 0);
    }

    #[test]
    fn test_invalidation() {
        let pm = PassManager::builder()
            .add_pass(Stage::Init, Box::new(MarkDone))
            .add_pass(Stage::Optimization, Box::new(PopOne))
            .finish()
            .unwrap();

        let mut circuit = x_chain(1);
        let mut props = PropertySet::new();
        pm.run(&mut circuit, &mut props, None).unwrap();
        assert!(!props.is_valid("mark_done"));
    }

    #[test]
    fn test_callback_sees_every_execution() {
        let seen: Arc<Mutex<Vec<(String, usize)>>> = Arc::new(Mutex::new(vec![]));
        let pm = PassManager::builder()
            .add_pass(Stage::Optimization, Box::new(PopOne))
            .fixed_point(Stage::Optimization, 2)
            .finish()
            .unwrap();

        let mut circuit = x_chain(5);
        let mut props = PropertySet::new();
        let sink = Arc::clone(&seen);
        let cb = move |event: &PassEvent<'_>| {
            sink.lock()
                .unwrap()
                .push((event.pass.to_owned(), event.count));
        };
        pm.run(&mut circuit, &mut props, Some(&cb)).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![("pop_one".to_owned(), 1), ("pop_one".to_owned(), 2)]
        );
    }

    #[test]
    fn test_debug_lists_passes() {
        let pm = PassManager::builder()
            .add_pass(Stage::Init, Box::new(MarkDone))
            .add_pass(Stage::Optimization, Box::new(PopOne))
            .finish()
            .unwrap();
        let rendered = format!("{pm:?}");
        assert!(rendered.contains("mark_done"));
        assert!(rendered.contains("pop_one"));
    }
}
