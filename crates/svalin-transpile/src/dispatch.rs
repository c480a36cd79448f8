//! Batch execution over worker threads.

use rayon::prelude::*;
use svalin_ir::Circuit;
use tracing::debug;

use crate::config::SharedConfig;
use crate::error::{TranspileError, TranspileResult};

/// Whether a batch may fan out over worker threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
    /// Fan out one task per circuit.
    #[default]
    Enabled,
    /// Process the batch on the calling thread.
    Disabled,
    /// Already inside a worker; never nest.
    InWorker,
}

/// Execution context handed down with a batch.
///
/// Passed explicitly instead of being read from ambient process state,
/// so nesting is visible in the call graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchContext {
    /// Fan-out policy for this batch.
    pub parallelism: Parallelism,
}

impl DispatchContext {
    /// Context handed to per-circuit workers.
    fn worker() -> Self {
        Self {
            parallelism: Parallelism::InWorker,
        }
    }
}

/// Run one worker function over every circuit of a batch.
///
/// The shared configuration is read-only and shared by reference;
/// per-circuit task data moves into its task. Output order always
/// matches input order, and when several circuits fail the error for
/// the lowest input index is returned.
pub fn run_batch<C, F>(
    circuits: Vec<Circuit>,
    shared: &SharedConfig,
    configs: Vec<C>,
    ctx: DispatchContext,
    worker: F,
) -> TranspileResult<Vec<Circuit>>
where
    C: Send,
    F: Fn(Circuit, &SharedConfig, &C, DispatchContext) -> TranspileResult<Circuit> + Sync,
{
    debug_assert_eq!(circuits.len(), configs.len());
    let parallel = ctx.parallelism == Parallelism::Enabled && circuits.len() > 1;

    let wrap = |index: usize, result: TranspileResult<Circuit>| {
        result.map_err(|e| TranspileError::CircuitFailed {
            index,
            source: Box::new(e),
        })
    };

    if !parallel {
        debug!(circuits = circuits.len(), "dispatching serially");
        let mut out = Vec::with_capacity(circuits.len());
        for (index, (circuit, config)) in circuits.into_iter().zip(&configs).enumerate() {
            out.push(wrap(index, worker(circuit, shared, config, ctx))?);
        }
        return Ok(out);
    }

    debug!(circuits = circuits.len(), "dispatching in parallel");
    let results: Vec<TranspileResult<Circuit>> = circuits
        .into_par_iter()
        .zip(configs.into_par_iter())
        .enumerate()
        .map(|(index, (circuit, config))| {
            wrap(
                index,
                worker(circuit, shared, &config, DispatchContext::worker()),
            )
        })
        .collect();

    // Collected in input order, so the first error is the lowest index.
    results.into_iter().collect()
}
