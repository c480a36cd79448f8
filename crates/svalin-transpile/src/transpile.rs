//! Top-level transpilation entry points.

use std::sync::Arc;
use std::time::Instant;
use svalin_ir::Circuit;
use tracing::info;

use crate::config::{CircuitConfig, SharedConfig, TranspileOptions};
use crate::dispatch::{run_batch, DispatchContext};
use crate::error::{TranspileError, TranspileResult};
use crate::layout::Layout;
use crate::manager::PassManager;
use crate::preset::{preset_pass_manager, PassManagerConfig};
use crate::property::PropertySet;
use crate::resolver::resolve;

/// Transpile one circuit for a target.
pub fn transpile(circuit: Circuit, options: &TranspileOptions) -> TranspileResult<Circuit> {
    let mut out = transpile_batch(vec![circuit], options)?;
    out.pop().ok_or_else(|| {
        TranspileError::InvalidConfiguration("batch produced no output circuit".to_owned())
    })
}

/// Transpile a batch of circuits sharing one configuration.
///
/// Output order matches input order. Workers fan out over threads for
/// batches of more than one circuit.
pub fn transpile_batch(
    circuits: Vec<Circuit>,
    options: &TranspileOptions,
) -> TranspileResult<Vec<Circuit>> {
    transpile_batch_with(circuits, options, DispatchContext::default())
}

/// [`transpile_batch`] with an explicit dispatch context.
pub fn transpile_batch_with(
    circuits: Vec<Circuit>,
    options: &TranspileOptions,
    ctx: DispatchContext,
) -> TranspileResult<Vec<Circuit>> {
    if circuits.is_empty() {
        return Ok(vec![]);
    }
    let start = Instant::now();
    let count = circuits.len();

    let (shared, configs) = resolve(&circuits, options)?;
    let shared = Arc::new(shared);

    // One pipeline per unique configuration. Configs of a batch only
    // diverge in the resolved initial layout (circuit widths differ)
    // and the output name, which the pipeline never sees.
    let mut built: Vec<(Option<Layout>, Arc<PassManager>)> = vec![];
    let mut tasks: Vec<(CircuitConfig, Arc<PassManager>)> = Vec::with_capacity(configs.len());
    for config in configs {
        let manager = match built.iter().find(|(l, _)| *l == config.initial_layout) {
            Some((_, manager)) => Arc::clone(manager),
            None => {
                let manager = Arc::new(build_manager(&shared, &config)?);
                built.push((config.initial_layout.clone(), Arc::clone(&manager)));
                manager
            }
        };
        tasks.push((config, manager));
    }

    let out = run_batch(
        circuits,
        &shared,
        tasks,
        ctx,
        |circuit, _, (config, manager), _| transpile_one(circuit, config, manager),
    )?;

    info!(
        circuits = count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "transpilation complete"
    );
    Ok(out)
}

/// Build the preset pipeline for one resolved configuration.
fn build_manager(shared: &SharedConfig, config: &CircuitConfig) -> TranspileResult<PassManager> {
    let pm_config = PassManagerConfig {
        coupling_map: config.coupling_map.clone(),
        basis_gates: shared.basis_gates.clone(),
        initial_layout: config.initial_layout.clone(),
        durations: config.durations.clone(),
        timing_constraints: config.timing_constraints,
        layout_method: config.layout_method.clone(),
        routing_method: config.routing_method.clone(),
        translation_method: config.translation_method.clone(),
        scheduling_method: config.scheduling_method.clone(),
        approximation_degree: config.approximation_degree,
        seed: shared.seed,
    };
    preset_pass_manager(shared.optimization_level, &pm_config)
}

/// Run the preset pipeline over one circuit.
fn transpile_one(
    mut circuit: Circuit,
    config: &CircuitConfig,
    manager: &PassManager,
) -> TranspileResult<Circuit> {
    let mut props = PropertySet::new();
    manager.run(&mut circuit, &mut props, config.callback.as_deref())?;

    if let Some(name) = &config.output_name {
        circuit.set_name(name.clone());
    }
    Ok(circuit)
}
