//! Argument resolution: options, target, and backend collapse into one
//! validated configuration before any pass runs.

use svalin_ir::{Circuit, TimeUnit};
use tracing::{debug, warn};

use crate::config::{
    CircuitConfig, CouplingSpec, DurationsSpec, LayoutSpec, OutputName, SharedConfig,
    TranspileOptions,
};
use crate::coupling::CouplingMap;
use crate::durations::InstructionDurations;
use crate::error::{TranspileError, TranspileResult};
use crate::layout::Layout;
use crate::preset::validate_method;
use crate::target::TargetView;

/// Collapse caller options into shared and per-circuit configuration.
///
/// Precedence per constraint: explicit argument, then the target, then
/// the backend's capability view. Every validation here is eager: a
/// bad configuration never reaches a pass.
pub fn resolve(
    circuits: &[Circuit],
    options: &TranspileOptions,
) -> TranspileResult<(SharedConfig, Vec<CircuitConfig>)> {
    let level = options.optimization_level.unwrap_or(1);
    if level > 3 {
        return Err(TranspileError::InvalidOptimizationLevel(level));
    }

    if let Some(degree) = options.approximation_degree {
        if !(0.0..=1.0).contains(&degree) {
            return Err(TranspileError::InvalidConfiguration(format!(
                "approximation_degree must be in [0.0, 1.0], got {degree}"
            )));
        }
    }

    if let Some(m) = &options.layout_method {
        validate_method("layout", m)?;
    }
    if let Some(m) = &options.routing_method {
        validate_method("routing", m)?;
    }
    if let Some(m) = &options.translation_method {
        validate_method("translation", m)?;
    }
    if let Some(m) = &options.scheduling_method {
        validate_method("scheduling", m)?;
    }
    if let Some(m) = &options.init_method {
        validate_method("init", m)?;
    }
    if let Some(m) = &options.optimization_method {
        validate_method("optimization", m)?;
    }

    if options.initial_layout.is_some() && options.layout_method.is_some() {
        warn!("initial_layout provided; layout_method is ignored");
    }

    let target_view: Option<&dyn TargetView> =
        options.target.as_ref().map(|t| t as &dyn TargetView);
    let backend_view: Option<&dyn TargetView> = options.backend.as_deref();
    let views = [target_view, backend_view];

    let basis_gates: Vec<String> = options
        .basis_gates
        .clone()
        .or_else(|| {
            views
                .iter()
                .flatten()
                .map(|v| v.basis_gates().to_vec())
                .find(|b| !b.is_empty())
        })
        .unwrap_or_default();

    let coupling_map: Option<CouplingMap> = match &options.coupling_map {
        Some(CouplingSpec::Explicit(map)) => Some(map.clone()),
        Some(CouplingSpec::Edges(edges)) => Some(CouplingMap::from_edges(edges.iter().copied())),
        None => from_views(&views, |v| v.coupling_map().cloned()),
    };

    let dt = options.dt.or_else(|| from_views(&views, |v| v.dt()));

    let explicit_durations = options.instruction_durations.as_ref().map(|spec| match spec {
        DurationsSpec::Table(table) => table.clone(),
        DurationsSpec::Tuples(tuples) => InstructionDurations::from_tuples(
            tuples.iter().map(|(name, qubits, duration, unit)| {
                // Unit-less duration entries are in dt.
                (
                    name.clone(),
                    qubits.clone(),
                    *duration,
                    unit.unwrap_or(TimeUnit::Dt),
                )
            }),
            dt,
        ),
    });
    let durations = match (from_views(&views, |v| v.durations().cloned()), explicit_durations) {
        (Some(mut base), Some(explicit)) => {
            base.update(&explicit);
            Some(base)
        }
        (base, explicit) => explicit.or(base),
    }
    .map(|mut table| {
        if table.dt().is_none() {
            table.set_dt(dt);
        }
        table
    });

    if options.scheduling_method.is_some() && durations.is_none() {
        return Err(TranspileError::InvalidConfiguration(
            "scheduling_method requires instruction durations, a target, or a backend with \
             duration data"
                .to_owned(),
        ));
    }

    let timing_constraints = options
        .timing_constraints
        .or_else(|| views.iter().flatten().next().map(|v| v.timing_constraints()))
        .unwrap_or_default();

    let available_qubits = coupling_map
        .as_ref()
        .map(|c| c.num_qubits())
        .or_else(|| views.iter().flatten().next().map(|v| v.num_qubits()));

    let output_names = resolve_output_names(options.output_name.as_ref(), circuits.len())?;

    let shared = SharedConfig {
        optimization_level: level,
        basis_gates,
        seed: options.seed.unwrap_or(0),
        init_method: options.init_method.clone(),
        optimization_method: options.optimization_method.clone(),
    };

    let mut per_circuit = Vec::with_capacity(circuits.len());
    for (circuit, output_name) in circuits.iter().zip(output_names) {
        let width = circuit.num_qubits();
        if let Some(available) = available_qubits {
            if width > available {
                return Err(TranspileError::CircuitTooWide {
                    circuit: circuit.name().to_owned(),
                    required: width,
                    available,
                });
            }
        }

        let device = available_qubits.unwrap_or(width);
        let initial_layout = options
            .initial_layout
            .as_ref()
            .map(|spec| resolve_layout(spec, width, device))
            .transpose()?;

        per_circuit.push(CircuitConfig {
            coupling_map: coupling_map.clone(),
            initial_layout,
            durations: durations.clone(),
            timing_constraints,
            output_name,
            approximation_degree: options.approximation_degree,
            layout_method: options.layout_method.clone(),
            routing_method: options.routing_method.clone(),
            translation_method: options.translation_method.clone(),
            scheduling_method: options.scheduling_method.clone(),
            callback: options.callback.clone(),
        });
    }

    debug!(
        circuits = circuits.len(),
        level = shared.optimization_level,
        "resolved transpiler configuration"
    );
    Ok((shared, per_circuit))
}

/// First view (target before backend) that answers for a field.
fn from_views<'a, T>(
    views: &[Option<&'a dyn TargetView>],
    f: impl Fn(&'a dyn TargetView) -> Option<T>,
) -> Option<T> {
    views.iter().flatten().find_map(|v| f(*v))
}

fn resolve_output_names(
    spec: Option<&OutputName>,
    count: usize,
) -> TranspileResult<Vec<Option<String>>> {
    match spec {
        None => Ok(vec![None; count]),
        Some(OutputName::Single(name)) => {
            if count > 1 {
                return Err(TranspileError::InvalidConfiguration(format!(
                    "Expected a list object as the output_name argument for {count} circuits"
                )));
            }
            Ok(vec![Some(name.clone())])
        }
        Some(OutputName::PerCircuit(names)) => {
            if names.len() != count {
                return Err(TranspileError::InvalidConfiguration(format!(
                    "The length of output_name list ({}) does not match the number of \
                     transpiled circuits ({count})",
                    names.len()
                )));
            }
            Ok(names.iter().cloned().map(Some).collect())
        }
    }
}

fn resolve_layout(spec: &LayoutSpec, width: u32, device: u32) -> TranspileResult<Layout> {
    let layout = match spec {
        LayoutSpec::Layout(layout) => layout.clone(),
        LayoutSpec::PhysicalList(physical) => {
            Layout::from_physical_list(physical, width, device)?
        }
        LayoutSpec::VirtualMap(pairs) => Layout::from_virtual_map(pairs.iter().copied())?,
    };
    if !layout.is_complete(width) {
        return Err(TranspileError::InvalidConfiguration(format!(
            "initial_layout covers {} qubits but the circuit has {width}",
            layout.len()
        )));
    }
    if let Some(bad) = layout.as_physical_list().iter().find(|&&p| p >= device) {
        return Err(TranspileError::InvalidConfiguration(format!(
            "initial_layout assigns physical qubit {bad} but the device has {device} qubits"
        )));
    }
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;
    use std::sync::Arc;
    use svalin_ir::QubitId;

    fn ghz2() -> Vec<Circuit> {
        vec![Circuit::ghz(2).unwrap()]
    }

    #[test]
    fn test_defaults() {
        let (shared, configs) = resolve(&ghz2(), &TranspileOptions::default()).unwrap();
        assert_eq!(shared.optimization_level, 1);
        assert_eq!(shared.seed, 0);
        assert_eq!(configs.len(), 1);
        assert!(configs[0].coupling_map.is_none());
    }

    #[test]
    fn test_level_out_of_range() {
        let options = TranspileOptions {
            optimization_level: Some(4),
            ..Default::default()
        };
        let err = resolve(&ghz2(), &options).unwrap_err();
        assert!(matches!(err, TranspileError::InvalidOptimizationLevel(4)));
    }

    #[test]
    fn test_approximation_degree_range() {
        let options = TranspileOptions {
            approximation_degree: Some(1.5),
            ..Default::default()
        };
        assert!(matches!(
            resolve(&ghz2(), &options).unwrap_err(),
            TranspileError::InvalidConfiguration(_)
        ));
    }

    #[test]
    fn test_width_precheck() {
        let options = TranspileOptions {
            coupling_map: Some(CouplingSpec::Explicit(CouplingMap::linear(3))),
            ..Default::default()
        };
        let wide = vec![Circuit::ghz(5).unwrap()];
        let err = resolve(&wide, &options).unwrap_err();
        assert!(matches!(
            err,
            TranspileError::CircuitTooWide {
                required: 5,
                available: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_width_precheck_against_backend() {
        let backend = Target::builder(2).basis_gates(["cx"]).build();
        let options = TranspileOptions {
            backend: Some(Arc::new(backend)),
            ..Default::default()
        };
        let wide = vec![Circuit::ghz(3).unwrap()];
        assert!(matches!(
            resolve(&wide, &options).unwrap_err(),
            TranspileError::CircuitTooWide { .. }
        ));
    }

    #[test]
    fn test_explicit_basis_beats_target() {
        let target = Target::builder(4).basis_gates(["u", "cx"]).build();
        let options = TranspileOptions {
            target: Some(target),
            basis_gates: Some(vec!["rz".into(), "sx".into(), "cx".into()]),
            ..Default::default()
        };
        let (shared, _) = resolve(&ghz2(), &options).unwrap();
        assert_eq!(shared.basis_gates, vec!["rz", "sx", "cx"]);
    }

    #[test]
    fn test_target_beats_backend() {
        let target = Target::builder(4).basis_gates(["u", "cx"]).build();
        let backend = Target::builder(4).basis_gates(["rz", "cx"]).build();
        let options = TranspileOptions {
            target: Some(target),
            backend: Some(Arc::new(backend)),
            ..Default::default()
        };
        let (shared, _) = resolve(&ghz2(), &options).unwrap();
        assert_eq!(shared.basis_gates, vec!["u", "cx"]);
    }

    #[test]
    fn test_output_name_single_with_many() {
        let options = TranspileOptions {
            output_name: Some(OutputName::Single("only".to_owned())),
            ..Default::default()
        };
        let two = vec![Circuit::ghz(2).unwrap(), Circuit::ghz(3).unwrap()];
        assert!(matches!(
            resolve(&two, &options).unwrap_err(),
            TranspileError::InvalidConfiguration(_)
        ));
    }

    #[test]
    fn test_output_name_list_length() {
        let options = TranspileOptions {
            output_name: Some(OutputName::PerCircuit(vec!["a".to_owned()])),
            ..Default::default()
        };
        let two = vec![Circuit::ghz(2).unwrap(), Circuit::ghz(3).unwrap()];
        assert!(matches!(
            resolve(&two, &options).unwrap_err(),
            TranspileError::InvalidConfiguration(_)
        ));

        let ok = TranspileOptions {
            output_name: Some(OutputName::PerCircuit(vec!["a".into(), "b".into()])),
            ..Default::default()
        };
        let (_, configs) = resolve(&two, &ok).unwrap();
        assert_eq!(configs[0].output_name.as_deref(), Some("a"));
        assert_eq!(configs[1].output_name.as_deref(), Some("b"));
    }

    #[test]
    fn test_initial_layout_duplicate() {
        let options = TranspileOptions {
            coupling_map: Some(CouplingSpec::Explicit(CouplingMap::linear(3))),
            initial_layout: Some(LayoutSpec::PhysicalList(vec![1, 1])),
            ..Default::default()
        };
        assert!(matches!(
            resolve(&ghz2(), &options).unwrap_err(),
            TranspileError::InvalidConfiguration(_)
        ));
    }

    #[test]
    fn test_initial_layout_virtual_map() {
        let options = TranspileOptions {
            coupling_map: Some(CouplingSpec::Explicit(CouplingMap::linear(3))),
            initial_layout: Some(LayoutSpec::VirtualMap(vec![
                (QubitId(0), 2),
                (QubitId(1), 0),
            ])),
            ..Default::default()
        };
        let (_, configs) = resolve(&ghz2(), &options).unwrap();
        let layout = configs[0].initial_layout.as_ref().unwrap();
        assert_eq!(layout.physical(QubitId(0)), Some(2));
    }

    #[test]
    fn test_scheduling_without_durations() {
        let options = TranspileOptions {
            scheduling_method: Some("asap".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            resolve(&ghz2(), &options).unwrap_err(),
            TranspileError::InvalidConfiguration(_)
        ));
    }

    #[test]
    fn test_duration_tuples_default_to_dt() {
        let options = TranspileOptions {
            instruction_durations: Some(DurationsSpec::Tuples(vec![(
                "h".to_owned(),
                vec![],
                160.0,
                None,
            )])),
            ..Default::default()
        };
        let (_, configs) = resolve(&ghz2(), &options).unwrap();
        let table = configs[0].durations.as_ref().unwrap();
        assert_eq!(table.raw("h", &[0]), Some((160.0, TimeUnit::Dt)));
    }

    #[test]
    fn test_explicit_durations_override_target() {
        let table = InstructionDurations::from_tuples(
            [("cx".to_owned(), vec![], 300.0, TimeUnit::Dt)],
            Some(1.0e-9),
        );
        let target = Target::builder(4).durations(table).build();
        let options = TranspileOptions {
            target: Some(target),
            instruction_durations: Some(DurationsSpec::Tuples(vec![(
                "cx".to_owned(),
                vec![],
                250.0,
                None,
            )])),
            ..Default::default()
        };
        let (_, configs) = resolve(&ghz2(), &options).unwrap();
        let merged = configs[0].durations.as_ref().unwrap();
        assert_eq!(merged.raw("cx", &[0, 1]), Some((250.0, TimeUnit::Dt)));
        assert_eq!(merged.dt(), Some(1.0e-9));
    }

    #[test]
    fn test_initial_layout_wins_over_layout_method() {
        let options = TranspileOptions {
            coupling_map: Some(CouplingSpec::Explicit(CouplingMap::linear(3))),
            initial_layout: Some(LayoutSpec::PhysicalList(vec![2, 0])),
            layout_method: Some("dense".to_owned()),
            ..Default::default()
        };
        let (_, configs) = resolve(&ghz2(), &options).unwrap();
        let layout = configs[0].initial_layout.as_ref().unwrap();
        assert_eq!(layout.physical(QubitId(0)), Some(2));
        assert_eq!(layout.physical(QubitId(1)), Some(0));
    }

    #[test]
    fn test_unknown_init_and_optimization_methods_eager() {
        let options = TranspileOptions {
            init_method: Some("aggressive".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            resolve(&ghz2(), &options).unwrap_err(),
            TranspileError::UnknownStageMethod { stage: "init", .. }
        ));

        let options = TranspileOptions {
            optimization_method: Some("exhaustive".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            resolve(&ghz2(), &options).unwrap_err(),
            TranspileError::UnknownStageMethod {
                stage: "optimization",
                ..
            }
        ));

        let options = TranspileOptions {
            init_method: Some("default".to_owned()),
            optimization_method: Some("default".to_owned()),
            ..Default::default()
        };
        assert!(resolve(&ghz2(), &options).is_ok());
    }

    #[test]
    fn test_unknown_method_eager() {
        let options = TranspileOptions {
            layout_method: Some("densest".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            resolve(&ghz2(), &options).unwrap_err(),
            TranspileError::UnknownStageMethod { stage: "layout", .. }
        ));
    }
}
