//! Preset pipelines for optimization levels 0 through 3.

use crate::coupling::CouplingMap;
use crate::durations::InstructionDurations;
use crate::error::{TranspileError, TranspileResult};
use crate::layout::Layout;
use crate::manager::{PassManager, PassManagerBuilder, Stage};
use crate::passes::{
    AlapSchedule, AsapSchedule, BasicRouting, BasisTranslation, CancelInverseGates, CheckMap,
    CommutativeCancellation, Decompose3q, DenseLayout, Optimize1qGates, ResynthesizeTwoQubitRuns,
    SabreLayout, SabreRouting, SetLayout, StochasticRouting, TrivialLayout,
};
use crate::target::TimingConstraints;

/// Known init method names.
pub const INIT_METHODS: &[&str] = &["default"];
/// Known layout method names.
pub const LAYOUT_METHODS: &[&str] = &["trivial", "dense", "sabre"];
/// Known routing method names.
pub const ROUTING_METHODS: &[&str] = &["basic", "stochastic", "sabre"];
/// Known translation method names.
pub const TRANSLATION_METHODS: &[&str] = &["translator"];
/// Known optimization method names.
pub const OPTIMIZATION_METHODS: &[&str] = &["default"];
/// Known scheduling method names.
pub const SCHEDULING_METHODS: &[&str] = &["asap", "alap"];

/// Validate a requested method name against a stage registry.
pub fn validate_method(stage: &'static str, method: &str) -> TranspileResult<()> {
    let (registry, known) = match stage {
        "init" => (INIT_METHODS, "default"),
        "layout" => (LAYOUT_METHODS, "trivial, dense, sabre"),
        "routing" => (ROUTING_METHODS, "basic, stochastic, sabre"),
        "translation" => (TRANSLATION_METHODS, "translator"),
        "optimization" => (OPTIMIZATION_METHODS, "default"),
        "scheduling" => (SCHEDULING_METHODS, "asap, alap"),
        _ => unreachable!("unknown stage registry"),
    };
    if registry.contains(&method) {
        Ok(())
    } else {
        Err(TranspileError::UnknownStageMethod {
            stage,
            method: method.to_owned(),
            known,
        })
    }
}

/// Everything a preset needs to wire a pipeline.
#[derive(Debug, Clone, Default)]
pub struct PassManagerConfig {
    /// Device connectivity; absence means all-to-all.
    pub coupling_map: Option<CouplingMap>,
    /// Target basis; empty means no translation.
    pub basis_gates: Vec<String>,
    /// Caller-chosen layout, installed ahead of the method pass.
    pub initial_layout: Option<Layout>,
    /// Duration table for scheduling.
    pub durations: Option<InstructionDurations>,
    /// Device alignment constraints.
    pub timing_constraints: TimingConstraints,
    /// Layout method override.
    pub layout_method: Option<String>,
    /// Routing method override.
    pub routing_method: Option<String>,
    /// Translation method override.
    pub translation_method: Option<String>,
    /// Scheduling method; `None` disables the stage.
    pub scheduling_method: Option<String>,
    /// Fidelity/gate-count tradeoff in `[0, 1]`, 1.0 is exact.
    pub approximation_degree: Option<f64>,
    /// Seed for every stochastic pass.
    pub seed: u64,
}

impl PassManagerConfig {
    fn validate_methods(&self) -> TranspileResult<()> {
        if let Some(m) = &self.layout_method {
            validate_method("layout", m)?;
        }
        if let Some(m) = &self.routing_method {
            validate_method("routing", m)?;
        }
        if let Some(m) = &self.translation_method {
            validate_method("translation", m)?;
        }
        if let Some(m) = &self.scheduling_method {
            validate_method("scheduling", m)?;
        }
        Ok(())
    }
}

/// Build the preset pipeline for an optimization level.
pub fn preset_pass_manager(
    level: u8,
    config: &PassManagerConfig,
) -> TranspileResult<PassManager> {
    if level > 3 {
        return Err(TranspileError::InvalidOptimizationLevel(level));
    }
    config.validate_methods()?;

    let mut builder = PassManager::builder().add_pass(Stage::Init, Box::new(Decompose3q));

    if let Some(coupling) = &config.coupling_map {
        builder = add_layout_stage(builder, config, coupling, level);
        builder = add_routing_stage(builder, config, coupling, level)?;
    }

    if !config.basis_gates.is_empty() {
        let mut translation = BasisTranslation::new(config.basis_gates.iter().cloned());
        if let Some(coupling) = &config.coupling_map {
            translation = translation.with_coupling(coupling.clone());
        }
        builder = builder.add_pass(Stage::Translation, Box::new(translation));
    }

    builder = add_optimization_stage(builder, config, level);

    if let Some(method) = &config.scheduling_method {
        let durations = config.durations.clone().ok_or_else(|| {
            TranspileError::InvalidConfiguration(
                "scheduling requested without instruction durations".to_owned(),
            )
        })?;
        let pass: Box<dyn crate::pass::Pass> = match method.as_str() {
            "alap" => Box::new(AlapSchedule::new(durations, config.timing_constraints)),
            _ => Box::new(AsapSchedule::new(durations, config.timing_constraints)),
        };
        builder = builder.add_pass(Stage::Scheduling, pass);
    }

    builder.finish()
}

fn add_layout_stage(
    mut builder: PassManagerBuilder,
    config: &PassManagerConfig,
    coupling: &CouplingMap,
    level: u8,
) -> PassManagerBuilder {
    if let Some(layout) = &config.initial_layout {
        builder = builder.add_pass(Stage::Layout, Box::new(SetLayout::new(layout.clone())));
    }
    let default = match level {
        0 | 1 => "trivial",
        2 => "dense",
        _ => "sabre",
    };
    let method = config.layout_method.as_deref().unwrap_or(default);
    let pass: Box<dyn crate::pass::Pass> = match method {
        "dense" => Box::new(DenseLayout::new(coupling.clone())),
        "sabre" => Box::new(SabreLayout::new(coupling.clone(), config.seed)),
        _ => Box::new(TrivialLayout),
    };
    builder.add_pass(Stage::Layout, pass)
}

fn add_routing_stage(
    mut builder: PassManagerBuilder,
    config: &PassManagerConfig,
    coupling: &CouplingMap,
    level: u8,
) -> TranspileResult<PassManagerBuilder> {
    builder = builder.add_pass(Stage::Routing, Box::new(CheckMap::new(coupling.clone())));
    let default = match level {
        0 | 1 => "basic",
        2 => "stochastic",
        _ => "sabre",
    };
    let method = config.routing_method.as_deref().unwrap_or(default);
    let pass: Box<dyn crate::pass::Pass> = match method {
        "stochastic" => Box::new(StochasticRouting::new(coupling.clone(), config.seed)),
        "sabre" => Box::new(SabreRouting::new(coupling.clone(), config.seed)),
        _ => Box::new(BasicRouting::new(coupling.clone())),
    };
    Ok(builder.add_pass(Stage::Routing, pass))
}

fn add_optimization_stage(
    mut builder: PassManagerBuilder,
    config: &PassManagerConfig,
    level: u8,
) -> PassManagerBuilder {
    if level == 0 {
        return builder;
    }
    builder = builder
        .add_pass(
            Stage::Optimization,
            Box::new(Optimize1qGates::new(config.basis_gates.iter().cloned())),
        )
        .add_pass(Stage::Optimization, Box::new(CancelInverseGates));
    if level >= 2 {
        builder = builder.add_pass(Stage::Optimization, Box::new(CommutativeCancellation));
    }
    if level >= 3 {
        builder = builder.add_pass(
            Stage::Optimization,
            Box::new(ResynthesizeTwoQubitRuns::new(config.approximation_degree)),
        );
    }
    let bound = match level {
        1 => 4,
        2 => 6,
        _ => 8,
    };
    builder.fixed_point(Stage::Optimization, bound)
}
