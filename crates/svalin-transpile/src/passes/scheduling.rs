//! Instruction scheduling passes.

use rustc_hash::FxHashMap;
use svalin_ir::{Circuit, ClbitId, Instruction, InstructionKind, QubitId, TimeUnit};
use tracing::debug;

use crate::durations::InstructionDurations;
use crate::error::{TranspileError, TranspileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;
use crate::target::TimingConstraints;

/// Scheduling result stored in the property set.
///
/// `start_times` is parallel to the rewritten instruction list, delays
/// included.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    /// Start time of every instruction.
    pub start_times: Vec<f64>,
    /// Unit domain all times are expressed in.
    pub unit: TimeUnit,
    /// Total circuit duration.
    pub duration: f64,
}

/// Pick the single unit domain every duration resolves in.
///
/// Prefers `dt`; falls back to seconds when `dt` conversion is
/// impossible but all entries agree on seconds. Mixed domains without a
/// conversion factor are an error.
fn resolve_unit(
    circuit: &Circuit,
    durations: &InstructionDurations,
) -> TranspileResult<TimeUnit> {
    let mut dt_error = None;
    for unit in [TimeUnit::Dt, TimeUnit::Seconds] {
        let ok = circuit
            .instructions()
            .iter()
            .try_for_each(|inst| duration_of(inst, durations, unit).map(|_| ()));
        match ok {
            Ok(()) => return Ok(unit),
            Err(e) if dt_error.is_none() => dt_error = Some(e),
            Err(_) => {}
        }
    }
    Err(dt_error.unwrap_or_else(|| TranspileError::InvalidConfiguration(
        "scheduling requires instruction durations".to_owned(),
    )))
}

fn duration_of(
    inst: &Instruction,
    durations: &InstructionDurations,
    unit: TimeUnit,
) -> TranspileResult<f64> {
    match &inst.kind {
        InstructionKind::Barrier => Ok(0.0),
        InstructionKind::Delay {
            duration,
            unit: own,
        } => durations
            .convert(*duration, *own, unit)
            .map_err(|reason| TranspileError::DurationUnresolved {
                name: "delay".to_owned(),
                qubits: inst.qubits.iter().map(|q| q.0).collect(),
                reason,
            }),
        _ => {
            let qubits: Vec<u32> = inst.qubits.iter().map(|q| q.0).collect();
            durations.get(inst.name(), &qubits, unit)
        }
    }
}

fn align_up(time: f64, alignment: u32) -> f64 {
    let a = f64::from(alignment.max(1));
    ((time / a) - 1e-9).ceil().max(0.0) * a
}

fn alignment_for(inst: &Instruction, constraints: &TimingConstraints) -> u32 {
    if inst.is_measure() {
        constraints.acquire_alignment
    } else {
        constraints.pulse_alignment
    }
}

/// Forward placement with optional per-instruction earliest-start
/// targets (used by the as-late-as-possible variant).
fn place_forward(
    circuit: &Circuit,
    durations: &InstructionDurations,
    constraints: &TimingConstraints,
    unit: TimeUnit,
    desired_start: Option<&[f64]>,
) -> TranspileResult<(Vec<Instruction>, Schedule)> {
    let align = unit == TimeUnit::Dt;
    let mut qubit_avail: FxHashMap<QubitId, f64> = FxHashMap::default();
    let mut clbit_avail: FxHashMap<ClbitId, f64> = FxHashMap::default();
    let mut out = Vec::with_capacity(circuit.num_ops());
    let mut starts = Vec::with_capacity(circuit.num_ops());
    let mut makespan = 0.0f64;

    for (idx, inst) in circuit.instructions().iter().enumerate() {
        let dur = duration_of(inst, durations, unit)?;
        let ready = inst
            .qubits
            .iter()
            .map(|q| qubit_avail.get(q).copied().unwrap_or(0.0))
            .chain(
                inst.clbits
                    .iter()
                    .map(|c| clbit_avail.get(c).copied().unwrap_or(0.0)),
            )
            .fold(0.0f64, f64::max);
        let mut start = match desired_start {
            Some(times) => ready.max(times[idx]),
            None => ready,
        };
        if align && !inst.is_barrier() {
            start = align_up(start, alignment_for(inst, constraints));
        }

        // Fill idle gaps so every wire is explicitly occupied.
        if !inst.is_barrier() {
            for &q in &inst.qubits {
                let avail = qubit_avail.get(&q).copied().unwrap_or(0.0);
                if start - avail > 1e-9 {
                    out.push(Instruction::delay(q, start - avail, unit));
                    starts.push(avail);
                }
            }
        }

        for &q in &inst.qubits {
            qubit_avail.insert(q, start + dur);
        }
        for &c in &inst.clbits {
            clbit_avail.insert(c, start + dur);
        }
        makespan = makespan.max(start + dur);
        out.push(inst.clone());
        starts.push(start);
    }

    Ok((
        out,
        Schedule {
            start_times: starts,
            unit,
            duration: makespan,
        },
    ))
}

fn run_schedule(
    circuit: &mut Circuit,
    props: &mut PropertySet,
    durations: &InstructionDurations,
    constraints: &TimingConstraints,
    alap: bool,
) -> TranspileResult<()> {
    let unit = resolve_unit(circuit, durations)?;

    let desired = if alap {
        // Reverse sweep: how late can each instruction finish?
        let mut late: FxHashMap<QubitId, f64> = FxHashMap::default();
        let mut late_cl: FxHashMap<ClbitId, f64> = FxHashMap::default();
        let n = circuit.num_ops();
        let mut rev_start = vec![0.0f64; n];
        let mut rev_dur = vec![0.0f64; n];
        for (idx, inst) in circuit.instructions().iter().enumerate().rev() {
            let dur = duration_of(inst, durations, unit)?;
            let ready = inst
                .qubits
                .iter()
                .map(|q| late.get(q).copied().unwrap_or(0.0))
                .chain(
                    inst.clbits
                        .iter()
                        .map(|c| late_cl.get(c).copied().unwrap_or(0.0)),
                )
                .fold(0.0f64, f64::max);
            for &q in &inst.qubits {
                late.insert(q, ready + dur);
            }
            for &c in &inst.clbits {
                late_cl.insert(c, ready + dur);
            }
            rev_start[idx] = ready;
            rev_dur[idx] = dur;
        }
        let makespan = late
            .values()
            .chain(late_cl.values())
            .fold(0.0f64, |acc, &v| acc.max(v));
        Some(
            (0..n)
                .map(|i| makespan - rev_start[i] - rev_dur[i])
                .collect::<Vec<f64>>(),
        )
    } else {
        None
    };

    let (instructions, schedule) =
        place_forward(circuit, durations, constraints, unit, desired.as_deref())?;
    debug!(duration = schedule.duration, ?unit, "scheduled");
    circuit.replace_instructions(instructions)?;
    props.set(schedule);
    props.mark_valid("schedule");
    Ok(())
}

/// Schedules every instruction as early as its operands allow.
pub struct AsapSchedule {
    durations: InstructionDurations,
    constraints: TimingConstraints,
}

impl AsapSchedule {
    /// Create the pass from a duration table and device constraints.
    pub fn new(durations: InstructionDurations, constraints: TimingConstraints) -> Self {
        Self {
            durations,
            constraints,
        }
    }
}

impl Pass for AsapSchedule {
    fn name(&self) -> &'static str {
        "asap_schedule"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()> {
        run_schedule(circuit, props, &self.durations, &self.constraints, false)
    }
}

/// Schedules every instruction as late as its consumers allow.
pub struct AlapSchedule {
    durations: InstructionDurations,
    constraints: TimingConstraints,
}

impl AlapSchedule {
    /// Create the pass from a duration table and device constraints.
    pub fn new(durations: InstructionDurations, constraints: TimingConstraints) -> Self {
        Self {
            durations,
            constraints,
        }
    }
}

impl Pass for AlapSchedule {
    fn name(&self) -> &'static str {
        "alap_schedule"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()> {
        run_schedule(circuit, props, &self.durations, &self.constraints, true)
    }
}
