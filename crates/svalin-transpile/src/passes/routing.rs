//! Coupling-map routing passes.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use svalin_ir::{Circuit, Instruction, QubitId, StandardGate};
use tracing::debug;

use crate::coupling::CouplingMap;
use crate::error::{TranspileError, TranspileResult};
use crate::layout::Layout;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Result of [`CheckMap`]: whether the circuit already satisfies the
/// coupling map as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedStatus(pub bool);

/// The physical permutation left behind by swap insertion.
///
/// Maps each virtual qubit to the physical qubit holding it after the
/// last routed instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalPermutation(pub Layout);

/// Analysis pass: checks whether every two-qubit gate touches a coupled
/// pair without any rewriting.
///
/// The flag is only true when the chosen layout is the identity, so a
/// true result means routing can be skipped entirely and the circuit is
/// already physical.
pub struct CheckMap {
    coupling: CouplingMap,
}

impl CheckMap {
    /// Create the pass for a device.
    pub fn new(coupling: CouplingMap) -> Self {
        Self { coupling }
    }
}

impl Pass for CheckMap {
    fn name(&self) -> &'static str {
        "check_map"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()> {
        let n = circuit.num_qubits();
        let identity = props
            .layout
            .as_ref()
            .is_none_or(|l| (0..n).all(|i| l.physical(QubitId(i)) == Some(i)));
        let coupled = circuit
            .instructions()
            .iter()
            .filter(|i| i.is_two_qubit_gate())
            .all(|i| self.coupling.is_coupled(i.qubits[0].0, i.qubits[1].0));
        let mapped = identity && coupled;
        debug!(mapped, "coupling check");
        props.set(MappedStatus(mapped));
        props.mark_valid("check_map");
        Ok(())
    }
}

fn already_mapped(props: &PropertySet) -> bool {
    props.is_valid("check_map") && props.get::<MappedStatus>().is_some_and(|m| m.0)
}

/// How a routing pass picks the next SWAP when a gate is out of reach.
trait SwapChooser {
    fn choose(
        &mut self,
        pa: u32,
        pb: u32,
        layout: &Layout,
        upcoming: &[(QubitId, QubitId)],
        coupling: &CouplingMap,
    ) -> TranspileResult<(u32, u32)>;
}

/// Shared swap-insertion engine.
///
/// Applies the layout (operands become physical indices), walks the
/// program, and asks the chooser for a SWAP whenever a two-qubit gate
/// spans non-adjacent physical qubits. Returns the rewritten program
/// and the final permutation.
fn route_circuit(
    circuit: &Circuit,
    coupling: &CouplingMap,
    initial: Layout,
    chooser: &mut dyn SwapChooser,
) -> TranspileResult<(Vec<Instruction>, Layout)> {
    let mut layout = initial;
    let mut out = Vec::with_capacity(circuit.num_ops());
    let insts = circuit.instructions();

    let map_qubit = |layout: &Layout, q: QubitId| -> TranspileResult<QubitId> {
        layout
            .physical(q)
            .map(QubitId)
            .ok_or_else(|| TranspileError::PassPrecondition {
                pass: "routing",
                reason: format!("virtual qubit {q} has no physical assignment"),
            })
    };

    for (idx, inst) in insts.iter().enumerate() {
        if inst.is_two_qubit_gate() {
            let (va, vb) = (inst.qubits[0], inst.qubits[1]);
            loop {
                let pa = map_qubit(&layout, va)?.0;
                let pb = map_qubit(&layout, vb)?.0;
                if coupling.is_coupled(pa, pb) {
                    break;
                }
                if coupling.distance(pa, pb).is_none() {
                    return Err(TranspileError::RoutingFailed(pa, pb));
                }
                let upcoming: Vec<(QubitId, QubitId)> = insts[idx..]
                    .iter()
                    .filter(|i| i.is_two_qubit_gate())
                    .take(8)
                    .map(|i| (i.qubits[0], i.qubits[1]))
                    .collect();
                let (s1, s2) = chooser.choose(pa, pb, &layout, &upcoming, coupling)?;
                out.push(Instruction::two_qubit_gate(
                    StandardGate::Swap,
                    QubitId(s1),
                    QubitId(s2),
                ));
                layout.swap_physical(s1, s2);
            }
        }

        let mut mapped = inst.clone();
        for q in &mut mapped.qubits {
            *q = map_qubit(&layout, *q)?;
        }
        out.push(mapped);
    }

    Ok((out, layout))
}

/// Common run body for the three routing passes.
fn run_routing(
    pass_name: &'static str,
    coupling: &CouplingMap,
    circuit: &mut Circuit,
    props: &mut PropertySet,
    chooser: &mut dyn SwapChooser,
) -> TranspileResult<()> {
    let initial = props
        .layout
        .clone()
        .ok_or_else(|| TranspileError::PassPrecondition {
            pass: pass_name,
            reason: "no layout selected before routing".to_owned(),
        })?;

    let (instructions, final_layout) = route_circuit(circuit, coupling, initial, chooser)?;

    let device = coupling.num_qubits();
    let width = circuit.num_qubits();
    if device > width {
        circuit.add_qreg("ancilla", device - width);
    }
    circuit.replace_instructions(instructions)?;
    debug!(swaps_inserted = circuit.count_ops().get("swap").copied().unwrap_or(0), "routed");
    props.set(FinalPermutation(final_layout));
    Ok(())
}

/// Greedy shortest-path swap insertion.
///
/// Always moves the first operand one hop along a precomputed shortest
/// path, so output depends only on the coupling map and layout.
pub struct BasicRouting {
    coupling: CouplingMap,
}

impl BasicRouting {
    /// Create the pass for a device.
    pub fn new(coupling: CouplingMap) -> Self {
        Self { coupling }
    }
}

struct BasicChooser;

impl SwapChooser for BasicChooser {
    fn choose(
        &mut self,
        pa: u32,
        pb: u32,
        _layout: &Layout,
        _upcoming: &[(QubitId, QubitId)],
        coupling: &CouplingMap,
    ) -> TranspileResult<(u32, u32)> {
        let path = coupling
            .shortest_path(pa, pb)
            .ok_or(TranspileError::RoutingFailed(pa, pb))?;
        Ok((pa, path[1]))
    }
}

impl Pass for BasicRouting {
    fn name(&self) -> &'static str {
        "basic_routing"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn requires(&self) -> &'static [&'static str] {
        &["check_map"]
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &["check_map"]
    }

    fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()> {
        run_routing(self.name(), &self.coupling, circuit, props, &mut BasicChooser)
    }

    fn should_run(&self, _circuit: &Circuit, props: &PropertySet) -> bool {
        !already_mapped(props)
    }
}

/// Shortest-path routing with seeded random tie-breaking among
/// equally good hops.
pub struct StochasticRouting {
    coupling: CouplingMap,
    seed: u64,
}

impl StochasticRouting {
    /// Create the pass for a device.
    pub fn new(coupling: CouplingMap, seed: u64) -> Self {
        Self { coupling, seed }
    }
}

struct StochasticChooser {
    rng: SmallRng,
}

impl SwapChooser for StochasticChooser {
    fn choose(
        &mut self,
        pa: u32,
        pb: u32,
        _layout: &Layout,
        _upcoming: &[(QubitId, QubitId)],
        coupling: &CouplingMap,
    ) -> TranspileResult<(u32, u32)> {
        let here = coupling
            .distance(pa, pb)
            .ok_or(TranspileError::RoutingFailed(pa, pb))?;
        let candidates: Vec<u32> = coupling
            .undirected_neighbors(pa)
            .into_iter()
            .filter(|&n| coupling.distance(n, pb).is_some_and(|d| d < here))
            .collect();
        if candidates.is_empty() {
            return Err(TranspileError::RoutingFailed(pa, pb));
        }
        let pick = candidates[self.rng.gen_range(0..candidates.len())];
        Ok((pa, pick))
    }
}

impl Pass for StochasticRouting {
    fn name(&self) -> &'static str {
        "stochastic_routing"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn requires(&self) -> &'static [&'static str] {
        &["check_map"]
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &["check_map"]
    }

    fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()> {
        let mut chooser = StochasticChooser {
            rng: SmallRng::seed_from_u64(self.seed),
        };
        run_routing(self.name(), &self.coupling, circuit, props, &mut chooser)
    }

    fn should_run(&self, _circuit: &Circuit, props: &PropertySet) -> bool {
        !already_mapped(props)
    }
}

/// Lookahead routing: candidate swaps around both operands are scored
/// against the next few pending two-qubit gates and the cheapest wins.
/// Ties break through the seeded generator.
pub struct SabreRouting {
    coupling: CouplingMap,
    seed: u64,
}

impl SabreRouting {
    /// Create the pass for a device.
    pub fn new(coupling: CouplingMap, seed: u64) -> Self {
        Self { coupling, seed }
    }
}

struct SabreChooser {
    rng: SmallRng,
}

impl SabreChooser {
    fn cost(
        layout: &Layout,
        upcoming: &[(QubitId, QubitId)],
        coupling: &CouplingMap,
    ) -> u64 {
        let mut total = 0u64;
        for (weight, &(va, vb)) in upcoming.iter().enumerate().map(|(i, p)| (8 - i.min(7), p)) {
            if let (Some(pa), Some(pb)) = (layout.physical(va), layout.physical(vb)) {
                if let Some(d) = coupling.distance(pa, pb) {
                    total += u64::from(d) * weight as u64;
                }
            }
        }
        total
    }
}

impl SwapChooser for SabreChooser {
    fn choose(
        &mut self,
        pa: u32,
        pb: u32,
        layout: &Layout,
        upcoming: &[(QubitId, QubitId)],
        coupling: &CouplingMap,
    ) -> TranspileResult<(u32, u32)> {
        let mut candidates: Vec<(u32, u32)> = coupling
            .undirected_neighbors(pa)
            .into_iter()
            .map(|n| (pa, n))
            .chain(
                coupling
                    .undirected_neighbors(pb)
                    .into_iter()
                    .map(|n| (pb, n)),
            )
            .collect();
        candidates.retain(|&(a, b)| a != b);
        if candidates.is_empty() {
            return Err(TranspileError::RoutingFailed(pa, pb));
        }

        let mut best: Vec<(u32, u32)> = vec![];
        let mut best_cost = u64::MAX;
        for &(a, b) in &candidates {
            let mut trial = layout.clone();
            trial.swap_physical(a, b);
            let cost = Self::cost(&trial, upcoming, coupling);
            match cost.cmp(&best_cost) {
                std::cmp::Ordering::Less => {
                    best_cost = cost;
                    best = vec![(a, b)];
                }
                std::cmp::Ordering::Equal => best.push((a, b)),
                std::cmp::Ordering::Greater => {}
            }
        }
        Ok(best[self.rng.gen_range(0..best.len())])
    }
}

impl Pass for SabreRouting {
    fn name(&self) -> &'static str {
        "sabre_routing"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn requires(&self) -> &'static [&'static str] {
        &["check_map"]
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &["check_map"]
    }

    fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()> {
        let mut chooser = SabreChooser {
            rng: SmallRng::seed_from_u64(self.seed),
        };
        run_routing(self.name(), &self.coupling, circuit, props, &mut chooser)
    }

    fn should_run(&self, _circuit: &Circuit, props: &PropertySet) -> bool {
        !already_mapped(props)
    }
}
