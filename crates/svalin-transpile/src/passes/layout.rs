//! Layout selection passes.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHashMap;
use svalin_ir::{Circuit, QubitId};
use tracing::debug;

use crate::coupling::CouplingMap;
use crate::error::TranspileResult;
use crate::layout::Layout;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Installs a caller-provided layout.
///
/// Placed first in the layout stage so method passes (which only run
/// when no layout exists yet) defer to it.
pub struct SetLayout {
    layout: Layout,
}

impl SetLayout {
    /// Wrap a fixed layout.
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }
}

impl Pass for SetLayout {
    fn name(&self) -> &'static str {
        "set_layout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, _circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()> {
        props.layout = Some(self.layout.clone());
        Ok(())
    }

    fn should_run(&self, _circuit: &Circuit, props: &PropertySet) -> bool {
        props.layout.is_none()
    }
}

/// Assigns virtual qubit i to physical qubit i.
pub struct TrivialLayout;

impl Pass for TrivialLayout {
    fn name(&self) -> &'static str {
        "trivial_layout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()> {
        props.layout = Some(Layout::trivial(circuit.num_qubits()));
        Ok(())
    }

    fn should_run(&self, _circuit: &Circuit, props: &PropertySet) -> bool {
        props.layout.is_none()
    }
}

/// Packs heavily interacting virtual qubits onto a well-connected
/// physical region.
///
/// Virtual qubits are ranked by how often they appear in two-qubit
/// gates; physical qubits are taken in a breadth-first expansion from
/// the highest-degree device qubit, preferring candidates with the most
/// links back into the already-chosen region. Deterministic: all ties
/// break on the lower index.
pub struct DenseLayout {
    coupling: CouplingMap,
}

impl DenseLayout {
    /// Create the pass for a device.
    pub fn new(coupling: CouplingMap) -> Self {
        Self { coupling }
    }
}

impl Pass for DenseLayout {
    fn name(&self) -> &'static str {
        "dense_layout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()> {
        let n = circuit.num_qubits();

        // Rank virtual qubits by two-qubit interaction count.
        let mut weight: FxHashMap<QubitId, usize> = FxHashMap::default();
        for inst in circuit.instructions() {
            if inst.is_two_qubit_gate() {
                for &q in &inst.qubits {
                    *weight.entry(q).or_insert(0) += 1;
                }
            }
        }
        let mut virtuals: Vec<QubitId> = (0..n).map(QubitId).collect();
        virtuals.sort_by_key(|q| (std::cmp::Reverse(weight.get(q).copied().unwrap_or(0)), q.0));

        // Grow a physical region from the best-connected device qubit.
        let device = self.coupling.num_qubits();
        let seed_qubit = (0..device)
            .max_by_key(|&q| (self.coupling.undirected_neighbors(q).len(), std::cmp::Reverse(q)))
            .unwrap_or(0);
        let mut region: Vec<u32> = vec![seed_qubit];
        let mut chosen = vec![false; device as usize];
        chosen[seed_qubit as usize] = true;
        while (region.len() as u32) < n {
            let next = (0..device)
                .filter(|&q| !chosen[q as usize])
                .max_by_key(|&q| {
                    let links = self
                        .coupling
                        .undirected_neighbors(q)
                        .iter()
                        .filter(|&&nb| chosen[nb as usize])
                        .count();
                    (links, std::cmp::Reverse(q))
                });
            match next {
                Some(q) => {
                    chosen[q as usize] = true;
                    region.push(q);
                }
                None => break,
            }
        }

        let layout = Layout::from_virtual_map(virtuals.into_iter().zip(region))?;
        debug!(physical = ?layout.as_physical_list(), "dense layout chosen");
        props.layout = Some(layout);
        Ok(())
    }

    fn should_run(&self, _circuit: &Circuit, props: &PropertySet) -> bool {
        props.layout.is_none()
    }
}

/// Seeded bidirectional-sweep layout search.
///
/// Starts from a random permutation and alternately "routes" the
/// circuit forward and backward, carrying the end-of-sweep permutation
/// into the next sweep as its starting layout. The permutation left
/// after the final forward sweep tends to place interacting qubits
/// adjacently for the early gates.
pub struct SabreLayout {
    coupling: CouplingMap,
    seed: u64,
    sweeps: usize,
}

impl SabreLayout {
    /// Create the pass for a device.
    pub fn new(coupling: CouplingMap, seed: u64) -> Self {
        Self {
            coupling,
            seed,
            sweeps: 3,
        }
    }
}

impl SabreLayout {
    /// Walk the two-qubit gates once, moving qubits together along
    /// shortest paths, and return the resulting permutation.
    fn sweep(&self, pairs: &[(QubitId, QubitId)], mut layout: Layout) -> Layout {
        for &(a, b) in pairs {
            let (Some(mut pa), Some(pb)) = (layout.physical(a), layout.physical(b)) else {
                continue;
            };
            while self
                .coupling
                .distance(pa, pb)
                .is_some_and(|d| d > 1)
            {
                let Some(path) = self.coupling.shortest_path(pa, pb) else {
                    break;
                };
                layout.swap_physical(pa, path[1]);
                pa = path[1];
            }
        }
        layout
    }
}

impl Pass for SabreLayout {
    fn name(&self) -> &'static str {
        "sabre_layout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> TranspileResult<()> {
        let n = circuit.num_qubits();
        let mut rng = SmallRng::seed_from_u64(self.seed);

        let mut physical: Vec<u32> = (0..self.coupling.num_qubits()).collect();
        physical.shuffle(&mut rng);
        physical.truncate(n as usize);
        let mut layout = Layout::from_virtual_map(
            (0..n).map(QubitId).zip(physical.iter().copied()),
        )?;

        let pairs: Vec<(QubitId, QubitId)> = circuit
            .instructions()
            .iter()
            .filter(|i| i.is_two_qubit_gate())
            .map(|i| (i.qubits[0], i.qubits[1]))
            .collect();
        let reversed: Vec<(QubitId, QubitId)> = pairs.iter().rev().copied().collect();

        for _ in 0..self.sweeps {
            layout = self.sweep(&pairs, layout);
            layout = self.sweep(&reversed, layout);
        }
        layout = self.sweep(&pairs, layout);

        debug!(physical = ?layout.as_physical_list(), "sabre layout chosen");
        props.layout = Some(layout);
        Ok(())
    }

    fn should_run(&self, _circuit: &Circuit, props: &PropertySet) -> bool {
        props.layout.is_none()
    }
}
