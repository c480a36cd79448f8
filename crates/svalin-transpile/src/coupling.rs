//! Device coupling graph.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Directed connectivity graph over physical qubit indices.
///
/// Nodes are the contiguous physical qubits `0..N-1`; an edge `(a, b)`
/// means a two-qubit gate with control `a` and target `b` is natively
/// supported. The map is immutable once constructed: all constructors
/// precompute an all-pairs BFS distance/predecessor matrix over the
/// undirected skeleton, so `distance()` is O(1) and `shortest_path()`
/// is O(path length).
///
/// # Deserialization
///
/// The graph and matrices are rebuilt from the serialized edge list by
/// [`rebuild_caches()`](Self::rebuild_caches); call it after
/// deserializing, otherwise distance queries return `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingMap {
    /// Directed edge list.
    edges: Vec<(u32, u32)>,
    /// Number of physical qubits.
    num_qubits: u32,
    /// Underlying graph; node i is physical qubit i.
    #[serde(skip)]
    graph: DiGraph<u32, (), u32>,
    /// `dist[from][to]`: undirected shortest-path length, `u32::MAX` if
    /// unreachable.
    #[serde(skip)]
    dist: Vec<Vec<u32>>,
    /// `pred[from][to]`: predecessor of `to` on the shortest path from
    /// `from`, `u32::MAX` if none.
    #[serde(skip)]
    pred: Vec<Vec<u32>>,
}

impl CouplingMap {
    /// Build a coupling map from explicit directed edges.
    ///
    /// The qubit count is one past the largest index mentioned.
    pub fn from_edges(edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let edges: Vec<(u32, u32)> = edges.into_iter().collect();
        let num_qubits = edges
            .iter()
            .map(|&(a, b)| a.max(b) + 1)
            .max()
            .unwrap_or(0);
        let mut map = Self {
            edges,
            num_qubits,
            graph: DiGraph::default(),
            dist: vec![],
            pred: vec![],
        };
        map.rebuild_caches();
        map
    }

    /// Rebuild the graph and distance/predecessor matrices from the edge
    /// list. Must be called after deserialization.
    pub fn rebuild_caches(&mut self) {
        self.graph = DiGraph::default();
        for q in 0..self.num_qubits {
            self.graph.add_node(q);
        }
        for &(a, b) in &self.edges {
            self.graph
                .add_edge(NodeIndex::new(a as usize), NodeIndex::new(b as usize), ());
        }
        self.precompute_distances();
    }

    /// BFS from every node over the undirected skeleton.
    fn precompute_distances(&mut self) {
        let n = self.num_qubits as usize;
        self.dist = vec![vec![u32::MAX; n]; n];
        self.pred = vec![vec![u32::MAX; n]; n];

        for src in 0..n {
            self.dist[src][src] = 0;
            let mut queue = VecDeque::new();
            queue.push_back(src);

            while let Some(cur) = queue.pop_front() {
                for next in self.undirected_neighbors(cur as u32) {
                    let nb = next as usize;
                    if self.dist[src][nb] == u32::MAX {
                        self.dist[src][nb] = self.dist[src][cur] + 1;
                        self.pred[src][nb] = cur as u32;
                        queue.push_back(nb);
                    }
                }
            }
        }
    }

    /// Get the number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the directed edge list.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Check if a directed coupling `from -> to` exists.
    #[inline]
    pub fn is_connected(&self, from: u32, to: u32) -> bool {
        if from >= self.num_qubits || to >= self.num_qubits {
            return false;
        }
        self.graph
            .find_edge(NodeIndex::new(from as usize), NodeIndex::new(to as usize))
            .is_some()
    }

    /// Check if qubits interact in either direction.
    #[inline]
    pub fn is_coupled(&self, a: u32, b: u32) -> bool {
        self.is_connected(a, b) || self.is_connected(b, a)
    }

    /// Iterate over outgoing neighbors of a qubit.
    pub fn neighbors(&self, qubit: u32) -> impl Iterator<Item = u32> + '_ {
        self.graph
            .neighbors_directed(NodeIndex::new(qubit as usize), Direction::Outgoing)
            .map(|n| n.index() as u32)
    }

    /// Iterate over neighbors in either direction, without duplicates.
    pub fn undirected_neighbors(&self, qubit: u32) -> Vec<u32> {
        let node = NodeIndex::new(qubit as usize);
        let mut out: Vec<u32> = self
            .graph
            .neighbors_undirected(node)
            .map(|n| n.index() as u32)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Check if every edge has its reverse present.
    pub fn is_symmetric(&self) -> bool {
        self.edges.iter().all(|&(a, b)| self.is_connected(b, a))
    }

    /// Check if the undirected skeleton is a single connected component.
    pub fn is_fully_connected(&self) -> bool {
        if self.num_qubits == 0 {
            return true;
        }
        self.dist[0].iter().all(|&d| d != u32::MAX)
    }

    /// Undirected shortest-path distance, `None` if unreachable.
    pub fn distance(&self, from: u32, to: u32) -> Option<u32> {
        let (f, t) = (from as usize, to as usize);
        if f >= self.dist.len() || t >= self.dist.len() {
            return None;
        }
        let d = self.dist[f][t];
        (d != u32::MAX).then_some(d)
    }

    /// Reconstruct the undirected shortest path from `from` to `to`.
    pub fn shortest_path(&self, from: u32, to: u32) -> Option<Vec<u32>> {
        if from == to {
            return Some(vec![from]);
        }
        let f = from as usize;
        if f >= self.pred.len() || (to as usize) >= self.pred.len() {
            return None;
        }
        if self.dist[f][to as usize] == u32::MAX {
            return None;
        }

        let mut path = vec![to];
        let mut current = to;
        while current != from {
            let p = self.pred[f][current as usize];
            if p == u32::MAX {
                return None;
            }
            path.push(p);
            current = p;
        }
        path.reverse();
        Some(path)
    }

    // =========================================================================
    // Topology factories
    // =========================================================================

    /// Symmetric linear chain 0-1-2-...-(n-1).
    pub fn linear(n: u32) -> Self {
        let mut edges = vec![];
        for i in 0..n.saturating_sub(1) {
            edges.push((i, i + 1));
            edges.push((i + 1, i));
        }
        let mut map = Self::from_edges(edges);
        map.num_qubits = n;
        map.rebuild_caches();
        map
    }

    /// Symmetric ring 0-1-...-(n-1)-0.
    pub fn ring(n: u32) -> Self {
        let mut edges = vec![];
        for i in 0..n {
            let j = (i + 1) % n;
            if i != j {
                edges.push((i, j));
                edges.push((j, i));
            }
        }
        let mut map = Self::from_edges(edges);
        map.num_qubits = n;
        map.rebuild_caches();
        map
    }

    /// Fully connected symmetric map.
    pub fn full(n: u32) -> Self {
        let mut edges = vec![];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    edges.push((i, j));
                }
            }
        }
        let mut map = Self::from_edges(edges);
        map.num_qubits = n;
        map.rebuild_caches();
        map
    }

    /// Star topology: qubit 0 coupled to all others, symmetric.
    pub fn star(n: u32) -> Self {
        let mut edges = vec![];
        for i in 1..n {
            edges.push((0, i));
            edges.push((i, 0));
        }
        let mut map = Self::from_edges(edges);
        map.num_qubits = n;
        map.rebuild_caches();
        map
    }
}

impl PartialEq for CouplingMap {
    fn eq(&self, other: &Self) -> bool {
        self.num_qubits == other.num_qubits && self.edges == other.edges
    }
}
