//! Instance-level timing graph.
//!
//! One node per cell instance, one edge per timing arc. The graph is built
//! once at load time and never changes: swapping a cell's threshold variant
//! alters node delays, not connectivity. A topological order is computed up
//! front so that every STA run is a single forward and a single backward
//! sweep.

use crate::error::{NetlistError, NetlistResult};
use crate::model::Arc;
use std::collections::{HashMap, VecDeque};

/// A directed timing arc between two nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingEdge {
    /// Driving node.
    pub from: usize,
    /// Driven node.
    pub to: usize,
    /// Wire delay, in ns.
    pub delay: f64,
}

/// Connectivity of the design's cells.
#[derive(Debug, Clone, Default)]
pub struct TimingGraph {
    edges: Vec<TimingEdge>,
    fanin: Vec<Vec<usize>>,
    fanout: Vec<Vec<usize>>,
    topo_order: Vec<usize>,
}

impl TimingGraph {
    /// Builds the graph over `names.len()` nodes from the given arcs.
    ///
    /// Fails if an arc names an unknown instance or the arcs contain a loop.
    pub fn build(names: &[String], arcs: &[Arc]) -> NetlistResult<Self> {
        let index: HashMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        let lookup = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| NetlistError::UnknownInstance(name.to_string()))
        };

        let n = names.len();
        let mut graph = Self {
            edges: Vec::with_capacity(arcs.len()),
            fanin: vec![Vec::new(); n],
            fanout: vec![Vec::new(); n],
            topo_order: Vec::with_capacity(n),
        };
        for arc in arcs {
            let from = lookup(&arc.from)?;
            let to = lookup(&arc.to)?;
            let id = graph.edges.len();
            graph.edges.push(TimingEdge {
                from,
                to,
                delay: arc.delay,
            });
            graph.fanout[from].push(id);
            graph.fanin[to].push(id);
        }

        // Kahn's algorithm; anything left over sits on a loop.
        let mut indegree: Vec<usize> = graph.fanin.iter().map(Vec::len).collect();
        let mut ready: VecDeque<usize> = (0..n).filter(|&v| indegree[v] == 0).collect();
        while let Some(v) = ready.pop_front() {
            graph.topo_order.push(v);
            for &e in &graph.fanout[v] {
                let to = graph.edges[e].to;
                indegree[to] -= 1;
                if indegree[to] == 0 {
                    ready.push_back(to);
                }
            }
        }
        if graph.topo_order.len() < n {
            let stuck = (0..n).find(|&v| indegree[v] > 0).unwrap_or_default();
            return Err(NetlistError::TimingLoop(names[stuck].clone()));
        }
        Ok(graph)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.fanin.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the edges arriving at `node`.
    pub fn incoming_edges(&self, node: usize) -> impl Iterator<Item = &TimingEdge> {
        self.fanin[node].iter().map(|&e| &self.edges[e])
    }

    /// Returns the edges leaving `node`.
    pub fn outgoing_edges(&self, node: usize) -> impl Iterator<Item = &TimingEdge> {
        self.fanout[node].iter().map(|&e| &self.edges[e])
    }

    /// Returns every node in an order where drivers precede the nodes they drive.
    pub fn topo_order(&self) -> &[usize] {
        &self.topo_order
    }

    /// Returns all nodes with no outgoing edges.
    pub fn sink_nodes(&self) -> Vec<usize> {
        (0..self.node_count())
            .filter(|&v| self.fanout[v].is_empty())
            .collect()
    }
}
