//! Static timing analysis over the instance graph.
//!
//! A node's arrival time is the latest input arrival plus its own intrinsic
//! delay; sources start at their intrinsic delay. Sinks are required by the
//! clock period, and required times propagate backwards through wire and
//! cell delays. Slack is `required − arrival` per node.

use crate::graph::TimingGraph;

/// Arrival, required, and slack per node, plus the worst endpoint slack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingState {
    /// Latest arrival at each node's output, in ns.
    pub arrival: Vec<f64>,
    /// Required time at each node's output, in ns.
    pub required: Vec<f64>,
    /// `required − arrival` per node.
    pub slack: Vec<f64>,
    /// Minimum slack over all sink nodes; zero for an empty graph.
    pub worst_slack: f64,
}

/// Runs a full STA pass with the given per-node cell delays.
pub fn analyze(graph: &TimingGraph, cell_delay: &[f64], clock_period: f64) -> TimingState {
    let arrival = forward_propagation(graph, cell_delay);
    let required = backward_propagation(graph, cell_delay, clock_period);
    let slack: Vec<f64> = arrival
        .iter()
        .zip(&required)
        .map(|(a, r)| r - a)
        .collect();

    let sinks = graph.sink_nodes();
    let worst_slack = if sinks.is_empty() {
        0.0
    } else {
        sinks
            .iter()
            .map(|&v| slack[v])
            .fold(f64::INFINITY, f64::min)
    };

    TimingState {
        arrival,
        required,
        slack,
        worst_slack,
    }
}

fn forward_propagation(graph: &TimingGraph, cell_delay: &[f64]) -> Vec<f64> {
    let mut arrival = vec![0.0_f64; graph.node_count()];
    for &v in graph.topo_order() {
        let latest_input = graph
            .incoming_edges(v)
            .map(|e| arrival[e.from] + e.delay)
            .fold(0.0_f64, f64::max);
        arrival[v] = latest_input + cell_delay[v];
    }
    arrival
}

fn backward_propagation(graph: &TimingGraph, cell_delay: &[f64], clock_period: f64) -> Vec<f64> {
    let mut required = vec![clock_period; graph.node_count()];
    for &v in graph.topo_order().iter().rev() {
        if let Some(r) = graph
            .outgoing_edges(v)
            .map(|e| required[e.to] - cell_delay[e.to] - e.delay)
            .reduce(f64::min)
        {
            required[v] = r;
        }
    }
    required
}
