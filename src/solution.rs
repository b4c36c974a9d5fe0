// Copyright 2024 Isera Developers

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::basetypes::*;
use petgraph::graph::DiGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Source(usize),
    Sink(usize),
}

/// Optimal transport plan, unscaled back to floating point.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub total_cost: f64,
    /// Flow on arc `source * n_sinks + sink`.
    pub flows: Vec<f64>,
    /// Dual values of the sources followed by the sinks. Only differences
    /// along arcs are meaningful.
    pub potentials: Vec<f64>,
    /// Masses after rebalancing, i.e. the demands the flow actually meets.
    pub source_demands: Vec<f64>,
    pub sink_demands: Vec<f64>,
    pub pivots: usize,
}

impl Solution {
    pub fn n_sources(&self) -> usize {
        self.source_demands.len()
    }

    pub fn n_sinks(&self) -> usize {
        self.sink_demands.len()
    }

    pub fn flow(&self, source: usize, sink: usize) -> f64 {
        self.flows[source * self.n_sinks() + sink]
    }

    /// Transport plan as a bipartite digraph holding only the arcs that
    /// carry flow. Sources get node indices `0..n_sources`, sinks follow.
    pub fn flow_graph(&self) -> DiGraph<Endpoint, f64> {
        let mut graph = DiGraph::with_capacity(self.n_sources() + self.n_sinks(), 0);
        let sources: Vec<_> = (0..self.n_sources())
            .map(|i| graph.add_node(Endpoint::Source(i)))
            .collect();
        let sinks: Vec<_> = (0..self.n_sinks())
            .map(|j| graph.add_node(Endpoint::Sink(j)))
            .collect();
        for (arc, &flow) in self.flows.iter().enumerate() {
            if flow > 0.0 {
                let (i, j) = (arc / self.n_sinks(), arc % self.n_sinks());
                graph.add_edge(sources[i], sinks[j], flow);
            }
        }
        graph
    }
}

/// Unscale the final basis. The cost is accumulated exactly in `i128`
/// before the single division by `F * F`.
pub fn extract(state: &SimplexState, pivots: usize) -> Solution {
    let edges = &state.edges_state;
    let graphstate = &state.graph_state;
    let e = edges.transport_count;
    let fp = FP_MULTIPLIER as f64;

    let leftover: i64 = graphstate.flow[e..].iter().sum();
    if leftover != 0 {
        log::warn!("{} units of flow left on artificial arcs", leftover);
    }

    let total: i128 = graphstate.flow[..e]
        .iter()
        .zip(&edges.cost[..e])
        .map(|(&flow, &cost)| flow as i128 * cost as i128)
        .sum();

    Solution {
        total_cost: total as f64 / (fp * fp),
        flows: graphstate.flow[..e].iter().map(|&x| x as f64 / fp).collect(),
        potentials: graphstate.potential[..state.root()]
            .iter()
            .map(|&x| x as f64 / fp)
            .collect(),
        source_demands: state.demand[..state.n_sources]
            .iter()
            .map(|&d| -d as f64 / fp)
            .collect(),
        sink_demands: state.demand[state.n_sources..]
            .iter()
            .map(|&d| d as f64 / fp)
            .collect(),
        pivots,
    }
}
