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

/// Fixed-point multiplier applied to every mass and cost before pivoting.
pub const FP_MULTIPLIER: i64 = 1_000_000;

/// Largest accepted `faux_infinity`. Every potential stays within
/// `4/3 * faux_infinity` of the root and every reduced cost or potential
/// shift within `3 * faux_infinity`, so pivoting never leaves `i64`.
pub const MAX_FAUX_INFINITY: i64 = i64::MAX / 4;

/// Arc attributes. Transportation arcs come first (row-major over
/// `source x sink`), followed by one artificial arc per real node.
#[derive(Debug, Clone)]
pub struct Edges {
    pub source: Vec<usize>,
    pub target: Vec<usize>,
    pub cost: Vec<i64>,
    pub capacity: Vec<i64>,
    /// Number of transportation arcs; only these are ever priced.
    pub transport_count: usize,
}

/// Spanning tree stored as a depth-first thread.
///
/// The artificial root is the last node. `thread`/`revthread` form a
/// circular list visiting every node in depth-first order, so the subtree
/// of `v` is the run `v ..= last[v]` along `thread`.
#[derive(Debug, Clone)]
pub struct Nodes {
    pub thread: Vec<usize>,
    pub revthread: Vec<usize>,
    pub predecessor: Vec<Option<usize>>,
    pub size: Vec<usize>,
    pub edge_tree: Vec<Option<usize>>,
    pub last: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct GraphState {
    pub potential: Vec<i64>,
    pub flow: Vec<i64>,
}

/// Everything the pivot loop mutates, owned by a single solve call.
#[derive(Debug, Clone)]
pub struct SimplexState {
    pub nodes_state: Nodes,
    pub graph_state: GraphState,
    pub edges_state: Edges,
    pub demand: Vec<i64>,
    pub n_sources: usize,
    pub n_sinks: usize,
    pub faux_infinity: i64,
}

impl SimplexState {
    /// Index of the artificial root node.
    pub fn root(&self) -> usize {
        self.demand.len()
    }

    /// Number of nodes including the artificial root.
    pub fn node_count(&self) -> usize {
        self.demand.len() + 1
    }
}

/// Arc chosen by a pivot rule, oriented in the direction flow will increase:
/// from `p` to `q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnteringArc {
    pub arc: usize,
    pub p: usize,
    pub q: usize,
}

/// Tuning knobs for a single solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverOptions {
    /// Pivots allowed before giving up with `NonConvergence`.
    pub max_pivots: usize,
    /// Multiplier on the `ceil(sqrt(e))` pricing block size.
    pub block_factor: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            max_pivots: 10_000_000,
            block_factor: 1,
        }
    }
}
