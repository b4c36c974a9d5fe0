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
use itertools::izip;

/// Cycle closed by an entering arc, oriented from `p` to `q`.
/// Edge `k` is traversed starting at node `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub nodes: Vec<usize>,
    pub edges: Vec<usize>,
}

impl Cycle {
    pub fn position(&self, arc: usize) -> Option<usize> {
        self.edges.iter().position(|&x| x == arc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeavingArc {
    pub arc: usize,
    /// Node the leaving arc is traversed from.
    pub s: usize,
    pub t: usize,
    /// Bottleneck residual capacity, i.e. the flow pushed around the cycle.
    pub delta: i64,
}

fn climb(nodes: &Nodes, v: usize) -> usize {
    nodes.predecessor[v].unwrap_or(v)
}

/// Lowest common ancestor of `p` and `q`, walking up from whichever side
/// has the smaller subtree.
pub fn find_apex(nodes: &Nodes, mut p: usize, mut q: usize) -> usize {
    let mut size_p = nodes.size[p];
    let mut size_q = nodes.size[q];
    loop {
        while size_p < size_q {
            p = climb(nodes, p);
            size_p = nodes.size[p];
        }
        while size_p > size_q {
            q = climb(nodes, q);
            size_q = nodes.size[q];
        }
        if size_p == size_q {
            if p != q {
                p = climb(nodes, p);
                size_p = nodes.size[p];
                q = climb(nodes, q);
                size_q = nodes.size[q];
            } else {
                return p;
            }
        }
    }
}

/// Nodes and tree arcs on the path from `p` up to its ancestor `w`.
pub fn trace_path(nodes: &Nodes, mut p: usize, w: usize) -> (Vec<usize>, Vec<usize>) {
    let mut path_nodes = vec![p];
    let mut path_edges = vec![];
    while p != w {
        let (Some(arc), Some(parent)) = (nodes.edge_tree[p], nodes.predecessor[p]) else {
            unreachable!("{w} is not an ancestor of {p} in the spanning tree");
        };
        path_edges.push(arc);
        p = parent;
        path_nodes.push(p);
    }
    (path_nodes, path_edges)
}

pub fn find_cycle(nodes: &Nodes, i: usize, p: usize, q: usize) -> Cycle {
    let w = find_apex(nodes, p, q);
    let (mut cycle_nodes, mut cycle_edges) = trace_path(nodes, p, w);
    cycle_nodes.reverse();
    cycle_edges.reverse();
    if cycle_edges != [i] {
        cycle_edges.push(i);
    }
    let (mut rev_nodes, rev_edges) = trace_path(nodes, q, w);
    rev_nodes.pop();
    cycle_nodes.extend(rev_nodes);
    cycle_edges.extend(rev_edges);
    Cycle {
        nodes: cycle_nodes,
        edges: cycle_edges,
    }
}

/// Residual capacity of `arc` in the direction away from its endpoint `p`.
pub fn residual_capacity(edges: &Edges, graphstate: &GraphState, arc: usize, p: usize) -> i64 {
    if edges.source[arc] == p {
        edges.capacity[arc] - graphstate.flow[arc]
    } else {
        graphstate.flow[arc]
    }
}

/// Bottleneck arc of the cycle. The scan runs backwards and keeps the first
/// minimum it meets.
pub fn find_leaving_edge(edges: &Edges, graphstate: &GraphState, cycle: &Cycle) -> LeavingArc {
    let last = cycle.edges.len() - 1;
    let (mut j, mut s) = (cycle.edges[last], cycle.nodes[last]);
    let mut delta = residual_capacity(edges, graphstate, j, s);
    for k in (0..last).rev() {
        let residual = residual_capacity(edges, graphstate, cycle.edges[k], cycle.nodes[k]);
        if residual < delta {
            delta = residual;
            j = cycle.edges[k];
            s = cycle.nodes[k];
        }
    }
    let t = if edges.source[j] == s {
        edges.target[j]
    } else {
        edges.source[j]
    };
    LeavingArc {
        arc: j,
        s,
        t,
        delta,
    }
}

/// Push `delta` units around the cycle.
pub fn augment_flow(edges: &Edges, graphstate: &mut GraphState, cycle: &Cycle, delta: i64) {
    for (&arc, &p) in izip!(&cycle.edges, &cycle.nodes) {
        if edges.source[arc] == p {
            graphstate.flow[arc] += delta;
        } else {
            graphstate.flow[arc] -= delta;
        }
    }
}
