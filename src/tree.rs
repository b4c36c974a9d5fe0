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

//! Spanning tree surgery on the depth-first thread.
//!
//! A pivot that changes the basis runs `remove_edge`, `make_root` and
//! `add_edge` in that order, then refreshes the potentials of the moved
//! subtree. While a subtree is detached its thread is closed on itself, so
//! `make_root` only ever touches nodes of that subtree.

use crate::basetypes::*;
use itertools::Itertools;

/// Nodes of the subtree rooted at `p`, in thread order.
pub fn subtree(nodes: &Nodes, mut p: usize) -> Vec<usize> {
    let last = nodes.last[p];
    let mut tree = vec![p];
    while p != last {
        p = nodes.thread[p];
        tree.push(p);
    }
    tree
}

/// Cut the tree arc between `s` and its child `t`.
pub fn remove_edge(nodes: &mut Nodes, s: usize, t: usize) {
    let size_t = nodes.size[t];
    let prev_t = nodes.revthread[t];
    let last_t = nodes.last[t];
    let next_last_t = nodes.thread[last_t];

    nodes.predecessor[t] = None;
    nodes.edge_tree[t] = None;

    nodes.thread[prev_t] = next_last_t;
    nodes.revthread[next_last_t] = prev_t;
    nodes.thread[last_t] = t;
    nodes.revthread[t] = last_t;

    let mut current = Some(s);
    while let Some(u) = current {
        nodes.size[u] -= size_t;
        if nodes.last[u] == last_t {
            nodes.last[u] = prev_t;
        }
        current = nodes.predecessor[u];
    }
}

/// Re-root the detached subtree containing `q` at `q`, flipping every arc
/// on the path from `q` to the old subtree root.
pub fn make_root(nodes: &mut Nodes, q: usize) {
    let mut ancestors = vec![];
    let mut current = Some(q);
    while let Some(u) = current {
        ancestors.push(u);
        current = nodes.predecessor[u];
    }
    ancestors.reverse();

    for (&p, &q) in ancestors.iter().tuple_windows() {
        let size_p = nodes.size[p];
        let mut last_p = nodes.last[p];
        let prev_q = nodes.revthread[q];
        let last_q = nodes.last[q];
        let next_last_q = nodes.thread[last_q];

        // p becomes a child of q
        nodes.predecessor[p] = Some(q);
        nodes.predecessor[q] = None;
        nodes.edge_tree[p] = nodes.edge_tree[q];
        nodes.edge_tree[q] = None;
        nodes.size[p] = size_p - nodes.size[q];
        nodes.size[q] = size_p;

        // unlink q's subtree from the thread
        nodes.thread[prev_q] = next_last_q;
        nodes.revthread[next_last_q] = prev_q;
        nodes.thread[last_q] = q;
        nodes.revthread[q] = last_q;

        if last_p == last_q {
            nodes.last[p] = prev_q;
            last_p = prev_q;
        }

        // what is left of p's subtree now hangs after q's own descendants
        nodes.revthread[p] = last_q;
        nodes.thread[last_q] = p;
        nodes.thread[last_p] = q;
        nodes.revthread[q] = last_p;
        nodes.last[q] = last_p;
    }
}

/// Hang the subtree rooted at `q` under `p` through arc `i`.
pub fn add_edge(nodes: &mut Nodes, i: usize, p: usize, q: usize) {
    let last_p = nodes.last[p];
    let next_last_p = nodes.thread[last_p];
    let size_q = nodes.size[q];
    let last_q = nodes.last[q];

    nodes.predecessor[q] = Some(p);
    nodes.edge_tree[q] = Some(i);

    nodes.thread[last_p] = q;
    nodes.revthread[q] = last_p;
    nodes.revthread[next_last_p] = last_q;
    nodes.thread[last_q] = next_last_p;

    let mut current = Some(p);
    while let Some(u) = current {
        nodes.size[u] += size_q;
        if nodes.last[u] == last_p {
            nodes.last[u] = last_q;
        }
        current = nodes.predecessor[u];
    }
}

/// Shift the potentials of `q`'s subtree so that the new tree arc `i`
/// between `p` and `q` has zero reduced cost.
pub fn update_potentials(
    edges: &Edges,
    nodes: &Nodes,
    graphstate: &mut GraphState,
    i: usize,
    p: usize,
    q: usize,
) {
    let potential = &mut graphstate.potential;
    let change = if q == edges.target[i] {
        potential[p] - edges.cost[i] - potential[q]
    } else {
        potential[p] + edges.cost[i] - potential[q]
    };
    let last = nodes.last[q];
    let mut current = q;
    loop {
        potential[current] += change;
        if current == last {
            break;
        }
        current = nodes.thread[current];
    }
}
