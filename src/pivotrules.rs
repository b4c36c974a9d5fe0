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
use std::fmt;

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockSearch;
#[derive(Debug, Clone, Copy, Default)]
pub struct BestEligible;

impl fmt::Display for BlockSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockSearch")
    }
}

impl fmt::Display for BestEligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BestEligible")
    }
}

pub trait PivotRules {
    /// Look for an arc with negative reduced cost starting at `index`.
    /// Returns the cursor to resume from and the entering arc, or `None`
    /// when the current basis is optimal.
    fn find_entering_arc(
        &self,
        edges: &Edges,
        graphstate: &GraphState,
        index: usize,
        block_size: usize,
    ) -> (usize, Option<EnteringArc>);
}

/// Reduced cost of `arc`, negated for arcs carrying flow so that a negative
/// value always means pivoting the arc in lowers the total cost.
pub fn reduced_cost(arc: usize, edges: &Edges, graphstate: &GraphState) -> i64 {
    let c = edges.cost[arc] - graphstate.potential[edges.source[arc]]
        + graphstate.potential[edges.target[arc]];
    if graphstate.flow[arc] == 0 {
        c
    } else {
        -c
    }
}

/// Orient `arc` along the direction in which its flow can change.
pub fn orient(arc: usize, edges: &Edges, graphstate: &GraphState) -> EnteringArc {
    if graphstate.flow[arc] == 0 {
        EnteringArc {
            arc,
            p: edges.source[arc],
            q: edges.target[arc],
        }
    } else {
        EnteringArc {
            arc,
            p: edges.target[arc],
            q: edges.source[arc],
        }
    }
}

/// `ceil(sqrt(e))` scaled by `factor`, kept inside `[1, e]`.
pub fn block_size(transport_count: usize, factor: usize) -> usize {
    let base = (transport_count as f64).sqrt().ceil() as usize;
    (base * factor.max(1)).clamp(1, transport_count.max(1))
}

///////////////////////////////
/// SEQUENTIAL BLOCK SEARCH ///
///////////////////////////////

// Dantzig inside a block, Bland across blocks: the first minimum of a block
// wins, and the cursor always resumes right after the block just priced.
impl PivotRules for BlockSearch {
    fn find_entering_arc(
        &self,
        edges: &Edges,
        graphstate: &GraphState,
        mut index: usize,
        block_size: usize,
    ) -> (usize, Option<EnteringArc>) {
        let e = edges.transport_count;
        if e == 0 {
            return (index, None);
        }
        let nb_block = (e + block_size - 1) / block_size;
        let mut nb_block_checked = 0;
        while nb_block_checked < nb_block {
            let mut end = index + block_size;
            let block: Vec<usize> = if end <= e {
                (index..end).collect()
            } else {
                end -= e;
                (index..e).chain(0..end).collect()
            };
            index = end;

            let candidate = block
                .into_iter()
                .min_by_key(|&arc| reduced_cost(arc, edges, graphstate));
            match candidate {
                Some(arc) if reduced_cost(arc, edges, graphstate) < 0 => {
                    return (index, Some(orient(arc, edges, graphstate)));
                }
                _ => nb_block_checked += 1,
            }
        }
        (index, None)
    }
}

//Best Eligible arc
impl PivotRules for BestEligible {
    fn find_entering_arc(
        &self,
        edges: &Edges,
        graphstate: &GraphState,
        index: usize,
        _block_size: usize,
    ) -> (usize, Option<EnteringArc>) {
        let entering = (0..edges.transport_count)
            .min_by_key(|&arc| reduced_cost(arc, edges, graphstate))
            .filter(|&arc| reduced_cost(arc, edges, graphstate) < 0)
            .map(|arc| orient(arc, edges, graphstate));
        (index, entering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two sources, two sinks plus four artificial arcs into/out of node 4.
    fn toy() -> (Edges, GraphState) {
        let edges = Edges {
            source: vec![0, 0, 1, 1, 0, 1, 4, 4],
            target: vec![2, 3, 2, 3, 4, 4, 2, 3],
            cost: vec![5, 1, 3, 1, 100, 100, 100, 100],
            capacity: vec![1, 1, 1, 1, 100, 100, 100, 100],
            transport_count: 4,
        };
        let graphstate = GraphState {
            potential: vec![0, 0, 0, 0, 0],
            flow: vec![0, 1, 0, 0, 0, 0, 0, 0],
        };
        (edges, graphstate)
    }

    #[test]
    fn reduced_cost_flips_sign_on_loaded_arcs() {
        let (edges, mut graphstate) = toy();
        graphstate.potential = vec![4, 0, 2, 0, 0];
        assert_eq!(reduced_cost(0, &edges, &graphstate), 5 - 4 + 2);
        assert_eq!(reduced_cost(1, &edges, &graphstate), -(1 - 4));
        assert_eq!(
            orient(1, &edges, &graphstate),
            EnteringArc { arc: 1, p: 3, q: 0 }
        );
        assert_eq!(
            orient(0, &edges, &graphstate),
            EnteringArc { arc: 0, p: 0, q: 2 }
        );
    }

    #[test]
    fn block_size_is_ceil_sqrt() {
        assert_eq!(block_size(1, 1), 1);
        assert_eq!(block_size(4, 1), 2);
        assert_eq!(block_size(5, 1), 3);
        assert_eq!(block_size(5, 10), 5);
        assert_eq!(block_size(9, 0), 3);
    }

    #[test]
    fn block_search_takes_first_minimum_and_advances_cursor() {
        let (edges, mut graphstate) = toy();
        graphstate.flow = vec![0; 8];
        // rc = [-1, -1, 3, 5]: arcs 0 and 1 tie, arc 0 is priced first.
        graphstate.potential = vec![6, 0, 0, 4, 0];
        let (index, arc) = BlockSearch.find_entering_arc(&edges, &graphstate, 0, 2);
        assert_eq!(index, 2);
        assert_eq!(arc.map(|a| a.arc), Some(0));

        // The block {2, 3} is clean, so the search moves on to {0, 1}.
        let (index, arc) = BlockSearch.find_entering_arc(&edges, &graphstate, 2, 2);
        assert_eq!(index, 2);
        assert_eq!(arc.map(|a| a.arc), Some(0));
    }

    #[test]
    fn block_search_wraps_around() {
        let (edges, mut graphstate) = toy();
        graphstate.flow = vec![0; 8];
        graphstate.potential = vec![6, 0, 0, 0, 0];
        // rc = [-1, -5, 3, 1]; the block {3, 0, 1} wraps and picks arc 1.
        let (index, arc) = BlockSearch.find_entering_arc(&edges, &graphstate, 3, 3);
        assert_eq!(index, 2);
        assert_eq!(arc.map(|a| a.arc), Some(1));
    }

    #[test]
    fn zero_reduced_costs_are_not_improving() {
        let (edges, mut graphstate) = toy();
        graphstate.flow = vec![0; 8];
        graphstate.potential = vec![1, 1, 0, 0, 0];
        // arc 1 and arc 3 both sit at exactly zero
        let (_, arc) = BlockSearch.find_entering_arc(&edges, &graphstate, 1, 2);
        assert_eq!(arc, None);
        let (_, arc) = BestEligible.find_entering_arc(&edges, &graphstate, 0, 2);
        assert_eq!(arc, None);
    }

    #[test]
    fn best_eligible_scans_everything() {
        let (edges, mut graphstate) = toy();
        graphstate.flow = vec![0; 8];
        graphstate.potential = vec![2, 4, 0, 0, 0];
        // rc = [3, -1, -1, -3]
        let (index, arc) = BestEligible.find_entering_arc(&edges, &graphstate, 7, 1);
        assert_eq!(index, 7);
        assert_eq!(arc, Some(EnteringArc { arc: 3, p: 1, q: 3 }));
    }
}
