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

//! Exact Earth Mover's Distance through a primal network simplex.
//!
//! Masses and costs are scaled by [`FP_MULTIPLIER`] and truncated to `i64`,
//! so pivoting runs on exact integers. The basis is a spanning tree of the
//! complete `source x sink` bipartite graph plus one artificial root, kept
//! as parent / size / last-descendant / thread arrays.
//!
//! ```
//! let (cost, flows) = emdsimplex::solve(
//!     &[1.0, 1.0],
//!     &[1.0, 1.0],
//!     &[[0.0, 1.0], [1.0, 0.0]],
//! )
//! .unwrap();
//! assert_eq!(cost, 0.0);
//! assert_eq!(flows, vec![1.0, 0.0, 0.0, 1.0]);
//! ```

use crate::basetypes::*;
use crate::cycle::*;
use crate::pivotrules::*;
use crate::tree::*;

pub mod basetypes;
pub mod cycle;
pub mod encoding;
pub mod error;
pub mod pivotrules;
pub mod solution;
pub mod tree;

pub use crate::basetypes::{SolverOptions, FP_MULTIPLIER, MAX_FAUX_INFINITY};
pub use crate::error::{Result, SolverError};
pub use crate::solution::{Endpoint, Solution};

/// Run one pivot with `entering` as the entering arc: push flow around the
/// cycle it closes and, unless it leaves again at once, swap it into the
/// tree in place of the bottleneck arc.
pub fn pivot(state: &mut SimplexState, entering: EnteringArc) -> LeavingArc {
    let EnteringArc { arc: i, mut p, mut q } = entering;
    let cycle = find_cycle(&state.nodes_state, i, p, q);
    let leaving = find_leaving_edge(&state.edges_state, &state.graph_state, &cycle);
    augment_flow(
        &state.edges_state,
        &mut state.graph_state,
        &cycle,
        leaving.delta,
    );

    if i != leaving.arc {
        let (mut s, mut t) = (leaving.s, leaving.t);
        if state.nodes_state.predecessor[t] != Some(s) {
            std::mem::swap(&mut s, &mut t);
        }
        // q has to sit in the subtree that gets cut off
        if cycle.position(i) > cycle.position(leaving.arc) {
            std::mem::swap(&mut p, &mut q);
        }
        remove_edge(&mut state.nodes_state, s, t);
        make_root(&mut state.nodes_state, q);
        add_edge(&mut state.nodes_state, i, p, q);
        update_potentials(
            &state.edges_state,
            &state.nodes_state,
            &mut state.graph_state,
            i,
            p,
            q,
        );
    }
    leaving
}

// main algorithm function
fn run<PR: PivotRules>(
    state: &mut SimplexState,
    pivotrule: &PR,
    options: &SolverOptions,
) -> Result<usize> {
    let block_size = block_size(state.edges_state.transport_count, options.block_factor);
    let mut index = 0;
    let mut iteration = 0;

    loop {
        let (next_index, entering) = pivotrule.find_entering_arc(
            &state.edges_state,
            &state.graph_state,
            index,
            block_size,
        );
        index = next_index;
        let Some(entering) = entering else {
            break;
        };
        if iteration >= options.max_pivots {
            return Err(SolverError::NonConvergence { pivots: iteration });
        }
        let leaving = pivot(state, entering);
        log::trace!(
            "pivot {}: arc {} enters, arc {} leaves, delta {}",
            iteration,
            entering.arc,
            leaving.arc,
            leaving.delta
        );
        iteration += 1;
    }
    Ok(iteration)
}

/// Minimum cost transport between `source_demands` and `sink_demands` with
/// an explicit pivot rule and options.
pub fn min_cost<R: AsRef<[f64]>, PR: PivotRules + std::fmt::Display>(
    source_demands: &[f64],
    sink_demands: &[f64],
    network_costs: &[R],
    pivotrule: PR,
    options: &SolverOptions,
) -> Result<Solution> {
    let mut state = encoding::initialization(source_demands, sink_demands, network_costs)?;
    let pivots = run(&mut state, &pivotrule, options)?;
    let solution = solution::extract(&state, pivots);
    log::info!(
        "{}: optimal after {} pivots, cost {}",
        pivotrule,
        pivots,
        solution.total_cost
    );
    Ok(solution)
}

pub fn solve_with_options<R: AsRef<[f64]>>(
    source_demands: &[f64],
    sink_demands: &[f64],
    network_costs: &[R],
    options: &SolverOptions,
) -> Result<Solution> {
    min_cost(
        source_demands,
        sink_demands,
        network_costs,
        BlockSearch,
        options,
    )
}

/// Earth Mover's Distance between two non-negative mass vectors under
/// `network_costs[source][sink]`.
///
/// Returns the total cost and the flow on every `source x sink` arc in
/// row-major order. When the two totals differ, the gap is added to the
/// largest mass of the lighter side before solving.
pub fn solve<R: AsRef<[f64]>>(
    source_demands: &[f64],
    sink_demands: &[f64],
    network_costs: &[R],
) -> Result<(f64, Vec<f64>)> {
    let solution = solve_with_options(
        source_demands,
        sink_demands,
        network_costs,
        &SolverOptions::default(),
    )?;
    Ok((solution.total_cost, solution.flows))
}
