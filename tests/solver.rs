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

use emdsimplex::pivotrules::{BestEligible, BlockSearch};
use emdsimplex::{min_cost, solve, solve_with_options, Solution, SolverError, SolverOptions};
use itertools::Itertools;
use proptest::collection::vec;
use proptest::prelude::*;

const EPS: f64 = 1e-6;

// Halves and quarters survive the fixed-point encoding without truncation.
fn instance() -> impl Strategy<Value = (Vec<f64>, Vec<f64>, Vec<Vec<f64>>)> {
    (1usize..6, 1usize..6).prop_flat_map(|(n, m)| {
        let mass = (0u32..9).prop_map(|k| k as f64 * 0.5);
        let cost = (0u32..40).prop_map(|k| k as f64 * 0.25);
        (
            vec(mass.clone(), n),
            vec(mass, m),
            vec(vec(cost, m), n),
        )
    })
}

fn check_plan(solution: &Solution, costs: &[Vec<f64>]) {
    let (n, m) = (solution.n_sources(), solution.n_sinks());
    for i in 0..n {
        let shipped: f64 = (0..m).map(|j| solution.flow(i, j)).sum();
        assert!((shipped - solution.source_demands[i]).abs() < EPS);
    }
    for j in 0..m {
        let received: f64 = (0..n).map(|i| solution.flow(i, j)).sum();
        assert!((received - solution.sink_demands[j]).abs() < EPS);
    }
    for (i, j) in (0..n).cartesian_product(0..m) {
        let flow = solution.flow(i, j);
        let capacity = solution.source_demands[i].min(solution.sink_demands[j]);
        assert!(flow >= 0.0 && flow <= capacity + EPS);

        // complementary slackness, an idle arc never prices negative and a
        // loaded one never prices positive
        let rc = costs[i][j] - solution.potentials[i] + solution.potentials[n + j];
        if flow == 0.0 {
            assert!(rc > -EPS, "idle arc ({i}, {j}) has reduced cost {rc}");
        } else {
            assert!(rc < EPS, "loaded arc ({i}, {j}) has reduced cost {rc}");
        }
    }
    let total: f64 = (0..n)
        .cartesian_product(0..m)
        .map(|(i, j)| solution.flow(i, j) * costs[i][j])
        .sum();
    assert!((total - solution.total_cost).abs() < EPS);
}

#[test]
fn scenarios_from_the_documentation() {
    assert_eq!(solve(&[1.0], &[1.0], &[[5.0]]).unwrap(), (5.0, vec![1.0]));
    assert_eq!(
        solve(&[1.0, 1.0], &[1.0, 1.0], &[[0.0, 1.0], [1.0, 0.0]]).unwrap(),
        (0.0, vec![1.0, 0.0, 0.0, 1.0])
    );
    assert_eq!(solve(&[2.0], &[1.0], &[[3.0]]).unwrap(), (6.0, vec![2.0]));
}

#[test]
fn rejects_bad_instances() {
    assert!(matches!(
        solve(&[1.0, 1.0], &[2.0], &[[1.0]]),
        Err(SolverError::ShapeMismatch(_))
    ));
    assert!(matches!(
        solve(&[1.0], &[1.0, 1.0], &[[1.0]]),
        Err(SolverError::ShapeMismatch(_))
    ));
    assert!(matches!(
        solve::<[f64; 1]>(&[], &[1.0], &[]),
        Err(SolverError::ShapeMismatch(_))
    ));
    assert!(matches!(
        solve(&[-1.0], &[1.0], &[[1.0]]),
        Err(SolverError::InvalidInput(_))
    ));
    assert!(matches!(
        solve(&[1.0], &[1.0], &[[f64::NAN]]),
        Err(SolverError::InvalidInput(_))
    ));
}

#[test]
fn largest_accepted_masses_solve_exactly() {
    // faux infinity = 6 * h * F, just under MAX_FAUX_INFINITY
    let h = 384_307_168_202.0;
    let solution =
        solve_with_options(&[h, h], &[2.0 * h], &[[h], [h]], &SolverOptions::default()).unwrap();
    assert_eq!(solution.flows, vec![h, h]);
    let expected = 2.0 * h * h;
    assert!((solution.total_cost - expected).abs() <= 1e-12 * expected);

    let h = 1e12;
    assert!(matches!(
        solve(&[h, h], &[2.0 * h], &[[h], [h]]),
        Err(SolverError::InvalidInput(_))
    ));
}

#[test]
fn gap_goes_to_the_first_heaviest_source() {
    let costs = [[1.0, 2.0], [3.0, 1.0], [2.0, 2.0]];
    let solution =
        solve_with_options(&[0.5, 1.0, 1.0], &[2.0, 1.5], &costs, &SolverOptions::default())
            .unwrap();
    assert_eq!(solution.source_demands, vec![0.5, 2.0, 1.0]);
    assert_eq!(solution.sink_demands, vec![2.0, 1.5]);
}

#[test]
fn flow_graph_matches_the_plan() {
    let solution = solve_with_options(
        &[1.0, 2.0],
        &[2.0, 1.0],
        &[[0.0, 2.0], [1.0, 0.0]],
        &SolverOptions::default(),
    )
    .unwrap();
    assert_eq!(solution.total_cost, 1.0);
    let graph = solution.flow_graph();
    let shipped: f64 = graph.raw_edges().iter().map(|e| e.weight).sum();
    assert_eq!(shipped, 3.0);
    assert_eq!(graph.edge_count(), 3);
}

proptest! {
    #[test]
    fn plans_are_feasible_and_optimal((sources, sinks, costs) in instance()) {
        let solution =
            solve_with_options(&sources, &sinks, &costs, &SolverOptions::default()).unwrap();
        check_plan(&solution, &costs);
        let total_sources: f64 = solution.source_demands.iter().sum();
        let total_sinks: f64 = solution.sink_demands.iter().sum();
        prop_assert!((total_sources - total_sinks).abs() < EPS);
    }

    #[test]
    fn pivot_rules_reach_the_same_cost((sources, sinks, costs) in instance(), kfactor in 1usize..4) {
        let options = SolverOptions { block_factor: kfactor, ..SolverOptions::default() };
        let block = min_cost(&sources, &sinks, &costs, BlockSearch, &options).unwrap();
        let best = min_cost(&sources, &sinks, &costs, BestEligible, &options).unwrap();
        check_plan(&best, &costs);
        prop_assert_eq!(block.total_cost, best.total_cost);
    }

    #[test]
    fn solving_twice_gives_the_same_answer((sources, sinks, costs) in instance()) {
        let first = solve(&sources, &sinks, &costs).unwrap();
        let second = solve(&sources, &sinks, &costs).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn unit_masses_match_the_best_assignment(
        costs in (1usize..5).prop_flat_map(|n| vec(vec(0u32..10, n), n)),
    ) {
        let n = costs.len();
        let costs: Vec<Vec<f64>> = costs
            .iter()
            .map(|row| row.iter().map(|&c| c as f64).collect())
            .collect();
        let (cost, _) = solve(&vec![1.0; n], &vec![1.0; n], &costs).unwrap();
        let best = (0..n)
            .permutations(n)
            .map(|sigma| sigma.iter().enumerate().map(|(i, &j)| costs[i][j]).sum::<f64>())
            .fold(f64::INFINITY, f64::min);
        prop_assert_eq!(cost, best);
    }
}
