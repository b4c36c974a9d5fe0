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
use crate::error::{Result, SolverError};

use itertools::iproduct;
use itertools::Itertools;
use num_traits::ToPrimitive;
use std::cmp::Reverse;
use std::iter::once;

fn to_fixed_point(value: f64) -> std::result::Result<i64, &'static str> {
    if !value.is_finite() {
        return Err("is not finite");
    }
    if value < 0.0 {
        return Err("is negative");
    }
    (value * FP_MULTIPLIER as f64)
        .trunc()
        .to_i64()
        .ok_or("does not fit the fixed-point range")
}

fn check_shape<R: AsRef<[f64]>>(
    source_demands: &[f64],
    sink_demands: &[f64],
    network_costs: &[R],
) -> Result<()> {
    if source_demands.is_empty() || sink_demands.is_empty() {
        return Err(SolverError::ShapeMismatch(format!(
            "both distributions need at least one element, got {} sources and {} sinks",
            source_demands.len(),
            sink_demands.len()
        )));
    }
    if network_costs.len() != source_demands.len() {
        return Err(SolverError::ShapeMismatch(format!(
            "cost matrix has {} rows but there are {} sources",
            network_costs.len(),
            source_demands.len()
        )));
    }
    if let Some((row, costs)) = network_costs
        .iter()
        .find_position(|row| row.as_ref().len() != sink_demands.len())
    {
        return Err(SolverError::ShapeMismatch(format!(
            "cost row {} has {} entries but there are {} sinks",
            row,
            costs.as_ref().len(),
            sink_demands.len()
        )));
    }
    Ok(())
}

fn scale_masses(masses: &[f64], side: &str) -> Result<Vec<i64>> {
    masses
        .iter()
        .enumerate()
        .map(|(index, &mass)| {
            to_fixed_point(mass).map_err(|reason| {
                SolverError::InvalidInput(format!("{side} demand {index} ({mass}) {reason}"))
            })
        })
        .collect()
}

// The whole gap lands on the first largest element, it is never spread.
fn absorb_gap(side: &mut [i64], gap: i128) -> Result<()> {
    if let Some(index) = side.iter().position_min_by_key(|&&mass| Reverse(mass)) {
        side[index] = i64::try_from(side[index] as i128 + gap).map_err(|_| {
            SolverError::InvalidInput("rebalanced demand does not fit the fixed-point range".into())
        })?;
    }
    Ok(())
}

/// Bring both sides to the same total by topping up the deficient side.
pub fn rebalance(supply: &mut [i64], demand: &mut [i64]) -> Result<()> {
    let supply_sum: i128 = supply.iter().map(|&x| x as i128).sum();
    let demand_sum: i128 = demand.iter().map(|&x| x as i128).sum();
    if supply_sum < demand_sum {
        log::debug!("rebalancing sources by {}", demand_sum - supply_sum);
        absorb_gap(supply, demand_sum - supply_sum)?;
    } else if demand_sum < supply_sum {
        log::debug!("rebalancing sinks by {}", supply_sum - demand_sum);
        absorb_gap(demand, supply_sum - demand_sum)?;
    }
    Ok(())
}

/// Encode a transport instance and build the initial strongly feasible tree,
/// where every node hangs off the artificial root through its own arc.
pub fn initialization<R: AsRef<[f64]>>(
    source_demands: &[f64],
    sink_demands: &[f64],
    network_costs: &[R],
) -> Result<SimplexState> {
    check_shape(source_demands, sink_demands, network_costs)?;
    let n_sources = source_demands.len();
    let n_sinks = sink_demands.len();

    let mut supply = scale_masses(source_demands, "source")?;
    let mut sink_supply = scale_masses(sink_demands, "sink")?;
    rebalance(&mut supply, &mut sink_supply)?;

    let mut source: Vec<usize> = Vec::with_capacity(n_sources * n_sinks + n_sources + n_sinks);
    let mut target: Vec<usize> = Vec::with_capacity(source.capacity());
    let mut cost: Vec<i64> = Vec::with_capacity(source.capacity());
    let mut capacity: Vec<i64> = Vec::with_capacity(source.capacity());

    for (i, j) in iproduct!(0..n_sources, 0..n_sinks) {
        let value = network_costs[i].as_ref()[j];
        cost.push(to_fixed_point(value).map_err(|reason| {
            SolverError::InvalidInput(format!("cost ({i}, {j}) ({value}) {reason}"))
        })?);
        capacity.push(std::cmp::min(supply[i], sink_supply[j]));
        source.push(i);
        target.push(n_sources + j);
    }
    let transport_count = source.len();

    let demand: Vec<i64> = supply
        .iter()
        .map(|&s| -s)
        .chain(sink_supply.iter().copied())
        .collect();
    let node_nb = demand.len();
    let root = node_nb;

    let capacity_sum: i128 = capacity.iter().map(|&c| c as i128).sum();
    let cost_sum: i128 = cost.iter().map(|&c| c.unsigned_abs() as i128).sum();
    let demand_max: i128 = demand
        .iter()
        .map(|&d| d.unsigned_abs() as i128)
        .max()
        .unwrap_or(0);
    let max_value = capacity_sum.max(cost_sum).max(demand_max);
    let faux_infinity = if max_value == 0 {
        1
    } else if 3 * max_value > MAX_FAUX_INFINITY as i128 {
        return Err(SolverError::InvalidInput(format!(
            "instance is too large for the fixed-point encoding: faux infinity {} exceeds {}",
            3 * max_value,
            MAX_FAUX_INFINITY
        )));
    } else {
        (3 * max_value) as i64
    };

    // Positive demand draws from the root, everything else drains into it.
    demand.iter().enumerate().for_each(|(node, &d)| {
        if d > 0 {
            source.push(root);
            target.push(node);
        } else {
            source.push(node);
            target.push(root);
        }
        cost.push(faux_infinity);
        capacity.push(faux_infinity);
    });

    let flow: Vec<i64> = vec![0; transport_count]
        .into_iter()
        .chain(demand.iter().map(|d| d.abs()))
        .collect();
    let potential: Vec<i64> = demand
        .iter()
        .map(|&d| if d <= 0 { faux_infinity } else { -faux_infinity })
        .chain(once(0))
        .collect();

    let nodes = Nodes {
        thread: (1..=node_nb).chain(once(0)).collect(),
        revthread: once(root).chain(0..node_nb).collect(),
        predecessor: vec![Some(root); node_nb].into_iter().chain(once(None)).collect(),
        size: vec![1; node_nb].into_iter().chain(once(node_nb + 1)).collect(),
        edge_tree: (transport_count..transport_count + node_nb)
            .map(Some)
            .chain(once(None))
            .collect(),
        last: (0..node_nb).chain(once(node_nb - 1)).collect(),
    };

    log::debug!(
        "encoded {} sources x {} sinks: {} transport arcs, faux infinity {}",
        n_sources,
        n_sinks,
        transport_count,
        faux_infinity
    );

    Ok(SimplexState {
        nodes_state: nodes,
        graph_state: GraphState { potential, flow },
        edges_state: Edges {
            source,
            target,
            cost,
            capacity,
            transport_count,
        },
        demand,
        n_sources,
        n_sinks,
        faux_infinity,
    })
}
