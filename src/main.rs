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

use anyhow::Context;
use clap::{Parser, ValueEnum};
use emdsimplex::pivotrules::*;
use emdsimplex::*;
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use time::OffsetDateTime;

use crate::transport_parser::parsed_instance;
mod transport_parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PivotRule {
    /// block search (Dantzig inside a block, Bland across blocks)
    Block,
    /// full Dantzig scan
    Best,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// paths to instance files
    #[arg(required = true)]
    filenames: Vec<String>,
    /// nb of processors, instances are solved concurrently
    #[arg(short, long, default_value_t = 1)]
    nbproc: usize,
    /// kfactor for block size, only for block search pivot rule
    #[arg(short, long, default_value_t = 1)]
    kfactor: usize,
    /// pivot budget per instance
    #[arg(short, long, default_value_t = SolverOptions::default().max_pivots)]
    max_pivots: usize,
    #[arg(short, long, value_enum, default_value_t = PivotRule::Block)]
    pivot: PivotRule,
    /// print every arc carrying flow
    #[arg(long)]
    flows: bool,
}

struct Report {
    solution: Solution,
    seconds: f64,
}

fn solve_file(file: &str, rule: PivotRule, options: &SolverOptions) -> anyhow::Result<Report> {
    let instance = parsed_instance(file)?;
    let start = OffsetDateTime::now_utc();
    let solution = match rule {
        PivotRule::Block => min_cost(
            &instance.source_demands,
            &instance.sink_demands,
            &instance.network_costs,
            BlockSearch,
            options,
        ),
        PivotRule::Best => min_cost(
            &instance.source_demands,
            &instance.sink_demands,
            &instance.network_costs,
            BestEligible,
            options,
        ),
    }
    .with_context(|| format!("solving {file}"))?;
    let seconds = (OffsetDateTime::now_utc() - start).as_seconds_f64();
    Ok(Report { solution, seconds })
}

fn print_status(file: &str, report: &Report, flows: bool) {
    println!(
        "{:?}, cost = {:?}, pivots = {:?}, time = {:.3}",
        file, report.solution.total_cost, report.solution.pivots, report.seconds
    );
    if flows {
        let graph = report.solution.flow_graph();
        for edge in graph.edge_references() {
            if let (Endpoint::Source(i), Endpoint::Sink(j)) =
                (graph[edge.source()], graph[edge.target()])
            {
                println!("    {:>6} -> {:<6} {:?}", i, j, edge.weight());
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    ThreadPoolBuilder::new()
        .num_threads(args.nbproc)
        .build_global()
        .context("building the thread pool")?;

    let options = SolverOptions {
        max_pivots: args.max_pivots,
        block_factor: args.kfactor,
    };
    let reports: Vec<anyhow::Result<Report>> = args
        .filenames
        .par_iter()
        .map(|file| solve_file(file, args.pivot, &options))
        .collect();

    let mut failures = 0;
    for (file, report) in args.filenames.iter().zip(reports) {
        match report {
            Ok(report) => print_status(file, &report, args.flows),
            Err(err) => {
                log::error!("{:#}", err);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{} of {} instances failed", failures, args.filenames.len());
    }
    Ok(())
}
