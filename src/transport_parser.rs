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
use std::fs;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct TransportInstance {
    pub source_demands: Vec<f64>,
    pub sink_demands: Vec<f64>,
    pub network_costs: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("missing problem line `p emd <sources> <sinks>`")]
    MissingProblemLine,
}

fn malformed(line: usize, message: impl Into<String>) -> ParseError {
    ParseError::Malformed {
        line,
        message: message.into(),
    }
}

fn field<T: FromStr>(fields: &[&str], k: usize, line: usize, what: &str) -> Result<T, ParseError> {
    let raw = fields
        .get(k)
        .ok_or_else(|| malformed(line, format!("missing {what}")))?;
    raw.parse::<T>()
        .map_err(|_| malformed(line, format!("cannot parse {what} from {raw:?}")))
}

fn index(fields: &[&str], k: usize, line: usize, what: &str, bound: usize) -> Result<usize, ParseError> {
    let value: usize = field(fields, k, line, what)?;
    if value >= bound {
        return Err(malformed(
            line,
            format!("{what} {value} out of range, expected < {bound}"),
        ));
    }
    Ok(value)
}

/// Parse a DIMACS-like EMD instance:
///
/// ```text
/// c comment
/// p emd <n_sources> <n_sinks>
/// s <i> <mass>
/// t <j> <mass>
/// a <i> <j> <cost>
/// ```
///
/// Masses and costs that never appear default to zero.
pub fn parse_instance(contents: &str) -> Result<TransportInstance, ParseError> {
    let mut instance: Option<TransportInstance> = None;
    for (number, x) in contents.lines().enumerate() {
        let line = number + 1;
        let fields: Vec<&str> = x.split_whitespace().collect();
        match fields.first().copied() {
            None | Some("c") => continue,
            Some("p") => {
                if instance.is_some() {
                    return Err(malformed(line, "duplicate problem line"));
                }
                if fields.get(1).copied() != Some("emd") {
                    return Err(malformed(line, "problem type must be `emd`"));
                }
                let n_sources: usize = field(&fields, 2, line, "source count")?;
                let n_sinks: usize = field(&fields, 3, line, "sink count")?;
                instance = Some(TransportInstance {
                    source_demands: vec![0.0; n_sources],
                    sink_demands: vec![0.0; n_sinks],
                    network_costs: vec![vec![0.0; n_sinks]; n_sources],
                });
            }
            Some("s") => {
                let inst = instance.as_mut().ok_or(ParseError::MissingProblemLine)?;
                let i = index(&fields, 1, line, "source", inst.source_demands.len())?;
                inst.source_demands[i] = field(&fields, 2, line, "mass")?;
            }
            Some("t") => {
                let inst = instance.as_mut().ok_or(ParseError::MissingProblemLine)?;
                let j = index(&fields, 1, line, "sink", inst.sink_demands.len())?;
                inst.sink_demands[j] = field(&fields, 2, line, "mass")?;
            }
            Some("a") => {
                let inst = instance.as_mut().ok_or(ParseError::MissingProblemLine)?;
                let i = index(&fields, 1, line, "source", inst.source_demands.len())?;
                let j = index(&fields, 2, line, "sink", inst.sink_demands.len())?;
                inst.network_costs[i][j] = field(&fields, 3, line, "cost")?;
            }
            Some(other) => {
                return Err(malformed(line, format!("unknown record {other:?}")));
            }
        }
    }
    instance.ok_or(ParseError::MissingProblemLine)
}

pub fn parsed_instance(filename: &str) -> anyhow::Result<TransportInstance> {
    let contents =
        fs::read_to_string(filename).with_context(|| format!("reading {filename}"))?;
    parse_instance(&contents).with_context(|| format!("parsing {filename}"))
}
