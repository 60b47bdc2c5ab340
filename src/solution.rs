//! Extraction of a distribution plan from raw engine output.

use std::collections::BTreeMap;

use crate::engine::{RawSolution, SolveStatus};
use crate::model::variable_name;
use crate::network::{Network, Route};

/// Relative tolerance for the recomputed-cost consistency check.
const RELATIVE_TOLERANCE: f64 = 1e-6;

/// Absolute distance from the nearest whole unit beyond which an
/// integer-variable value is flagged as fractional.
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// A cost-minimal flow assignment.
///
/// Routes carrying zero flow are omitted from the map; [`Plan::flow_on`]
/// reports them as zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    pub flows: BTreeMap<Route, u64>,
    /// Total shipping cost, recomputed from flows and unit costs.
    pub total_cost: f64,
}

impl Plan {
    pub fn flow_on(&self, route: &Route) -> u64 {
        self.flows.get(route).copied().unwrap_or(0)
    }
}

/// The terminal artifact of a planning run.
///
/// A flow assignment exists only for an optimal verdict; infeasible,
/// unbounded and unsolved outcomes carry no plan and can never be mistaken
/// for an all-zero assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum Solution {
    Optimal(Plan),
    Infeasible,
    Unbounded,
    NotSolved,
}

impl Solution {
    pub fn status(&self) -> SolveStatus {
        match self {
            Self::Optimal(_) => SolveStatus::Optimal,
            Self::Infeasible => SolveStatus::Infeasible,
            Self::Unbounded => SolveStatus::Unbounded,
            Self::NotSolved => SolveStatus::NotSolved,
        }
    }

    pub fn plan(&self) -> Option<&Plan> {
        match self {
            Self::Optimal(plan) => Some(plan),
            _ => None,
        }
    }
}

/// Convert raw variable values into a route -> flow plan.
///
/// Non-optimal statuses propagate unchanged. Values the engine did not
/// report count as zero; integer-variable values are rounded to whole units.
/// The recomputed total cost is cross-checked against the objective
/// evaluated at the raw values, and a mismatch beyond tolerance is logged as
/// a warning without blocking the result.
pub fn extract(network: &Network, raw: &RawSolution) -> Solution {
    match raw.status {
        SolveStatus::Optimal => {}
        SolveStatus::Infeasible => return Solution::Infeasible,
        SolveStatus::Unbounded => return Solution::Unbounded,
        SolveStatus::NotSolved => return Solution::NotSolved,
    }

    let mut flows = BTreeMap::new();
    let mut total_cost = 0.0;
    let mut reported = 0.0;
    for (route, spec) in network.routes() {
        let name = variable_name(route);
        let value = raw.values.get(&name).copied().unwrap_or(0.0);
        reported += spec.cost * value;
        let units = round_units(&name, value);
        if units > 0 {
            total_cost += spec.cost * units as f64;
            flows.insert(route.clone(), units);
        }
    }

    let scale = reported.abs().max(1.0);
    if (total_cost - reported).abs() / scale > RELATIVE_TOLERANCE {
        log::warn!(
            "recomputed total cost {total_cost} disagrees with engine objective {reported}, \
             possible adapter fault"
        );
    }

    Solution::Optimal(Plan { flows, total_cost })
}

fn round_units(name: &str, value: f64) -> u64 {
    let rounded = value.round();
    if (value - rounded).abs() > INTEGRALITY_TOLERANCE {
        log::warn!("variable {name} resolved to fractional value {value}, rounding to {rounded}");
    }
    if rounded < 0.0 {
        log::warn!("variable {name} resolved to negative value {value}, clamping to zero");
        return 0;
    }
    rounded as u64
}
