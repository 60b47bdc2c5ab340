//! Adapters between the in-crate [`LinearProgram`] and external LP engines.
//!
//! Solving is delegated to installed solver binaries (CBC, GLPK) through the
//! `lp-solvers` crate, which writes the program to a CPLEX-LP file, invokes
//! the binary and parses the solution it reports. The adapter never mutates
//! the program and surfaces engine verdicts verbatim.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use lp_solvers::lp_format::{Constraint as LpConstraint, LpObjective};
use lp_solvers::problem::{Problem, StrExpression, Variable as LpVariable};
use lp_solvers::solvers::{CbcSolver, GlpkSolver, SolverTrait, Status};

use crate::error::Error;
use crate::model::{LinearProgram, Relation, Term};

/// The engine's verdict on a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    NotSolved,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Optimal => "Optimal",
            Self::Infeasible => "Infeasible",
            Self::Unbounded => "Unbounded",
            Self::NotSolved => "Not Solved",
        })
    }
}

/// Raw engine output: a status and, when optimal, per-variable values.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSolution {
    pub status: SolveStatus,
    pub values: BTreeMap<String, f64>,
}

/// Seam between model construction and the solving backend.
///
/// Implementations must not mutate the program and must not reinterpret
/// engine verdicts; an unreachable engine is an error, an infeasible model
/// is not.
pub trait SolverEngine {
    /// Engine name for logging and diagnostics.
    fn name(&self) -> &'static str;

    fn solve(&self, program: &LinearProgram) -> Result<RawSolution, Error>;
}

/// The COIN-OR `cbc` command-line solver.
#[derive(Clone, Debug, Default)]
pub struct CbcEngine;

impl SolverEngine for CbcEngine {
    fn name(&self) -> &'static str {
        "cbc"
    }

    fn solve(&self, program: &LinearProgram) -> Result<RawSolution, Error> {
        let problem = to_problem(program);
        log::debug!("handing {} to cbc", program.name);
        let solution = CbcSolver::default()
            .run(&problem)
            .map_err(|e| Error::SolverUnavailable(format!("cbc: {e:?}")))?;
        Ok(raw_solution(solution.status, widen(solution.results)))
    }
}

/// The GNU `glpsol` command-line solver.
#[derive(Clone, Debug, Default)]
pub struct GlpkEngine;

impl SolverEngine for GlpkEngine {
    fn name(&self) -> &'static str {
        "glpk"
    }

    fn solve(&self, program: &LinearProgram) -> Result<RawSolution, Error> {
        let problem = to_problem(program);
        log::debug!("handing {} to glpsol", program.name);
        let solution = GlpkSolver::default()
            .run(&problem)
            .map_err(|e| Error::SolverUnavailable(format!("glpk: {e:?}")))?;
        Ok(raw_solution(solution.status, widen(solution.results)))
    }
}

/// `lp-solvers` reports variable values as `f32`; everything downstream works
/// in `f64`.
fn widen(
    results: impl IntoIterator<Item = (String, f32)>,
) -> impl Iterator<Item = (String, f64)> {
    results.into_iter().map(|(name, value)| (name, f64::from(value)))
}

fn raw_solution(status: Status, results: impl IntoIterator<Item = (String, f64)>) -> RawSolution {
    let status = map_status(status);
    let values = match status {
        SolveStatus::Optimal => results.into_iter().collect(),
        // A non-optimal verdict carries no meaningful assignment.
        _ => BTreeMap::new(),
    };
    log::debug!("engine verdict: {status}");
    RawSolution { status, values }
}

fn map_status(status: Status) -> SolveStatus {
    match status {
        Status::Optimal => SolveStatus::Optimal,
        Status::Infeasible => SolveStatus::Infeasible,
        Status::Unbounded => SolveStatus::Unbounded,
        Status::NotSolved => SolveStatus::NotSolved,
        other => {
            log::warn!("engine reported unexpected status {other:?}, treating as not solved");
            SolveStatus::NotSolved
        }
    }
}

/// Convert the program into the `lp-solvers` representation.
fn to_problem(program: &LinearProgram) -> Problem {
    Problem {
        name: program.name.clone(),
        sense: LpObjective::Minimize,
        objective: render_expression(&program.objective),
        variables: program
            .variables
            .iter()
            .map(|v| LpVariable {
                name: v.name.clone(),
                is_integer: true,
                lower_bound: 0.0,
                upper_bound: v.upper_bound as f64,
            })
            .collect(),
        constraints: program
            .constraints
            .iter()
            .map(|c| LpConstraint {
                lhs: render_expression(&c.terms),
                operator: match c.relation {
                    Relation::Le => Ordering::Less,
                    Relation::Ge => Ordering::Greater,
                    Relation::Eq => Ordering::Equal,
                },
                rhs: c.rhs,
            })
            .collect(),
    }
}

/// Render terms as a CPLEX-LP linear expression, e.g. `5 Route_BR_W - 1 Route_W_DE`.
fn render_expression(terms: &[Term]) -> StrExpression {
    if terms.is_empty() {
        return StrExpression("0".to_string());
    }
    let mut out = String::new();
    for (i, term) in terms.iter().enumerate() {
        if i == 0 {
            if term.coefficient < 0.0 {
                out.push('-');
            }
        } else {
            out.push_str(if term.coefficient < 0.0 { " - " } else { " + " });
        }
        out.push_str(&format!("{} {}", term.coefficient.abs(), term.variable));
    }
    StrExpression(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, Variable};
    use crate::network::Route;

    fn term(variable: &str, coefficient: f64) -> Term {
        Term {
            variable: variable.to_string(),
            coefficient,
        }
    }

    #[test]
    fn renders_signed_expressions() {
        let rendered = render_expression(&[
            term("Route_BR_W", 1.0),
            term("Route_W_DE", -1.0),
            term("Route_W_PL", -1.0),
        ]);
        assert_eq!(rendered.0, "1 Route_BR_W - 1 Route_W_DE - 1 Route_W_PL");

        let rendered = render_expression(&[term("Route_BR_W", -2.5)]);
        assert_eq!(rendered.0, "-2.5 Route_BR_W");

        assert_eq!(render_expression(&[]).0, "0");
    }

    #[test]
    fn converts_program_shape() {
        let program = LinearProgram {
            name: "distribution_plan".into(),
            variables: vec![Variable {
                name: "Route_BR_DE".into(),
                route: Route::new("BR", "DE"),
                upper_bound: 5000,
            }],
            objective: vec![term("Route_BR_DE", 8.0)],
            constraints: vec![
                Constraint {
                    name: "Demand_DE".into(),
                    terms: vec![term("Route_BR_DE", 1.0)],
                    relation: Relation::Ge,
                    rhs: 1500.0,
                },
                Constraint {
                    name: "Conservation_W".into(),
                    terms: vec![term("Route_BR_W", 1.0), term("Route_W_DE", -1.0)],
                    relation: Relation::Eq,
                    rhs: 0.0,
                },
            ],
        };
        let problem = to_problem(&program);

        assert_eq!(problem.name, "distribution_plan");
        assert_eq!(problem.variables.len(), 1);
        assert!(problem.variables[0].is_integer);
        assert_eq!(problem.variables[0].lower_bound, 0.0);
        assert_eq!(problem.variables[0].upper_bound, 5000.0);
        assert_eq!(problem.objective.0, "8 Route_BR_DE");
        assert_eq!(problem.constraints[0].operator, Ordering::Greater);
        assert_eq!(problem.constraints[0].rhs, 1500.0);
        assert_eq!(problem.constraints[1].operator, Ordering::Equal);
    }

    #[test]
    fn maps_engine_statuses_verbatim() {
        assert_eq!(map_status(Status::Optimal), SolveStatus::Optimal);
        assert_eq!(map_status(Status::Infeasible), SolveStatus::Infeasible);
        assert_eq!(map_status(Status::Unbounded), SolveStatus::Unbounded);
        assert_eq!(map_status(Status::NotSolved), SolveStatus::NotSolved);
    }

    #[test]
    fn widens_engine_reported_values_to_f64() {
        let results: std::collections::HashMap<String, f32> =
            [("Route_BR_DE".to_string(), 1500.0_f32)].into_iter().collect();
        let raw = raw_solution(Status::Optimal, widen(results));
        assert_eq!(raw.values["Route_BR_DE"], 1500.0_f64);
    }

    #[test]
    fn non_optimal_outcomes_drop_assignments() {
        let raw = raw_solution(Status::Infeasible, [("Route_BR_DE".to_string(), 3.0)]);
        assert_eq!(raw.status, SolveStatus::Infeasible);
        assert!(raw.values.is_empty());

        let raw = raw_solution(Status::Optimal, [("Route_BR_DE".to_string(), 3.0)]);
        assert_eq!(raw.values["Route_BR_DE"], 3.0);
    }
}
