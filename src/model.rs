//! Translation of a validated [`Network`] into an immutable linear program.
//!
//! Construction is deterministic: node and route iteration follows the
//! descriptor's ordered maps, so variable and constraint names come out in
//! the same order for the same input, and solver diagnostics can reference
//! constraints by stable name.

use crate::network::{Bound, Network, NodeKind, Route};

/// `coefficient * variable`, one addend of a linear expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    pub variable: String,
    pub coefficient: f64,
}

/// A non-negative integer decision variable carrying the flow on one route.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: String,
    pub route: Route,
    /// Inclusive upper bound; total declared supply unless a tighter one
    /// exists. Lower bound is always zero.
    pub upper_bound: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    /// Left-hand side must not exceed the right-hand side.
    Le,
    /// Left-hand side must reach at least the right-hand side.
    Ge,
    /// Exact equality.
    Eq,
}

/// A named linear constraint over a subset of the decision variables.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub terms: Vec<Term>,
    pub relation: Relation,
    pub rhs: f64,
}

/// A fully assembled minimization program, ready to hand to an engine.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearProgram {
    pub name: String,
    pub variables: Vec<Variable>,
    /// Objective to minimize: total shipping cost.
    pub objective: Vec<Term>,
    pub constraints: Vec<Constraint>,
}

impl LinearProgram {
    /// Look up a constraint by its generated or declared name.
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// The decision variable carrying the flow on `route`, if the route exists.
    pub fn variable_for(&self, route: &Route) -> Option<&Variable> {
        self.variables.iter().find(|v| &v.route == route)
    }
}

/// The decision variable name for a route, in the `Route_{from}_{to}` scheme.
pub fn variable_name(route: &Route) -> String {
    format!("Route_{}_{}", route.from, route.to)
}

/// Build the linear program for a validated network.
///
/// One variable per declared route, one constraint per supply cap, demand
/// minimum, hub conservation rule, route capacity and declared aggregate.
pub fn build(network: &Network) -> LinearProgram {
    let horizon = network.total_supply() as f64;

    let variables: Vec<Variable> = network
        .routes()
        .map(|(route, _)| Variable {
            name: variable_name(route),
            route: route.clone(),
            upper_bound: network.total_supply(),
        })
        .collect();

    let objective: Vec<Term> = network
        .routes()
        .map(|(route, spec)| Term {
            variable: variable_name(route),
            coefficient: spec.cost,
        })
        .collect();

    let mut constraints = Vec::new();

    for (id, kind) in network.nodes() {
        match kind {
            NodeKind::Source { supply } => constraints.push(Constraint {
                name: format!("Supply_{id}"),
                terms: sum_terms(network.outgoing(id).map(|(r, _)| r), 1.0),
                relation: Relation::Le,
                rhs: *supply as f64,
            }),
            NodeKind::Destination { demand } => constraints.push(Constraint {
                name: format!("Demand_{id}"),
                terms: sum_terms(network.incoming(id).map(|(r, _)| r), 1.0),
                relation: Relation::Ge,
                rhs: *demand as f64,
            }),
            NodeKind::Hub => {
                let mut terms = sum_terms(network.incoming(id).map(|(r, _)| r), 1.0);
                terms.extend(sum_terms(network.outgoing(id).map(|(r, _)| r), -1.0));
                if terms.is_empty() {
                    // An isolated hub constrains nothing.
                    log::debug!("hub {id} has no incident routes, skipping conservation");
                    continue;
                }
                constraints.push(Constraint {
                    name: format!("Conservation_{id}"),
                    terms,
                    relation: Relation::Eq,
                    rhs: 0.0,
                });
            }
        }
    }

    for (route, spec) in network.routes() {
        if let Some(capacity) = spec.capacity {
            constraints.push(Constraint {
                name: format!("Route_Cap_{}_{}", route.from, route.to),
                terms: vec![Term {
                    variable: variable_name(route),
                    coefficient: 1.0,
                }],
                relation: Relation::Le,
                rhs: capacity as f64,
            });
        }
    }

    for aggregate in network.aggregates() {
        constraints.push(Constraint {
            name: aggregate.name.clone(),
            terms: sum_terms(aggregate.routes.iter(), 1.0),
            relation: match aggregate.bound {
                Bound::Max => Relation::Le,
                Bound::Min => Relation::Ge,
                Bound::Exact => Relation::Eq,
            },
            rhs: aggregate.limit as f64,
        });
    }

    log::debug!(
        "built program: {} variables, {} constraints, horizon {horizon}",
        variables.len(),
        constraints.len()
    );

    LinearProgram {
        name: "distribution_plan".to_string(),
        variables,
        objective,
        constraints,
    }
}

fn sum_terms<'a>(routes: impl Iterator<Item = &'a Route>, coefficient: f64) -> Vec<Term> {
    routes
        .map(|route| Term {
            variable: variable_name(route),
            coefficient,
        })
        .collect()
}
