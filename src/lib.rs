//! Minimum-cost distribution planning over transshipment networks.
//!
//! A validated [`Network`] (sources with supply caps, optional transshipment
//! hubs, destinations with demand minimums, costed routes, optional aggregate
//! constraints) is translated into an integer linear program, handed to an
//! external LP engine and turned back into a route-by-route flow plan.
//!
//! Pipeline: [`Network`] -> [`model::build`] -> [`SolverEngine::solve`] ->
//! [`solution::extract`] -> [`Solution`].
#![warn(
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod model;
pub mod network;
pub mod report;
pub mod solution;

pub use engine::{CbcEngine, GlpkEngine, RawSolution, SolveStatus, SolverEngine};
pub use error::Error;
pub use network::{
    Aggregate, Bound, Network, NodeEntry, NodeKind, RawAggregate, RawNode, RawRoute, Route,
    RouteEntry, RouteSpec,
};
pub use solution::{Plan, Solution};

/// Run the full planning pipeline for one network with the given engine.
///
/// Builds a fresh linear program, solves it, and extracts the plan. Each
/// invocation is independent; nothing is shared between runs.
pub fn plan<E: SolverEngine>(network: &Network, engine: &E) -> Result<Solution, Error> {
    let program = model::build(network);
    log::info!(
        "solving {} ({} variables, {} constraints) with {}",
        program.name,
        program.variables.len(),
        program.constraints.len(),
        engine.name()
    );

    let raw = engine.solve(&program)?;
    let result = solution::extract(network, &raw);

    log::info!("----------------------------------");
    log::info!("     status = {}", result.status());
    if let Solution::Optimal(plan) = &result {
        log::info!("routes used = {}", plan.flows.len());
        log::info!(" total cost = {}", plan.total_cost);
    }

    Ok(result)
}
