//! Presentation collaborators: plain-text report and Graphviz DOT diagram.
//!
//! Both consume the terminal [`Solution`] artifact and never reach back into
//! the solving pipeline.

use std::collections::BTreeMap;

use itertools::Itertools;
use petgraph::dot::Dot;
use petgraph::graph::DiGraph;

use crate::model::variable_name;
use crate::network::Network;
use crate::solution::{Plan, Solution};

/// Render the solve outcome as text: status line, one line per route with
/// its resolved flow (zeros included), and the total cost.
pub fn render_text(network: &Network, solution: &Solution) -> String {
    let status_line = format!("Status: {}", solution.status());
    match solution.plan() {
        Some(plan) => {
            let route_lines = network
                .routes()
                .map(|(route, _)| format!("{} = {}", variable_name(route), plan.flow_on(route)))
                .join("\n");
            format!(
                "{status_line}\n{route_lines}\nTotal transportation cost = {}\n",
                plan.total_cost
            )
        }
        None => format!("{status_line}\nNo distribution plan available.\n"),
    }
}

/// Render the solved flow as a directed graph in DOT format.
///
/// Every declared node appears; edges are drawn only for routes carrying
/// strictly positive flow, labelled with the flow amount. Layout is left to
/// Graphviz.
pub fn render_dot(network: &Network, plan: &Plan) -> String {
    let mut graph = DiGraph::<&str, u64>::new();
    let mut indices = BTreeMap::new();
    for (id, _) in network.nodes() {
        indices.insert(id, graph.add_node(id));
    }
    for (route, flow) in &plan.flows {
        graph.add_edge(
            indices[route.from.as_str()],
            indices[route.to.as_str()],
            *flow,
        );
    }
    format!("{}", Dot::new(&graph))
}
