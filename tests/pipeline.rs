//! End-to-end pipeline tests.
//!
//! The pipeline is exercised hermetically through a stub engine; scenario
//! tests against the real CBC binary run only when `cbc` is installed and
//! skip with a notice otherwise.

use std::collections::BTreeMap;
use std::process::{Command, Stdio};

use flowplan::model::LinearProgram;
use flowplan::{
    plan, Aggregate, Bound, CbcEngine, Error, Network, NodeEntry, NodeKind, Plan, RawSolution,
    Route, RouteEntry, RouteSpec, SolveStatus, Solution, SolverEngine,
};

fn node(id: &str, kind: NodeKind) -> NodeEntry {
    NodeEntry {
        id: id.to_string(),
        kind,
    }
}

fn route(from: &str, to: &str, cost: f64, capacity: Option<u64>) -> RouteEntry {
    RouteEntry {
        route: Route::new(from, to),
        spec: RouteSpec { cost, capacity },
    }
}

/// The basic Brazil scenario: one source, one warehouse, three factories.
fn basic_network() -> Network {
    Network::new(
        vec![
            node("BR", NodeKind::Source { supply: 5000 }),
            node("W", NodeKind::Hub),
            node("DE", NodeKind::Destination { demand: 1500 }),
            node("PL", NodeKind::Destination { demand: 2000 }),
            node("RO", NodeKind::Destination { demand: 1000 }),
        ],
        vec![
            route("BR", "W", 5.0, None),
            route("BR", "DE", 8.0, None),
            route("BR", "PL", 7.0, None),
            route("BR", "RO", 6.0, None),
            route("W", "DE", 2.0, None),
            route("W", "PL", 3.0, None),
            route("W", "RO", 2.0, None),
        ],
        [],
    )
    .unwrap()
}

/// The restricted scenario: route capacities plus aggregate constraints.
/// DE can receive at most 1000 direct + 800 via the warehouse, far short of
/// its 5500 demand, so the model is infeasible.
fn restricted_network() -> Network {
    Network::new(
        vec![
            node("BR", NodeKind::Source { supply: 10000 }),
            node("W", NodeKind::Hub),
            node("DE", NodeKind::Destination { demand: 5500 }),
            node("PL", NodeKind::Destination { demand: 2000 }),
            node("RO", NodeKind::Destination { demand: 1000 }),
        ],
        vec![
            route("BR", "W", 5.0, Some(3000)),
            route("BR", "DE", 8.0, Some(1000)),
            route("BR", "PL", 7.0, Some(1500)),
            route("BR", "RO", 6.0, Some(1200)),
            route("W", "DE", 2.0, Some(800)),
            route("W", "PL", 3.0, Some(1000)),
            route("W", "RO", 2.0, Some(900)),
        ],
        vec![
            Aggregate {
                name: "Max_Direct_Shipments_From_BR".into(),
                routes: vec![
                    Route::new("BR", "DE"),
                    Route::new("BR", "PL"),
                    Route::new("BR", "RO"),
                ],
                bound: Bound::Max,
                limit: 2000,
            },
            Aggregate {
                name: "Min_Flow_Through_Warehouse".into(),
                routes: vec![Route::new("BR", "W")],
                bound: Bound::Min,
                limit: 1000,
            },
            Aggregate {
                name: "Warehouse_Capacity".into(),
                routes: vec![
                    Route::new("W", "DE"),
                    Route::new("W", "PL"),
                    Route::new("W", "RO"),
                ],
                bound: Bound::Max,
                limit: 2500,
            },
        ],
    )
    .unwrap()
}

/// Check a plan against every supply, demand, conservation and capacity rule.
fn assert_plan_respects_network(network: &Network, plan: &Plan) {
    for (id, kind) in network.nodes() {
        let outgoing: u64 = network.outgoing(id).map(|(r, _)| plan.flow_on(r)).sum();
        let incoming: u64 = network.incoming(id).map(|(r, _)| plan.flow_on(r)).sum();
        match kind {
            NodeKind::Source { supply } => {
                assert!(outgoing <= *supply, "source {id} ships {outgoing} > {supply}");
            }
            NodeKind::Destination { demand } => {
                assert!(incoming >= *demand, "destination {id} gets {incoming} < {demand}");
            }
            NodeKind::Hub => {
                assert_eq!(incoming, outgoing, "hub {id} does not conserve flow");
            }
        }
    }
    for (route, spec) in network.routes() {
        if let Some(capacity) = spec.capacity {
            assert!(
                plan.flow_on(route) <= capacity,
                "route {route} exceeds its capacity {capacity}"
            );
        }
    }
}

/// Engine double returning a canned verdict, for solver-free pipeline runs.
struct StubEngine {
    status: SolveStatus,
    values: BTreeMap<String, f64>,
}

impl StubEngine {
    fn optimal(values: &[(&str, f64)]) -> Self {
        Self {
            status: SolveStatus::Optimal,
            values: values
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        }
    }
}

impl SolverEngine for StubEngine {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn solve(&self, program: &LinearProgram) -> Result<RawSolution, Error> {
        // Every reported value must correspond to a declared variable.
        for name in self.values.keys() {
            assert!(
                program.variables.iter().any(|v| &v.name == name),
                "stub refers to unknown variable {name}"
            );
        }
        Ok(RawSolution {
            status: self.status,
            values: self.values.clone(),
        })
    }
}

struct OfflineEngine;

impl SolverEngine for OfflineEngine {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn solve(&self, _program: &LinearProgram) -> Result<RawSolution, Error> {
        Err(Error::SolverUnavailable("engine binary not found".into()))
    }
}

#[test]
fn pipeline_with_stub_engine_produces_checked_plan() {
    let network = basic_network();
    // Hand-computed optimum: DE via the warehouse (5+2 < 8), PL and RO direct.
    let engine = StubEngine::optimal(&[
        ("Route_BR_W", 1500.0),
        ("Route_W_DE", 1500.0),
        ("Route_BR_PL", 2000.0),
        ("Route_BR_RO", 1000.0),
    ]);

    let solution = plan(&network, &engine).unwrap();
    let result = solution.plan().unwrap();
    assert_eq!(result.total_cost, 30500.0);
    assert_eq!(result.flow_on(&Route::new("BR", "W")), 1500);
    assert_eq!(result.flow_on(&Route::new("BR", "DE")), 0);
    assert_plan_respects_network(&network, result);

    let text = flowplan::report::render_text(&network, &solution);
    assert!(text.contains("Status: Optimal"));
    assert!(text.contains("Total transportation cost = 30500"));

    let dot = flowplan::report::render_dot(&network, result);
    assert_eq!(dot.matches("->").count(), 4);
}

#[test]
fn pipeline_propagates_non_optimal_status() {
    let network = basic_network();
    let engine = StubEngine {
        status: SolveStatus::Infeasible,
        values: BTreeMap::new(),
    };
    let solution = plan(&network, &engine).unwrap();
    assert_eq!(solution, Solution::Infeasible);
    assert!(solution.plan().is_none());
}

#[test]
fn unavailable_engine_is_an_error_not_a_status() {
    let result = plan(&basic_network(), &OfflineEngine);
    assert!(matches!(result, Err(Error::SolverUnavailable(_))));
}

fn cbc_available() -> bool {
    Command::new("cbc")
        .arg("-quit")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

macro_rules! require_cbc {
    () => {
        if !cbc_available() {
            eprintln!("cbc binary not found, skipping");
            return;
        }
    };
}

#[test]
fn cbc_solves_basic_scenario_to_known_optimum() {
    require_cbc!();
    let network = basic_network();
    let solution = plan(&network, &CbcEngine).unwrap();
    let result = solution.plan().expect("basic scenario must be optimal");

    assert_eq!(result.total_cost, 30500.0);
    assert_plan_respects_network(&network, result);

    // DE is cheaper via the warehouse, PL and RO cheaper direct; the supply
    // cap stays non-binding.
    assert_eq!(result.flow_on(&Route::new("W", "DE")), 1500);
    assert_eq!(result.flow_on(&Route::new("BR", "PL")), 2000);
    assert_eq!(result.flow_on(&Route::new("BR", "RO")), 1000);
    let shipped: u64 = network
        .outgoing("BR")
        .map(|(r, _)| result.flow_on(r))
        .sum();
    assert!(shipped < 5000);
}

#[test]
fn cbc_reports_capacity_starved_demand_as_infeasible() {
    require_cbc!();
    let solution = plan(&restricted_network(), &CbcEngine).unwrap();
    assert_eq!(solution, Solution::Infeasible);
}

#[test]
fn cbc_honours_hub_window_constraints() {
    require_cbc!();
    let network = Network::new(
        vec![
            node("BR", NodeKind::Source { supply: 5000 }),
            node("W", NodeKind::Hub),
            node("DE", NodeKind::Destination { demand: 1500 }),
            node("PL", NodeKind::Destination { demand: 2000 }),
            node("RO", NodeKind::Destination { demand: 1000 }),
        ],
        vec![
            route("BR", "W", 5.0, Some(3000)),
            route("BR", "DE", 8.0, None),
            route("BR", "PL", 7.0, None),
            route("BR", "RO", 6.0, None),
            route("W", "DE", 2.0, None),
            route("W", "PL", 3.0, None),
            route("W", "RO", 2.0, None),
        ],
        vec![Aggregate {
            name: "Min_Flow_Through_Warehouse".into(),
            routes: vec![Route::new("BR", "W")],
            bound: Bound::Min,
            limit: 1000,
        }],
    )
    .unwrap();

    let solution = plan(&network, &CbcEngine).unwrap();
    let result = solution.plan().expect("windowed scenario must be optimal");
    let hub_inflow = result.flow_on(&Route::new("BR", "W"));
    assert!((1000..=3000).contains(&hub_inflow));
    assert_eq!(result.total_cost, 30500.0);
    assert_plan_respects_network(&network, result);
}

#[test]
fn cbc_solving_twice_is_idempotent_on_cost() {
    require_cbc!();
    let network = basic_network();
    let first = plan(&network, &CbcEngine).unwrap();
    let second = plan(&network, &CbcEngine).unwrap();
    assert_eq!(
        first.plan().unwrap().total_cost,
        second.plan().unwrap().total_cost
    );
}
