use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Deserialize;

use crate::error::Error;

/// A directed shipping lane between two declared nodes.
///
/// A route exists only where a unit cost is declared; undeclared pairs are
/// infeasible and never become decision variables.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Route {
    pub from: String,
    pub to: String,
}

impl Route {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Per-route data: unit shipping cost and an optional whole-unit capacity.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteSpec {
    pub cost: f64,
    pub capacity: Option<u64>,
}

/// The role a node plays in the network, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeKind {
    /// Origin with a supply cap on total outgoing flow.
    Source { supply: u64 },
    /// Pure transshipment point, conserves flow, no external supply or demand.
    Hub,
    /// Endpoint with a minimum demand on total incoming flow.
    Destination { demand: u64 },
}

impl NodeKind {
    pub fn role(&self) -> &'static str {
        match self {
            Self::Source { .. } => "source",
            Self::Hub => "hub",
            Self::Destination { .. } => "destination",
        }
    }
}

/// Direction of an aggregate bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Total flow over the listed routes must not exceed the limit.
    Max,
    /// Total flow over the listed routes must reach at least the limit.
    Min,
    /// Total flow over the listed routes must equal the limit exactly.
    Exact,
}

/// A caller-declared bound over the summed flow of a route subset.
///
/// Generalizes scenario-specific rules such as a direct-shipment cap, a
/// minimum quantity routed through a hub, or a hub throughput limit.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawAggregate")]
pub struct Aggregate {
    pub name: String,
    pub routes: Vec<Route>,
    pub bound: Bound,
    pub limit: u64,
}

/// A validated node declaration: identifier plus role.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct NodeEntry {
    pub id: String,
    pub kind: NodeKind,
}

/// A validated route declaration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawRoute")]
pub struct RouteEntry {
    pub route: Route,
    pub spec: RouteSpec,
}

//
// Raw record mirrors, as they appear in configuration input. Semantic
// validation happens in the TryFrom conversions.
//

#[derive(Clone, Debug, Deserialize)]
pub struct RawNode {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub quantity: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawRoute {
    pub from: String,
    pub to: String,
    pub cost: f64,
    #[serde(default)]
    pub capacity: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawAggregate {
    pub name: String,
    /// `;`-separated list of `from->to` pairs.
    pub routes: String,
    pub bound: String,
    pub limit: u64,
}

fn valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl TryFrom<RawNode> for NodeEntry {
    type Error = Error;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        if !valid_identifier(&raw.id) {
            return Err(Error::InvalidIdentifier(raw.id));
        }
        let kind = match raw.role.as_str() {
            "source" => match raw.quantity {
                Some(supply) => NodeKind::Source { supply },
                None => {
                    return Err(Error::MissingQuantity {
                        id: raw.id,
                        role: raw.role,
                    })
                }
            },
            "destination" => match raw.quantity {
                Some(demand) => NodeKind::Destination { demand },
                None => {
                    return Err(Error::MissingQuantity {
                        id: raw.id,
                        role: raw.role,
                    })
                }
            },
            "hub" => match raw.quantity {
                // A zero is tolerated: some inputs spell out that a hub
                // neither produces nor consumes.
                None | Some(0) => NodeKind::Hub,
                Some(_) => {
                    return Err(Error::UnexpectedQuantity {
                        id: raw.id,
                        role: raw.role,
                    })
                }
            },
            _ => return Err(Error::UnknownRole(raw.role)),
        };
        Ok(Self { id: raw.id, kind })
    }
}

impl TryFrom<RawRoute> for RouteEntry {
    type Error = Error;

    fn try_from(raw: RawRoute) -> Result<Self, Self::Error> {
        if raw.from == raw.to {
            return Err(Error::SelfLoopRoute {
                from: raw.from,
                to: raw.to,
            });
        }
        if !raw.cost.is_finite() || raw.cost < 0.0 {
            return Err(Error::InvalidCost {
                from: raw.from,
                to: raw.to,
                cost: raw.cost,
            });
        }
        Ok(Self {
            route: Route::new(raw.from, raw.to),
            spec: RouteSpec {
                cost: raw.cost,
                capacity: raw.capacity,
            },
        })
    }
}

impl TryFrom<RawAggregate> for Aggregate {
    type Error = Error;

    fn try_from(raw: RawAggregate) -> Result<Self, Self::Error> {
        if !valid_identifier(&raw.name) {
            return Err(Error::InvalidIdentifier(raw.name));
        }
        let bound = match raw.bound.as_str() {
            "max" => Bound::Max,
            "min" => Bound::Min,
            "exact" => Bound::Exact,
            _ => return Err(Error::UnknownBound(raw.bound)),
        };
        let mut routes = Vec::new();
        for reference in raw.routes.split(';') {
            let reference = reference.trim();
            match reference.split_once("->") {
                Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
                    routes.push(Route::new(from.trim(), to.trim()));
                }
                _ => {
                    return Err(Error::MalformedRouteReference {
                        name: raw.name,
                        reference: reference.to_string(),
                    })
                }
            }
        }
        Ok(Self {
            name: raw.name,
            routes,
            bound,
            limit: raw.limit,
        })
    }
}

/// Prefixes used by generated constraint names; aggregates may not shadow them.
const RESERVED_PREFIXES: [&str; 4] = ["Supply_", "Demand_", "Conservation_", "Route_Cap_"];

/// A validated, immutable description of the distribution network.
///
/// Construction is the single validation point: every malformed or
/// self-inconsistent input is rejected here with a configuration error, so
/// the model builder and solver only ever see well-formed data.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    nodes: BTreeMap<String, NodeKind>,
    routes: BTreeMap<Route, RouteSpec>,
    aggregates: Vec<Aggregate>,
}

impl Network {
    pub fn new(
        nodes: impl IntoIterator<Item = NodeEntry>,
        routes: impl IntoIterator<Item = RouteEntry>,
        aggregates: impl IntoIterator<Item = Aggregate>,
    ) -> Result<Self, Error> {
        let mut node_map = BTreeMap::new();
        for entry in nodes {
            if node_map.insert(entry.id.clone(), entry.kind).is_some() {
                return Err(Error::DuplicateNode(entry.id));
            }
        }

        let mut route_map: BTreeMap<Route, RouteSpec> = BTreeMap::new();
        for entry in routes {
            for node in [&entry.route.from, &entry.route.to] {
                if !node_map.contains_key(node) {
                    return Err(Error::UnknownRouteNode {
                        from: entry.route.from.clone(),
                        to: entry.route.to.clone(),
                        node: node.clone(),
                    });
                }
            }
            if route_map.contains_key(&entry.route) {
                return Err(Error::DuplicateRoute {
                    from: entry.route.from,
                    to: entry.route.to,
                });
            }
            route_map.insert(entry.route, entry.spec);
        }

        // Unusable supply or unmeetable demand is a configuration mistake,
        // not something to hand the solver as an infeasibility puzzle.
        for (id, kind) in &node_map {
            match kind {
                NodeKind::Source { .. } if !route_map.keys().any(|r| &r.from == id) => {
                    return Err(Error::UnusableSupply(id.clone()));
                }
                NodeKind::Destination { .. } if !route_map.keys().any(|r| &r.to == id) => {
                    return Err(Error::UnmeetableDemand(id.clone()));
                }
                _ => {}
            }
        }

        let aggregates: Vec<Aggregate> = aggregates.into_iter().collect();
        let mut seen_names = Vec::with_capacity(aggregates.len());
        for aggregate in &aggregates {
            if aggregate.routes.is_empty() {
                return Err(Error::EmptyAggregate(aggregate.name.clone()));
            }
            if seen_names.contains(&&aggregate.name) {
                return Err(Error::DuplicateAggregate(aggregate.name.clone()));
            }
            if RESERVED_PREFIXES.iter().any(|p| aggregate.name.starts_with(p)) {
                return Err(Error::ReservedAggregateName(aggregate.name.clone()));
            }
            let mut seen_routes = BTreeSet::new();
            for route in &aggregate.routes {
                if !route_map.contains_key(route) {
                    return Err(Error::UnknownAggregateRoute {
                        name: aggregate.name.clone(),
                        from: route.from.clone(),
                        to: route.to.clone(),
                    });
                }
                // A repeated reference would double the route's coefficient
                // and silently halve the effective bound.
                if !seen_routes.insert(route) {
                    return Err(Error::RepeatedAggregateRoute {
                        name: aggregate.name.clone(),
                        from: route.from.clone(),
                        to: route.to.clone(),
                    });
                }
            }
            seen_names.push(&aggregate.name);
        }

        log::debug!(
            "network validated: {} nodes, {} routes, {} aggregate constraints",
            node_map.len(),
            route_map.len(),
            aggregates.len()
        );

        Ok(Self {
            nodes: node_map,
            routes: route_map,
            aggregates,
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeKind)> {
        self.nodes.iter().map(|(id, kind)| (id.as_str(), kind))
    }

    pub fn routes(&self) -> impl Iterator<Item = (&Route, &RouteSpec)> {
        self.routes.iter()
    }

    pub fn route_spec(&self, route: &Route) -> Option<&RouteSpec> {
        self.routes.get(route)
    }

    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    /// Routes leaving the given node, in deterministic order.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = (&'a Route, &'a RouteSpec)> {
        self.routes.iter().filter(move |(r, _)| r.from == id)
    }

    /// Routes entering the given node, in deterministic order.
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = (&'a Route, &'a RouteSpec)> {
        self.routes.iter().filter(move |(r, _)| r.to == id)
    }

    /// Total declared supply over all sources.
    ///
    /// No feasible plan can push more than this across any single route,
    /// which makes it a valid upper bound for every decision variable.
    pub fn total_supply(&self) -> u64 {
        self.nodes
            .values()
            .map(|kind| match kind {
                NodeKind::Source { supply } => *supply,
                _ => 0,
            })
            .fold(0, u64::saturating_add)
    }
}
