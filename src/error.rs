use displaydoc::Display;

/// Failures that abort a planning run before or during solving.
///
/// Mathematical outcomes (infeasible, unbounded, not solved) are not errors;
/// they are carried by [`crate::Solution`].
#[derive(Clone, Debug, Display, PartialEq)]
pub enum Error {
    /// node identifier `{0}` is not a valid name (expected `[A-Za-z][A-Za-z0-9_]*`)
    InvalidIdentifier(String),
    /// node `{0}` is declared more than once
    DuplicateNode(String),
    /// route {from} -> {to} is declared more than once
    DuplicateRoute { from: String, to: String },
    /// route {from} -> {to} starts and ends at the same node
    SelfLoopRoute { from: String, to: String },
    /// route {from} -> {to} references undeclared node `{node}`
    UnknownRouteNode {
        from: String,
        to: String,
        node: String,
    },
    /// route {from} -> {to} has a negative or non-finite unit cost ({cost})
    InvalidCost { from: String, to: String, cost: f64 },
    /// node `{id}` has role `{role}` but carries no quantity for it
    MissingQuantity { id: String, role: String },
    /// node `{id}` has role `{role}` which does not take a quantity
    UnexpectedQuantity { id: String, role: String },
    /// unknown node role `{0}` (expected `source`, `hub` or `destination`)
    UnknownRole(String),
    /// source `{0}` has no outgoing route, its supply can never be used
    UnusableSupply(String),
    /// destination `{0}` has no incoming route, its demand can never be met
    UnmeetableDemand(String),
    /// aggregate constraint `{0}` lists no routes
    EmptyAggregate(String),
    /// aggregate constraint name `{0}` is already taken
    DuplicateAggregate(String),
    /// aggregate constraint name `{0}` collides with a generated constraint name
    ReservedAggregateName(String),
    /// unknown aggregate bound `{0}` (expected `max`, `min` or `exact`)
    UnknownBound(String),
    /// aggregate constraint `{name}` references unknown route {from} -> {to}
    UnknownAggregateRoute {
        name: String,
        from: String,
        to: String,
    },
    /// aggregate constraint `{name}` lists route {from} -> {to} more than once
    RepeatedAggregateRoute {
        name: String,
        from: String,
        to: String,
    },
    /// malformed route reference `{reference}` in aggregate `{name}` (expected `from->to`)
    MalformedRouteReference { name: String, reference: String },
    /// the external solving engine could not be invoked: {0}
    SolverUnavailable(String),
}

impl std::error::Error for Error {}
