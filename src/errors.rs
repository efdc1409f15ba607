//! Error types produced while building, parsing or solving trusses.

use petgraph::graph::{EdgeIndex, NodeIndex};
use thiserror::Error;

use crate::section::ShapeTag;

/// Error returned when a truss cannot be built or solved.
///
/// Every variant is terminal: a truss that reports one of these produces no
/// force vector. Member failure by buckling or yielding is a regular analysis
/// result and never surfaces here.
#[derive(Debug, Error, PartialEq)]
pub enum TrussError {
    /// Returned when a member or force names a node that was never declared.
    #[error("node `{0}` is not defined in this truss")]
    UndefinedNodeReference(String),
    /// Returned when a node name is declared twice.
    #[error("node `{0}` is defined more than once")]
    DuplicateNode(String),
    /// Returned when the dimension count does not match the declared shape.
    #[error("{shape} section expects {expected} dimensions (received {found})")]
    InvalidConfiguration {
        /// Shape that was requested.
        shape: ShapeTag,
        /// Number of dimensions the shape requires.
        expected: usize,
        /// Number of dimensions supplied.
        found: usize,
    },
    /// Returned when a dimension or material value is not finite and positive.
    #[error("{shape} section has an invalid {quantity} of {value}")]
    InvalidDimension {
        /// Shape that was requested.
        shape: ShapeTag,
        /// Name of the offending quantity.
        quantity: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Returned when a shape tag is outside `I`, `T`, `C` and `O`.
    #[error("unknown cross-section shape `{0}`")]
    UnknownShape(String),
    /// Returned when a support tag is outside `Free`, `Loose` and `Fixed`.
    #[error("unknown support type `{0}`")]
    UnknownSupportType(String),
    /// Returned when an orientation is requested from a node the member does not touch.
    #[error("member {member:?} is not connected to node {node:?}")]
    InvalidEndpoint {
        /// Member that was queried.
        member: EdgeIndex,
        /// Node the orientation was requested from.
        node: NodeIndex,
    },
    /// Returned when both ends of a member sit at the same position.
    #[error("member {0:?} has zero length")]
    ZeroLengthMember(EdgeIndex),
    /// Returned when the number of unknowns does not match the number of equations.
    #[error(
        "truss is not statically determinate: {equations} equilibrium equations for {unknowns} unknowns"
    )]
    Indeterminate {
        /// Two equations per node.
        equations: usize,
        /// Member forces plus reaction components.
        unknowns: usize,
    },
    /// Returned when a member is evaluated a second time with a different force.
    #[error("member {member:?} already carries {recorded} and cannot be re-evaluated with {received}")]
    ConflictingMemberForce {
        /// Member that was evaluated twice.
        member: EdgeIndex,
        /// Axial force stored by the first evaluation.
        recorded: f64,
        /// Axial force offered by the second evaluation.
        received: f64,
    },
    /// Returned when a joint position, support angle or force is NaN or infinite.
    #[error("node `{node}` has a non-finite {quantity} of {value}")]
    NonFiniteValue {
        /// Joint the value belongs to.
        node: String,
        /// Name of the offending quantity.
        quantity: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Returned when the singular value cutoff is negative or not finite.
    #[error("singular value cutoff must be finite and non-negative (received {0})")]
    InvalidTolerance(f64),
    /// Returned when the pseudo-inverse of the equilibrium matrix cannot be formed.
    #[error("equilibrium matrix could not be decomposed: {0}")]
    SingularSystem(&'static str),
}

/// Error returned while reading a truss definition.
///
/// Line numbers are 1-based and refer to the original input text.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Returned when the definition does not contain the three `----` separated sections.
    #[error("expected nodes, members and forces sections separated by `----` (found {0})")]
    MissingSection(usize),
    /// Returned when a line has the wrong shape for its section.
    #[error("line {line}: {reason}")]
    MalformedLine {
        /// Line that failed to parse.
        line: usize,
        /// Description of the problem.
        reason: String,
    },
    /// Returned when a numeric token cannot be read as a float.
    #[error("line {line}: `{token}` is not a number")]
    InvalidNumber {
        /// Line containing the token.
        line: usize,
        /// Token that failed to parse.
        token: String,
    },
    /// Returned when a record is rejected by the truss model.
    #[error(transparent)]
    Truss(#[from] TrussError),
    /// Returned when a JSON definition is malformed.
    #[error("invalid JSON definition: {0}")]
    Json(#[from] serde_json::Error),
    /// Returned when the definition file cannot be read.
    #[error("cannot read definition: {0}")]
    Io(#[from] std::io::Error),
}
