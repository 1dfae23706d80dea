// Domain error types: modeling mistakes and backend failures

use super::value_objects::Relation;

/// Illegal model construction. Raised where the model is built, never at solve time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("the bounds of {name} are illegal: [{lower}; {upper}]")]
    IllegalBounds { name: String, lower: f64, upper: f64 },

    #[error("the bounds of binary variable {name} are not right, only 0 and 1 are allowed")]
    BinaryBounds { name: String },

    #[error("bound {bound} of integer variable {name} is not an integer")]
    FractionalIntegerBound { name: String, bound: f64 },

    #[error("the relations ({left}) and ({right}) are not compatible")]
    IncompatibleRelations { left: Relation, right: Relation },

    #[error("a relation needs exactly one constant side: {0}")]
    ConstantSide(&'static str),

    #[error("a {0} constraint cannot be chained into a three-sided constraint")]
    InvalidChain(&'static str),

    #[error("the used constraint is not an indicator (binary variable == 0 or 1)")]
    NotAnIndicator,

    #[error("you defined multiple variables with the name: {0}")]
    NameCollision(String),

    #[error("start value {value} of {name} lies outside its domain")]
    StartValueOutOfDomain { name: String, value: f64 },

    #[error("invalid value for {parameter}: {value}")]
    InvalidParameter { parameter: &'static str, value: f64 },
}

/// Failure reported by a backend adapter. Forwarded by the solver as-is.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Not supported by this backend: {0}")]
    Unsupported(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}
