// Domain module: model algebra, results and the backend contract

pub mod constraint;
pub mod error;
pub mod models;
pub mod objective;
pub mod solver_service;
pub mod term;
pub mod value_objects;
pub mod variable;

pub use constraint::{Constraint, ConstraintExt, ConstraintShape};
pub use error::{BackendError, ModelError};
pub use models::{model_variables, Assignment, Solution, SolverStatistics};
pub use objective::{maximize, minimize, Objective};
pub use solver_service::SolverBackend;
pub use term::{sum, Term};
pub use value_objects::*;
pub use variable::{Variable, VariableId, VariableSet};
