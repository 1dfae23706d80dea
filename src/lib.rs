// Domain layer: model algebra, results and the backend contract
pub mod domain;

// Application layer: the solve orchestrator
pub mod application;

// Infrastructure layer: LP text, hashing, result cache, logging
pub mod infrastructure;

// Solver adapters: plugin loader and built-in backends
pub mod solver;

pub mod error;

// Re-export commonly used types
pub use domain::{
    maximize, minimize, sum, Assignment, BackendError, Constraint, ConstraintExt,
    ConstraintShape, Feature, Features, ModelError, Objective, OptimizationType, Relation,
    Solution, SolutionStatus, SolverBackend, Term, Variable, VariableSet, VariableType,
};

pub use application::{Solver, SolverConfig};
pub use error::{ConfigError, Error, ParseError, PluginLoadError, Result};
pub use infrastructure::{parse_lp, write_lp, LpDocument, ResultCache};
pub use solver::{DynamicSolver, LoaderConfig, SolverFactory};

#[cfg(feature = "highs")]
pub use solver::HighsSolver;
