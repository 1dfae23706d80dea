// Application layer: the solve orchestrator and its configuration

pub mod config;
pub mod solver;

pub use config::SolverConfig;
pub use solver::Solver;
