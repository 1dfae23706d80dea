// Solver adapters: the runtime plugin loader and statically linked backends

pub mod dynamic;
pub mod factory;
#[cfg(feature = "highs")]
pub mod highs_solver;

pub use dynamic::{
    parse_solver_list, DynamicSolver, LoadedBackend, LoaderConfig, ModuleLoader,
    SharedLibraryLoader, ENV_SOLVER_LIST, FACTORY_SYMBOL,
};
pub use factory::SolverFactory;
#[cfg(feature = "highs")]
pub use highs_solver::HighsSolver;
