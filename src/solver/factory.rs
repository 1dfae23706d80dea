use crate::domain::SolverBackend;
use crate::error::PluginLoadError;
use crate::solver::{DynamicSolver, LoaderConfig};

#[cfg(feature = "highs")]
use crate::solver::HighsSolver;

/// Factory for creating backend instances
pub struct SolverFactory;

impl SolverFactory {
    /// Load a plugin backend as configured, falling back to a statically
    /// linked backend when no plugin qualifies.
    pub fn create(config: &LoaderConfig) -> Result<Box<dyn SolverBackend>, PluginLoadError> {
        match DynamicSolver::load(config) {
            Ok(dynamic) => Ok(Box::new(dynamic)),
            Err(err) => match Self::builtin(config) {
                Some(backend) => {
                    tracing::info!(backend = backend.name(), error = %err, "using built-in backend");
                    Ok(backend)
                }
                None => Err(err),
            },
        }
    }

    /// Plugin backend among `names`, with `LPKIT_SOLVER_LIST` tried first.
    pub fn from_env(names: &[&str]) -> Result<Box<dyn SolverBackend>, PluginLoadError> {
        Self::create(&LoaderConfig::from_env(names.iter().copied()))
    }

    /// The statically linked backend, if compiled in and good enough for `config`
    #[cfg(feature = "highs")]
    pub fn builtin(config: &LoaderConfig) -> Option<Box<dyn SolverBackend>> {
        let highs = HighsSolver::new();
        highs
            .features()
            .supports_all(&config.required)
            .then(|| Box::new(highs) as Box<dyn SolverBackend>)
    }

    #[cfg(not(feature = "highs"))]
    pub fn builtin(_config: &LoaderConfig) -> Option<Box<dyn SolverBackend>> {
        None
    }
}
