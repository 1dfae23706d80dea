// Runtime-loaded backends.
//
// A plugin is a `cdylib` named `lpkit_<name>` (`liblpkit_<name>.so`,
// `liblpkit_<name>.dylib` or `lpkit_<name>.dll`, name lowercased) that
// exports the factory symbol `FACTORY_SYMBOL`, usually through
// `export_backend!`. Plugins must be built with the
// same compiler and `lpkit` version as the host: the factory hands over a
// Rust trait object.
//
// `DynamicSolver` walks the candidate names of a `LoaderConfig`, adopts
// the first backend that loads and has every required feature, and forwards
// the whole backend contract to it.

use std::env;
use std::path::PathBuf;

use libloading::{Library, Symbol};

use crate::domain::{
    solver_service::Result, Assignment, Constraint, Feature, Features, Objective, Solution,
    SolutionStatus, SolverBackend, Variable, VariableSet,
};
use crate::error::PluginLoadError;

/// Environment variable holding `;`-separated backend names tried before the caller's
pub const ENV_SOLVER_LIST: &str = "LPKIT_SOLVER_LIST";

/// Symbol every plugin library exports
pub const FACTORY_SYMBOL: &[u8] = b"lpkit_create_backend";

/// Signature of [`FACTORY_SYMBOL`]. Returns a leaked `Box<Box<dyn SolverBackend>>`.
#[allow(improper_ctypes_definitions)]
pub type BackendFactory = unsafe extern "C" fn() -> *mut Box<dyn SolverBackend>;

/// Where and what the plugin loader looks for
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoaderConfig {
    /// Backend names supplied by the caller, in preference order
    pub candidates: Vec<String>,
    /// Backend names tried before `candidates`
    pub overrides: Vec<String>,
    /// Features a backend must have to be adopted
    pub required: Vec<Feature>,
    /// Directory holding the plugin libraries; the platform search path if unset
    pub search_dir: Option<PathBuf>,
}

impl LoaderConfig {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Like [`LoaderConfig::new`], with overrides read from [`ENV_SOLVER_LIST`].
    pub fn from_env<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let overrides = env::var(ENV_SOLVER_LIST)
            .map(|list| parse_solver_list(&list))
            .unwrap_or_default();
        Self::new(candidates).with_overrides(overrides)
    }

    pub fn with_overrides(mut self, overrides: Vec<String>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn requiring(mut self, features: &[Feature]) -> Self {
        self.required = features.to_vec();
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = Some(dir.into());
        self
    }

    /// Overrides first, then candidates; empty names dropped and only the
    /// first occurrence of a name kept.
    pub fn candidate_order(&self) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        for name in self.overrides.iter().chain(&self.candidates) {
            let name = name.trim();
            if !name.is_empty() && !order.iter().any(|seen| seen == name) {
                order.push(name.to_string());
            }
        }
        order
    }
}

/// Split a `;`-separated backend list.
pub fn parse_solver_list(list: &str) -> Vec<String> {
    list.split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// A backend instance together with the library it came from
pub struct LoadedBackend {
    // dropped before the library that holds its code
    backend: Box<dyn SolverBackend>,
    library: Option<Library>,
}

impl LoadedBackend {
    pub fn new(backend: Box<dyn SolverBackend>, library: Option<Library>) -> Self {
        Self { backend, library }
    }
}

/// Turns a backend name into a backend instance
pub trait ModuleLoader {
    /// Load `name`, or explain why it could not be loaded.
    fn load(&self, name: &str) -> std::result::Result<LoadedBackend, String>;
}

/// Loads plugin libraries from disk
#[derive(Debug, Clone, Default)]
pub struct SharedLibraryLoader {
    search_dir: Option<PathBuf>,
}

impl SharedLibraryLoader {
    pub fn new(search_dir: Option<PathBuf>) -> Self {
        Self { search_dir }
    }

    pub fn library_path(&self, name: &str) -> PathBuf {
        let file = libloading::library_filename(format!("lpkit_{}", name.to_lowercase()));
        match &self.search_dir {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }
}

impl ModuleLoader for SharedLibraryLoader {
    fn load(&self, name: &str) -> std::result::Result<LoadedBackend, String> {
        let path = self.library_path(name);

        // SAFETY: loading runs the library's initialisers; plugin libraries are trusted code.
        let library = unsafe { Library::new(&path) }
            .map_err(|e| format!("{}: {e}", path.display()))?;

        // SAFETY: the symbol is declared with `BackendFactory`'s signature by `export_backend!`,
        // and the returned pointer comes from `Box::into_raw`.
        let backend = unsafe {
            let factory: Symbol<BackendFactory> = library
                .get(FACTORY_SYMBOL)
                .map_err(|e| format!("{}: {e}", path.display()))?;
            let raw = factory();
            if raw.is_null() {
                return Err(format!("{}: factory returned no backend", path.display()));
            }
            *Box::from_raw(raw)
        };

        Ok(LoadedBackend::new(backend, Some(library)))
    }
}

/// Backend chosen at runtime among plugin libraries
pub struct DynamicSolver {
    // field order is drop order: backend before library
    backend: Box<dyn SolverBackend>,
    _library: Option<Library>,
    name: String,
    features: Features,
}

impl DynamicSolver {
    /// Load from shared libraries, as configured.
    pub fn load(config: &LoaderConfig) -> std::result::Result<Self, PluginLoadError> {
        Self::load_with(config, &SharedLibraryLoader::new(config.search_dir.clone()))
    }

    pub fn load_with(
        config: &LoaderConfig,
        loader: &dyn ModuleLoader,
    ) -> std::result::Result<Self, PluginLoadError> {
        let order = config.candidate_order();
        if order.is_empty() {
            return Err(PluginLoadError::NoCandidates);
        }

        let mut reasons = Vec::new();
        for name in &order {
            let loaded = match loader.load(name) {
                Ok(loaded) => loaded,
                Err(reason) => {
                    tracing::warn!(backend = %name, %reason, "could not load solver backend");
                    reasons.push(format!("{name}: {reason}"));
                    continue;
                }
            };

            let features = loaded.backend.features();
            if let Some(missing) = features.first_missing(&config.required) {
                tracing::warn!(backend = %name, %missing, "solver backend lacks a required feature");
                reasons.push(format!("{name}: missing feature {missing}"));
                continue;
            }

            let LoadedBackend { backend, library } = loaded;
            let shown = format!("Dynamic: {}", backend.name());
            tracing::info!(backend = %shown, "solver backend loaded");
            return Ok(Self {
                backend,
                _library: library,
                name: shown,
                features,
            });
        }

        Err(PluginLoadError::Exhausted {
            tried: order,
            reasons,
        })
    }

    /// Name of the wrapped backend
    pub fn inner_name(&self) -> &str {
        self.backend.name()
    }
}

impl std::fmt::Debug for DynamicSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicSolver")
            .field("name", &self.name)
            .field("features", &self.features)
            .finish()
    }
}

impl SolverBackend for DynamicSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn features(&self) -> Features {
        self.features
    }

    fn add_variable(&mut self, variable: &Variable) -> Result<()> {
        self.backend.add_variable(variable)
    }

    fn add_variables(&mut self, variables: &VariableSet) -> Result<()> {
        self.backend.add_variables(variables)
    }

    fn add_constraint(&mut self, constraint: &Constraint) -> Result<()> {
        self.backend.add_constraint(constraint)
    }

    fn add_constraints(&mut self, constraints: &[Constraint]) -> Result<()> {
        self.backend.add_constraints(constraints)
    }

    fn set_objective(&mut self, objective: &Objective) -> Result<()> {
        self.backend.set_objective(objective)
    }

    fn solve(&mut self) -> Result<(SolutionStatus, Solution)> {
        self.backend.solve()
    }

    fn reset(&mut self) {
        self.backend.reset()
    }

    fn set_console_output(&mut self, verbose: bool) {
        self.backend.set_console_output(verbose)
    }

    fn set_timeout(&mut self, seconds: f64) {
        self.backend.set_timeout(seconds)
    }

    fn set_int_feas_tol(&mut self, tolerance: f64) {
        self.backend.set_int_feas_tol(tolerance)
    }

    fn presolve(&mut self, enabled: bool) {
        self.backend.presolve(enabled)
    }

    fn set_threads(&mut self, threads: usize) {
        self.backend.set_threads(threads)
    }

    fn set_relative_mip_gap(&mut self, gap: f64) {
        self.backend.set_relative_mip_gap(gap)
    }

    fn set_absolute_mip_gap(&mut self, gap: f64) {
        self.backend.set_absolute_mip_gap(gap)
    }

    fn set_start_values(&mut self, values: &Assignment) -> Result<()> {
        self.backend.set_start_values(values)
    }
}

/// Export a backend from a plugin `cdylib`.
///
/// ```ignore
/// lpkit::export_backend!(MyBackend::new());
/// ```
#[macro_export]
macro_rules! export_backend {
    ($constructor:expr) => {
        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn lpkit_create_backend(
        ) -> *mut ::std::boxed::Box<dyn $crate::domain::SolverBackend> {
            let backend: ::std::boxed::Box<dyn $crate::domain::SolverBackend> =
                ::std::boxed::Box::new($constructor);
            ::std::boxed::Box::into_raw(::std::boxed::Box::new(backend))
        }
    };
}
