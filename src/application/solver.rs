// The solve orchestrator.
//
// A `Solver` owns one backend and the model under construction. Every
// mutation marks the model dirty; `Solver::solve` runs
// prepare → construct → backend solve → postprocess only when it is, and
// consults the result cache first when a cache directory is configured.

use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::domain::{
    model_variables, Assignment, Constraint, Feature, ModelError, Objective, Solution,
    SolutionStatus, SolverBackend, SolverStatistics, VariableSet,
};
use crate::error::{ParseError, Result};
use crate::infrastructure::{content_hash, parse_lp, write_lp, ResultCache};

use super::config::SolverConfig;

pub struct Solver {
    backend: Box<dyn SolverBackend>,
    config: SolverConfig,
    objective: Objective,
    constraints: Vec<Constraint>,
    /// Variables of all constraints, for eager name-collision checks
    constraint_variables: VariableSet,
    start_values: Assignment,
    solution: Solution,
    status: SolutionStatus,
    dirty: bool,
}

impl Solver {
    pub fn new(backend: Box<dyn SolverBackend>) -> Self {
        Self {
            backend,
            config: SolverConfig::default(),
            objective: Objective::default(),
            constraints: Vec::new(),
            constraint_variables: VariableSet::new(),
            start_values: Assignment::new(),
            solution: Solution::default(),
            status: SolutionStatus::NotSolved,
            dirty: true,
        }
    }

    pub fn with_config(
        backend: Box<dyn SolverBackend>,
        config: SolverConfig,
    ) -> std::result::Result<Self, ModelError> {
        config.validate()?;
        let mut solver = Self::new(backend);
        solver.config = config;
        Ok(solver)
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Mutable access to the knobs; the next solve runs again.
    pub fn config_mut(&mut self) -> &mut SolverConfig {
        self.dirty = true;
        &mut self.config
    }

    pub fn set_objective(&mut self, objective: Objective) -> std::result::Result<(), ModelError> {
        let variables = objective.term.variables()?;
        self.constraint_variables.check_compatible(&variables)?;
        self.objective = objective;
        self.dirty = true;
        Ok(())
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> std::result::Result<(), ModelError> {
        let variables = constraint.variables()?;
        self.constraint_variables.check_compatible(&variables)?;
        self.objective.term.variables()?.check_compatible(&variables)?;
        self.constraint_variables.extend(variables.iter().cloned())?;
        self.constraints.push(constraint);
        self.dirty = true;
        Ok(())
    }

    pub fn add_constraints<I>(&mut self, constraints: I) -> std::result::Result<(), ModelError>
    where
        I: IntoIterator<Item = Constraint>,
    {
        for constraint in constraints {
            self.add_constraint(constraint)?;
        }
        Ok(())
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Every variable the objective or a constraint refers to.
    pub fn variables(&self) -> std::result::Result<VariableSet, ModelError> {
        model_variables(&self.objective, &self.constraints)
    }

    /// Start values, overriding the ones attached to the variables.
    /// Only passed on when `warm_start` is enabled.
    pub fn set_start_values(&mut self, values: Assignment) -> std::result::Result<(), ModelError> {
        for (variable, value) in &values {
            if !variable.admits(*value) {
                return Err(ModelError::StartValueOutOfDomain {
                    name: variable.name().to_string(),
                    value: *value,
                });
            }
        }
        self.start_values = values;
        self.dirty = true;
        Ok(())
    }

    pub fn start_values(&self) -> &Assignment {
        &self.start_values
    }

    pub fn set_relative_mip_gap(&mut self, gap: f64) -> std::result::Result<(), ModelError> {
        if gap.is_nan() || gap < 0.0 {
            return Err(ModelError::InvalidParameter {
                parameter: "relative_mip_gap",
                value: gap,
            });
        }
        self.config_mut().relative_mip_gap = Some(gap);
        Ok(())
    }

    pub fn set_absolute_mip_gap(&mut self, gap: f64) -> std::result::Result<(), ModelError> {
        if gap.is_nan() || gap < 0.0 {
            return Err(ModelError::InvalidParameter {
                parameter: "absolute_mip_gap",
                value: gap,
            });
        }
        self.config_mut().absolute_mip_gap = Some(gap);
        Ok(())
    }

    /// Back to the backend's own MIP gaps.
    pub fn reset_mip_gap(&mut self) {
        let config = self.config_mut();
        config.relative_mip_gap = None;
        config.absolute_mip_gap = None;
    }

    /// Swap the backend; the model is kept.
    pub fn set_backend(&mut self, backend: Box<dyn SolverBackend>) {
        self.backend = backend;
        self.dirty = true;
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn feature_supported(&self, feature: Feature) -> bool {
        self.backend.features().supports(feature)
    }

    /// Drop the model, the start values and the last result. Knobs are kept.
    pub fn reset(&mut self) {
        self.objective = Objective::default();
        self.constraints.clear();
        self.constraint_variables = VariableSet::new();
        self.start_values.clear();
        self.solution = Solution::default();
        self.status = SolutionStatus::NotSolved;
        self.backend.reset();
        self.dirty = true;
    }

    /// Status of the last solve that reached the backend or the cache
    pub fn status(&self) -> SolutionStatus {
        self.status
    }

    pub fn result(&self) -> &Solution {
        &self.solution
    }

    pub fn show_lp(&self) -> std::result::Result<String, ModelError> {
        let variables = self.variables()?;
        Ok(write_lp(&self.objective, &self.constraints, &variables))
    }

    pub fn write_lp(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.show_lp()?)?;
        Ok(())
    }

    /// Replace the model with the one in `text`, dropping explicit start
    /// values. Returns the lines that could not be read; the model holds
    /// everything else.
    pub fn load_lp_str(
        &mut self,
        text: &str,
    ) -> std::result::Result<Vec<ParseError>, ModelError> {
        let document = parse_lp(text);
        self.objective = Objective::default();
        self.constraints.clear();
        self.constraint_variables = VariableSet::new();
        self.start_values.clear();
        self.set_objective(document.objective)?;
        self.add_constraints(document.constraints)?;
        Ok(document.errors)
    }

    pub fn load_lp(&mut self, path: impl AsRef<Path>) -> Result<Vec<ParseError>> {
        let text = fs::read_to_string(path)?;
        Ok(self.load_lp_str(&text)?)
    }

    /// Solve the current model.
    ///
    /// Returns [`SolutionStatus::AlreadySolved`] without touching the backend
    /// when nothing changed since the last solve. Backend failures are
    /// returned as they are and leave the model dirty.
    pub fn solve(&mut self) -> Result<SolutionStatus> {
        if !self.dirty {
            return Ok(SolutionStatus::AlreadySolved);
        }

        let variables = self.variables()?;
        let start_values = if self.config.warm_start {
            self.start_assignment(&variables)?
        } else {
            Assignment::new()
        };

        let status = match self.config.cache_dir.clone() {
            Some(dir) => self.solve_cached(&ResultCache::new(dir), &variables, &start_values)?,
            None => self.solve_fresh(&variables, &start_values)?,
        };

        self.status = status;
        self.dirty = false;
        Ok(status)
    }

    fn solve_cached(
        &mut self,
        cache: &ResultCache,
        variables: &VariableSet,
        start_values: &Assignment,
    ) -> Result<SolutionStatus> {
        let model = write_lp(&self.objective, &self.constraints, variables);
        let key = content_hash(&model);

        if cache.has_optimal(&key) {
            match cache.optimal(&key, variables) {
                Ok(solution) => {
                    tracing::info!(%key, "optimal solution served from cache");
                    self.solution = solution;
                    return Ok(SolutionStatus::Optimal);
                }
                Err(e) => tracing::warn!(%key, error = %e, "unreadable cache entry, solving"),
            }
        }

        let status = self.solve_fresh(variables, start_values)?;
        let stored = match status {
            SolutionStatus::Optimal => cache.write_optimal(&key, &self.solution, Some(&model)),
            SolutionStatus::Feasible | SolutionStatus::TimeoutFeasible => {
                let sense = self.objective.optimization_type;
                cache
                    .offer_feasible(&key, &self.solution, sense, Some(&model))
                    .map(|_| ())
            }
            SolutionStatus::TimeoutInfeasible if cache.has_feasible(&key) => {
                match cache.feasible(&key, variables) {
                    Ok(cached) => {
                        tracing::info!(%key, "timed out, using cached feasible solution");
                        let statistics = self.solution.statistics;
                        self.solution = cached.with_statistics(statistics);
                        return Ok(SolutionStatus::TimeoutFeasible);
                    }
                    Err(e) => Err(e),
                }
            }
            _ => Ok(()),
        };
        if let Err(e) = stored {
            tracing::warn!(%key, error = %e, "result cache not updated");
        }
        Ok(status)
    }

    fn solve_fresh(
        &mut self,
        variables: &VariableSet,
        start_values: &Assignment,
    ) -> Result<SolutionStatus> {
        self.backend.reset();

        let started = Instant::now();
        self.prepare();
        let preparation_time = started.elapsed();

        let started = Instant::now();
        self.construct(variables, start_values)?;
        let construction_time = started.elapsed();

        let started = Instant::now();
        let (status, solution) = self.backend.solve()?;
        let solving_time = started.elapsed();

        tracing::debug!(
            backend = self.backend.name(),
            %status,
            ?preparation_time,
            ?construction_time,
            ?solving_time,
            "backend finished"
        );

        self.solution = solution.with_statistics(SolverStatistics {
            preparation_time,
            construction_time,
            solving_time,
        });
        self.postprocess();
        Ok(status)
    }

    fn prepare(&mut self) {
        let config = &self.config;
        let backend = &mut self.backend;

        if config.threads > 0 {
            backend.set_threads(config.threads);
        }
        backend.set_console_output(!config.quiet);
        if let Some(seconds) = config.time_limit {
            backend.set_timeout(seconds);
        }
        if let Some(tolerance) = config.int_feas_tol {
            backend.set_int_feas_tol(tolerance);
        }
        if let Some(gap) = config.absolute_mip_gap {
            backend.set_absolute_mip_gap(gap);
        }
        if let Some(gap) = config.relative_mip_gap {
            backend.set_relative_mip_gap(gap);
        }
        backend.presolve(config.presolve);
    }

    fn construct(&mut self, variables: &VariableSet, start_values: &Assignment) -> Result<()> {
        self.backend.add_variables(variables)?;
        self.backend.set_objective(&self.objective)?;
        self.backend.add_constraints(&self.constraints)?;
        if !start_values.is_empty() {
            self.backend.set_start_values(start_values)?;
        }
        Ok(())
    }

    /// Round integral variables; backends report them with float slack.
    fn postprocess(&mut self) {
        for (variable, value) in self.solution.values.iter_mut() {
            if variable.is_integral() {
                *value = value.round();
            }
        }
    }

    /// Explicit start values first, then the ones attached to the variables.
    fn start_assignment(
        &self,
        variables: &VariableSet,
    ) -> std::result::Result<Assignment, ModelError> {
        let mut assignment = Assignment::new();
        for variable in variables {
            let value = self
                .start_values
                .get(variable)
                .copied()
                .or_else(|| variable.start());
            let Some(value) = value else {
                continue;
            };
            if !variable.admits(value) {
                return Err(ModelError::StartValueOutOfDomain {
                    name: variable.name().to_string(),
                    value,
                });
            }
            assignment.insert(variable.clone(), value);
        }
        Ok(assignment)
    }
}

impl std::fmt::Debug for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("constraints", &self.constraints.len())
            .field("status", &self.status)
            .field("dirty", &self.dirty)
            .finish()
    }
}
