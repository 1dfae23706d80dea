// Domain service interface for optimization backends
// Every engine adapter, statically linked or loaded at runtime, implements this contract

use super::constraint::Constraint;
use super::error::BackendError;
use super::models::{Assignment, Solution};
use super::objective::Objective;
use super::value_objects::{Features, SolutionStatus};
use super::variable::{Variable, VariableSet};

pub type Result<T> = std::result::Result<T, BackendError>;

/// Domain service interface for optimization backends
///
/// A backend is stateful: the solver registers variables, constraints and the
/// objective, pushes its tuning knobs and then calls [`SolverBackend::solve`].
/// [`SolverBackend::reset`] must return the backend to an empty model.
///
/// The methods without a default body form the mandatory part of the contract;
/// an adapter that does not implement them does not compile. The tuning knobs
/// are optional: the default bodies log that the backend ignores them.
pub trait SolverBackend: Send {
    /// Display name of this backend
    fn name(&self) -> &str;

    /// Capabilities of this backend
    fn features(&self) -> Features;

    fn add_variable(&mut self, variable: &Variable) -> Result<()>;

    fn add_variables(&mut self, variables: &VariableSet) -> Result<()> {
        for variable in variables {
            self.add_variable(variable)?;
        }
        Ok(())
    }

    fn add_constraint(&mut self, constraint: &Constraint) -> Result<()>;

    fn add_constraints(&mut self, constraints: &[Constraint]) -> Result<()> {
        for constraint in constraints {
            self.add_constraint(constraint)?;
        }
        Ok(())
    }

    fn set_objective(&mut self, objective: &Objective) -> Result<()>;

    /// Solve the registered model. Values are reported for every registered variable.
    fn solve(&mut self) -> Result<(SolutionStatus, Solution)>;

    /// Drop the registered model
    fn reset(&mut self);

    fn set_console_output(&mut self, verbose: bool);

    /// Wall-clock limit in seconds
    fn set_timeout(&mut self, seconds: f64) {
        ignored(self.name(), "timeout", seconds);
    }

    fn set_int_feas_tol(&mut self, tolerance: f64) {
        ignored(self.name(), "integer feasibility tolerance", tolerance);
    }

    fn presolve(&mut self, enabled: bool) {
        tracing::warn!(backend = self.name(), enabled, "presolve switch not supported, ignored");
    }

    fn set_threads(&mut self, threads: usize) {
        tracing::warn!(backend = self.name(), threads, "thread count not supported, ignored");
    }

    fn set_relative_mip_gap(&mut self, gap: f64) {
        ignored(self.name(), "relative MIP gap", gap);
    }

    fn set_absolute_mip_gap(&mut self, gap: f64) {
        ignored(self.name(), "absolute MIP gap", gap);
    }

    fn set_start_values(&mut self, values: &Assignment) -> Result<()> {
        tracing::warn!(
            backend = self.name(),
            count = values.len(),
            "start values not supported, ignored"
        );
        Ok(())
    }
}

fn ignored(backend: &str, knob: &str, value: f64) {
    tracing::warn!(backend, value, "{knob} not supported, ignored");
}

impl<B: SolverBackend + ?Sized> SolverBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn features(&self) -> Features {
        (**self).features()
    }

    fn add_variable(&mut self, variable: &Variable) -> Result<()> {
        (**self).add_variable(variable)
    }

    fn add_variables(&mut self, variables: &VariableSet) -> Result<()> {
        (**self).add_variables(variables)
    }

    fn add_constraint(&mut self, constraint: &Constraint) -> Result<()> {
        (**self).add_constraint(constraint)
    }

    fn add_constraints(&mut self, constraints: &[Constraint]) -> Result<()> {
        (**self).add_constraints(constraints)
    }

    fn set_objective(&mut self, objective: &Objective) -> Result<()> {
        (**self).set_objective(objective)
    }

    fn solve(&mut self) -> Result<(SolutionStatus, Solution)> {
        (**self).solve()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn set_console_output(&mut self, verbose: bool) {
        (**self).set_console_output(verbose)
    }

    fn set_timeout(&mut self, seconds: f64) {
        (**self).set_timeout(seconds)
    }

    fn set_int_feas_tol(&mut self, tolerance: f64) {
        (**self).set_int_feas_tol(tolerance)
    }

    fn presolve(&mut self, enabled: bool) {
        (**self).presolve(enabled)
    }

    fn set_threads(&mut self, threads: usize) {
        (**self).set_threads(threads)
    }

    fn set_relative_mip_gap(&mut self, gap: f64) {
        (**self).set_relative_mip_gap(gap)
    }

    fn set_absolute_mip_gap(&mut self, gap: f64) {
        (**self).set_absolute_mip_gap(gap)
    }

    fn set_start_values(&mut self, values: &Assignment) -> Result<()> {
        (**self).set_start_values(values)
    }
}
