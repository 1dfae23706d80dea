// HiGHS backend adapter
// Collects the model the solver registers and translates it to a HiGHS row problem at solve time

use std::collections::HashMap;

use highs::{HighsModelStatus, RowProblem, Sense};

use crate::domain::{
    solver_service::Result, Assignment, BackendError, Constraint, ConstraintShape, Features,
    Objective, OptimizationType, Relation, Solution, SolutionStatus, SolverBackend, Variable,
};

#[derive(Debug, Default)]
pub struct HighsSolver {
    variables: Vec<Variable>,
    objective: Objective,
    rows: Vec<(f64, f64, Vec<(Variable, f64)>)>,
    verbose: bool,
    time_limit: Option<f64>,
    threads: Option<usize>,
    presolve: Option<bool>,
    int_feas_tol: Option<f64>,
    relative_mip_gap: Option<f64>,
    absolute_mip_gap: Option<f64>,
}

impl HighsSolver {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `(lower, upper)` row bounds of a constraint
fn row_bounds(constraint: &Constraint) -> (f64, f64) {
    let (relation, bound) = match constraint.shape() {
        ConstraintShape::Right { relation, bound } => (relation, bound),
        ConstraintShape::Left { relation, bound } => (relation.flip(), bound),
        ConstraintShape::Equal { bound } => return (bound, bound),
        ConstraintShape::Range {
            lower, left, upper, ..
        } => {
            return match left {
                Relation::GreaterThanOrEqual => (upper, lower),
                _ => (lower, upper),
            }
        }
    };
    match relation {
        Relation::LessThanOrEqual => (f64::NEG_INFINITY, bound),
        Relation::GreaterThanOrEqual => (bound, f64::INFINITY),
        Relation::Equal => (bound, bound),
    }
}

impl SolverBackend for HighsSolver {
    fn name(&self) -> &str {
        "HiGHS"
    }

    fn features(&self) -> Features {
        Features {
            lp: true,
            ilp: true,
            milp: true,
            ..Features::default()
        }
    }

    fn add_variable(&mut self, variable: &Variable) -> Result<()> {
        self.variables.push(variable.clone());
        Ok(())
    }

    fn add_constraint(&mut self, constraint: &Constraint) -> Result<()> {
        if constraint.indicator().is_some() {
            return Err(BackendError::Unsupported(
                "HiGHS has no indicator constraints".into(),
            ));
        }
        let normalized = constraint.normalize();
        let (lower, upper) = row_bounds(&normalized);
        let factors = normalized
            .term()
            .iter()
            .map(|(v, c)| (v.clone(), c))
            .collect();
        self.rows.push((lower, upper, factors));
        Ok(())
    }

    fn set_objective(&mut self, objective: &Objective) -> Result<()> {
        self.objective = objective.clone();
        Ok(())
    }

    fn solve(&mut self) -> Result<(SolutionStatus, Solution)> {
        let mut pb = RowProblem::default();
        let mut columns = HashMap::new();

        for variable in &self.variables {
            let cost = self.objective.term.coefficient(variable);
            let bounds = variable.lower_bound()..=variable.upper_bound();
            let column = if variable.is_integral() {
                pb.add_integer_column(cost, bounds)
            } else {
                pb.add_column(cost, bounds)
            };
            columns.insert(variable.clone(), column);
        }

        for (lower, upper, factors) in &self.rows {
            let mut row = Vec::with_capacity(factors.len());
            for (variable, coefficient) in factors {
                let column = columns.get(variable).ok_or_else(|| {
                    BackendError::InvalidProblem(format!("unregistered variable {variable}"))
                })?;
                row.push((*column, *coefficient));
            }
            pb.add_row(*lower..=*upper, &row);
        }

        let sense = match self.objective.optimization_type {
            OptimizationType::Maximize => Sense::Maximise,
            OptimizationType::Minimize => Sense::Minimise,
        };

        let mut model = pb.optimise(sense);
        model.set_option("output_flag", self.verbose);
        if let Some(seconds) = self.time_limit {
            model.set_option("time_limit", seconds);
        }
        if let Some(threads) = self.threads {
            model.set_option("threads", threads as i32);
        }
        if let Some(presolve) = self.presolve {
            model.set_option("presolve", if presolve { "on" } else { "off" });
        }
        if let Some(tolerance) = self.int_feas_tol {
            model.set_option("mip_feasibility_tolerance", tolerance);
        }
        if let Some(gap) = self.relative_mip_gap {
            model.set_option("mip_rel_gap", gap);
        }
        if let Some(gap) = self.absolute_mip_gap {
            model.set_option("mip_abs_gap", gap);
        }

        let solved = model.solve();
        let status = match solved.status() {
            HighsModelStatus::Optimal => SolutionStatus::Optimal,
            HighsModelStatus::Infeasible => SolutionStatus::Infeasible,
            HighsModelStatus::Unbounded => SolutionStatus::Unbound,
            HighsModelStatus::UnboundedOrInfeasible => SolutionStatus::InfeasibleOrUnbound,
            // HiGHS does not say whether an incumbent exists
            HighsModelStatus::ReachedTimeLimit => SolutionStatus::TimeoutInfeasible,
            HighsModelStatus::ModelEmpty => SolutionStatus::Optimal,
            HighsModelStatus::LoadError | HighsModelStatus::ModelError => SolutionStatus::Invalid,
            HighsModelStatus::PresolveError
            | HighsModelStatus::SolveError
            | HighsModelStatus::PostsolveError => SolutionStatus::Error,
            _ => SolutionStatus::Unknown,
        };

        if !status.has_solution() {
            return Ok((status, Solution::default()));
        }

        let solution = solved.get_solution();
        let values: Assignment = self
            .variables
            .iter()
            .cloned()
            .zip(solution.columns().iter().copied())
            .collect();
        let objective_value = self.objective.term.evaluate(&values);
        Ok((status, Solution::new(objective_value, values)))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn set_console_output(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn set_timeout(&mut self, seconds: f64) {
        self.time_limit = Some(seconds);
    }

    fn set_int_feas_tol(&mut self, tolerance: f64) {
        self.int_feas_tol = Some(tolerance);
    }

    fn presolve(&mut self, enabled: bool) {
        self.presolve = Some(enabled);
    }

    fn set_threads(&mut self, threads: usize) {
        self.threads = Some(threads);
    }

    fn set_relative_mip_gap(&mut self, gap: f64) {
        self.relative_mip_gap = Some(gap);
    }

    fn set_absolute_mip_gap(&mut self, gap: f64) {
        self.absolute_mip_gap = Some(gap);
    }
}
