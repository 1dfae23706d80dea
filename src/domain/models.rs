use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use super::constraint::Constraint;
use super::error::ModelError;
use super::objective::Objective;
use super::variable::{Variable, VariableSet};

/// Values of variables, keyed by variable identity
pub type Assignment = BTreeMap<Variable, f64>;

/// Every variable referenced by the objective or a constraint, indicators included.
///
/// Fails when two distinct variables share a name.
pub fn model_variables(
    objective: &Objective,
    constraints: &[Constraint],
) -> Result<VariableSet, ModelError> {
    let mut variables = objective.term.variables()?;
    for constraint in constraints {
        variables.extend(constraint.variables()?.iter().cloned())?;
    }
    Ok(variables)
}

/// Wall-clock time spent in each phase of a solve
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolverStatistics {
    pub preparation_time: Duration,
    pub construction_time: Duration,
    pub solving_time: Duration,
}

impl SolverStatistics {
    pub fn total(&self) -> Duration {
        self.preparation_time + self.construction_time + self.solving_time
    }
}

/// Solution to an optimization problem
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solution {
    pub objective_value: f64,
    pub values: Assignment,
    pub statistics: SolverStatistics,
}

impl Solution {
    pub fn new(objective_value: f64, values: Assignment) -> Self {
        Self {
            objective_value,
            values,
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn value(&self, variable: &Variable) -> Option<f64> {
        self.values.get(variable).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values sorted by variable name.
    fn by_name(&self) -> Vec<(&Variable, f64)> {
        let mut entries: Vec<_> = self.values.iter().map(|(v, x)| (v, *x)).collect();
        entries.sort_by(|a, b| a.0.name().cmp(b.0.name()));
        entries
    }

    /// `# objective value <v>` followed by one `<name> <value>` line per variable.
    /// `compact` drops zero values and the name padding.
    pub fn show_solution_vector(&self, compact: bool) -> String {
        let mut out = format!("# objective value {}\n", self.objective_value);
        for (variable, value) in self.by_name() {
            if compact {
                if value != 0.0 {
                    let _ = writeln!(out, "{} {}", variable.name(), value);
                }
            } else {
                let _ = writeln!(out, "{:<8} {}", variable.name(), value);
            }
        }
        out
    }

    pub fn write_solution_vector(&self, path: impl AsRef<Path>, compact: bool) -> io::Result<()> {
        fs::write(path, self.show_solution_vector(compact))
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Objective: {}", self.objective_value)?;
        writeln!(f, "Variables:")?;
        for (variable, value) in self.by_name() {
            writeln!(f, "  {:<8} = {}", variable.name(), value)?;
        }
        writeln!(f, "Durations:")?;
        writeln!(
            f,
            "  preparation:  {:.6}",
            self.statistics.preparation_time.as_secs_f64()
        )?;
        writeln!(
            f,
            "  construction: {:.6}",
            self.statistics.construction_time.as_secs_f64()
        )?;
        write!(
            f,
            "  solving:      {:.6}",
            self.statistics.solving_time.as_secs_f64()
        )
    }
}
