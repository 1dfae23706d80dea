#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use lpkit::domain::solver_service::Result;
use lpkit::{
    Assignment, BackendError, Constraint, Features, Objective, Solution, SolutionStatus,
    SolverBackend, Variable,
};
use parking_lot::Mutex;

/// Calls seen by a [`RecordingBackend`], shared with the test
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Backend that records every call and answers `solve` with canned values
pub struct RecordingBackend {
    pub log: CallLog,
    pub status: SolutionStatus,
    pub objective_value: f64,
    pub values: HashMap<String, f64>,
    pub features: Features,
    pub fail_solve: bool,
    variables: Vec<Variable>,
}

impl RecordingBackend {
    pub fn new(status: SolutionStatus, objective_value: f64) -> (Self, CallLog) {
        let log = CallLog::default();
        let backend = Self {
            log: log.clone(),
            status,
            objective_value,
            values: HashMap::new(),
            features: Features {
                lp: true,
                ilp: true,
                milp: true,
                ..Features::default()
            },
            fail_solve: false,
            variables: Vec::new(),
        };
        (backend, log)
    }

    pub fn with_value(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_solve = true;
        self
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().push(call.into());
    }
}

impl SolverBackend for RecordingBackend {
    fn name(&self) -> &str {
        "Recording"
    }

    fn features(&self) -> Features {
        self.features
    }

    fn add_variable(&mut self, variable: &Variable) -> Result<()> {
        self.record(format!("add_variable {}", variable.name()));
        self.variables.push(variable.clone());
        Ok(())
    }

    fn add_constraint(&mut self, constraint: &Constraint) -> Result<()> {
        self.record(format!("add_constraint {constraint}"));
        Ok(())
    }

    fn set_objective(&mut self, objective: &Objective) -> Result<()> {
        self.record(format!("set_objective {objective}"));
        Ok(())
    }

    fn solve(&mut self) -> Result<(SolutionStatus, Solution)> {
        self.record("solve");
        if self.fail_solve {
            return Err(BackendError::ExecutionFailed("engine crashed".into()));
        }
        let values: Assignment = self
            .variables
            .iter()
            .map(|v| (v.clone(), self.values.get(v.name()).copied().unwrap_or(0.0)))
            .collect();
        Ok((self.status, Solution::new(self.objective_value, values)))
    }

    fn reset(&mut self) {
        self.record("reset");
        self.variables.clear();
    }

    fn set_console_output(&mut self, verbose: bool) {
        self.record(format!("set_console_output {verbose}"));
    }

    fn set_timeout(&mut self, seconds: f64) {
        self.record(format!("set_timeout {seconds}"));
    }

    fn set_threads(&mut self, threads: usize) {
        self.record(format!("set_threads {threads}"));
    }

    fn presolve(&mut self, enabled: bool) {
        self.record(format!("presolve {enabled}"));
    }

    fn set_start_values(&mut self, values: &Assignment) -> Result<()> {
        let mut shown: Vec<String> = values
            .iter()
            .map(|(v, x)| format!("{}={x}", v.name()))
            .collect();
        shown.sort();
        self.record(format!("set_start_values {}", shown.join(",")));
        Ok(())
    }
}

/// Number of logged calls starting with `prefix`
pub fn count(log: &CallLog, prefix: &str) -> usize {
    log.lock().iter().filter(|c| c.starts_with(prefix)).count()
}
