use std::fmt;

use super::term::Term;
use super::value_objects::OptimizationType;

/// Objective function to minimize or maximize
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Objective {
    pub optimization_type: OptimizationType,
    pub term: Term,
}

impl Objective {
    pub fn new(optimization_type: OptimizationType, term: impl Into<Term>) -> Self {
        Self {
            optimization_type,
            term: term.into(),
        }
    }

    pub fn is_maximize(&self) -> bool {
        self.optimization_type == OptimizationType::Maximize
    }
}

pub fn minimize(term: impl Into<Term>) -> Objective {
    Objective::new(OptimizationType::Minimize, term)
}

pub fn maximize(term: impl Into<Term>) -> Objective {
    Objective::new(OptimizationType::Maximize, term)
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.optimization_type {
            OptimizationType::Maximize => write!(f, "max({})", self.term),
            OptimizationType::Minimize => write!(f, "min({})", self.term),
        }
    }
}
