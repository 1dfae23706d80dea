// Domain value objects representing core modeling concepts

use std::fmt;

/// Domain of a decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    /// Binary variable (x ∈ {0, 1})
    Binary,
    /// Integer number (x ∈ ℤ)
    Integer,
    /// Continuous real number (x ∈ ℝ)
    Real,
}

impl VariableType {
    pub fn is_integral(self) -> bool {
        matches!(self, VariableType::Binary | VariableType::Integer)
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableType::Binary => write!(f, "BINARY"),
            VariableType::Integer => write!(f, "INTEGER"),
            VariableType::Real => write!(f, "REAL"),
        }
    }
}

/// Relation between a term and a bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Less than or equal (≤)
    LessThanOrEqual,
    /// Equal (=)
    Equal,
    /// Greater than or equal (≥)
    GreaterThanOrEqual,
}

impl Relation {
    /// The relation seen from the other side (`a <= b` ⇔ `b >= a`).
    pub fn flip(self) -> Self {
        match self {
            Relation::LessThanOrEqual => Relation::GreaterThanOrEqual,
            Relation::GreaterThanOrEqual => Relation::LessThanOrEqual,
            Relation::Equal => Relation::Equal,
        }
    }

    /// Two relations can enclose a term only if they point the same way.
    pub fn compatible_with(self, other: Relation) -> bool {
        matches!(
            (self, other),
            (Relation::LessThanOrEqual, Relation::LessThanOrEqual)
                | (Relation::GreaterThanOrEqual, Relation::GreaterThanOrEqual)
        )
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::LessThanOrEqual => write!(f, "<="),
            Relation::Equal => write!(f, "="),
            Relation::GreaterThanOrEqual => write!(f, ">="),
        }
    }
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OptimizationType {
    /// Minimize the objective function
    #[default]
    Minimize,
    /// Maximize the objective function
    Maximize,
}

impl OptimizationType {
    /// Whether `candidate` is strictly better than `incumbent` in this direction.
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            OptimizationType::Minimize => candidate < incumbent,
            OptimizationType::Maximize => candidate > incumbent,
        }
    }
}

impl fmt::Display for OptimizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationType::Minimize => write!(f, "MINIMIZE"),
            OptimizationType::Maximize => write!(f, "MAXIMIZE"),
        }
    }
}

/// Status of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SolutionStatus {
    /// Nothing has been solved yet
    #[default]
    NotSolved,
    /// Found optimal solution
    Optimal,
    /// Found feasible solution (may not be optimal)
    Feasible,
    /// Problem has no feasible solution
    Infeasible,
    /// The backend could not tell infeasible from unbounded
    InfeasibleOrUnbound,
    /// Objective can be improved infinitely
    Unbound,
    /// Time limit reached with a feasible incumbent
    TimeoutFeasible,
    /// Time limit reached without any feasible point
    TimeoutInfeasible,
    /// Solver error occurred
    Error,
    /// The model was rejected by the backend
    Invalid,
    /// The backend reported something else
    Unknown,
    /// The model has not changed since the last solve
    AlreadySolved,
}

impl SolutionStatus {
    pub fn has_solution(self) -> bool {
        matches!(
            self,
            SolutionStatus::Optimal | SolutionStatus::Feasible | SolutionStatus::TimeoutFeasible
        )
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolutionStatus::NotSolved => "NOT_SOLVED",
            SolutionStatus::Optimal => "OPTIMAL",
            SolutionStatus::Feasible => "FEASIBLE",
            SolutionStatus::Infeasible => "INFEASIBLE",
            SolutionStatus::InfeasibleOrUnbound => "INFEASIBLE_OR_UNBOUND",
            SolutionStatus::Unbound => "UNBOUND",
            SolutionStatus::TimeoutFeasible => "TIMEOUT_FEASIBLE",
            SolutionStatus::TimeoutInfeasible => "TIMEOUT_INFEASIBLE",
            SolutionStatus::Error => "ERROR",
            SolutionStatus::Invalid => "INVALID",
            SolutionStatus::Unknown => "UNKNOWN",
            SolutionStatus::AlreadySolved => "ALREADY_SOLVED",
        };
        f.write_str(s)
    }
}

/// A single backend capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Lp,
    Ilp,
    Qp,
    Milp,
    Indicators,
    LogicalOps,
    WarmStart,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Feature::Lp => "lp",
            Feature::Ilp => "ilp",
            Feature::Qp => "qp",
            Feature::Milp => "milp",
            Feature::Indicators => "indicators",
            Feature::LogicalOps => "logicalops",
            Feature::WarmStart => "warmstart",
        };
        f.write_str(s)
    }
}

/// Capability descriptor of one backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features {
    pub lp: bool,
    pub ilp: bool,
    pub qp: bool,
    pub milp: bool,
    pub indicators: bool,
    pub logical_ops: bool,
    pub warm_start: bool,
}

impl Features {
    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::Lp => self.lp,
            Feature::Ilp => self.ilp,
            Feature::Qp => self.qp,
            Feature::Milp => self.milp,
            Feature::Indicators => self.indicators,
            Feature::LogicalOps => self.logical_ops,
            Feature::WarmStart => self.warm_start,
        }
    }

    pub fn supports_all(&self, required: &[Feature]) -> bool {
        required.iter().all(|f| self.supports(*f))
    }

    /// The first required feature this descriptor lacks.
    pub fn first_missing(&self, required: &[Feature]) -> Option<Feature> {
        required.iter().copied().find(|f| !self.supports(*f))
    }
}
