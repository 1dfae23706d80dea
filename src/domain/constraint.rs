// Linear constraints in four canonical shapes, optionally guarded by an
// indicator (`b = 1 -> x + y <= 3`).

use std::fmt;

use super::error::ModelError;
use super::term::Term;
use super::value_objects::{Relation, VariableType};
use super::variable::{Variable, VariableSet};

/// Where the bound(s) sit relative to the term
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintShape {
    /// `bound rel term`
    Left { bound: f64, relation: Relation },
    /// `term rel bound`
    Right { relation: Relation, bound: f64 },
    /// `term = bound`
    Equal { bound: f64 },
    /// `lower lrel term rrel upper`
    Range {
        lower: f64,
        left: Relation,
        right: Relation,
        upper: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    shape: ConstraintShape,
    term: Term,
    name: Option<String>,
    indicator: Option<Box<Constraint>>,
}

impl Constraint {
    /// `bound rel term`
    pub fn left(bound: f64, relation: Relation, term: impl Into<Term>) -> Self {
        let shape = match relation {
            Relation::Equal => ConstraintShape::Equal { bound },
            relation => ConstraintShape::Left { bound, relation },
        };
        Self::with_shape(shape, term.into())
    }

    /// `term rel bound`
    pub fn right(term: impl Into<Term>, relation: Relation, bound: f64) -> Self {
        let shape = match relation {
            Relation::Equal => ConstraintShape::Equal { bound },
            relation => ConstraintShape::Right { relation, bound },
        };
        Self::with_shape(shape, term.into())
    }

    /// `lower lrel term rrel upper`. Only the relation directions are checked,
    /// inverted numeric bounds are accepted.
    pub fn range(
        lower: f64,
        left: Relation,
        term: impl Into<Term>,
        right: Relation,
        upper: f64,
    ) -> Result<Self, ModelError> {
        if !left.compatible_with(right) {
            return Err(ModelError::IncompatibleRelations { left, right });
        }
        Ok(Self::with_shape(
            ConstraintShape::Range {
                lower,
                left,
                right,
                upper,
            },
            term.into(),
        ))
    }

    /// Relate two terms; exactly one of them must be constant.
    pub fn relate(
        lhs: impl Into<Term>,
        relation: Relation,
        rhs: impl Into<Term>,
    ) -> Result<Self, ModelError> {
        let (lhs, rhs) = (lhs.into(), rhs.into());
        match (lhs.is_constant(), rhs.is_constant()) {
            (true, true) => Err(ModelError::ConstantSide("both sides are constant")),
            (false, false) => Err(ModelError::ConstantSide("neither side is constant")),
            (true, false) => Ok(Self::left(lhs.constant(), relation, rhs)),
            (false, true) => Ok(Self::right(lhs, relation, rhs.constant())),
        }
    }

    /// Extend `lower rel term` into `lower rel term relation upper`.
    pub fn chain(self, relation: Relation, upper: f64) -> Result<Self, ModelError> {
        let (lower, left) = match self.shape {
            ConstraintShape::Left { bound, relation } => (bound, relation),
            ConstraintShape::Equal { bound } => (bound, Relation::Equal),
            ConstraintShape::Right { .. } => return Err(ModelError::InvalidChain("term-first")),
            ConstraintShape::Range { .. } => return Err(ModelError::InvalidChain("three-sided")),
        };
        let mut chained = Self::range(lower, left, self.term, relation, upper)?;
        chained.name = self.name;
        chained.indicator = self.indicator;
        Ok(chained)
    }

    /// Extend `term rel upper` into `lower relation term rel upper`.
    pub fn chain_left(lower: f64, relation: Relation, rhs: Constraint) -> Result<Self, ModelError> {
        let (right, upper) = match rhs.shape {
            ConstraintShape::Right { relation, bound } => (relation, bound),
            ConstraintShape::Equal { bound } => (Relation::Equal, bound),
            ConstraintShape::Left { .. } => return Err(ModelError::InvalidChain("bound-first")),
            ConstraintShape::Range { .. } => return Err(ModelError::InvalidChain("three-sided")),
        };
        let mut chained = Self::range(lower, relation, rhs.term, right, upper)?;
        chained.name = rhs.name;
        chained.indicator = rhs.indicator;
        Ok(chained)
    }

    /// Chain with `<= upper`.
    pub fn leq(self, upper: f64) -> Result<Self, ModelError> {
        self.chain(Relation::LessThanOrEqual, upper)
    }

    /// Chain with `>= upper`.
    pub fn geq(self, upper: f64) -> Result<Self, ModelError> {
        self.chain(Relation::GreaterThanOrEqual, upper)
    }

    fn with_shape(shape: ConstraintShape, term: Term) -> Self {
        Self {
            shape,
            term,
            name: None,
            indicator: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Make this constraint active only when `indicator` holds.
    pub fn with_indicator(mut self, indicator: Constraint) -> Result<Self, ModelError> {
        if !indicator.is_indicator() {
            return Err(ModelError::NotAnIndicator);
        }
        self.indicator = Some(Box::new(indicator));
        Ok(self)
    }

    /// True iff this is `1·b = 0` or `1·b = 1` for a single binary `b`.
    pub fn is_indicator(&self) -> bool {
        let ConstraintShape::Equal { bound } = self.shape else {
            return false;
        };
        if bound != 0.0 && bound != 1.0 {
            return false;
        }
        if self.term.len() != 1 || self.term.constant() != 0.0 {
            return false;
        }
        self.term
            .iter()
            .next()
            .is_some_and(|(v, c)| c == 1.0 && v.variable_type() == VariableType::Binary)
    }

    /// The binary variable and value of an indicator constraint.
    pub fn indicator_literal(&self) -> Option<(&Variable, f64)> {
        if !self.is_indicator() {
            return None;
        }
        let (variable, _) = self.term.iter().next()?;
        Some((variable, self.equality_bound()?))
    }

    fn equality_bound(&self) -> Option<f64> {
        match self.shape {
            ConstraintShape::Equal { bound } => Some(bound),
            _ => None,
        }
    }

    pub fn shape(&self) -> ConstraintShape {
        self.shape
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn indicator(&self) -> Option<&Constraint> {
        self.indicator.as_deref()
    }

    /// Fold the term's constant into the bound(s) and turn `bound rel term`
    /// into `term rel' bound`.
    pub fn normalize(&self) -> Constraint {
        let offset = self.term.constant();
        let mut term = self.term.clone();
        term.set_constant(0.0);

        let shape = match self.shape {
            ConstraintShape::Left { bound, relation } => ConstraintShape::Right {
                relation: relation.flip(),
                bound: bound - offset,
            },
            ConstraintShape::Right { relation, bound } => ConstraintShape::Right {
                relation,
                bound: bound - offset,
            },
            ConstraintShape::Equal { bound } => ConstraintShape::Equal {
                bound: bound - offset,
            },
            ConstraintShape::Range {
                lower,
                left,
                right,
                upper,
            } => ConstraintShape::Range {
                lower: lower - offset,
                left,
                right,
                upper: upper - offset,
            },
        };

        Constraint {
            shape,
            term,
            name: self.name.clone(),
            indicator: self.indicator.clone(),
        }
    }

    /// Variables of the term and of the indicator.
    pub fn variables(&self) -> Result<VariableSet, ModelError> {
        let mut set = self.term.variables()?;
        if let Some(indicator) = &self.indicator {
            set.extend(indicator.term.iter().map(|(v, _)| v.clone()))?;
        }
        Ok(set)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name}: ")?;
        }
        if let Some(indicator) = &self.indicator {
            write!(f, "{indicator} -> ")?;
        }
        let term = &self.term;
        match self.shape {
            ConstraintShape::Left { bound, relation } => write!(f, "{bound} {relation} {term}"),
            ConstraintShape::Right { relation, bound } => write!(f, "{term} {relation} {bound}"),
            ConstraintShape::Equal { bound } => write!(f, "{term} = {bound}"),
            ConstraintShape::Range {
                lower,
                left,
                right,
                upper,
            } => write!(f, "{lower} {left} {term} {right} {upper}"),
        }
    }
}

/// Build `term rel constant` constraints straight from terms and variables.
pub trait ConstraintExt {
    /// `self <= bound`
    fn leq(&self, bound: f64) -> Constraint;

    /// `self >= bound`
    fn geq(&self, bound: f64) -> Constraint;

    /// `self = bound`
    fn equals(&self, bound: f64) -> Constraint;

    /// `lower <= self <= upper`
    fn between(&self, lower: f64, upper: f64) -> Constraint;
}

impl<T> ConstraintExt for T
where
    for<'a> &'a T: Into<Term>,
{
    fn leq(&self, bound: f64) -> Constraint {
        Constraint::right(self, Relation::LessThanOrEqual, bound)
    }

    fn geq(&self, bound: f64) -> Constraint {
        Constraint::right(self, Relation::GreaterThanOrEqual, bound)
    }

    fn equals(&self, bound: f64) -> Constraint {
        Constraint::right(self, Relation::Equal, bound)
    }

    fn between(&self, lower: f64, upper: f64) -> Constraint {
        Constraint {
            shape: ConstraintShape::Range {
                lower,
                left: Relation::LessThanOrEqual,
                right: Relation::LessThanOrEqual,
                upper,
            },
            term: self.into(),
            name: None,
            indicator: None,
        }
    }
}
