// Linear terms: `Σ coefficient·variable + constant`.
//
// Every operation keeps the coefficient map free of zero entries, so a term
// is constant exactly when its map is empty.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use super::error::ModelError;
use super::variable::{Variable, VariableSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Term {
    coefficients: BTreeMap<Variable, f64>,
    constant: f64,
}

impl Term {
    /// The zero term.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant_term(constant: f64) -> Self {
        Self {
            coefficients: BTreeMap::new(),
            constant,
        }
    }

    pub fn weighted(variable: Variable, coefficient: f64) -> Self {
        let mut term = Self::new();
        term.add_term(variable, coefficient);
        term
    }

    /// Accumulate `coefficient·variable`; an entry that nets to zero disappears.
    pub fn add_term(&mut self, variable: Variable, coefficient: f64) {
        if coefficient == 0.0 {
            return;
        }
        match self.coefficients.entry(variable) {
            btree_map::Entry::Occupied(mut entry) => {
                *entry.get_mut() += coefficient;
                if *entry.get() == 0.0 {
                    entry.remove();
                }
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(coefficient);
            }
        }
    }

    pub fn add_constant(&mut self, constant: f64) {
        self.constant += constant;
    }

    /// Replace the coefficient of `variable`; zero removes it.
    pub fn set_coefficient(&mut self, variable: Variable, coefficient: f64) {
        if coefficient == 0.0 {
            self.coefficients.remove(&variable);
        } else {
            self.coefficients.insert(variable, coefficient);
        }
    }

    /// Coefficient of `variable`, zero if absent.
    pub fn coefficient(&self, variable: &Variable) -> f64 {
        self.coefficients.get(variable).copied().unwrap_or(0.0)
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn set_constant(&mut self, constant: f64) {
        self.constant = constant;
    }

    pub fn is_constant(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty() && self.constant == 0.0
    }

    /// `(variable, coefficient)` pairs in variable creation order.
    ///
    /// Display order is by name instead, see the `Display` impl.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, f64)> {
        self.coefficients.iter().map(|(v, c)| (v, *c))
    }

    /// The variables this term mentions, keyed by name.
    pub fn variables(&self) -> Result<VariableSet, ModelError> {
        let mut set = VariableSet::new();
        set.extend(self.coefficients.keys().cloned())?;
        Ok(set)
    }

    pub fn scale(&mut self, factor: f64) {
        self.constant *= factor;
        for coefficient in self.coefficients.values_mut() {
            *coefficient *= factor;
        }
        self.coefficients.retain(|_, c| *c != 0.0);
    }

    fn absorb(&mut self, other: &Term, sign: f64) {
        self.constant += sign * other.constant;
        for (variable, coefficient) in &other.coefficients {
            self.add_term(variable.clone(), sign * coefficient);
        }
    }

    /// Value of the term at `assignment`; missing variables count as zero.
    pub fn evaluate(&self, assignment: &BTreeMap<Variable, f64>) -> f64 {
        self.coefficients
            .iter()
            .map(|(v, c)| c * assignment.get(v).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

/// LP notation: summands in variable-name order, no leading `+`, unit
/// coefficients reduced to a sign, a non-zero constant appended with an
/// explicit sign.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constant() {
            return write!(f, "{}", self.constant);
        }

        let mut summands: Vec<(&Variable, f64)> = self.iter().collect();
        summands.sort_by(|a, b| a.0.name().cmp(b.0.name()).then_with(|| a.0.cmp(b.0)));

        let mut first = true;
        for (variable, coefficient) in summands {
            match (first, coefficient) {
                (true, c) if c == 1.0 => {}
                (true, c) if c == -1.0 => f.write_str("-")?,
                (true, c) if c < 0.0 => write!(f, "-{} ", -c)?,
                (true, c) => write!(f, "{c} ")?,
                (false, c) if c == 1.0 => f.write_str(" + ")?,
                (false, c) if c == -1.0 => f.write_str(" - ")?,
                (false, c) if c < 0.0 => write!(f, " - {} ", -c)?,
                (false, c) => write!(f, " + {c} ")?,
            }
            f.write_str(variable.name())?;
            first = false;
        }

        if self.constant < 0.0 {
            write!(f, " - {}", -self.constant)?;
        } else if self.constant > 0.0 {
            write!(f, " + {}", self.constant)?;
        }
        Ok(())
    }
}

impl From<f64> for Term {
    fn from(constant: f64) -> Self {
        Term::constant_term(constant)
    }
}

impl From<Variable> for Term {
    fn from(variable: Variable) -> Self {
        Term::weighted(variable, 1.0)
    }
}

impl From<&Variable> for Term {
    fn from(variable: &Variable) -> Self {
        Term::weighted(variable.clone(), 1.0)
    }
}

impl From<&Term> for Term {
    fn from(term: &Term) -> Self {
        term.clone()
    }
}

// ============================================================================
// Operator overloading
// ============================================================================

impl<T: Into<Term>> AddAssign<T> for Term {
    fn add_assign(&mut self, rhs: T) {
        self.absorb(&rhs.into(), 1.0);
    }
}

impl<T: Into<Term>> SubAssign<T> for Term {
    fn sub_assign(&mut self, rhs: T) {
        self.absorb(&rhs.into(), -1.0);
    }
}

impl MulAssign<f64> for Term {
    fn mul_assign(&mut self, rhs: f64) {
        self.scale(rhs);
    }
}

impl<T: Into<Term>> Add<T> for Term {
    type Output = Term;

    fn add(mut self, rhs: T) -> Term {
        self += rhs;
        self
    }
}

impl<T: Into<Term>> Add<T> for &Term {
    type Output = Term;

    fn add(self, rhs: T) -> Term {
        self.clone() + rhs
    }
}

impl<T: Into<Term>> Add<T> for Variable {
    type Output = Term;

    fn add(self, rhs: T) -> Term {
        Term::from(self) + rhs
    }
}

impl<T: Into<Term>> Add<T> for &Variable {
    type Output = Term;

    fn add(self, rhs: T) -> Term {
        Term::from(self) + rhs
    }
}

impl<T: Into<Term>> Sub<T> for Term {
    type Output = Term;

    fn sub(mut self, rhs: T) -> Term {
        self -= rhs;
        self
    }
}

impl<T: Into<Term>> Sub<T> for &Term {
    type Output = Term;

    fn sub(self, rhs: T) -> Term {
        self.clone() - rhs
    }
}

impl<T: Into<Term>> Sub<T> for Variable {
    type Output = Term;

    fn sub(self, rhs: T) -> Term {
        Term::from(self) - rhs
    }
}

impl<T: Into<Term>> Sub<T> for &Variable {
    type Output = Term;

    fn sub(self, rhs: T) -> Term {
        Term::from(self) - rhs
    }
}

impl Add<Term> for f64 {
    type Output = Term;

    fn add(self, rhs: Term) -> Term {
        rhs + self
    }
}

impl Add<&Term> for f64 {
    type Output = Term;

    fn add(self, rhs: &Term) -> Term {
        rhs + self
    }
}

impl Add<Variable> for f64 {
    type Output = Term;

    fn add(self, rhs: Variable) -> Term {
        rhs + self
    }
}

impl Add<&Variable> for f64 {
    type Output = Term;

    fn add(self, rhs: &Variable) -> Term {
        rhs + self
    }
}

impl Sub<Term> for f64 {
    type Output = Term;

    fn sub(self, rhs: Term) -> Term {
        -rhs + self
    }
}

impl Sub<&Term> for f64 {
    type Output = Term;

    fn sub(self, rhs: &Term) -> Term {
        -rhs + self
    }
}

impl Sub<Variable> for f64 {
    type Output = Term;

    fn sub(self, rhs: Variable) -> Term {
        -rhs + self
    }
}

impl Sub<&Variable> for f64 {
    type Output = Term;

    fn sub(self, rhs: &Variable) -> Term {
        -rhs + self
    }
}

impl Mul<f64> for Term {
    type Output = Term;

    fn mul(mut self, rhs: f64) -> Term {
        self.scale(rhs);
        self
    }
}

impl Mul<f64> for &Term {
    type Output = Term;

    fn mul(self, rhs: f64) -> Term {
        self.clone() * rhs
    }
}

impl Mul<f64> for Variable {
    type Output = Term;

    fn mul(self, rhs: f64) -> Term {
        Term::weighted(self, rhs)
    }
}

impl Mul<f64> for &Variable {
    type Output = Term;

    fn mul(self, rhs: f64) -> Term {
        Term::weighted(self.clone(), rhs)
    }
}

impl Mul<Term> for f64 {
    type Output = Term;

    fn mul(self, rhs: Term) -> Term {
        rhs * self
    }
}

impl Mul<&Term> for f64 {
    type Output = Term;

    fn mul(self, rhs: &Term) -> Term {
        rhs * self
    }
}

impl Mul<Variable> for f64 {
    type Output = Term;

    fn mul(self, rhs: Variable) -> Term {
        Term::weighted(rhs, self)
    }
}

impl Mul<&Variable> for f64 {
    type Output = Term;

    fn mul(self, rhs: &Variable) -> Term {
        Term::weighted(rhs.clone(), self)
    }
}

impl Neg for Term {
    type Output = Term;

    fn neg(self) -> Term {
        self * -1.0
    }
}

impl Neg for &Term {
    type Output = Term;

    fn neg(self) -> Term {
        self.clone() * -1.0
    }
}

impl Neg for Variable {
    type Output = Term;

    fn neg(self) -> Term {
        Term::weighted(self, -1.0)
    }
}

impl Neg for &Variable {
    type Output = Term;

    fn neg(self) -> Term {
        Term::weighted(self.clone(), -1.0)
    }
}

impl<T: Into<Term>> Sum<T> for Term {
    fn sum<I: Iterator<Item = T>>(iter: I) -> Term {
        iter.fold(Term::new(), |acc, t| acc + t)
    }
}

/// Sum up variables or terms of any iterable container.
pub fn sum<I>(items: I) -> Term
where
    I: IntoIterator,
    I::Item: Into<Term>,
{
    items.into_iter().sum()
}
