// Decision variables and name-keyed variable sets.
//
// A `Variable` is a cheap shared handle. Identity is the handle's
// `VariableId`, not its name or bounds: two variables built with the same
// name are still different variables, and a `VariableSet` refuses to hold
// both.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::error::ModelError;
use super::value_objects::VariableType;

/// Stable identity of a variable handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(u64);

impl VariableId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        VariableId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Attributes {
    variable_type: VariableType,
    lower: f64,
    upper: f64,
    start: Option<f64>,
}

#[derive(Debug)]
struct VariableData {
    id: VariableId,
    name: String,
    attributes: RwLock<Attributes>,
}

/// Decision variable shared by every term and constraint mentioning it
#[derive(Clone)]
pub struct Variable(Arc<VariableData>);

impl Variable {
    /// Create a variable after checking its bounds against its domain.
    pub fn new(
        name: impl Into<String>,
        lower: f64,
        upper: f64,
        variable_type: VariableType,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        check_bounds(&name, lower, upper, variable_type)?;
        Ok(Self::from_parts(name, lower, upper, variable_type))
    }

    pub fn integer(name: impl Into<String>, lower: f64, upper: f64) -> Result<Self, ModelError> {
        Self::new(name, lower, upper, VariableType::Integer)
    }

    /// Integer variable without bounds.
    pub fn free_integer(name: impl Into<String>) -> Self {
        Self::from_parts(
            name.into(),
            f64::NEG_INFINITY,
            f64::INFINITY,
            VariableType::Integer,
        )
    }

    pub fn real(name: impl Into<String>, lower: f64, upper: f64) -> Result<Self, ModelError> {
        Self::new(name, lower, upper, VariableType::Real)
    }

    /// Real variable without bounds.
    pub fn free_real(name: impl Into<String>) -> Self {
        Self::from_parts(
            name.into(),
            f64::NEG_INFINITY,
            f64::INFINITY,
            VariableType::Real,
        )
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self::from_parts(name.into(), 0.0, 1.0, VariableType::Binary)
    }

    fn from_parts(name: String, lower: f64, upper: f64, variable_type: VariableType) -> Self {
        Variable(Arc::new(VariableData {
            id: VariableId::next(),
            name,
            attributes: RwLock::new(Attributes {
                variable_type,
                lower,
                upper,
                start: None,
            }),
        }))
    }

    /// Attach a start value used when warm starting is enabled.
    pub fn with_start(self, start: f64) -> Result<Self, ModelError> {
        self.set_start(Some(start))?;
        Ok(self)
    }

    pub fn id(&self) -> VariableId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn variable_type(&self) -> VariableType {
        self.0.attributes.read().variable_type
    }

    pub fn lower_bound(&self) -> f64 {
        self.0.attributes.read().lower
    }

    pub fn upper_bound(&self) -> f64 {
        self.0.attributes.read().upper
    }

    pub fn start(&self) -> Option<f64> {
        self.0.attributes.read().start
    }

    /// Replace the start value; it must lie in the variable's domain.
    pub fn set_start(&self, start: Option<f64>) -> Result<(), ModelError> {
        if let Some(value) = start {
            if !self.admits(value) {
                return Err(ModelError::StartValueOutOfDomain {
                    name: self.name().to_string(),
                    value,
                });
            }
        }
        self.0.attributes.write().start = start;
        Ok(())
    }

    pub fn is_integral(&self) -> bool {
        self.variable_type().is_integral()
    }

    /// Whether `value` is a point of this variable's domain.
    pub fn admits(&self, value: f64) -> bool {
        let attrs = *self.0.attributes.read();
        value.is_finite()
            && attrs.lower <= value
            && value <= attrs.upper
            && (!attrs.variable_type.is_integral() || value.fract() == 0.0)
    }

    /// Change the domain without re-validating the bounds.
    ///
    /// Meant for readers that learn a variable's declaration after its first use.
    pub fn set_type_unchecked(&self, variable_type: VariableType) {
        self.0.attributes.write().variable_type = variable_type;
    }

    pub fn set_lower_bound_unchecked(&self, lower: f64) {
        self.0.attributes.write().lower = lower;
    }

    pub fn set_upper_bound_unchecked(&self, upper: f64) {
        self.0.attributes.write().upper = upper;
    }

    /// Re-run the construction checks on the current attributes.
    pub fn validate(&self) -> Result<(), ModelError> {
        let attrs = *self.0.attributes.read();
        check_bounds(self.name(), attrs.lower, attrs.upper, attrs.variable_type)
    }
}

fn check_bounds(
    name: &str,
    lower: f64,
    upper: f64,
    variable_type: VariableType,
) -> Result<(), ModelError> {
    if lower.is_nan() || upper.is_nan() || lower == f64::INFINITY || upper == f64::NEG_INFINITY || lower > upper
    {
        return Err(ModelError::IllegalBounds {
            name: name.to_string(),
            lower,
            upper,
        });
    }

    match variable_type {
        VariableType::Binary if lower < 0.0 || upper > 1.0 => Err(ModelError::BinaryBounds {
            name: name.to_string(),
        }),
        VariableType::Integer => {
            for bound in [lower, upper] {
                if bound.is_finite() && bound.fract() != 0.0 {
                    return Err(ModelError::FractionalIntegerBound {
                        name: name.to_string(),
                        bound,
                    });
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Variable {}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attrs = *self.0.attributes.read();
        f.debug_struct("Variable")
            .field("id", &self.0.id.0)
            .field("name", &self.0.name)
            .field("type", &attrs.variable_type)
            .field("lower", &attrs.lower)
            .field("upper", &attrs.upper)
            .finish()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Variables ordered by name, at most one variable per name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableSet {
    by_name: BTreeMap<String, Variable>,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `variable`; returns `false` if this exact variable was already present.
    ///
    /// A different variable under the same name is a [`ModelError::NameCollision`].
    pub fn insert(&mut self, variable: Variable) -> Result<bool, ModelError> {
        match self.by_name.entry(variable.name().to_string()) {
            btree_map::Entry::Occupied(entry) => {
                if *entry.get() == variable {
                    Ok(false)
                } else {
                    Err(ModelError::NameCollision(variable.name().to_string()))
                }
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(variable);
                Ok(true)
            }
        }
    }

    /// Check that every variable of `other` could be inserted.
    pub fn check_compatible<'a, I>(&self, other: I) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = &'a Variable>,
    {
        for variable in other {
            if let Some(existing) = self.by_name.get(variable.name()) {
                if existing != variable {
                    return Err(ModelError::NameCollision(variable.name().to_string()));
                }
            }
        }
        Ok(())
    }

    pub fn extend<I>(&mut self, variables: I) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = Variable>,
    {
        for variable in variables {
            self.insert(variable)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.by_name.get(name)
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.by_name.get(variable.name()) == Some(variable)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.by_name.values()
    }
}

impl<'a> IntoIterator for &'a VariableSet {
    type Item = &'a Variable;
    type IntoIter = btree_map::Values<'a, String, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.by_name.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_checked() {
        assert!(matches!(
            Variable::real("x", 5.0, 1.0),
            Err(ModelError::IllegalBounds { .. })
        ));
        assert!(matches!(
            Variable::real("x", f64::INFINITY, f64::INFINITY),
            Err(ModelError::IllegalBounds { .. })
        ));
        assert!(matches!(
            Variable::real("x", f64::NEG_INFINITY, f64::NEG_INFINITY),
            Err(ModelError::IllegalBounds { .. })
        ));
        assert!(Variable::real("x", f64::NEG_INFINITY, 3.5).is_ok());
    }

    #[test]
    fn test_binary_and_integer_domains() {
        assert!(matches!(
            Variable::new("b", 0.0, 2.0, VariableType::Binary),
            Err(ModelError::BinaryBounds { .. })
        ));
        assert!(Variable::new("b", 0.0, 1.0, VariableType::Binary).is_ok());
        assert!(matches!(
            Variable::integer("i", 0.5, 4.0),
            Err(ModelError::FractionalIntegerBound { bound, .. }) if bound == 0.5
        ));
        assert!(Variable::integer("i", f64::NEG_INFINITY, 4.0).is_ok());
    }

    #[test]
    fn test_start_value_must_lie_in_domain() {
        let n = Variable::integer("n", 0.0, 5.0).unwrap();
        assert!(matches!(
            n.set_start(Some(2.5)),
            Err(ModelError::StartValueOutOfDomain { value, .. }) if value == 2.5
        ));
        assert!(n.set_start(Some(7.0)).is_err());
        assert_eq!(n.start(), None);

        n.set_start(Some(3.0)).unwrap();
        assert_eq!(n.start(), Some(3.0));
        n.set_start(None).unwrap();
        assert_eq!(n.start(), None);

        assert!(Variable::binary("b").with_start(2.0).is_err());
    }

    #[test]
    fn test_identity_is_not_structural() {
        let a = Variable::free_integer("x");
        let b = Variable::free_integer("x");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_set_rejects_name_collision() {
        let a = Variable::free_integer("x");
        let b = Variable::free_integer("x");
        let mut set = VariableSet::new();
        assert_eq!(set.insert(a.clone()), Ok(true));
        assert_eq!(set.insert(a), Ok(false));
        assert_eq!(set.insert(b), Err(ModelError::NameCollision("x".into())));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_set_iterates_by_name() {
        let mut set = VariableSet::new();
        set.insert(Variable::binary("z")).unwrap();
        set.insert(Variable::binary("a")).unwrap();
        set.insert(Variable::binary("m")).unwrap();
        let names: Vec<_> = set.iter().map(|v| v.name().to_string()).collect();
        assert_eq!(names, vec!["a", "m", "z"]);
    }

    #[test]
    fn test_admits_respects_domain() {
        let i = Variable::integer("i", 0.0, 10.0).unwrap();
        assert!(i.admits(3.0));
        assert!(!i.admits(3.5));
        assert!(!i.admits(11.0));
        let r = Variable::real("r", 0.0, 1.0).unwrap();
        assert!(r.admits(0.25));
    }

    #[test]
    fn test_unchecked_setters_refine_shared_handle() {
        let x = Variable::free_integer("x");
        let alias = x.clone();
        x.set_type_unchecked(VariableType::Binary);
        x.set_lower_bound_unchecked(0.0);
        x.set_upper_bound_unchecked(1.0);
        assert_eq!(alias.variable_type(), VariableType::Binary);
        assert_eq!(alias.upper_bound(), 1.0);
        assert!(alias.validate().is_ok());
    }
}
