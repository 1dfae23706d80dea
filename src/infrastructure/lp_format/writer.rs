// Canonical LP text.
//
// Sections always appear in the same order: objective, `SUBJECT TO`,
// `BOUNDS`, `BINARY`, `GENERAL`, `END`. Constraints are normalized before
// printing, summands and variables are listed in name order, so the text
// does not depend on the order variables were created in.

use std::fmt::Write as _;

use crate::domain::{Constraint, Objective, Variable, VariableSet, VariableType};

pub fn write_lp(objective: &Objective, constraints: &[Constraint], variables: &VariableSet) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", objective.optimization_type);
    let _ = writeln!(out, "  {}", objective.term);

    out.push_str("SUBJECT TO\n");
    for constraint in constraints {
        let _ = writeln!(out, "  {}", constraint.normalize());
    }

    out.push_str("BOUNDS\n");
    for variable in variables {
        if let Some(line) = bounds_line(variable) {
            let _ = writeln!(out, "  {line}");
        }
    }

    out.push_str("BINARY\n");
    for variable in typed(variables, VariableType::Binary) {
        let _ = writeln!(out, "  {}", variable.name());
    }

    out.push_str("GENERAL\n");
    for variable in typed(variables, VariableType::Integer) {
        let _ = writeln!(out, "  {}", variable.name());
    }

    out.push_str("END\n");
    out
}

/// `None` for the implicit default `[0, +inf)`.
fn bounds_line(variable: &Variable) -> Option<String> {
    let (lower, upper) = (variable.lower_bound(), variable.upper_bound());
    let name = variable.name();

    if lower == 0.0 && upper == f64::INFINITY {
        return None;
    }

    let line = if lower == f64::NEG_INFINITY && upper == f64::INFINITY {
        format!("{name} FREE")
    } else if lower == 0.0 {
        format!("{name} <= {upper}")
    } else if upper == f64::INFINITY {
        format!("{lower} <= {name}")
    } else {
        format!("{lower} <= {name} <= {upper}")
    };
    Some(line)
}

fn typed(variables: &VariableSet, variable_type: VariableType) -> impl Iterator<Item = &Variable> {
    variables
        .iter()
        .filter(move |v| v.variable_type() == variable_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{maximize, model_variables, minimize, ConstraintExt, Relation};

    #[test]
    fn test_writes_sections_in_order() {
        let x = Variable::real("x", 0.0, 5.0).unwrap();
        let y = Variable::free_integer("y");
        let b = Variable::binary("b");

        let objective = maximize(&x + 2.0 * &y);
        let constraints = vec![
            Constraint::left(10.0, Relation::GreaterThanOrEqual, &x + &y + 1.0).named("cap"),
            y.leq(4.0).with_indicator(b.equals(1.0)).unwrap(),
        ];
        let variables = model_variables(&objective, &constraints).unwrap();

        assert_eq!(
            write_lp(&objective, &constraints, &variables),
            "MAXIMIZE\n  x + 2 y\n\
             SUBJECT TO\n  cap: x + y <= 9\n  b = 1 -> y <= 4\n\
             BOUNDS\n  b <= 1\n  x <= 5\n  y FREE\n\
             BINARY\n  b\n\
             GENERAL\n  y\n\
             END\n"
        );
    }

    #[test]
    fn test_bounds_lines() {
        let lower_only = Variable::integer("a", -3.0, f64::INFINITY).unwrap();
        let both = Variable::real("c", -1.5, 2.5).unwrap();
        let default = Variable::real("d", 0.0, f64::INFINITY).unwrap();
        assert_eq!(bounds_line(&lower_only).as_deref(), Some("-3 <= a"));
        assert_eq!(bounds_line(&both).as_deref(), Some("-1.5 <= c <= 2.5"));
        assert_eq!(bounds_line(&default), None);
    }

    #[test]
    fn test_empty_model() {
        let text = write_lp(&minimize(0.0), &[], &VariableSet::new());
        assert_eq!(
            text,
            "MINIMIZE\n  0\nSUBJECT TO\nBOUNDS\nBINARY\nGENERAL\nEND\n"
        );
    }
}
