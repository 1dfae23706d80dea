// Best-effort LP text reader.
//
// The input is read line by line through a small section state machine.
// A malformed statement is reported as a `ParseError` carrying the line it
// started on, then skipped: the returned document holds everything that did
// parse, so callers must look at `LpDocument::errors` before trusting it.
//
// Variables are created on first reference as free integers and refined
// once the whole text has been read: a `BINARY` or `GENERAL` declaration
// fixes the type (anything undeclared is real), a `BOUNDS` line fixes the
// bounds (anything undeclared gets the LP default `[0, +inf)`). A variable
// used as an indicator guard is binary.

use std::collections::BTreeMap;

use crate::domain::{
    Constraint, Objective, OptimizationType, Relation, Term, Variable, VariableSet, VariableType,
};
use crate::error::ParseError;

/// Result of reading LP text
#[derive(Debug, Default)]
pub struct LpDocument {
    pub objective: Objective,
    pub constraints: Vec<Constraint>,
    /// Every variable mentioned or declared, referenced or not
    pub variables: VariableSet,
    pub errors: Vec<ParseError>,
}

impl LpDocument {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn parse_lp(text: &str) -> LpDocument {
    let mut parser = Parser::default();
    for (index, raw) in text.lines().enumerate() {
        parser.line(index + 1, raw);
    }
    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Section {
    #[default]
    Preamble,
    Objective(OptimizationType),
    Constraints,
    Bounds,
    Binary,
    General,
    End,
}

#[derive(Debug)]
struct Entry {
    variable: Variable,
    declared_type: Option<(VariableType, usize)>,
    declared_bounds: Option<(f64, f64, usize)>,
}

/// A logical statement, possibly spread over several lines.
#[derive(Debug)]
struct Statement {
    line: usize,
    text: String,
}

#[derive(Debug, Default)]
struct Parser {
    section: Section,
    pending: Option<Statement>,
    objective: Option<Objective>,
    constraints: Vec<Constraint>,
    entries: BTreeMap<String, Entry>,
    errors: Vec<ParseError>,
}

impl Parser {
    fn line(&mut self, number: usize, raw: &str) {
        let content = raw.split('\\').next().unwrap_or_default().trim();
        if content.is_empty() {
            return;
        }

        if let Some((section, rest)) = section_header(content) {
            self.flush();
            self.section = section;
            if let (Section::Objective(sense), None) = (section, &self.objective) {
                // an empty objective section still fixes the direction
                self.objective = Some(Objective::new(sense, Term::new()));
            }
            if !rest.is_empty() {
                self.push(number, rest);
            }
            return;
        }

        self.push(number, content);
    }

    fn push(&mut self, number: usize, content: &str) {
        match self.section {
            Section::Preamble => {
                self.error(number, format!("statement outside of any section: {content}"))
            }
            Section::End => self.error(number, format!("statement after END: {content}")),
            Section::Binary | Section::General => self.declare_types(number, content),
            Section::Objective(_) => self.append(number, content, true),
            Section::Constraints | Section::Bounds => {
                let joins = self
                    .pending
                    .as_ref()
                    .is_some_and(|p| continues(&p.text, content));
                if joins {
                    self.append(number, content, true);
                } else {
                    self.flush();
                    self.append(number, content, false);
                }
            }
        }
    }

    fn append(&mut self, number: usize, content: &str, join: bool) {
        match &mut self.pending {
            Some(statement) if join => {
                statement.text.push(' ');
                statement.text.push_str(content);
            }
            _ => {
                self.pending = Some(Statement {
                    line: number,
                    text: content.to_string(),
                })
            }
        }
    }

    fn flush(&mut self) {
        let Some(statement) = self.pending.take() else {
            return;
        };
        let outcome = match self.section {
            Section::Objective(sense) => self.objective_statement(sense, &statement.text),
            Section::Constraints => self
                .constraint_statement(statement.line, &statement.text)
                .map(|c| self.constraints.push(c)),
            Section::Bounds => self.bounds_statement(statement.line, &statement.text),
            _ => Ok(()),
        };
        if let Err(message) = outcome {
            self.error(statement.line, message);
        }
    }

    fn error(&mut self, line: usize, message: String) {
        tracing::warn!(line, %message, "skipping malformed LP statement");
        self.errors.push(ParseError::new(line, message));
    }

    fn variable(&mut self, name: &str) -> Variable {
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| Entry {
                variable: Variable::free_integer(name),
                declared_type: None,
                declared_bounds: None,
            })
            .variable
            .clone()
    }

    fn objective_statement(&mut self, sense: OptimizationType, text: &str) -> Result<(), String> {
        let tokens = tokenize(text)?;
        let body = match tokens.as_slice() {
            [Token::Ident(_), Token::Colon, rest @ ..] => rest,
            all => all,
        };
        let term = self.expression(body)?;
        match &mut self.objective {
            Some(objective) => {
                objective.term += term;
            }
            None => self.objective = Some(Objective::new(sense, term)),
        }
        Ok(())
    }

    fn constraint_statement(&mut self, line: usize, text: &str) -> Result<Constraint, String> {
        let tokens = tokenize(text)?;
        let (name, body) = match tokens.as_slice() {
            [Token::Ident(name), Token::Colon, rest @ ..] => (Some(name.clone()), rest),
            all => (None, all),
        };

        let (guard, body) = match body.iter().position(|t| *t == Token::Arrow) {
            Some(arrow) => (Some(&body[..arrow]), &body[arrow + 1..]),
            None => (None, body),
        };

        let mut constraint = self.relation(body)?;
        if let Some(name) = name {
            constraint.set_name(name);
        }
        if let Some(guard) = guard {
            let guard = self.guard(line, guard)?;
            constraint = constraint.with_indicator(guard).map_err(|e| e.to_string())?;
        }
        Ok(constraint)
    }

    /// Parse `b = v` and force `b` to be binary.
    fn guard(&mut self, line: usize, tokens: &[Token]) -> Result<Constraint, String> {
        let guard = self.relation(tokens)?;
        let guarded: Vec<Variable> = guard.term().iter().map(|(v, _)| v.clone()).collect();
        if let [variable] = guarded.as_slice() {
            variable.set_type_unchecked(VariableType::Binary);
            variable.set_lower_bound_unchecked(0.0);
            variable.set_upper_bound_unchecked(1.0);
            if let Some(entry) = self.entries.get_mut(variable.name()) {
                entry.declared_type = Some((VariableType::Binary, line));
            }
        }
        Ok(guard)
    }

    fn relation(&mut self, tokens: &[Token]) -> Result<Constraint, String> {
        let positions: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter_map(|(i, t)| matches!(t, Token::Rel(_)).then_some(i))
            .collect();

        match positions.as_slice() {
            [at] => {
                let relation = relation_at(tokens, *at);
                let lhs = self.expression(&tokens[..*at])?;
                let rhs = self.expression(&tokens[at + 1..])?;
                Constraint::relate(lhs, relation, rhs).map_err(|e| e.to_string())
            }
            [first, second] => {
                let lower = self.expression(&tokens[..*first])?;
                let term = self.expression(&tokens[first + 1..*second])?;
                let upper = self.expression(&tokens[second + 1..])?;
                if !lower.is_constant() || !upper.is_constant() {
                    return Err("the outer sides of a ranged constraint must be constant".into());
                }
                Constraint::range(
                    lower.constant(),
                    relation_at(tokens, *first),
                    term,
                    relation_at(tokens, *second),
                    upper.constant(),
                )
                .map_err(|e| e.to_string())
            }
            [] => Err("missing relation operator".into()),
            _ => Err("too many relation operators".into()),
        }
    }

    /// `[sign] monomial { sign monomial }`
    fn expression(&mut self, tokens: &[Token]) -> Result<Term, String> {
        if tokens.is_empty() {
            return Err("empty expression".into());
        }

        let mut term = Term::new();
        let mut rest = tokens;
        loop {
            let mut sign = 1.0;
            while let Some((token, tail)) = rest.split_first() {
                match token {
                    Token::Plus => {}
                    Token::Minus => sign = -sign,
                    _ => break,
                }
                rest = tail;
            }

            let end = rest
                .iter()
                .position(|t| matches!(t, Token::Plus | Token::Minus))
                .unwrap_or(rest.len());
            let (monomial, tail) = rest.split_at(end);
            term += self.monomial(monomial)? * sign;
            rest = tail;

            if rest.is_empty() {
                return Ok(term);
            }
        }
    }

    /// `2 x`, `2*x`, `x*2`, `x`, `2`
    fn monomial(&mut self, tokens: &[Token]) -> Result<Term, String> {
        let mut coefficient = 1.0;
        let mut variable: Option<Variable> = None;
        let mut expect_factor = true;

        for token in tokens {
            match token {
                Token::Number(value) => {
                    coefficient *= value;
                    expect_factor = false;
                }
                Token::Ident(name) => {
                    if variable.is_some() {
                        return Err(format!("product of two variables near {name}"));
                    }
                    variable = Some(self.variable(name));
                    expect_factor = false;
                }
                Token::Star if !expect_factor => expect_factor = true,
                other => return Err(format!("unexpected {other:?} in expression")),
            }
        }
        if expect_factor {
            return Err("incomplete expression".into());
        }

        Ok(match variable {
            Some(variable) => Term::weighted(variable, coefficient),
            None => Term::constant_term(coefficient),
        })
    }

    fn bounds_statement(&mut self, line: usize, text: &str) -> Result<(), String> {
        let tokens = tokenize(text)?;

        if let [Token::Ident(name), Token::Ident(keyword)] = tokens.as_slice() {
            if keyword.eq_ignore_ascii_case("free") {
                return self.declare_bounds(line, name, Some(f64::NEG_INFINITY), Some(f64::INFINITY));
            }
        }

        let positions: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter_map(|(i, t)| matches!(t, Token::Rel(_)).then_some(i))
            .collect();

        match positions.as_slice() {
            [at] => {
                let relation = relation_at(&tokens, *at);
                let (lhs, rhs) = (&tokens[..*at], &tokens[at + 1..]);
                if let [Token::Ident(name)] = lhs {
                    let value = number(rhs)?;
                    let (lower, upper) = match relation {
                        Relation::LessThanOrEqual => (None, Some(value)),
                        Relation::GreaterThanOrEqual => (Some(value), None),
                        Relation::Equal => (Some(value), Some(value)),
                    };
                    self.declare_bounds(line, name, lower, upper)
                } else if let [Token::Ident(name)] = rhs {
                    let value = number(lhs)?;
                    let (lower, upper) = match relation {
                        Relation::LessThanOrEqual => (Some(value), None),
                        Relation::GreaterThanOrEqual => (None, Some(value)),
                        Relation::Equal => (Some(value), Some(value)),
                    };
                    self.declare_bounds(line, name, lower, upper)
                } else {
                    Err("a bound needs a single variable on one side".into())
                }
            }
            [first, second] => {
                let [Token::Ident(name)] = &tokens[first + 1..*second] else {
                    return Err("a bound needs a single variable in the middle".into());
                };
                let outer = (number(&tokens[..*first])?, number(&tokens[second + 1..])?);
                let (lower, upper) = match (relation_at(&tokens, *first), relation_at(&tokens, *second)) {
                    (Relation::LessThanOrEqual, Relation::LessThanOrEqual) => outer,
                    (Relation::GreaterThanOrEqual, Relation::GreaterThanOrEqual) => (outer.1, outer.0),
                    (left, right) => return Err(format!("incompatible bound relations {left} and {right}")),
                };
                self.declare_bounds(line, name, Some(lower), Some(upper))
            }
            _ => Err(format!("cannot read bound: {text}")),
        }
    }

    /// Record new bounds; an unspecified side keeps its earlier value or the LP default.
    fn declare_bounds(
        &mut self,
        line: usize,
        name: &str,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<(), String> {
        self.variable(name);
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| format!("unknown variable {name}"))?;
        let (old_lower, old_upper) = entry
            .declared_bounds
            .map(|(l, u, _)| (l, u))
            .unwrap_or((0.0, f64::INFINITY));
        entry.declared_bounds = Some((lower.unwrap_or(old_lower), upper.unwrap_or(old_upper), line));
        Ok(())
    }

    fn declare_types(&mut self, line: usize, content: &str) {
        let variable_type = match self.section {
            Section::Binary => VariableType::Binary,
            _ => VariableType::Integer,
        };
        for name in content.split_whitespace() {
            if !is_name(name) {
                self.error(line, format!("not a variable name: {name}"));
                continue;
            }
            self.variable(name);
            let Some(entry) = self.entries.get_mut(name) else {
                continue;
            };
            let conflict = match entry.declared_type {
                Some((declared, _)) if declared != variable_type => {
                    Some(format!("{name} is already declared {declared}"))
                }
                _ => {
                    entry.declared_type = Some((variable_type, line));
                    None
                }
            };
            if let Some(message) = conflict {
                self.error(line, message);
            }
        }
    }

    fn finish(mut self) -> LpDocument {
        self.flush();

        let mut variables = VariableSet::new();
        let mut errors = std::mem::take(&mut self.errors);
        for entry in self.entries.values() {
            let variable_type = entry.declared_type.map_or(VariableType::Real, |(t, _)| t);
            let (lower, upper, line) = match (entry.declared_bounds, variable_type) {
                (Some(bounds), _) => bounds,
                (None, VariableType::Binary) => (0.0, 1.0, 0),
                (None, _) => (0.0, f64::INFINITY, 0),
            };

            let variable = &entry.variable;
            variable.set_type_unchecked(variable_type);
            variable.set_lower_bound_unchecked(lower);
            variable.set_upper_bound_unchecked(upper);
            if let Err(e) = variable.validate() {
                let line = entry.declared_type.map_or(line, |(_, l)| l.max(line));
                tracing::warn!(line, error = %e, "invalid variable declaration");
                errors.push(ParseError::new(line, e.to_string()));
            }
            // names are unique in `entries`
            let _ = variables.insert(variable.clone());
        }

        LpDocument {
            objective: self.objective.unwrap_or_default(),
            constraints: self.constraints,
            variables,
            errors,
        }
    }
}

/// A header line, with whatever follows the keyword on the same line.
fn section_header(line: &str) -> Option<(Section, &str)> {
    let lower = line.to_ascii_lowercase();
    let (word, rest_at) = match lower.find(char::is_whitespace) {
        Some(at) => (&lower[..at], at),
        None => (lower.as_str(), lower.len()),
    };
    let rest = line[rest_at..].trim_start();

    let section = match word {
        "max" | "maximize" | "maximise" | "maximum" => Section::Objective(OptimizationType::Maximize),
        "min" | "minimize" | "minimise" | "minimum" => Section::Objective(OptimizationType::Minimize),
        "s.t." | "st" | "st." => Section::Constraints,
        "subject" | "such" => {
            let second = rest.split_whitespace().next().map(str::to_ascii_lowercase);
            let expected = if word == "subject" { "to" } else { "that" };
            if second.as_deref() != Some(expected) {
                return None;
            }
            return Some((Section::Constraints, rest[expected.len()..].trim_start()));
        }
        "bound" | "bounds" => Section::Bounds,
        "bin" | "binary" | "binaries" => Section::Binary,
        "gen" | "general" | "generals" => Section::General,
        "end" => Section::End,
        _ => return None,
    };
    // a lone keyword, or a keyword followed by something that is not an operator
    if rest.starts_with(|c: char| "+-*<>=:".contains(c)) {
        return None;
    }
    Some((section, rest))
}

/// Whether `next` belongs to the statement in `pending`.
fn continues(pending: &str, next: &str) -> bool {
    let open_end = pending.ends_with(|c: char| "+-*<>=:".contains(c));
    let open_start = next.starts_with(|c: char| "<>=".contains(c));
    open_end || open_start
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Colon,
    Arrow,
    Rel(Relation),
}

fn relation_at(tokens: &[Token], at: usize) -> Relation {
    match tokens[at] {
        Token::Rel(relation) => relation,
        _ => Relation::Equal,
    }
}

/// `[sign]* number`
fn number(tokens: &[Token]) -> Result<f64, String> {
    let mut sign = 1.0;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Plus => {}
            Token::Minus => sign = -sign,
            Token::Number(value) if i + 1 == tokens.len() => return Ok(sign * value),
            other => return Err(format!("expected a number, found {other:?}")),
        }
    }
    Err("expected a number".into())
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_.!\"#$%&(),;?@'{}~[]^|".contains(c)
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_name_start) && chars.all(is_name_char)
}

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' if next == Some('>') => {
                tokens.push(Token::Arrow);
                i += 2;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            '<' | '>' | '=' => {
                let (relation, width) = match (c, next) {
                    ('<', Some('=')) | ('=', Some('<')) => (Relation::LessThanOrEqual, 2),
                    ('>', Some('=')) | ('=', Some('>')) => (Relation::GreaterThanOrEqual, 2),
                    ('=', Some('=')) => (Relation::Equal, 2),
                    ('<', _) => (Relation::LessThanOrEqual, 1),
                    ('>', _) => (Relation::GreaterThanOrEqual, 1),
                    _ => (Relation::Equal, 1),
                };
                tokens.push(Token::Rel(relation));
                i += width;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number {literal}"))?;
                tokens.push(Token::Number(value));
            }
            c if is_name_start(c) => {
                let start = i;
                while i < chars.len() && is_name_char(chars[i]) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                if name.eq_ignore_ascii_case("inf") || name.eq_ignore_ascii_case("infinity") {
                    tokens.push(Token::Number(f64::INFINITY));
                } else {
                    tokens.push(Token::Ident(name));
                }
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}
