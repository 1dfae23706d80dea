// Directory-backed store of earlier solve results.
//
// Layout: `<root>/<key>/optimal.sol`, `<root>/<key>/feasible.sol` and the
// model text `<root>/<key>/model.lp` written alongside. Solution files use
// the compact solution-vector format, so a variable missing from a file
// reads back as 0.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::{Assignment, OptimizationType, Solution, VariableSet};

const OPTIMAL_FILE: &str = "optimal.sol";
const FEASIBLE_FILE: &str = "feasible.sol";
const MODEL_FILE: &str = "model.lp";

#[derive(Debug, Clone)]
pub struct ResultCache {
    root: PathBuf,
}

impl ResultCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_dir(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    pub fn has_optimal(&self, key: &str) -> bool {
        self.entry_dir(key).join(OPTIMAL_FILE).is_file()
    }

    pub fn has_feasible(&self, key: &str) -> bool {
        self.entry_dir(key).join(FEASIBLE_FILE).is_file()
    }

    pub fn optimal(&self, key: &str, variables: &VariableSet) -> io::Result<Solution> {
        read_solution(&self.entry_dir(key).join(OPTIMAL_FILE), variables)
    }

    pub fn feasible(&self, key: &str, variables: &VariableSet) -> io::Result<Solution> {
        read_solution(&self.entry_dir(key).join(FEASIBLE_FILE), variables)
    }

    pub fn write_optimal(&self, key: &str, solution: &Solution, model: Option<&str>) -> io::Result<()> {
        self.write(key, OPTIMAL_FILE, solution, model)
    }

    pub fn write_feasible(&self, key: &str, solution: &Solution, model: Option<&str>) -> io::Result<()> {
        self.write(key, FEASIBLE_FILE, solution, model)
    }

    /// Store `solution` in the feasible slot unless the slot already holds an
    /// objective at least as good. Returns whether the slot was written.
    pub fn offer_feasible(
        &self,
        key: &str,
        solution: &Solution,
        sense: OptimizationType,
        model: Option<&str>,
    ) -> io::Result<bool> {
        if self.has_feasible(key) {
            let incumbent = read_objective(&self.entry_dir(key).join(FEASIBLE_FILE))?;
            if !sense.improves(solution.objective_value, incumbent) {
                return Ok(false);
            }
        }
        self.write_feasible(key, solution, model)?;
        Ok(true)
    }

    fn write(&self, key: &str, file: &str, solution: &Solution, model: Option<&str>) -> io::Result<()> {
        let dir = self.entry_dir(key);
        fs::create_dir_all(&dir)?;
        solution.write_solution_vector(dir.join(file), true)?;
        if let Some(model) = model {
            fs::write(dir.join(MODEL_FILE), model)?;
        }
        tracing::info!(key, file, objective = solution.objective_value, "cached solution");
        Ok(())
    }
}

/// Contents of a solution file: objective value and values by name.
#[derive(Debug, Default, PartialEq)]
struct SolutionFile {
    objective: f64,
    values: BTreeMap<String, f64>,
}

fn parse_solution_file(text: &str) -> io::Result<SolutionFile> {
    let mut parsed = SolutionFile::default();

    for line in text.lines() {
        let (content, comment) = match line.split_once('#') {
            Some((content, comment)) => (content, Some(comment)),
            None => (line, None),
        };

        if let Some(value) = comment.and_then(|c| c.trim().strip_prefix("objective value")) {
            parsed.objective = parse_number(value)?;
        }

        let mut fields = content.split_whitespace();
        if let (Some(name), Some(value)) = (fields.next(), fields.next()) {
            parsed.values.insert(name.to_string(), parse_number(value)?);
        }
    }
    Ok(parsed)
}

fn parse_number(text: &str) -> io::Result<f64> {
    text.trim().parse::<f64>().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid number in solution file '{}': {e}", text.trim()),
        )
    })
}

fn read_objective(path: &Path) -> io::Result<f64> {
    Ok(parse_solution_file(&fs::read_to_string(path)?)?.objective)
}

fn read_solution(path: &Path, variables: &VariableSet) -> io::Result<Solution> {
    let parsed = parse_solution_file(&fs::read_to_string(path)?)?;
    let values: Assignment = variables
        .iter()
        .map(|v| (v.clone(), parsed.values.get(v.name()).copied().unwrap_or(0.0)))
        .collect();
    Ok(Solution::new(parsed.objective, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_solution_file() {
        let parsed = parse_solution_file("# objective value 7.5\nx 3\n\ny -1 # note\n").unwrap();
        assert_eq!(parsed.objective, 7.5);
        assert_eq!(parsed.values.get("x"), Some(&3.0));
        assert_eq!(parsed.values.get("y"), Some(&-1.0));
    }

    #[test]
    fn test_parse_solution_file_rejects_garbage() {
        let err = parse_solution_file("x three\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
