// Result cache on a real directory

use std::fs;
use std::io;

use lpkit::domain::model_variables;
use lpkit::infrastructure::content_hash;
use lpkit::{
    maximize, write_lp, Assignment, ConstraintExt, OptimizationType, ResultCache, Solution,
    Variable, VariableSet,
};
use tempfile::TempDir;

fn model() -> (Variable, Variable, VariableSet) {
    let x = Variable::real("x", 0.0, 10.0).unwrap();
    let y = Variable::integer("y", 0.0, 10.0).unwrap();
    let mut set = VariableSet::new();
    set.insert(x.clone()).unwrap();
    set.insert(y.clone()).unwrap();
    (x, y, set)
}

fn solution(objective: f64, x: &Variable, y: &Variable, xv: f64, yv: f64) -> Solution {
    let values: Assignment = [(x.clone(), xv), (y.clone(), yv)].into_iter().collect();
    Solution::new(objective, values)
}

#[test]
fn test_optimal_entry_round_trips() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::new(dir.path());
    let (x, y, vars) = model();
    let key = content_hash("MINIMIZE\n  x + y\n");

    assert!(!cache.has_optimal(&key));
    cache
        .write_optimal(&key, &solution(42.0, &x, &y, 2.5, 0.0), Some("MINIMIZE\n  x + y\n"))
        .unwrap();
    assert!(cache.has_optimal(&key));
    assert!(!cache.has_feasible(&key));

    let read = cache.optimal(&key, &vars).unwrap();
    assert_eq!(read.objective_value, 42.0);
    assert_eq!(read.value(&x), Some(2.5));
    // zeros are not written but read back as zero
    assert_eq!(read.value(&y), Some(0.0));

    let model_file = cache.entry_dir(&key).join("model.lp");
    assert_eq!(fs::read_to_string(model_file).unwrap(), "MINIMIZE\n  x + y\n");
}

#[test]
fn test_feasible_slot_keeps_the_best_objective() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::new(dir.path().join("nested"));
    let (x, y, vars) = model();
    let sense = OptimizationType::Maximize;

    assert!(cache
        .offer_feasible("k", &solution(10.0, &x, &y, 1.0, 1.0), sense, None)
        .unwrap());
    assert!(cache
        .offer_feasible("k", &solution(15.0, &x, &y, 3.0, 2.0), sense, None)
        .unwrap());
    assert!(!cache
        .offer_feasible("k", &solution(5.0, &x, &y, 9.0, 9.0), sense, None)
        .unwrap());
    assert!(!cache
        .offer_feasible("k", &solution(15.0, &x, &y, 4.0, 4.0), sense, None)
        .unwrap());

    let best = cache.feasible("k", &vars).unwrap();
    assert_eq!(best.objective_value, 15.0);
    assert_eq!(best.value(&y), Some(2.0));
}

#[test]
fn test_minimizing_prefers_lower_objectives() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::new(dir.path());
    let (x, y, vars) = model();
    let sense = OptimizationType::Minimize;

    cache
        .offer_feasible("k", &solution(10.0, &x, &y, 1.0, 1.0), sense, None)
        .unwrap();
    assert!(cache
        .offer_feasible("k", &solution(-3.0, &x, &y, 0.5, 0.0), sense, None)
        .unwrap());
    assert_eq!(cache.feasible("k", &vars).unwrap().objective_value, -3.0);
}

#[test]
fn test_corrupt_entry_is_invalid_data() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::new(dir.path());
    let (_, _, vars) = model();

    fs::create_dir_all(cache.entry_dir("bad")).unwrap();
    fs::write(
        cache.entry_dir("bad").join("optimal.sol"),
        "# objective value twelve\nx 1\n",
    )
    .unwrap();

    assert!(cache.has_optimal("bad"));
    let err = cache.optimal("bad", &vars).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn test_keys_follow_model_text() {
    let a = content_hash("MAXIMIZE\n  x\nEND\n");
    let b = content_hash("MAXIMIZE\n  x\nEND\n");
    let c = content_hash("MAXIMIZE\n  y\nEND\n");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 16);
    assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[test]
fn test_key_does_not_depend_on_creation_order() {
    let key = |x: &Variable, y: &Variable| {
        let objective = maximize(x + 2.0 * y);
        let constraints = vec![(y + x).leq(5.0)];
        let variables = model_variables(&objective, &constraints).unwrap();
        content_hash(&write_lp(&objective, &constraints, &variables))
    };

    let x = Variable::real("x", 0.0, 4.0).unwrap();
    let y = Variable::real("y", 0.0, 4.0).unwrap();
    let x_first = key(&x, &y);

    let y = Variable::real("y", 0.0, 4.0).unwrap();
    let x = Variable::real("x", 0.0, 4.0).unwrap();
    assert_eq!(key(&x, &y), x_first);
}
