// Solve orchestration against a recording backend

mod common;

use common::{count, RecordingBackend};
use lpkit::{
    maximize, minimize, Assignment, ConstraintExt, Error, ModelError, SolutionStatus, Solver,
    SolverConfig, Variable,
};
use tempfile::TempDir;

const EXAMPLE_LP: &str = "MAXIMIZE\n x1 + x2\nSUBJECT TO\n x1 + x2 <= 10\nBOUNDS\n x1 <= 5\nEND\n";

fn variables() -> (Variable, Variable) {
    (
        Variable::real("x", 0.0, 10.0).unwrap(),
        Variable::integer("y", 0.0, 10.0).unwrap(),
    )
}

fn model(solver: &mut Solver, x: &Variable, y: &Variable) {
    solver.set_objective(maximize(x + 2.0 * y)).unwrap();
    solver.add_constraint((x + y).leq(8.0)).unwrap();
}

fn operations(log: &common::CallLog) -> Vec<String> {
    log.lock()
        .iter()
        .map(|c| c.split_whitespace().next().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_solve_runs_prepare_construct_solve_in_order() {
    let (x, y) = variables();
    let (backend, log) = RecordingBackend::new(SolutionStatus::Optimal, 16.0);
    let mut solver = Solver::new(Box::new(backend.with_value("x", 0.0).with_value("y", 8.0)));
    model(&mut solver, &x, &y);

    assert_eq!(solver.status(), SolutionStatus::NotSolved);
    assert_eq!(solver.solve().unwrap(), SolutionStatus::Optimal);
    assert_eq!(
        operations(&log),
        vec![
            "reset",
            "set_console_output",
            "presolve",
            "add_variable",
            "add_variable",
            "set_objective",
            "add_constraint",
            "solve",
        ]
    );
    assert_eq!(solver.status(), SolutionStatus::Optimal);
    assert_eq!(solver.result().objective_value, 16.0);
    assert_eq!(solver.result().value(&y), Some(8.0));
}

#[test]
fn test_unchanged_model_is_already_solved() {
    let (x, y) = variables();
    let (backend, log) = RecordingBackend::new(SolutionStatus::Optimal, 1.0);
    let mut solver = Solver::new(Box::new(backend));
    model(&mut solver, &x, &y);

    solver.solve().unwrap();
    assert_eq!(solver.solve().unwrap(), SolutionStatus::AlreadySolved);
    assert_eq!(count(&log, "solve"), 1);
    assert_eq!(solver.status(), SolutionStatus::Optimal);

    solver.add_constraint(x.geq(1.0)).unwrap();
    assert_eq!(solver.solve().unwrap(), SolutionStatus::Optimal);
    assert_eq!(count(&log, "solve"), 2);

    solver.config_mut().quiet = true;
    solver.solve().unwrap();
    assert_eq!(count(&log, "solve"), 3);
}

#[test]
fn test_integral_values_are_rounded() {
    let (x, y) = variables();
    let (backend, _log) = RecordingBackend::new(SolutionStatus::Optimal, 7.25);
    let backend = backend.with_value("x", 1.25).with_value("y", 2.9999999);
    let mut solver = Solver::new(Box::new(backend));
    model(&mut solver, &x, &y);

    solver.solve().unwrap();
    assert_eq!(solver.result().value(&x), Some(1.25));
    assert_eq!(solver.result().value(&y), Some(3.0));
}

#[test]
fn test_knobs_are_pushed_before_construction() {
    let (x, y) = variables();
    let (backend, log) = RecordingBackend::new(SolutionStatus::Optimal, 0.0);
    let config = SolverConfig {
        quiet: true,
        time_limit: Some(30.0),
        threads: 4,
        presolve: false,
        ..SolverConfig::default()
    };
    let mut solver = Solver::with_config(Box::new(backend), config).unwrap();
    model(&mut solver, &x, &y);
    solver.solve().unwrap();

    let calls = log.lock().clone();
    assert_eq!(
        &calls[..5],
        &[
            "reset",
            "set_threads 4",
            "set_console_output false",
            "set_timeout 30",
            "presolve false",
        ]
    );
}

#[test]
fn test_invalid_knobs_are_rejected() {
    let (backend, _log) = RecordingBackend::new(SolutionStatus::Optimal, 0.0);
    let mut solver = Solver::new(Box::new(backend));

    assert!(matches!(
        solver.set_relative_mip_gap(-0.5),
        Err(ModelError::InvalidParameter { parameter: "relative_mip_gap", .. })
    ));
    assert!(solver.set_absolute_mip_gap(f64::NAN).is_err());
    solver.set_relative_mip_gap(0.01).unwrap();
    assert_eq!(solver.config().relative_mip_gap, Some(0.01));
    solver.reset_mip_gap();
    assert_eq!(solver.config().relative_mip_gap, None);

    let (backend, _log) = RecordingBackend::new(SolutionStatus::Optimal, 0.0);
    let config = SolverConfig {
        time_limit: Some(0.0),
        ..SolverConfig::default()
    };
    assert!(Solver::with_config(Box::new(backend), config).is_err());
}

#[test]
fn test_warm_start_values_reach_the_backend() {
    let x = Variable::real("x", 0.0, 10.0).unwrap().with_start(2.0).unwrap();
    let y = Variable::integer("y", 0.0, 10.0).unwrap().with_start(1.0).unwrap();
    let (backend, log) = RecordingBackend::new(SolutionStatus::Optimal, 0.0);
    let config = SolverConfig {
        warm_start: true,
        ..SolverConfig::default()
    };
    let mut solver = Solver::with_config(Box::new(backend), config).unwrap();
    model(&mut solver, &x, &y);

    let explicit: Assignment = [(y.clone(), 3.0)].into_iter().collect();
    solver.set_start_values(explicit).unwrap();
    solver.solve().unwrap();

    assert!(log
        .lock()
        .contains(&"set_start_values x=2,y=3".to_string()));
}

#[test]
fn test_start_values_are_ignored_without_warm_start() {
    let x = Variable::real("x", 0.0, 10.0).unwrap().with_start(2.0).unwrap();
    let (_, y) = variables();
    let (backend, log) = RecordingBackend::new(SolutionStatus::Optimal, 0.0);
    let mut solver = Solver::new(Box::new(backend));
    model(&mut solver, &x, &y);

    solver.solve().unwrap();
    assert_eq!(count(&log, "set_start_values"), 0);
}

#[test]
fn test_start_value_outside_domain_fails_before_the_backend() {
    let (x, y) = variables();
    let (backend, log) = RecordingBackend::new(SolutionStatus::Optimal, 0.0);
    let config = SolverConfig {
        warm_start: true,
        ..SolverConfig::default()
    };
    let mut solver = Solver::with_config(Box::new(backend), config).unwrap();
    model(&mut solver, &x, &y);

    let fractional: Assignment = [(y.clone(), 1.5)].into_iter().collect();
    assert!(matches!(
        solver.set_start_values(fractional),
        Err(ModelError::StartValueOutOfDomain { .. })
    ));

    assert!(matches!(
        x.set_start(Some(20.0)),
        Err(ModelError::StartValueOutOfDomain { .. })
    ));

    // the domain can still shrink under an attached start value
    x.set_start(Some(8.0)).unwrap();
    x.set_upper_bound_unchecked(5.0);
    let err = solver.solve().unwrap_err();
    assert!(matches!(
        err,
        Error::Model(ModelError::StartValueOutOfDomain { ref name, value }) if name == "x" && value == 8.0
    ));
    assert!(log.lock().is_empty());
}

#[test]
fn test_backend_failure_leaves_model_dirty() {
    let (x, y) = variables();
    let (backend, log) = RecordingBackend::new(SolutionStatus::Optimal, 0.0);
    let mut solver = Solver::new(Box::new(backend.failing()));
    model(&mut solver, &x, &y);

    assert!(matches!(solver.solve(), Err(Error::Backend(_))));
    assert_eq!(solver.status(), SolutionStatus::NotSolved);
    assert!(matches!(solver.solve(), Err(Error::Backend(_))));
    assert_eq!(count(&log, "solve"), 2);
}

#[test]
fn test_name_collisions_are_rejected_eagerly() {
    let (x, y) = variables();
    let (backend, _log) = RecordingBackend::new(SolutionStatus::Optimal, 0.0);
    let mut solver = Solver::new(Box::new(backend));
    model(&mut solver, &x, &y);

    let other_x = Variable::free_real("x");
    assert_eq!(
        solver.add_constraint(other_x.leq(1.0)).unwrap_err(),
        ModelError::NameCollision("x".into())
    );
    assert_eq!(solver.constraints().len(), 1);
    assert!(solver.set_objective(minimize(&other_x)).is_err());
}

#[test]
fn test_optimal_result_is_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let config = SolverConfig {
        cache_dir: Some(dir.path().to_path_buf()),
        ..SolverConfig::default()
    };

    let (x, y) = variables();
    let (backend, first_log) = RecordingBackend::new(SolutionStatus::Optimal, 16.0);
    let mut first = Solver::with_config(Box::new(backend.with_value("y", 8.0)), config.clone()).unwrap();
    model(&mut first, &x, &y);
    assert_eq!(first.solve().unwrap(), SolutionStatus::Optimal);
    assert_eq!(count(&first_log, "solve"), 1);

    // same model text, fresh variables and backend
    let (x, y) = variables();
    let (backend, second_log) = RecordingBackend::new(SolutionStatus::Infeasible, 0.0);
    let mut second = Solver::with_config(Box::new(backend), config).unwrap();
    model(&mut second, &x, &y);
    assert_eq!(second.solve().unwrap(), SolutionStatus::Optimal);
    assert!(second_log.lock().is_empty());
    assert_eq!(second.result().objective_value, 16.0);
    assert_eq!(second.result().value(&y), Some(8.0));
    assert_eq!(second.result().value(&x), Some(0.0));
}

#[test]
fn test_timeout_falls_back_to_cached_feasible() {
    let dir = TempDir::new().unwrap();
    let config = SolverConfig {
        cache_dir: Some(dir.path().to_path_buf()),
        ..SolverConfig::default()
    };

    let (x, y) = variables();
    let (backend, _log) = RecordingBackend::new(SolutionStatus::Feasible, 7.0);
    let mut first = Solver::with_config(Box::new(backend.with_value("x", 7.0)), config.clone()).unwrap();
    model(&mut first, &x, &y);
    assert_eq!(first.solve().unwrap(), SolutionStatus::Feasible);

    let (x, y) = variables();
    let (backend, log) = RecordingBackend::new(SolutionStatus::TimeoutInfeasible, 0.0);
    let mut second = Solver::with_config(Box::new(backend), config).unwrap();
    model(&mut second, &x, &y);
    assert_eq!(second.solve().unwrap(), SolutionStatus::TimeoutFeasible);
    assert_eq!(count(&log, "solve"), 1);
    assert_eq!(second.result().objective_value, 7.0);
    assert_eq!(second.result().value(&x), Some(7.0));
}

#[test]
fn test_load_lp_replaces_the_model() {
    let (backend, log) = RecordingBackend::new(SolutionStatus::Optimal, 0.0);
    let mut solver = Solver::new(Box::new(backend));
    let (x, y) = variables();
    model(&mut solver, &x, &y);

    let errors = solver
        .load_lp_str(EXAMPLE_LP)
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(solver.constraints().len(), 1);
    assert_eq!(
        solver.show_lp().unwrap(),
        "MAXIMIZE\n  x1 + x2\nSUBJECT TO\n  x1 + x2 <= 10\nBOUNDS\n  x1 <= 5\nBINARY\nGENERAL\nEND\n"
    );

    solver.solve().unwrap();
    assert!(log.lock().contains(&"add_variable x1".to_string()));
    assert!(!log.lock().contains(&"add_variable x".to_string()));
}

#[test]
fn test_reset_clears_model_and_result() {
    let (x, y) = variables();
    let (backend, _log) = RecordingBackend::new(SolutionStatus::Optimal, 3.0);
    let mut solver = Solver::new(Box::new(backend));
    model(&mut solver, &x, &y);
    solver.solve().unwrap();

    solver.reset();
    assert_eq!(solver.status(), SolutionStatus::NotSolved);
    assert!(solver.constraints().is_empty());
    assert!(solver.result().is_empty());
    assert!(solver.variables().unwrap().is_empty());
}

#[test]
fn test_feasible_cache_only_improves_through_solve() {
    let dir = TempDir::new().unwrap();
    let config = SolverConfig {
        cache_dir: Some(dir.path().to_path_buf()),
        ..SolverConfig::default()
    };
    let run = |status: SolutionStatus, objective: f64| {
        let (x, y) = variables();
        let (backend, _log) = RecordingBackend::new(status, objective);
        let mut solver =
            Solver::with_config(Box::new(backend.with_value("x", 1.0)), config.clone()).unwrap();
        model(&mut solver, &x, &y);
        let status = solver.solve().unwrap();
        (status, solver.result().objective_value)
    };

    assert_eq!(run(SolutionStatus::Feasible, 10.0), (SolutionStatus::Feasible, 10.0));
    assert_eq!(run(SolutionStatus::Feasible, 15.0), (SolutionStatus::Feasible, 15.0));
    // worse for a maximization, the stored entry stays
    assert_eq!(run(SolutionStatus::Feasible, 5.0), (SolutionStatus::Feasible, 5.0));

    assert_eq!(
        run(SolutionStatus::TimeoutInfeasible, 0.0),
        (SolutionStatus::TimeoutFeasible, 15.0)
    );
}

#[test]
fn test_load_lp_drops_explicit_start_values() {
    let (x, y) = variables();
    let (backend, log) = RecordingBackend::new(SolutionStatus::Optimal, 0.0);
    let config = SolverConfig {
        warm_start: true,
        ..SolverConfig::default()
    };
    let mut solver = Solver::with_config(Box::new(backend), config).unwrap();
    model(&mut solver, &x, &y);
    let explicit: Assignment = [(x.clone(), 3.0)].into_iter().collect();
    solver.set_start_values(explicit).unwrap();
    assert_eq!(solver.start_values().len(), 1);

    solver.load_lp_str(EXAMPLE_LP).unwrap();
    assert!(solver.start_values().is_empty());

    solver.solve().unwrap();
    assert_eq!(count(&log, "set_start_values"), 0);
}
