use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lpkit::infrastructure::logging;
use lpkit::{LoaderConfig, SolutionStatus, Solver, SolverConfig, SolverFactory};

/// lpkit - solve an LP file with a runtime-selected backend.
#[derive(Parser, Debug)]
#[command(name = "lpkit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Backend to try, in order; may be repeated
    #[arg(short = 's', long = "solver", value_name = "NAME")]
    solvers: Vec<String>,

    /// Solver configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Result cache directory
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Hide the backend's console output
    #[arg(short, long)]
    quiet: bool,

    /// Directory holding backend plugin libraries
    #[arg(long, value_name = "DIR")]
    plugin_dir: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// LP file to solve
    input: PathBuf,

    /// Where to write the solution vector; `--` or nothing for stdout
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::from(255);
        }
        Err(e) => {
            // --help and --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    logging::init(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> lpkit::Result<()> {
    let mut config = match &cli.config {
        Some(path) => SolverConfig::from_toml_file(path)?,
        None => SolverConfig::default(),
    };
    if cli.quiet {
        config.quiet = true;
    }
    if cli.cache_dir.is_some() {
        config.cache_dir = cli.cache_dir.clone();
    }

    let mut loader = LoaderConfig::from_env(cli.solvers.iter().cloned());
    loader.search_dir = cli.plugin_dir.clone();

    let backend = SolverFactory::create(&loader)?;
    let mut solver = Solver::with_config(backend, config)?;
    println!("{}", solver.backend_name());

    for error in solver.load_lp(&cli.input)? {
        eprintln!("{}:{error}", cli.input.display());
    }

    let status = solver.solve()?;
    println!("The result is {status}");

    if has_incumbent(status) {
        let result = solver.result();
        match cli.output.as_deref() {
            Some(path) if path.as_os_str() != "--" => result.write_solution_vector(path, false)?,
            _ => print!("{}", result.show_solution_vector(false)),
        }
    }
    Ok(())
}

/// Statuses that come with a usable solution vector.
fn has_incumbent(status: SolutionStatus) -> bool {
    matches!(
        status,
        SolutionStatus::Optimal | SolutionStatus::Feasible | SolutionStatus::TimeoutFeasible
    )
}
