use anyhow::Context;
use ci_bench::config::RunnerConfig;
use ci_bench::history::DEFAULT_SUITE;
use ci_bench::memory::ProcessMemoryProbe;
use ci_bench::record::{self, RecordArgs};
use ci_bench::schema::BenchmarkHistory;
use ci_bench::{runner, Tool};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(ClapArgs, Debug, Default)]
struct RunArgs {
    /// Shell command that builds the project.
    #[arg(long, value_name = "CMD")]
    build_cmd: Option<String>,

    /// Directory whose total file size is reported as Build Size.
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Iterations of the synthetic allocation workload.
    #[arg(long, value_name = "N")]
    iterations: Option<u64>,

    /// Where to write the JSON measurement list (overwritten).
    #[arg(long, value_name = "FILE")]
    results_file: Option<PathBuf>,

    /// Kill the build after this many seconds. Waits forever when omitted.
    #[arg(long, value_name = "SECS")]
    timeout: Option<f64>,

    /// TOML file with runner settings; flags take precedence.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append a results file to the benchmark history, tagged with HEAD's commit metadata.
    Record {
        #[arg(long, value_name = "FILE", default_value = "benchmark-results.json")]
        results_file: PathBuf,

        /// History file; `.js` files use the `window.BENCHMARK_DATA = ...` form.
        #[arg(long, value_name = "FILE")]
        history: PathBuf,

        #[arg(long, default_value = DEFAULT_SUITE)]
        suite: String,

        #[arg(long, value_enum, default_value_t = Tool::CustomSmallerIsBetter)]
        tool: Tool,

        /// Repository URL; defaults to the `origin` remote.
        #[arg(long, value_name = "URL")]
        repo_url: Option<String>,

        /// Run date in epoch milliseconds; defaults to now.
        #[arg(long, value_name = "MS")]
        date: Option<u64>,

        /// Git checkout to read commit metadata from.
        #[arg(long, value_name = "DIR", default_value = ".")]
        repo: PathBuf,
    },

    /// Print the latest values of each suite in a history file.
    Show {
        #[arg(long, value_name = "FILE")]
        history: PathBuf,

        /// Only this suite.
        #[arg(long)]
        suite: Option<String>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "ci-bench", version)]
#[command(about = "CI benchmark runner and history recorder (JSON output)")]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    /// Debug logging (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    cmd: Option<Command>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "ci_bench=debug" } else { "ci_bench=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn runner_config(args: RunArgs) -> anyhow::Result<RunnerConfig> {
    let base = match &args.config {
        Some(path) => RunnerConfig::load_from_file(path)
            .with_context(|| format!("loading runner config {}", path.display()))?,
        None => RunnerConfig::default(),
    };
    let mut cfg = base.apply_env()?;

    if let Some(cmd) = args.build_cmd {
        cfg.build_cmd = cmd;
    }
    if let Some(dir) = args.out_dir {
        cfg.out_dir = dir;
    }
    if let Some(n) = args.iterations {
        cfg.iterations = n;
    }
    if let Some(file) = args.results_file {
        cfg.results_file = file;
    }
    if args.timeout.is_some() {
        cfg.timeout_secs = args.timeout;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn show(history: &BenchmarkHistory, only: Option<&str>) {
    println!("{} (last update {})", history.repo_url, history.last_update);
    for suite in history.suites().filter(|s| only.map_or(true, |o| o == *s)) {
        let runs = history.runs(suite);
        println!("\n{suite}: {} run(s)", runs.len());
        if let Some(last) = runs.last() {
            let short: String = last.commit.id.chars().take(12).collect();
            println!("  latest {short} at {}", last.date);
            for b in &last.benches {
                println!("  {:<24} {:>12} {}", b.name, b.value.to_string(), b.unit);
            }
        }
    }
}

fn execute(args: Args) -> anyhow::Result<()> {
    match args.cmd {
        None => {
            let cfg = runner_config(args.run)?;
            runner::run(&cfg, &ProcessMemoryProbe)?;
        }
        Some(Command::Record {
            results_file,
            history,
            suite,
            tool,
            repo_url,
            date,
            repo,
        }) => {
            let rec = RecordArgs {
                results_file,
                history_file: history,
                suite,
                tool,
                repo_url,
                date,
                repo_dir: repo,
            };
            record::record(&rec)?;
        }
        Some(Command::Show { history, suite }) => {
            let h = BenchmarkHistory::load(&history)?;
            show(&h, suite.as_deref());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            let code = err
                .downcast_ref::<ci_bench::Error>()
                .map(ci_bench::Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
