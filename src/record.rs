//! Appending a results file to the history.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::error::Result;
use crate::schema::{BenchmarkHistory, BenchmarkRun, Commit, Extra};
use crate::{git, runner, Tool};

#[derive(Clone, Debug)]
pub struct RecordArgs {
    pub results_file: PathBuf,
    pub history_file: PathBuf,
    pub suite: String,
    pub tool: Tool,
    /// Used for new histories and commit URLs; read from `origin` when absent.
    pub repo_url: Option<String>,
    /// Epoch ms for the run; now when absent.
    pub date: Option<u64>,
    pub repo_dir: PathBuf,
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Read the results, attach `HEAD` metadata and append to the history file.
pub fn record(args: &RecordArgs) -> Result<BenchmarkRun> {
    let repo_url = match &args.repo_url {
        Some(url) => Some(url.clone()),
        None => git::origin_url(&args.repo_dir).ok(),
    };
    let commit = git::head_commit(&args.repo_dir, repo_url.as_deref())?;
    record_with_commit(args, commit, repo_url.as_deref())
}

/// As [`record`], with commit metadata supplied by the caller.
///
/// A commit without a URL gets one from the history's `repoUrl`.
pub fn record_with_commit(args: &RecordArgs, mut commit: Commit, repo_url: Option<&str>) -> Result<BenchmarkRun> {
    let benches = runner::read_results(&args.results_file)?;
    let mut history = BenchmarkHistory::load_or_new(&args.history_file, repo_url)?;

    if commit.url.is_none() && !history.repo_url.is_empty() {
        commit.url = Some(git::commit_url(&history.repo_url, &commit.id));
    }

    let run = BenchmarkRun {
        commit,
        date: args.date.unwrap_or_else(now_millis),
        tool: args.tool.as_str().to_string(),
        benches,
        extra: Extra::new(),
    };
    history.append(&args.suite, run.clone())?;
    history.save(&args.history_file)?;

    info!(
        suite = %args.suite,
        runs = history.runs(&args.suite).len(),
        file = %args.history_file.display(),
        "recorded run"
    );
    Ok(run)
}
