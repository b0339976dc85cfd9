//! Runner configuration: defaults, optional TOML file, `CI_BENCH_*` environment.
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_BUILD_CMD: &str = "pnpm build";
pub const DEFAULT_OUT_DIR: &str = "packages/qwik/dist";
pub const DEFAULT_ITERATIONS: u64 = 10_000;
pub const DEFAULT_RESULTS_FILE: &str = "benchmark-results.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    pub build_cmd: String,
    pub out_dir: PathBuf,
    pub iterations: u64,
    pub results_file: PathBuf,
    /// Seconds before the build is killed. `None` waits forever.
    pub timeout_secs: Option<f64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            build_cmd: DEFAULT_BUILD_CMD.to_string(),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            iterations: DEFAULT_ITERATIONS,
            results_file: PathBuf::from(DEFAULT_RESULTS_FILE),
            timeout_secs: None,
        }
    }
}

impl RunnerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Overlay any `CI_BENCH_*` variables present in the environment.
    pub fn apply_env(mut self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    fn apply_vars(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(cmd) = get("CI_BENCH_BUILD_CMD") {
            self.build_cmd = cmd;
        }
        if let Some(dir) = get("CI_BENCH_OUT_DIR") {
            self.out_dir = PathBuf::from(dir);
        }
        if let Some(iterations) = get("CI_BENCH_ITERATIONS") {
            self.iterations = iterations
                .parse()
                .map_err(|e| Error::Config(format!("CI_BENCH_ITERATIONS={iterations}: {e}")))?;
        }
        if let Some(file) = get("CI_BENCH_RESULTS_FILE") {
            self.results_file = PathBuf::from(file);
        }
        if let Some(timeout) = get("CI_BENCH_TIMEOUT") {
            self.timeout_secs = Some(
                timeout
                    .parse()
                    .map_err(|e| Error::Config(format!("CI_BENCH_TIMEOUT={timeout}: {e}")))?,
            );
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.build_cmd.trim().is_empty() {
            return Err(Error::Config("build command must not be empty".into()));
        }
        if self.iterations == 0 {
            return Err(Error::Config("iterations must be greater than zero".into()));
        }
        if let Some(secs) = self.timeout_secs {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(Error::Config(format!("timeout must be a positive number of seconds, got {secs}")));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs_f64)
    }
}
