//! The append-only benchmark history and its on-disk forms.
//!
//! The chart page loads the history as a script that assigns
//! `window.BENCHMARK_DATA`; tooling may also keep it as plain JSON. Files
//! ending in `.js` use the script form, everything else is plain JSON.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::schema::{BenchmarkHistory, BenchmarkRun, Extra};

pub const DEFAULT_SUITE: &str = "Qwik CI Benchmarks";
const SCRIPT_VAR: &str = "window.BENCHMARK_DATA";
const SCRIPT_PREFIX: &str = "window.BENCHMARK_DATA = ";

impl BenchmarkHistory {
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            last_update: 0,
            repo_url: repo_url.into(),
            entries: BTreeMap::new(),
            extra: Extra::new(),
        }
    }

    /// Append `run` to the end of `suite`, creating the suite if needed.
    ///
    /// Runs older than the suite's newest run and runs with repeated
    /// measurement names are rejected; the history is unchanged on error.
    pub fn append(&mut self, suite: &str, run: BenchmarkRun) -> Result<()> {
        let mut seen = HashSet::new();
        for bench in &run.benches {
            if !seen.insert(bench.name.as_str()) {
                return Err(Error::DuplicateMeasurement(bench.name.clone()));
            }
        }
        if let Some(last) = self.latest(suite) {
            if run.date < last.date {
                return Err(Error::OutOfOrder {
                    suite: suite.to_string(),
                    date: run.date,
                    last: last.date,
                });
            }
        }

        self.last_update = self.last_update.max(run.date);
        let runs = self.entries.entry(suite.to_string()).or_default();
        runs.push(run);
        debug!(suite, runs = runs.len(), last_update = self.last_update, "appended run");
        Ok(())
    }

    pub fn runs(&self, suite: &str) -> &[BenchmarkRun] {
        self.entries.get(suite).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn latest(&self, suite: &str) -> Option<&BenchmarkRun> {
        self.runs(suite).last()
    }

    pub fn suites(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse either plain JSON or the `window.BENCHMARK_DATA = ...` script form.
    pub fn from_text(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let body = match trimmed.strip_prefix(SCRIPT_VAR) {
            Some(rest) => {
                let rest = rest.trim_start();
                rest.strip_prefix('=').unwrap_or(rest).trim().trim_end_matches(';')
            }
            None => trimmed,
        };
        Self::from_json(body)
    }

    pub fn to_script(&self) -> Result<String> {
        Ok(format!("{SCRIPT_PREFIX}{}\n", self.to_json_pretty()?))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text)
    }

    /// Load `path`, or start an empty history for `repo_url` if it does not exist yet.
    pub fn load_or_new(path: &Path, repo_url: Option<&str>) -> Result<Self> {
        match fs::metadata(path) {
            Ok(_) => Self::load(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => match repo_url {
                Some(url) => {
                    info!(file = %path.display(), "starting a new history");
                    Ok(Self::new(url))
                }
                None => Err(Error::MissingHistory {
                    path: path.to_path_buf(),
                }),
            },
            Err(source) => Err(Error::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write the history next to `path` and rename it into place.
    ///
    /// Appends are expected to come from a single writer; there is no locking.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = if is_script(path) {
            self.to_script()?
        } else {
            self.to_json_pretty()?
        };

        let write_err = |source: io::Error| Error::Write {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(text.as_bytes()).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

fn is_script(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("js"))
}
