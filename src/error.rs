use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to spawn build command `{command}`: {source}")]
    BuildSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("build command `{command}` failed with {status}")]
    BuildFailed { command: String, status: ExitStatus },

    #[error("build command `{command}` timed out after {seconds:.1}s")]
    BuildTimedOut { command: String, seconds: f64 },

    #[error("cannot read output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("memory probe failed: {0}")]
    MemoryProbe(String),

    #[error("git error: {0}")]
    Git(String),

    #[error("run dated {date} is older than the last run ({last}) in suite `{suite}`")]
    OutOfOrder { suite: String, date: u64, last: u64 },

    #[error("measurement `{0}` appears more than once in a run")]
    DuplicateMeasurement(String),

    #[error("history file {} is missing and no repository URL was given", path.display())]
    MissingHistory { path: PathBuf },
}

impl Error {
    /// Process exit code for this failure. A failed build passes its own status through.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::BuildFailed { status, .. } => match status.code() {
                Some(code) if (1..=255).contains(&code) => code as u8,
                _ => 1,
            },
            _ => 1,
        }
    }
}
