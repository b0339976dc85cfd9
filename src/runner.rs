//! One measurement pass: build, size, synthetic workload, memory.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::benches;
use crate::config::RunnerConfig;
use crate::error::{Error, Result};
use crate::memory::MemoryProbe;
use crate::schema::{Measurement, BUILD_SIZE, BUILD_TIME, MEMORY_USAGE, RUNTIME_EXECUTION_TIME};

/// Measure everything, in fixed order. Nothing is written to disk.
pub fn collect(cfg: &RunnerConfig, probe: &dyn MemoryProbe) -> Result<Vec<Measurement>> {
    cfg.validate()?;

    let build = benches::measure_build(&cfg.build_cmd, &cfg.out_dir, cfg.timeout())?;
    let runtime_ms = benches::measure_synthetic_workload(cfg.iterations);
    let memory_mb = benches::measure_memory(probe)?;

    Ok(vec![
        Measurement::new(BUILD_TIME, build.duration_seconds, "seconds"),
        Measurement::new(BUILD_SIZE, build.size_kb, "KB"),
        Measurement::new(RUNTIME_EXECUTION_TIME, runtime_ms, "ms"),
        Measurement::new(MEMORY_USAGE, memory_mb, "MB"),
    ])
}

/// Measure, then write the results file. On any failure the file is left untouched.
pub fn run(cfg: &RunnerConfig, probe: &dyn MemoryProbe) -> Result<Vec<Measurement>> {
    let measurements = collect(cfg, probe)?;
    write_results(&cfg.results_file, &measurements)?;
    info!(file = %cfg.results_file.display(), "benchmarks written");
    Ok(measurements)
}

pub fn write_results(path: &Path, measurements: &[Measurement]) -> Result<()> {
    let json = serde_json::to_string_pretty(measurements)?;
    fs::write(path, json).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_results(path: &Path) -> Result<Vec<Measurement>> {
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn results_file_is_pretty_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("benchmark-results.json");
        let ms = vec![
            Measurement::new(BUILD_TIME, 87.35, "seconds"),
            Measurement::new(BUILD_SIZE, 7334.55, "KB"),
        ];
        write_results(&path, &ms).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {\n    \"name\": \"Build Time\""));
        assert!(text.contains("\"value\": \"87.35\""));
        assert_eq!(read_results(&path).unwrap(), ms);
    }

    #[test]
    fn write_overwrites_previous_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.json");
        fs::write(&path, "stale contents that are much longer than the new array").unwrap();
        write_results(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn unwritable_location_is_a_write_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no/such/dir/r.json");
        assert!(matches!(write_results(&path, &[]), Err(Error::Write { .. })));
    }

    #[test]
    fn invalid_config_is_rejected_before_building() {
        let cfg = RunnerConfig {
            iterations: 0,
            ..RunnerConfig::default()
        };
        let probe = crate::memory::FixedMemoryProbe(0);
        assert!(matches!(collect(&cfg, &probe), Err(Error::Config(_))));
    }
}
