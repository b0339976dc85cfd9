use std::io;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::command;
use crate::error::{Error, Result};
use crate::harness::{bytes_to_kb, measure_fn};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildMeasurement {
    pub duration_seconds: f64,
    pub size_kb: f64,
}

/// Run the build, then size its output directory.
pub fn measure_build(build_cmd: &str, out_dir: &Path, timeout: Option<Duration>) -> Result<BuildMeasurement> {
    let m = measure_fn(|| command::run_shell(build_cmd, timeout));
    let duration_seconds = m.seconds();
    m.value?;
    info!(command = build_cmd, seconds = duration_seconds, "build finished");

    let size_kb = output_size_kb(out_dir)?;
    info!(dir = %out_dir.display(), kb = size_kb, "measured build output");

    Ok(BuildMeasurement {
        duration_seconds,
        size_kb,
    })
}

pub fn output_size_kb(out_dir: &Path) -> Result<f64> {
    Ok(bytes_to_kb(dir_size_bytes(out_dir)?))
}

/// Total size of every regular file below `root`. Symlinks are not followed.
pub fn dir_size_bytes(root: &Path) -> Result<u64> {
    let dir_err = |source: io::Error| Error::OutputDir {
        path: root.to_path_buf(),
        source,
    };

    let meta = std::fs::metadata(root).map_err(dir_err)?;
    if !meta.is_dir() {
        return Err(dir_err(io::Error::new(io::ErrorKind::Other, "not a directory")));
    }

    let mut total: u64 = 0;
    let mut files: u64 = 0;
    for entry in walkdir::WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| dir_err(e.into()))?;
        if entry.file_type().is_file() {
            total += entry.metadata().map_err(|e| dir_err(e.into()))?.len();
            files += 1;
        }
    }
    debug!(dir = %root.display(), files, bytes = total, "walked output directory");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn sums_nested_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.js"), vec![0u8; 1024]).unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        fs::write(dir.path().join("nested/b.js"), vec![0u8; 2048]).unwrap();
        fs::write(dir.path().join("nested/deeper/c.js"), vec![0u8; 3072]).unwrap();

        assert_eq!(dir_size_bytes(dir.path()).unwrap(), 6144);
        assert_eq!(output_size_kb(dir.path()).unwrap(), 6.0);
    }

    #[test]
    fn empty_directory_is_zero() {
        let dir = TempDir::new().unwrap();
        assert_eq!(output_size_kb(dir.path()).unwrap(), 0.0);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = dir_size_bytes(&dir.path().join("dist")).unwrap_err();
        assert!(matches!(err, Error::OutputDir { .. }));
    }

    #[test]
    fn file_instead_of_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("dist");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(dir_size_bytes(&file), Err(Error::OutputDir { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn build_failure_skips_size_measurement() {
        let dir = TempDir::new().unwrap();
        let err = measure_build("exit 1", &dir.path().join("missing"), None).unwrap_err();
        assert!(matches!(err, Error::BuildFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn build_output_is_measured_after_the_build() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist");
        let cmd = format!("mkdir -p '{0}' && head -c 2048 /dev/zero > '{0}/bundle.js'", out.display());
        let m = measure_build(&cmd, &out, None).unwrap();
        assert_eq!(m.size_kb, 2.0);
        assert!(m.duration_seconds >= 0.0);
    }
}
