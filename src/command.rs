//! Running the build command as a child process.

use std::io;
use std::process::{Child, Command, ExitStatus};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Wrap `command_line` in the platform shell. The child inherits stdio.
///
/// With `own_group` the child leads a new process group on unix, so a
/// timeout can take down everything the build started.
pub fn shell_command(command_line: &str, own_group: bool) -> Command {
    #[cfg(windows)]
    let mut cmd = {
        let mut c = Command::new("cmd");
        c.args(["/C", command_line]);
        c
    };
    #[cfg(not(windows))]
    let mut cmd = {
        let mut c = Command::new("sh");
        c.args(["-c", command_line]);
        c
    };

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        if own_group {
            cmd.process_group(0);
        }
    }
    #[cfg(not(unix))]
    let _ = own_group;

    cmd
}

/// Run `command_line` to completion. With a timeout, the child (and its
/// process group on unix) is killed once the deadline passes.
pub fn run_shell(command_line: &str, timeout: Option<Duration>) -> Result<()> {
    debug!(command = command_line, ?timeout, "spawning build command");
    let mut child = shell_command(command_line, timeout.is_some())
        .spawn()
        .map_err(|source| spawn_error(command_line, source))?;

    let status = match timeout {
        None => child.wait().map_err(|source| spawn_error(command_line, source))?,
        Some(limit) => wait_with_deadline(child, command_line, limit)?,
    };

    if status.success() {
        Ok(())
    } else {
        Err(Error::BuildFailed {
            command: command_line.to_string(),
            status,
        })
    }
}

fn spawn_error(command_line: &str, source: io::Error) -> Error {
    Error::BuildSpawn {
        command: command_line.to_string(),
        source,
    }
}

/// Block on the child from a waiter thread so the exit is seen as soon as it
/// happens; the calling thread only wakes for the exit or the deadline.
fn wait_with_deadline(mut child: Child, command_line: &str, limit: Duration) -> Result<ExitStatus> {
    let pid = child.id();
    let (tx, rx) = mpsc::channel();
    let waiter = thread::spawn(move || {
        let _ = tx.send(child.wait());
    });

    match rx.recv_timeout(limit) {
        Ok(status) => {
            let _ = waiter.join();
            status.map_err(|source| spawn_error(command_line, source))
        }
        Err(RecvTimeoutError::Timeout) => {
            warn!(command = command_line, seconds = limit.as_secs_f64(), "build timed out, killing");
            kill_tree(pid);
            // The waiter reaps the child once the kill lands.
            let _ = rx.recv();
            let _ = waiter.join();
            Err(Error::BuildTimedOut {
                command: command_line.to_string(),
                seconds: limit.as_secs_f64(),
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(spawn_error(
            command_line,
            io::Error::new(io::ErrorKind::Other, "build waiter exited without a status"),
        )),
    }
}

#[cfg(unix)]
fn kill_tree(pid: u32) {
    use nix::sys::signal::{kill, killpg, Signal};
    use nix::unistd::Pid;

    // The child leads its own group, so its pid is the group id.
    let pid = Pid::from_raw(pid as i32);
    if let Err(e) = killpg(pid, Signal::SIGKILL) {
        debug!(error = %e, "killpg failed, signalling the shell only");
        let _ = kill(pid, Signal::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_tree(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .status();
}
