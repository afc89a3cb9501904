//! Process lifecycle (spec.md §6 `start`/`stop`/`restart`/`debug`),
//! grounded on `original_source/src/daemon.py`'s generic double-fork daemon
//! base class, rebuilt on top of the `daemonize` and `nix` crates instead of
//! hand-rolled `fork()`/`setsid()` calls.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use daemonize::Daemonize;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
	#[error("failed to daemonize: {0}")]
	Fork(#[from] daemonize::Error),
	#[error("failed to read PID file {0:?}: {1}")]
	ReadPidFile(PathBuf, std::io::Error),
	#[error("PID file {0:?} does not contain a valid process id")]
	MalformedPidFile(PathBuf),
	#[error("failed to signal process {0}: {1}")]
	Signal(i32, nix::Error),
}

/// How long `stop` polls for the process to actually exit before giving up
/// and reporting success anyway (the teacher's Python base class polls
/// forever; this bounds it instead, matching spec.md §5's "no suspension
/// point may be unbounded" guidance for anything outside the hot path too).
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);
const STOP_POLL_ATTEMPTS: u32 = 50;

/// Fork into the background (spec.md §6 `start`): double-fork, `setsid`,
/// `chdir("/")`, redirect stdio to `/dev/null`, and write `pid_file`.
///
/// Must be called before any threads are spawned and before the USB handle
/// or virtual-input devices are opened, since forking after acquiring
/// kernel resources would hand the child stale file descriptors.
pub fn daemonize(pid_file: &Path) -> Result<(), DaemonError> {
	Daemonize::new()
		.pid_file(pid_file)
		.chown_pid_file(true)
		.working_directory("/")
		.start()?;
	Ok(())
}

/// Send SIGTERM to the process named in `pid_file` and wait for it to exit
/// (spec.md §6 `stop`). Not an error if no PID file exists — matching the
/// teacher's Python base class, stopping an already-stopped daemon is a
/// no-op rather than a failure, since `restart` relies on that.
pub fn stop(pid_file: &Path) -> Result<(), DaemonError> {
	let pid = match read_pid(pid_file) {
		Ok(pid) => pid,
		Err(DaemonError::ReadPidFile(_, _)) => return Ok(()),
		Err(e) => return Err(e),
	};

	let target = Pid::from_raw(pid);
	for _ in 0..STOP_POLL_ATTEMPTS {
		match signal::kill(target, Signal::SIGTERM) {
			Ok(()) => std::thread::sleep(STOP_POLL_INTERVAL),
			Err(nix::Error::ESRCH) => {
				let _ = fs::remove_file(pid_file);
				return Ok(());
			},
			Err(e) => return Err(DaemonError::Signal(pid, e)),
		}
	}
	Ok(())
}

fn read_pid(pid_file: &Path) -> Result<i32, DaemonError> {
	let text =
		fs::read_to_string(pid_file).map_err(|e| DaemonError::ReadPidFile(pid_file.to_path_buf(), e))?;
	text.trim()
		.parse()
		.map_err(|_| DaemonError::MalformedPidFile(pid_file.to_path_buf()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn stop_on_a_missing_pid_file_is_a_no_op() {
		let missing = PathBuf::from("/tmp/steamctld-test-missing-pidfile-does-not-exist.pid");
		assert!(stop(&missing).is_ok());
	}

	#[test]
	fn read_pid_rejects_malformed_content() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "not-a-pid").unwrap();
		let err = read_pid(file.path()).unwrap_err();
		assert!(matches!(err, DaemonError::MalformedPidFile(_)));
	}

	#[test]
	fn read_pid_parses_a_well_formed_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "4242\n").unwrap();
		assert_eq!(read_pid(file.path()).unwrap(), 4242);
	}
}
