//! Driver-level settings (spec.md §6, supplemented per this crate's
//! ambient-config section): there is no host TOML config here, since the
//! only configuration surface this driver has is the CLI (profile path,
//! device index, verbosity) plus the profile file itself, which is VDF and
//! owned by the `profile`/`vdf` modules.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Valid device indices (spec.md §6): selects which PID file a running
/// instance claims, so up to four controllers can be driven at once.
const MAX_INDEX: u8 = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("device index {0} is out of range (expected 0..={MAX_INDEX})")]
	IndexOutOfRange(u8),
	#[error("failed to expand path {path:?}: {source}")]
	PathExpansion { path: PathBuf, source: shellexpand::LookupError<std::env::VarError> },
}

/// Resolved settings for one driver instance.
#[derive(Debug, Clone)]
pub struct Settings {
	/// Path to the VDF binding profile, already `~`/`$VAR`-expanded.
	pub profile: PathBuf,
	/// Which controller this instance drives; selects the PID file.
	pub index: u8,
	/// Net verbosity delta from repeated `-v`/`-q` flags (spec.md §1.1).
	pub verbosity: i16,
}

impl Settings {
	pub fn new(profile: impl AsRef<Path>, index: u8, verbosity: i16) -> Result<Self, ConfigError> {
		if index > MAX_INDEX {
			return Err(ConfigError::IndexOutOfRange(index));
		}
		let profile = expand_path(profile.as_ref())?;
		Ok(Settings { profile, index, verbosity })
	}

	/// PID file path for this controller index (spec.md §6:
	/// `/tmp/steamcontroller<INDEX>.pid`).
	pub fn pid_path(&self) -> PathBuf {
		PathBuf::from(format!("/tmp/steamcontroller{}.pid", self.index))
	}
}

fn expand_path(path: &Path) -> Result<PathBuf, ConfigError> {
	let raw = path.to_string_lossy();
	let expanded = shellexpand::full(&raw).map_err(|e| ConfigError::PathExpansion {
		path: path.to_path_buf(),
		source: e,
	})?;
	Ok(PathBuf::from(expanded.into_owned()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_an_out_of_range_index() {
		let err = Settings::new("/tmp/profile.vdf", 4, 0).unwrap_err();
		assert!(matches!(err, ConfigError::IndexOutOfRange(4)));
	}

	#[test]
	fn accepts_every_index_in_range() {
		for index in 0..=MAX_INDEX {
			assert!(Settings::new("/tmp/profile.vdf", index, 0).is_ok());
		}
	}

	#[test]
	fn pid_path_embeds_the_index() {
		let settings = Settings::new("/tmp/profile.vdf", 2, 0).unwrap();
		assert_eq!(settings.pid_path(), PathBuf::from("/tmp/steamcontroller2.pid"));
	}

	#[test]
	fn expands_home_relative_profile_paths() {
		std::env::set_var("HOME", "/home/tester");
		let settings = Settings::new("$HOME/profile.vdf", 0, 0).unwrap();
		assert_eq!(settings.profile, PathBuf::from("/home/tester/profile.vdf"));
	}
}
