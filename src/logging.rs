//! Logging setup (spec.md ambient stack, §1.1): `tracing` + `tracing-subscriber`
//! in place of the teacher's `log`/`env_logger` pair, with the same
//! verbose/quiet counting scheme as the teacher's CLI.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Map the net verbosity delta (`-v` count minus `-q` count) onto a level,
/// the same five-step ladder the teacher's `main.rs` uses for `log`.
pub fn level_for(verbosity: i16) -> LevelFilter {
	match verbosity {
		..=-2 => LevelFilter::ERROR,
		-1 => LevelFilter::WARN,
		0 => LevelFilter::INFO,
		1 => LevelFilter::DEBUG,
		2.. => LevelFilter::TRACE,
	}
}

/// Install the global subscriber. `RUST_LOG` still overrides the computed
/// level if set, matching the teacher's `parse_default_env()` behavior.
pub fn init(verbosity: i16) {
	let filter = EnvFilter::builder()
		.with_default_directive(level_for(verbosity).into())
		.from_env_lossy();

	tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}
