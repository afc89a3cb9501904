use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use steamctld::config::Settings;
use steamctld::Error;

#[derive(Parser, Debug)]
#[clap(version)]
struct Args {
	#[clap(subcommand)]
	command: Command,

	/// Path to the VDF binding profile.
	#[clap(long, short, global = true, default_value = "$HOME/.config/steamctld/profile.vdf")]
	config: PathBuf,

	/// Which controller to drive; selects the PID file.
	#[clap(long, short, global = true, default_value_t = 0)]
	index: u8,

	/// Show more log messages.
	#[clap(long, short, global = true, action = clap::ArgAction::Count)]
	verbose: u8,

	/// Show less log messages.
	#[clap(long, short, global = true, action = clap::ArgAction::Count)]
	quiet: u8,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
	/// Fork into the background and start driving the controller.
	Start,
	/// Stop a running daemon.
	Stop,
	/// Stop, then start, a daemon.
	Restart,
	/// Run in the foreground at trace level; never daemonizes.
	Debug,
}

fn main() {
	let args = Args::parse();
	let exit_code = match run(args) {
		Ok(()) => 0,
		Err(e) => {
			tracing::error!("{e}");
			e.exit_code()
		},
	};
	std::process::exit(exit_code);
}

fn run(args: Args) -> Result<(), Error> {
	let verbosity = if args.command == Command::Debug {
		2
	} else {
		i16::from(args.verbose) - i16::from(args.quiet)
	};
	steamctld::logging::init(verbosity);

	let settings =
		Settings::new(&args.config, args.index, verbosity).map_err(|e| Error::Config(e.to_string()))?;

	match args.command {
		Command::Start => start(&settings),
		Command::Stop => {
			steamctld::daemon::stop(&settings.pid_path()).map_err(|e| Error::Daemon(e.to_string()))
		},
		Command::Restart => {
			steamctld::daemon::stop(&settings.pid_path()).map_err(|e| Error::Daemon(e.to_string()))?;
			start(&settings)
		},
		Command::Debug => {
			tracing::info!("running in foreground; profile={:?}", settings.profile);
			let shutdown = install_shutdown_flag()?;
			steamctld::supervise(&settings.profile, move || shutdown.load(Ordering::Relaxed))
		},
	}
}

fn start(settings: &Settings) -> Result<(), Error> {
	steamctld::daemon::daemonize(&settings.pid_path()).map_err(|e| Error::Daemon(e.to_string()))?;
	let shutdown = install_shutdown_flag()?;
	steamctld::supervise(&settings.profile, move || shutdown.load(Ordering::Relaxed))
}

/// Register SIGINT/SIGTERM handlers that flip a shared flag (spec.md §5
/// cancellation), polled by the outer loop once per soft-timer tick.
fn install_shutdown_flag() -> Result<Arc<AtomicBool>, Error> {
	let shutdown = Arc::new(AtomicBool::new(false));
	for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
		signal_hook::flag::register(signal, Arc::clone(&shutdown))
			.map_err(|e| Error::Daemon(format!("failed to register signal handler: {e}")))?;
	}
	Ok(shutdown)
}
