//! Userland driver for the Valve Steam Controller: decodes USB HID reports
//! from a [`device::ControllerSession`], runs them through an
//! [`mapper::EventMapper`] compiled from a VDF binding profile, and emits
//! synthetic gamepad/keyboard/mouse events through the [`sink`] layer.

pub mod config;
pub mod daemon;
pub mod device;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod profile;
pub mod report;
pub mod sink;
pub mod vdf;

use std::fs;
use std::thread;
use std::time::Duration;

pub use error::Error;

use device::{ControllerSession, Event};
use mapper::EventMapper;
use sink::{Gamepad, Keyboard, Mouse, Sink};

/// How long the outer supervisor waits before retrying device discovery
/// after a `NotFound`/`Busy` probe failure (spec.md §7).
const PROBE_RETRY: Duration = Duration::from_secs(2);

/// Load, parse and compile the binding profile at `path` (spec.md §4.5,
/// §6): read the VDF text, parse it into a [`vdf::Node`] tree, compile that
/// into a [`profile::BindingTables`], and validate every binding resolves to
/// a sink that advertises it. Compilation is all-or-nothing (spec.md §7) —
/// no partial profile is ever applied.
pub fn load_profile(path: &std::path::Path) -> Result<profile::BindingTables, Error> {
	let text = fs::read_to_string(path).map_err(Error::Io)?;
	let root = vdf::parse(&text)?;
	let tables = profile::compile(&root)?;
	profile::validate_bindings(&tables)?;
	Ok(tables)
}

/// Construct the three virtual-input sinks, boxed uniformly so the mapper
/// never depends on their concrete types (spec.md §4.1).
fn open_sinks() -> Result<(Box<dyn Sink>, Box<dyn Sink>, Box<dyn Sink>), Error> {
	let gamepad = Gamepad::new()?;
	let keyboard = Keyboard::new()?;
	let mouse = Mouse::new()?;
	Ok((Box::new(gamepad), Box::new(keyboard), Box::new(mouse)))
}

/// Run one controller session to completion: open the device, build the
/// mapper, and pump events until the mapper requests an exit (STEAM
/// long-press or the process's own shutdown signal) or the session's
/// transport fails (spec.md §5).
///
/// `should_exit` is polled once per soft-timer tick; returning `true` makes
/// this function enqueue the exit command on the session exactly as the
/// STEAM long-press gesture would, so SIGINT/SIGTERM and the in-band
/// gesture share one shutdown path.
pub fn run_session(tables: profile::BindingTables, mut should_exit: impl FnMut() -> bool) -> Result<(), Error> {
	let (gamepad, keyboard, mouse) = open_sinks()?;
	let mut mapper = EventMapper::new(tables, gamepad, keyboard, mouse);
	let mut session = ControllerSession::open()?;

	loop {
		if !mapper.exit_requested() && should_exit() {
			session.enqueue(device::Command::Exit);
		}
		match session.poll()? {
			Some(Event::Report(report)) | Some(Event::SoftTimerTick(report)) => {
				mapper.process(&mut session, report);
			},
			None => break,
		}
	}

	Ok(())
}

/// Supervisor loop (spec.md §7 `RuntimeTransport`): keep reconnecting after
/// a probe failure or a runtime transport error, retrying every
/// [`PROBE_RETRY`], until `should_exit` reports true between attempts.
pub fn supervise(profile_path: &std::path::Path, mut should_exit: impl FnMut() -> bool) -> Result<(), Error> {
	let tables = load_profile(profile_path)?;
	loop {
		match run_session(tables.clone(), &mut should_exit) {
			Ok(()) => return Ok(()),
			Err(Error::Device(
				device::DeviceError::NotFound | device::DeviceError::Busy | device::DeviceError::Transport(_),
			)) if !should_exit() => {
				tracing::warn!("controller session ended, retrying in {:?}", PROBE_RETRY);
				thread::sleep(PROBE_RETRY);
			},
			Err(e) => return Err(e),
		}
		if should_exit() {
			return Ok(());
		}
	}
}
