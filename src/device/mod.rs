//! Controller session (spec.md §4.4): owns the USB handle, runs the
//! interrupt-IN/control-endpoint loop, and feeds decoded reports to the
//! event mapper.

pub mod command;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use thiserror::Error;

pub use command::{Command, HapticPosition, HapticPulse};

use crate::report::Report;

const VENDOR_ID: u16 = 0x28de;

/// `(product, interface, endpoint, control index)` tuples tried in order
/// (spec.md §4.4, §6), carried over in full from
/// `original_source/src/__init__.py`'s parallel `PRODUCT_ID`/`ENDPOINT`/
/// `CONTROLIDX` arrays plus its `number == i+1` interface convention — five
/// entries, not just the two vendor/product pairs the prose calls out,
/// since two revisions share a product id but differ in interface/endpoint/
/// control index.
const PROBE_TABLE: [(u16, u8, u8, u16); 5] = [
	(0x1102, 1, 3, 2),
	(0x1142, 2, 2, 1),
	(0x1142, 3, 3, 2),
	(0x1142, 4, 4, 3),
	(0x1142, 5, 5, 4),
];

/// Timer rate while input is actively flowing (spec.md §4.4).
const HPERIOD: Duration = Duration::from_millis(20);
/// Timer rate once the controller has been idle (spec.md §4.4).
const LPERIOD: Duration = Duration::from_millis(500);
/// How long since the last real report before the timer falls back to `LPERIOD`.
const IDLE_DURATION: Duration = Duration::from_secs(1);

const CONTROL_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Error, Debug)]
pub enum DeviceError {
	#[error("no Steam Controller found on the USB bus")]
	NotFound,
	#[error("Steam Controller interface is busy (kernel driver or another process)")]
	Busy,
	#[error("USB transport error: {0}")]
	Transport(#[from] rusb::Error),
}

/// What the outer loop's `run()` should do with a tick of the session.
pub enum Event {
	/// A freshly decoded report arrived on the interrupt endpoint.
	Report(Report),
	/// No report arrived before the soft-timer deadline; `Report` is the
	/// last one received, republished so time-dependent effects (trackball
	/// decay) keep progressing (spec.md §4.4's soft timer).
	SoftTimerTick(Report),
}

pub struct ControllerSession {
	handle: rusb::DeviceHandle<rusb::GlobalContext>,
	interface: u8,
	endpoint: u8,
	ccidx: u16,
	commands: VecDeque<Command>,
	last_report: Report,
	last_report_at: Instant,
}

impl ControllerSession {
	/// Probe the whitelist in [`PROBE_TABLE`] and open the first device that
	/// matches, can have its kernel driver detached, and whose HID interface
	/// (class 3, subclass 0, protocol 0) can be claimed exclusively.
	pub fn open() -> Result<Self, DeviceError> {
		let devices = rusb::devices()?;
		let mut busy = false;

		for device in devices.iter() {
			let descriptor = match device.device_descriptor() {
				Ok(d) => d,
				Err(_) => continue,
			};
			if descriptor.vendor_id() != VENDOR_ID {
				continue;
			}
			let Some((_, interface, endpoint, ccidx)) = PROBE_TABLE
				.iter()
				.copied()
				.find(|(product, _, _, _)| *product == descriptor.product_id())
			else {
				continue;
			};

			let mut handle = match device.open() {
				Ok(h) => h,
				Err(_) => {
					busy = true;
					continue;
				},
			};

			if handle.kernel_driver_active(interface).unwrap_or(false)
				&& handle.detach_kernel_driver(interface).is_err()
			{
				busy = true;
				continue;
			}
			if handle.claim_interface(interface).is_err() {
				busy = true;
				continue;
			}

			let mut session = ControllerSession {
				handle,
				interface,
				endpoint: 0x80 | endpoint,
				ccidx,
				commands: VecDeque::new(),
				last_report: Report::default(),
				last_report_at: Instant::now(),
			};
			session.initialize()?;
			return Ok(session);
		}

		if busy {
			Err(DeviceError::Busy)
		} else {
			Err(DeviceError::NotFound)
		}
	}

	fn send_control(&self, payload: &[u8; command::PAYLOAD_LEN]) -> Result<(), DeviceError> {
		self.handle
			.write_control(0x21, 0x09, 0x0300, self.ccidx, payload, CONTROL_TIMEOUT)?;
		Ok(())
	}

	fn initialize(&mut self) -> Result<(), DeviceError> {
		self.send_control(&command::disable_lizard_mode())?;
		self.send_control(&command::disable_haptic_auto_feedback())?;
		Ok(())
	}

	/// Enqueue a command on the pending queue (spec.md §4.4); at most one is
	/// drained per loop iteration.
	pub fn enqueue(&mut self, command: Command) {
		self.commands.push_back(command);
	}

	/// Block for up to one soft-timer period for the next interrupt
	/// transfer, decode it, and drain at most one pending command onto the
	/// control endpoint. Returns `Ok(None)` once the exit sentinel has been
	/// submitted and the loop should terminate.
	pub fn poll(&mut self) -> Result<Option<Event>, DeviceError> {
		let period = if self.last_report_at.elapsed() < IDLE_DURATION {
			HPERIOD
		} else {
			LPERIOD
		};

		let mut buf = [0u8; 64];
		let event = match self.handle.read_interrupt(self.endpoint, &mut buf, period) {
			Ok(len) if len == 64 => match Report::decode(&buf) {
				Ok(report) => {
					self.last_report = report;
					self.last_report_at = Instant::now();
					Event::Report(report)
				},
				// Decode failures can't happen for a 64-byte buffer, but
				// fall back to a timer tick defensively.
				Err(_) => Event::SoftTimerTick(self.last_report),
			},
			// Wrong length: spec.md §4.4 says drop the completion silently.
			Ok(_) => Event::SoftTimerTick(self.last_report),
			Err(rusb::Error::Timeout) => Event::SoftTimerTick(self.last_report),
			Err(other) => return Err(DeviceError::Transport(other)),
		};

		if let Some(command) = self.commands.pop_front() {
			let is_exit = matches!(command, Command::Exit);
			self.send_control(&command.to_payload())?;
			if is_exit {
				return Ok(None);
			}
		}

		Ok(Some(event))
	}
}

impl Drop for ControllerSession {
	fn drop(&mut self) {
		let _ = self.send_control(&command::exit_frame());
		let _ = self.handle.release_interface(self.interface);
		let _ = self.handle.reset();
	}
}
