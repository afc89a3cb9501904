//! Virtual-input sinks (spec.md §4.1): three write-only kernel-facing
//! devices that buffer key/axis/relative events and flush them atomically
//! with `syn()`.

pub mod gamepad;
pub mod keyboard;
pub mod keycode;
pub mod mouse;
pub mod trackball;

pub use gamepad::Gamepad;
pub use keyboard::Keyboard;
pub use mouse::Mouse;

use thiserror::Error;

/// Absolute axes a sink may advertise (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
	X,
	Y,
	RX,
	RY,
	Z,
	RZ,
	Hat0X,
	Hat0Y,
}

/// Relative axes a sink may advertise (spec.md §4.1, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelAxis {
	X,
	Y,
	Wheel,
	HWheel,
}

/// Which of the three sinks a compiled binding targets (spec.md §3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
	Gamepad,
	Keyboard,
	Mouse,
}

#[derive(Error, Debug)]
pub enum SinkError {
	#[error("virtual device construction failed: {0}")]
	Build(String),
	#[error("failed to emit event: {0}")]
	Emit(#[from] std::io::Error),
}

/// Common contract every virtual-input sink implements (spec.md §4.1).
///
/// Events queue in-process; nothing reaches the kernel device until `syn()`
/// is called, at which point everything queued since the previous `syn()`
/// becomes visible to the host atomically.
pub trait Sink {
	fn kind(&self) -> SinkKind;

	/// Queue a key press (`value=1`) or release (`value=0`).
	fn key_event(&mut self, code: u16, value: i32);

	/// Queue an absolute axis write.
	fn axis_event(&mut self, axis: Axis, value: i32);

	/// Queue a relative motion delta.
	fn rel_event(&mut self, axis: RelAxis, delta: i32);

	/// Flush every event queued since the last call, atomically. No-op
	/// (and must emit nothing) if nothing was queued.
	fn syn(&mut self) -> Result<(), SinkError>;

	/// Whether this sink was constructed advertising `code`. Used by the
	/// binding compiler to route each binding to the unique sink that
	/// claimed it (spec.md §4.1's construction contract).
	fn manages_key(&self, code: u16) -> bool;

	/// Whether this sink was constructed advertising `axis`.
	fn manages_axis(&self, axis: Axis) -> bool {
		let _ = axis;
		false
	}

	/// Drive the move-trackball one tick, queuing any resulting relative
	/// motion, and return `(ex, ey, distance)` (spec.md §4.6.3). Only the
	/// mouse sink overrides this; the default is "no trackball here".
	fn move_ball(&mut self, dx: f32, dy: f32, free: bool, dt: f32) -> (i32, i32, f32) {
		let _ = (dx, dy, free, dt);
		(0, 0, 0.0)
	}

	/// Same as [`Sink::move_ball`] but against the scroll channel.
	fn scroll_ball(&mut self, dx: f32, dy: f32, free: bool, dt: f32) -> (i32, i32, f32) {
		let _ = (dx, dy, free, dt);
		(0, 0, 0.0)
	}
}
