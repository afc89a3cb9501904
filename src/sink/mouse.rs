//! Virtual mouse sink (spec.md §4.1, §4.2, §6): relative X/Y, wheel/hwheel,
//! and the standard mouse buttons, with a [`Trackball`] behind the move and
//! scroll channels so released pad flicks glide to rest.

use evdev::{
	uinput::{VirtualDevice, VirtualDeviceBuilder},
	AttributeSet, Key, RelativeAxisType,
};

use super::trackball::Trackball;
use super::{Axis, RelAxis, Sink, SinkError, SinkKind};

const BUTTONS: [Key; 5] = [
	Key::BTN_LEFT,
	Key::BTN_RIGHT,
	Key::BTN_MIDDLE,
	Key::BTN_SIDE,
	Key::BTN_EXTRA,
];

fn rel_type(axis: RelAxis) -> RelativeAxisType {
	match axis {
		RelAxis::X => RelativeAxisType::REL_X,
		RelAxis::Y => RelativeAxisType::REL_Y,
		RelAxis::Wheel => RelativeAxisType::REL_WHEEL_HI_RES,
		RelAxis::HWheel => RelativeAxisType::REL_HWHEEL_HI_RES,
	}
}

pub struct Mouse {
	device: VirtualDevice,
	pending: Vec<evdev::InputEvent>,
	pub move_ball: Trackball,
	pub scroll_ball: Trackball,
}

impl Mouse {
	pub fn new() -> Result<Self, SinkError> {
		let device = VirtualDeviceBuilder::new()
			.map_err(|e| SinkError::Build(e.to_string()))?
			.name("steamctld Mouse")
			.with_relative_axes(&AttributeSet::from_iter([
				RelativeAxisType::REL_X,
				RelativeAxisType::REL_Y,
				RelativeAxisType::REL_WHEEL_HI_RES,
				RelativeAxisType::REL_HWHEEL_HI_RES,
			]))
			.map_err(|e| SinkError::Build(e.to_string()))?
			.with_keys(&AttributeSet::from_iter(BUTTONS))
			.map_err(|e| SinkError::Build(e.to_string()))?
			.build()
			.map_err(|e| SinkError::Build(e.to_string()))?;

		Ok(Self {
			device,
			pending: Vec::new(),
			move_ball: Trackball::for_mouse(),
			scroll_ball: Trackball::for_scroll(),
		})
	}
}

impl Sink for Mouse {
	fn kind(&self) -> SinkKind {
		SinkKind::Mouse
	}

	fn key_event(&mut self, code: u16, value: i32) {
		self.pending
			.push(evdev::InputEvent::new_now(evdev::EventType::KEY, code, value));
	}

	fn axis_event(&mut self, _axis: Axis, _value: i32) {
		// The mouse sink advertises no absolute axes.
	}

	fn rel_event(&mut self, axis: RelAxis, delta: i32) {
		if delta == 0 {
			return;
		}
		self.pending
			.push(evdev::InputEvent::new_now(evdev::EventType::RELATIVE, rel_type(axis).0, delta));
	}

	fn syn(&mut self) -> Result<(), SinkError> {
		if self.pending.is_empty() {
			return Ok(());
		}
		self.device.emit(&self.pending)?;
		self.pending.clear();
		Ok(())
	}

	fn manages_key(&self, code: u16) -> bool {
		manages_key(code)
	}

	/// Drive the move trackball one tick and queue the resulting relative
	/// event if it emitted any motion. Returns `(ex, ey, distance)`: the
	/// emitted pixel delta and its Euclidean distance, used by the mapper to
	/// decide whether to mark this sink dirty and to accumulate haptic-pulse
	/// travel (spec.md §4.6.3).
	fn move_ball(&mut self, dx: f32, dy: f32, free: bool, dt: f32) -> (i32, i32, f32) {
		let (ex, ey, distance) = self.move_ball.step(dx, dy, free, dt);
		if ex != 0 || ey != 0 {
			self.rel_event(RelAxis::X, ex);
			self.rel_event(RelAxis::Y, ey);
		}
		(ex, ey, distance)
	}

	/// Same as [`Sink::move_ball`] but against the scroll channel.
	fn scroll_ball(&mut self, dx: f32, dy: f32, free: bool, dt: f32) -> (i32, i32, f32) {
		let (ex, ey, distance) = self.scroll_ball.step(dx, dy, free, dt);
		if ex != 0 || ey != 0 {
			self.rel_event(RelAxis::HWheel, ex);
			self.rel_event(RelAxis::Wheel, ey);
		}
		(ex, ey, distance)
	}
}

/// Whether the mouse sink claims `code`, independent of any constructed
/// device (spec.md §4.1's construction contract).
pub fn manages_key(code: u16) -> bool {
	BUTTONS.iter().any(|k| k.code() == code)
}
