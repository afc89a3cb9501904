//! Fake sinks used only by this crate's unit tests, standing in for the
//! real `/dev/uinput`-backed sinks so the mapper's state machine can be
//! exercised without a virtual input subsystem.

use crate::sink::trackball::Trackball;
use crate::sink::{Axis, RelAxis, Sink, SinkError, SinkKind};

/// Records every event it receives; used to stand in for the gamepad or
/// keyboard sink in tests, since neither drives a trackball.
pub struct FakeGamepad {
	pub keys: Vec<(u16, i32)>,
	pub axes: Vec<(Axis, i32)>,
	pub syn_count: u32,
}

impl FakeGamepad {
	pub fn new() -> Self {
		FakeGamepad {
			keys: Vec::new(),
			axes: Vec::new(),
			syn_count: 0,
		}
	}
}

impl Sink for FakeGamepad {
	fn kind(&self) -> SinkKind {
		SinkKind::Gamepad
	}

	fn key_event(&mut self, code: u16, value: i32) {
		self.keys.push((code, value));
	}

	fn axis_event(&mut self, axis: Axis, value: i32) {
		self.axes.push((axis, value));
	}

	fn rel_event(&mut self, _axis: RelAxis, _delta: i32) {}

	fn syn(&mut self) -> Result<(), SinkError> {
		self.syn_count += 1;
		Ok(())
	}

	fn manages_key(&self, code: u16) -> bool {
		crate::sink::gamepad::manages_key(code)
	}

	fn manages_axis(&self, _axis: Axis) -> bool {
		true
	}
}

/// A fake mouse sink that drives real [`Trackball`] physics, so pad-driven
/// mouse/scroll tests get genuine inertia behavior without a live device.
pub struct FakeMouse {
	pub move_ball: Trackball,
	pub scroll_ball: Trackball,
	pub keys: Vec<(u16, i32)>,
	pub rels: Vec<(RelAxis, i32)>,
	pub syn_count: u32,
}

impl FakeMouse {
	pub fn new() -> Self {
		FakeMouse {
			move_ball: Trackball::for_mouse(),
			scroll_ball: Trackball::for_scroll(),
			keys: Vec::new(),
			rels: Vec::new(),
			syn_count: 0,
		}
	}
}

impl Sink for FakeMouse {
	fn kind(&self) -> SinkKind {
		SinkKind::Mouse
	}

	fn key_event(&mut self, code: u16, value: i32) {
		self.keys.push((code, value));
	}

	fn axis_event(&mut self, _axis: Axis, _value: i32) {}

	fn rel_event(&mut self, axis: RelAxis, delta: i32) {
		if delta != 0 {
			self.rels.push((axis, delta));
		}
	}

	fn syn(&mut self) -> Result<(), SinkError> {
		self.syn_count += 1;
		Ok(())
	}

	fn manages_key(&self, code: u16) -> bool {
		crate::sink::mouse::manages_key(code)
	}

	fn move_ball(&mut self, dx: f32, dy: f32, free: bool, dt: f32) -> (i32, i32, f32) {
		let (ex, ey, distance) = self.move_ball.step(dx, dy, free, dt);
		if ex != 0 || ey != 0 {
			self.rel_event(RelAxis::X, ex);
			self.rel_event(RelAxis::Y, ey);
		}
		(ex, ey, distance)
	}

	fn scroll_ball(&mut self, dx: f32, dy: f32, free: bool, dt: f32) -> (i32, i32, f32) {
		let (ex, ey, distance) = self.scroll_ball.step(dx, dy, free, dt);
		if ex != 0 || ey != 0 {
			self.rel_event(RelAxis::HWheel, ex);
			self.rel_event(RelAxis::Wheel, ey);
		}
		(ex, ey, distance)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fake_mouse_reports_motion_like_the_real_trackball() {
		let mut mouse = FakeMouse::new();
		let (ex, ey, distance) = mouse.move_ball(10.0, 0.0, false, 1.0 / 125.0);
		assert!(ex != 0 || ey != 0 || distance > 0.0);
	}
}
