//! Trackball motion model (spec.md §4.2): an exponential-decay integrator
//! used by the mouse sink so a pad flick glides to rest after release.

/// Below this speed (pixels/sec) the ball is considered at rest and stops
/// emitting events until the next push (spec.md §4.2 invariant).
const REST_EPSILON: f32 = 1.0;

pub struct Trackball {
	vx: f32,
	vy: f32,
	rx: f32,
	ry: f32,
	friction: f32,
	xscale: f32,
	yscale: f32,
}

impl Trackball {
	pub fn new(friction: f32, xscale: f32, yscale: f32) -> Self {
		Trackball {
			vx: 0.0,
			vy: 0.0,
			rx: 0.0,
			ry: 0.0,
			friction,
			xscale,
			yscale,
		}
	}

	/// Mouse-motion defaults: moderate friction, 1:1 scale.
	pub fn for_mouse() -> Self {
		Self::new(8.0, 1.0, 1.0)
	}

	/// Scroll-motion defaults: heavier friction, smaller scale.
	pub fn for_scroll() -> Self {
		Self::new(12.0, 0.3, 0.3)
	}

	/// True once `friction` has been forced high enough that any residual
	/// velocity dies before the next tick, i.e. trackball-style inertia is
	/// effectively disabled (spec.md §4.2's "disabled" trackball toggle).
	pub fn is_inertia_disabled(&self) -> bool {
		self.friction >= 100.0
	}

	pub fn set_inertia_enabled(&mut self, enabled: bool) {
		if !enabled {
			self.friction = 100.0;
		}
	}

	/// Advance the model by `dt` seconds and return the integer pixel delta
	/// to emit this tick, plus the Euclidean distance of that delta (spec.md
	/// §4.2).
	///
	/// `free = false` is a direct push: the pad's per-tick displacement is
	/// emitted ~1:1 (matching `tests/mouse.py`'s 250 calls of
	/// `moveEvent(65536/250)` moving the pointer a total of 65536), and
	/// also seeds the ball's velocity so the push carries into the next
	/// `free = true` ticks as inertia. `free = true` lets that velocity
	/// decay exponentially and no new push is applied.
	pub fn step(&mut self, dx: f32, dy: f32, free: bool, dt: f32) -> (i32, i32, f32) {
		let dt = dt.max(1.0 / 250.0);
		if free {
			let decay = (-self.friction * dt).exp();
			self.vx *= decay;
			self.vy *= decay;
			if self.vx.abs() < REST_EPSILON {
				self.vx = 0.0;
			}
			if self.vy.abs() < REST_EPSILON {
				self.vy = 0.0;
			}
			self.rx += self.vx * dt;
			self.ry += self.vy * dt;
		} else {
			let pushx = dx * self.xscale;
			let pushy = dy * self.yscale;
			self.vx = pushx;
			self.vy = pushy;
			self.rx += pushx;
			self.ry += pushy;
		}

		let ex = self.rx.trunc();
		let ey = self.ry.trunc();
		self.rx -= ex;
		self.ry -= ey;

		let distance = (ex * ex + ey * ey).sqrt();
		(ex as i32, ey as i32, distance)
	}

	/// Whether the ball is currently at rest (spec.md §4.2 invariant: no
	/// further events once `|v| < ε` while `free`).
	pub fn at_rest(&self) -> bool {
		self.vx == 0.0 && self.vy == 0.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn direct_push_emits_nonzero_delta() {
		let mut ball = Trackball::for_mouse();
		let (ex, ey, _) = ball.step(100.0, 0.0, false, 0.01);
		assert!(ex > 0);
		assert_eq!(ey, 0);
	}

	#[test]
	fn decay_eventually_reaches_rest() {
		let mut ball = Trackball::for_mouse();
		ball.step(500.0, 0.0, false, 0.01);
		for _ in 0..500 {
			ball.step(0.0, 0.0, true, 0.02);
			if ball.at_rest() {
				break;
			}
		}
		assert!(ball.at_rest());
	}

	#[test]
	fn disabling_inertia_forces_immediate_rest() {
		let mut ball = Trackball::for_mouse();
		ball.step(500.0, 0.0, false, 0.01);
		ball.set_inertia_enabled(false);
		ball.step(0.0, 0.0, true, 0.02);
		assert!(ball.at_rest());
	}

	/// A touch-release of net motion (1000, 0) must emit a total delta
	/// exceeding 1000: the push tracks the pad ~1:1, and inertia on release
	/// adds further motion on top.
	#[test]
	fn touch_release_emits_more_than_the_raw_push() {
		let mut ball = Trackball::for_mouse();
		let dt = 1.0 / 125.0;
		let mut total = 0i64;

		for _ in 0..125 {
			let (ex, _, _) = ball.step(8.0, 0.0, false, dt);
			total += ex as i64;
		}

		for _ in 0..500 {
			let (ex, _, _) = ball.step(0.0, 0.0, true, dt);
			total += ex as i64;
			if ball.at_rest() {
				break;
			}
		}

		assert!(total > 1000, "total emitted delta {total} should exceed the 1000-unit push");
	}
}
