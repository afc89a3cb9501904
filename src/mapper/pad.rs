//! Trackpad dispatch (spec.md §4.6.3): mean-smoothing, mouse/scroll/axis/
//! button-cardinal modes, and the haptic pulse schedule tied to pad travel.

use crate::profile::{PadMode, Pos};
use crate::report::{Buttons, Report};
use crate::sink::SinkKind;

use super::{EventMapper, HAPTIC_PULSE_EVERY, PAD_QUEUE_CAP, PAD_ROTATION_RAD};

fn touch_bit(pos: Pos) -> Buttons {
	match pos {
		Pos::Left => Buttons::LPAD_TOUCH,
		Pos::Right => Buttons::RPAD_TOUCH,
	}
}

fn click_bit(pos: Pos) -> Buttons {
	match pos {
		Pos::Left => Buttons::LPAD,
		Pos::Right => Buttons::RPAD,
	}
}

fn raw_xy(pos: Pos, report: Report) -> (i16, i16) {
	match pos {
		Pos::Left => (report.lpad_x, report.lpad_y),
		Pos::Right => (report.rpad_x, report.rpad_y),
	}
}

/// Push a new sample, dropping the oldest once at capacity, and return the
/// truncated integer mean (spec.md §3.5 `xdq`/`ydq`).
fn push_and_mean(queue: &mut std::collections::VecDeque<i16>, sample: i16) -> i32 {
	if queue.len() == PAD_QUEUE_CAP {
		queue.pop_front();
	}
	queue.push_back(sample);
	let sum: i32 = queue.iter().map(|&v| v as i32).sum();
	sum / queue.len() as i32
}

pub(super) fn process_pad(mapper: &mut EventMapper, pos: Pos, prev: Report, cur: Report) {
	let idx = pos as usize;
	let (x, y) = raw_xy(pos, cur);
	let touched = cur.buttons.contains(touch_bit(pos));
	let was_touched = prev.buttons.contains(touch_bit(pos));
	let cfg = mapper.effective_pad_cfg(pos);

	if !touched {
		mapper.pad_x_queue[idx].clear();
		mapper.pad_y_queue[idx].clear();
	}

	let xm = push_and_mean(&mut mapper.pad_x_queue[idx], x);
	let ym = push_and_mean(&mut mapper.pad_y_queue[idx], y);
	if touched && !was_touched {
		// First touch of a new stroke: seed the mean so the first tick
		// doesn't report a jump from wherever the finger last lifted.
		mapper.pad_prev_mean[idx] = (xm, ym);
	}

	match cfg.mode {
		PadMode::NoAction => {},
		PadMode::Mouse | PadMode::MouseScroll => {
			process_ball(mapper, pos, touched, xm, ym, cfg.mode == PadMode::MouseScroll);
		},
		PadMode::Axis => {
			if let Some((ax_x, ax_y)) = cfg.axes {
				let yv = if cfg.revert { -(y as i32) } else { y as i32 };
				mapper.axis_write(SinkKind::Gamepad, ax_x, x as i32);
				mapper.axis_write(SinkKind::Gamepad, ax_y, yv);
			}
			let (px, py) = raw_xy(pos, prev);
			let dx = (x as i32 - px as i32).abs() as f32;
			let dy = (y as i32 - py as i32).abs() as f32;
			accumulate_pulse(mapper, pos, idx, (dx * dx + dy * dy).sqrt());
		},
		PadMode::ButtonTouch | PadMode::ButtonClick => {
			process_buttons(mapper, pos, prev, cur, x, y, &cfg);
		},
	}

	mapper.pad_prev_mean[idx] = (xm, ym);
}

fn accumulate_pulse(mapper: &mut EventMapper, pos: Pos, idx: usize, distance: f32) {
	mapper.pad_move_accum[idx] += distance;
	while mapper.pad_move_accum[idx] >= HAPTIC_PULSE_EVERY {
		mapper.pad_move_accum[idx] -= HAPTIC_PULSE_EVERY;
		mapper.schedule_pulse(pos);
	}
}

fn process_ball(mapper: &mut EventMapper, pos: Pos, touched: bool, xm: i32, ym: i32, scroll: bool) {
	let idx = pos as usize;
	let (pxm, pym) = mapper.pad_prev_mean[idx];
	let dx = if touched { (xm - pxm) as f32 } else { 0.0 };
	let dy = if touched { -(ym - pym) as f32 } else { 0.0 };
	let free = !touched;
	let dt = mapper.dt();

	let motion = mapper.sink_mut(SinkKind::Mouse).map(|m| {
		if scroll {
			m.scroll_ball(dx, dy, free, dt)
		} else {
			m.move_ball(dx, dy, free, dt)
		}
	});

	if let Some((ex, ey, distance)) = motion {
		if ex != 0 || ey != 0 {
			mapper.mark_dirty(SinkKind::Mouse);
		}
		accumulate_pulse(mapper, pos, idx, distance);
	}
}

fn process_buttons(
	mapper: &mut EventMapper,
	pos: Pos,
	prev: Report,
	cur: Report,
	x: i16,
	y: i16,
	cfg: &crate::profile::PadConfig,
) {
	let enabled = cur.buttons.contains(touch_bit(pos))
		&& (cfg.mode != PadMode::ButtonClick || cur.buttons.contains(click_bit(pos)));
	let was_enabled = prev.buttons.contains(touch_bit(pos))
		&& (cfg.mode != PadMode::ButtonClick || prev.buttons.contains(click_bit(pos)));

	let (sin, cos) = PAD_ROTATION_RAD.sin_cos();
	let xr = x as f32 * cos - y as f32 * sin;
	let yr = x as f32 * sin + y as f32 * cos;
	let deadzone = 32768.0 * cfg.deadzone;

	if enabled {
		if let Some((ax_x, ax_y)) = cfg.axes {
			let vx = if xr >= deadzone {
				1
			} else if xr <= -deadzone {
				-1
			} else {
				0
			};
			let vy = if yr >= deadzone {
				1
			} else if yr <= -deadzone {
				-1
			} else {
				0
			};
			mapper.axis_write(SinkKind::Gamepad, ax_x, vx);
			mapper.axis_write(SinkKind::Gamepad, ax_y, vy);
		} else if cfg.events.len() == 4 {
			// More than one cardinal direction can be active at once
			// (spec.md §4.6.3): each binding is independently pressed or
			// released, not mutually exclusive.
			let top = yr >= deadzone;
			let left = xr <= -deadzone;
			let bottom = yr <= -deadzone;
			let right = xr >= deadzone;
			for (held, binding) in [
				(top, &cfg.events[0]),
				(left, &cfg.events[1]),
				(bottom, &cfg.events[2]),
				(right, &cfg.events[3]),
			] {
				mapper.apply_binding(binding, held);
			}
		}
	} else if was_enabled {
		if let Some((ax_x, ax_y)) = cfg.axes {
			mapper.axis_write(SinkKind::Gamepad, ax_x, 0);
			mapper.axis_write(SinkKind::Gamepad, ax_y, 0);
		} else if cfg.events.len() == 4 {
			for binding in &cfg.events {
				mapper.apply_binding(binding, false);
			}
		}
	}

	if cfg.mode == PadMode::ButtonTouch && (enabled != was_enabled) {
		mapper.schedule_pulse(pos);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mapper::fake::{FakeGamepad, FakeMouse};
	use crate::profile::{Binding, BindingTables, PadConfig};
	use crate::report::Status;

	fn mapper_with(pad_cfg: PadConfig, pos: Pos) -> EventMapper {
		let mut tables = BindingTables::default();
		tables.pad_cfg[pos as usize] = pad_cfg;
		EventMapper::new(
			tables,
			Box::new(FakeGamepad::new()),
			Box::new(FakeGamepad::new()),
			Box::new(FakeMouse::new()),
		)
	}

	fn input(buttons: Buttons, x: i16, y: i16, pos: Pos) -> Report {
		let mut r = Report {
			status: Status::Input,
			buttons,
			..Default::default()
		};
		match pos {
			Pos::Left => {
				r.lpad_x = x;
				r.lpad_y = y;
			},
			Pos::Right => {
				r.rpad_x = x;
				r.rpad_y = y;
			},
		}
		r
	}

	#[test]
	fn push_and_mean_truncates_toward_zero() {
		let mut q = std::collections::VecDeque::new();
		assert_eq!(push_and_mean(&mut q, 10), 10);
		assert_eq!(push_and_mean(&mut q, 3), 6);
	}

	#[test]
	fn mouse_mode_emits_motion_while_touched_and_moving() {
		let cfg = PadConfig {
			mode: PadMode::Mouse,
			..Default::default()
		};
		let mut mapper = mapper_with(cfg, Pos::Left);

		let prev = input(Buttons::empty(), 0, 0, Pos::Left);
		let touch1 = input(Buttons::LPAD_TOUCH, 100, 0, Pos::Left);
		process_pad(&mut mapper, Pos::Left, prev, touch1);
		let touch2 = input(Buttons::LPAD_TOUCH, 2000, 0, Pos::Left);
		process_pad(&mut mapper, Pos::Left, touch1, touch2);

		assert!(mapper.dirty.contains(&SinkKind::Mouse));
	}

	#[test]
	fn releasing_the_pad_stops_motion_without_a_synthetic_jump() {
		let cfg = PadConfig {
			mode: PadMode::Mouse,
			..Default::default()
		};
		let mut mapper = mapper_with(cfg, Pos::Left);

		let prev = input(Buttons::empty(), 0, 0, Pos::Left);
		let touched = input(Buttons::LPAD_TOUCH, 5000, 0, Pos::Left);
		process_pad(&mut mapper, Pos::Left, prev, touched);
		mapper.dirty.clear();

		let released = input(Buttons::empty(), 5000, 0, Pos::Left);
		process_pad(&mut mapper, Pos::Left, touched, released);
		// Lifting the finger clears the smoothing queues; the next touch
		// reseeds the mean instead of replaying the old delta.
		assert!(mapper.pad_x_queue[0].is_empty());
	}

	#[test]
	fn axis_mode_writes_both_axes_and_honors_revert() {
		let cfg = PadConfig {
			mode: PadMode::Axis,
			axes: Some((crate::sink::Axis::Hat0X, crate::sink::Axis::Hat0Y)),
			revert: true,
			..Default::default()
		};
		let mut mapper = mapper_with(cfg, Pos::Left);

		let prev = input(Buttons::empty(), 0, 0, Pos::Left);
		let cur = input(Buttons::empty(), 500, 1000, Pos::Left);
		process_pad(&mut mapper, Pos::Left, prev, cur);

		assert_eq!(mapper.on_abs.get(&(SinkKind::Gamepad, crate::sink::Axis::Hat0X)), Some(&500));
		assert_eq!(mapper.on_abs.get(&(SinkKind::Gamepad, crate::sink::Axis::Hat0Y)), Some(&-1000));
	}

	#[test]
	fn button_click_mode_requires_click_bit() {
		let cfg = PadConfig {
			mode: PadMode::ButtonClick,
			events: vec![Binding::Key(1), Binding::Key(2), Binding::Key(3), Binding::Key(4)],
			..Default::default()
		};
		let mut mapper = mapper_with(cfg, Pos::Left);

		let prev = input(Buttons::empty(), 0, 0, Pos::Left);
		// Touched but not clicked: `enabled` stays false since the click bit
		// is absent, so nothing should latch despite crossing the deadzone.
		let touched_only = input(Buttons::LPAD_TOUCH, 0, 32000, Pos::Left);
		process_pad(&mut mapper, Pos::Left, prev, touched_only);
		assert!(mapper.on_keys.is_empty());

		let clicked = input(Buttons::LPAD_TOUCH | Buttons::LPAD, 0, 32000, Pos::Left);
		process_pad(&mut mapper, Pos::Left, touched_only, clicked);
		assert!(!mapper.on_keys.is_empty());
	}

	#[test]
	fn button_touch_mode_releases_all_cardinals_on_untouch() {
		let cfg = PadConfig {
			mode: PadMode::ButtonTouch,
			events: vec![Binding::Key(1), Binding::Key(2), Binding::Key(3), Binding::Key(4)],
			..Default::default()
		};
		let mut mapper = mapper_with(cfg, Pos::Left);

		let prev = input(Buttons::empty(), 0, 0, Pos::Left);
		let touched = input(Buttons::LPAD_TOUCH, 0, 32000, Pos::Left);
		process_pad(&mut mapper, Pos::Left, prev, touched);
		assert!(!mapper.on_keys.is_empty());

		let released = input(Buttons::empty(), 0, 32000, Pos::Left);
		process_pad(&mut mapper, Pos::Left, touched, released);
		assert!(mapper.on_keys.is_empty());
	}
}
