//! Analog-stick dispatch (spec.md §4.6.4). The left pad's raw X/Y wire
//! fields double as the hardware joystick's position whenever `LPAD_TOUCH`
//! is clear (spec.md §3.2); once the pad is touched, those fields mean
//! touch coordinates instead and stick processing stands down.

use crate::profile::{Binding, StickMode};
use crate::report::{Buttons, Report};
use crate::sink::SinkKind;

use super::EventMapper;

/// The press threshold is this much above a baseline derived from the
/// previous sample (spec.md §4.6.4), giving a >2000-unit hysteresis band
/// between press and release.
const PRESS_MARGIN: i32 = 2000;
/// Maximum press threshold, keeping the latch within the raw axis range
/// (spec.md §4.6.4).
const PRESS_MAX: i32 = 31000;

pub(super) fn process_stick(mapper: &mut EventMapper, prev: Report, cur: Report) {
	let cfg = mapper.effective_stick_cfg();

	if cur.buttons.contains(Buttons::LPAD_TOUCH) {
		if cfg.mode == StickMode::Button && cfg.events.len() == 4 {
			release_all_latches(mapper, &cfg.events);
		}
		return;
	}

	let x = cur.lpad_x;
	let y = cur.lpad_y;
	let xp = prev.lpad_x;
	let yp = prev.lpad_y;

	match cfg.mode {
		StickMode::NoAction => {},
		StickMode::Axis => {
			if let Some((ax_x, ax_y)) = cfg.axes {
				let yv = if cfg.revert { -(y as i32) } else { y as i32 };
				mapper.axis_write(SinkKind::Gamepad, ax_x, x as i32);
				mapper.axis_write(SinkKind::Gamepad, ax_y, yv);
			}
		},
		StickMode::Button => {
			if cfg.events.len() == 4 {
				positive_latch(mapper, 0, y, yp, &cfg.events[0]);
				negative_latch(mapper, 1, x, xp, &cfg.events[1]);
				negative_latch(mapper, 2, y, yp, &cfg.events[2]);
				positive_latch(mapper, 3, x, xp, &cfg.events[3]);
			}
		},
	}
}

fn release_all_latches(mapper: &mut EventMapper, events: &[Binding]) {
	for idx in 0..4 {
		if mapper.stick_latch[idx].is_some() {
			mapper.stick_latch[idx] = None;
			mapper.apply_binding(&events[idx], false);
		}
	}
}

/// Latch/release a direction whose magnitude grows positive (top/right),
/// per spec.md §4.6.4's baseline-derived hysteresis.
fn positive_latch(mapper: &mut EventMapper, idx: usize, raw: i16, prev_raw: i16, binding: &Binding) {
	let v = raw as i32;
	match mapper.stick_latch[idx] {
		None => {
			let threshold = (prev_raw as i32 + PRESS_MARGIN).min(PRESS_MAX);
			if v > 0 && v > threshold {
				let latch_value = (v - PRESS_MARGIN).max(0).min(PRESS_MAX - PRESS_MARGIN);
				mapper.stick_latch[idx] = Some(latch_value as i16);
				mapper.apply_binding(binding, true);
			}
		},
		Some(latched) => {
			if v <= latched as i32 {
				mapper.stick_latch[idx] = None;
				mapper.apply_binding(binding, false);
			}
		},
	}
}

/// Mirror of [`positive_latch`] for directions whose magnitude grows
/// negative (bottom/left).
fn negative_latch(mapper: &mut EventMapper, idx: usize, raw: i16, prev_raw: i16, binding: &Binding) {
	let v = raw as i32;
	match mapper.stick_latch[idx] {
		None => {
			let threshold = (prev_raw as i32 - PRESS_MARGIN).max(-PRESS_MAX);
			if v < 0 && v < threshold {
				let latch_value = (v + PRESS_MARGIN).min(0).max(-(PRESS_MAX - PRESS_MARGIN));
				mapper.stick_latch[idx] = Some(latch_value as i16);
				mapper.apply_binding(binding, true);
			}
		},
		Some(latched) => {
			if v >= latched as i32 {
				mapper.stick_latch[idx] = None;
				mapper.apply_binding(binding, false);
			}
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mapper::fake::{FakeGamepad, FakeMouse};
	use crate::profile::{BindingTables, StickConfig};
	use crate::report::Status;
	use crate::sink::Axis;

	fn mapper_with(stick_cfg: StickConfig) -> EventMapper {
		let mut tables = BindingTables::default();
		tables.stick_cfg = stick_cfg;
		EventMapper::new(
			tables,
			Box::new(FakeGamepad::new()),
			Box::new(FakeGamepad::new()),
			Box::new(FakeMouse::new()),
		)
	}

	fn report(buttons: Buttons, x: i16, y: i16) -> Report {
		Report {
			status: Status::Input,
			buttons,
			lpad_x: x,
			lpad_y: y,
			..Default::default()
		}
	}

	#[test]
	fn touching_the_pad_suppresses_stick_processing() {
		let cfg = StickConfig {
			mode: StickMode::Axis,
			axes: Some((Axis::X, Axis::Y)),
			..Default::default()
		};
		let mut mapper = mapper_with(cfg);
		let touched = report(Buttons::LPAD_TOUCH, 1000, 1000);
		process_stick(&mut mapper, Report::default(), touched);
		assert!(mapper.on_abs.is_empty());
	}

	#[test]
	fn axis_mode_writes_both_axes_and_honors_revert() {
		let cfg = StickConfig {
			mode: StickMode::Axis,
			axes: Some((Axis::X, Axis::Y)),
			revert: true,
			..Default::default()
		};
		let mut mapper = mapper_with(cfg);
		let cur = report(Buttons::empty(), 500, 1000);
		process_stick(&mut mapper, Report::default(), cur);
		assert_eq!(mapper.on_abs.get(&(SinkKind::Gamepad, Axis::X)), Some(&500));
		assert_eq!(mapper.on_abs.get(&(SinkKind::Gamepad, Axis::Y)), Some(&-1000));
	}

	#[test]
	fn button_mode_latches_and_releases_with_hysteresis() {
		let cfg = StickConfig {
			mode: StickMode::Button,
			events: vec![
				Binding::Key(1),
				Binding::Key(2),
				Binding::Key(3),
				Binding::Key(4),
			],
			..Default::default()
		};
		let mut mapper = mapper_with(cfg);

		let pushed_right = report(Buttons::empty(), 32000, 0);
		process_stick(&mut mapper, Report::default(), pushed_right);
		assert!(mapper.on_keys.contains(&(SinkKind::Gamepad, 4)));

		// Within the hysteresis band: stays latched.
		let eased_off = report(Buttons::empty(), 30000, 0);
		process_stick(&mut mapper, pushed_right, eased_off);
		assert!(mapper.on_keys.contains(&(SinkKind::Gamepad, 4)));

		let released = report(Buttons::empty(), 28000, 0);
		process_stick(&mut mapper, eased_off, released);
		assert!(!mapper.on_keys.contains(&(SinkKind::Gamepad, 4)));
	}

	#[test]
	fn touching_the_pad_releases_a_latched_direction() {
		let cfg = StickConfig {
			mode: StickMode::Button,
			events: vec![
				Binding::Key(1),
				Binding::Key(2),
				Binding::Key(3),
				Binding::Key(4),
			],
			..Default::default()
		};
		let mut mapper = mapper_with(cfg);
		let pushed_right = report(Buttons::empty(), 32000, 0);
		process_stick(&mut mapper, Report::default(), pushed_right);
		assert!(mapper.on_keys.contains(&(SinkKind::Gamepad, 4)));

		let now_touched = report(Buttons::LPAD_TOUCH, 32000, 0);
		process_stick(&mut mapper, pushed_right, now_touched);
		assert!(!mapper.on_keys.contains(&(SinkKind::Gamepad, 4)));
	}
}
