//! Trigger dispatch (spec.md §4.6.5): either a raw 0-255 axis or a
//! hysteresis-latched button, matching `original_source/src/events.py`'s
//! trigger threshold math exactly.

use crate::profile::{Pos, TrigMode};
use crate::report::Report;
use crate::sink::SinkKind;

use super::EventMapper;

fn raw(pos: Pos, report: Report) -> u8 {
	match pos {
		Pos::Left => report.ltrig,
		Pos::Right => report.rtrig,
	}
}

pub(super) fn process_trigger(mapper: &mut EventMapper, pos: Pos, prev: Report, cur: Report) {
	let t = raw(pos, cur);
	let tp = raw(pos, prev);
	let cfg = mapper.effective_trig_cfg(pos);

	match cfg.mode {
		TrigMode::NoAction => {},
		TrigMode::Axis => {
			if t != tp {
				if let Some(axis) = cfg.axis {
					mapper.axis_write(SinkKind::Gamepad, axis, t as i32);
				}
			}
		},
		TrigMode::Button => {
			let idx = pos as usize;
			let latch = mapper.trig_latch[idx];

			if latch.is_none() && (t as i32) > (tp as i32 + 10).min(200) {
				mapper.trig_latch[idx] = Some((t as i32 - 10).max(0).min(180) as u8);
				mapper.apply_binding(&cfg.binding, true);
			} else if let Some(latch_value) = latch {
				if (t as i32) <= latch_value as i32 {
					mapper.trig_latch[idx] = None;
					mapper.apply_binding(&cfg.binding, false);
				}
			}
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mapper::fake::{FakeGamepad, FakeMouse};
	use crate::profile::{Binding, BindingTables, TrigConfig};
	use crate::report::Status;
	use crate::sink::{Axis, SinkKind};

	fn mapper_with(trig_cfg: TrigConfig, pos: Pos) -> EventMapper {
		let mut tables = BindingTables::default();
		tables.trig_cfg[pos as usize] = trig_cfg;
		EventMapper::new(
			tables,
			Box::new(FakeGamepad::new()),
			Box::new(FakeGamepad::new()),
			Box::new(FakeMouse::new()),
		)
	}

	fn report(ltrig: u8) -> Report {
		Report {
			status: Status::Input,
			ltrig,
			..Default::default()
		}
	}

	#[test]
	fn axis_mode_writes_only_on_change() {
		let cfg = TrigConfig {
			mode: TrigMode::Axis,
			axis: Some(Axis::Z),
			..Default::default()
		};
		let mut mapper = mapper_with(cfg, Pos::Left);
		process_trigger(&mut mapper, Pos::Left, report(0), report(100));
		assert_eq!(mapper.on_abs.get(&(SinkKind::Gamepad, Axis::Z)), Some(&100));
	}

	#[test]
	fn button_mode_presses_then_releases_with_hysteresis() {
		let cfg = TrigConfig {
			mode: TrigMode::Button,
			binding: Binding::Key(9),
			..Default::default()
		};
		let mut mapper = mapper_with(cfg, Pos::Left);

		// Pressing past the trigger's travel edge latches the binding.
		process_trigger(&mut mapper, Pos::Left, report(0), report(50));
		assert!(mapper.on_keys.contains(&(SinkKind::Gamepad, 9)));

		// Easing off slightly stays latched (hysteresis).
		process_trigger(&mut mapper, Pos::Left, report(50), report(45));
		assert!(mapper.on_keys.contains(&(SinkKind::Gamepad, 9)));

		// Releasing the trigger past the latch point releases the binding.
		process_trigger(&mut mapper, Pos::Left, report(45), report(20));
		assert!(!mapper.on_keys.contains(&(SinkKind::Gamepad, 9)));
	}

	#[test]
	fn button_mode_ignores_small_fluctuations() {
		let cfg = TrigConfig {
			mode: TrigMode::Button,
			binding: Binding::Key(9),
			..Default::default()
		};
		let mut mapper = mapper_with(cfg, Pos::Left);
		process_trigger(&mut mapper, Pos::Left, report(50), report(52));
		assert!(!mapper.on_keys.contains(&(SinkKind::Gamepad, 9)));
	}
}
