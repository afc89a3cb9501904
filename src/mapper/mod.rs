//! The event mapper (spec.md §4.6): the central state machine that turns a
//! stream of decoded [`Report`]s into synthetic key/axis/relative/scroll
//! events on the three [`Sink`]s, per a compiled [`BindingTables`].
//!
//! The heavy per-category logic (pads, stick, triggers) lives in the
//! sibling `pad`/`stick`/`trigger` modules; this file owns the state, the
//! strict per-tick ordering from spec.md §4.6, button-diff dispatch, the
//! STEAM long-press exit gesture, and mode-shift bookkeeping.

mod pad;
mod stick;
mod trigger;

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use crate::device::{Command, ControllerSession, HapticPosition, HapticPulse};
use crate::profile::{Binding, BindingTables, Pos, Section, SectionShift};
use crate::report::{Buttons, Report, Status};
use crate::sink::{Axis, Sink, SinkKind};

#[cfg(test)]
pub(crate) mod fake;

/// How long STEAM must be held before the driver exits (spec.md §4.6.2).
const STEAM_LONG_PRESS: Duration = Duration::from_millis(2000);

/// Pad samples kept for mean-smoothing (spec.md §3.5, §4.6.3).
const PAD_QUEUE_CAP: usize = 8;

/// Pad rotation applied before the deadzone partition in ButtonTouch/
/// ButtonClick mode: ~ -20.56 degrees (spec.md §4.6.3).
const PAD_ROTATION_RAD: f32 = -0.35877;

/// Pad travel, in raw coordinate units, between automatic haptic pulses
/// (spec.md §4.6.3).
const HAPTIC_PULSE_EVERY: f32 = 4000.0;

/// Default single-shot pulse parameters, matching
/// `original_source/src/__init__.py`'s `addFeedback` defaults.
const DEFAULT_PULSE_AMPLITUDE: u16 = 128;
const DEFAULT_PULSE_PERIOD: u16 = 0;
const DEFAULT_PULSE_COUNT: u16 = 1;

/// Event mapper state (spec.md §3.5).
pub struct EventMapper {
	tables: BindingTables,

	/// Boxed so tests can inject fakes that don't need `/dev/uinput`
	/// (spec.md §4.1's construction contract is purely behavioral).
	gamepad: Option<Box<dyn Sink>>,
	keyboard: Option<Box<dyn Sink>>,
	mouse: Option<Box<dyn Sink>>,

	prev_report: Report,
	last_tick: Instant,
	dt: f32,

	/// De-duplicates key press/release emissions (spec.md §3.5 `on_keys`).
	on_keys: HashSet<(SinkKind, u16)>,
	/// De-duplicates absolute-axis writes (spec.md §3.5 `on_abs`).
	on_abs: HashMap<(SinkKind, Axis), i32>,
	/// Sinks that received at least one event this tick; flushed once each
	/// at the end of the pass (spec.md §4.6.6).
	dirty: HashSet<SinkKind>,

	pad_x_queue: [VecDeque<i16>; 2],
	pad_y_queue: [VecDeque<i16>; 2],
	/// Previous tick's smoothed pad mean, used to compute the per-tick pad
	/// delta in Mouse/MouseScroll mode (spec.md §3.5 `xdq/ydq` derived mean).
	pad_prev_mean: [(i32, i32); 2],
	/// Accumulated pad travel since the last scheduled haptic pulse
	/// (spec.md §3.5 `pad_move_accum`).
	pad_move_accum: [f32; 2],

	/// Per-trigger hysteresis latch (spec.md §3.5 `trig_threshold`).
	trig_latch: [Option<u8>; 2],
	/// Per-direction stick dpad hysteresis latch, ordered
	/// `[top, left, bottom, right]` (spec.md §3.5 `stick_edge`).
	stick_latch: [Option<i16>; 4],

	/// When STEAM was pressed, for the long-press exit gesture (spec.md
	/// §3.5 `steam_press_time`).
	steam_press_time: Option<Instant>,

	/// Sections currently overridden by a held `ModeShift` binding (spec.md
	/// §4.6.7).
	shifted: HashSet<Section>,

	/// Haptic pulses scheduled this tick by pad/trigger processing, drained
	/// onto the session's command queue once `process()` finishes (keeps
	/// `pad`/`stick`/`trigger` free of any USB-transport dependency).
	pending_commands: Vec<Command>,

	exit_requested: bool,
}

/// The eleven button bits dispatched through `btn_map` (spec.md §3.2,
/// §4.5's `button_diamond`/`switch` sections).
const MAPPED_BITS: [u32; 11] = [
	Buttons::A.bits(),
	Buttons::B.bits(),
	Buttons::X.bits(),
	Buttons::Y.bits(),
	Buttons::LB.bits(),
	Buttons::RB.bits(),
	Buttons::START.bits(),
	Buttons::BACK.bits(),
	Buttons::LGRIP.bits(),
	Buttons::RGRIP.bits(),
	Buttons::STEAM.bits(),
];

fn bit_section(bit: u32) -> Option<Section> {
	if bit == Buttons::A.bits() || bit == Buttons::B.bits() || bit == Buttons::X.bits() || bit == Buttons::Y.bits() {
		Some(Section::ButtonDiamond)
	} else if bit == Buttons::LB.bits()
		|| bit == Buttons::RB.bits()
		|| bit == Buttons::START.bits()
		|| bit == Buttons::BACK.bits()
		|| bit == Buttons::LGRIP.bits()
		|| bit == Buttons::RGRIP.bits()
		|| bit == Buttons::STEAM.bits()
	{
		Some(Section::Switch)
	} else {
		None
	}
}

fn bits_for_section(section: Section) -> &'static [u32] {
	const DIAMOND: [u32; 4] = [Buttons::A.bits(), Buttons::B.bits(), Buttons::X.bits(), Buttons::Y.bits()];
	const SWITCH: [u32; 7] = [
		Buttons::LB.bits(),
		Buttons::RB.bits(),
		Buttons::START.bits(),
		Buttons::BACK.bits(),
		Buttons::LGRIP.bits(),
		Buttons::RGRIP.bits(),
		Buttons::STEAM.bits(),
	];
	match section {
		Section::ButtonDiamond => &DIAMOND,
		Section::Switch => &SWITCH,
		_ => &[],
	}
}

impl EventMapper {
	pub fn new(tables: BindingTables, gamepad: Box<dyn Sink>, keyboard: Box<dyn Sink>, mouse: Box<dyn Sink>) -> Self {
		EventMapper {
			tables,
			gamepad: Some(gamepad),
			keyboard: Some(keyboard),
			mouse: Some(mouse),
			prev_report: Report::default(),
			last_tick: Instant::now(),
			dt: 1.0 / 125.0,
			on_keys: HashSet::new(),
			on_abs: HashMap::new(),
			dirty: HashSet::new(),
			pad_x_queue: [VecDeque::with_capacity(PAD_QUEUE_CAP), VecDeque::with_capacity(PAD_QUEUE_CAP)],
			pad_y_queue: [VecDeque::with_capacity(PAD_QUEUE_CAP), VecDeque::with_capacity(PAD_QUEUE_CAP)],
			pad_prev_mean: [(0, 0); 2],
			pad_move_accum: [0.0; 2],
			trig_latch: [None, None],
			stick_latch: [None; 4],
			steam_press_time: None,
			shifted: HashSet::new(),
			pending_commands: Vec::new(),
			exit_requested: false,
		}
	}

	pub fn exit_requested(&self) -> bool {
		self.exit_requested
	}

	/// Process one decoded report (spec.md §4.6): strict order is button
	/// diff, STEAM long-press check, pad processing (both pads), stick
	/// processing, trigger processing (both triggers), then one `syn()` per
	/// sink touched this tick.
	///
	/// Per spec.md §8 invariant 1, reports whose `status` isn't `Input`
	/// (including the all-zero default before the first real report)
	/// produce no events at all.
	pub fn process(&mut self, session: &mut ControllerSession, report: Report) {
		if report.status != Status::Input {
			return;
		}

		let now = Instant::now();
		self.dt = now.duration_since(self.last_tick).as_secs_f32().max(1.0 / 250.0);
		self.last_tick = now;

		let prev = self.prev_report;
		self.dirty.clear();

		self.button_diff(prev, report);
		self.check_steam_long_press(session, report);

		if !self.exit_requested {
			pad::process_pad(self, Pos::Left, prev, report);
			pad::process_pad(self, Pos::Right, prev, report);
			stick::process_stick(self, prev, report);
			trigger::process_trigger(self, Pos::Left, prev, report);
			trigger::process_trigger(self, Pos::Right, prev, report);
		}

		for command in self.pending_commands.drain(..) {
			session.enqueue(command);
		}

		self.sync_dirty_sinks();
		self.prev_report = report;
	}

	/// spec.md §4.6.1.
	fn button_diff(&mut self, prev: Report, cur: Report) {
		let xor = prev.buttons.bits() ^ cur.buttons.bits();
		let added = xor & cur.buttons.bits();
		let removed = xor & prev.buttons.bits();

		for bit in MAPPED_BITS {
			if added & bit != 0 {
				self.on_button_edge(bit, true, cur);
			} else if removed & bit != 0 {
				self.on_button_edge(bit, false, cur);
			}
		}
	}

	fn on_button_edge(&mut self, bit: u32, pressed: bool, cur: Report) {
		if bit == Buttons::STEAM.bits() {
			self.steam_press_time = if pressed { Some(Instant::now()) } else { None };
		}

		let Some(binding) = self.effective_button_binding(bit) else {
			return;
		};

		match binding {
			Binding::ModeShift(sections) => self.apply_modeshift(&sections, pressed, cur),
			other => self.apply_binding(&other, pressed),
		}
	}

	/// spec.md §4.6.2.
	fn check_steam_long_press(&mut self, session: &mut ControllerSession, cur: Report) {
		if !cur.buttons.contains(Buttons::STEAM) {
			return;
		}
		let Some(pressed_at) = self.steam_press_time else {
			return;
		};
		if pressed_at.elapsed() >= STEAM_LONG_PRESS {
			tracing::info!("STEAM held for 2s, exiting");
			self.destroy_sinks();
			session.enqueue(Command::Exit);
			self.exit_requested = true;
		}
	}

	fn destroy_sinks(&mut self) {
		self.gamepad = None;
		self.keyboard = None;
		self.mouse = None;
	}

	/// Borrow whichever boxed sink `kind` names, if it's still alive (spec.md
	/// §4.6.2: the STEAM long-press gesture drops all three).
	pub(super) fn sink_mut(&mut self, kind: SinkKind) -> Option<&mut dyn Sink> {
		match kind {
			SinkKind::Gamepad => self.gamepad.as_deref_mut(),
			SinkKind::Keyboard => self.keyboard.as_deref_mut(),
			SinkKind::Mouse => self.mouse.as_deref_mut(),
		}
	}

	pub(super) fn dt(&self) -> f32 {
		self.dt
	}

	pub(super) fn mark_dirty(&mut self, kind: SinkKind) {
		self.dirty.insert(kind);
	}

	/// spec.md §4.6.7: reconfigure the listed sections to their modeshift
	/// table (`active = true`) or revert to the active table (`active =
	/// false`). For `button_diamond`/`switch`, any bit in the section that
	/// is currently held is immediately re-resolved against the new table so
	/// the overlay takes effect without waiting for the next press; bindings
	/// that happen to be identical across both tables produce no events.
	fn apply_modeshift(&mut self, sections: &[Section], active: bool, cur: Report) {
		for &section in sections {
			match section {
				Section::ButtonDiamond | Section::Switch => {
					let bits = bits_for_section(section);
					let olds: Vec<(u32, Option<Binding>)> =
						bits.iter().map(|&bit| (bit, self.effective_button_binding(bit))).collect();

					if active {
						self.shifted.insert(section);
					} else {
						self.shifted.remove(&section);
					}

					for (bit, old) in olds {
						if cur.buttons.bits() & bit == 0 {
							continue;
						}
						let new = self.effective_button_binding(bit);
						if old == new {
							continue;
						}
						if let Some(ob) = old {
							if !matches!(ob, Binding::ModeShift(_)) {
								self.apply_binding(&ob, false);
							}
						}
						if let Some(nb) = new {
							if !matches!(nb, Binding::ModeShift(_)) {
								self.apply_binding(&nb, true);
							}
						}
					}
				},
				_ => {
					if active {
						self.shifted.insert(section);
					} else {
						self.shifted.remove(&section);
					}
					// Pad/stick/trigger sections re-evaluate their effective
					// config every tick, so no immediate reapplication is
					// needed here.
				},
			}
		}
	}

	fn effective_button_binding(&self, bit: u32) -> Option<Binding> {
		if let Some(section) = bit_section(bit) {
			if self.shifted.contains(&section) {
				return match self.tables.modeshift.get(&section) {
					Some(SectionShift::Buttons(map)) => map.get(&bit).cloned(),
					_ => None,
				};
			}
		}
		self.tables.btn_map.get(&bit).cloned()
	}

	fn effective_pad_cfg(&self, pos: Pos) -> crate::profile::PadConfig {
		let section = match pos {
			Pos::Left => Section::LeftTrackpad,
			Pos::Right => Section::RightTrackpad,
		};
		if self.shifted.contains(&section) {
			if let Some(SectionShift::Pad(cfg)) = self.tables.modeshift.get(&section) {
				return cfg.clone();
			}
		}
		self.tables.pad_cfg[pos as usize].clone()
	}

	fn effective_stick_cfg(&self) -> crate::profile::StickConfig {
		if self.shifted.contains(&Section::Joystick) {
			if let Some(SectionShift::Stick(cfg)) = self.tables.modeshift.get(&Section::Joystick) {
				return cfg.clone();
			}
		}
		self.tables.stick_cfg.clone()
	}

	fn effective_trig_cfg(&self, pos: Pos) -> crate::profile::TrigConfig {
		let section = match pos {
			Pos::Left => Section::LeftTrigger,
			Pos::Right => Section::RightTrigger,
		};
		if self.shifted.contains(&section) {
			if let Some(SectionShift::Trig(cfg)) = self.tables.modeshift.get(&section) {
				return cfg.clone();
			}
		}
		self.tables.trig_cfg[pos as usize].clone()
	}

	/// Dispatch a resolved binding's press/release (spec.md §3.3): `Key`
	/// always targets the gamepad sink's joystick code space (spec.md §6's
	/// "+0x100" rule), `MouseButton` the mouse sink. `ModeShift` and `None`
	/// are handled by the caller and are no-ops here.
	fn apply_binding(&mut self, binding: &Binding, pressed: bool) {
		match binding {
			Binding::Key(code) => {
				if pressed {
					self.key_pressed(SinkKind::Gamepad, *code);
				} else {
					self.key_released(SinkKind::Gamepad, *code);
				}
			},
			Binding::MouseButton(code) => {
				if pressed {
					self.key_pressed(SinkKind::Mouse, *code);
				} else {
					self.key_released(SinkKind::Mouse, *code);
				}
			},
			Binding::ModeShift(_) | Binding::None => {},
		}
	}

	fn key_pressed(&mut self, sink: SinkKind, code: u16) {
		if self.on_keys.insert((sink, code)) {
			self.emit_key(sink, code, 1);
			self.dirty.insert(sink);
		}
	}

	fn key_released(&mut self, sink: SinkKind, code: u16) {
		if self.on_keys.remove(&(sink, code)) {
			self.emit_key(sink, code, 0);
			self.dirty.insert(sink);
		}
	}

	fn emit_key(&mut self, sink: SinkKind, code: u16, value: i32) {
		if let Some(s) = self.sink_mut(sink) {
			s.key_event(code, value);
		}
	}

	/// Write an absolute axis value, de-duplicated against the last value
	/// written to `(sink, axis)` (spec.md §3.5 `on_abs`).
	pub(super) fn axis_write(&mut self, sink: SinkKind, axis: Axis, value: i32) {
		let key = (sink, axis);
		if self.on_abs.get(&key) == Some(&value) {
			return;
		}
		self.on_abs.insert(key, value);
		if let Some(s) = self.sink_mut(sink) {
			s.axis_event(axis, value);
		}
		self.dirty.insert(sink);
	}

	pub(super) fn schedule_pulse(&mut self, pos: Pos) {
		let position = match pos {
			Pos::Left => HapticPosition::Left,
			Pos::Right => HapticPosition::Right,
		};
		self.pending_commands.push(Command::Haptic(HapticPulse {
			position,
			amplitude: DEFAULT_PULSE_AMPLITUDE,
			period: DEFAULT_PULSE_PERIOD,
			count: DEFAULT_PULSE_COUNT,
		}));
	}

	/// spec.md §4.6.6: every sink touched this tick gets exactly one
	/// `syn()`; sinks untouched this tick get none.
	fn sync_dirty_sinks(&mut self) {
		let dirty: Vec<SinkKind> = self.dirty.drain().collect();
		for kind in dirty {
			let result = self.sink_mut(kind).map(|s| s.syn());
			if let Some(Err(e)) = result {
				tracing::warn!("failed to flush {kind:?} events: {e}");
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mapper::fake::{FakeGamepad, FakeMouse};
	use crate::profile::PadConfig;

	fn mapper_with_tables(tables: BindingTables) -> EventMapper {
		EventMapper::new(
			tables,
			Box::new(FakeGamepad::new()),
			Box::new(FakeGamepad::new()),
			Box::new(FakeMouse::new()),
		)
	}

	#[test]
	fn bit_section_classifies_diamond_and_switch() {
		assert_eq!(bit_section(Buttons::A.bits()), Some(Section::ButtonDiamond));
		assert_eq!(bit_section(Buttons::RGRIP.bits()), Some(Section::Switch));
		assert_eq!(bit_section(Buttons::LPAD.bits()), None);
	}

	#[test]
	fn effective_pad_cfg_falls_back_to_active_when_not_shifted() {
		let mut tables = BindingTables::default();
		tables.pad_cfg[Pos::Left as usize].mode = crate::profile::PadMode::Mouse;
		let shifted_cfg = PadConfig {
			mode: crate::profile::PadMode::MouseScroll,
			..Default::default()
		};
		tables.modeshift.insert(Section::LeftTrackpad, SectionShift::Pad(shifted_cfg));
		let mapper = mapper_with_tables(tables);

		assert_eq!(mapper.effective_pad_cfg(Pos::Left).mode, crate::profile::PadMode::Mouse);
	}

	#[test]
	fn effective_pad_cfg_uses_overlay_once_shifted() {
		let mut tables = BindingTables::default();
		tables.pad_cfg[Pos::Left as usize].mode = crate::profile::PadMode::Mouse;
		let shifted_cfg = PadConfig {
			mode: crate::profile::PadMode::MouseScroll,
			..Default::default()
		};
		tables.modeshift.insert(Section::LeftTrackpad, SectionShift::Pad(shifted_cfg));
		let mut mapper = mapper_with_tables(tables);
		mapper.shifted.insert(Section::LeftTrackpad);

		assert_eq!(mapper.effective_pad_cfg(Pos::Left).mode, crate::profile::PadMode::MouseScroll);
	}

	#[test]
	fn button_diff_dispatches_press_and_release_to_gamepad() {
		let mut tables = BindingTables::default();
		tables.btn_map.insert(Buttons::A.bits(), Binding::Key(0x100));
		let mut mapper = mapper_with_tables(tables);

		let mut prev = Report::default();
		prev.status = Status::Input;
		let mut pressed = prev;
		pressed.buttons = Buttons::A;

		mapper.button_diff(prev, pressed);
		assert!(mapper.on_keys.contains(&(SinkKind::Gamepad, 0x100)));

		mapper.button_diff(pressed, prev);
		assert!(!mapper.on_keys.contains(&(SinkKind::Gamepad, 0x100)));
	}

	#[test]
	fn destroy_sinks_drops_all_three() {
		// `check_steam_long_press` needs a live `ControllerSession` to
		// enqueue the exit command, which unit tests can't construct
		// without real USB access; exercise the sink teardown it performs
		// directly instead.
		let mut mapper = mapper_with_tables(BindingTables::default());
		assert!(mapper.gamepad.is_some());
		mapper.destroy_sinks();
		assert!(mapper.gamepad.is_none());
		assert!(mapper.keyboard.is_none());
		assert!(mapper.mouse.is_none());
	}
}
