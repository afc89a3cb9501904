//! Parsed and compiled binding profile (spec.md §3.3, §3.4, §3.6, §4.5, §6).

mod compiler;

pub use compiler::{compile, validate_bindings};

use crate::sink::Axis;
use thiserror::Error;

/// A compiled binding value (spec.md §3.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
	/// A keyboard/gamepad key code, offset into the joystick code space by
	/// the binding compiler when it targets the gamepad sink (spec.md §6).
	Key(u16),
	/// A mouse button code.
	MouseButton(u16),
	/// A momentary overlay: while held, the listed sections switch to their
	/// `modeshift` table (spec.md §4.6.7).
	ModeShift(Vec<Section>),
	/// Unbound — observably identical to no binding at all.
	None,
}

impl Default for Binding {
	fn default() -> Self {
		Binding::None
	}
}

/// A binding group tag (spec.md §3.3, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
	LeftTrackpad,
	RightTrackpad,
	Joystick,
	ButtonDiamond,
	Switch,
	LeftTrigger,
	RightTrigger,
}

impl Section {
	pub fn name(self) -> &'static str {
		match self {
			Section::LeftTrackpad => "left_trackpad",
			Section::RightTrackpad => "right_trackpad",
			Section::Joystick => "joystick",
			Section::ButtonDiamond => "button_diamond",
			Section::Switch => "switch",
			Section::LeftTrigger => "left_trigger",
			Section::RightTrigger => "right_trigger",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Some(match name {
			"left_trackpad" => Section::LeftTrackpad,
			"right_trackpad" => Section::RightTrackpad,
			"joystick" => Section::Joystick,
			"button_diamond" => Section::ButtonDiamond,
			"switch" => Section::Switch,
			"left_trigger" => Section::LeftTrigger,
			"right_trigger" => Section::RightTrigger,
			_ => return None,
		})
	}

	pub const ALL: [Section; 7] = [
		Section::LeftTrackpad,
		Section::RightTrackpad,
		Section::Joystick,
		Section::ButtonDiamond,
		Section::Switch,
		Section::LeftTrigger,
		Section::RightTrigger,
	];
}

/// Pad mode dispatch (spec.md §3.4, §4.5, §4.6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadMode {
	NoAction,
	Axis,
	Mouse,
	MouseScroll,
	ButtonTouch,
	ButtonClick,
}

/// Stick mode dispatch (spec.md §3.4, §4.6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickMode {
	NoAction,
	Axis,
	Button,
}

/// Trigger mode dispatch (spec.md §3.4, §4.6.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrigMode {
	NoAction,
	Axis,
	Button,
}

/// Left/right position, used to index the two-pad and two-trigger arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pos {
	Left = 0,
	Right = 1,
}

/// Deadzone fraction default (spec.md §4.6.3): 0.6 of full scale.
pub const DEFAULT_DEADZONE: f32 = 0.6;

#[derive(Debug, Clone)]
pub struct PadConfig {
	pub mode: PadMode,
	pub deadzone: f32,
	/// Activator-derived bindings: length 4 (cardinal layout) for
	/// `ButtonClick`/`ButtonTouch`, length 2 (axis-as-dpad) otherwise unused
	/// in this mode; empty when the mode doesn't consume them.
	pub events: Vec<Binding>,
	/// Fixed axis pair a pad's `Axis` mode targets (HAT axes per spec.md
	/// §4.5's `mouse_joystick → Axis` trackpad dispatch).
	pub axes: Option<(Axis, Axis)>,
	pub revert: bool,
}

impl Default for PadConfig {
	fn default() -> Self {
		PadConfig {
			mode: PadMode::NoAction,
			deadzone: DEFAULT_DEADZONE,
			events: Vec::new(),
			axes: None,
			revert: false,
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct TrigConfig {
	pub mode: TrigMode,
	pub binding: Binding,
	pub axis: Option<Axis>,
}

impl Default for TrigMode {
	fn default() -> Self {
		TrigMode::NoAction
	}
}

#[derive(Debug, Clone)]
pub struct StickConfig {
	pub mode: StickMode,
	pub events: Vec<Binding>,
	pub axes: Option<(Axis, Axis)>,
	pub revert: bool,
}

impl Default for StickConfig {
	fn default() -> Self {
		StickConfig {
			mode: StickMode::NoAction,
			events: Vec::new(),
			axes: None,
			revert: false,
		}
	}
}

/// One section's alternate table, installed while a `ModeShift` binding
/// naming that section is held (spec.md §4.6.7). Absent from the map when
/// the profile defines no `<section> active modeshift` group for it.
#[derive(Debug, Clone)]
pub enum SectionShift {
	Pad(PadConfig),
	Trig(TrigConfig),
	Stick(StickConfig),
	/// Covers `ButtonDiamond`/`Switch`: only the bits belonging to that
	/// section are present, so installing it overwrites just those entries
	/// in `btn_map`.
	Buttons(std::collections::HashMap<u32, Binding>),
}

/// The compiled event-mapper configuration (spec.md §3.6).
#[derive(Debug, Clone, Default)]
pub struct BindingTables {
	/// button bit (spec.md §3.2) → its binding. Only bits present here are
	/// dispatched by the mapper's button-diff step.
	pub btn_map: std::collections::HashMap<u32, Binding>,
	pub pad_cfg: [PadConfig; 2],
	pub trig_cfg: [TrigConfig; 2],
	pub stick_cfg: StickConfig,
	/// Per-section overlay tables (spec.md §4.5 point 2, §4.6.7).
	pub modeshift: std::collections::HashMap<Section, SectionShift>,
}

#[derive(Error, Debug)]
pub enum CompileError {
	#[error("binding code {0:?} is not claimed by any advertised sink")]
	UnboundCode(String),
	#[error("profile is missing required section: {0}")]
	MissingSection(String),
	#[error("profile tree is malformed: {0}")]
	MalformedTree(String),
}
