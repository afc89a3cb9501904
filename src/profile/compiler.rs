//! Binding compiler (spec.md §4.5): turns a parsed VDF tree into
//! [`BindingTables`].

use std::collections::HashMap;

use crate::report::Buttons;
use crate::sink::{gamepad, keycode, mouse, Axis};
use crate::vdf::{Node, Value};

use super::{
	Binding, BindingTables, CompileError, PadConfig, PadMode, Pos, Section, SectionShift, StickConfig, StickMode,
	TrigConfig, TrigMode,
};

/// Compile `root` (the parsed profile document) into the tables the event
/// mapper consumes. All-or-nothing: any recognized-but-malformed section
/// fails the whole compile (spec.md §7: "no partial profile is ever
/// applied").
pub fn compile(root: &Node) -> Result<BindingTables, CompileError> {
	let mappings = root
		.get_dict("controller_mappings")
		.ok_or_else(|| CompileError::MissingSection("controller_mappings".to_string()))?;

	let preset = mappings
		.get_dict("preset")
		.ok_or_else(|| CompileError::MissingSection("controller_mappings.preset".to_string()))?;
	let source_bindings = preset
		.get_dict("group_source_bindings")
		.ok_or_else(|| CompileError::MissingSection("controller_mappings.preset.group_source_bindings".to_string()))?;

	// Step 1: invert id -> source into source -> id.
	let mut source_to_id: HashMap<String, String> = HashMap::new();
	for (id, value) in source_bindings.iter() {
		if let Some(source) = value.as_str() {
			source_to_id.insert(source.to_string(), id.clone());
		}
	}

	let groups = collect_groups(mappings)?;

	let mut tables = BindingTables::default();

	for section in Section::ALL {
		let active_tag = format!("{} active", section.name());
		let Some(group_id) = source_to_id.get(&active_tag) else {
			continue;
		};
		let Some(group) = groups.get(group_id) else {
			continue;
		};
		apply_section(&mut tables, section, group)?;

		// spec.md §4.5 point 2: if a `modeshift` group exists for this
		// section, compile it too, into the overlay table §4.6.7 installs
		// while the owning `ModeShift` binding is held.
		let shift_tag = format!("{} active modeshift", section.name());
		if let Some(shift_id) = source_to_id.get(&shift_tag) {
			if let Some(shift_group) = groups.get(shift_id) {
				let shift = compile_section_shift(section, shift_group)?;
				tables.modeshift.insert(section, shift);
			}
		}
	}

	Ok(tables)
}

fn compile_section_shift(section: Section, group: &Node) -> Result<SectionShift, CompileError> {
	let mode = group.get_str("mode").unwrap_or("");
	Ok(match section {
		Section::LeftTrackpad | Section::RightTrackpad => {
			let mut cfg = PadConfig::default();
			fill_pad(&mut cfg, mode, group)?;
			SectionShift::Pad(cfg)
		},
		Section::Joystick => {
			let mut cfg = StickConfig::default();
			fill_stick(&mut cfg, mode, group)?;
			SectionShift::Stick(cfg)
		},
		Section::LeftTrigger | Section::RightTrigger => {
			let mut cfg = TrigConfig::default();
			fill_trigger(&mut cfg, mode, group)?;
			SectionShift::Trig(cfg)
		},
		Section::ButtonDiamond => {
			let mut map = HashMap::new();
			fill_diamond(&mut map, group)?;
			SectionShift::Buttons(map)
		},
		Section::Switch => {
			let mut map = HashMap::new();
			fill_switch(&mut map, group)?;
			SectionShift::Buttons(map)
		},
	})
}

fn collect_groups(mappings: &Node) -> Result<HashMap<String, &Node>, CompileError> {
	let mut groups = HashMap::new();
	for group in mappings.get_all("group") {
		let Some(group) = group.as_dict() else {
			return Err(CompileError::MalformedTree("group entry is not a block".to_string()));
		};
		let id = group
			.get_str("id")
			.ok_or_else(|| CompileError::MalformedTree("group missing id".to_string()))?;
		groups.insert(id.to_string(), group);
	}
	Ok(groups)
}

fn apply_section(tables: &mut BindingTables, section: Section, group: &Node) -> Result<(), CompileError> {
	let mode = group.get_str("mode").unwrap_or("");

	match section {
		Section::LeftTrackpad => fill_pad(&mut tables.pad_cfg[Pos::Left as usize], mode, group)?,
		Section::RightTrackpad => fill_pad(&mut tables.pad_cfg[Pos::Right as usize], mode, group)?,
		Section::Joystick => fill_stick(&mut tables.stick_cfg, mode, group)?,
		Section::LeftTrigger => fill_trigger(&mut tables.trig_cfg[Pos::Left as usize], mode, group)?,
		Section::RightTrigger => fill_trigger(&mut tables.trig_cfg[Pos::Right as usize], mode, group)?,
		Section::ButtonDiamond => fill_diamond(&mut tables.btn_map, group)?,
		Section::Switch => fill_switch(&mut tables.btn_map, group)?,
	}
	Ok(())
}

fn fill_pad(cfg: &mut PadConfig, mode: &str, group: &Node) -> Result<(), CompileError> {
	cfg.deadzone = group
		.get_str("deadzone")
		.and_then(|s| s.parse::<f32>().ok())
		.unwrap_or(super::DEFAULT_DEADZONE);

	match mode {
		"absolute_mouse" => cfg.mode = PadMode::Mouse,
		"mouse_region" => cfg.mode = PadMode::NoAction, // reserved, spec.md §4.5.
		"scrollwheel" => cfg.mode = PadMode::MouseScroll,
		"mouse_joystick" => {
			cfg.mode = PadMode::Axis;
			cfg.axes = Some((Axis::Hat0X, Axis::Hat0Y));
		},
		"dpad" => {
			cfg.mode = PadMode::ButtonClick;
			cfg.events = cardinal_bindings(group, "dpad")?;
		},
		"four_buttons" => {
			cfg.mode = PadMode::ButtonClick;
			cfg.events = cardinal_bindings(group, "button")?;
		},
		_ => cfg.mode = PadMode::NoAction,
	}
	Ok(())
}

fn fill_stick(cfg: &mut StickConfig, mode: &str, group: &Node) -> Result<(), CompileError> {
	match mode {
		"joystick_mouse" => {
			cfg.mode = StickMode::Axis;
			cfg.axes = Some((Axis::X, Axis::Y));
		},
		"scrollwheel" => cfg.mode = StickMode::NoAction,
		"dpad" => {
			cfg.mode = StickMode::Button;
			cfg.events = cardinal_bindings(group, "dpad")?;
		},
		"buttons" => {
			cfg.mode = StickMode::Button;
			cfg.events = cardinal_bindings(group, "button")?;
		},
		_ => cfg.mode = StickMode::NoAction,
	}
	Ok(())
}

fn fill_trigger(cfg: &mut TrigConfig, mode: &str, group: &Node) -> Result<(), CompileError> {
	match mode {
		"trigger" => {
			cfg.mode = TrigMode::Button;
			let inputs = group
				.get_dict("inputs")
				.ok_or_else(|| CompileError::MalformedTree("trigger group missing inputs".to_string()))?;
			cfg.binding = first_binding(inputs, "click")?.unwrap_or(Binding::None);
		},
		_ => cfg.mode = TrigMode::NoAction,
	}
	Ok(())
}

/// Face-button cluster: A/B/X/Y (spec.md §3.2's `A,B,X,Y` bits).
fn fill_diamond(map: &mut HashMap<u32, Binding>, group: &Node) -> Result<(), CompileError> {
	let inputs = group
		.get_dict("inputs")
		.ok_or_else(|| CompileError::MalformedTree("button_diamond group missing inputs".to_string()))?;
	for (bit, name) in [
		(Buttons::A.bits(), "button_a"),
		(Buttons::B.bits(), "button_b"),
		(Buttons::X.bits(), "button_x"),
		(Buttons::Y.bits(), "button_y"),
	] {
		if let Some(binding) = first_binding(inputs, name)? {
			map.insert(bit, binding);
		}
	}
	Ok(())
}

/// Shoulder/grip/start/select cluster (spec.md §3.2).
fn fill_switch(map: &mut HashMap<u32, Binding>, group: &Node) -> Result<(), CompileError> {
	let inputs = group
		.get_dict("inputs")
		.ok_or_else(|| CompileError::MalformedTree("switch group missing inputs".to_string()))?;
	for (bit, name) in [
		(Buttons::LB.bits(), "left_bumper"),
		(Buttons::RB.bits(), "right_bumper"),
		(Buttons::START.bits(), "button_start"),
		(Buttons::BACK.bits(), "button_back"),
		(Buttons::LGRIP.bits(), "left_grip"),
		(Buttons::RGRIP.bits(), "right_grip"),
		(Buttons::STEAM.bits(), "button_home"),
	] {
		if let Some(binding) = first_binding(inputs, name)? {
			map.insert(bit, binding);
		}
	}
	Ok(())
}

/// Read the four cardinal-direction bindings out of `inputs`, in
/// `[top, left, bottom, right]` order (spec.md §4.6.3's 4-binding layout).
fn cardinal_bindings(group: &Node, prefix: &str) -> Result<Vec<Binding>, CompileError> {
	let inputs = group
		.get_dict("inputs")
		.ok_or_else(|| CompileError::MalformedTree("group missing inputs".to_string()))?;
	let mut bindings = Vec::with_capacity(4);
	for suffix in ["north", "west", "south", "east"] {
		let name = format!("{prefix}_{suffix}");
		bindings.push(first_binding(inputs, &name)?.unwrap_or(Binding::None));
	}
	Ok(bindings)
}

/// Resolve the first (or, for `mode_shift`, only) activator binding bound to
/// `input_name` (spec.md §4.5 steps 4 and its tie-break rule).
fn first_binding(inputs: &Node, input_name: &str) -> Result<Option<Binding>, CompileError> {
	let Some(input) = inputs.get_dict(input_name) else {
		return Ok(None);
	};
	let activators = input
		.get_dict("activators")
		.ok_or_else(|| CompileError::MalformedTree(format!("input {input_name} missing activators")))?;
	let Some(full_press) = activators.get_dict("Full_Press") else {
		return Ok(None);
	};
	let bindings_block = full_press
		.get_dict("bindings")
		.ok_or_else(|| CompileError::MalformedTree(format!("input {input_name} missing bindings")))?;

	let tokens: Vec<&str> = bindings_block.get_all("binding").filter_map(Value::as_str).collect();
	if tokens.is_empty() {
		return Ok(None);
	}

	// mode_shift activators take every argument; everything else takes only
	// element 0 (spec.md §4.5's tie-break rule).
	if tokens[0].starts_with("mode_shift") {
		let sections = tokens
			.iter()
			.flat_map(|t| t.split_whitespace().skip(1))
			.filter_map(Section::from_name)
			.collect();
		return Ok(Some(Binding::ModeShift(sections)));
	}

	parse_binding_token(tokens[0]).map(Some)
}

fn parse_binding_token(token: &str) -> Result<Binding, CompileError> {
	let mut parts = token.split_whitespace();
	let kind = parts.next().unwrap_or("");
	let arg = parts.next().unwrap_or("");

	match kind {
		"key_press" => {
			let name = keycode::normalize_key_name(arg);
			match keycode::keycode_for_name(&name) {
				Some(key) => Ok(bind_key(key)),
				// Unknown tokens resolve to unbound, logged at info level by the caller.
				None => Ok(Binding::None),
			}
		},
		"mouse_button" => match mouse_button_code(arg) {
			Some(code) => Ok(Binding::MouseButton(code)),
			None => Ok(Binding::None),
		},
		"mouse_wheel" => Ok(Binding::None), // reserved, spec.md §9.
		_ => Ok(Binding::None),
	}
}

/// A `key_press` binding lands on the gamepad sink's joystick code space
/// (spec.md §6's "+0x100" rule) rather than the keyboard, matching
/// `original_source`'s diamond/grip bindings being joystick buttons by
/// convention.
fn bind_key(key: evdev::Key) -> Binding {
	Binding::Key(keycode::joystick_code(key))
}

fn mouse_button_code(name: &str) -> Option<u16> {
	let key = match name.to_uppercase().as_str() {
		"LEFT" => evdev::Key::BTN_LEFT,
		"RIGHT" => evdev::Key::BTN_RIGHT,
		"MIDDLE" => evdev::Key::BTN_MIDDLE,
		"SIDE" => evdev::Key::BTN_SIDE,
		"EXTRA" => evdev::Key::BTN_EXTRA,
		_ => return None,
	};
	Some(key.code())
}

/// Verify every resolved code in `tables` is claimed by exactly one of the
/// three static sinks (spec.md §4.1's construction contract /
/// `SinkBindingFailed`).
pub fn validate_bindings(tables: &BindingTables) -> Result<(), CompileError> {
	let mut check = |binding: &Binding| -> Result<(), CompileError> {
		match binding {
			Binding::Key(code) => {
				if !gamepad::manages_key(*code) {
					return Err(CompileError::UnboundCode(format!("key 0x{code:x}")));
				}
			},
			Binding::MouseButton(code) => {
				if !mouse::manages_key(*code) {
					return Err(CompileError::UnboundCode(format!("mouse button 0x{code:x}")));
				}
			},
			Binding::ModeShift(_) | Binding::None => {},
		}
		Ok(())
	};

	for binding in tables.btn_map.values() {
		check(binding)?;
	}
	for pad in &tables.pad_cfg {
		for binding in &pad.events {
			check(binding)?;
		}
	}
	for binding in &tables.stick_cfg.events {
		check(binding)?;
	}
	for trig in &tables.trig_cfg {
		check(&trig.binding)?;
	}
	for shift in tables.modeshift.values() {
		match shift {
			SectionShift::Pad(cfg) => {
				for binding in &cfg.events {
					check(binding)?;
				}
			},
			SectionShift::Stick(cfg) => {
				for binding in &cfg.events {
					check(binding)?;
				}
			},
			SectionShift::Trig(cfg) => check(&cfg.binding)?,
			SectionShift::Buttons(map) => {
				for binding in map.values() {
					check(binding)?;
				}
			},
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::vdf;

	fn four_buttons_doc() -> &'static str {
		r#"
		"controller_mappings"
		{
			"group"
			{
				"id" "1"
				"mode" "four_buttons"
				"inputs"
				{
					"button_north" { "activators" { "Full_Press" { "bindings" { "binding" "key_press UP" } } } }
					"button_west"  { "activators" { "Full_Press" { "bindings" { "binding" "key_press LEFT" } } } }
					"button_south" { "activators" { "Full_Press" { "bindings" { "binding" "key_press DOWN" } } } }
					"button_east"  { "activators" { "Full_Press" { "bindings" { "binding" "key_press RIGHT" } } } }
				}
			}
			"preset"
			{
				"group_source_bindings"
				{
					"1" "left_trackpad active"
				}
			}
		}
		"#
	}

	#[test]
	fn compiles_four_buttons_pad_mode() {
		let tree = vdf::parse(four_buttons_doc()).unwrap();
		let tables = compile(&tree).unwrap();
		assert_eq!(tables.pad_cfg[Pos::Left as usize].mode, PadMode::ButtonClick);
		assert_eq!(tables.pad_cfg[Pos::Left as usize].events.len(), 4);
		assert!(validate_bindings(&tables).is_ok());
	}

	#[test]
	fn missing_controller_mappings_is_an_error() {
		let tree = vdf::parse(r#""foo" "bar""#).unwrap();
		assert!(matches!(compile(&tree), Err(CompileError::MissingSection(_))));
	}

	#[test]
	fn unknown_token_resolves_to_unbound() {
		let binding = parse_binding_token("frobnicate X").unwrap();
		assert_eq!(binding, Binding::None);
	}

	#[test]
	fn mode_shift_collects_all_arguments() {
		let doc = r#"
		"controller_mappings"
		{
			"group"
			{
				"id" "1"
				"mode" "four_buttons"
				"inputs"
				{
					"button_north"
					{
						"activators"
						{
							"Full_Press"
							{
								"bindings"
								{
									"binding" "mode_shift button_diamond"
									"binding" "mode_shift switch"
								}
							}
						}
					}
				}
			}
			"preset" { "group_source_bindings" { "1" "left_trackpad active" } }
		}
		"#;
		let tree = vdf::parse(doc).unwrap();
		let tables = compile(&tree).unwrap();
		let binding = &tables.pad_cfg[Pos::Left as usize].events[0];
		assert_eq!(
			*binding,
			Binding::ModeShift(vec![Section::ButtonDiamond, Section::Switch])
		);
	}

	#[test]
	fn compiles_a_modeshift_overlay_for_its_section() {
		let doc = r#"
		"controller_mappings"
		{
			"group"
			{
				"id" "1"
				"mode" "four_buttons"
				"inputs"
				{
					"button_north" { "activators" { "Full_Press" { "bindings" { "binding" "key_press UP" } } } }
				}
			}
			"group"
			{
				"id" "2"
				"mode" "absolute_mouse"
			}
			"preset"
			{
				"group_source_bindings"
				{
					"1" "left_trackpad active"
					"2" "left_trackpad active modeshift"
				}
			}
		}
		"#;
		let tree = vdf::parse(doc).unwrap();
		let tables = compile(&tree).unwrap();
		match tables.modeshift.get(&Section::LeftTrackpad) {
			Some(SectionShift::Pad(cfg)) => assert_eq!(cfg.mode, PadMode::Mouse),
			other => panic!("expected a compiled pad overlay, got {other:?}"),
		}
	}
}
