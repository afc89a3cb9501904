//! Key-name normalization and the joystick code-space offset (spec.md §6, §9).

use evdev::Key;

/// Normalize a VDF binding token's key name to the base name used to look up
/// `KEY_<name>` (spec.md §6): `*_ARROW` suffixes and underscores stripped,
/// and a handful of renamed synonyms.
pub fn normalize_key_name(raw: &str) -> String {
	let upper = raw.to_uppercase();
	let stripped = upper.strip_suffix("_ARROW").unwrap_or(&upper);
	let squashed = stripped.replace('_', "");
	match squashed.as_str() {
		"PERIOD" => "DOT".to_string(),
		"ESCAPE" => "ESC".to_string(),
		"DASH" => "MINUS".to_string(),
		"EQUALS" => "EQUAL".to_string(),
		other => other.to_string(),
	}
}

/// Stands in for the build-time table spec.md §9 says should be generated
/// from the kernel header; this covers the names that appear in community
/// Steam Controller profiles.
pub(crate) const KEY_TABLE: &[(&str, Key)] = &[
	("A", Key::KEY_A),
	("B", Key::KEY_B),
	("C", Key::KEY_C),
	("D", Key::KEY_D),
	("E", Key::KEY_E),
	("F", Key::KEY_F),
	("G", Key::KEY_G),
	("H", Key::KEY_H),
	("I", Key::KEY_I),
	("J", Key::KEY_J),
	("K", Key::KEY_K),
	("L", Key::KEY_L),
	("M", Key::KEY_M),
	("N", Key::KEY_N),
	("O", Key::KEY_O),
	("P", Key::KEY_P),
	("Q", Key::KEY_Q),
	("R", Key::KEY_R),
	("S", Key::KEY_S),
	("T", Key::KEY_T),
	("U", Key::KEY_U),
	("V", Key::KEY_V),
	("W", Key::KEY_W),
	("X", Key::KEY_X),
	("Y", Key::KEY_Y),
	("Z", Key::KEY_Z),
	("0", Key::KEY_0),
	("1", Key::KEY_1),
	("2", Key::KEY_2),
	("3", Key::KEY_3),
	("4", Key::KEY_4),
	("5", Key::KEY_5),
	("6", Key::KEY_6),
	("7", Key::KEY_7),
	("8", Key::KEY_8),
	("9", Key::KEY_9),
	("UP", Key::KEY_UP),
	("DOWN", Key::KEY_DOWN),
	("LEFT", Key::KEY_LEFT),
	("RIGHT", Key::KEY_RIGHT),
	("SPACE", Key::KEY_SPACE),
	("ENTER", Key::KEY_ENTER),
	("TAB", Key::KEY_TAB),
	("ESC", Key::KEY_ESC),
	("BACKSPACE", Key::KEY_BACKSPACE),
	("DELETE", Key::KEY_DELETE),
	("INSERT", Key::KEY_INSERT),
	("HOME", Key::KEY_HOME),
	("END", Key::KEY_END),
	("PAGEUP", Key::KEY_PAGEUP),
	("PAGEDOWN", Key::KEY_PAGEDOWN),
	("LEFTSHIFT", Key::KEY_LEFTSHIFT),
	("RIGHTSHIFT", Key::KEY_RIGHTSHIFT),
	("LEFTCONTROL", Key::KEY_LEFTCTRL),
	("RIGHTCONTROL", Key::KEY_RIGHTCTRL),
	("LEFTALT", Key::KEY_LEFTALT),
	("RIGHTALT", Key::KEY_RIGHTALT),
	("LEFTMETA", Key::KEY_LEFTMETA),
	("RIGHTMETA", Key::KEY_RIGHTMETA),
	("CAPSLOCK", Key::KEY_CAPSLOCK),
	("MINUS", Key::KEY_MINUS),
	("EQUAL", Key::KEY_EQUAL),
	("DOT", Key::KEY_DOT),
	("COMMA", Key::KEY_COMMA),
	("SLASH", Key::KEY_SLASH),
	("SEMICOLON", Key::KEY_SEMICOLON),
	("APOSTROPHE", Key::KEY_APOSTROPHE),
	("GRAVE", Key::KEY_GRAVE),
	("LEFTBRACE", Key::KEY_LEFTBRACE),
	("RIGHTBRACE", Key::KEY_RIGHTBRACE),
	("BACKSLASH", Key::KEY_BACKSLASH),
	("F1", Key::KEY_F1),
	("F2", Key::KEY_F2),
	("F3", Key::KEY_F3),
	("F4", Key::KEY_F4),
	("F5", Key::KEY_F5),
	("F6", Key::KEY_F6),
	("F7", Key::KEY_F7),
	("F8", Key::KEY_F8),
	("F9", Key::KEY_F9),
	("F10", Key::KEY_F10),
	("F11", Key::KEY_F11),
	("F12", Key::KEY_F12),
];

/// Look up a normalized name's kernel key code.
pub fn keycode_for_name(name: &str) -> Option<Key> {
	KEY_TABLE.iter().find(|(n, _)| *n == name).map(|(_, k)| *k)
}

/// The code space the gamepad sink advertises for `key_press` bindings
/// (spec.md §6: "plus 0x100, so the virtual input layer classifies the
/// device as a joystick rather than a keyboard"). Every `KEY_TABLE` code
/// plus this base still sits below `KEY_MAX` (0x2ff), so the offset code is
/// advertised and emitted directly — there's no need to fold it onto a
/// fixed `BTN_TRIGGER_HAPPY` slot.
pub const JOYSTICK_CODE_BASE: u16 = 0x100;

/// Compile-time code emitted for a `key_press` binding's evdev key, per the
/// §6 offset rule: `KEY_<name> + 0x100`, unique per table entry.
pub fn joystick_code(key: Key) -> u16 {
	key.code() + JOYSTICK_CODE_BASE
}

/// The offset codes the gamepad sink advertises, one per `KEY_TABLE` entry.
pub fn joystick_codes() -> impl Iterator<Item = Key> {
	KEY_TABLE.iter().map(|(_, k)| Key::new(joystick_code(*k)))
}

/// Inverse of [`joystick_code`]: the evdev key a gamepad sink actually
/// advertises for a given offset code, or `None` if `code` isn't a known
/// table entry's offset.
pub fn joystick_key(code: u16) -> Option<Key> {
	if code < JOYSTICK_CODE_BASE {
		return None;
	}
	let raw = code - JOYSTICK_CODE_BASE;
	KEY_TABLE.iter().find(|(_, k)| k.code() == raw).map(|_| Key::new(code))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_arrow_suffix_and_underscores() {
		assert_eq!(normalize_key_name("LEFT_ARROW"), "LEFT");
		assert_eq!(normalize_key_name("PAGE_UP"), "PAGEUP");
	}

	#[test]
	fn renames_synonyms() {
		assert_eq!(normalize_key_name("PERIOD"), "DOT");
		assert_eq!(normalize_key_name("ESCAPE"), "ESC");
		assert_eq!(normalize_key_name("DASH"), "MINUS");
		assert_eq!(normalize_key_name("EQUALS"), "EQUAL");
	}

	#[test]
	fn joystick_code_round_trips_through_key_table() {
		let key = keycode_for_name("A").unwrap();
		let code = joystick_code(key);
		assert!(code >= JOYSTICK_CODE_BASE);
		assert!(joystick_key(code).is_some());
	}
}
