//! Virtual keyboard sink (spec.md §4.1, §6): the full key set, key/release
//! events only — no axes.

use evdev::{
	uinput::{VirtualDevice, VirtualDeviceBuilder},
	AttributeSet,
};

use super::keycode::KEY_TABLE;
use super::{Axis, RelAxis, Sink, SinkError, SinkKind};

pub struct Keyboard {
	device: VirtualDevice,
	pending: Vec<evdev::InputEvent>,
}

impl Keyboard {
	pub fn new() -> Result<Self, SinkError> {
		let mut keys = AttributeSet::new();
		for (_, key) in KEY_TABLE {
			keys.insert(*key);
		}

		let device = VirtualDeviceBuilder::new()
			.map_err(|e| SinkError::Build(e.to_string()))?
			.name("steamctld Keyboard")
			.with_keys(&keys)
			.map_err(|e| SinkError::Build(e.to_string()))?
			.build()
			.map_err(|e| SinkError::Build(e.to_string()))?;

		Ok(Self {
			device,
			pending: Vec::new(),
		})
	}
}

impl Sink for Keyboard {
	fn kind(&self) -> SinkKind {
		SinkKind::Keyboard
	}

	fn key_event(&mut self, code: u16, value: i32) {
		self.pending
			.push(evdev::InputEvent::new_now(evdev::EventType::KEY, code, value));
	}

	fn axis_event(&mut self, _axis: Axis, _value: i32) {
		// The keyboard sink advertises no absolute axes.
	}

	fn rel_event(&mut self, _axis: RelAxis, _delta: i32) {
		// The keyboard sink advertises no relative axes.
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
}

/// Whether the keyboard sink claims `code`, independent of any constructed
/// device (spec.md §4.1's construction contract).
pub fn manages_key(code: u16) -> bool {
	KEY_TABLE.iter().any(|(_, k)| k.code() == code)
}
