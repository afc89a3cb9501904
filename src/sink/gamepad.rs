//! Virtual Xbox-360-style gamepad (spec.md §6).

use evdev::{
	uinput::{VirtualDevice, VirtualDeviceBuilder},
	AbsInfo, AbsoluteAxisType, AttributeSet, InputId, Key, UinputAbsSetup,
};

use super::keycode::{joystick_codes, joystick_key, JOYSTICK_CODE_BASE};
use super::{Axis, Sink, SinkError, SinkKind};

/// The 11 standard gamepad buttons the default mapping advertises (spec.md §6).
const BUTTONS: [Key; 11] = [
	Key::BTN_SOUTH,
	Key::BTN_EAST,
	Key::BTN_WEST,
	Key::BTN_NORTH,
	Key::BTN_TL,
	Key::BTN_TR,
	Key::BTN_THUMBL,
	Key::BTN_THUMBR,
	Key::BTN_START,
	Key::BTN_SELECT,
	Key::BTN_MODE,
];

/// Whether the gamepad sink claims `code`, independent of any constructed
/// device — used by the binding compiler to route codes without needing a
/// live `/dev/uinput` handle (spec.md §4.1's construction contract).
pub fn manages_key(code: u16) -> bool {
	if code >= JOYSTICK_CODE_BASE {
		return joystick_key(code).is_some();
	}
	BUTTONS.iter().any(|k| k.code() == code)
}

fn axis_type(axis: Axis) -> AbsoluteAxisType {
	match axis {
		Axis::X => AbsoluteAxisType::ABS_X,
		Axis::Y => AbsoluteAxisType::ABS_Y,
		Axis::RX => AbsoluteAxisType::ABS_RX,
		Axis::RY => AbsoluteAxisType::ABS_RY,
		Axis::Z => AbsoluteAxisType::ABS_Z,
		Axis::RZ => AbsoluteAxisType::ABS_RZ,
		Axis::Hat0X => AbsoluteAxisType::ABS_HAT0X,
		Axis::Hat0Y => AbsoluteAxisType::ABS_HAT0Y,
	}
}

pub struct Gamepad {
	device: VirtualDevice,
	pending: Vec<evdev::InputEvent>,
}

impl Gamepad {
	/// Build the virtual device with the literal identity and axis ranges
	/// from spec.md §6: vendor 0x045E, product 0x028E, "Microsoft X-Box 360
	/// pad"; sticks ±32768 fuzz 16 flat 128, triggers 0..255, hat ±1.
	pub fn new() -> Result<Self, SinkError> {
		let mut buttons = AttributeSet::new();
		for key in BUTTONS {
			buttons.insert(key);
		}
		for key in joystick_codes() {
			buttons.insert(key);
		}

		let device = VirtualDeviceBuilder::new()
			.map_err(|e| SinkError::Build(e.to_string()))?
			.input_id(InputId::new(evdev::BusType::BUS_USB, 0x045E, 0x028E, 0x0110))
			.name("Microsoft X-Box 360 pad")
			.with_keys(&buttons)
			.map_err(|e| SinkError::Build(e.to_string()))?
			.with_absolute_axis(&UinputAbsSetup::new(
				AbsoluteAxisType::ABS_X,
				AbsInfo::new(0, i16::MIN as i32, i16::MAX as i32, 16, 128, 0),
			))
			.map_err(|e| SinkError::Build(e.to_string()))?
			.with_absolute_axis(&UinputAbsSetup::new(
				AbsoluteAxisType::ABS_Y,
				AbsInfo::new(0, i16::MIN as i32, i16::MAX as i32, 16, 128, 0),
			))
			.map_err(|e| SinkError::Build(e.to_string()))?
			.with_absolute_axis(&UinputAbsSetup::new(
				AbsoluteAxisType::ABS_RX,
				AbsInfo::new(0, i16::MIN as i32, i16::MAX as i32, 16, 128, 0),
			))
			.map_err(|e| SinkError::Build(e.to_string()))?
			.with_absolute_axis(&UinputAbsSetup::new(
				AbsoluteAxisType::ABS_RY,
				AbsInfo::new(0, i16::MIN as i32, i16::MAX as i32, 16, 128, 0),
			))
			.map_err(|e| SinkError::Build(e.to_string()))?
			.with_absolute_axis(&UinputAbsSetup::new(
				AbsoluteAxisType::ABS_Z,
				AbsInfo::new(0, 0, u8::MAX as i32, 0, 0, 0),
			))
			.map_err(|e| SinkError::Build(e.to_string()))?
			.with_absolute_axis(&UinputAbsSetup::new(
				AbsoluteAxisType::ABS_RZ,
				AbsInfo::new(0, 0, u8::MAX as i32, 0, 0, 0),
			))
			.map_err(|e| SinkError::Build(e.to_string()))?
			.with_absolute_axis(&UinputAbsSetup::new(
				AbsoluteAxisType::ABS_HAT0X,
				AbsInfo::new(0, -1, 1, 0, 0, 0),
			))
			.map_err(|e| SinkError::Build(e.to_string()))?
			.with_absolute_axis(&UinputAbsSetup::new(
				AbsoluteAxisType::ABS_HAT0Y,
				AbsInfo::new(0, -1, 1, 0, 0, 0),
			))
			.map_err(|e| SinkError::Build(e.to_string()))?
			.build()
			.map_err(|e| SinkError::Build(e.to_string()))?;

		Ok(Self {
			device,
			pending: Vec::new(),
		})
	}
}

impl Sink for Gamepad {
	fn kind(&self) -> SinkKind {
		SinkKind::Gamepad
	}

	fn key_event(&mut self, code: u16, value: i32) {
		if code >= JOYSTICK_CODE_BASE {
			if joystick_key(code).is_none() {
				return;
			}
		}
		self.pending
			.push(evdev::InputEvent::new_now(evdev::EventType::KEY, code, value));
	}

	fn axis_event(&mut self, axis: Axis, value: i32) {
		self.pending
			.push(evdev::InputEvent::new_now(evdev::EventType::ABSOLUTE, axis_type(axis).0, value));
	}

	fn rel_event(&mut self, _axis: super::RelAxis, _delta: i32) {
		// The gamepad sink advertises no relative axes; callers route
		// relative motion to the mouse sink instead.
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

	fn manages_axis(&self, axis: Axis) -> bool {
		matches!(
			axis,
			Axis::X | Axis::Y | Axis::RX | Axis::RY | Axis::Z | Axis::RZ | Axis::Hat0X | Axis::Hat0Y
		)
	}
}
