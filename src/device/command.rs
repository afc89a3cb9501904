//! Control-endpoint command encoding (spec.md §6), grounded on
//! `original_source/src/__init__.py`'s `addExit`/`addFeedback` and the two
//! vendor init frames.

/// Every control transfer payload is zero-padded to this length.
pub const PAYLOAD_LEN: usize = 64;

/// Disables the controller's built-in lizard-mode mouse/keyboard emulation.
const DISABLE_LIZARD: [u32; 1] = [0x8100_0000];

/// Disables the controller's haptic auto-feedback. The later of the two
/// firmware variants documented in spec.md §9 (`0x0030_0000`, not
/// `0x0030_1400`) is used, per the spec's stated choice.
const DISABLE_HAPTIC_AUTO_FEEDBACK: [u32; 6] = [
	0x8715_3284,
	0x0318_0000,
	0x3102_0008,
	0x0700_0707,
	0x0030_0000,
	0x2f01_0000,
];

const EXIT: [u32; 2] = [0x9f04_6f66, 0x6621_0000];

fn words_to_payload(words: &[u32]) -> [u8; PAYLOAD_LEN] {
	let mut buf = [0u8; PAYLOAD_LEN];
	for (i, word) in words.iter().enumerate() {
		buf[i * 4..i * 4 + 4].copy_from_slice(&word.to_be_bytes());
	}
	buf
}

pub fn disable_lizard_mode() -> [u8; PAYLOAD_LEN] {
	words_to_payload(&DISABLE_LIZARD)
}

pub fn disable_haptic_auto_feedback() -> [u8; PAYLOAD_LEN] {
	words_to_payload(&DISABLE_HAPTIC_AUTO_FEEDBACK)
}

pub fn exit_frame() -> [u8; PAYLOAD_LEN] {
	words_to_payload(&EXIT)
}

/// Which pad a haptic pulse targets (spec.md §6: `0=R, 1=L`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticPosition {
	Right = 0,
	Left = 1,
}

/// A single-shot haptic pulse (spec.md §6, §4.6.3): `<BBBHHH>` packed
/// little-endian, matching `original_source/src/__init__.py`'s `addFeedback`.
#[derive(Debug, Clone, Copy)]
pub struct HapticPulse {
	pub position: HapticPosition,
	pub amplitude: u16,
	pub period: u16,
	pub count: u16,
}

impl HapticPulse {
	pub fn to_payload(self) -> [u8; PAYLOAD_LEN] {
		let mut buf = [0u8; PAYLOAD_LEN];
		buf[0] = 0x8f;
		buf[1] = 0x07;
		buf[2] = self.position as u8;
		buf[3..5].copy_from_slice(&self.amplitude.to_le_bytes());
		buf[5..7].copy_from_slice(&self.period.to_le_bytes());
		buf[7..9].copy_from_slice(&self.count.to_le_bytes());
		buf
	}
}

/// A pending command on the session's outbound queue (spec.md §4.4): the
/// haptic pulse and the sentinel exit command share one queue, matching
/// `original_source/src/__init__.py`'s single `_cmsg` list.
#[derive(Debug, Clone, Copy)]
pub enum Command {
	Haptic(HapticPulse),
	Exit,
}

impl Command {
	pub fn to_payload(self) -> [u8; PAYLOAD_LEN] {
		match self {
			Command::Haptic(pulse) => pulse.to_payload(),
			Command::Exit => exit_frame(),
		}
	}
}
