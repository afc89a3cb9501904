//! Decoding of the 64-byte HID input report emitted by the controller (spec.md §3.1, §4.3).

use bitflags::bitflags;
use thiserror::Error;

/// Status byte of a decoded report (spec.md §3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
	Input,
	Hotplug,
	Idle,
	/// A status byte the driver doesn't recognize. Carried through so the
	/// session can log it, but the mapper never sees these (spec.md §4.3).
	Unknown(u8),
}

impl From<u8> for Status {
	fn from(value: u8) -> Self {
		match value {
			0x01 => Status::Input,
			0x03 => Status::Hotplug,
			0x04 => Status::Idle,
			other => Status::Unknown(other),
		}
	}
}

bitflags! {
	/// Button bitfield (spec.md §3.2). All bits not named here are reserved
	/// and are masked off by `Report::decode`.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct Buttons: u32 {
		const RPAD_TOUCH = 0x1000_0000;
		const LPAD_TOUCH = 0x0800_0000;
		const RPAD       = 0x0400_0000;
		const LPAD       = 0x0200_0000;
		const RGRIP      = 0x0100_0000;
		const LGRIP      = 0x0080_0000;
		const START      = 0x0040_0000;
		const STEAM      = 0x0020_0000;
		const BACK       = 0x0010_0000;
		const A          = 0x0000_8000;
		const X          = 0x0000_4000;
		const B          = 0x0000_2000;
		const Y          = 0x0000_1000;
		const LB         = 0x0000_0800;
		const RB         = 0x0000_0400;
		const LT         = 0x0000_0200;
		const RT         = 0x0000_0100;
	}
}

/// All bits the controller is known to assert. Used to mask reserved bits
/// off on decode (spec.md §3.2: "All other bits are reserved and must be
/// masked off before comparisons").
const KNOWN_BUTTON_MASK: u32 = Buttons::all().bits();

/// A decoded 64-byte controller report (spec.md §3.1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
	pub status: Status,
	pub seq: u16,
	pub buttons: Buttons,
	pub ltrig: u8,
	pub rtrig: u8,
	/// Stick position when `LPAD_TOUCH` is clear, pad contact position when
	/// it is set (spec.md §3.1 invariant).
	pub lpad_x: i16,
	pub lpad_y: i16,
	pub rpad_x: i16,
	pub rpad_y: i16,
	pub gpitch: i16,
	pub groll: i16,
	pub gyaw: i16,
	pub q1: i16,
	pub q2: i16,
	pub q3: i16,
	pub q4: i16,
}

impl Default for Report {
	/// The all-zero report, used to seed `EventMapper`'s `prev_report` (spec.md §3.5).
	fn default() -> Self {
		Report {
			status: Status::Unknown(0),
			seq: 0,
			buttons: Buttons::empty(),
			ltrig: 0,
			rtrig: 0,
			lpad_x: 0,
			lpad_y: 0,
			rpad_x: 0,
			rpad_y: 0,
			gpitch: 0,
			groll: 0,
			gyaw: 0,
			q1: 0,
			q2: 0,
			q3: 0,
			q4: 0,
		}
	}
}

#[derive(Error, Debug)]
pub enum DecodeError {
	#[error("expected a 64-byte report, got {got} bytes")]
	TooShort { got: usize },
}

const REPORT_LEN: usize = 64;

impl Report {
	/// Decode a fixed 64-byte little-endian HID report (spec.md §3.1, §4.3).
	///
	/// Unrecognised `status` values decode successfully to
	/// `Status::Unknown(raw)` rather than erroring — only a buffer of the
	/// wrong length is a decode error.
	pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
		if buf.len() != REPORT_LEN {
			return Err(DecodeError::TooShort { got: buf.len() });
		}

		let status = Status::from(buf[2]);
		let seq = u16::from_le_bytes([buf[4], buf[5]]);
		let raw_buttons = u32::from_le_bytes([buf[7], buf[8], buf[9], buf[10]]);
		let buttons = Buttons::from_bits_truncate(raw_buttons & KNOWN_BUTTON_MASK);
		let ltrig = buf[11];
		let rtrig = buf[12];
		let lpad_x = i16::from_le_bytes([buf[16], buf[17]]);
		let lpad_y = i16::from_le_bytes([buf[18], buf[19]]);
		let rpad_x = i16::from_le_bytes([buf[20], buf[21]]);
		let rpad_y = i16::from_le_bytes([buf[22], buf[23]]);
		let gpitch = i16::from_le_bytes([buf[34], buf[35]]);
		let groll = i16::from_le_bytes([buf[36], buf[37]]);
		let gyaw = i16::from_le_bytes([buf[38], buf[39]]);
		let q1 = i16::from_le_bytes([buf[40], buf[41]]);
		let q2 = i16::from_le_bytes([buf[42], buf[43]]);
		let q3 = i16::from_le_bytes([buf[44], buf[45]]);
		let q4 = i16::from_le_bytes([buf[46], buf[47]]);

		Ok(Report {
			status,
			seq,
			buttons,
			ltrig,
			rtrig,
			lpad_x,
			lpad_y,
			rpad_x,
			rpad_y,
			gpitch,
			groll,
			gyaw,
			q1,
			q2,
			q3,
			q4,
		})
	}

	/// Re-encode a decoded report back into 64 raw bytes, for the round-trip
	/// property in spec.md §8 (reserved fields are zeroed).
	#[cfg(test)]
	pub fn encode(&self) -> [u8; REPORT_LEN] {
		let mut buf = [0u8; REPORT_LEN];
		buf[2] = match self.status {
			Status::Input => 0x01,
			Status::Hotplug => 0x03,
			Status::Idle => 0x04,
			Status::Unknown(v) => v,
		};
		buf[4..6].copy_from_slice(&self.seq.to_le_bytes());
		buf[7..11].copy_from_slice(&self.buttons.bits().to_le_bytes());
		buf[11] = self.ltrig;
		buf[12] = self.rtrig;
		buf[16..18].copy_from_slice(&self.lpad_x.to_le_bytes());
		buf[18..20].copy_from_slice(&self.lpad_y.to_le_bytes());
		buf[20..22].copy_from_slice(&self.rpad_x.to_le_bytes());
		buf[22..24].copy_from_slice(&self.rpad_y.to_le_bytes());
		buf[34..36].copy_from_slice(&self.gpitch.to_le_bytes());
		buf[36..38].copy_from_slice(&self.groll.to_le_bytes());
		buf[38..40].copy_from_slice(&self.gyaw.to_le_bytes());
		buf[40..42].copy_from_slice(&self.q1.to_le_bytes());
		buf[42..44].copy_from_slice(&self.q2.to_le_bytes());
		buf[44..46].copy_from_slice(&self.q3.to_le_bytes());
		buf[46..48].copy_from_slice(&self.q4.to_le_bytes());
		buf
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decode_rejects_wrong_length() {
		assert!(matches!(
			Report::decode(&[0u8; 63]),
			Err(DecodeError::TooShort { got: 63 })
		));
	}

	#[test]
	fn decode_classifies_status() {
		let mut buf = [0u8; REPORT_LEN];
		buf[2] = 0x01;
		assert_eq!(Report::decode(&buf).unwrap().status, Status::Input);
		buf[2] = 0x04;
		assert_eq!(Report::decode(&buf).unwrap().status, Status::Idle);
		buf[2] = 0xAA;
		assert_eq!(Report::decode(&buf).unwrap().status, Status::Unknown(0xAA));
	}

	#[test]
	fn decode_masks_reserved_button_bits() {
		let mut buf = [0u8; REPORT_LEN];
		// A (0x8000) plus a reserved bit (0x0000_0001) packed little-endian.
		let raw: u32 = 0x0000_8000 | 0x0000_0001;
		buf[7..11].copy_from_slice(&raw.to_le_bytes());
		let report = Report::decode(&buf).unwrap();
		assert_eq!(report.buttons, Buttons::A);
	}

	#[test]
	fn encode_decode_round_trips_on_zeroed_reserved_fields() {
		let mut buf = [0u8; REPORT_LEN];
		buf[2] = 0x01;
		buf[4..6].copy_from_slice(&42u16.to_le_bytes());
		buf[7..11].copy_from_slice(&Buttons::A.bits().to_le_bytes());
		buf[16..18].copy_from_slice(&100i16.to_le_bytes());

		let report = Report::decode(&buf).unwrap();
		assert_eq!(report.encode(), buf);
	}

	#[test]
	fn lpad_touch_bit_disambiguates_stick_vs_pad() {
		let mut buf = [0u8; REPORT_LEN];
		buf[2] = 0x01;
		buf[16..18].copy_from_slice(&1000i16.to_le_bytes());
		let report = Report::decode(&buf).unwrap();
		assert!(!report.buttons.contains(Buttons::LPAD_TOUCH));
		assert_eq!(report.lpad_x, 1000);
	}
}
