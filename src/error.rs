use thiserror::Error;

pub use crate::device::DeviceError;
pub use crate::profile::CompileError;
pub use crate::report::DecodeError;
pub use crate::sink::SinkError;
pub use crate::vdf::ParseError;

/// Top-level error type returned by `main`.
///
/// Each variant maps to one of the exit codes in spec.md §6: device errors
/// exit 2, profile errors (VDF parse or compile) exit 3, anything else
/// (daemon/IO) exits 1.
#[derive(Error, Debug)]
pub enum Error {
	#[error("controller device error: {0}")]
	Device(#[from] DeviceError),

	#[error("virtual input sink error: {0}")]
	Sink(#[from] SinkError),

	#[error("failed to parse profile: {0}")]
	ProfileParse(#[from] ParseError),

	#[error("failed to compile profile: {0}")]
	ProfileCompile(#[from] CompileError),

	#[error("daemon error: {0}")]
	Daemon(String),

	#[error("configuration error: {0}")]
	Config(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Process exit code per spec.md §6.
	pub fn exit_code(&self) -> i32 {
		match self {
			Error::Device(_) | Error::Sink(_) => 2,
			Error::ProfileParse(_) | Error::ProfileCompile(_) => 3,
			Error::Daemon(_) | Error::Config(_) | Error::Io(_) => 1,
		}
	}
}
