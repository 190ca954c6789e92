//! hidport: HID device-session layer.
//!
//! Discovers HID-class interfaces, opens a session on one, and exchanges
//! input, output and feature reports with it. Report contents are not
//! interpreted.
//!
//! - [`discovery`]: enumeration with a vendor/product filter → [`DeviceList`]
//! - [`session`]: open by path / identity / selector, blocking and non-blocking
//!   reads, writes, feature reports, per-session last error
//! - [`device`]: the [`Platform`] / [`DeviceHandle`] traits the OS sits behind
//! - [`backends`]: native implementations (Windows)
//!
//! ```no_run
//! # #[cfg(windows)]
//! # fn main() -> hidport::HidResult<()> {
//! use hidport::backends::windows;
//!
//! let mut session = windows::open(0x04d8, 0x003f, None)?;
//! session.write(&[0x00, 0x80])?;
//! let mut buf = [0u8; 65];
//! let n = session.read(&mut buf)?;
//! println!("{:02x?}", &buf[..n]);
//! # Ok(())
//! # }
//! # #[cfg(not(windows))]
//! # fn main() {}
//! ```

pub mod backends;
pub mod config;
pub mod device;
pub mod discovery;
pub mod error;
pub mod error_context;
pub mod metadata;
pub mod report;
pub mod session;

pub use config::{DeviceSelector, HidConfig, SessionConfig};
pub use device::{Attributes, Capabilities, DeviceHandle, Platform, Request, StringKind};
pub use discovery::{enumerate, enumerate_with_report, CandidateReport, DropStage};
pub use error::{HidError, HidResult, OsError};
pub use error_context::NO_ERROR;
pub use metadata::{free_enumeration, DeviceDescriptor, DeviceList};
pub use session::{close_session, Session};
