//! Platform seam.
//!
//! The enumerator and the session are written against two traits that stand
//! in for the operating system:
//!
//! - [`Platform`]: the device-class enumeration service (which interface paths
//!   exist) and the ability to open one of them.
//! - [`DeviceHandle`]: one open interface. It answers attribute, capability and
//!   string queries, and exposes the asynchronous I/O primitive as
//!   submit / poll / wait / cancel.
//!
//! The native Windows implementation lives in
//! [`backends::windows`](crate::backends). Tests drive the same code through an
//! in-memory platform.
//!
//! ## I/O contract
//! A handle has at most one request in flight. The caller always resolves a
//! submitted request with [`DeviceHandle::wait`], or with
//! [`DeviceHandle::poll`] followed by [`DeviceHandle::cancel`], before the next
//! [`DeviceHandle::submit`]. The handle owns the transfer buffer for the
//! duration of the request, so nothing borrowed from the caller has to outlive
//! the call that submitted it.

use crate::error::OsError;

/// Vendor/product/revision attributes of an interface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Device release number (bcdDevice on USB).
    pub version_number: u16,
}

/// Top-level capabilities reported by the capability-parsing service.
///
/// Report lengths include the report-number byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub usage_page: u16,
    pub usage: u16,
    pub input_report_len: u16,
    pub output_report_len: u16,
    pub feature_report_len: u16,
}

/// Which device string to query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StringKind {
    Manufacturer,
    Product,
    SerialNumber,
    /// A string descriptor by USB string index.
    Indexed(u32),
}

/// One asynchronous request.
#[derive(Clone, Copy, Debug)]
pub enum Request<'a> {
    /// Write an output report (first byte is the report number).
    Write(&'a [u8]),
    /// Read up to this many bytes of one input report.
    Read(usize),
    /// Send a feature report; the data is both the input and output buffer
    /// of the control operation.
    SetFeature(&'a [u8]),
    /// Fetch a feature report. The slice is the request buffer (report number
    /// in byte 0); its length is the most the device may return.
    GetFeature(&'a [u8]),
}

impl Request<'_> {
    /// Stable operation name used in error context and logs.
    pub fn op_name(&self) -> &'static str {
        match self {
            Request::Write(_) => "WriteFile",
            Request::Read(_) => "ReadFile",
            Request::SetFeature(_) => "IOCTL_HID_SET_FEATURE",
            Request::GetFeature(_) => "IOCTL_HID_GET_FEATURE",
        }
    }
}

/// An open device interface.
pub trait DeviceHandle {
    fn attributes(&self) -> Result<Attributes, OsError>;

    /// Query the capability blob and return its top-level caps. Any resource
    /// acquired for the query is released before returning.
    fn capabilities(&self) -> Result<Capabilities, OsError>;

    /// Fill `buf` with a NUL-terminated UTF-16 string. The contents past the
    /// terminator are unspecified; the value may be truncated to fit.
    fn string(&self, kind: StringKind, buf: &mut [u16]) -> Result<(), OsError>;

    /// Start `request`. A request that completes immediately is still
    /// resolved through [`wait`](Self::wait).
    fn submit(&mut self, request: Request<'_>) -> Result<(), OsError>;

    /// Zero-wait completion check of the request in flight.
    fn poll(&mut self) -> Result<bool, OsError>;

    /// Block until the request in flight completes. Bytes produced by a
    /// `Read`/`GetFeature` are copied into `out` (at most `out.len()`); the
    /// returned value is the OS-reported transfer count.
    fn wait(&mut self, out: &mut [u8]) -> Result<usize, OsError>;

    /// Cancel the request in flight and wait for the cancellation to settle.
    fn cancel(&mut self) -> Result<(), OsError>;
}

/// The host's HID class.
pub trait Platform {
    type Handle: DeviceHandle;

    /// Interface paths of every present HID-class interface, in the order the
    /// OS reports them. Interfaces whose path cannot be retrieved are left out.
    fn interface_paths(&self) -> Vec<String>;

    /// Open `path` for reading and writing with asynchronous I/O enabled.
    fn open(&self, path: &str) -> Result<Self::Handle, OsError>;
}
