//! Device sessions.
//!
//! A [`Session`] owns one open handle to one HID interface. It is responsible for:
//! - opening by path, by vendor/product/serial, or by a configured selector
//! - caching the report lengths reported by the capability service at open time
//! - running every report operation through one submit → wait (or poll → cancel)
//!   helper
//! - recording each failure in the session's [`ErrorContext`]
//!
//! This module does **not** interpret report contents, retry failed operations,
//! or apply timeouts.
//!
//! ## Read semantics
//! - a read never asks for more than one input report (`input_report_len`)
//! - in non-blocking mode a read with nothing ready is cancelled and returns `Ok(0)`
//! - a leading `0x00` report number is stripped (see
//!   [`strip_report_number`](crate::report::strip_report_number))

use tracing::{debug, warn};

use crate::config::{DeviceSelector, SessionConfig};
use crate::device::{Capabilities, DeviceHandle, Platform, Request, StringKind};
use crate::discovery::enumerate;
use crate::error::{HidError, HidResult, OsError};
use crate::error_context::{ErrorContext, LastError};
use crate::report::{capped_read_len, decode_wide, strip_report_number, MAX_STRING_UNITS};

/// How a submitted request is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Completion {
    /// Wait until the OS reports completion.
    Block,
    /// Check once; cancel if not complete.
    PollOnce,
}

/// One open device interface.
pub struct Session<H: DeviceHandle> {
    handle: Option<H>,
    path: String,
    blocking: bool,
    caps: Capabilities,
    errors: ErrorContext,
}

impl<H: DeviceHandle> Session<H> {
    /// Open the interface at `path` (as produced by enumeration).
    pub fn open_path<P>(platform: &P, path: &str) -> HidResult<Self>
    where
        P: Platform<Handle = H>,
    {
        let handle = platform
            .open(path)
            .map_err(|source| HidError::Open { op: "CreateFile", source })?;

        // On failure `handle` is dropped here, which closes it.
        let caps = handle
            .capabilities()
            .map_err(|source| HidError::Open { op: "HidP_GetCaps", source })?;

        debug!(
            path,
            input_report_len = caps.input_report_len,
            output_report_len = caps.output_report_len,
            feature_report_len = caps.feature_report_len,
            "opened HID session"
        );

        Ok(Self {
            handle: Some(handle),
            path: path.to_owned(),
            blocking: true,
            caps,
            errors: ErrorContext::new(),
        })
    }

    /// Open the first enumerated interface with this identity.
    ///
    /// With `serial_number`, only an interface carrying exactly that serial is
    /// considered.
    pub fn open<P>(
        platform: &P,
        vendor_id: u16,
        product_id: u16,
        serial_number: Option<&str>,
    ) -> HidResult<Self>
    where
        P: Platform<Handle = H>,
    {
        let devices = enumerate(platform, vendor_id, product_id);
        let path = devices
            .find(vendor_id, product_id, serial_number)
            .and_then(|d| d.path.clone());
        devices.free_all();

        match path {
            Some(path) => Self::open_path(platform, &path),
            None => Err(HidError::DeviceNotFound {
                vendor_id,
                product_id,
                serial_number: serial_number.map(str::to_owned),
            }),
        }
    }

    /// Open through a [`DeviceSelector`] and apply the session defaults.
    pub fn open_selector<P>(
        platform: &P,
        selector: &DeviceSelector,
        config: &SessionConfig,
    ) -> HidResult<Self>
    where
        P: Platform<Handle = H>,
    {
        let mut session = match selector.path.as_deref() {
            Some(path) => Self::open_path(platform, path)?,
            None => Self::open(
                platform,
                selector.vendor_id,
                selector.product_id,
                selector.serial_number.as_deref(),
            )?,
        };
        session.set_nonblocking(config.nonblocking);
        Ok(session)
    }

    /// Write one output report. Always waits for completion.
    ///
    /// `data[0]` is the report number (`0x00` for devices without numbered
    /// reports). Returns the OS-reported byte count.
    pub fn write(&mut self, data: &[u8]) -> HidResult<usize> {
        self.transfer(Request::Write(data), &mut [], Completion::Block)
    }

    /// Read at most one input report into `buf`.
    ///
    /// Returns `Ok(0)` in non-blocking mode when no report is ready.
    pub fn read(&mut self, buf: &mut [u8]) -> HidResult<usize> {
        let len = capped_read_len(buf.len(), self.input_report_len());
        let completion = if self.blocking {
            Completion::Block
        } else {
            Completion::PollOnce
        };
        let out = &mut buf[..len];
        let n = self.transfer(Request::Read(len), out, completion)?;
        Ok(strip_report_number(out, n))
    }

    /// Switch read mode. Only affects subsequent [`read`](Self::read) calls.
    pub fn set_nonblocking(&mut self, nonblocking: bool) {
        self.blocking = !nonblocking;
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Send a feature report (`data[0]` is the report number).
    ///
    /// Returns `data.len()`: the control path does not report a usable count.
    pub fn send_feature_report(&mut self, data: &[u8]) -> HidResult<usize> {
        self.transfer(Request::SetFeature(data), &mut [], Completion::Block)?;
        Ok(data.len())
    }

    /// Fetch a feature report into `buf`; set `buf[0]` to the report number
    /// first.
    ///
    /// Returns the number of bytes the device delivered, at most `buf.len()`.
    pub fn get_feature_report(&mut self, buf: &mut [u8]) -> HidResult<usize> {
        let request = buf.to_vec();
        let n = self.transfer(Request::GetFeature(&request), buf, Completion::Block)?;
        Ok(n.min(buf.len()))
    }

    pub fn manufacturer_string(&mut self) -> HidResult<String> {
        self.query_string("HidD_GetManufacturerString", StringKind::Manufacturer)
    }

    pub fn product_string(&mut self) -> HidResult<String> {
        self.query_string("HidD_GetProductString", StringKind::Product)
    }

    pub fn serial_number_string(&mut self) -> HidResult<String> {
        self.query_string("HidD_GetSerialNumberString", StringKind::SerialNumber)
    }

    /// String descriptor by USB string index.
    pub fn indexed_string(&mut self, index: u32) -> HidResult<String> {
        self.query_string("HidD_GetIndexedString", StringKind::Indexed(index))
    }

    /// Most recent failure message, or [`NO_ERROR`](crate::error_context::NO_ERROR).
    pub fn last_error(&self) -> &str {
        self.errors.message()
    }

    /// Operation, code and message of the most recent failure.
    pub fn last_error_detail(&self) -> Option<&LastError> {
        self.errors.last()
    }

    /// Release the handle and the captured error. Calling it again is a no-op.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            drop(handle);
            debug!(path = %self.path, "closed HID session");
        }
        self.errors.clear();
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// The path this session was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn input_report_len(&self) -> usize {
        self.caps.input_report_len as usize
    }

    pub fn output_report_len(&self) -> usize {
        self.caps.output_report_len as usize
    }

    pub fn feature_report_len(&self) -> usize {
        self.caps.feature_report_len as usize
    }

    /// Submit `request` and resolve it.
    ///
    /// `Block` waits for completion. `PollOnce` checks once; if the request is
    /// still in flight it is cancelled and `Ok(0)` is returned. Every failure
    /// is recorded in the error context before it is returned.
    fn transfer(
        &mut self,
        request: Request<'_>,
        out: &mut [u8],
        completion: Completion,
    ) -> HidResult<usize> {
        let op = request.op_name();
        let handle = self.handle.as_mut().ok_or(HidError::Closed)?;

        match resolve(handle, request, out, completion) {
            Ok(Some(n)) => Ok(n),
            Ok(None) => Ok(0),
            Err(source) => {
                warn!(path = %self.path, op, error = %source, "HID transfer failed");
                self.errors.record(op, &source);
                Err(HidError::Io { op, source })
            }
        }
    }

    fn query_string(&mut self, op: &'static str, kind: StringKind) -> HidResult<String> {
        let handle = self.handle.as_ref().ok_or(HidError::Closed)?;
        let mut wstr = vec![0u16; MAX_STRING_UNITS];
        match handle.string(kind, &mut wstr) {
            Ok(()) => Ok(decode_wide(&mut wstr)),
            Err(source) => {
                self.errors.record(op, &source);
                Err(HidError::Io { op, source })
            }
        }
    }
}

/// Submit, then wait or poll once. `None` means the request was cancelled.
fn resolve<H: DeviceHandle>(
    handle: &mut H,
    request: Request<'_>,
    out: &mut [u8],
    completion: Completion,
) -> Result<Option<usize>, OsError> {
    handle.submit(request)?;
    if completion == Completion::PollOnce && !handle.poll()? {
        handle.cancel()?;
        return Ok(None);
    }
    handle.wait(out).map(Some)
}

impl<H: DeviceHandle> Drop for Session<H> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<H: DeviceHandle> std::fmt::Debug for Session<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("blocking", &self.blocking)
            .field("caps", &self.caps)
            .finish()
    }
}

/// Close a session that may be absent; `None` is a no-op.
pub fn close_session<H: DeviceHandle>(session: Option<Session<H>>) {
    if let Some(mut session) = session {
        session.close();
    }
}
