#![cfg(target_os = "windows")]

//! Native Windows backend.
//!
//! - **hid_discovery**: SetupAPI walk of the HID interface class
//! - **hidp_parser**: preparsed data → `HIDP_CAPS` (usage + report lengths)
//! - **hid_device**: overlapped handle implementing [`DeviceHandle`](crate::device::DeviceHandle)
//!
//! `hid.dll` and `setupapi.dll` entry points are bound at link time through
//! `windows-sys`. The HID class GUID is fetched from `HidD_GetHidGuid` once per
//! process.
//!
//! Most users want the free functions here ([`enumerate`], [`open`],
//! [`open_path`]) rather than the [`WindowsHid`] platform type itself.

pub mod hid_device;
pub mod hid_discovery;
pub mod hidp_parser;

use windows_sys::Win32::Foundation::GetLastError;
use windows_sys::Win32::System::Diagnostics::Debug::{
    FormatMessageW, FORMAT_MESSAGE_FROM_SYSTEM, FORMAT_MESSAGE_IGNORE_INSERTS,
};

pub use hid_device::WinHidHandle;

use crate::device::Platform;
use crate::discovery::{self, CandidateReport};
use crate::error::{HidResult, OsError};
use crate::error_context::single_line;
use crate::metadata::DeviceList;
use crate::session::Session;

/// A session on the native Windows backend.
pub type WinSession = Session<WinHidHandle>;

/// The host's HID class as seen through SetupAPI and `hid.dll`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsHid;

impl Platform for WindowsHid {
    type Handle = WinHidHandle;

    fn interface_paths(&self) -> Vec<String> {
        hid_discovery::interface_paths()
    }

    fn open(&self, path: &str) -> Result<WinHidHandle, OsError> {
        WinHidHandle::open(path)
    }
}

pub fn enumerate(vendor_id: u16, product_id: u16) -> DeviceList {
    discovery::enumerate(&WindowsHid, vendor_id, product_id)
}

pub fn enumerate_with_report(
    vendor_id: u16,
    product_id: u16,
) -> (DeviceList, Vec<CandidateReport>) {
    discovery::enumerate_with_report(&WindowsHid, vendor_id, product_id)
}

pub fn open(vendor_id: u16, product_id: u16, serial_number: Option<&str>) -> HidResult<WinSession> {
    Session::open(&WindowsHid, vendor_id, product_id, serial_number)
}

pub fn open_path(path: &str) -> HidResult<WinSession> {
    Session::open_path(&WindowsHid, path)
}

/// Capture `GetLastError()` with its system message.
pub(crate) fn last_os_error() -> OsError {
    let code = unsafe { GetLastError() };
    os_error(code)
}

/// Format a Win32 error code with `FormatMessageW`, reduced to one line.
pub(crate) fn os_error(code: u32) -> OsError {
    let mut buf = [0u16; 512];
    let len = unsafe {
        FormatMessageW(
            FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
            std::ptr::null(),
            code,
            0, // MAKELANGID(LANG_NEUTRAL, SUBLANG_DEFAULT)
            buf.as_mut_ptr(),
            buf.len() as u32,
            std::ptr::null(),
        )
    } as usize;

    let message = if len == 0 {
        format!("unknown error 0x{code:08x}")
    } else {
        let text = String::from_utf16_lossy(&buf[..len.min(buf.len())]);
        single_line(&text).to_owned()
    };
    OsError::new(code, message)
}
