#![cfg(target_os = "windows")]
//! Windows HIDP capability queries.
//!
//! The capability blob ("preparsed data") is owned by [`PreparsedData`]
//! and freed on drop, so every early return releases it. Only the top-level
//! `HIDP_CAPS` is read here: usage page/usage for enumeration and the three
//! report byte lengths a session caches.
//!
//! ## Dependencies
//! Requires `windows-sys` with the HID feature (see Cargo.toml).

use core::mem::MaybeUninit;

use windows_sys::Win32::Devices::HumanInterfaceDevice::{
    HidD_FreePreparsedData, HidD_GetPreparsedData, HidP_GetCaps, HIDP_CAPS,
    HIDP_STATUS_SUCCESS, PHIDP_PREPARSED_DATA,
};
use windows_sys::Win32::Foundation::{HANDLE, NTSTATUS};

use crate::device::Capabilities;
use crate::error::OsError;

const STATUS_SUCCESS: NTSTATUS = HIDP_STATUS_SUCCESS; // alias for clarity

/// Owned `PHIDP_PREPARSED_DATA`.
pub struct PreparsedData(PHIDP_PREPARSED_DATA);

impl PreparsedData {
    /// Fetch the preparsed data for an open HID handle.
    ///
    /// ### Errors
    /// Returns the `GetLastError()` value if `HidD_GetPreparsedData` fails.
    pub fn from_handle(handle: HANDLE) -> Result<Self, OsError> {
        let mut ppd: PHIDP_PREPARSED_DATA = 0;
        let ok = unsafe { HidD_GetPreparsedData(handle, &mut ppd) };
        if ok == 0 || ppd == 0 {
            return Err(super::last_os_error());
        }
        Ok(Self(ppd))
    }

    /// Top-level caps from `HidP_GetCaps`.
    pub fn caps(&self) -> Result<Capabilities, OsError> {
        let mut caps = MaybeUninit::<HIDP_CAPS>::uninit();
        let status = unsafe { HidP_GetCaps(self.0, caps.as_mut_ptr()) };
        if status != STATUS_SUCCESS {
            // NTSTATUS, not a Win32 code; FormatMessage has nothing for it.
            return Err(OsError::new(
                status as u32,
                format!("HidP_GetCaps failed with status 0x{:08x}", status as u32),
            ));
        }
        let caps = unsafe { caps.assume_init() };
        Ok(Capabilities {
            usage_page: caps.UsagePage,
            usage: caps.Usage,
            input_report_len: caps.InputReportByteLength,
            output_report_len: caps.OutputReportByteLength,
            feature_report_len: caps.FeatureReportByteLength,
        })
    }
}

impl Drop for PreparsedData {
    fn drop(&mut self) {
        if self.0 != 0 {
            unsafe { HidD_FreePreparsedData(self.0) };
            self.0 = 0;
        }
    }
}

/// Convenience: fetch preparsed data, read caps, free the data.
pub fn query_capabilities(handle: HANDLE) -> Result<Capabilities, OsError> {
    PreparsedData::from_handle(handle)?.caps()
}
