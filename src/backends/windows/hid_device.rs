#![cfg(target_os = "windows")]

//! Windows HID handle.
//!
//! [`WinHidHandle`] owns one interface handle opened with `FILE_FLAG_OVERLAPPED`
//! plus the manual-reset event, `OVERLAPPED` block and transfer buffer used by
//! its single in-flight request. It is responsible for:
//! - `CreateFileW` with read/write access and read/write sharing
//! - HidD attribute and string queries
//! - submitting `ReadFile` / `WriteFile` / feature IOCTLs and resolving them with
//!   `WaitForSingleObject`, `GetOverlappedResult` and `CancelIoEx`
//!
//! The `OVERLAPPED` is boxed and the transfer buffer is not resized while a
//! request is in flight, so both stay put for the kernel even if the handle
//! itself is moved.

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle};

use tracing::{trace, warn};
use windows_sys::Win32::Devices::HumanInterfaceDevice::{
    HidD_GetAttributes, HidD_GetIndexedString, HidD_GetManufacturerString, HidD_GetProductString,
    HidD_GetSerialNumberString, HIDD_ATTRIBUTES,
};
use windows_sys::Win32::Foundation::{
    GetLastError, ERROR_INVALID_FUNCTION, ERROR_IO_PENDING, GENERIC_READ, GENERIC_WRITE, HANDLE,
    INVALID_HANDLE_VALUE, WAIT_OBJECT_0,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, ReadFile, WriteFile, FILE_FLAG_OVERLAPPED, FILE_SHARE_READ, FILE_SHARE_WRITE,
    OPEN_EXISTING,
};
use windows_sys::Win32::System::IO::{CancelIoEx, DeviceIoControl, GetOverlappedResult, OVERLAPPED};
use windows_sys::Win32::System::Threading::{CreateEventW, ResetEvent, WaitForSingleObject};

use super::hidp_parser::query_capabilities;
use super::{last_os_error, os_error};
use crate::device::{Attributes, Capabilities, DeviceHandle, Request, StringKind};
use crate::error::OsError;

// Local constants (from hidclass.h; not exported consistently across windows-sys versions)
const FILE_DEVICE_KEYBOARD: u32 = 0x0000_000b;
const METHOD_IN_DIRECT: u32 = 1;
const METHOD_OUT_DIRECT: u32 = 2;
const FILE_ANY_ACCESS: u32 = 0;

const fn ctl_code(device_type: u32, function: u32, method: u32, access: u32) -> u32 {
    (device_type << 16) | (access << 14) | (function << 2) | method
}

pub(crate) const IOCTL_HID_SET_FEATURE: u32 =
    ctl_code(FILE_DEVICE_KEYBOARD, 100, METHOD_IN_DIRECT, FILE_ANY_ACCESS);
pub(crate) const IOCTL_HID_GET_FEATURE: u32 =
    ctl_code(FILE_DEVICE_KEYBOARD, 100, METHOD_OUT_DIRECT, FILE_ANY_ACCESS);

/// An open HID interface on Windows.
pub struct WinHidHandle {
    device: OwnedHandle,
    event: OwnedHandle,
    overlapped: Box<OVERLAPPED>,
    buf: Vec<u8>,
    in_flight: bool,
}

// The raw handles are only used through `&mut self`, and the OVERLAPPED/buffer
// pair is owned by this value. Moving it to another thread is fine.
unsafe impl Send for WinHidHandle {}

impl WinHidHandle {
    /// Open a HID interface path for overlapped read/write.
    ///
    /// ### Errors
    /// Returns the `GetLastError()` value of `CreateFileW` or `CreateEventW`.
    pub fn open(path: &str) -> Result<Self, OsError> {
        // UTF-16 + NUL
        let wide: Vec<u16> = OsStr::new(path)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let raw = unsafe {
            CreateFileW(
                wide.as_ptr(),
                GENERIC_READ | GENERIC_WRITE,
                FILE_SHARE_READ | FILE_SHARE_WRITE,
                std::ptr::null(),
                OPEN_EXISTING,
                FILE_FLAG_OVERLAPPED,
                std::ptr::null_mut(),
            )
        };
        if raw == INVALID_HANDLE_VALUE {
            return Err(last_os_error());
        }
        let device = unsafe { OwnedHandle::from_raw_handle(raw) };

        // Manual reset, initially non-signaled.
        let ev = unsafe { CreateEventW(std::ptr::null(), 1, 0, std::ptr::null()) };
        if ev.is_null() {
            return Err(last_os_error());
        }
        let event = unsafe { OwnedHandle::from_raw_handle(ev) };

        trace!(path, "opened HID handle");
        Ok(Self {
            device,
            event,
            overlapped: Box::new(unsafe { std::mem::zeroed() }),
            buf: Vec::new(),
            in_flight: false,
        })
    }

    #[inline]
    fn raw(&self) -> HANDLE {
        self.device.as_raw_handle()
    }

    fn not_in_flight() -> OsError {
        os_error(ERROR_INVALID_FUNCTION)
    }

    /// Reset the OVERLAPPED block and its event for a new request.
    fn arm(&mut self) {
        *self.overlapped = unsafe { std::mem::zeroed() };
        self.overlapped.hEvent = self.event.as_raw_handle();
        unsafe { ResetEvent(self.event.as_raw_handle()) };
    }

    fn load(&mut self, data: &[u8]) -> u32 {
        self.buf.clear();
        self.buf.extend_from_slice(data);
        self.buf.len() as u32
    }

    fn ioctl(&mut self, code: u32, data: &[u8]) -> i32 {
        let len = self.load(data);
        let ptr = self.buf.as_mut_ptr();
        unsafe {
            DeviceIoControl(
                self.raw(),
                code,
                ptr.cast(),
                len,
                ptr.cast(),
                len,
                std::ptr::null_mut(),
                &mut *self.overlapped,
            )
        }
    }
}

impl DeviceHandle for WinHidHandle {
    fn attributes(&self) -> Result<Attributes, OsError> {
        let mut attrib: HIDD_ATTRIBUTES = unsafe { std::mem::zeroed() };
        attrib.Size = std::mem::size_of::<HIDD_ATTRIBUTES>() as u32;
        if unsafe { HidD_GetAttributes(self.raw(), &mut attrib) } == 0 {
            return Err(last_os_error());
        }
        Ok(Attributes {
            vendor_id: attrib.VendorID,
            product_id: attrib.ProductID,
            version_number: attrib.VersionNumber,
        })
    }

    fn capabilities(&self) -> Result<Capabilities, OsError> {
        query_capabilities(self.raw())
    }

    fn string(&self, kind: StringKind, buf: &mut [u16]) -> Result<(), OsError> {
        let ptr: *mut core::ffi::c_void = buf.as_mut_ptr().cast();
        let bytes = (buf.len() * 2) as u32;
        let ok = unsafe {
            match kind {
                StringKind::Manufacturer => HidD_GetManufacturerString(self.raw(), ptr, bytes),
                StringKind::Product => HidD_GetProductString(self.raw(), ptr, bytes),
                StringKind::SerialNumber => HidD_GetSerialNumberString(self.raw(), ptr, bytes),
                StringKind::Indexed(index) => HidD_GetIndexedString(self.raw(), index, ptr, bytes),
            }
        };
        if ok == 0 {
            Err(last_os_error())
        } else {
            Ok(())
        }
    }

    fn submit(&mut self, request: Request<'_>) -> Result<(), OsError> {
        if self.in_flight {
            // Earlier request was never resolved; settle it first.
            self.cancel()?;
        }
        self.arm();

        let ok = match request {
            Request::Write(data) => {
                let len = self.load(data);
                unsafe {
                    WriteFile(
                        self.raw(),
                        self.buf.as_ptr(),
                        len,
                        std::ptr::null_mut(),
                        &mut *self.overlapped,
                    )
                }
            }
            Request::Read(len) => {
                self.buf.clear();
                self.buf.resize(len, 0);
                unsafe {
                    ReadFile(
                        self.raw(),
                        self.buf.as_mut_ptr(),
                        len as u32,
                        std::ptr::null_mut(),
                        &mut *self.overlapped,
                    )
                }
            }
            Request::SetFeature(data) => self.ioctl(IOCTL_HID_SET_FEATURE, data),
            Request::GetFeature(data) => self.ioctl(IOCTL_HID_GET_FEATURE, data),
        };

        if ok == 0 {
            let code = unsafe { GetLastError() };
            if code != ERROR_IO_PENDING {
                return Err(os_error(code));
            }
        }
        self.in_flight = true;
        Ok(())
    }

    fn poll(&mut self) -> Result<bool, OsError> {
        if !self.in_flight {
            return Err(Self::not_in_flight());
        }
        let res = unsafe { WaitForSingleObject(self.event.as_raw_handle(), 0) };
        Ok(res == WAIT_OBJECT_0)
    }

    fn wait(&mut self, out: &mut [u8]) -> Result<usize, OsError> {
        if !self.in_flight {
            return Err(Self::not_in_flight());
        }
        let mut transferred: u32 = 0;
        let ok = unsafe { GetOverlappedResult(self.raw(), &*self.overlapped, &mut transferred, 1) };
        self.in_flight = false;
        if ok == 0 {
            return Err(last_os_error());
        }

        let n = transferred as usize;
        let copy = n.min(out.len()).min(self.buf.len());
        out[..copy].copy_from_slice(&self.buf[..copy]);
        Ok(n)
    }

    fn cancel(&mut self) -> Result<(), OsError> {
        if !self.in_flight {
            return Ok(());
        }
        // Fails with ERROR_NOT_FOUND if the request already completed; the wait
        // below settles both cases.
        unsafe { CancelIoEx(self.raw(), &*self.overlapped) };
        let mut transferred: u32 = 0;
        unsafe { GetOverlappedResult(self.raw(), &*self.overlapped, &mut transferred, 1) };
        self.in_flight = false;
        Ok(())
    }
}

impl Drop for WinHidHandle {
    fn drop(&mut self) {
        // The kernel may still write into `buf`/`overlapped`; settle before freeing.
        if let Err(e) = self.cancel() {
            warn!(error = %e, "failed to cancel pending HID request on close");
        }
    }
}
