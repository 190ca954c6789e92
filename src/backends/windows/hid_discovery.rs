//! SetupAPI walk of the HID device-interface class.
//!
//! Produces the interface paths (`\\?\hid#vid_...#{4d1e55b2-...}`) that
//! [`WinHidHandle::open`](super::WinHidHandle::open) accepts. An interface
//! whose detail data cannot be fetched is skipped, so the list may be shorter
//! than the number of interfaces SetupAPI reports.

#![cfg(target_os = "windows")]

use std::mem::{offset_of, size_of};
use std::sync::OnceLock;

use tracing::{debug, trace};
use windows_sys::core::GUID;
use windows_sys::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInterfaces, SetupDiGetClassDevsW,
    SetupDiGetDeviceInterfaceDetailW, DIGCF_DEVICEINTERFACE, DIGCF_PRESENT, HDEVINFO,
    SP_DEVICE_INTERFACE_DATA, SP_DEVICE_INTERFACE_DETAIL_DATA_W,
};
use windows_sys::Win32::Devices::HumanInterfaceDevice::HidD_GetHidGuid;

/// The HID interface class GUID (`{4d1e55b2-f16f-11cf-88cb-001111000030}`),
/// fetched once per process.
pub fn hid_class_guid() -> &'static GUID {
    static GUID_CELL: OnceLock<GUID> = OnceLock::new();
    GUID_CELL.get_or_init(|| {
        let mut guid = GUID::from_u128(0);
        unsafe { HidD_GetHidGuid(&mut guid) };
        guid
    })
}

/// Device-info set for present HID interfaces; destroyed on drop.
struct DevInfoSet(HDEVINFO);

impl DevInfoSet {
    fn present_hid_interfaces() -> Option<Self> {
        let set = unsafe {
            SetupDiGetClassDevsW(
                hid_class_guid(),
                std::ptr::null(),
                std::ptr::null_mut(),
                DIGCF_PRESENT | DIGCF_DEVICEINTERFACE,
            )
        };
        // INVALID_HANDLE_VALUE
        if set as isize == -1 {
            None
        } else {
            Some(Self(set))
        }
    }
}

impl Drop for DevInfoSet {
    fn drop(&mut self) {
        unsafe { SetupDiDestroyDeviceInfoList(self.0) };
    }
}

/// Interface paths of every present HID interface, in SetupAPI order.
pub fn interface_paths() -> Vec<String> {
    let mut out = Vec::new();
    let Some(set) = DevInfoSet::present_hid_interfaces() else {
        debug!("SetupDiGetClassDevsW failed: {}", super::last_os_error());
        return out;
    };

    for index in 0u32.. {
        let mut iface: SP_DEVICE_INTERFACE_DATA = unsafe { std::mem::zeroed() };
        iface.cbSize = size_of::<SP_DEVICE_INTERFACE_DATA>() as u32;

        let ok = unsafe {
            SetupDiEnumDeviceInterfaces(
                set.0,
                std::ptr::null(),
                hid_class_guid(),
                index,
                &mut iface,
            )
        };
        if ok == 0 {
            // ERROR_NO_MORE_ITEMS
            break;
        }

        match interface_path(&set, &iface) {
            Some(path) => out.push(path),
            None => trace!(index, "no interface detail; skipping"),
        }
    }
    out
}

fn interface_path(set: &DevInfoSet, iface: &SP_DEVICE_INTERFACE_DATA) -> Option<String> {
    // First call only reports the required size.
    let mut required: u32 = 0;
    unsafe {
        SetupDiGetDeviceInterfaceDetailW(
            set.0,
            iface,
            std::ptr::null_mut(),
            0,
            &mut required,
            std::ptr::null_mut(),
        )
    };
    if (required as usize) < size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>() {
        return None;
    }

    // u32 storage keeps the struct's 4-byte alignment.
    let mut storage = vec![0u32; (required as usize).div_ceil(4)];
    let detail = storage.as_mut_ptr().cast::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>();
    unsafe { (*detail).cbSize = size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>() as u32 };

    let ok = unsafe {
        SetupDiGetDeviceInterfaceDetailW(
            set.0,
            iface,
            detail,
            required,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        )
    };
    if ok == 0 {
        return None;
    }

    // DevicePath is a NUL-terminated UTF-16 string running to the end of the buffer.
    let offset = offset_of!(SP_DEVICE_INTERFACE_DETAIL_DATA_W, DevicePath);
    let units = (required as usize - offset) / 2;
    let wide = unsafe {
        std::slice::from_raw_parts(storage.as_ptr().cast::<u8>().add(offset).cast::<u16>(), units)
    };
    let end = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    Some(String::from_utf16_lossy(&wide[..end]))
}
