//! Native platform backends.
//!
//! Implementations of [`Platform`](crate::device::Platform) for real hosts.
//!
//! # Feature flags
//! - **`hid`**: enables the Windows backend (default in this build).
//!
//! Other hosts currently have no native backend; the generic enumerator and
//! session still work with any caller-supplied `Platform`.

use crate::metadata::DeviceList;

#[cfg(all(feature = "hid", target_os = "windows"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "hid", target_os = "windows"))))]
pub mod windows;

/// Enumerate through whichever native backend is enabled.
///
/// Returns an empty list when no backend is available on this host.
pub fn enumerate(vendor_id: u16, product_id: u16) -> DeviceList {
    #[cfg(all(feature = "hid", target_os = "windows"))]
    {
        windows::enumerate(vendor_id, product_id)
    }

    #[cfg(not(all(feature = "hid", target_os = "windows")))]
    {
        tracing::debug!(vendor_id, product_id, "no native HID backend on this host");
        DeviceList::default()
    }
}
