//! Enumeration results.
//!
//! A [`DeviceList`] is produced wholesale by one enumeration call and released
//! wholesale by [`DeviceList::free_all`] (or by dropping it). Callers can look
//! at the descriptors but cannot take single entries out of the batch.
//!
//! ## Persistence notes
//! - `vendor_id`/`product_id` and `serial_number` (when present) are generally
//!   stable and useful for re-identification.
//! - `path` is opaque and reassigned by the OS across reboots and reconnects.
//!   Pass it back to [`Session::open_path`](crate::Session::open_path)
//!   unmodified and do not persist it.
//!
//! # Example
//! ```no_run
//! # #[cfg(windows)] {
//! let devices = hidport::backends::windows::enumerate(0x04d8, 0x003f);
//! for d in &devices {
//!     println!("{d}");
//! }
//! devices.free_all();
//! # }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// One HID interface found by enumeration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// OS interface path; `None` only if the OS reported an empty path.
    pub path: Option<String>,

    pub vendor_id: u16,
    pub product_id: u16,

    pub serial_number: Option<String>,
    pub manufacturer_string: Option<String>,
    pub product_string: Option<String>,

    /// Device release number (bcdDevice on USB).
    pub release_number: u16,

    /// Interface index parsed from `path`; `-1` when not present.
    pub interface_number: i32,

    /// Top-level HID usage page, `0` if the capability query failed.
    pub usage_page: u16,

    /// Top-level HID usage, `0` if the capability query failed.
    pub usage: u16,
}

impl DeviceDescriptor {
    /// `true` if this descriptor has the given identity.
    ///
    /// With `serial_number` set, the descriptor must carry exactly that serial
    /// (no case folding); a descriptor without a serial never matches.
    pub fn matches(&self, vendor_id: u16, product_id: u16, serial_number: Option<&str>) -> bool {
        if self.vendor_id != vendor_id || self.product_id != product_id {
            return false;
        }
        match serial_number {
            Some(wanted) => self.serial_number.as_deref() == Some(wanted),
            None => true,
        }
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} rel={:04x} iface={} up=0x{:04x} u=0x{:04x} product={:?} serial={:?} path={}",
            self.vendor_id,
            self.product_id,
            self.release_number,
            self.interface_number,
            self.usage_page,
            self.usage,
            self.product_string.as_deref().unwrap_or(""),
            self.serial_number.as_deref().unwrap_or(""),
            self.path.as_deref().unwrap_or("<none>"),
        )
    }
}

/// Owned, ordered batch of descriptors from one enumeration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceList {
    devices: Vec<DeviceDescriptor>,
}

impl DeviceList {
    pub(crate) fn push(&mut self, descriptor: DeviceDescriptor) {
        self.devices.push(descriptor);
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DeviceDescriptor> {
        self.devices.get(index)
    }

    /// Descriptors in enumeration order.
    pub fn iter(&self) -> std::slice::Iter<'_, DeviceDescriptor> {
        self.devices.iter()
    }

    /// First descriptor matching the identity, in enumeration order.
    pub fn find(
        &self,
        vendor_id: u16,
        product_id: u16,
        serial_number: Option<&str>,
    ) -> Option<&DeviceDescriptor> {
        self.devices
            .iter()
            .find(|d| d.matches(vendor_id, product_id, serial_number))
    }

    /// Release every descriptor and its strings.
    pub fn free_all(self) {
        drop(self);
    }
}

impl<'a> IntoIterator for &'a DeviceList {
    type Item = &'a DeviceDescriptor;
    type IntoIter = std::slice::Iter<'a, DeviceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}

/// Release an enumeration result; `None` is a no-op.
pub fn free_enumeration(list: Option<DeviceList>) {
    if let Some(list) = list {
        list.free_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(vid: u16, pid: u16, serial: Option<&str>, path: &str) -> DeviceDescriptor {
        DeviceDescriptor {
            path: Some(path.to_string()),
            vendor_id: vid,
            product_id: pid,
            serial_number: serial.map(str::to_string),
            interface_number: -1,
            ..Default::default()
        }
    }

    fn sample() -> DeviceList {
        let mut list = DeviceList::default();
        list.push(descriptor(0x04d8, 0x003f, None, "a"));
        list.push(descriptor(0x04d8, 0x003f, Some("12345"), "b"));
        list.push(descriptor(0x04d8, 0x003f, Some("ABCDE"), "c"));
        list
    }

    #[test]
    fn find_without_serial_takes_first_in_order() {
        let list = sample();
        assert_eq!(list.find(0x04d8, 0x003f, None).and_then(|d| d.path.as_deref()), Some("a"));
    }

    #[test]
    fn find_with_serial_is_exact() {
        let list = sample();
        assert_eq!(
            list.find(0x04d8, 0x003f, Some("12345")).and_then(|d| d.path.as_deref()),
            Some("b")
        );
        assert!(list.find(0x04d8, 0x003f, Some("abcde")).is_none());
        assert!(list.find(0x04d8, 0x0040, None).is_none());
    }

    #[test]
    fn free_enumeration_accepts_absent_list() {
        free_enumeration(None);
        free_enumeration(Some(sample()));
        free_enumeration(Some(DeviceList::default()));
    }

    #[test]
    fn iteration_preserves_order() {
        let list = sample();
        let paths: Vec<_> = list.iter().filter_map(|d| d.path.clone()).collect();
        assert_eq!(paths, ["a", "b", "c"]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(2).map(|d| d.serial_number.as_deref()), Some(Some("ABCDE")));
    }

    #[test]
    fn display_marks_missing_path() {
        let d = DeviceDescriptor {
            vendor_id: 0x04d8,
            product_id: 0x003f,
            interface_number: -1,
            ..Default::default()
        };
        let s = d.to_string();
        assert!(s.starts_with("04d8:003f"));
        assert!(s.ends_with("path=<none>"));
    }
}
