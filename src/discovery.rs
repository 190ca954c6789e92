//! Device enumeration.
//!
//! Walks the platform's HID interface paths and builds a [`DeviceList`]:
//!
//! - open a transient handle per interface
//! - read its attributes and apply the vendor/product filter
//! - for matches, read capabilities (usage page/usage) and the three strings
//! - derive the interface number from the path
//!
//! A candidate whose handle cannot be opened, or whose attributes cannot be
//! read, is skipped; enumeration as a whole never fails.
//!
//! ## `enumerate` vs `enumerate_with_report`
//! - [`enumerate`] returns only the descriptor list.
//! - [`enumerate_with_report`] additionally returns one [`CandidateReport`] per
//!   interface path describing why it was dropped (or that it was kept). It is
//!   meant for diagnostics tooling and does not change what ends up in the list.

use tracing::{debug, trace, warn};

use crate::device::{DeviceHandle, Platform, StringKind};
use crate::error::OsError;
use crate::metadata::{DeviceDescriptor, DeviceList};
use crate::report::{decode_wide, interface_number_from_path, MAX_STRING_UNITS};

/// Where along enumeration a candidate interface was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropStage {
    /// The transient handle could not be opened.
    OpenFailed(OsError),

    /// The attribute query failed.
    AttributesFailed(OsError),

    /// The interface's identifiers did not match the filter.
    FilterRejected { vendor_id: u16, product_id: u16 },
}

/// Diagnostic record for one interface path seen during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateReport {
    pub path: String,
    /// `None` means the interface was added to the list.
    pub drop_stage: Option<DropStage>,
}

/// Enumerate HID interfaces, keeping those matching `vendor_id`/`product_id`.
///
/// `(0, 0)` keeps every interface. Returns an empty list when nothing matches.
pub fn enumerate<P: Platform>(platform: &P, vendor_id: u16, product_id: u16) -> DeviceList {
    enumerate_with_report(platform, vendor_id, product_id).0
}

/// [`enumerate`], plus a per-candidate record of how each interface fared.
pub fn enumerate_with_report<P: Platform>(
    platform: &P,
    vendor_id: u16,
    product_id: u16,
) -> (DeviceList, Vec<CandidateReport>) {
    let mut list = DeviceList::default();
    let mut report = Vec::new();

    for path in platform.interface_paths() {
        let drop_stage = match probe(platform, &path, vendor_id, product_id) {
            Ok(descriptor) => {
                trace!(%descriptor, "enumerated");
                list.push(descriptor);
                None
            }
            Err(stage) => {
                debug!(path = %path, ?stage, "skipping HID interface");
                Some(stage)
            }
        };
        report.push(CandidateReport { path, drop_stage });
    }

    debug!(
        vendor_id,
        product_id,
        found = list.len(),
        seen = report.len(),
        "HID enumeration complete"
    );
    (list, report)
}

/// `true` if the filter accepts a device with these identifiers.
#[inline]
pub fn filter_accepts(vendor_id: u16, product_id: u16, device_vid: u16, device_pid: u16) -> bool {
    (vendor_id == 0 && product_id == 0) || (device_vid == vendor_id && device_pid == product_id)
}

/// Inspect a single interface. The transient handle is dropped (closed) on
/// every path out of this function.
fn probe<P: Platform>(
    platform: &P,
    path: &str,
    vendor_id: u16,
    product_id: u16,
) -> Result<DeviceDescriptor, DropStage> {
    let handle = platform.open(path).map_err(DropStage::OpenFailed)?;
    let attrib = handle.attributes().map_err(DropStage::AttributesFailed)?;

    if !filter_accepts(vendor_id, product_id, attrib.vendor_id, attrib.product_id) {
        return Err(DropStage::FilterRejected {
            vendor_id: attrib.vendor_id,
            product_id: attrib.product_id,
        });
    }

    let (usage_page, usage) = match handle.capabilities() {
        Ok(caps) => (caps.usage_page, caps.usage),
        Err(e) => {
            warn!(path, error = %e, "capability query failed; usage left at 0");
            (0, 0)
        }
    };

    let mut wstr = vec![0u16; MAX_STRING_UNITS];
    let mut query = |kind: StringKind| -> Option<String> {
        wstr.fill(0);
        handle.string(kind, &mut wstr).ok()?;
        Some(decode_wide(&mut wstr))
    };
    let serial_number = query(StringKind::SerialNumber);
    let manufacturer_string = query(StringKind::Manufacturer);
    let product_string = query(StringKind::Product);

    Ok(DeviceDescriptor {
        path: (!path.is_empty()).then(|| path.to_owned()),
        vendor_id: attrib.vendor_id,
        product_id: attrib.product_id,
        serial_number,
        manufacturer_string,
        product_string,
        release_number: attrib.version_number,
        interface_number: interface_number_from_path(path),
        usage_page,
        usage,
    })
}
