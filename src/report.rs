//! Report and path helpers shared by the enumerator and the session.
//!
//! Nothing here talks to the OS; these are the small byte/string rules the
//! rest of the crate relies on:
//! - capping a read to one input report
//! - stripping the report-number byte Windows prepends to unnumbered reports
//! - pulling the interface number out of a device path
//! - decoding the fixed-size UTF-16 buffers the HID string queries fill

/// Size (in UTF-16 code units) of the buffer used for HID string queries.
pub const MAX_STRING_UNITS: usize = 512;

/// Token that precedes the interface number in Windows HID interface paths,
/// e.g. `\\?\hid#vid_046d&pid_c52b&mi_02&col01#...`.
pub const INTERFACE_TOKEN: &str = "&mi_";

/// Clamp a caller's read request to a single input report.
#[inline]
pub fn capped_read_len(requested: usize, input_report_len: usize) -> usize {
    requested.min(input_report_len)
}

/// Drop a leading `0x00` report number from the first `len` bytes of `buf`.
///
/// Devices that do not use numbered reports still get a zero report-number
/// byte in front of every input report; removing it makes one read return the
/// bare report payload. Returns the adjusted length.
///
/// This is a heuristic: a genuine report whose first payload byte is zero is
/// shortened as well.
pub fn strip_report_number(buf: &mut [u8], len: usize) -> usize {
    let len = len.min(buf.len());
    if len > 0 && buf[0] == 0x00 {
        buf.copy_within(1..len, 0);
        len - 1
    } else {
        len
    }
}

/// Parse the interface number encoded after [`INTERFACE_TOKEN`] in `path`.
///
/// Returns `-1` when the token is missing, when no hex digit follows it, or
/// when the digits do not fit an `i32`.
pub fn interface_number_from_path(path: &str) -> i32 {
    let Some(start) = path.find(INTERFACE_TOKEN) else {
        return -1;
    };
    let digits: &str = {
        let rest = &path[start + INTERFACE_TOKEN.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_hexdigit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return -1;
    }
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(-1)
}

/// Decode a NUL-terminated UTF-16 buffer filled by a HID string query.
///
/// The last unit is forced to NUL first, so an over-long value is truncated
/// rather than read past the end.
pub fn decode_wide(buf: &mut [u16]) -> String {
    if let Some(last) = buf.last_mut() {
        *last = 0;
    }
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_number_parsed_from_mi_token() {
        let path = r"\\?\hid#vid_046d&pid_c52b&mi_02&col01#8&2f9b1e2&0&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}";
        assert_eq!(interface_number_from_path(path), 2);
        assert_eq!(interface_number_from_path(r"\\?\hid#vid_1&pid_2&mi_0a#x"), 10);
    }

    #[test]
    fn interface_number_missing_or_unparseable() {
        assert_eq!(interface_number_from_path(r"\\?\hid#vid_04d8&pid_003f#7&1"), -1);
        assert_eq!(interface_number_from_path(r"\\?\hid#vid_1&pid_2&mi_#x"), -1);
        assert_eq!(interface_number_from_path(r"\\?\hid#vid_1&pid_2&mi_zz"), -1);
        assert_eq!(interface_number_from_path(""), -1);
        // Upper-case token is not the literal we look for.
        assert_eq!(interface_number_from_path(r"\\?\HID#VID_1&PID_2&MI_01"), -1);
    }

    #[test]
    fn interface_number_overflow_is_unparseable() {
        assert_eq!(interface_number_from_path("x&mi_ffffffff"), -1);
        assert_eq!(interface_number_from_path("x&mi_123456789"), -1);
    }

    #[test]
    fn strip_leading_zero_report_number() {
        let mut buf = [0x00, 0x81, 0x01, 0x02, 0xee];
        let n = strip_report_number(&mut buf, 4);
        assert_eq!(n, 3);
        assert_eq!(&buf[..n], &[0x81, 0x01, 0x02]);
    }

    #[test]
    fn numbered_report_left_alone() {
        let mut buf = [0x03, 0x00, 0x10];
        assert_eq!(strip_report_number(&mut buf, 3), 3);
        assert_eq!(buf, [0x03, 0x00, 0x10]);
    }

    #[test]
    fn strip_handles_empty_and_single_byte() {
        let mut buf = [0u8; 4];
        assert_eq!(strip_report_number(&mut buf, 0), 0);
        assert_eq!(strip_report_number(&mut buf, 1), 0);
    }

    #[test]
    fn read_len_capped_to_input_report() {
        assert_eq!(capped_read_len(256, 65), 65);
        assert_eq!(capped_read_len(8, 65), 8);
        assert_eq!(capped_read_len(8, 0), 0);
    }

    #[test]
    fn decode_wide_stops_at_nul_and_truncates() {
        let mut buf: Vec<u16> = "Microchip".encode_utf16().collect();
        buf.push(0);
        buf.extend("garbage".encode_utf16());
        assert_eq!(decode_wide(&mut buf), "Microchip");

        let mut full: Vec<u16> = "abcd".encode_utf16().collect();
        assert_eq!(decode_wide(&mut full), "abc");
        assert_eq!(decode_wide(&mut []), "");
    }
}
