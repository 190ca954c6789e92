//! In-memory HID host used by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use hidport::{Attributes, Capabilities, DeviceHandle, OsError, Platform, Request, StringKind};

pub const ERROR_GEN_FAILURE: u32 = 31;
pub const ERROR_INVALID_PARAMETER: u32 = 87;
pub const ERROR_DEVICE_NOT_CONNECTED: u32 = 1167;

pub fn gen_failure() -> OsError {
    OsError::new(
        ERROR_GEN_FAILURE,
        "A device attached to the system is not functioning.",
    )
}

/// State of one simulated interface.
#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub path: String,
    pub attributes: Result<Attributes, OsError>,
    pub caps: Result<Capabilities, OsError>,
    pub open_error: Option<OsError>,
    pub serial: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub input: VecDeque<Vec<u8>>,
    pub feature_reply: Vec<u8>,
    pub written: Vec<Vec<u8>>,
    pub features_sent: Vec<Vec<u8>>,
    pub opens: usize,
    pub open_handles: usize,
    pub cancels: usize,
}

impl FakeDevice {
    pub fn new(path: &str, vendor_id: u16, product_id: u16) -> Self {
        Self {
            path: path.to_owned(),
            attributes: Ok(Attributes {
                vendor_id,
                product_id,
                version_number: 0x0100,
            }),
            caps: Ok(Capabilities {
                usage_page: 0xff00,
                usage: 0x0001,
                input_report_len: 65,
                output_report_len: 65,
                feature_report_len: 9,
            }),
            open_error: None,
            serial: None,
            manufacturer: Some("Microchip Technology Inc.".to_owned()),
            product: Some("Simple HID Device Demo".to_owned()),
            input: VecDeque::new(),
            feature_reply: Vec::new(),
            written: Vec::new(),
            features_sent: Vec::new(),
            opens: 0,
            open_handles: 0,
            cancels: 0,
        }
    }

    pub fn serial(mut self, serial: &str) -> Self {
        self.serial = Some(serial.to_owned());
        self
    }

    pub fn input_report_len(mut self, len: u16) -> Self {
        if let Ok(caps) = self.caps.as_mut() {
            caps.input_report_len = len;
        }
        self
    }

    pub fn output_report_len(mut self, len: u16) -> Self {
        if let Ok(caps) = self.caps.as_mut() {
            caps.output_report_len = len;
        }
        self
    }

    pub fn with_input(mut self, report: &[u8]) -> Self {
        self.input.push_back(report.to_vec());
        self
    }

    pub fn feature_reply(mut self, reply: &[u8]) -> Self {
        self.feature_reply = reply.to_vec();
        self
    }

    pub fn failing_open(mut self, err: OsError) -> Self {
        self.open_error = Some(err);
        self
    }

    pub fn failing_attributes(mut self, err: OsError) -> Self {
        self.attributes = Err(err);
        self
    }

    pub fn failing_caps(mut self, err: OsError) -> Self {
        self.caps = Err(err);
        self
    }
}

pub type SharedDevice = Arc<Mutex<FakeDevice>>;

fn lock(dev: &SharedDevice) -> MutexGuard<'_, FakeDevice> {
    dev.lock().unwrap()
}

/// A host whose HID class contains the added devices, in insertion order.
#[derive(Default, Clone)]
pub struct FakeHost {
    devices: Arc<Mutex<Vec<SharedDevice>>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, device: FakeDevice) -> SharedDevice {
        let shared = Arc::new(Mutex::new(device));
        self.devices.lock().unwrap().push(shared.clone());
        shared
    }

    fn find(&self, path: &str) -> Option<SharedDevice> {
        self.devices
            .lock()
            .unwrap()
            .iter()
            .find(|d| lock(d).path == path)
            .cloned()
    }
}

impl Platform for FakeHost {
    type Handle = FakeHandle;

    fn interface_paths(&self) -> Vec<String> {
        self.devices
            .lock()
            .unwrap()
            .iter()
            .map(|d| lock(d).path.clone())
            .collect()
    }

    fn open(&self, path: &str) -> Result<FakeHandle, OsError> {
        let dev = self.find(path).ok_or_else(|| {
            OsError::new(2, "The system cannot find the file specified.")
        })?;
        {
            let mut state = lock(&dev);
            if let Some(err) = state.open_error.clone() {
                return Err(err);
            }
            state.opens += 1;
            state.open_handles += 1;
        }
        Ok(FakeHandle { dev, pending: None })
    }
}

#[derive(Debug)]
enum Pending {
    Write(usize),
    Read(usize),
    SetFeature,
    GetFeature(usize),
}

pub struct FakeHandle {
    dev: SharedDevice,
    pending: Option<Pending>,
}

impl DeviceHandle for FakeHandle {
    fn attributes(&self) -> Result<Attributes, OsError> {
        lock(&self.dev).attributes.clone()
    }

    fn capabilities(&self) -> Result<Capabilities, OsError> {
        lock(&self.dev).caps.clone()
    }

    fn string(&self, kind: StringKind, buf: &mut [u16]) -> Result<(), OsError> {
        let state = lock(&self.dev);
        let value = match kind {
            StringKind::Manufacturer => state.manufacturer.clone(),
            StringKind::Product => state.product.clone(),
            StringKind::SerialNumber => state.serial.clone(),
            StringKind::Indexed(1) => state.manufacturer.clone(),
            StringKind::Indexed(2) => state.product.clone(),
            StringKind::Indexed(_) => None,
        };
        let value = value.ok_or_else(|| OsError::new(ERROR_INVALID_PARAMETER, "The parameter is incorrect."))?;

        // Truncate without a terminator when the value does not fit.
        let mut n = 0;
        for (dst, unit) in buf.iter_mut().zip(value.encode_utf16()) {
            *dst = unit;
            n += 1;
        }
        if n < buf.len() {
            buf[n] = 0;
        }
        Ok(())
    }

    fn submit(&mut self, request: Request<'_>) -> Result<(), OsError> {
        assert!(self.pending.is_none(), "request submitted while one is in flight");
        let mut state = lock(&self.dev);
        let output_len = state.caps.as_ref().map_or(0, |c| c.output_report_len) as usize;

        self.pending = Some(match request {
            Request::Write(data) => {
                if data.len() > output_len {
                    return Err(OsError::new(
                        ERROR_INVALID_PARAMETER,
                        "The parameter is incorrect.\r\n",
                    ));
                }
                state.written.push(data.to_vec());
                Pending::Write(data.len())
            }
            Request::Read(len) => Pending::Read(len),
            Request::SetFeature(data) => {
                state.features_sent.push(data.to_vec());
                Pending::SetFeature
            }
            Request::GetFeature(data) => Pending::GetFeature(data.len()),
        });
        Ok(())
    }

    fn poll(&mut self) -> Result<bool, OsError> {
        Ok(match self.pending {
            Some(Pending::Read(_)) => !lock(&self.dev).input.is_empty(),
            Some(_) => true,
            None => false,
        })
    }

    fn wait(&mut self, out: &mut [u8]) -> Result<usize, OsError> {
        let pending = self.pending.take().ok_or_else(|| OsError::new(1, "Incorrect function."))?;
        let mut state = lock(&self.dev);
        match pending {
            Pending::Write(n) => Ok(n),
            Pending::SetFeature => Ok(0),
            Pending::Read(len) => {
                // Nothing queued would block forever on real hardware.
                let report = state.input.pop_front().ok_or_else(|| {
                    OsError::new(ERROR_DEVICE_NOT_CONNECTED, "The device is not connected.")
                })?;
                let n = report.len().min(len);
                let copy = n.min(out.len());
                out[..copy].copy_from_slice(&report[..copy]);
                Ok(n)
            }
            Pending::GetFeature(len) => {
                let n = state.feature_reply.len().min(len);
                let copy = n.min(out.len());
                out[..copy].copy_from_slice(&state.feature_reply[..copy]);
                Ok(n)
            }
        }
    }

    fn cancel(&mut self) -> Result<(), OsError> {
        if self.pending.take().is_some() {
            lock(&self.dev).cancels += 1;
        }
        Ok(())
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        if let Ok(mut state) = self.dev.lock() {
            state.open_handles -= 1;
        }
    }
}
