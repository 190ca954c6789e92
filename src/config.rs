//! TOML configuration: named device selectors and session defaults.
//!
//! ```toml
//! [session]
//! nonblocking = false
//!
//! [[device]]
//! name = "pic32-demo"
//! vendor_id = 0x04d8
//! product_id = 0x003f
//! serial_number = "12345"
//! ```
//!
//! A selector with a `path` opens that path directly; otherwise it opens the
//! first enumerated interface with the given identity. Paths are not stable
//! across reconnects, so prefer identity selectors in files that outlive a
//! session.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HidResult;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HidConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default, rename = "device")]
    pub devices: Vec<DeviceSelector>,
}

/// Defaults applied to sessions opened through a selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Start sessions in non-blocking read mode.
    #[serde(default)]
    pub nonblocking: bool,
}

/// How to find one device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceSelector {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vendor_id: u16,
    #[serde(default)]
    pub product_id: u16,
    #[serde(default)]
    pub serial_number: Option<String>,
    /// Opaque interface path; takes precedence over the identity fields.
    #[serde(default)]
    pub path: Option<String>,
}

impl DeviceSelector {
    pub fn by_identity(vendor_id: u16, product_id: u16, serial_number: Option<&str>) -> Self {
        Self {
            vendor_id,
            product_id,
            serial_number: serial_number.map(str::to_owned),
            ..Default::default()
        }
    }

    pub fn by_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }
}

impl HidConfig {
    pub fn from_toml_str(s: &str) -> HidResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> HidResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Look a selector up by its `name`.
    pub fn selector(&self, name: &str) -> Option<&DeviceSelector> {
        self.devices
            .iter()
            .find(|d| d.name.as_deref() == Some(name))
    }
}
