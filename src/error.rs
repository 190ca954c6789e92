//! Error types.
//!
//! OS failures are translated once, where they are detected, into an [`OsError`]
//! (numeric code + single-line message). Session operations wrap that in a
//! [`HidError`] tagged with the operation that failed.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type HidResult<T> = Result<T, HidError>;

/// A failure reported by the operating system (or by a platform implementation).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (os error {code})")]
pub struct OsError {
    /// Platform error code (`GetLastError()` / `NTSTATUS` on Windows).
    pub code: u32,
    /// Human-readable message as produced by the platform's formatter.
    pub message: String,
}

impl OsError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum HidError {
    /// No enumerated device matched the requested identity.
    #[error("device not found: {vendor_id:04x}:{product_id:04x} serial={serial_number:?}")]
    DeviceNotFound {
        vendor_id: u16,
        product_id: u16,
        serial_number: Option<String>,
    },

    /// The device handle or its capabilities could not be acquired.
    #[error("{op} failed: {source}")]
    Open {
        op: &'static str,
        #[source]
        source: OsError,
    },

    /// A read/write/feature/string operation failed on an open session.
    #[error("{op} failed: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: OsError,
    },

    /// The session was closed.
    #[error("session is closed")]
    Closed,

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("unable to read config: {0}")]
    ConfigIo(#[from] std::io::Error),
}

impl HidError {
    /// The underlying OS error, if this failure came from the platform.
    pub fn os_error(&self) -> Option<&OsError> {
        match self {
            HidError::Open { source, .. } | HidError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
