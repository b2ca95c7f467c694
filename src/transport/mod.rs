//! # Printer Transport Layer
//!
//! A [`Port`] opens byte-level connections; a [`session::TransportSession`]
//! owns one of them for the length of one print job.
//!
//! ## Available Ports
//!
//! | Port | Address prefix | Backend |
//! |------|----------------|---------|
//! | [`serial::SerialPort`] | `BT:` / `USB:` | RFCOMM or USB tty device (Linux) |
//! | [`tcp::TcpPort`] | `TCP:` | raw TCP, port 9100 |
//!
//! ## Addresses
//!
//! ```
//! use estrellita::transport::{PortAddress, PortKind};
//!
//! let addr: PortAddress = "BT:/dev/rfcomm0".parse().unwrap();
//! assert_eq!(addr.kind, PortKind::Bluetooth);
//! assert_eq!(addr.address, "/dev/rfcomm0");
//!
//! let addr: PortAddress = "TCP:192.168.1.50".parse().unwrap();
//! assert_eq!(addr.kind, PortKind::Lan);
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::PortError;
use crate::protocol::commands::{ID_REPLY_END, ID_REPLY_HEADER};

#[cfg(unix)]
pub mod serial;
pub mod session;
pub mod status;
pub mod tcp;

pub use session::{SessionState, Stage, TransportSession};
pub use status::{DeviceStatus, SensorActive};

/// Settings string for Star portable printers in ESC/POS mode
pub const PORTABLE_ESCPOS: &str = "portable;escpos";

// ============================================================================
// ADDRESSES
// ============================================================================

/// Physical link a port address refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PortKind {
    Bluetooth,
    Usb,
    Lan,
}

impl PortKind {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Bluetooth => "BT",
            Self::Usb => "USB",
            Self::Lan => "TCP",
        }
    }
}

/// # Port Address
///
/// Transport kind, address string, and the printer settings string
/// (e.g. `portable;escpos`). Only checked for being non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortAddress {
    pub kind: PortKind,
    pub address: String,
    pub settings: String,
}

impl PortAddress {
    pub fn new(
        kind: PortKind,
        address: impl Into<String>,
        settings: impl Into<String>,
    ) -> Result<Self, String> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err("port address is empty".to_string());
        }
        Ok(Self {
            kind,
            address,
            settings: settings.into(),
        })
    }

    /// Replace the settings string.
    pub fn with_settings(mut self, settings: impl Into<String>) -> Self {
        self.settings = settings.into();
        self
    }
}

impl FromStr for PortAddress {
    type Err = String;

    /// `BT:`, `USB:` and `TCP:` prefixes are case-insensitive. Without a
    /// prefix, paths under `/dev/rfcomm` are Bluetooth, other paths are USB,
    /// and anything else is a LAN host.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, rest) = match s.split_once(':') {
            Some((prefix, rest)) if prefix.eq_ignore_ascii_case("BT") => {
                (PortKind::Bluetooth, rest)
            }
            Some((prefix, rest)) if prefix.eq_ignore_ascii_case("USB") => (PortKind::Usb, rest),
            Some((prefix, rest)) if prefix.eq_ignore_ascii_case("TCP") => (PortKind::Lan, rest),
            _ if s.starts_with("/dev/rfcomm") => (PortKind::Bluetooth, s),
            _ if s.starts_with('/') => (PortKind::Usb, s),
            _ => (PortKind::Lan, s),
        };
        Self::new(kind, rest, PORTABLE_ESCPOS)
    }
}

impl fmt::Display for PortAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.prefix(), self.address)
    }
}

// ============================================================================
// PORT ABSTRACTION
// ============================================================================

/// The four real-time status bytes (`DLE EOT 1..4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RawStatus {
    pub printer: u8,
    pub offline_cause: u8,
    pub error_cause: u8,
    pub paper: u8,
}

impl RawStatus {
    /// What an idle, online printer with paper reports.
    pub const READY: Self = Self {
        printer: 0x12,
        offline_cause: 0x12,
        error_cause: 0x12,
        paper: 0x12,
    };
}

/// Model name and firmware version as the device reports them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FirmwareInfo {
    pub model_name: String,
    pub firmware_version: String,
}

impl fmt::Display for FirmwareInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (firmware {})", self.model_name, self.firmware_version)
    }
}

/// Longest `GS I` reply accepted, terminator excluded
const MAX_ID_REPLY: usize = 80;

/// Read one `_ text NUL` reply, one byte at a time from `next_byte`.
pub(crate) fn read_id_reply(
    mut next_byte: impl FnMut() -> Result<u8, PortError>,
) -> Result<String, PortError> {
    let header = next_byte()?;
    if header != ID_REPLY_HEADER {
        return Err(PortError::Protocol(format!(
            "printer ID reply starts with {header:#04x}"
        )));
    }
    let mut text = Vec::new();
    loop {
        match next_byte()? {
            ID_REPLY_END => break,
            _ if text.len() == MAX_ID_REPLY => {
                return Err(PortError::Protocol(format!(
                    "printer ID reply longer than {MAX_ID_REPLY} bytes"
                )));
            }
            byte => text.push(byte),
        }
    }
    Ok(String::from_utf8_lossy(&text).trim().to_string())
}

/// Opens connections to printers.
///
/// Every blocking call takes its own timeout and reports
/// [`PortError::TimedOut`] when it runs out.
pub trait Port {
    type Handle: PortHandle;

    fn open(&self, address: &PortAddress, timeout: Duration) -> Result<Self::Handle, PortError>;
}

/// One open connection.
pub trait PortHandle {
    /// Write `bytes`, returning how many were accepted.
    fn write(&mut self, bytes: &[u8], timeout: Duration) -> Result<usize, PortError>;

    /// Read the real-time status bytes without disturbing the print buffer.
    fn query_status(&mut self, timeout: Duration) -> Result<RawStatus, PortError>;

    /// Ask for the model name and firmware version (`GS I 67`, `GS I 65`).
    fn query_firmware(&mut self, timeout: Duration) -> Result<FirmwareInfo, PortError>;

    /// Release the connection. Called at most once by the session.
    fn close(&mut self);
}
